//! State model: identity tokens, actions, the state record, and the
//! fluent registration handle.
//!
//! ## Contents
//! - [`StateName`], [`Command`], [`Payload`] value tokens driving the machine
//! - [`Action`] stored entry/exit hook (async, cancellation-aware)
//! - [`State`] a registered node: transition table, hooks, timeout
//! - [`StateHandle`] / [`TransitionClause`] fluent registration API used
//!   through [`MachineBuilder`](crate::MachineBuilder)

mod action;
mod handle;
mod state;
mod token;

pub use action::Action;
pub use handle::{StateHandle, TransitionClause};
pub use state::State;
pub use token::{Command, Payload, StateName};
