//! Engine core: serialized transitions and lifecycle.
//!
//! This module contains the embedded implementation of the machine
//! runtime. The public API from this module is [`StateMachine`] plus its
//! construction surface ([`MachineBuilder`], [`MachineConfig`]).
//!
//! Internal modules:
//! - [`queue`]: pending-command FIFO with a combined enqueue/dequeue lock;
//! - [`cancel`]: the one live cancellation signal and the drain/inject protocol;
//! - [`timer`]: one-shot per-state timeout driving cancellation;
//! - [`machine`]: public surface and the transition algorithm;
//! - [`worker`]: the sole consumer loop executing transitions;
//! - [`builder`]: registration and machine assembly.
//!
//! ## System wiring
//! ```text
//! callers ──► enqueue_transition ──► CommandQueue ──► worker ──► move_next
//!    │                                   ▲                          │
//!    └────────── cancel() ──► CancelHub ─┘ (drain + inject)         │
//!                                ▲                                  │
//!                          TimeoutTimer (expiry)          slots / hooks / Bus
//!                                ▲                                  │
//!                                └────────── armed on entry ◄───────┘
//! ```

mod builder;
mod cancel;
mod config;
mod machine;
mod queue;
mod timer;
mod worker;

pub use builder::MachineBuilder;
pub use config::MachineConfig;
pub use machine::StateMachine;
