//! # Fluent registration handle.
//!
//! [`StateHandle`] is what [`MachineBuilder::add_state`](crate::MachineBuilder::add_state)
//! and [`get_state`](crate::MachineBuilder::get_state) hand back: a mutable
//! view over one state inside the builder, chaining hook, transition, and
//! timeout registration.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use statevisor::{ActionError, Command, MachineBuilder, MachineConfig};
//!
//! # fn main() -> Result<(), statevisor::MachineError> {
//! let mut builder = MachineBuilder::new(MachineConfig::default());
//! builder
//!     .add_state("initialising")?
//!     .on_enter(|_payload, _token| async { Ok::<(), ActionError>(()) })
//!     .on(Command::new("finish"))
//!     .goto("finishing")?
//!     .timeout_after(Duration::from_secs(30));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{ActionError, MachineError};
use crate::states::action::Action;
use crate::states::state::State;
use crate::states::token::{Command, Payload, StateName};

/// Mutable fluent view over one registered state.
#[derive(Debug)]
pub struct StateHandle<'a> {
    state: &'a mut State,
}

impl<'a> StateHandle<'a> {
    pub(crate) fn new(state: &'a mut State) -> Self {
        Self { state }
    }

    /// Sets the entry hook, replacing any previous one.
    pub fn on_enter<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(Option<Payload>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        self.state.set_enter(Action::from_fn(hook));
        self
    }

    /// Sets the exit hook, replacing any previous one.
    pub fn on_exit<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(Option<Payload>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        self.state.set_exit(Action::from_fn(hook));
        self
    }

    /// Sets a pre-built [`Action`] as the entry hook.
    pub fn enter_action(self, action: Action) -> Self {
        self.state.set_enter(action);
        self
    }

    /// Sets a pre-built [`Action`] as the exit hook.
    pub fn exit_action(self, action: Action) -> Self {
        self.state.set_exit(action);
        self
    }

    /// Starts registering an outgoing transition for `command`.
    ///
    /// Complete it with [`TransitionClause::goto`].
    pub fn on(self, command: impl Into<Command>) -> TransitionClause<'a> {
        TransitionClause {
            state: self.state,
            command: command.into(),
        }
    }

    /// Arms a one-shot timeout whenever this state is entered.
    ///
    /// `Duration::ZERO` means no timeout. On expiry the machine cancels
    /// itself with reason `"timeout exceeded"`.
    pub fn timeout_after(self, timeout: Duration) -> Self {
        self.state.set_timeout(timeout);
        self
    }

    /// Fires `command` immediately after this state's entry completes.
    ///
    /// The built-in canceled state uses this to return to idle via
    /// [`Command::DONE`]; concrete machines can use it for their own
    /// pass-through states.
    pub fn auto_advance(self, command: impl Into<Command>) -> Self {
        self.state.set_auto_advance(command.into());
        self
    }
}

/// Half-finished transition: a command waiting for its target.
pub struct TransitionClause<'a> {
    state: &'a mut State,
    command: Command,
}

impl<'a> TransitionClause<'a> {
    /// Completes the transition towards `target`.
    ///
    /// Fails with [`MachineError::DuplicateTransition`] if the command
    /// already has an outgoing transition from this state. The target is
    /// resolved when the transition runs, not here.
    pub fn goto(self, target: impl Into<StateName>) -> Result<StateHandle<'a>, MachineError> {
        self.state.add_transition(self.command, target.into())?;
        Ok(StateHandle { state: self.state })
    }
}
