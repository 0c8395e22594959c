//! Error types used by the machine API, the worker, and hooks.
//!
//! Three enums with distinct propagation rules:
//!
//! - [`MachineError`]: synchronous API misuse (registration, lookup,
//!   enqueue, shutdown). Raised directly to the caller.
//! - [`TransitionError`]: raised while the worker executes a transition.
//!   Never propagated to callers: anything other than `Canceled` is
//!   converted into a forced cancellation with the error text as reason.
//! - [`ActionError`]: returned by entry/exit hooks. `Canceled` is the
//!   cooperative abort signal and is swallowed; `Failed` converts to a
//!   forced cancellation.

use std::time::Duration;
use thiserror::Error;

use crate::states::{Command, StateName};

/// # Errors raised synchronously by the machine API.
///
/// These represent misuse of the registration or submission surface and
/// surface directly to the calling code.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MachineError {
    /// A state with this name is already registered.
    #[error("state \"{0}\" is already registered")]
    DuplicateState(StateName),

    /// The name is reserved for a built-in state.
    #[error("\"{0}\" is a reserved built-in state name")]
    ReservedName(StateName),

    /// No state with this name is registered.
    #[error("state \"{0}\" is not registered")]
    StateNotFound(StateName),

    /// The command already has an outgoing transition from this state.
    #[error("command \"{command}\" already has a transition from state \"{state}\"")]
    DuplicateTransition {
        /// Source state of the clashing registration.
        state: StateName,
        /// Command registered twice.
        command: Command,
    },

    /// The reserved cancel command was enqueued directly.
    #[error("the cancel command cannot be enqueued; use StateMachine::cancel() instead")]
    ReservedCommand,

    /// Shutdown grace period expired with the worker still busy.
    #[error("shutdown grace {grace:?} exceeded; worker still busy")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl MachineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MachineError::DuplicateState(_) => "duplicate_state",
            MachineError::ReservedName(_) => "reserved_name",
            MachineError::StateNotFound(_) => "state_not_found",
            MachineError::DuplicateTransition { .. } => "duplicate_transition",
            MachineError::ReservedCommand => "reserved_command",
            MachineError::GraceExceeded { .. } => "grace_exceeded",
        }
    }
}

/// # Errors raised while the worker executes one transition.
///
/// Callers never see these. The worker converts every variant except
/// [`TransitionError::Canceled`] into `cancel(reason = message)`, so a bad
/// transition is observable only as the machine landing in canceled and
/// then idle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransitionError {
    /// The current state has no outgoing transition for the command.
    #[error("no transition for command \"{command}\" from state \"{state}\"")]
    Unregistered {
        /// State the machine sat in when the command was dequeued.
        state: StateName,
        /// The unmatched command.
        command: Command,
    },

    /// A registered transition points at a state that was never added.
    #[error("transition target \"{0}\" is not registered")]
    UnknownTarget(StateName),

    /// The cancellation signal fired. Routine, never logged as a failure.
    #[error("transition cancelled")]
    Canceled,

    /// An entry/exit hook failed.
    #[error("{reason}")]
    Action {
        /// The hook's error text, reused as the cancellation reason.
        reason: String,
    },
}

impl TransitionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransitionError::Unregistered { .. } => "transition_unregistered",
            TransitionError::UnknownTarget(_) => "transition_unknown_target",
            TransitionError::Canceled => "transition_canceled",
            TransitionError::Action { .. } => "transition_action_failed",
        }
    }
}

/// # Errors returned by entry/exit hooks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// The hook observed the cancellation token and aborted cooperatively.
    #[error("action observed cancellation")]
    Canceled,

    /// The hook failed; the machine cancels itself with this text.
    #[error("{error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl ActionError {
    /// Shorthand for [`ActionError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ActionError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Canceled => "action_canceled",
            ActionError::Failed { .. } => "action_failed",
        }
    }
}

impl From<ActionError> for TransitionError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Canceled => TransitionError::Canceled,
            ActionError::Failed { error } => TransitionError::Action { reason: error },
        }
    }
}
