//! # Registered state record.
//!
//! A [`State`] bundles everything the worker needs when the machine sits
//! in, leaves, or enters it:
//! - the outgoing transition table (command -> target state name, commands
//!   unique within the state, registration order preserved);
//! - optional entry and exit [`Action`]s;
//! - optional timeout (armed on entry, disarmed on exit);
//! - optional auto-advance command fired right after entry completes.
//!
//! States are created through the builder and frozen at
//! [`MachineBuilder::build`](crate::MachineBuilder::build); the worker
//! reads them without locking.

use std::time::Duration;

use crate::error::MachineError;
use crate::states::action::Action;
use crate::states::token::{Command, StateName};

/// One outgoing transition, owned by its source state.
#[derive(Clone, Debug)]
pub(crate) struct Transition {
    pub(crate) command: Command,
    pub(crate) target: StateName,
}

/// A named node in the machine registry.
#[derive(Debug)]
pub struct State {
    name: StateName,
    transitions: Vec<Transition>,
    enter: Option<Action>,
    exit: Option<Action>,
    timeout: Option<Duration>,
    auto_advance: Option<Command>,
}

impl State {
    /// Creates a state. Every state receives the implicit
    /// `Cancel -> canceled` transition on creation, which keeps the whole
    /// machine cancel-reachable without per-state wiring.
    pub(crate) fn new(name: StateName) -> Self {
        let mut state = Self {
            name,
            transitions: Vec::new(),
            enter: None,
            exit: None,
            timeout: None,
            auto_advance: None,
        };
        state.push_transition(Command::CANCEL, StateName::CANCELED);
        state
    }

    /// Name this state was registered under.
    pub fn name(&self) -> &StateName {
        &self.name
    }

    /// Timeout armed when this state is entered, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Target state for `command`, if a transition was registered.
    pub fn target_for(&self, command: &Command) -> Option<&StateName> {
        self.transitions
            .iter()
            .find(|t| t.command == *command)
            .map(|t| &t.target)
    }

    /// Commands with a registered outgoing transition, in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.transitions.iter().map(|t| &t.command)
    }

    pub(crate) fn add_transition(
        &mut self,
        command: Command,
        target: StateName,
    ) -> Result<(), MachineError> {
        if self.transitions.iter().any(|t| t.command == command) {
            return Err(MachineError::DuplicateTransition {
                state: self.name.clone(),
                command,
            });
        }
        self.push_transition(command, target);
        Ok(())
    }

    /// Unchecked append; callers guarantee the command is not taken.
    pub(crate) fn push_transition(&mut self, command: Command, target: StateName) {
        self.transitions.push(Transition { command, target });
    }

    pub(crate) fn set_enter(&mut self, action: Action) {
        self.enter = Some(action);
    }

    pub(crate) fn set_exit(&mut self, action: Action) {
        self.exit = Some(action);
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        // zero means "no timeout", matching the builder contract
        self.timeout = (timeout > Duration::ZERO).then_some(timeout);
    }

    pub(crate) fn set_auto_advance(&mut self, command: Command) {
        self.auto_advance = Some(command);
    }

    pub(crate) fn enter_action(&self) -> Option<&Action> {
        self.enter.as_ref()
    }

    pub(crate) fn exit_action(&self) -> Option<&Action> {
        self.exit.as_ref()
    }

    pub(crate) fn auto_advance(&self) -> Option<&Command> {
        self.auto_advance.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_command_is_rejected() {
        let mut state = State::new(StateName::new("loading"));
        state
            .add_transition(Command::new("go"), StateName::new("running"))
            .unwrap();

        let err = state
            .add_transition(Command::new("go"), StateName::new("elsewhere"))
            .unwrap_err();
        assert!(matches!(err, MachineError::DuplicateTransition { .. }));

        // the original registration survives
        assert_eq!(
            state.target_for(&Command::new("go")),
            Some(&StateName::new("running"))
        );
    }

    #[test]
    fn lookup_misses_return_none() {
        let state = State::new(StateName::new("loading"));
        assert_eq!(state.target_for(&Command::new("go")), None);
    }

    #[test]
    fn every_state_is_cancel_reachable_from_creation() {
        let state = State::new(StateName::new("loading"));
        assert_eq!(
            state.target_for(&Command::CANCEL),
            Some(&StateName::CANCELED)
        );
    }

    #[test]
    fn registering_over_the_implicit_cancel_is_rejected() {
        let mut state = State::new(StateName::new("loading"));
        let err = state
            .add_transition(Command::CANCEL, StateName::new("elsewhere"))
            .unwrap_err();
        assert!(matches!(err, MachineError::DuplicateTransition { .. }));
    }

    #[test]
    fn zero_timeout_means_none() {
        let mut state = State::new(StateName::new("loading"));
        state.set_timeout(Duration::ZERO);
        assert_eq!(state.timeout(), None);

        state.set_timeout(Duration::from_secs(30));
        assert_eq!(state.timeout(), Some(Duration::from_secs(30)));
    }
}
