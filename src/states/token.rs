//! # Identity tokens: [`StateName`], [`Command`], [`Payload`].
//!
//! States and commands are identified by cheap, clonable string tokens
//! compared by value. Each machine instance owns its own identifier space;
//! two machines may register the same names independently.
//!
//! Two state names and two commands are reserved by the engine:
//! - [`StateName::IDLE`] / [`StateName::CANCELED`] are registered by every
//!   builder before user states;
//! - [`Command::CANCEL`] is injection-only (see
//!   [`StateMachine::cancel`](crate::StateMachine::cancel));
//! - [`Command::DONE`] is used by the built-in canceled state to return to
//!   idle, and is free for concrete machines to reuse.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Opaque payload handed through to entry/exit hooks.
///
/// The engine never inspects it; hooks downcast to whatever concrete type
/// the producer enqueued.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Name of a registered state, compared by value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StateName(Cow<'static, str>);

impl StateName {
    /// Built-in resting state. Entry clears the per-run data store.
    pub const IDLE: StateName = StateName(Cow::Borrowed("idle"));

    /// Built-in transient cancel state. Auto-advances back to idle via
    /// [`Command::DONE`].
    pub const CANCELED: StateName = StateName(Cow::Borrowed("canceled"));

    /// Creates a state name from a static or owned string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// String form of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the names the engine registers itself.
    pub fn is_reserved(&self) -> bool {
        *self == Self::IDLE || *self == Self::CANCELED
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for StateName {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Command token driving a transition, compared by value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Command(Cow<'static, str>);

impl Command {
    /// Reserved cancel command. Cannot be enqueued by callers; it is
    /// injected by the cancellation path only.
    pub const CANCEL: Command = Command(Cow::Borrowed("cancel"));

    /// Command used by the built-in canceled state to return to idle.
    pub const DONE: Command = Command(Cow::Borrowed("done"));

    /// Creates a command token from a static or owned string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// String form of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Command {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Command {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
