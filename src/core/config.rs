//! # Machine configuration.
//!
//! Provides [`MachineConfig`], the per-instance settings consumed by
//! [`MachineBuilder::new`](crate::MachineBuilder::new).
//!
//! ## Field semantics
//! - `name`: label attached to every event this machine publishes
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped)
//! - `grace`: maximum wait for the worker to stop during shutdown

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Per-machine configuration.
///
/// All fields are public for flexibility; prefer the helper accessors to
/// avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct MachineConfig {
    /// Label attached to every event published by this machine. Useful
    /// when several machines share one set of subscribers.
    pub name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages
    /// skip older items. Minimum value is 1 (enforced by the bus).
    pub bus_capacity: usize,

    /// Maximum time [`StateMachine::shutdown`](crate::StateMachine::shutdown)
    /// waits for the worker to finish its current unit of work before
    /// giving up with `GraceExceeded`.
    pub grace: Duration,
}

impl MachineConfig {
    /// Config with the given machine name and default settings.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Shared label form of the machine name.
    #[inline]
    pub(crate) fn label(&self) -> Arc<str> {
        Arc::from(self.name.as_ref())
    }
}

impl Default for MachineConfig {
    /// Default configuration:
    ///
    /// - `name = "machine"`
    /// - `bus_capacity = 1024` (good baseline)
    /// - `grace = 5s` (worker transitions are expected to be fast)
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("machine"),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
