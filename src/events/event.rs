//! # Runtime events emitted by the machine worker and cancellation path.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Transition events**: command flow through the worker (enqueued,
//!   exited, entered, rejected, action faults)
//! - **Cancellation events**: explicit cancel requests and timer expiry
//! - **Lifecycle events**: shutdown request, worker stop, subscriber
//!   delivery problems
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! the machine name, the state and command involved, reasons, and drained
//! queue counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use statevisor::{Command, Event, EventKind, StateName};
//!
//! let ev = Event::new(EventKind::StateEntered)
//!     .with_machine("demo")
//!     .with_state(StateName::new("initialising"))
//!     .with_command(Command::new("initialise"));
//!
//! assert_eq!(ev.kind, EventKind::StateEntered);
//! assert_eq!(ev.state.as_ref().map(|s| s.as_str()), Some("initialising"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::states::{Command, StateName};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of machine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Transition events ===
    /// A command was appended to the queue.
    ///
    /// Sets: `command`, `machine`, `at`, `seq`.
    CommandEnqueued,

    /// The current state's exit hook completed and the state was left.
    ///
    /// Sets: `state` (the state being left), `command`, `machine`, `at`, `seq`.
    StateExited,

    /// The machine entered a new state and its entry hook completed.
    ///
    /// Sets: `state` (the state entered), `command`, `machine`, `at`, `seq`.
    StateEntered,

    /// A dequeued command had no transition from the current state.
    ///
    /// The machine converts this into a forced cancellation.
    ///
    /// Sets: `state` (current), `command`, `reason`, `machine`, `at`, `seq`.
    TransitionRejected,

    /// An entry/exit hook failed (not a cooperative abort).
    ///
    /// The machine converts this into a forced cancellation.
    ///
    /// Sets: `state`, `command`, `reason`, `machine`, `at`, `seq`.
    ActionFailed,

    // === Cancellation events ===
    /// A cancellation was requested, the queue drained, and the forced
    /// cancel command injected.
    ///
    /// Sets: `reason`, `drained` (items discarded), `machine`, `at`, `seq`.
    CancelRequested,

    /// The timeout armed for the current state expired.
    ///
    /// Always followed by a `CancelRequested` with reason
    /// `"timeout exceeded"`.
    ///
    /// Sets: `state`, `timeout_ms`, `machine`, `at`, `seq`.
    TimeoutHit,

    // === Lifecycle events ===
    /// Shutdown was requested through the machine API.
    ///
    /// Sets: `machine`, `at`, `seq`.
    ShutdownRequested,

    /// The worker loop exited (only happens on shutdown).
    ///
    /// Sets: `machine`, `at`, `seq`.
    WorkerStopped,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber and cause), `at`, `seq`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (panic info), `at`, `seq`.
    SubscriberPanicked,
}

/// Machine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the machine instance, if applicable.
    pub machine: Option<Arc<str>>,
    /// State involved in the event.
    pub state: Option<StateName>,
    /// Command involved in the event.
    pub command: Option<Command>,
    /// Human-readable reason (errors, cancel reasons, overflow details).
    pub reason: Option<Arc<str>>,
    /// Expired timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Number of queued commands discarded by a cancellation.
    pub drained: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            machine: None,
            state: None,
            command: None,
            reason: None,
            timeout_ms: None,
            drained: None,
        }
    }

    /// Attaches the machine instance name.
    #[inline]
    pub fn with_machine(mut self, machine: impl Into<Arc<str>>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    /// Attaches a state name.
    #[inline]
    pub fn with_state(mut self, state: StateName) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a command token.
    #[inline]
    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches the count of commands discarded by a drain.
    #[inline]
    pub fn with_drained(mut self, drained: u64) -> Self {
        self.drained = Some(drained);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub(crate) fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} cause={cause}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}
