//! # Cancellation hub: the one live, replaceable signal.
//!
//! [`CancelHub`] owns the machine's current [`CancellationToken`] and the
//! cancel protocol. Exactly one token is live at any instant; every
//! `cancel` replaces it, so code still holding an old token sees it as
//! permanently cancelled while new work starts clean.
//!
//! ## Protocol
//! ```text
//! cancel(reason):
//!   1. fire the live token          → aborts the in-flight transition
//!   2. lock the command queue:
//!        drain pending envelopes    → queued work is abandoned
//!        install a fresh token      → before anything can be popped
//!        inject (Cancel, reason)    → legal from every state
//!   3. wake the worker, publish CancelRequested
//! ```
//!
//! ## Rules
//! - Callable from any thread, synchronous, reentrant-safe.
//! - Two racing cancels are both honored; the loser performs one extra
//!   harmless drain (first-to-fire wins the live token).
//! - Timer expiry is just `cancel("timeout exceeded")` preceded by a
//!   `TimeoutHit` event, not a separate code path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::queue::{CommandQueue, Envelope};
use crate::events::{Bus, Event, EventKind};
use crate::states::StateName;

/// Owns the replaceable cancellation signal and the drain-and-inject path.
pub(crate) struct CancelHub {
    slot: Mutex<CancellationToken>,
    queue: Arc<CommandQueue>,
    bus: Bus,
    machine: Arc<str>,
}

impl CancelHub {
    pub(crate) fn new(queue: Arc<CommandQueue>, bus: Bus, machine: Arc<str>) -> Self {
        Self {
            slot: Mutex::new(CancellationToken::new()),
            queue,
            bus,
            machine,
        }
    }

    /// Clone of the live token. Old clones stay cancelled forever once
    /// replaced.
    pub(crate) fn current(&self) -> CancellationToken {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the full cancel protocol (see module docs).
    pub(crate) fn cancel(&self, reason: &str) {
        self.current().cancel();

        let drained = self
            .queue
            .drain_then_inject(Envelope::cancel(reason.to_string()), || {
                *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
                    CancellationToken::new();
            });

        self.bus.publish(
            Event::new(EventKind::CancelRequested)
                .with_machine(Arc::clone(&self.machine))
                .with_reason(reason.to_string())
                .with_drained(drained),
        );
    }

    /// Timer expiry entry point: reports the hit, then cancels.
    pub(crate) fn timeout_expired(&self, state: StateName, timeout: Duration) {
        self.bus.publish(
            Event::new(EventKind::TimeoutHit)
                .with_machine(Arc::clone(&self.machine))
                .with_state(state)
                .with_timeout(timeout),
        );
        self.cancel("timeout exceeded");
    }

    /// Fires the live token without draining or replacing it.
    ///
    /// Shutdown-only: unblocks an in-flight transition while the worker is
    /// being stopped for good.
    pub(crate) fn fire_current(&self) {
        self.current().cancel();
    }
}
