//! # Event subscriber trait.
//!
//! Provides [`Subscriber`], the extension point for plugging custom event
//! handlers (logging, metrics, alerting) into a machine.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via
//!   [`Subscriber::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as
//!   `EventKind::SubscriberPanicked`)
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they do **not**
//!   block the worker loop nor other subscribers.
//! - If a subscriber's queue overflows, events for that subscriber are
//!   dropped and a `SubscriberOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative
/// waits).
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use statevisor::{Event, EventKind, Subscriber};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Subscriber for Audit {
///     async fn on_event(&self, event: &Event) {
///         if event.kind == EventKind::CancelRequested {
///             // write audit record...
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "audit"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Handles a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
