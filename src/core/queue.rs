//! # Pending-command queue.
//!
//! Unbounded FIFO of `(command, payload)` envelopes with a single mutex
//! guarding **both** the enqueue and dequeue paths, plus a
//! [`tokio::sync::Notify`] that wakes the worker when an item arrives.
//!
//! One lock over both paths is what makes the cancellation protocol sound:
//! [`CommandQueue::drain_then_inject`] discards everything queued, lets the
//! caller swap the cancellation signal, and appends the forced cancel
//! envelope in one critical section, so the worker can never pop the
//! injected envelope while still holding the stale signal.
//!
//! ## Rules
//! - Producers never block on consumers; `push` only takes the short lock.
//! - Each envelope is consumed exactly once: popped by the worker or
//!   discarded by a drain.
//! - `ready()` is single-consumer; the worker re-checks emptiness after
//!   every wakeup, so a spurious or stale notification is harmless.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use crate::states::{Command, Payload};

/// One queued command with its optional payload.
pub(crate) struct Envelope {
    pub(crate) command: Command,
    pub(crate) payload: Option<Payload>,
}

impl Envelope {
    pub(crate) fn new(command: Command, payload: Option<Payload>) -> Self {
        Self { command, payload }
    }

    /// The forced envelope injected by the cancellation path. The reason
    /// travels as the payload so the canceled state's hooks can see it.
    pub(crate) fn cancel(reason: String) -> Self {
        Self {
            command: Command::CANCEL,
            payload: Some(Arc::new(reason) as Payload),
        }
    }
}

/// Thread-safe FIFO feeding the worker loop.
pub(crate) struct CommandQueue {
    items: Mutex<VecDeque<Envelope>>,
    notify: Notify,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Appends an envelope and wakes the worker.
    pub(crate) fn push(&self, envelope: Envelope) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(envelope);
        self.notify.notify_one();
    }

    /// Removes the oldest envelope, if any.
    pub(crate) fn pop(&self) -> Option<Envelope> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Completes once the queue is non-empty.
    ///
    /// Registers interest before re-checking emptiness, so a push that
    /// lands between the check and the await is never missed.
    pub(crate) async fn ready(&self) {
        loop {
            let notified = self.notify.notified();
            if !self
                .items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
            {
                return;
            }
            notified.await;
        }
    }

    /// Discards everything queued, runs `while_locked` with the queue
    /// still locked, then appends `envelope` and wakes the worker.
    ///
    /// Returns the number of discarded envelopes. The closure is where the
    /// cancellation signal gets swapped: anything popped after this call
    /// observes the fresh signal.
    pub(crate) fn drain_then_inject(
        &self,
        envelope: Envelope,
        while_locked: impl FnOnce(),
    ) -> u64 {
        let drained = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
            let drained = items.len() as u64;
            items.clear();
            while_locked();
            items.push_back(envelope);
            drained
        };
        self.notify.notify_one();
        drained
    }

    /// Wakes the worker without queueing anything (shutdown path).
    pub(crate) fn wake(&self) {
        self.notify.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &'static str) -> Envelope {
        Envelope::new(Command::new(name), None)
    }

    #[test]
    fn fifo_order_is_preserved() {
        let queue = CommandQueue::new();
        queue.push(env("a"));
        queue.push(env("b"));

        assert_eq!(queue.pop().map(|e| e.command), Some(Command::new("a")));
        assert_eq!(queue.pop().map(|e| e.command), Some(Command::new("b")));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn drain_discards_everything_and_leaves_only_the_injected_envelope() {
        let queue = CommandQueue::new();
        queue.push(env("a"));
        queue.push(env("b"));
        queue.push(env("c"));

        let mut swapped = false;
        let drained = queue.drain_then_inject(Envelope::cancel("boom".into()), || {
            swapped = true;
        });

        assert_eq!(drained, 3);
        assert!(swapped);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().map(|e| e.command), Some(Command::CANCEL));
    }

    #[tokio::test]
    async fn ready_returns_immediately_when_items_are_queued() {
        let queue = CommandQueue::new();
        queue.push(env("a"));
        queue.ready().await;
    }

    #[tokio::test]
    async fn ready_wakes_on_push_from_another_task() {
        let queue = Arc::new(CommandQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue.ready().await;
            })
        };

        tokio::task::yield_now().await;
        queue.push(env("a"));
        waiter.await.expect("waiter completes");
    }

    #[test]
    fn cancel_envelope_carries_the_reason_as_payload() {
        let envelope = Envelope::cancel("timeout exceeded".into());
        let payload = envelope.payload.expect("reason payload");
        let reason = payload.downcast_ref::<String>().expect("string payload");
        assert_eq!(reason, "timeout exceeded");
    }
}
