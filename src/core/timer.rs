//! # One-shot state timeout timer.
//!
//! Armed when the machine enters a state with a positive timeout, disarmed
//! on every exit regardless of outcome. Expiry reports a `TimeoutHit`
//! event and calls the cancellation hub: a timeout is a scheduled,
//! internally generated cancellation, nothing more.
//!
//! Each arm spawns a small task holding a guard token:
//! `select! { sleep(d) => hub.timeout_expired(..), guard.cancelled() => {} }`.
//! `stop` fires the guard, which is idempotent and safe to call when the
//! timer was never armed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::cancel::CancelHub;
use crate::states::StateName;

/// Rearmable single-shot timer tied to the currently entered state.
pub(crate) struct TimeoutTimer {
    guard: Mutex<Option<CancellationToken>>,
}

impl TimeoutTimer {
    pub(crate) fn new() -> Self {
        Self {
            guard: Mutex::new(None),
        }
    }

    /// Disarms any previous timer and arms a fresh one for `state`.
    pub(crate) fn arm(&self, timeout: Duration, state: StateName, hub: Arc<CancelHub>) {
        let token = CancellationToken::new();
        let previous = self
            .guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(timeout) => {
                    hub.timeout_expired(state, timeout);
                }
            }
        });
    }

    /// Disarms the timer. Idempotent; a no-op when nothing is armed.
    pub(crate) fn stop(&self) {
        if let Some(token) = self
            .guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::CommandQueue;
    use crate::events::Bus;
    use crate::states::Command;

    fn hub(queue: &Arc<CommandQueue>) -> Arc<CancelHub> {
        Arc::new(CancelHub::new(
            Arc::clone(queue),
            Bus::new(16),
            Arc::from("test"),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_injects_a_forced_cancel() {
        let queue = Arc::new(CommandQueue::new());
        let timer = TimeoutTimer::new();
        timer.arm(
            Duration::from_millis(50),
            StateName::new("loading"),
            hub(&queue),
        );

        time::sleep(Duration::from_millis(60)).await;

        let forced = queue.pop().expect("forced envelope after expiry");
        assert_eq!(forced.command, Command::CANCEL);
        let reason = forced
            .payload
            .and_then(|p| p.downcast_ref::<String>().cloned());
        assert_eq!(reason.as_deref(), Some("timeout exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_expiry_prevents_the_cancel() {
        let queue = Arc::new(CommandQueue::new());
        let timer = TimeoutTimer::new();
        timer.arm(
            Duration::from_millis(50),
            StateName::new("loading"),
            hub(&queue),
        );

        timer.stop();
        time::sleep(Duration::from_millis(100)).await;

        assert_eq!(queue.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_supersedes_the_previous_timer() {
        let queue = Arc::new(CommandQueue::new());
        let timer = TimeoutTimer::new();
        let hub = hub(&queue);

        timer.arm(Duration::from_millis(50), StateName::new("a"), hub.clone());
        timer.arm(Duration::from_millis(500), StateName::new("b"), hub);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.len(), 0, "first timer must not fire after rearm");

        time::sleep(Duration::from_millis(450)).await;
        assert_eq!(queue.len(), 1, "second timer fires on its own schedule");
    }

    #[test]
    fn stop_without_arm_is_a_noop() {
        let timer = TimeoutTimer::new();
        timer.stop();
        timer.stop();
    }
}
