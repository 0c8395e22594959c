//! # Worker loop: the sole consumer of the command queue.
//!
//! Exactly one worker runs per machine, so at most one transition executes
//! at a time and all state writes are serialized. The loop runs from
//! [`MachineBuilder::build`](crate::MachineBuilder::build) until shutdown
//! and survives every transition failure.
//!
//! ## Loop shape
//! ```text
//! loop {
//!   select! {
//!     runtime cancelled  → break          (shutdown only)
//!     queue ready        → pop envelope
//!   }
//!   token = live cancellation signal      (read after the pop)
//!   process(envelope, token)
//! }
//! ```
//! An explicit cancel always wakes the wait because it injects the forced
//! cancel envelope under the queue lock; a cancellation observed inside a
//! running transition is swallowed as routine and the loop continues.
//!
//! ## Fault conversion
//! Any transition failure that is not a cancellation is published
//! (`TransitionRejected` / `ActionFailed`) and converted into
//! `cancel(reason = message)`. The conversion is the machine's sole
//! recovery strategy; the failed transition is never retried.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::machine::StateMachine;
use crate::core::queue::Envelope;
use crate::error::TransitionError;
use crate::events::{Event, EventKind};
use crate::states::Command;

/// Runs the worker until `runtime` is cancelled.
pub(crate) async fn run(machine: Arc<StateMachine>, runtime: CancellationToken) {
    loop {
        tokio::select! {
            _ = runtime.cancelled() => break,
            _ = machine.queue.ready() => {}
        }

        let Some(envelope) = machine.queue.pop() else {
            continue;
        };
        // Read the signal after the pop: a drain-and-inject swaps the
        // signal before the forced envelope becomes visible, so the
        // forced cancel always runs against the fresh one.
        let token = machine.hub.current();
        process(&machine, envelope, &token).await;
    }

    machine
        .bus
        .publish(Event::new(EventKind::WorkerStopped).with_machine(Arc::clone(&machine.label)));
}

/// Executes one dequeued envelope, then follows auto-advance commands
/// (the canceled state's `Done`, or a concrete machine's pass-through
/// states) until the machine comes to rest.
async fn process(machine: &StateMachine, envelope: Envelope, token: &CancellationToken) {
    let mut command = envelope.command;
    let mut payload = envelope.payload;

    loop {
        match machine.move_next(&command, payload.take(), token).await {
            Ok(()) => {
                let entered = machine.current_state();
                let next = machine
                    .find_state(&entered)
                    .and_then(|state| state.auto_advance().cloned());
                match next {
                    Some(auto) if !token.is_cancelled() => {
                        command = auto;
                        continue;
                    }
                    _ => break,
                }
            }
            // The expected shape of cancel() aborting in-flight work.
            Err(TransitionError::Canceled) => break,
            Err(err) => {
                publish_fault(machine, &command, &err);
                machine.cancel_with(err.to_string());
                break;
            }
        }
    }
}

fn publish_fault(machine: &StateMachine, command: &Command, err: &TransitionError) {
    let kind = match err {
        TransitionError::Action { .. } => EventKind::ActionFailed,
        _ => EventKind::TransitionRejected,
    };
    machine.bus.publish(
        Event::new(kind)
            .with_machine(Arc::clone(&machine.label))
            .with_state(machine.current_state())
            .with_command(command.clone())
            .with_reason(err.to_string()),
    );
}
