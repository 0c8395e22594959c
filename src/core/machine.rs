//! # StateMachine: the engine's public surface and transition algorithm.
//!
//! A [`StateMachine`] owns the frozen state registry, the current/last
//! state slots, the command queue, the cancellation hub, the timeout
//! timer, and the per-run data store. All transitions execute serially on
//! the worker task spawned by
//! [`MachineBuilder::build`](crate::MachineBuilder::build); any number of
//! caller tasks/threads may submit commands or request cancellation
//! concurrently.
//!
//! ## Transition algorithm
//! ```text
//! move_next(command, payload, token):
//!   1. resolve transition on the current state      → Unregistered on miss
//!   2. token already fired?                         → abort, no side effects
//!   3. run exit hook (skipped for Cancel)           → fault/abort propagates
//!   4. stop the timeout timer                         (idempotent)
//!   5. re-check token; last = current; current = target
//!   6. re-check token; arm timer if target declares a timeout
//!   7. run entry hook (idle first clears run data)  → fault/abort propagates
//!   8. final token check
//! ```
//! The worker converts every failure except cancellation into
//! `cancel(reason = message)`: one uncaught fault anywhere in a transition
//! forces the machine into the canceled state instead of leaving it
//! half-transitioned. There is no retry path.
//!
//! ## Ordering guarantees
//! Commands from one producer are processed in submission order; commands
//! from different producers interleave in queue-arrival order. A
//! [`cancel`](StateMachine::cancel) jumps the line by discarding the queue
//! and injecting the forced cancel envelope first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::cancel::CancelHub;
use crate::core::queue::{CommandQueue, Envelope};
use crate::core::timer::TimeoutTimer;
use crate::error::{MachineError, TransitionError};
use crate::events::{Bus, Event, EventKind};
use crate::states::{Command, Payload, State, StateName};
use crate::subscribers::SubscriberSet;

/// Current and previous state, written only by the worker.
pub(crate) struct Slots {
    pub(crate) current: StateName,
    pub(crate) last: Option<StateName>,
}

/// Thread-safe finite-state-machine engine.
///
/// Built through [`MachineBuilder`](crate::MachineBuilder); shared as
/// `Arc<StateMachine>`. Submission ([`enqueue_transition`](Self::enqueue_transition))
/// and cancellation ([`cancel`](Self::cancel)) never block on transition
/// execution; they only take short internal locks.
pub struct StateMachine {
    pub(crate) label: Arc<str>,
    pub(crate) grace: Duration,
    pub(crate) registry: Vec<State>,
    pub(crate) slots: RwLock<Slots>,
    pub(crate) data: Mutex<HashMap<String, Payload>>,
    pub(crate) queue: Arc<CommandQueue>,
    pub(crate) hub: Arc<CancelHub>,
    pub(crate) timer: TimeoutTimer,
    pub(crate) bus: Bus,
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) runtime: CancellationToken,
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
}

impl StateMachine {
    /// Appends `(command, payload)` to the queue and returns immediately.
    ///
    /// Safe to call from any number of tasks/threads. Legality of the
    /// command against the current state is checked when the item is
    /// dequeued, not here: the current state may change before the item is
    /// processed.
    ///
    /// # Errors
    /// [`MachineError::ReservedCommand`] if `command` is
    /// [`Command::CANCEL`]; use [`cancel`](Self::cancel) instead.
    pub fn enqueue_transition(
        &self,
        command: Command,
        payload: Option<Payload>,
    ) -> Result<(), MachineError> {
        if command == Command::CANCEL {
            return Err(MachineError::ReservedCommand);
        }

        self.queue.push(Envelope::new(command.clone(), payload));
        self.bus.publish(
            Event::new(EventKind::CommandEnqueued)
                .with_machine(Arc::clone(&self.label))
                .with_command(command),
        );
        Ok(())
    }

    /// [`cancel_with`](Self::cancel_with) with reason `"undefined"`.
    pub fn cancel(&self) {
        self.cancel_with("undefined");
    }

    /// Synchronously aborts the in-flight transition, discards everything
    /// queued, and forces the machine towards canceled and then idle.
    ///
    /// Callable from any thread, reentrant-safe, idempotent per episode.
    /// The machine remains usable afterwards: commands enqueued after this
    /// call run normally against a fresh cancellation signal.
    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.hub.cancel(&reason.into());
    }

    /// Snapshot of the state the machine currently sits in.
    ///
    /// Last-writer-visible: a transition may be in flight while reading.
    pub fn current_state(&self) -> StateName {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Snapshot of the previously held state, if any transition completed.
    pub fn last_state(&self) -> Option<StateName> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }

    /// Stores a per-run value. The store is cleared every time the machine
    /// returns to idle.
    pub fn set_data(&self, key: impl Into<String>, value: Payload) {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Reads a per-run value stored with [`set_data`](Self::set_data).
    pub fn data(&self, key: &str) -> Option<Payload> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stops the worker and releases the timer and subscriber workers.
    ///
    /// Waits up to the configured grace for the worker to finish its
    /// current unit of work. Idempotent: the second and later calls are
    /// no-ops.
    ///
    /// # Errors
    /// [`MachineError::GraceExceeded`] when the worker is still busy after
    /// the grace period; the worker task is left detached in that case.
    pub async fn shutdown(&self) -> Result<(), MachineError> {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return Ok(());
        };

        self.bus.publish(
            Event::new(EventKind::ShutdownRequested).with_machine(Arc::clone(&self.label)),
        );

        self.timer.stop();
        self.runtime.cancel();
        self.hub.fire_current();
        self.queue.wake();

        match time::timeout(self.grace, worker).await {
            Ok(_) => {
                self.subs.shutdown().await;
                Ok(())
            }
            Err(_) => Err(MachineError::GraceExceeded { grace: self.grace }),
        }
    }

    /// Executes one transition. Worker-only.
    pub(crate) async fn move_next(
        &self,
        command: &Command,
        payload: Option<Payload>,
        token: &CancellationToken,
    ) -> Result<(), TransitionError> {
        let from = self.current_state();
        let source = self
            .find_state(&from)
            .ok_or_else(|| TransitionError::UnknownTarget(from.clone()))?;
        let target_name = source
            .target_for(command)
            .cloned()
            .ok_or_else(|| TransitionError::Unregistered {
                state: from.clone(),
                command: command.clone(),
            })?;

        if token.is_cancelled() {
            return Err(TransitionError::Canceled);
        }

        // The forced cancel must reach the canceled state even when the
        // source state's exit hook would misbehave, so it skips the hook.
        if *command != Command::CANCEL {
            if let Some(exit) = source.exit_action() {
                exit.invoke(payload.clone(), token.clone()).await?;
            }
            self.bus.publish(
                Event::new(EventKind::StateExited)
                    .with_machine(Arc::clone(&self.label))
                    .with_state(from.clone())
                    .with_command(command.clone()),
            );
        }

        self.timer.stop();

        if token.is_cancelled() {
            return Err(TransitionError::Canceled);
        }

        let target = self
            .find_state(&target_name)
            .ok_or_else(|| TransitionError::UnknownTarget(target_name.clone()))?;

        {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            slots.last = Some(from);
            slots.current = target_name.clone();
        }

        if token.is_cancelled() {
            return Err(TransitionError::Canceled);
        }

        if let Some(timeout) = target.timeout() {
            self.timer
                .arm(timeout, target_name.clone(), Arc::clone(&self.hub));
        }

        if target_name == StateName::IDLE {
            self.clear_data();
        }
        if let Some(enter) = target.enter_action() {
            enter.invoke(payload, token.clone()).await?;
        }
        self.bus.publish(
            Event::new(EventKind::StateEntered)
                .with_machine(Arc::clone(&self.label))
                .with_state(target_name)
                .with_command(command.clone()),
        );

        if token.is_cancelled() {
            return Err(TransitionError::Canceled);
        }
        Ok(())
    }

    pub(crate) fn find_state(&self, name: &StateName) -> Option<&State> {
        self.registry.iter().find(|s| s.name() == name)
    }

    fn clear_data(&self) {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Drop for StateMachine {
    /// Best-effort release when [`shutdown`](Self::shutdown) was never
    /// called: fires the tokens without waiting for the worker.
    fn drop(&mut self) {
        self.timer.stop();
        self.runtime.cancel();
        self.hub.fire_current();
    }
}
