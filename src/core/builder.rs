//! # MachineBuilder: registration surface and machine assembly.
//!
//! The builder owns the state registry while it is still mutable. Concrete
//! machines register their states and hooks through the fluent
//! [`StateHandle`](crate::StateHandle) API, then call
//! [`MachineBuilder::build`], which freezes the registry, wires the event
//! plumbing, and spawns the worker. `build` must run inside a Tokio
//! runtime.
//!
//! ## Built-in states
//! Every builder starts with two states already registered:
//! - **idle**: the resting state; entering it clears the per-run data
//!   store. The machine starts here.
//! - **canceled**: the transient cancel target; it auto-advances back to
//!   idle via [`Command::DONE`] the instant it is entered.
//!
//! Every state (built-ins included) carries the implicit
//! `Cancel -> canceled` transition from creation, so the forced cancel
//! command is legal from any current state.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use statevisor::{Command, MachineBuilder, MachineConfig, StateName};
//!
//! # async fn example() -> Result<(), statevisor::MachineError> {
//! let mut builder = MachineBuilder::new(MachineConfig::named("demo"));
//!
//! builder
//!     .get_state(StateName::IDLE)?
//!     .on(Command::new("initialise"))
//!     .goto("initialising")?;
//! builder
//!     .add_state("initialising")?
//!     .on(Command::new("finish"))
//!     .goto("finishing")?
//!     .timeout_after(Duration::from_secs(30));
//! builder
//!     .add_state("finishing")?
//!     .auto_advance(Command::DONE)
//!     .on(Command::DONE)
//!     .goto(StateName::IDLE)?;
//!
//! let machine = builder.build();
//! machine.enqueue_transition(Command::new("initialise"), None)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::core::cancel::CancelHub;
use crate::core::config::MachineConfig;
use crate::core::machine::{Slots, StateMachine};
use crate::core::queue::CommandQueue;
use crate::core::timer::TimeoutTimer;
use crate::core::worker;
use crate::error::MachineError;
use crate::events::Bus;
use crate::states::{Command, State, StateHandle, StateName};
use crate::subscribers::{Subscriber, SubscriberSet};

/// Builder for a [`StateMachine`].
pub struct MachineBuilder {
    cfg: MachineConfig,
    states: Vec<State>,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl MachineBuilder {
    /// Creates a builder with the built-in idle and canceled states
    /// already registered.
    pub fn new(cfg: MachineConfig) -> Self {
        let mut builder = Self {
            cfg,
            states: Vec::new(),
            subscribers: Vec::new(),
        };
        builder.install_builtins();
        builder
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive machine events (transitions, cancellations,
    /// faults) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscriber>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Registers a new state and returns its fluent handle.
    ///
    /// # Errors
    /// - [`MachineError::ReservedName`] for the built-in names
    ///   (`idle`, `canceled`); extend those via
    ///   [`get_state`](Self::get_state) instead.
    /// - [`MachineError::DuplicateState`] if the name is already taken.
    pub fn add_state(
        &mut self,
        name: impl Into<StateName>,
    ) -> Result<StateHandle<'_>, MachineError> {
        let name = name.into();
        if name.is_reserved() {
            return Err(MachineError::ReservedName(name));
        }
        if self.states.iter().any(|s| *s.name() == name) {
            return Err(MachineError::DuplicateState(name));
        }

        self.states.push(State::new(name));
        let idx = self.states.len() - 1;
        Ok(StateHandle::new(&mut self.states[idx]))
    }

    /// Returns the fluent handle of an already registered state.
    ///
    /// This is how built-ins get their outgoing transitions (idle has none
    /// besides the implicit cancel until the concrete machine wires some).
    ///
    /// # Errors
    /// [`MachineError::StateNotFound`] if no such state is registered.
    pub fn get_state(
        &mut self,
        name: impl Into<StateName>,
    ) -> Result<StateHandle<'_>, MachineError> {
        let name = name.into();
        match self.states.iter_mut().find(|s| *s.name() == name) {
            Some(state) => Ok(StateHandle::new(state)),
            None => Err(MachineError::StateNotFound(name)),
        }
    }

    /// Freezes the registry and starts the machine in idle.
    ///
    /// Spawns the worker loop and the subscriber listener. Must be called
    /// from within a Tokio runtime.
    pub fn build(self) -> Arc<StateMachine> {
        let label = self.cfg.label();
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let queue = Arc::new(CommandQueue::new());
        let hub = Arc::new(CancelHub::new(
            Arc::clone(&queue),
            bus.clone(),
            Arc::clone(&label),
        ));
        let runtime = CancellationToken::new();

        let machine = Arc::new(StateMachine {
            label,
            grace: self.cfg.grace,
            registry: self.states,
            slots: RwLock::new(Slots {
                current: StateName::IDLE,
                last: None,
            }),
            data: Mutex::new(HashMap::new()),
            queue,
            hub,
            timer: TimeoutTimer::new(),
            bus: bus.clone(),
            subs: Arc::clone(&subs),
            runtime: runtime.clone(),
            worker: Mutex::new(None),
        });

        spawn_subscriber_listener(&bus, subs, runtime.clone());

        let handle = tokio::spawn(worker::run(Arc::clone(&machine), runtime));
        *machine
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        machine
    }

    /// idle and canceled, wired the same way for every machine.
    fn install_builtins(&mut self) {
        self.states.push(State::new(StateName::IDLE));

        let mut canceled = State::new(StateName::CANCELED);
        canceled.set_auto_advance(Command::DONE);
        canceled.push_transition(Command::DONE, StateName::IDLE);
        self.states.push(canceled);
    }
}

/// Forwards bus events to the subscriber set until shutdown.
fn spawn_subscriber_listener(bus: &Bus, subs: Arc<SubscriberSet>, runtime: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = runtime.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(_)) => continue,
                }
            }
        }
    });
}
