//! # statevisor
//!
//! **Statevisor** is a thread-safe finite-state-machine engine for Rust.
//!
//! A host application declares named states, the commands that move
//! between them, per-state entry/exit hooks, and per-state timeouts, then
//! drives the machine by enqueueing commands from any task or thread. All
//! transitions execute serially on a single dedicated worker; a uniform
//! cancellation path aborts in-flight work, abandons everything queued,
//! and lands the machine back in idle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  producer tasks / threads                         subscribers
//!  ┌──────────┐ ┌──────────┐                      ┌───────────────┐
//!  │ enqueue  │ │ cancel() │                      │ LogWriter ... │
//!  └────┬─────┘ └────┬─────┘                      └──────▲────────┘
//!       ▼            ▼                                   │
//! ┌─────────────────────────────────────────────┐  ┌─────┴─────────┐
//! │  StateMachine                               │  │ SubscriberSet │
//! │  - CommandQueue (combined en/dequeue lock)  │  │ (per-sub      │
//! │  - CancelHub (one live, replaceable token)  │  │  queues)      │
//! │  - TimeoutTimer (one-shot, rearmed on entry)│  └─────▲─────────┘
//! │  - state registry + current/last slots      │        │
//! └────────────────────┬────────────────────────┘        │
//!                      ▼                                 │
//!               ┌─────────────┐      publish       ┌─────┴────┐
//!               │   worker    │ ──────────────────►│   Bus    │
//!               │ (sole       │  (entered, exited, │(broadcast│
//!               │  consumer)  │   cancel, timeout) │ channel) │
//!               └─────────────┘                    └──────────┘
//! ```
//!
//! ### Transition flow
//! ```text
//! enqueue_transition(cmd, payload)
//!   └─► queue ─► worker pops ─► move_next:
//!         lookup ─► exit(old) ─► timer stop ─► swap state
//!                ─► timer arm ─► enter(new) ─► done
//!
//! cancel(reason)                      state timeout expires
//!   └─► fire live token                 └─► TimeoutHit
//!   └─► drain queue + inject Cancel     └─► cancel("timeout exceeded")
//!   └─► fresh token
//!   └─► worker: any state ─► canceled ─► (Done) ─► idle
//! ```
//!
//! Every state carries an implicit `Cancel -> canceled` transition from
//! creation, so the forced cancel command is legal everywhere. A failing
//! hook or an unregistered command never crashes the worker: the fault is
//! converted into `cancel(reason = message)` and the machine self-heals
//! into canceled and then idle.
//!
//! ## Features
//! | Area              | Description                                             | Key types                                  |
//! |-------------------|---------------------------------------------------------|--------------------------------------------|
//! | **Registration**  | Fluent per-state hooks, transitions, timeouts.          | [`MachineBuilder`], [`StateHandle`]        |
//! | **Execution**     | Serialized transitions, fire-and-forget submission.     | [`StateMachine`]                           |
//! | **Cancellation**  | Explicit + timeout-driven, cooperative, reentrant-safe. | [`StateMachine::cancel`]                   |
//! | **Observability** | Broadcast events with per-subscriber fan-out.           | [`Event`], [`EventKind`], [`Subscriber`]   |
//! | **Errors**        | Typed registration and hook errors.                     | [`MachineError`], [`ActionError`]          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use statevisor::{ActionError, Command, MachineBuilder, MachineConfig, StateName};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = MachineBuilder::new(MachineConfig::named("demo"));
//!
//!     builder
//!         .get_state(StateName::IDLE)?
//!         .on(Command::new("initialise"))
//!         .goto("initialising")?;
//!     builder
//!         .add_state("initialising")?
//!         .on_enter(|_payload, _token| async { Ok::<(), ActionError>(()) })
//!         .on(Command::new("finish"))
//!         .goto("finishing")?
//!         .timeout_after(Duration::from_secs(30));
//!     builder
//!         .add_state("finishing")?
//!         .auto_advance(Command::DONE)
//!         .on(Command::DONE)
//!         .goto(StateName::IDLE)?;
//!
//!     let machine = builder.build();
//!
//!     machine.enqueue_transition(Command::new("initialise"), None)?;
//!     machine.enqueue_transition(Command::new("finish"), None)?;
//!
//!     // ... the worker walks idle -> initialising -> finishing -> idle
//!
//!     machine.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod states;
mod subscribers;

// ---- Public re-exports ----

pub use core::{MachineBuilder, MachineConfig, StateMachine};
pub use error::{ActionError, MachineError, TransitionError};
pub use events::{Bus, Event, EventKind};
pub use states::{Action, Command, Payload, State, StateHandle, StateName, TransitionClause};
pub use subscribers::{Subscriber, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
