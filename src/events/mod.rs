//! Machine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the worker, the cancellation
//! path, the timeout timer, and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `StateMachine` (enqueue/cancel/shutdown), the worker
//!   loop, the timeout timer, `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the machine's subscriber listener, which fans events
//!   out to the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
