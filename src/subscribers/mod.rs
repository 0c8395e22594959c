//! # Event subscribers for the machine.
//!
//! This module provides the [`Subscriber`] trait and the fan-out machinery
//! for handling events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   worker / cancel / timer ── publish(Event) ──► Bus
//!                                                  │
//!                                       subscriber listener (per machine)
//!                                                  │
//!                                          SubscriberSet::emit(&Event)
//!                                           ┌───────┼───────┐
//!                                           ▼       ▼       ▼
//!                                      [queue S1] [queue S2] ...
//!                                           ▼       ▼
//!                                    sub1.on_event  sub2.on_event
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** observe and react to events (logging,
//!   metrics, alerts).
//! - The built-in [`LogWriter`] (feature `logging`) prints events to
//!   stdout for demos.

mod set;
mod subscriber;

pub use set::SubscriberSet;
pub use subscriber::Subscriber;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
