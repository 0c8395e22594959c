//! # Stored entry/exit hook ([`Action`]).
//!
//! [`Action`] wraps a closure `F: Fn(Option<Payload>, CancellationToken) -> Fut`,
//! producing a fresh future per invocation. Hooks run inline on the machine
//! worker, so they should be fast or observe the token cooperatively.
//!
//! ## Contract
//! - A hook that notices the token fired should return
//!   [`ActionError::Canceled`]; the engine treats that as a routine abort.
//! - Any other error ([`ActionError::Failed`]) forces the machine into the
//!   canceled state with the error text as the reason.
//!
//! ## Example
//! ```rust
//! use statevisor::{Action, ActionError};
//!
//! let hook = Action::from_fn(|_payload, token| async move {
//!     if token.is_cancelled() {
//!         return Err(ActionError::Canceled);
//!     }
//!     // do work...
//!     Ok(())
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;
use crate::states::token::Payload;

type ActionFn =
    dyn Fn(Option<Payload>, CancellationToken) -> BoxFuture<'static, Result<(), ActionError>>
        + Send
        + Sync;

/// Entry or exit hook attached to a state.
///
/// Cheap to clone (internally an `Arc`). Each invocation creates a new
/// future owning its own captured state.
#[derive(Clone)]
pub struct Action {
    f: Arc<ActionFn>,
}

impl Action {
    /// Wraps a closure into a stored hook.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<Payload>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |payload, token| Box::pin(f(payload, token))),
        }
    }

    /// Runs the hook with the payload of the command being processed and
    /// the live cancellation token.
    pub(crate) fn invoke(
        &self,
        payload: Option<Payload>,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<(), ActionError>> {
        (self.f)(payload, token)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action")
    }
}
