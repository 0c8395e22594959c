//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [enqueued] machine=demo command=initialise
//! [exited] machine=demo state=idle command=initialise
//! [entered] machine=demo state=initialising command=initialise
//! [rejected] machine=demo state=idle command=finish reason="no transition..."
//! [cancel] machine=demo reason="manual" drained=2
//! [timeout] machine=demo state=initialising timeout=30000ms
//! [worker-stopped] machine=demo
//! ```

use async_trait::async_trait;

use super::Subscriber;
use crate::events::{Event, EventKind};

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use. Implement a custom [`Subscriber`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

fn label<'a>(opt: Option<&'a str>) -> &'a str {
    opt.unwrap_or("?")
}

#[async_trait]
impl Subscriber for LogWriter {
    async fn on_event(&self, e: &Event) {
        let machine = label(e.machine.as_deref());
        match e.kind {
            EventKind::CommandEnqueued => {
                if let Some(command) = &e.command {
                    println!("[enqueued] machine={machine} command={command}");
                }
            }
            EventKind::StateExited => {
                println!(
                    "[exited] machine={machine} state={} command={}",
                    label(e.state.as_ref().map(|s| s.as_str())),
                    label(e.command.as_ref().map(|c| c.as_str())),
                );
            }
            EventKind::StateEntered => {
                println!(
                    "[entered] machine={machine} state={} command={}",
                    label(e.state.as_ref().map(|s| s.as_str())),
                    label(e.command.as_ref().map(|c| c.as_str())),
                );
            }
            EventKind::TransitionRejected => {
                println!(
                    "[rejected] machine={machine} state={} command={} reason={:?}",
                    label(e.state.as_ref().map(|s| s.as_str())),
                    label(e.command.as_ref().map(|c| c.as_str())),
                    label(e.reason.as_deref()),
                );
            }
            EventKind::ActionFailed => {
                println!(
                    "[action-failed] machine={machine} state={} reason={:?}",
                    label(e.state.as_ref().map(|s| s.as_str())),
                    label(e.reason.as_deref()),
                );
            }
            EventKind::CancelRequested => {
                println!(
                    "[cancel] machine={machine} reason={:?} drained={}",
                    label(e.reason.as_deref()),
                    e.drained.unwrap_or(0),
                );
            }
            EventKind::TimeoutHit => {
                println!(
                    "[timeout] machine={machine} state={} timeout={}ms",
                    label(e.state.as_ref().map(|s| s.as_str())),
                    e.timeout_ms.unwrap_or(0),
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested] machine={machine}");
            }
            EventKind::WorkerStopped => {
                println!("[worker-stopped] machine={machine}");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] {}", label(e.reason.as_deref()));
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] {}", label(e.reason.as_deref()));
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
