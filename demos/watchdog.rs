//! Per-state timeout in action.
//!
//! Arms a state with a two second window and sends no qualifying command.
//! The timer expires, the machine cancels itself with
//! `"timeout exceeded"`, and the log shows the automatic path back
//! through canceled to idle.
//!
//! Run with: `cargo run --example watchdog --features logging`

use std::sync::Arc;
use std::time::Duration;

use statevisor::{Command, LogWriter, MachineBuilder, MachineConfig, StateName, Subscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = MachineBuilder::new(MachineConfig::named("watchdog"))
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscriber>]);

    builder
        .get_state(StateName::IDLE)?
        .on(Command::new("arm"))
        .goto("armed")?;

    builder
        .add_state("armed")?
        .on(Command::new("disarm"))
        .goto(StateName::IDLE)?
        .timeout_after(Duration::from_secs(2));

    let machine = builder.build();

    machine.enqueue_transition(Command::new("arm"), None)?;
    println!("armed; sending nothing and waiting for the watchdog...");

    tokio::time::sleep(Duration::from_secs(3)).await;

    println!(
        "now in {:?} (was {:?})",
        machine.current_state().as_str(),
        machine.last_state().map(|s| s.as_str().to_string()),
    );

    machine.shutdown().await?;
    Ok(())
}
