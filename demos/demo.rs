//! Console-driven demo machine.
//!
//! Reads commands from stdin and feeds them to the engine:
//! `initialise` moves idle to initialising, `finish` moves on to the
//! auto-advancing finishing state, `cancel` force-aborts, `exit` quits.
//! Leaving the machine in initialising for 30 seconds trips the state
//! timeout and cancels back to idle on its own.
//!
//! Run with: `cargo run --example demo --features logging`

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use statevisor::{
    ActionError, Command, LogWriter, MachineBuilder, MachineConfig, StateName, Subscriber,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = MachineBuilder::new(MachineConfig::named("demo"))
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscriber>]);

    builder
        .get_state(StateName::IDLE)?
        .on(Command::new("initialise"))
        .goto("initialising")?;

    builder
        .add_state("initialising")?
        .on_enter(|_payload, _token| async {
            println!("... setting things up");
            Ok::<(), ActionError>(())
        })
        .on(Command::new("finish"))
        .goto("finishing")?
        .timeout_after(Duration::from_secs(30));

    builder
        .add_state("finishing")?
        .on_enter(|_payload, _token| async {
            println!("... wrapping up");
            Ok::<(), ActionError>(())
        })
        .auto_advance(Command::DONE)
        .on(Command::DONE)
        .goto(StateName::IDLE)?;

    let machine = builder.build();

    println!("commands: initialise, finish, cancel, exit");
    let stdin = io::stdin();
    loop {
        print!("command: ");
        io::stdout().flush()?;

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let input = line?.trim().to_lowercase();

        match input.as_str() {
            "" => continue,
            "exit" => break,
            "cancel" => machine.cancel_with("user requested"),
            command => {
                if let Err(err) = machine.enqueue_transition(Command::new(command.to_string()), None)
                {
                    eprintln!("error: {err}");
                }
            }
        }
    }

    machine.shutdown().await?;
    Ok(())
}
