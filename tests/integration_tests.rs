//! End-to-end tests driving a full machine through the worker: transition
//! flow, queue draining on cancel, timeouts, fault conversion, and
//! shutdown. Virtual time (`start_paused`) keeps the timeout scenarios
//! instant and deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use statevisor::{
    ActionError, Command, Event, EventKind, MachineBuilder, MachineConfig, MachineError, Payload,
    StateMachine, StateName, Subscriber,
};

fn initialise() -> Command {
    Command::new("initialise")
}

fn finish() -> Command {
    Command::new("finish")
}

fn initialising() -> StateName {
    StateName::new("initialising")
}

fn finishing() -> StateName {
    StateName::new("finishing")
}

/// Captures every event the machine publishes.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.kinds().iter().filter(|k| **k == kind).count()
    }

    fn find(&self, kind: EventKind) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
    }

    fn entered(&self, state: &StateName) -> bool {
        self.events.lock().unwrap().iter().any(|e| {
            e.kind == EventKind::StateEntered && e.state.as_ref() == Some(state)
        })
    }
}

#[async_trait]
impl Subscriber for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Polls until `cond` holds, failing the test after five virtual seconds.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    time::timeout(Duration::from_secs(5), async {
        loop {
            if cond() {
                return;
            }
            time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn settled_in_idle_after_cancel(machine: &Arc<StateMachine>) {
    wait_until(|| {
        machine.current_state() == StateName::IDLE
            && machine.last_state() == Some(StateName::CANCELED)
    })
    .await;
}

/// The demo machine shape: idle -> initialising -> finishing -> idle, with
/// a timeout on initialising and an auto-advancing finishing state.
fn demo_builder(timeout: Duration) -> (MachineBuilder, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut builder = MachineBuilder::new(MachineConfig::named("test"))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscriber>]);

    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on(initialise())
        .goto("initialising")
        .expect("wire idle");
    builder
        .add_state("initialising")
        .expect("initialising")
        .on(finish())
        .goto("finishing")
        .expect("wire initialising")
        .timeout_after(timeout);
    builder
        .add_state("finishing")
        .expect("finishing")
        .auto_advance(Command::DONE)
        .on(Command::DONE)
        .goto(StateName::IDLE)
        .expect("wire finishing");

    (builder, recorder)
}

#[tokio::test(start_paused = true)]
async fn machine_starts_in_idle() {
    let (builder, _recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    assert_eq!(machine.current_state(), StateName::IDLE);
    assert_eq!(machine.last_state(), None);

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn registered_command_walks_the_machine_to_its_target() {
    let (builder, _recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    assert_eq!(machine.last_state(), Some(StateName::IDLE));
    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn full_run_passes_through_finishing_and_returns_to_idle() {
    let (builder, recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue initialise");
    machine
        .enqueue_transition(finish(), None)
        .expect("enqueue finish");

    // finishing auto-advances via done, so the resting point is idle
    wait_until(|| {
        machine.current_state() == StateName::IDLE
            && machine.last_state() == Some(finishing())
    })
    .await;

    wait_until(|| recorder.entered(&initialising())).await;
    assert!(recorder.entered(&finishing()));
    assert!(recorder.count(EventKind::CancelRequested) == 0);

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn exit_hook_runs_before_entry_hook() {
    let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(Recorder::default());
    let mut builder = MachineBuilder::new(MachineConfig::named("order"))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscriber>]);

    let exit_order = order.clone();
    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on_exit(move |_payload, _token| {
            let order = exit_order.clone();
            async move {
                order.lock().unwrap().push("exit idle".to_string());
                Ok::<(), ActionError>(())
            }
        })
        .on(initialise())
        .goto("initialising")
        .expect("wire idle");

    let enter_order = order.clone();
    builder
        .add_state("initialising")
        .expect("initialising")
        .on_enter(move |_payload, _token| {
            let order = enter_order.clone();
            async move {
                order.lock().unwrap().push("enter initialising".to_string());
                Ok::<(), ActionError>(())
            }
        });

    let machine = builder.build();
    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    assert_eq!(
        *order.lock().unwrap(),
        vec!["exit idle".to_string(), "enter initialising".to_string()]
    );

    // the events agree with the hook order
    wait_until(|| recorder.count(EventKind::StateEntered) > 0).await;
    let exited = recorder.find(EventKind::StateExited).expect("exited event");
    let entered = recorder
        .find(EventKind::StateEntered)
        .expect("entered event");
    assert!(exited.seq < entered.seq);

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn payload_reaches_both_hooks() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut builder = MachineBuilder::new(MachineConfig::named("payload"));

    let seen_exit = seen.clone();
    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on_exit(move |payload: Option<Payload>, _token| {
            let seen = seen_exit.clone();
            async move {
                if let Some(p) = payload.as_ref().and_then(|p| p.downcast_ref::<String>()) {
                    seen.lock().unwrap().push(format!("exit:{p}"));
                }
                Ok::<(), ActionError>(())
            }
        })
        .on(initialise())
        .goto("initialising")
        .expect("wire idle");

    let seen_enter = seen.clone();
    builder
        .add_state("initialising")
        .expect("initialising")
        .on_enter(move |payload: Option<Payload>, _token| {
            let seen = seen_enter.clone();
            async move {
                if let Some(p) = payload.as_ref().and_then(|p| p.downcast_ref::<String>()) {
                    seen.lock().unwrap().push(format!("enter:{p}"));
                }
                Ok::<(), ActionError>(())
            }
        });

    let machine = builder.build();
    let payload: Payload = Arc::new("job-42".to_string());
    machine
        .enqueue_transition(initialise(), Some(payload))
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["exit:job-42".to_string(), "enter:job-42".to_string()]
    );

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn enqueueing_the_reserved_cancel_command_fails_synchronously() {
    let (builder, _recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    let err = machine
        .enqueue_transition(Command::CANCEL, None)
        .unwrap_err();
    assert!(matches!(err, MachineError::ReservedCommand));

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn cancel_lands_in_canceled_then_idle() {
    let (builder, recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    machine.cancel_with("manual");
    settled_in_idle_after_cancel(&machine).await;

    wait_until(|| recorder.count(EventKind::CancelRequested) > 0).await;
    let cancel = recorder
        .find(EventKind::CancelRequested)
        .expect("cancel event");
    assert_eq!(cancel.reason.as_deref(), Some("manual"));

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn cancel_drains_commands_enqueued_before_the_call() {
    // an entry hook that parks until cancelled keeps the worker busy so
    // commands pile up behind it deterministically
    let recorder = Arc::new(Recorder::default());
    let mut builder = MachineBuilder::new(MachineConfig::named("drain"))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscriber>]);

    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on(Command::new("hold"))
        .goto("holding")
        .expect("wire idle");
    builder
        .add_state("holding")
        .expect("holding")
        .on_enter(|_payload, token| async move {
            token.cancelled().await;
            Err::<(), ActionError>(ActionError::Canceled)
        })
        .on(Command::new("step"))
        .goto("stepped")
        .expect("wire holding");
    builder
        .add_state("stepped")
        .expect("stepped");

    let machine = builder.build();
    machine
        .enqueue_transition(Command::new("hold"), None)
        .expect("enqueue hold");
    // the slot swaps before the entry hook runs, so this observes the
    // worker parked inside holding's entry
    wait_until(|| machine.current_state() == StateName::new("holding")).await;

    machine
        .enqueue_transition(Command::new("step"), None)
        .expect("enqueue step");
    machine
        .enqueue_transition(Command::new("step"), None)
        .expect("enqueue step");

    machine.cancel_with("drain them");
    settled_in_idle_after_cancel(&machine).await;

    wait_until(|| recorder.count(EventKind::CancelRequested) > 0).await;
    let cancel = recorder
        .find(EventKind::CancelRequested)
        .expect("cancel event");
    assert_eq!(cancel.drained, Some(2), "both queued steps were discarded");
    assert!(
        !recorder.entered(&StateName::new("stepped")),
        "no drained command may ever run"
    );

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn command_enqueued_after_cancel_is_checked_against_idle() {
    let (builder, recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    machine.cancel_with("manual");
    // finish is not registered from idle, so once the cancel settles the
    // worker rejects it and triggers a second, internally generated cancel
    machine
        .enqueue_transition(finish(), None)
        .expect("enqueue finish");

    wait_until(|| recorder.count(EventKind::TransitionRejected) > 0).await;
    let rejected = recorder
        .find(EventKind::TransitionRejected)
        .expect("rejection");
    assert_eq!(rejected.command, Some(finish()));

    wait_until(|| recorder.count(EventKind::CancelRequested) >= 2).await;
    settled_in_idle_after_cancel(&machine).await;

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn state_timeout_cancels_into_idle_automatically() {
    let (builder, recorder) = demo_builder(Duration::from_millis(100));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    time::sleep(Duration::from_millis(150)).await;
    settled_in_idle_after_cancel(&machine).await;

    wait_until(|| recorder.count(EventKind::TimeoutHit) > 0).await;
    let cancel = recorder
        .find(EventKind::CancelRequested)
        .expect("cancel event");
    assert_eq!(cancel.reason.as_deref(), Some("timeout exceeded"));

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn leaving_a_state_in_time_disarms_its_timeout() {
    let (builder, recorder) = demo_builder(Duration::from_millis(200));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue initialise");
    machine
        .enqueue_transition(finish(), None)
        .expect("enqueue finish");

    wait_until(|| {
        machine.current_state() == StateName::IDLE
            && machine.last_state() == Some(finishing())
    })
    .await;

    // well past the would-be deadline: the timer must not have fired
    time::sleep(Duration::from_millis(400)).await;
    assert_eq!(recorder.count(EventKind::TimeoutHit), 0);
    assert_eq!(recorder.count(EventKind::CancelRequested), 0);
    assert_eq!(machine.current_state(), StateName::IDLE);

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn double_cancel_settles_without_deadlock_and_machine_stays_usable() {
    let (builder, _recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    machine.cancel_with("first");
    machine.cancel_with("second");
    settled_in_idle_after_cancel(&machine).await;

    // still usable after the storm
    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue again");
    wait_until(|| machine.current_state() == initialising()).await;

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn failing_entry_hook_converts_into_cancellation_with_its_message() {
    let recorder = Arc::new(Recorder::default());
    let mut builder = MachineBuilder::new(MachineConfig::named("faulty"))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscriber>]);

    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on(Command::new("blow"))
        .goto("exploding")
        .expect("wire idle");
    builder
        .add_state("exploding")
        .expect("exploding")
        .on_enter(|_payload, _token| async {
            Err::<(), ActionError>(ActionError::failed("entry hook blew up"))
        });

    let machine = builder.build();
    machine
        .enqueue_transition(Command::new("blow"), None)
        .expect("enqueue");

    settled_in_idle_after_cancel(&machine).await;

    wait_until(|| recorder.count(EventKind::ActionFailed) > 0).await;
    let fault = recorder.find(EventKind::ActionFailed).expect("fault");
    assert_eq!(fault.reason.as_deref(), Some("entry hook blew up"));
    let cancel = recorder
        .find(EventKind::CancelRequested)
        .expect("cancel event");
    assert_eq!(cancel.reason.as_deref(), Some("entry hook blew up"));

    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn run_data_is_cleared_when_the_machine_returns_to_idle() {
    let (builder, _recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue");
    wait_until(|| machine.current_state() == initialising()).await;

    machine.set_data("job", Arc::new("job-42".to_string()) as Payload);
    assert!(machine.data("job").is_some());

    machine.cancel_with("wipe");
    settled_in_idle_after_cancel(&machine).await;

    assert!(machine.data("job").is_none());
    machine.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_idempotent_and_stops_processing() {
    let (builder, recorder) = demo_builder(Duration::from_secs(30));
    let machine = builder.build();

    machine.shutdown().await.expect("first shutdown");
    machine.shutdown().await.expect("second shutdown");

    assert!(recorder.count(EventKind::WorkerStopped) <= 1);

    // enqueue still succeeds (fire-and-forget) but nothing processes
    machine
        .enqueue_transition(initialise(), None)
        .expect("enqueue after shutdown");
    time::sleep(Duration::from_millis(100)).await;
    assert_eq!(machine.current_state(), StateName::IDLE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_all_get_processed() {
    let recorder = Arc::new(Recorder::default());
    let mut builder = MachineBuilder::new(MachineConfig::named("concurrent"))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscriber>]);

    // idle -> pong -> (auto done) -> idle, once per ping
    builder
        .get_state(StateName::IDLE)
        .expect("idle")
        .on(Command::new("ping"))
        .goto("pong")
        .expect("wire idle");
    builder
        .add_state("pong")
        .expect("pong")
        .auto_advance(Command::DONE)
        .on(Command::DONE)
        .goto(StateName::IDLE)
        .expect("wire pong");

    let machine = builder.build();

    let mut producers = Vec::new();
    for _ in 0..10 {
        let machine = Arc::clone(&machine);
        producers.push(tokio::spawn(async move {
            machine
                .enqueue_transition(Command::new("ping"), None)
                .expect("enqueue ping");
        }));
    }
    for p in producers {
        p.await.expect("producer task");
    }

    wait_until(|| recorder.count(EventKind::StateEntered) >= 20).await;

    let pong = StateName::new("pong");
    let pongs = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind == EventKind::StateEntered && e.state.as_ref() == Some(&pong))
        .count();
    assert_eq!(pongs, 10, "every ping bounced through pong exactly once");
    assert_eq!(machine.current_state(), StateName::IDLE);

    machine.shutdown().await.expect("shutdown");
}
