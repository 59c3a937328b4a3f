//! Behavioural tests for a foreground run from bootstrap to shutdown.

use std::cell::RefCell;
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::process::{LaunchError, run_daemon_with};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestShutdownSignal,
    loopback_config,
};

const READY_TIMEOUT: Duration = Duration::from_secs(2);

type StepResult = Result<(), String>;

enum Launch {
    NotStarted,
    Running(JoinHandle<Result<(), LaunchError>>),
    Finished(Result<(), LaunchError>),
}

struct ProcessWorld {
    reporter: Arc<RecordingHealthReporter>,
    stop: TestShutdownSignal,
    launch: Launch,
}

impl ProcessWorld {
    fn spawn(&mut self) -> StepResult {
        if !matches!(self.launch, Launch::NotStarted) {
            return Err("server already launched".to_owned());
        }
        let reporter = Arc::clone(&self.reporter);
        let stop = self.stop.clone();
        self.launch = Launch::Running(thread::spawn(move || {
            run_daemon_with(&loopback_config(), reporter, &stop)
        }));
        Ok(())
    }

    fn await_event(&self, wanted: &HealthEvent) -> StepResult {
        let deadline = Instant::now() + READY_TIMEOUT;
        loop {
            let events = self.reporter.events();
            if events.contains(wanted) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(format!("{wanted:?} never reported; saw {events:?}"));
            }
            thread::sleep(Duration::from_millis(25));
        }
    }

    fn collect(&mut self) -> StepResult {
        let Launch::Running(thread) = mem::replace(&mut self.launch, Launch::NotStarted) else {
            return Err("server is not running".to_owned());
        };
        let result = thread.join().map_err(|_| "server thread panicked".to_owned())?;
        self.launch = Launch::Finished(result);
        Ok(())
    }

    fn outcome(&self) -> &Result<(), LaunchError> {
        match &self.launch {
            Launch::Finished(result) => result,
            _ => panic!("server run has not finished"),
        }
    }
}

impl Drop for ProcessWorld {
    fn drop(&mut self) {
        self.stop.trigger();
        if let Launch::Running(thread) = mem::replace(&mut self.launch, Launch::NotStarted) {
            let _ = thread.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<ProcessWorld> {
    RefCell::new(ProcessWorld {
        reporter: Arc::new(RecordingHealthReporter::default()),
        stop: TestShutdownSignal::new(),
        launch: Launch::NotStarted,
    })
}

#[given("a server started on ephemeral ports")]
fn server_started(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().spawn()?;
    world.borrow().await_event(&HealthEvent::ListenersReady)
}

#[when("shutdown is triggered")]
fn shutdown_triggered(world: &RefCell<ProcessWorld>) {
    world.borrow().stop.trigger();
}

#[when("the server run completes")]
fn run_completes(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().collect()
}

#[when("the server starts with an invalid configuration")]
fn invalid_configuration_run(world: &RefCell<ProcessWorld>) {
    let mut world = world.borrow_mut();
    world.stop.trigger();
    let reporter = Arc::clone(&world.reporter);
    let result = run_daemon_with(&FailingConfigLoader, reporter, &world.stop);
    world.launch = Launch::Finished(result);
}

#[then("the server run succeeds")]
fn run_succeeds(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let outcome = world.outcome();
    assert!(outcome.is_ok(), "{outcome:?}");
}

#[then("the lifecycle was reported in order")]
fn lifecycle_in_order(world: &RefCell<ProcessWorld>) {
    assert_eq!(
        world.borrow().reporter.events(),
        [
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapSucceeded,
            HealthEvent::ListenersReady,
            HealthEvent::ShutdownStarted,
        ]
    );
}

#[then("the server run fails during bootstrap")]
fn fails_in_bootstrap(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let outcome = world.outcome();
    assert!(matches!(outcome, Err(LaunchError::Bootstrap { .. })), "{outcome:?}");
}

#[then("the bootstrap failure was reported")]
fn failure_reported(world: &RefCell<ProcessWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        matches!(
            events.as_slice(),
            [HealthEvent::BootstrapStarting, HealthEvent::BootstrapFailed(_)]
        ),
        "{events:?}"
    );
}

#[scenario(
    path = "tests/features/server_process.feature",
    name = "The server runs until shutdown is requested"
)]
fn runs_until_shutdown(#[from(world)] world: RefCell<ProcessWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/server_process.feature",
    name = "Invalid configuration stops the launch"
)]
fn invalid_configuration(#[from(world)] world: RefCell<ProcessWorld>) {
    drop(world);
}
