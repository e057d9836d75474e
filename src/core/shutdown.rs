//! # Signal-driven teardown of the supervised set.
//!
//! [`install`] arms SIGTERM, SIGINT, and SIGUSR1 and parks a controller task
//! on them. On the first signal the controller takes over from the
//! supervision loop:
//!
//! 1. Set the one-way shutdown latch (suppresses the `exit_on` verdicts).
//! 2. For every program not already in `STOPPED`/`EXITED`/`FATAL`: push
//!    `FATAL` onto its status stream so the loop stops restarting it, then
//!    deliver the configured stop signal to the recorded child PID,
//!    escalating to SIGKILL when delivery fails for a live process.
//! 3. Wait (bounded per program by `stopwaitsecs`) for each signalled
//!    child's runner to record a terminal status.
//! 4. Exit 0 iff every child that ever ran terminated successfully, else 1.

use std::sync::Arc;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::core::program::{Program, RunningData};
use crate::core::state::ProcState;
use crate::error::SupervisorError;

/// Maps a configured `stopsignal` name to the OS signal delivered at
/// shutdown. Anything unrecognized force-kills.
pub fn stop_signal(name: &str) -> Signal {
    match name {
        "TERM" => Signal::SIGTERM,
        "HUP" => Signal::SIGHUP,
        "INT" => Signal::SIGINT,
        "QUIT" => Signal::SIGQUIT,
        "USR1" => Signal::SIGUSR1,
        "USR2" => Signal::SIGUSR2,
        _ => Signal::SIGKILL,
    }
}

/// Arms the shutdown signals and spawns the controller task.
pub fn install(data: Arc<RunningData>) -> Result<(), SupervisorError> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(SupervisorError::Signals)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(SupervisorError::Signals)?;
    let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(SupervisorError::Signals)?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("got signal SIGTERM"),
            _ = sigint.recv() => info!("got signal SIGINT"),
            _ = sigusr1.recv() => info!("got signal SIGUSR1"),
        }
        let code = tear_down(&data).await;
        std::process::exit(code);
    });
    Ok(())
}

/// Forces every live program into termination and computes the supervisor's
/// exit code.
async fn tear_down(data: &RunningData) -> i32 {
    data.begin_shutdown();

    let mut signalled = Vec::new();
    for program in &data.programs {
        if matches!(
            program.status(),
            ProcState::Fatal | ProcState::Exited | ProcState::Stopped
        ) {
            continue;
        }
        // Stop the loop from restarting it, then take the child down.
        program.events.emit(ProcState::Fatal);
        deliver_stop_signal(program);
        signalled.push(program.clone());
    }

    for program in &signalled {
        let wait = Duration::from_secs(program.config.stopwaitsecs);
        let mut alive = program.run.subscribe_alive();
        let terminated = tokio::time::timeout(wait, alive.wait_for(|live| !*live)).await;
        if terminated.is_err() {
            warn!(
                program = %program.config.process_name,
                wait_secs = program.config.stopwaitsecs,
                "child still running after stop wait"
            );
        }
    }

    info!("shutdown complete");
    exit_code(&data.programs)
}

/// Delivers the configured stop signal to `program`'s child.
///
/// Escalates to SIGKILL when delivery fails, unless the configured signal
/// already kills (KILL, QUIT) or the child is already gone (ESRCH).
fn deliver_stop_signal(program: &Program) {
    let configured = stop_signal(&program.config.stopsignal);
    let Some(pid) = program.run.pid() else {
        warn!(program = %program.config.process_name, "no child process recorded, nothing to signal");
        return;
    };
    let pid = Pid::from_raw(pid as i32);

    info!(program = %program.config.process_name, signal = %configured, "stopping child");
    if let Err(errno) = kill(pid, configured) {
        if configured != Signal::SIGKILL && configured != Signal::SIGQUIT && errno != Errno::ESRCH
        {
            warn!(
                program = %program.config.process_name,
                error = %errno,
                "stop signal failed, escalating to SIGKILL"
            );
            let _ = kill(pid, Signal::SIGKILL);
        }
    }
}

/// 0 iff every program that ever ran a child saw it terminate with code 0.
fn exit_code(programs: &[Arc<Program>]) -> i32 {
    let all_ok = programs
        .iter()
        .filter(|p| p.run.has_run())
        .all(|p| !p.run.alive() && p.run.report().code == 0);
    if all_ok {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProgramConfig, SupervisordConfig};
    use crate::core::runner::{resolve_command, run_child};
    use crate::core::stream::{status_stream, StatusReceiver};

    #[test]
    fn maps_the_documented_signal_names() {
        assert_eq!(stop_signal("TERM"), Signal::SIGTERM);
        assert_eq!(stop_signal("HUP"), Signal::SIGHUP);
        assert_eq!(stop_signal("INT"), Signal::SIGINT);
        assert_eq!(stop_signal("QUIT"), Signal::SIGQUIT);
        assert_eq!(stop_signal("USR1"), Signal::SIGUSR1);
        assert_eq!(stop_signal("USR2"), Signal::SIGUSR2);
        assert_eq!(stop_signal("KILL"), Signal::SIGKILL);
    }

    #[test]
    fn unknown_signal_names_force_kill() {
        assert_eq!(stop_signal("SIGTERM"), Signal::SIGKILL);
        assert_eq!(stop_signal(""), Signal::SIGKILL);
    }

    fn bare_program(name: &str) -> (Arc<Program>, StatusReceiver) {
        let (tx, rx) = status_stream();
        (
            Arc::new(Program::new(ProgramConfig::defaults(name), None, tx)),
            rx,
        )
    }

    #[test]
    fn exit_code_ignores_programs_that_never_ran() {
        let (never_ran, _rx) = bare_program("idle");
        assert_eq!(exit_code(&[never_ran]), 0);
    }

    #[test]
    fn exit_code_requires_every_run_to_have_succeeded() {
        let (ok, _rx1) = bare_program("ok");
        ok.run.publish_pid(101);
        ok.run.record_exit("0", 0);

        let (failed, _rx2) = bare_program("failed");
        failed.run.publish_pid(102);
        failed.run.record_exit("exit status 3", 3);

        assert_eq!(exit_code(&[ok.clone()]), 0);
        assert_eq!(exit_code(&[ok, failed]), 1);
    }

    #[test]
    fn exit_code_counts_a_still_running_child_as_failure() {
        let (stuck, _rx) = bare_program("stuck");
        stuck.run.publish_pid(103);
        assert_eq!(exit_code(&[stuck]), 1);
    }

    #[tokio::test]
    async fn tear_down_signals_a_running_child_and_reports_failure() {
        let mut config = ProgramConfig::defaults("sleeper");
        config.command = vec!["/bin/sleep".to_string(), "30".to_string()];
        config.stopwaitsecs = 5;
        let (tx, mut rx) = status_stream();
        let program = Arc::new(Program::new(config, resolve_command("/bin/sleep"), tx));

        let runner = tokio::spawn(run_child(program.clone()));
        assert_eq!(rx.recv().await, Some(ProcState::Running));
        program.set_status(ProcState::Running);

        let data = RunningData::new(vec![program.clone()], SupervisordConfig::default());
        let code = tear_down(&data).await;

        // SIGTERM took the sleeper down; dying by signal is not a clean exit.
        assert_eq!(code, 1);
        assert!(data.in_shutdown());
        assert_eq!(rx.recv().await, Some(ProcState::Fatal));
        assert!(program.run.report().status.starts_with("signal:"));
        runner.await.expect("runner finished");
    }

    #[tokio::test]
    async fn tear_down_skips_programs_already_terminal() {
        let (done, mut rx) = bare_program("done");
        done.set_status(ProcState::Exited);
        done.run.publish_pid(104);
        done.run.record_exit("0", 0);

        let data = RunningData::new(vec![done], SupervisordConfig::default());
        assert_eq!(tear_down(&data).await, 0);
        // No FATAL override was pushed for an already-terminal program.
        assert!(rx.try_recv().is_err());
    }
}
