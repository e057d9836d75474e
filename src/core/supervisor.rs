//! # Supervision loop: multiplexes child events and drives restarts.
//!
//! The [`Supervisor`] materializes program records from the loaded
//! configuration, arms and starts the autostart set, installs the shutdown
//! controller, and then runs the monitor loop until one of the documented
//! exit codes fires.
//!
//! ```text
//! AllConfig ──► Supervisor::new()        resolve commands; unresolvable → born FATAL
//!                    │
//!         Supervisor::run()
//!            ├─► arm + start autostart programs (one runner task per start)
//!            ├─► install shutdown controller    (signals → teardown)
//!            └─► monitor loop:
//!                  scan statuses ──► exit_on verdict (code 2/3, latch clear)
//!                  select across status streams ──► apply transition
//!                     RUNNING ──► best-effort nice value
//!                     other   ──► restart decision
//! ```
//!
//! ## Rules
//! - `status` and `start_count` are written only here (and at bootstrap).
//! - Runners never mutate records; they report on the status stream.
//! - Only `FATAL` is terminal to the loop; with every program terminal the
//!   loop idles in five-second naps.
//! - The shutdown latch suppresses both `exit_on` verdicts so the teardown
//!   path can run to completion.

use std::sync::Arc;
use std::time::Duration;

use futures::future::select_all;
use tracing::{debug, info, warn};

use crate::config::{AllConfig, AutoRestart, ExitPolicy};
use crate::core::program::{Program, RunningData};
use crate::core::runner::{resolve_command, run_child};
use crate::core::shutdown;
use crate::core::state::ProcState;
use crate::core::stream::{status_stream, StatusReceiver};
use crate::error::SupervisorError;

/// How long the loop naps when every program is terminal.
const IDLE_SLEEP: Duration = Duration::from_secs(5);

/// Owns the program records and the receiving half of every status stream.
pub struct Supervisor {
    data: Arc<RunningData>,
    receivers: Vec<StatusReceiver>,
}

impl Supervisor {
    /// Materializes program records from the configuration.
    ///
    /// Each program's first command token is resolved against `PATH` once,
    /// here. A program with no command or an unresolvable command is born
    /// `FATAL` and is never armed.
    pub fn new(config: AllConfig) -> Self {
        let AllConfig {
            supervisord,
            programs: configured,
            ..
        } = config;

        let mut programs = Vec::new();
        let mut receivers = Vec::new();
        for (_, prog_config) in configured {
            let name = prog_config.process_name.clone();
            let command_path = match prog_config.command.first() {
                None => {
                    warn!(program = %name, "no command specified");
                    None
                }
                Some(first) => {
                    let resolved = resolve_command(first);
                    if resolved.is_none() {
                        warn!(program = %name, command = %first, "could not find command");
                    }
                    resolved
                }
            };

            let (tx, rx) = status_stream();
            let program = Program::new(prog_config, command_path, tx);
            program.set_status(ProcState::Stopped);
            if program.command_path.is_none() {
                program.set_status(ProcState::Fatal);
            }
            programs.push(Arc::new(program));
            receivers.push(rx);
        }

        Self {
            data: Arc::new(RunningData::new(programs, supervisord)),
            receivers,
        }
    }

    /// The supervised program records, in configuration order.
    pub fn programs(&self) -> &[Arc<Program>] {
        &self.data.programs
    }

    /// Arms and starts every autostart program, installs the shutdown
    /// controller, and hands control to the monitor loop.
    ///
    /// The loop never returns; the supervisor leaves through one of its
    /// documented exit codes (2/3 from the `exit_on` policy, 0/1 from the
    /// shutdown sequencer).
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        for program in &self.data.programs {
            if program.config.autostart {
                program.arm();
                self.start_runnable(program);
            }
        }
        shutdown::install(self.data.clone())?;
        self.monitor().await;
        Ok(())
    }

    async fn monitor(&mut self) {
        loop {
            let any_fatal = self
                .data
                .programs
                .iter()
                .any(|p| p.status() == ProcState::Fatal);
            let any_runnable = self
                .data
                .programs
                .iter()
                .any(|p| p.status() != ProcState::Fatal);

            if any_fatal {
                if let Some(code) = exit_verdict(
                    self.data.supervisord.exit_on,
                    true,
                    !any_runnable,
                    self.data.in_shutdown(),
                ) {
                    std::process::exit(code);
                }
            }

            if any_runnable {
                let received = {
                    let streams = self.receivers.iter_mut().map(|rx| Box::pin(rx.recv()));
                    let (state, index, _) = select_all(streams).await;
                    state.map(|state| (index, state))
                };
                if let Some((index, state)) = received {
                    self.apply_transition(index, state);
                }
            } else {
                if let Some(code) = exit_verdict(
                    self.data.supervisord.exit_on,
                    any_fatal,
                    true,
                    self.data.in_shutdown(),
                ) {
                    std::process::exit(code);
                }
                info!("nothing to do, waiting");
                tokio::time::sleep(IDLE_SLEEP).await;
            }
        }
    }

    /// Applies a status received from program `index`'s stream: stamps the
    /// record, then applies the nice value (RUNNING) or the restart decision
    /// (anything else).
    fn apply_transition(&self, index: usize, state: ProcState) {
        let program = &self.data.programs[index];
        program.set_status(state);
        if state == ProcState::Running {
            apply_priority(program);
        } else {
            self.start_runnable(program);
        }
    }

    /// The restart decision on receipt of a non-RUNNING status.
    ///
    /// `STOPPED` starts only once armed; `BACKOFF` bumps the start counter
    /// before consulting the policy; `EXITED` resets it.
    fn start_runnable(&self, program: &Arc<Program>) {
        match program.status() {
            ProcState::Stopped => {
                if program.startable() {
                    info!(program = %program.config.process_name, "starting");
                    program.set_status(ProcState::Starting);
                    program.bump_start_count();
                    tokio::spawn(run_child(program.clone()));
                }
            }
            ProcState::Backoff => {
                program.bump_start_count();
                self.try_restart(program);
            }
            ProcState::Exited => {
                program.reset_start_count();
                self.try_restart(program);
            }
            _ => {}
        }
    }

    fn try_restart(&self, program: &Arc<Program>) {
        if can_restart(program) {
            info!(program = %program.config.process_name, "restarting");
            program.set_status(ProcState::Starting);
            tokio::spawn(run_child(program.clone()));
        } else if matches!(program.status(), ProcState::Stopped | ProcState::Exited) {
            info!(
                program = %program.config.process_name,
                state = %program.status(),
                "not restarting"
            );
        } else {
            program.set_status(ProcState::Fatal);
            info!(program = %program.config.process_name, "will not restart automatically");
        }
    }
}

/// Whether a restart is permitted.
///
/// A program in `BACKOFF` whose start counter strictly exceeds its retry
/// budget is out of retries regardless of policy. `Always` restarts
/// unconditionally; `Unexpected` restarts when the recorded exit status
/// (stripped of a leading `"exit status "`) matches one of the configured
/// `exitcodes` tokens.
fn can_restart(program: &Program) -> bool {
    if program.status() == ProcState::Backoff
        && program.start_count() > program.config.startretries
    {
        return false;
    }

    match program.config.autorestart {
        AutoRestart::Always => true,
        AutoRestart::Unexpected => {
            let report = program.run.report();
            debug!(
                program = %program.config.process_name,
                status = %report.status,
                "handling 'unexpected' exit"
            );
            let status = report
                .status
                .strip_prefix("exit status ")
                .unwrap_or(&report.status);
            if program.config.exitcodes.split(',').any(|code| code == status) {
                return true;
            }
            info!(
                program = %program.config.process_name,
                status = %report.status,
                expected = %program.config.exitcodes,
                "unexpected exit"
            );
            false
        }
        AutoRestart::Never => false,
    }
}

/// Exit code mandated by the `exit_on` policy, if any: 2 when `ANY_FATAL`
/// and at least one program is FATAL, 3 when `ALL_FATAL` and nothing can
/// run. The shutdown latch suppresses both.
fn exit_verdict(
    exit_on: Option<ExitPolicy>,
    any_fatal: bool,
    all_fatal: bool,
    in_shutdown: bool,
) -> Option<i32> {
    if in_shutdown {
        return None;
    }
    match exit_on {
        Some(ExitPolicy::AnyFatal) if any_fatal => Some(2),
        Some(ExitPolicy::AllFatal) if all_fatal => Some(3),
        _ => None,
    }
}

/// Best-effort nice adjustment for a freshly RUNNING child.
fn apply_priority(program: &Program) {
    let Some(pid) = program.run.pid() else {
        return;
    };
    let rc = unsafe {
        libc::setpriority(libc::PRIO_PROCESS as _, pid as _, program.config.priority as _)
    };
    if rc == 0 {
        info!(
            program = %program.config.process_name,
            priority = program.config.priority,
            "priority set"
        );
    } else {
        warn!(
            program = %program.config.process_name,
            error = %std::io::Error::last_os_error(),
            "could not set priority"
        );
    }
}
