//! Program records and the running-data aggregate.
//!
//! A [`Program`] is the runtime record of one supervised program. Its fields
//! split by writer:
//!
//! - `status`/`changed_at` and the start counter are written only by the
//!   supervision loop (and bootstrap).
//! - The shared [`RunState`] is written by the runner: the child PID is
//!   published before `RUNNING` is emitted on the status stream, and the exit
//!   report is recorded before the terminal `EXITED`/`BACKOFF`, so readers
//!   that observe the event also observe the data.
//!
//! [`RunningData`] owns the supervised set, the global configuration, and the
//! one-way shutdown latch.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::info;

use crate::config::{ProgramConfig, SupervisordConfig};
use crate::core::state::ProcState;
use crate::core::stream::StatusSender;

/// Exit information recorded by the runner after each child termination.
#[derive(Debug, Clone, Default)]
pub struct ExitReport {
    /// Human-readable exit description: `"0"`, `"exit status 3"`,
    /// `"signal: 15"`, or an OS error message.
    pub status: String,
    /// Numeric exit code; 99 when the OS reported none.
    pub code: i32,
}

/// Run-state shared between the runner (writer) and the supervision loop and
/// shutdown controller (readers).
pub struct RunState {
    pid: Mutex<Option<u32>>,
    report: Mutex<ExitReport>,
    has_run: AtomicBool,
    alive: watch::Sender<bool>,
}

impl RunState {
    fn new() -> Self {
        Self {
            pid: Mutex::new(None),
            report: Mutex::new(ExitReport::default()),
            has_run: AtomicBool::new(false),
            alive: watch::Sender::new(false),
        }
    }

    /// Publishes the PID of a freshly spawned child. Called before `RUNNING`
    /// is emitted on the status stream.
    pub fn publish_pid(&self, pid: u32) {
        *self.pid.lock() = Some(pid);
        self.has_run.store(true, Ordering::Relaxed);
        let _ = self.alive.send(true);
    }

    /// PID of the most recent child, if one was ever spawned.
    pub fn pid(&self) -> Option<u32> {
        *self.pid.lock()
    }

    /// Records the outcome of a terminated child. Called before the terminal
    /// status is emitted on the status stream.
    pub fn record_exit(&self, status: impl Into<String>, code: i32) {
        *self.report.lock() = ExitReport {
            status: status.into(),
            code,
        };
        let _ = self.alive.send(false);
    }

    /// The most recent exit report.
    pub fn report(&self) -> ExitReport {
        self.report.lock().clone()
    }

    /// Whether a child was ever spawned for this program.
    pub fn has_run(&self) -> bool {
        self.has_run.load(Ordering::Relaxed)
    }

    /// Whether a child currently exists (spawned and not yet reaped).
    pub fn alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Watch used by the shutdown sequencer to await child termination.
    pub fn subscribe_alive(&self) -> watch::Receiver<bool> {
        self.alive.subscribe()
    }
}

struct StateCell {
    status: ProcState,
    changed_at: SystemTime,
}

/// Runtime record of one supervised program.
pub struct Program {
    pub config: ProgramConfig,
    /// Resolved via PATH search at bootstrap; `None` for a program born FATAL.
    pub command_path: Option<PathBuf>,
    state: Mutex<StateCell>,
    start_count: AtomicU32,
    startable: AtomicBool,
    /// Sending half of this program's status stream.
    pub events: StatusSender,
    /// Shared run-state written by the runner.
    pub run: RunState,
}

impl Program {
    pub fn new(config: ProgramConfig, command_path: Option<PathBuf>, events: StatusSender) -> Self {
        Self {
            config,
            command_path,
            state: Mutex::new(StateCell {
                status: ProcState::Stopped,
                changed_at: SystemTime::now(),
            }),
            start_count: AtomicU32::new(0),
            startable: AtomicBool::new(false),
            events,
            run: RunState::new(),
        }
    }

    pub fn status(&self) -> ProcState {
        self.state.lock().status
    }

    /// Applies a status transition and stamps it. Called only by bootstrap and
    /// the supervision loop; runners report through the status stream instead.
    pub fn set_status(&self, status: ProcState) {
        let mut cell = self.state.lock();
        cell.status = status;
        cell.changed_at = SystemTime::now();
        info!(program = %self.config.process_name, state = %status, "process changed state");
    }

    /// Time of the most recent status transition.
    pub fn changed_at(&self) -> SystemTime {
        self.state.lock().changed_at
    }

    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::Relaxed)
    }

    pub fn bump_start_count(&self) {
        self.start_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset_start_count(&self) {
        self.start_count.store(0, Ordering::Relaxed);
    }

    /// Whether bootstrap has armed this program for starting.
    pub fn startable(&self) -> bool {
        self.startable.load(Ordering::Relaxed)
    }

    /// Arms the program. Bootstrap never arms a program born FATAL.
    pub fn arm(&self) {
        self.startable.store(true, Ordering::Relaxed);
    }
}

/// Owns the supervised set, the global configuration, and the shutdown latch.
pub struct RunningData {
    pub programs: Vec<Arc<Program>>,
    pub supervisord: SupervisordConfig,
    in_shutdown: AtomicBool,
}

impl RunningData {
    pub fn new(programs: Vec<Arc<Program>>, supervisord: SupervisordConfig) -> Self {
        Self {
            programs,
            supervisord,
            in_shutdown: AtomicBool::new(false),
        }
    }

    pub fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::Relaxed)
    }

    /// Sets the shutdown latch. One-way: never cleared.
    pub fn begin_shutdown(&self) {
        self.in_shutdown.store(true, Ordering::Relaxed);
    }
}
