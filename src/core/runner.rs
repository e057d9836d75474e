//! # One supervised execution of one child.
//!
//! [`run_child`] drives a single spawn-to-exit cycle for a program and
//! reports the outcome on the program's status stream.
//!
//! ```text
//!   build command (env, uid/gid, wired stdout/stderr)
//!          │
//!        spawn ──err──► BACKOFF
//!          │
//!      publish pid ──► RUNNING ──wait──► EXITED   (clean exit, code 0)
//!                                   └──► BACKOFF  (anything else)
//! ```
//!
//! The PID is published to the shared run-state before `RUNNING` is emitted;
//! the exit report is recorded before the terminal status is emitted. Child
//! log files are truncated and (re)created at every spawn, with `""`/`"AUTO"`
//! standing for `/dev/stdout` and `/dev/stderr`. Failures along the way are
//! logged and degrade locally; only a failed spawn aborts the run.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use nix::unistd::User;
use tokio::process::Command;
use tracing::{info, warn};

use crate::core::program::Program;
use crate::core::state::ProcState;
use crate::error::UserSwitchError;

/// Resolves `name` the way the shell would: names containing a path
/// separator are checked directly, anything else is searched along `PATH`.
pub fn resolve_command(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if name.contains('/') {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let full = dir.join(name);
        if is_executable(&full) {
            return Some(full);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Resolves the `user=` option to a uid/gid pair.
fn lookup_user(name: &str) -> Result<(u32, u32), UserSwitchError> {
    let user =
        User::from_name(name)?.ok_or_else(|| UserSwitchError::NotFound(name.to_string()))?;
    Ok((user.uid.as_raw(), user.gid.as_raw()))
}

/// Opens a child log destination, truncating any existing file. `""` and
/// `"AUTO"` map to `fallback`.
fn open_child_log(configured: &str, fallback: &str) -> std::io::Result<std::fs::File> {
    let path = if configured.is_empty() || configured == "AUTO" {
        fallback
    } else {
        configured
    };
    std::fs::File::create(path)
}

/// Runs one supervised execution of `program`'s child.
///
/// Spawned as its own task per start; the supervision loop reacts to the
/// statuses this emits and decides whether another execution follows.
pub async fn run_child(program: Arc<Program>) {
    let name = program.config.process_name.clone();
    let Some(path) = program.command_path.as_deref() else {
        // Bootstrap never arms a program without a resolved command.
        program.events.emit(ProcState::Backoff);
        return;
    };

    let mut cmd = Command::new(path);
    cmd.stdin(Stdio::null());
    if program.config.command.len() > 1 {
        let args = &program.config.command[1..];
        info!(program = %name, command = %path.display(), ?args, "running");
        cmd.args(args);
    } else {
        info!(program = %name, command = %path.display(), "running");
    }

    // Environment pairs are scoped to the spawn; the supervisor's own
    // environment is left alone.
    if !program.config.environment.is_empty() {
        cmd.envs(program.config.env_pairs());
    }

    if !program.config.user.is_empty() {
        match lookup_user(&program.config.user) {
            Ok((uid, gid)) => {
                info!(program = %name, user = %program.config.user, uid, gid, "running as user");
                cmd.uid(uid).gid(gid);
            }
            Err(e) => {
                warn!(program = %name, user = %program.config.user, error = %e, "user switch skipped");
            }
        }
    }

    match open_child_log(&program.config.stdout_logfile, "/dev/stdout") {
        Ok(file) => {
            cmd.stdout(Stdio::from(file));
        }
        Err(e) => {
            warn!(program = %name, path = %program.config.stdout_logfile, error = %e, "could not open stdout log");
            cmd.stdout(Stdio::null());
        }
    }
    match open_child_log(&program.config.stderr_logfile, "/dev/stderr") {
        Ok(file) => {
            cmd.stderr(Stdio::from(file));
        }
        Err(e) => {
            warn!(program = %name, path = %program.config.stderr_logfile, error = %e, "could not open stderr log");
            cmd.stderr(Stdio::null());
        }
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(program = %name, error = %e, "spawn failed");
            program.events.emit(ProcState::Backoff);
            return;
        }
    };

    if let Some(pid) = child.id() {
        program.run.publish_pid(pid);
    }
    program.events.emit(ProcState::Running);

    match child.wait().await {
        Ok(status) if status.success() => {
            program.run.record_exit("0", 0);
            program.events.emit(ProcState::Exited);
        }
        Ok(status) => {
            let (desc, code) = describe_exit(status);
            program.run.record_exit(desc, code);
            program.events.emit(ProcState::Backoff);
        }
        Err(e) => {
            program.run.record_exit(e.to_string(), 99);
            program.events.emit(ProcState::Backoff);
        }
    }
}

/// Formats a non-success wait status the way the restart policy's
/// expected-code comparison consumes it ("exit status N"); terminations
/// without a code carry the sentinel 99.
fn describe_exit(status: std::process::ExitStatus) -> (String, i32) {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => (format!("exit status {code}"), code),
        None => match status.signal() {
            Some(sig) => (format!("signal: {sig}"), 99),
            None => (status.to_string(), 99),
        },
    }
}
