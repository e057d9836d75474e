//! Child process lifecycle states.

use std::fmt;

/// Lifecycle state of a supervised program.
///
/// Ref: <http://supervisord.org/subprocess.html#process-states>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    /// Initial state: never started since the supervisor booted.
    Stopped,
    /// A start was issued; the child does not exist yet.
    Starting,
    /// The child process is running.
    Running,
    /// The child failed to spawn or terminated unexpectedly; a retry decision
    /// is pending.
    Backoff,
    /// The child exited cleanly (code 0).
    Exited,
    /// Terminal failure; the program will not be restarted.
    Fatal,
    /// Declared for parity with the canonical state set; unreachable in this
    /// engine.
    Stopping,
}

impl ProcState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcState::Stopped => "STOPPED",
            ProcState::Starting => "STARTING",
            ProcState::Running => "RUNNING",
            ProcState::Backoff => "BACKOFF",
            ProcState::Exited => "EXITED",
            ProcState::Fatal => "FATAL",
            ProcState::Stopping => "STOPPING",
        }
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_names() {
        assert_eq!(ProcState::Stopped.as_str(), "STOPPED");
        assert_eq!(ProcState::Starting.as_str(), "STARTING");
        assert_eq!(ProcState::Running.as_str(), "RUNNING");
        assert_eq!(ProcState::Backoff.as_str(), "BACKOFF");
        assert_eq!(ProcState::Exited.as_str(), "EXITED");
        assert_eq!(ProcState::Fatal.as_str(), "FATAL");
        assert_eq!(ProcState::Stopping.as_str(), "STOPPING");
    }
}
