//! Runtime core: the supervision engine.
//!
//! ## Files & responsibilities
//! - **state.rs**: the per-program lifecycle states.
//! - **stream.rs**: per-program status streams (runner → loop).
//! - **program.rs**: program records, shared run-state, running-data aggregate.
//! - **runner.rs**: one supervised execution of one child process.
//! - **supervisor.rs**: bootstrap, the event-multiplexing monitor loop, and
//!   the restart policy.
//! - **shutdown.rs**: OS-signal-driven teardown.
//!
//! ## Event data-plane (who emits & who consumes)
//!
//! ```text
//!  run_child (one task per start)          shutdown controller
//!       │ RUNNING / EXITED / BACKOFF            │ FATAL (override)
//!       └───────────► status stream ◄───────────┘
//!                          │  (exactly one per program)
//!                          ▼
//!             Supervisor::monitor (select across all streams)
//!                ├─ apply status + stamp transition time
//!                ├─ RUNNING → best-effort nice value
//!                └─ else    → restart decision → spawn run_child
//! ```
//!
//! ## Rules
//! - `status` and `start_count` are written only by the loop (and bootstrap);
//!   runners report, they never mutate records.
//! - The child PID is published to the shared run-state before `RUNNING` is
//!   emitted, so the shutdown controller's later reads are ordered after it.
//! - Shutdown is coercive: there is no cooperative cancellation of runners;
//!   the controller signals the OS child and the runner observes the
//!   termination through its wait call.
//! - The loop's only timer is the five-second idle nap taken when every
//!   program is terminal.

mod program;
mod runner;
mod shutdown;
mod state;
mod stream;
mod supervisor;

pub use program::{ExitReport, Program, RunningData};
pub use state::ProcState;
pub use supervisor::Supervisor;
