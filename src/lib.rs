//! # procvisor
//!
//! **Procvisor** is a declarative process supervisor: a single foreground
//! process that launches, monitors, and restarts a configured set of child
//! programs according to an INI configuration in the supervisord dialect.
//!
//! | Area              | Description                                                                  | Key types                            |
//! |-------------------|------------------------------------------------------------------------------|--------------------------------------|
//! | **Configuration** | `[supervisord]`, `[program:NAME]`, `[eventlistener:NAME]`, `[include]`.      | [`AllConfig`], [`ProgramConfig`]     |
//! | **Supervision**   | Per-program state machine, event-multiplexing loop, restart policy.          | [`Supervisor`], [`ProcState`]        |
//! | **Shutdown**      | SIGTERM/SIGINT/SIGUSR1 trigger an orderly teardown with per-child signals.   | —                                    |
//! | **Errors**        | Typed startup and runner errors.                                             | [`SupervisorError`]                  |
//!
//! The binary front end (`procvisor -c CONF [-n] [-e LEVEL]`) lives in
//! `main.rs`; everything else is library code so the engine can be exercised
//! directly in tests.
//!
//! ```no_run
//! use std::path::Path;
//! use procvisor::{AllConfig, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), procvisor::SupervisorError> {
//!     let config = AllConfig::load(Path::new("/etc/supervisor/supervisord.conf"));
//!     Supervisor::new(config).run().await
//! }
//! ```

pub mod config;
mod core;
pub mod error;
pub mod logging;

pub use config::{
    AllConfig, AutoRestart, EventListenerConfig, ExitPolicy, ProgramConfig, SupervisordConfig,
};
pub use core::{ExitReport, ProcState, Program, RunningData, Supervisor};
pub use error::{SupervisorError, UserSwitchError};
