//! # Error types used by the procvisor runtime.
//!
//! Two enums cover the failure domains:
//!
//! - [`SupervisorError`] errors raised while wiring up the supervisor itself.
//! - [`UserSwitchError`] errors raised while resolving the `user=` option for
//!   a child spawn.
//!
//! Most failures in the engine are recovered locally with a documented
//! fallback (bad config values keep their defaults, unwritable child logs
//! leave the stream unwired, a failed spawn becomes a `BACKOFF` report).
//! These types exist for the few places where an error has to travel.

use thiserror::Error;

/// Errors raised while starting the supervisor process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Installing the OS signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// The global log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// The configured `logfile` path.
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while resolving a `user=` option to a uid/gid pair.
///
/// The runner logs this and spawns the child without switching users.
#[derive(Error, Debug)]
pub enum UserSwitchError {
    /// The named user does not exist on this system.
    #[error("user {0:?} not found")]
    NotFound(String),

    /// The user database could not be queried.
    #[error("user lookup failed: {0}")]
    Lookup(#[from] nix::Error),
}
