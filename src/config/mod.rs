//! # Configuration model.
//!
//! Loads the INI-style supervisor configuration into typed sections.
//!
//! ## Files & responsibilities
//! - **discover.rs**: candidate-file discovery (`-c` argument, `$PWD`, system paths).
//! - **loader.rs**: section dispatch and `[include]` merging.
//! - **global.rs**: the `[supervisord]` section.
//! - **program.rs**: `[program:NAME]` / `[eventlistener:NAME]` sections.
//! - **tokenize.rs**: command and environment value tokenization.
//!
//! ## Section discipline
//! - `[supervisord]` carries global options.
//! - `[program:NAME]` declares one supervised program; duplicates warn and
//!   keep the first.
//! - `[eventlistener:NAME]` is recorded as a listener and additionally
//!   installed as a program with the same lifecycle.
//! - `[include]` expands `files=` globs and merges the non-`[supervisord]`
//!   sections of every match; includes are not recursive.
//!
//! Unknown sections and keys are ignored; values that fail to convert log a
//! warning and keep the default. Configuration problems are never fatal: in
//! the worst case loading yields an empty configuration and the supervisor
//! idles until signalled.

mod discover;
mod global;
mod loader;
mod program;
mod tokenize;

pub use discover::find_config_file;
pub use global::{ExitPolicy, SupervisordConfig};
pub use loader::AllConfig;
pub use program::{AutoRestart, EventListenerConfig, ProgramConfig};
pub use tokenize::{parse_environment, tokenize_command};
