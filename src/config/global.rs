//! The `[supervisord]` section schema.

use std::str::FromStr;

use ini::Properties;
use tracing::warn;

/// Governs when the supervisor itself exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Exit with code 2 as soon as any program is FATAL.
    AnyFatal,
    /// Exit with code 3 once no program can run any more.
    AllFatal,
}

impl FromStr for ExitPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANY_FATAL" => Ok(ExitPolicy::AnyFatal),
            "ALL_FATAL" => Ok(ExitPolicy::AllFatal),
            _ => Err(()),
        }
    }
}

/// Typed `[supervisord]` options.
///
/// Only `nodaemon` and `exit_on` influence the engine; the remaining options
/// are parsed and retained for the external collaborators (log rotation,
/// pidfile handling, the RPC surface).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupervisordConfig {
    pub logfile: String,
    pub logfile_maxbytes: String,
    pub logfile_backups: u32,
    pub loglevel: String,
    pub pidfile: String,
    pub umask: String,
    pub nodaemon: bool,
    pub minfds: u32,
    pub minprocs: u32,
    pub nocleanup: bool,
    pub childlogdir: String,
    pub user: String,
    pub directory: String,
    pub strip_ansi: bool,
    pub environment: String,
    pub identifier: String,
    pub exit_on: Option<ExitPolicy>,
}

impl SupervisordConfig {
    /// Applies the keys of a `[supervisord]` section. Unrecognized keys are
    /// ignored; unconvertible values warn and keep the default.
    pub fn apply(&mut self, section: &Properties) {
        for (key, value) in section.iter() {
            match key {
                "logfile" => self.logfile = value.to_string(),
                "logfile_maxbytes" => self.logfile_maxbytes = value.to_string(),
                "logfile_backups" => set_u32(&mut self.logfile_backups, key, value),
                "loglevel" => self.loglevel = value.to_string(),
                "pidfile" => self.pidfile = value.to_string(),
                "umask" => self.umask = value.to_string(),
                "nodaemon" => set_bool(&mut self.nodaemon, key, value),
                "minfds" => set_u32(&mut self.minfds, key, value),
                "minprocs" => set_u32(&mut self.minprocs, key, value),
                "nocleanup" => set_bool(&mut self.nocleanup, key, value),
                "childlogdir" => self.childlogdir = value.to_string(),
                "user" => self.user = value.to_string(),
                "directory" => self.directory = value.to_string(),
                "strip_ansi" => set_bool(&mut self.strip_ansi, key, value),
                "environment" => self.environment = value.to_string(),
                "identifier" => self.identifier = value.to_string(),
                "exit_on" => self.exit_on = value.parse().ok(),
                _ => {}
            }
        }
    }
}

// Conversion helpers shared with the program-section loader. Failures keep
// the default in place.

pub(crate) fn set_u32(slot: &mut u32, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!(key, value, "trouble converting value, keeping default"),
    }
}

pub(crate) fn set_u64(slot: &mut u64, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!(key, value, "trouble converting value, keeping default"),
    }
}

pub(crate) fn set_i32(slot: &mut i32, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!(key, value, "trouble converting value, keeping default"),
    }
}

pub(crate) fn set_bool(slot: &mut bool, key: &str, value: &str) {
    match parse_bool(value) {
        Some(v) => *slot = v,
        None => warn!(key, value, "trouble converting value, keeping default"),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "t" => Some(true),
        "false" | "no" | "off" | "0" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ini::Ini;

    fn section(body: &str) -> Properties {
        let ini = Ini::load_from_str(&format!("[supervisord]\n{body}")).expect("valid ini");
        ini.section(Some("supervisord")).expect("section").clone()
    }

    #[test]
    fn applies_known_keys() {
        let mut config = SupervisordConfig::default();
        config.apply(&section(
            "logfile=/var/log/procvisor.log\nnodaemon=true\nminfds=1024\nexit_on=ANY_FATAL",
        ));
        assert_eq!(config.logfile, "/var/log/procvisor.log");
        assert!(config.nodaemon);
        assert_eq!(config.minfds, 1024);
        assert_eq!(config.exit_on, Some(ExitPolicy::AnyFatal));
    }

    #[test]
    fn unknown_exit_policy_stays_unset() {
        let mut config = SupervisordConfig::default();
        config.apply(&section("exit_on=SOMETIMES"));
        assert_eq!(config.exit_on, None);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let mut config = SupervisordConfig::default();
        config.minprocs = 200;
        config.apply(&section("minprocs=many\nnocleanup=perhaps"));
        assert_eq!(config.minprocs, 200);
        assert!(!config.nocleanup);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut config = SupervisordConfig::default();
        config.apply(&section("frobnicate=1"));
        assert_eq!(config, SupervisordConfig::default());
    }
}
