//! `[program:NAME]` and `[eventlistener:NAME]` section schemas.

use ini::Properties;

use super::global::{set_bool, set_i32, set_u32, set_u64};
use super::tokenize::{parse_environment, tokenize_command};

/// Restart discipline after a child terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRestart {
    /// Restart unconditionally, whatever the exit looked like.
    Always,
    /// Restart according to the expected-exit-code comparison (default).
    Unexpected,
    /// Never restart.
    Never,
}

impl Default for AutoRestart {
    fn default() -> Self {
        AutoRestart::Unexpected
    }
}

impl From<&str> for AutoRestart {
    /// `"true"` restarts always, `"unexpected"` consults `exitcodes`, and any
    /// other value disables restarts.
    fn from(value: &str) -> Self {
        match value {
            "true" => AutoRestart::Always,
            "unexpected" => AutoRestart::Unexpected,
            _ => AutoRestart::Never,
        }
    }
}

impl AutoRestart {
    fn as_ini_value(self) -> &'static str {
        match self {
            AutoRestart::Always => "true",
            AutoRestart::Unexpected => "unexpected",
            AutoRestart::Never => "false",
        }
    }
}

/// Typed per-program options.
///
/// `command` is tokenized at load time (quoting and `%(NAME)s` substitution
/// included). Options the engine does not act on are still parsed so a
/// configuration survives a load/serialize round trip intact.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramConfig {
    pub command: Vec<String>,
    pub process_name: String,
    pub numprocs: u32,
    pub numprocs_start: u32,
    pub priority: i32,
    pub autostart: bool,
    pub startsecs: u32,
    pub startretries: u32,
    pub autorestart: AutoRestart,
    pub exitcodes: String,
    pub stopsignal: String,
    pub stopwaitsecs: u64,
    pub stopasgroup: bool,
    pub killasgroup: bool,
    pub user: String,
    pub redirect_stderr: bool,
    pub stdout_logfile: String,
    pub stdout_logfile_maxbytes: String,
    pub stdout_logfile_backups: u32,
    pub stdout_capture_maxbytes: String,
    pub stdout_events_enabled: bool,
    pub stderr_logfile: String,
    pub stderr_logfile_maxbytes: String,
    pub stderr_logfile_backups: u32,
    pub stderr_capture_maxbytes: String,
    pub stderr_events_enabled: bool,
    pub environment: String,
    pub directory: String,
    pub umask: String,
    pub serverurl: String,
}

impl ProgramConfig {
    /// Defaults for a program named `name`.
    pub fn defaults(name: &str) -> Self {
        Self {
            command: Vec::new(),
            process_name: name.to_string(),
            numprocs: 1,
            numprocs_start: 0,
            priority: 999,
            autostart: true,
            startsecs: 1,
            startretries: 3,
            autorestart: AutoRestart::Unexpected,
            exitcodes: "0,2".to_string(),
            stopsignal: "TERM".to_string(),
            stopwaitsecs: 10,
            stopasgroup: false,
            killasgroup: false,
            user: String::new(),
            redirect_stderr: false,
            stdout_logfile: "AUTO".to_string(),
            stdout_logfile_maxbytes: "50MB".to_string(),
            stdout_logfile_backups: 10,
            stdout_capture_maxbytes: "50MB".to_string(),
            stdout_events_enabled: false,
            stderr_logfile: "AUTO".to_string(),
            stderr_logfile_maxbytes: "50MB".to_string(),
            stderr_logfile_backups: 10,
            stderr_capture_maxbytes: "50MB".to_string(),
            stderr_events_enabled: false,
            environment: String::new(),
            directory: String::new(),
            umask: String::new(),
            serverurl: "AUTO".to_string(),
        }
    }

    /// Applies the keys of a program (or event listener) section.
    ///
    /// Repeated `command` keys append their tokens, matching the multi-value
    /// behavior of the INI collaborator. Unrecognized keys are ignored;
    /// unconvertible values warn and keep the default.
    pub fn apply(&mut self, section: &Properties) {
        for (key, value) in section.iter() {
            match key {
                "command" => self.command.extend(tokenize_command(value)),
                "process_name" => self.process_name = value.to_string(),
                "numprocs" => set_u32(&mut self.numprocs, key, value),
                "numprocs_start" => set_u32(&mut self.numprocs_start, key, value),
                "priority" => set_i32(&mut self.priority, key, value),
                "autostart" => set_bool(&mut self.autostart, key, value),
                "startsecs" => set_u32(&mut self.startsecs, key, value),
                "startretries" => set_u32(&mut self.startretries, key, value),
                "autorestart" => self.autorestart = AutoRestart::from(value),
                "exitcodes" => self.exitcodes = value.to_string(),
                "stopsignal" => self.stopsignal = value.to_string(),
                "stopwaitsecs" => set_u64(&mut self.stopwaitsecs, key, value),
                "stopasgroup" => set_bool(&mut self.stopasgroup, key, value),
                "killasgroup" => set_bool(&mut self.killasgroup, key, value),
                "user" => self.user = value.to_string(),
                "redirect_stderr" => set_bool(&mut self.redirect_stderr, key, value),
                "stdout_logfile" => self.stdout_logfile = value.to_string(),
                "stdout_logfile_maxbytes" => self.stdout_logfile_maxbytes = value.to_string(),
                "stdout_logfile_backups" => {
                    set_u32(&mut self.stdout_logfile_backups, key, value)
                }
                "stdout_capture_maxbytes" => self.stdout_capture_maxbytes = value.to_string(),
                "stdout_events_enabled" => set_bool(&mut self.stdout_events_enabled, key, value),
                "stderr_logfile" => self.stderr_logfile = value.to_string(),
                "stderr_logfile_maxbytes" => self.stderr_logfile_maxbytes = value.to_string(),
                "stderr_logfile_backups" => {
                    set_u32(&mut self.stderr_logfile_backups, key, value)
                }
                "stderr_capture_maxbytes" => self.stderr_capture_maxbytes = value.to_string(),
                "stderr_events_enabled" => set_bool(&mut self.stderr_events_enabled, key, value),
                "environment" => self.environment = value.to_string(),
                "directory" => self.directory = value.to_string(),
                "umask" => self.umask = value.to_string(),
                "serverurl" => self.serverurl = value.to_string(),
                _ => {}
            }
        }
    }

    /// Environment pairs parsed from `environment=`, in declaration order.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        parse_environment(&self.environment)
    }

    /// Renders the configuration back to an INI section body; feeding the
    /// result through [`ProgramConfig::apply`] reproduces this value.
    pub fn to_ini_section(&self) -> String {
        let mut out = String::new();
        if !self.command.is_empty() {
            let rendered: Vec<String> = self
                .command
                .iter()
                .map(|token| {
                    if token.contains(' ') {
                        format!("\"{token}\"")
                    } else {
                        token.clone()
                    }
                })
                .collect();
            out.push_str(&format!("command={}\n", rendered.join(" ")));
        }
        out.push_str(&format!("process_name={}\n", self.process_name));
        out.push_str(&format!("numprocs={}\n", self.numprocs));
        out.push_str(&format!("numprocs_start={}\n", self.numprocs_start));
        out.push_str(&format!("priority={}\n", self.priority));
        out.push_str(&format!("autostart={}\n", self.autostart));
        out.push_str(&format!("startsecs={}\n", self.startsecs));
        out.push_str(&format!("startretries={}\n", self.startretries));
        out.push_str(&format!("autorestart={}\n", self.autorestart.as_ini_value()));
        out.push_str(&format!("exitcodes={}\n", self.exitcodes));
        out.push_str(&format!("stopsignal={}\n", self.stopsignal));
        out.push_str(&format!("stopwaitsecs={}\n", self.stopwaitsecs));
        out.push_str(&format!("stopasgroup={}\n", self.stopasgroup));
        out.push_str(&format!("killasgroup={}\n", self.killasgroup));
        out.push_str(&format!("user={}\n", self.user));
        out.push_str(&format!("redirect_stderr={}\n", self.redirect_stderr));
        out.push_str(&format!("stdout_logfile={}\n", self.stdout_logfile));
        out.push_str(&format!(
            "stdout_logfile_maxbytes={}\n",
            self.stdout_logfile_maxbytes
        ));
        out.push_str(&format!(
            "stdout_logfile_backups={}\n",
            self.stdout_logfile_backups
        ));
        out.push_str(&format!(
            "stdout_capture_maxbytes={}\n",
            self.stdout_capture_maxbytes
        ));
        out.push_str(&format!(
            "stdout_events_enabled={}\n",
            self.stdout_events_enabled
        ));
        out.push_str(&format!("stderr_logfile={}\n", self.stderr_logfile));
        out.push_str(&format!(
            "stderr_logfile_maxbytes={}\n",
            self.stderr_logfile_maxbytes
        ));
        out.push_str(&format!(
            "stderr_logfile_backups={}\n",
            self.stderr_logfile_backups
        ));
        out.push_str(&format!(
            "stderr_capture_maxbytes={}\n",
            self.stderr_capture_maxbytes
        ));
        out.push_str(&format!(
            "stderr_events_enabled={}\n",
            self.stderr_events_enabled
        ));
        out.push_str(&format!("environment={}\n", self.environment));
        out.push_str(&format!("directory={}\n", self.directory));
        out.push_str(&format!("umask={}\n", self.umask));
        out.push_str(&format!("serverurl={}\n", self.serverurl));
        out
    }
}

/// An `[eventlistener:NAME]` section: the listener-specific keys plus the
/// embedded program definition the listener runs as.
///
/// The engine installs the program and carries the listener keys untouched
/// for the event-notification collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct EventListenerConfig {
    pub buffer_size: String,
    pub events: String,
    pub result_handler: String,
    pub program: ProgramConfig,
}

impl EventListenerConfig {
    /// Builds the listener record for `name`, reusing the already-loaded
    /// program section.
    pub fn from_section(program: ProgramConfig, section: &Properties) -> Self {
        let mut listener = Self {
            buffer_size: String::new(),
            events: String::new(),
            result_handler: String::new(),
            program,
        };
        for (key, value) in section.iter() {
            match key {
                "buffer_size" => listener.buffer_size = value.to_string(),
                "events" => listener.events = value.to_string(),
                "result_handler" => listener.result_handler = value.to_string(),
                _ => {}
            }
        }
        listener
    }
}
