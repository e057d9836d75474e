//! INI loading and section dispatch.

use std::collections::BTreeMap;
use std::path::Path;

use ini::{Ini, Properties};
use tracing::warn;

use super::discover::find_config_file;
use super::global::SupervisordConfig;
use super::program::{EventListenerConfig, ProgramConfig};

/// The fully-loaded configuration: global options, supervised programs, and
/// event listeners (which also appear in `programs`).
#[derive(Debug, Clone, Default)]
pub struct AllConfig {
    pub supervisord: SupervisordConfig,
    pub programs: BTreeMap<String, ProgramConfig>,
    pub event_listeners: BTreeMap<String, EventListenerConfig>,
}

impl AllConfig {
    /// Locates and loads the master configuration.
    ///
    /// A missing or unreadable file yields the empty configuration;
    /// configuration problems are never fatal to the supervisor.
    pub fn load(cli_path: &Path) -> AllConfig {
        let mut config = AllConfig::default();
        let Some(path) = find_config_file(cli_path) else {
            warn!("no configuration file found, starting empty");
            return config;
        };
        let ini = match Ini::load_from_file(&path) {
            Ok(ini) => ini,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read configuration");
                return config;
            }
        };
        config.merge(&ini);
        config
    }

    /// Merges every section of the master file. Included files take the
    /// narrower path in [`AllConfig::apply_includes`] instead, where a nested
    /// `[supervisord]` warns and `[include]` does not recurse.
    fn merge(&mut self, ini: &Ini) {
        for (name, props) in ini.iter() {
            match name {
                None => {}
                Some("supervisord") => self.supervisord.apply(props),
                Some(other) => self.apply_section(other, props, true),
            }
        }
    }

    fn apply_section(&mut self, name: &str, props: &Properties, allow_include: bool) {
        if let Some(prog_name) = name.strip_prefix("program:") {
            if self.programs.contains_key(prog_name) {
                warn!(section = name, "duplicate section, ignoring extras");
                return;
            }
            let mut program = ProgramConfig::defaults(prog_name);
            program.apply(props);
            self.programs.insert(prog_name.to_string(), program);
        } else if let Some(listener_name) = name.strip_prefix("eventlistener:") {
            if self.event_listeners.contains_key(listener_name) {
                warn!(section = name, "duplicate section, ignoring extras");
                return;
            }
            let mut program = ProgramConfig::defaults(listener_name);
            program.apply(props);
            // An event listener is supervised like any other program.
            self.programs
                .insert(listener_name.to_string(), program.clone());
            self.event_listeners.insert(
                listener_name.to_string(),
                EventListenerConfig::from_section(program, props),
            );
        } else if name == "include" {
            if allow_include {
                self.apply_includes(props);
            } else {
                warn!("ignoring [include] section in included file");
            }
        }
        // Anything else is an unknown section and is ignored.
    }

    fn apply_includes(&mut self, props: &Properties) {
        let Some(files) = props.get("files") else {
            return;
        };
        for pattern in files.split(' ') {
            if pattern.is_empty() {
                continue;
            }
            let matches = match glob::glob(pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(pattern, error = %e, "bad include glob");
                    continue;
                }
            };
            for entry in matches {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "unreadable include match");
                        continue;
                    }
                };
                match Ini::load_from_file(&path) {
                    Ok(included) => {
                        for (name, section) in included.iter() {
                            match name {
                                None => {}
                                Some("supervisord") => {
                                    warn!(path = %path.display(), "ignoring [supervisord] section in included file");
                                }
                                Some(other) => self.apply_section(other, section, false),
                            }
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "could not read included file");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, body: &str) {
        fs::write(path, body).expect("write fixture");
    }

    #[test]
    fn loads_programs_and_globals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = dir.path().join("supervisord.conf");
        write(
            &main,
            "[supervisord]\nlogfile=/tmp/p.log\nexit_on=ALL_FATAL\n\n[program:a]\ncommand=/bin/true\n",
        );
        let config = AllConfig::load(&main);
        assert_eq!(config.supervisord.logfile, "/tmp/p.log");
        assert_eq!(
            config.supervisord.exit_on,
            Some(crate::config::ExitPolicy::AllFatal)
        );
        assert_eq!(config.programs.len(), 1);
        assert_eq!(config.programs["a"].command, ["/bin/true"]);
    }

    #[test]
    fn duplicate_program_sections_keep_the_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = dir.path().join("supervisord.conf");
        // The INI parser folds duplicate section headers together, so the
        // duplicate arrives through an included file instead.
        let extra = dir.path().join("extra.conf");
        write(&extra, "[program:a]\ncommand=/bin/false\n");
        write(
            &main,
            &format!(
                "[program:a]\ncommand=/bin/true\n\n[include]\nfiles={}\n",
                extra.display()
            ),
        );
        let config = AllConfig::load(&main);
        assert_eq!(config.programs["a"].command, ["/bin/true"]);
    }

    #[test]
    fn include_merges_programs_and_ignores_supervisord() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extras = dir.path().join("extras");
        fs::create_dir(&extras).expect("mkdir");
        write(
            &extras.join("b.conf"),
            "[supervisord]\nlogfile=/should/be/ignored\n\n[program:b]\ncommand=/bin/true\n",
        );
        let main = dir.path().join("supervisord.conf");
        write(
            &main,
            &format!(
                "[supervisord]\nlogfile=/tmp/keep.log\n\n[program:a]\ncommand=/bin/true\n\n[include]\nfiles={}/*.conf\n",
                extras.display()
            ),
        );
        let config = AllConfig::load(&main);
        let names: Vec<&String> = config.programs.keys().collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(config.supervisord.logfile, "/tmp/keep.log");
    }

    #[test]
    fn includes_are_not_recursive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested.conf");
        write(&nested, "[program:hidden]\ncommand=/bin/true\n");
        let first = dir.path().join("first.conf");
        write(
            &first,
            &format!(
                "[program:b]\ncommand=/bin/true\n\n[include]\nfiles={}\n",
                nested.display()
            ),
        );
        let main = dir.path().join("supervisord.conf");
        write(
            &main,
            &format!("[include]\nfiles={}\n", first.display()),
        );
        let config = AllConfig::load(&main);
        assert!(config.programs.contains_key("b"));
        assert!(!config.programs.contains_key("hidden"));
    }

    #[test]
    fn event_listener_installs_a_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = dir.path().join("supervisord.conf");
        write(
            &main,
            "[eventlistener:mon]\ncommand=/usr/bin/mon\nevents=PROCESS_STATE\n",
        );
        let config = AllConfig::load(&main);
        assert!(config.programs.contains_key("mon"));
        assert_eq!(config.event_listeners["mon"].events, "PROCESS_STATE");
        assert_eq!(config.event_listeners["mon"].program.command, ["/usr/bin/mon"]);
    }

    #[test]
    fn missing_file_yields_the_empty_configuration() {
        let missing = Path::new("/nonexistent/procvisor-test.conf");
        if find_config_file(missing).is_some() {
            // A system-wide config exists on this machine; discovery is
            // covered separately.
            return;
        }
        let config = AllConfig::load(missing);
        assert!(config.programs.is_empty());
        assert_eq!(config.supervisord, SupervisordConfig::default());
    }
}
