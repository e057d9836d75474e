//! End-to-end bootstrap checks through the public API: configuration file on
//! disk in, materialized program records out.

use std::fs;
use std::path::Path;

use procvisor::{AllConfig, ProcState, Supervisor};

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("supervisord.conf");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn autostartable_programs_begin_stopped_and_resolved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        "[program:truth]\ncommand=/bin/true\n\n[program:sleeper]\ncommand=sleep 30\n",
    );

    let supervisor = Supervisor::new(AllConfig::load(&path));
    let programs = supervisor.programs();
    assert_eq!(programs.len(), 2);
    for program in programs {
        assert_eq!(program.status(), ProcState::Stopped);
        assert!(program.command_path.is_some());
        assert!(!program.startable());
        assert_eq!(program.start_count(), 0);
    }
}

#[test]
fn unresolvable_command_is_born_fatal_and_never_armed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        "[supervisord]\nexit_on=ANY_FATAL\n\n[program:ghost]\ncommand=/no/such/binary --flag\n",
    );

    let supervisor = Supervisor::new(AllConfig::load(&path));
    let programs = supervisor.programs();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].status(), ProcState::Fatal);
    assert!(programs[0].command_path.is_none());
    assert!(!programs[0].startable());
}

#[test]
fn quoted_command_arguments_survive_bootstrap() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        "[program:py]\ncommand=sh -c \"echo one && echo two\"\n",
    );

    let supervisor = Supervisor::new(AllConfig::load(&path));
    let program = &supervisor.programs()[0];
    assert_eq!(
        program.config.command,
        ["sh", "-c", "echo one && echo two"]
    );
}

#[test]
fn event_listeners_are_supervised_alongside_programs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        "[program:a]\ncommand=/bin/true\n\n[eventlistener:mon]\ncommand=/bin/true\nevents=PROCESS_STATE\n",
    );

    let config = AllConfig::load(&path);
    assert_eq!(config.event_listeners.len(), 1);

    let supervisor = Supervisor::new(config);
    let names: Vec<String> = supervisor
        .programs()
        .iter()
        .map(|p| p.config.process_name.clone())
        .collect();
    assert_eq!(names, ["a", "mon"]);
}
