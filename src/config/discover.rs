//! Candidate-file discovery for the master configuration.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Candidate paths probed for the master config, in priority order: the `-c`
/// argument, then `$PWD`-relative conventional locations, then system paths.
fn candidates(cli_path: &Path) -> Vec<PathBuf> {
    let mut paths = vec![cli_path.to_path_buf()];
    if let Ok(pwd) = std::env::var("PWD") {
        paths.push(Path::new(&pwd).join("supervisord.conf"));
        paths.push(Path::new(&pwd).join("etc/supervisord.conf"));
    }
    paths.push(PathBuf::from("/etc/supervisor/supervisord.conf"));
    paths.push(PathBuf::from("../etc/supervisord.conf"));
    paths.push(PathBuf::from("../supervisord.conf"));
    paths
}

/// Returns the first existing candidate, or `None` when no candidate exists.
pub fn find_config_file(cli_path: &Path) -> Option<PathBuf> {
    for path in candidates(cli_path) {
        if path.exists() {
            return Some(path);
        }
        debug!(path = %path.display(), "config candidate does not exist");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_path_wins_when_it_exists() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[supervisord]").expect("write");
        let found = find_config_file(file.path()).expect("should find the -c path");
        assert_eq!(found, file.path());
    }

    #[test]
    fn cli_path_is_probed_first() {
        let cli = Path::new("/nonexistent/master.conf");
        let paths = candidates(cli);
        assert_eq!(paths[0], cli);
        assert!(paths.contains(&PathBuf::from("/etc/supervisor/supervisord.conf")));
        assert_eq!(paths.last(), Some(&PathBuf::from("../supervisord.conf")));
    }

    #[test]
    fn pwd_candidates_follow_the_cli_path() {
        // PWD is set in any login shell; the conventional locations under it
        // come before the system-wide ones.
        if std::env::var("PWD").is_ok() {
            let paths = candidates(Path::new("/nonexistent/master.conf"));
            let system = paths
                .iter()
                .position(|p| p == Path::new("/etc/supervisor/supervisord.conf"))
                .expect("system path present");
            assert_eq!(system, 3);
        }
    }
}
