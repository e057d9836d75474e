use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::warn;

use procvisor::{logging, AllConfig, Supervisor, SupervisorError};

/// Declarative process supervisor.
#[derive(Parser, Debug)]
#[command(name = "procvisor", version, about)]
struct Cli {
    /// The master config file.
    #[arg(
        short = 'c',
        value_name = "PATH",
        default_value = "/etc/supervisor/supervisord.conf"
    )]
    config: PathBuf,

    /// Run in foreground (no daemon).
    #[arg(short = 'n')]
    nodaemon: bool,

    /// The log level: trace, debug, info, warn, error, or critical.
    #[arg(
        short = 'e',
        long = "loglevel",
        value_name = "LEVEL",
        default_value = "error"
    )]
    loglevel: String,
}

#[tokio::main]
async fn main() -> Result<(), SupervisorError> {
    let cli = Cli::parse();
    logging::init(logging::parse_level(&cli.loglevel));

    let mut config = AllConfig::load(&cli.config);
    // The command line overrides the file for these two.
    config.supervisord.nodaemon = cli.nodaemon;
    config.supervisord.loglevel = cli.loglevel;

    if !config.supervisord.logfile.is_empty() {
        if let Err(e) = logging::redirect_to_file(Path::new(&config.supervisord.logfile)) {
            warn!(error = %e, "continuing on stderr");
        }
    }

    Supervisor::new(config).run().await
}
