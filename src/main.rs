use directories::ProjectDirs;
use log::{debug, error};

use resq::cli::Cli;
use resq::config::{Config, CONFIG};
use resq::logging;

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "resq") else {
        eprintln!("Could not determine the local data directory");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);

    // Keep the handle alive so buffered log lines are flushed on exit
    let _logger = match logging::init_logging(&project_dirs, &config.logging) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to start logging: {err}");
            None
        }
    };

    if CONFIG.set(config).is_err() {
        eprintln!("Configuration was already initialized");
        std::process::exit(1);
    }

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

    if let Err(err) = Cli::handle_command_line(project_dirs.data_local_dir()) {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
