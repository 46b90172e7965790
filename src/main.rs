mod applier;
mod cli;
mod config;
mod database;
mod error;
mod inspector;
mod report;
mod schema;

use cli::Cli;
use config::Config;
use directories::ProjectDirs;
use error::SchemaDriftError;
use flexi_logger::{Age, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use log::{debug, error};

fn setup_logging(
    project_dirs: &ProjectDirs,
    config: &Config,
) -> Result<LoggerHandle, SchemaDriftError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    let handle = Logger::try_with_str(config.logging.log_spec())?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename("schemadrift"),
        )
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(30),
        )
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    Ok(handle)
}

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "schemadrift") else {
        eprintln!("Could not determine the schemadrift data directory");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);

    // Keep the handle alive for the life of the process
    let logger = match setup_logging(&project_dirs, &config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());
    debug!("Config: {:?}", config);

    if let Err(err) = Cli::handle_command_line(&config) {
        error!("{:?}", err);
        eprintln!("{}", err);
        drop(logger);
        std::process::exit(1);
    }
}
