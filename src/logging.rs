use directories::ProjectDirs;
use flexi_logger::{
    detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming,
};

use crate::config::LoggingConfig;
use crate::error::ResqError;

const LOG_FILE_MAX_BYTES: u64 = 5 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

/// Starts file logging under the local data directory. Warnings and errors
/// are also echoed to stderr. The returned handle must stay alive for the
/// duration of the program.
pub fn init_logging(
    project_dirs: &ProjectDirs,
    logging: &LoggingConfig,
) -> Result<LoggerHandle, ResqError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    let handle = Logger::try_with_str(logging.log_spec())?
        .log_to_file(FileSpec::default().directory(log_dir).basename("resq"))
        .format_for_files(detailed_format)
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(LOG_FILE_MAX_BYTES),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(LOG_FILES_KEPT),
        )
        .start()?;

    Ok(handle)
}
