use std::path::PathBuf;

use log::LevelFilter;
use unbait_logging::{LogDestination, DEFAULT_LOG_FILE};

use crate::cli::LogTarget;

pub(crate) fn initialize(target: LogTarget, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match target {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
        LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
    };
    if !unbait_logging::initialize(destination, level) {
        eprintln!("Warning: logging is disabled");
    }
}
