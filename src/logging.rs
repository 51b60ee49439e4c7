use std::{fs::OpenOptions, panic, path::Path};

use log::{error, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::core::{HarnessError, Result};

/// Installs the global logger: the terminal always, plus `log_file` (appended to) if given.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Debug)
        .set_target_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        loggers.push(WriteLogger::new(level, config, file));
    }

    CombinedLogger::init(loggers).map_err(|e| HarnessError::Logger(e.to_string()))
}

/// Routes panics from any thread (engine workers included) through the logger too.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("Panic occurred: {}", panic_info);
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_is_an_io_error() {
        let dir = std::env::temp_dir().join("render_bench_missing_dir_for_logging_test");
        let _ = std::fs::remove_dir_all(&dir);
        let err = init(LevelFilter::Info, Some(&dir.join("bench.log"))).unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
