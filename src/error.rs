/// Top-level error for the binary.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("terminal: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
