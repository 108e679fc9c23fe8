//! Error types for the qlogger crate.

use std::io;
use thiserror::Error;

/// The main error type for qlogger operations.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error, including an unusable destination directory
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error (for JSON configuration files)
    #[cfg(feature = "json")]
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel error between producers and the writer thread
    #[error("Channel error: {0}")]
    Channel(String),

    /// The logger no longer accepts messages
    #[error("Logger has been shut down")]
    ShutDown,

    /// Custom error
    #[error("Logger error: {0}")]
    Custom(String),
}

/// A specialized Result type for qlogger operations.
pub type Result<T> = std::result::Result<T, LoggerError>;
