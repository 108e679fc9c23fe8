//! Convenient macros for logging.
//!
//! Every macro takes the logger first and records `module_path!()` as the
//! caller. Arguments are only formatted when the level passes the filter.

/// Logs a message with a specific level.
///
/// # Examples
///
/// ```no_run
/// use qlogger::{qlog, LogLevel, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// let user = "alice";
/// qlog!(logger, LogLevel::Info, "User {} logged in", user);
/// ```
#[macro_export]
macro_rules! qlog {
    ($logger:expr, $level:expr, $($arg:tt)*) => {
        $logger.log_with_caller($level, format_args!($($arg)*), module_path!())
    };
}

/// Logs a debug message.
///
/// # Examples
///
/// ```no_run
/// use qlogger::{qlog_debug, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// let state = [1, 2, 3];
/// qlog_debug!(logger, "state: {:?}", state);
/// ```
#[macro_export]
macro_rules! qlog_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Debug, $($arg)*)
    };
}

/// Logs a verbose message.
#[macro_export]
macro_rules! qlog_verbose {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Verbose, $($arg)*)
    };
}

/// Logs an info message.
///
/// # Examples
///
/// ```no_run
/// use qlogger::{qlog_info, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// qlog_info!(logger, "Processing {} items", 42);
/// ```
#[macro_export]
macro_rules! qlog_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Info, $($arg)*)
    };
}

/// Logs a warning message.
#[macro_export]
macro_rules! qlog_warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Warn, $($arg)*)
    };
}

/// Logs an error message.
///
/// # Examples
///
/// ```no_run
/// use qlogger::{qlog_error, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// let err = std::io::Error::other("disk full");
/// qlog_error!(logger, "Failed to save: {}", err);
/// ```
#[macro_export]
macro_rules! qlog_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Error, $($arg)*)
    };
}

/// Logs a critical message.
#[macro_export]
macro_rules! qlog_critical {
    ($logger:expr, $($arg:tt)*) => {
        $crate::qlog!($logger, $crate::LogLevel::Critical, $($arg)*)
    };
}
