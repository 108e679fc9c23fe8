//! Configuration system for qlogger.

use crate::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug level - lowest severity
    Debug = 0,
    /// Verbose level
    Verbose = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
    /// Critical level - highest severity
    Critical = 5,
}

impl LogLevel {
    /// Returns the string representation of the log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Returns all log levels in ascending severity.
    pub fn all() -> Vec<LogLevel> {
        vec![
            LogLevel::Debug,
            LogLevel::Verbose,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Critical,
        ]
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "VERBOSE" => Ok(LogLevel::Verbose),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(LoggerError::Config(format!("Invalid log level: {s}"))),
        }
    }
}

/// When the writer closes the active segment and opens a new one.
///
/// Only these six policies exist; line-count rotation combines with at most one
/// time boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// One segment for the whole run
    Never,
    /// New segment when the calendar date changes
    Daily,
    /// New segment when the hour changes
    Hourly,
    /// New segment after `max_lines_per_file` lines
    ByLineCount,
    /// Line count or calendar date, whichever comes first
    ByLineCountOrDaily,
    /// Line count or hour, whichever comes first
    ByLineCountOrHourly,
}

impl RotationMode {
    /// Returns the string representation of the rotation mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Never => "never",
            RotationMode::Daily => "daily",
            RotationMode::Hourly => "hourly",
            RotationMode::ByLineCount => "by_line_count",
            RotationMode::ByLineCountOrDaily => "by_line_count_or_daily",
            RotationMode::ByLineCountOrHourly => "by_line_count_or_hourly",
        }
    }

    /// Whether `max_lines_per_file` takes part in the decision.
    pub fn uses_line_count(&self) -> bool {
        matches!(
            self,
            RotationMode::ByLineCount
                | RotationMode::ByLineCountOrDaily
                | RotationMode::ByLineCountOrHourly
        )
    }

    pub fn rotates_daily(&self) -> bool {
        matches!(self, RotationMode::Daily | RotationMode::ByLineCountOrDaily)
    }

    pub fn rotates_hourly(&self) -> bool {
        matches!(self, RotationMode::Hourly | RotationMode::ByLineCountOrHourly)
    }
}

impl std::fmt::Display for RotationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RotationMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "never" | "none" => Ok(RotationMode::Never),
            "daily" => Ok(RotationMode::Daily),
            "hourly" => Ok(RotationMode::Hourly),
            "by_line_count" | "lines" => Ok(RotationMode::ByLineCount),
            "by_line_count_or_daily" | "lines_or_daily" => Ok(RotationMode::ByLineCountOrDaily),
            "by_line_count_or_hourly" | "lines_or_hourly" => {
                Ok(RotationMode::ByLineCountOrHourly)
            }
            _ => Err(LoggerError::Config(format!("Invalid rotation mode: {s}"))),
        }
    }
}

/// Main logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Messages strictly below this level are dropped at submission
    pub level: LogLevel,
    /// Segment rotation policy
    pub rotation: RotationMode,
    /// Line threshold for the line-count rotation modes
    pub max_lines_per_file: u64,
    /// Directory receiving the `.qlog` segments
    pub directory: PathBuf,
    /// Index embedded in the first segment's name
    pub segment_base: u64,
    /// Overrides the executable name in segment file names
    pub application_name: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            rotation: RotationMode::Daily,
            max_lines_per_file: 100_000,
            directory: PathBuf::from("logs"),
            segment_base: 0,
            application_name: None,
        }
    }
}

/// Builder for creating logger configurations.
#[derive(Debug)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    /// Sets the minimum log level.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the rotation mode.
    pub fn rotation(mut self, rotation: RotationMode) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Rotates by line count with the given threshold.
    pub fn rotate_by_lines(mut self, max_lines: u64) -> Self {
        self.config.rotation = RotationMode::ByLineCount;
        self.config.max_lines_per_file = max_lines;
        self
    }

    /// Sets the line threshold without changing the rotation mode.
    pub fn max_lines_per_file(mut self, max_lines: u64) -> Self {
        self.config.max_lines_per_file = max_lines;
        self
    }

    /// Sets the destination directory.
    pub fn directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.config.directory = directory.into();
        self
    }

    /// Sets the index of the first segment.
    pub fn segment_base(mut self, base: u64) -> Self {
        self.config.segment_base = base;
        self
    }

    /// Sets the application name used in segment file names.
    pub fn application_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.application_name = Some(name.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::new()
    }

    /// Loads configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = LoggerConfig::default();

        if let Ok(level_str) = std::env::var("QLOG_LEVEL") {
            if let Ok(level) = level_str.parse::<LogLevel>() {
                config.level = level;
            }
        }

        if let Ok(rotation_str) = std::env::var("QLOG_ROTATION") {
            if let Ok(rotation) = rotation_str.parse::<RotationMode>() {
                config.rotation = rotation;
            }
        }

        if let Ok(max_lines) = std::env::var("QLOG_MAX_LINES") {
            if let Ok(max_lines) = max_lines.trim().parse::<u64>() {
                config.max_lines_per_file = max_lines;
            }
        }

        if let Ok(dir) = std::env::var("QLOG_DIR") {
            config.directory = PathBuf::from(dir);
        }

        if let Ok(name) = std::env::var("QLOG_APP_NAME") {
            if !name.is_empty() {
                config.application_name = Some(name);
            }
        }

        config
    }

    /// Parses a JSON configuration document.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    #[cfg(feature = "json")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(LoggerError::Config(
                "Destination directory cannot be empty".to_string(),
            ));
        }

        if self.max_lines_per_file == 0 {
            return Err(LoggerError::Config(
                "max_lines_per_file must be greater than 0".to_string(),
            ));
        }

        if let Some(name) = &self.application_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(LoggerError::Config(format!(
                    "Invalid application name: {name:?}"
                )));
            }
        }

        Ok(())
    }
}
