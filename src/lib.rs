//! # qlogger
//!
//! An asynchronous, thread-safe file logger. Any number of threads submit
//! leveled messages; one background thread writes them, in submission order,
//! to a rotating series of `.qlog` segment files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use qlogger::{qlog_info, LogLevel, Logger, LoggerConfig, RotationMode};
//!
//! let config = LoggerConfig::builder()
//!     .directory("logs")
//!     .level(LogLevel::Info)
//!     .rotation(RotationMode::ByLineCountOrDaily)
//!     .max_lines_per_file(50_000)
//!     .build();
//!
//! let logger = Logger::new(config)?;
//! logger.info(format_args!("service started"));
//! qlog_info!(logger, "listening on port {}", 8080);
//! logger.shutdown();
//! # Ok::<(), qlogger::LoggerError>(())
//! ```
//!
//! ## Output
//!
//! Segments are named `Machine_App_Pid_yyyy-MM-dd_HH-mm-ss_Seg{N}.qlog` and hold
//! one record per line:
//!
//! ```text
//! INFO 1,024 09/03/2024-14:05:07.1230 7 my_app::server listening on port 8080
//! ```
//!
//! Every accepted message receives the next sequence number, starting at 1.
//! A missing number in the output marks a record lost to an I/O failure.
//!
//! ## Features
//!
//! - `json` (default): load [`LoggerConfig`] from JSON.
//! - `log`: [`Logger`] implements `log::Log`.

pub mod caller;
pub mod config;
pub mod error;
pub mod formatters;
pub mod logger;
pub mod macros;
pub mod process;
pub mod queue;
pub mod rotation;
pub mod worker;
pub mod writers;

pub use caller::{CallerResolver, FixedCaller, LocationResolver, UNRESOLVED_CALLER};
pub use config::{LogLevel, LoggerConfig, LoggerConfigBuilder, RotationMode};
pub use error::{LoggerError, Result};
pub use formatters::{Formatter, LineFormatter, LogRecord};
pub use logger::{Logger, LoggerBuilder, LoggerStats};
pub use process::{Clock, ProcessInfo, SystemClock};
pub use rotation::{RotationDecision, RotationPolicy, RotationState};
pub use worker::WorkerState;
pub use writers::{segment_file_name, SEGMENT_EXTENSION};
