//! The logger facade: level filtering, record submission, live settings and
//! shutdown.

use crate::caller::{CallerResolver, LocationResolver};
use crate::config::{LogLevel, LoggerConfig, RotationMode};
use crate::error::{LoggerError, Result};
use crate::formatters::{current_thread_id, Formatter, LineFormatter};
use crate::process::{Clock, ProcessInfo, SystemClock};
use crate::queue::MessageQueue;
use crate::worker::{Worker, WorkerContext, WorkerState};
use crate::writers::SegmentWriter;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::Arguments;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Logger statistics.
#[derive(Debug, Default, Clone)]
pub struct LoggerStats {
    /// Messages accepted into the queue
    pub total_messages: u64,
    /// Accepted messages by level
    pub messages_by_level: HashMap<LogLevel, u64>,
    /// Messages dropped by the minimum level
    pub filtered_messages: u64,
    /// Messages that could not be queued (after shutdown, or a dead writer)
    pub rejected_messages: u64,
    /// Lines written to segment files
    pub lines_written: u64,
    /// Failed writes or flushes
    pub write_errors: u64,
    /// Segments that could not be opened
    pub open_errors: u64,
    /// Segments opened
    pub segments_opened: u64,
    /// Empty segments deleted at shutdown
    pub empty_segments_removed: u64,
    /// Logger start time
    pub start_time: Option<SystemTime>,
}

/// Builder for a [`Logger`] with custom collaborators.
pub struct LoggerBuilder {
    config: LoggerConfig,
    clock: Arc<dyn Clock>,
    resolver: Box<dyn CallerResolver>,
    formatter: Box<dyn Formatter>,
    process: Option<ProcessInfo>,
}

impl std::fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("config", &self.config)
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

impl LoggerBuilder {
    fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            resolver: Box::new(LocationResolver),
            formatter: Box::new(LineFormatter::new()),
            process: None,
        }
    }

    /// Uses `clock` for timestamps and rotation boundaries.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses `resolver` to name the caller of the submission methods.
    pub fn caller_resolver<R: CallerResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replaces the line formatter.
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replaces the detected process identity used in file names.
    pub fn process_info(mut self, process: ProcessInfo) -> Self {
        self.process = Some(process);
        self
    }

    /// Validates the configuration, creates the destination directory and
    /// starts the writer thread. No segment file is created yet.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;
        create_directory(&self.config.directory)?;

        let mut process = self
            .process
            .unwrap_or_else(|| ProcessInfo::current().clone());
        if let Some(name) = &self.config.application_name {
            process = process.with_application_name(name.clone());
        }

        let writer = SegmentWriter::new(process, self.config.segment_base, self.formatter);
        let (queue, receiver) = MessageQueue::new();

        let settings = Arc::new(RwLock::new(self.config));
        let stats = Arc::new(Mutex::new(LoggerStats {
            start_time: Some(SystemTime::now()),
            ..Default::default()
        }));

        let context = WorkerContext {
            settings: Arc::clone(&settings),
            stats: Arc::clone(&stats),
            clock: Arc::clone(&self.clock),
        };
        let worker = Worker::spawn(receiver, writer, context)?;

        Ok(Logger {
            settings,
            queue,
            worker: Mutex::new(worker),
            clock: self.clock,
            resolver: self.resolver,
            stats,
        })
    }
}

fn create_directory(directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory).map_err(|e| {
        LoggerError::Config(format!(
            "Cannot create log directory {}: {e}",
            directory.display()
        ))
    })
}

/// Asynchronous segment logger.
///
/// Submission never blocks on I/O: records are queued and written by a single
/// background thread. Share it with `Arc<Logger>`; dropping the last handle
/// shuts it down.
pub struct Logger {
    settings: Arc<RwLock<LoggerConfig>>,
    queue: MessageQueue,
    worker: Mutex<Worker>,
    clock: Arc<dyn Clock>,
    resolver: Box<dyn CallerResolver>,
    stats: Arc<Mutex<LoggerStats>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &*self.settings.read())
            .field("worker_state", &self.worker_state())
            .field("next_sequence", &self.queue.next_sequence())
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger with the default collaborators.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        LoggerBuilder::new(config).build()
    }

    /// Starts a builder for injecting a clock, caller resolver or formatter.
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    /// Whether a message at `level` would be accepted.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.settings.read().level
    }

    /// Logs a message, naming the call site through the caller resolver.
    #[track_caller]
    pub fn log(&self, level: LogLevel, args: Arguments) {
        let location = Location::caller();
        self.submit(level, args, || self.resolver.resolve(location));
    }

    /// Logs a message with an explicit caller name.
    pub fn log_with_caller(&self, level: LogLevel, args: Arguments, caller: &str) {
        self.submit(level, args, || caller.to_string());
    }

    fn submit(&self, level: LogLevel, args: Arguments, caller: impl FnOnce() -> String) {
        if !self.is_enabled(level) {
            self.stats.lock().filtered_messages += 1;
            return;
        }

        let message = args.to_string();
        let queued = self.queue.enqueue(
            level,
            self.clock.as_ref(),
            current_thread_id(),
            caller(),
            message,
        );

        let mut stats = self.stats.lock();
        match queued {
            Ok(_) => {
                stats.total_messages += 1;
                *stats.messages_by_level.entry(level).or_insert(0) += 1;
            }
            // no channel exists to report this; the message is lost
            Err(_) => stats.rejected_messages += 1,
        }
    }

    /// Logs a debug message.
    #[track_caller]
    pub fn debug(&self, args: Arguments) {
        self.log(LogLevel::Debug, args)
    }

    /// Logs a verbose message.
    #[track_caller]
    pub fn verbose(&self, args: Arguments) {
        self.log(LogLevel::Verbose, args)
    }

    /// Logs an info message.
    #[track_caller]
    pub fn info(&self, args: Arguments) {
        self.log(LogLevel::Info, args)
    }

    /// Logs a warning message.
    #[track_caller]
    pub fn warn(&self, args: Arguments) {
        self.log(LogLevel::Warn, args)
    }

    /// Logs an error message.
    #[track_caller]
    pub fn error(&self, args: Arguments) {
        self.log(LogLevel::Error, args)
    }

    /// Logs a critical message.
    #[track_caller]
    pub fn critical(&self, args: Arguments) {
        self.log(LogLevel::Critical, args)
    }

    /// Blocks until every message submitted before this call has been written.
    pub fn flush(&self) -> Result<()> {
        self.queue
            .flush_barrier()?
            .recv()
            .map_err(|_| LoggerError::Channel("Writer thread exited before flushing".to_string()))
    }

    /// Stops accepting messages, waits for the writer to drain the queue and
    /// close the active segment. An empty segment is deleted.
    ///
    /// Calling it again has no effect.
    pub fn shutdown(&self) {
        self.queue.close();
        self.worker.lock().join();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed()
    }

    /// Current state of the writer thread.
    pub fn worker_state(&self) -> WorkerState {
        self.worker.lock().state()
    }

    /// The sequence number the next accepted message will receive.
    pub fn next_sequence(&self) -> u64 {
        self.queue.next_sequence()
    }

    /// Gets the current minimum level.
    pub fn minimum_level(&self) -> LogLevel {
        self.settings.read().level
    }

    /// Sets the minimum level; applies to the next submission.
    pub fn set_minimum_level(&self, level: LogLevel) {
        self.settings.write().level = level;
    }

    /// Gets the current rotation mode.
    pub fn rotation_mode(&self) -> RotationMode {
        self.settings.read().rotation
    }

    /// Sets the rotation mode; the writer uses it from its next write on.
    pub fn set_rotation_mode(&self, mode: RotationMode) {
        self.settings.write().rotation = mode;
    }

    /// Gets the line threshold of the line-count rotation modes.
    pub fn max_lines_per_file(&self) -> u64 {
        self.settings.read().max_lines_per_file
    }

    /// Sets the line threshold of the line-count rotation modes.
    pub fn set_max_lines_per_file(&self, max_lines: u64) -> Result<()> {
        if max_lines == 0 {
            return Err(LoggerError::Config(
                "max_lines_per_file must be greater than 0".to_string(),
            ));
        }
        self.settings.write().max_lines_per_file = max_lines;
        Ok(())
    }

    /// Gets the destination directory.
    pub fn destination_directory(&self) -> PathBuf {
        self.settings.read().directory.clone()
    }

    /// Creates `directory` if needed and sends future segments there.
    ///
    /// The active segment stays where it is until the next rotation.
    pub fn set_destination_directory<P: Into<PathBuf>>(&self, directory: P) -> Result<()> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(LoggerError::Config(
                "Destination directory cannot be empty".to_string(),
            ));
        }
        create_directory(&directory)?;
        self.settings.write().directory = directory;
        Ok(())
    }

    /// Gets the current configuration.
    pub fn config(&self) -> LoggerConfig {
        self.settings.read().clone()
    }

    /// Gets logger statistics.
    pub fn stats(&self) -> LoggerStats {
        self.stats.lock().clone()
    }

    /// Resets logger statistics.
    pub fn reset_stats(&self) {
        let mut stats = self.stats.lock();
        *stats = LoggerStats {
            start_time: Some(SystemTime::now()),
            ..Default::default()
        };
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(feature = "log")]
impl LogLevel {
    /// Maps a `log` crate level; `Trace` becomes `Debug` and `Debug` becomes
    /// `Verbose`.
    pub fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Verbose,
            log::Level::Trace => LogLevel::Debug,
        }
    }
}

#[cfg(feature = "log")]
impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.is_enabled(LogLevel::from_log_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let caller = record.module_path().unwrap_or(record.target());
        self.log_with_caller(
            LogLevel::from_log_level(record.level()),
            *record.args(),
            caller,
        );
    }

    fn flush(&self) {
        let _ = Logger::flush(self);
    }
}
