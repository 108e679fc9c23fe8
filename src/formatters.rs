//! Log records and their on-disk line format.

use crate::config::LogLevel;
use chrono::{DateTime, Local, SubsecRound, Timelike};

/// A complete, immutable log record.
///
/// Every field is fixed when the record is accepted into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Log level
    pub level: LogLevel,
    /// Per-logger sequence number, starting at 1
    pub sequence: u64,
    /// Wall-clock time of submission, millisecond precision
    pub timestamp: DateTime<Local>,
    /// Identifier of the submitting thread
    pub thread: String,
    /// Resolved caller identity
    pub caller: String,
    /// Owned copy of the message text
    pub message: String,
}

impl LogRecord {
    /// Creates a new log record.
    pub fn new(
        level: LogLevel,
        sequence: u64,
        timestamp: DateTime<Local>,
        thread: String,
        caller: String,
        message: String,
    ) -> Self {
        Self {
            level,
            sequence,
            timestamp: timestamp.trunc_subsecs(3),
            thread,
            caller,
            message,
        }
    }
}

/// Trait for formatting log records into a single output line.
pub trait Formatter: Send + Sync {
    /// Formats a log record, without the trailing newline.
    fn format(&self, record: &LogRecord) -> String;
}

/// The `.qlog` line format:
/// `LEVEL 1,234 dd/MM/yyyy-HH:mm:ss.ffff thread caller message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormatter;

impl LineFormatter {
    /// Creates a new line formatter.
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord) -> String {
        format!(
            "{} {} {} {} {} {}",
            record.level.as_str(),
            group_thousands(record.sequence),
            format_timestamp(&record.timestamp),
            record.thread,
            record.caller,
            record.message
        )
    }
}

/// Formats `timestamp` as `dd/MM/yyyy-HH:mm:ss.ffff`.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    // chrono only offers 3, 6 or 9 fractional digits
    let ten_thousandths = (timestamp.nanosecond() / 100_000).min(9_999);
    format!(
        "{}.{:04}",
        timestamp.format("%d/%m/%Y-%H:%M:%S"),
        ten_thousandths
    )
}

/// Renders `value` with comma thousands separators, e.g. `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Identifier of the calling thread.
///
/// `ThreadId` has no stable numeric accessor, so the number is taken from its
/// `Debug` output (`ThreadId(7)` becomes `7`).
pub fn current_thread_id() -> String {
    let raw = format!("{:?}", std::thread::current().id());
    raw.strip_prefix("ThreadId(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::to_string)
        .unwrap_or(raw)
}
