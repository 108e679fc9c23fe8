//! Segment rotation decisions.
//!
//! Boundaries are detected by comparing wall-clock fields at the moment of a
//! write, never by timers: a day that ends while the logger is idle is noticed
//! on the next write. Daily rotation compares calendar dates and hourly
//! rotation compares (date, hour), so a file never silently spans a week or a
//! day that happens to share the same weekday or hour.

use crate::config::RotationMode;
use chrono::{DateTime, Local, NaiveDate, Timelike};

/// Inputs observed by the writer before each write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationState {
    /// Whether a segment is currently open
    pub file_open: bool,
    /// Lines written to the open segment
    pub lines_in_file: u64,
    /// Calendar date observed at the previous evaluation
    pub current_day: Option<NaiveDate>,
    /// Hour of day observed at the previous evaluation
    pub current_hour: Option<u32>,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationDecision {
    /// The active segment must be closed and a new one opened
    pub rotate: bool,
    /// Date snapshot to keep for the next evaluation
    pub day: NaiveDate,
    /// Hour snapshot to keep for the next evaluation
    pub hour: u32,
}

/// Decides whether a new segment is needed before writing at `now`.
pub fn evaluate(
    mode: RotationMode,
    now: &DateTime<Local>,
    state: &RotationState,
    max_lines: u64,
) -> RotationDecision {
    let day = now.date_naive();
    let hour = now.hour();

    let rotate = if !state.file_open {
        true
    } else {
        let day_changed = state.current_day != Some(day);
        let hour_changed = day_changed || state.current_hour != Some(hour);
        let lines_reached = state.lines_in_file >= max_lines;

        (mode.uses_line_count() && lines_reached)
            || (mode.rotates_daily() && day_changed)
            || (mode.rotates_hourly() && hour_changed)
    };

    RotationDecision { rotate, day, hour }
}

/// Keeps the date/hour snapshots between evaluations.
#[derive(Debug, Clone, Default)]
pub struct RotationPolicy {
    current_day: Option<NaiveDate>,
    current_hour: Option<u32>,
}

impl RotationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates the policy and records the observed date and hour.
    ///
    /// `open_lines` is the line count of the active segment, or `None` when no
    /// segment is open.
    pub fn should_rotate(
        &mut self,
        mode: RotationMode,
        now: &DateTime<Local>,
        open_lines: Option<u64>,
        max_lines: u64,
    ) -> bool {
        let state = RotationState {
            file_open: open_lines.is_some(),
            lines_in_file: open_lines.unwrap_or(0),
            current_day: self.current_day,
            current_hour: self.current_hour,
        };

        let decision = evaluate(mode, now, &state, max_lines);
        self.current_day = Some(decision.day);
        self.current_hour = Some(decision.hour);
        decision.rotate
    }
}
