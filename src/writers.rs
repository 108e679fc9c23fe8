//! Segment file writer.

use crate::error::{LoggerError, Result};
use crate::formatters::{Formatter, LogRecord};
use crate::process::ProcessInfo;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension of every segment file.
pub const SEGMENT_EXTENSION: &str = "qlog";

/// Builds `Machine_App_Pid_yyyy-MM-dd_HH-mm-ss_Seg{N}.qlog`.
pub fn segment_file_name(process: &ProcessInfo, created: &DateTime<Local>, segment: u64) -> String {
    format!(
        "{}_{}_{}_{}_Seg{}.{}",
        process.machine_name,
        process.application_name,
        process.process_id,
        created.format("%Y-%m-%d_%H-%M-%S"),
        segment,
        SEGMENT_EXTENSION
    )
}

/// A segment that has been closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSegment {
    /// Path of the segment file
    pub path: PathBuf,
    /// Lines successfully written to it
    pub lines: u64,
    /// Whether the file was deleted because it was empty
    pub removed: bool,
}

struct ActiveSegment {
    path: PathBuf,
    /// Unbuffered; a failed write leaves nothing pending
    sink: Box<dyn Write + Send>,
    lines: u64,
}

/// Writes records to the active segment and opens new ones on request.
///
/// Owned by the writer thread alone; nothing here is shared.
pub struct SegmentWriter {
    process: ProcessInfo,
    formatter: Box<dyn Formatter>,
    /// Index the next opened segment receives
    next_segment: u64,
    active: Option<ActiveSegment>,
}

impl std::fmt::Debug for SegmentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentWriter")
            .field("process", &self.process)
            .field("next_segment", &self.next_segment)
            .field("active_path", &self.active_path())
            .field("lines_in_file", &self.lines_in_file())
            .field("formatter", &"<dyn Formatter>")
            .finish()
    }
}

impl SegmentWriter {
    /// Creates a writer with no open segment. No file is touched until the
    /// first call to [`open_new_file`](Self::open_new_file).
    pub fn new(process: ProcessInfo, segment_base: u64, formatter: Box<dyn Formatter>) -> Self {
        Self {
            process,
            formatter,
            next_segment: segment_base,
            active: None,
        }
    }

    /// Closes the active segment and opens the next one in `directory`.
    ///
    /// Segment files are always created fresh. A name already taken by another
    /// logger in the same directory is skipped in favour of the next index.
    /// The index otherwise advances only when the new file was opened.
    pub fn open_new_file(&mut self, directory: &Path, now: &DateTime<Local>) -> Result<&Path> {
        self.close()?;

        let (path, file) = loop {
            let name = segment_file_name(&self.process, now, self.next_segment);
            let path = directory.join(name);
            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => self.next_segment += 1,
                Err(e) => return Err(e.into()),
            }
        };

        self.next_segment += 1;
        Ok(self.activate(path, Box::new(file)))
    }

    fn activate(&mut self, path: PathBuf, sink: Box<dyn Write + Send>) -> &Path {
        let active = self.active.insert(ActiveSegment {
            path,
            sink,
            lines: 0,
        });
        active.path.as_path()
    }

    /// Formats and writes one record as a single write, flushing it
    /// immediately. A failed write is not counted.
    pub fn write_line(&mut self, record: &LogRecord) -> Result<()> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| LoggerError::Custom("No segment is open".to_string()))?;

        let mut line = self.formatter.format(record);
        line.push('\n');
        active.sink.write_all(line.as_bytes())?;
        active.sink.flush()?;
        active.lines += 1;

        Ok(())
    }

    /// Flushes and closes the active segment, keeping the file.
    pub fn close(&mut self) -> Result<Option<ClosedSegment>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };

        active.sink.flush()?;
        Ok(Some(ClosedSegment {
            path: active.path,
            lines: active.lines,
            removed: false,
        }))
    }

    /// Closes the active segment and deletes it if nothing was written to it.
    pub fn finish(&mut self) -> Result<Option<ClosedSegment>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };

        // an empty segment is removed even if the final flush failed
        let flushed = active.sink.flush();
        drop(active.sink);

        if active.lines == 0 {
            std::fs::remove_file(&active.path)?;
            return Ok(Some(ClosedSegment {
                path: active.path,
                lines: 0,
                removed: true,
            }));
        }

        flushed?;
        Ok(Some(ClosedSegment {
            path: active.path,
            lines: active.lines,
            removed: false,
        }))
    }

    /// Path of the open segment, if any.
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    /// Lines written to the open segment, or `None` when no segment is open.
    pub fn lines_in_file(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.lines)
    }

    /// Index the next opened segment will receive.
    pub fn next_segment(&self) -> u64 {
        self.next_segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::formatters::LineFormatter;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// In-memory sink whose writes fail while `failing` is set.
    #[derive(Clone, Default)]
    struct FlakySink {
        written: Arc<Mutex<Vec<u8>>>,
        failing: Arc<AtomicBool>,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
            }
            self.written.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn process() -> ProcessInfo {
        ProcessInfo {
            machine_name: "host".to_string(),
            application_name: "app".to_string(),
            process_id: 42,
        }
    }

    fn record(sequence: u64, message: &str) -> LogRecord {
        LogRecord::new(
            LogLevel::Info,
            sequence,
            Local::now(),
            "1".to_string(),
            "tests".to_string(),
            message.to_string(),
        )
    }

    fn writer(base: u64) -> SegmentWriter {
        SegmentWriter::new(process(), base, Box::new(LineFormatter::new()))
    }

    #[test]
    fn test_segment_file_name() {
        let created = Local
            .with_ymd_and_hms(2024, 7, 1, 8, 9, 10)
            .single()
            .unwrap();
        assert_eq!(
            segment_file_name(&process(), &created, 3),
            "host_app_42_2024-07-01_08-09-10_Seg3.qlog"
        );
    }

    #[test]
    fn test_write_requires_open_segment() {
        let mut writer = writer(0);
        assert!(writer.write_line(&record(1, "nowhere")).is_err());
        assert_eq!(writer.lines_in_file(), None);
    }

    #[test]
    fn test_open_write_and_rotate() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = writer(5);

        let first = writer.open_new_file(dir.path(), &Local::now())?.to_path_buf();
        assert!(first.to_string_lossy().ends_with("_Seg5.qlog"));
        writer.write_line(&record(1, "one"))?;
        writer.write_line(&record(2, "two"))?;
        assert_eq!(writer.lines_in_file(), Some(2));

        let second = writer.open_new_file(dir.path(), &Local::now())?.to_path_buf();
        assert!(second.to_string_lossy().ends_with("_Seg6.qlog"));
        assert_eq!(writer.lines_in_file(), Some(0));
        assert_eq!(writer.next_segment(), 7);

        let contents = std::fs::read_to_string(&first)?;
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().ends_with(" tests one"));
        Ok(())
    }

    #[test]
    fn test_each_write_reaches_the_file() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = writer(0);
        let path = writer.open_new_file(dir.path(), &Local::now())?.to_path_buf();

        let mut last_len = std::fs::metadata(&path)?.len();
        for i in 1..=3 {
            writer.write_line(&record(i, "durable"))?;
            let len = std::fs::metadata(&path)?.len();
            assert!(len > last_len);
            last_len = len;
        }
        Ok(())
    }

    #[test]
    fn test_finish_removes_empty_segment() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = writer(0);
        let path = writer.open_new_file(dir.path(), &Local::now())?.to_path_buf();
        assert!(path.exists());

        let closed = writer.finish()?.unwrap();
        assert!(closed.removed);
        assert!(!path.exists());
        assert!(writer.finish()?.is_none());
        Ok(())
    }

    #[test]
    fn test_finish_keeps_written_segment() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = writer(0);
        writer.open_new_file(dir.path(), &Local::now())?;
        writer.write_line(&record(1, "kept"))?;

        let closed = writer.finish()?.unwrap();
        assert!(!closed.removed);
        assert_eq!(closed.lines, 1);
        assert!(closed.path.exists());
        Ok(())
    }

    #[test]
    fn test_open_failure_keeps_segment_index() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let mut writer = writer(1);

        assert!(writer.open_new_file(&missing, &Local::now()).is_err());
        assert_eq!(writer.next_segment(), 1);
        assert!(writer.active_path().is_none());
    }

    #[test]
    fn test_failed_write_is_neither_counted_nor_written_later() {
        let sink = FlakySink::default();
        let mut writer = writer(0);
        writer.activate(PathBuf::from("memory.qlog"), Box::new(sink.clone()));

        writer.write_line(&record(1, "first")).unwrap();
        sink.failing.store(true, Ordering::SeqCst);
        assert!(writer.write_line(&record(2, "second")).is_err());
        sink.failing.store(false, Ordering::SeqCst);
        writer.write_line(&record(3, "third")).unwrap();

        assert_eq!(writer.lines_in_file(), Some(2));
        let written = String::from_utf8(sink.written.lock().clone()).unwrap();
        let sequences: Vec<&str> = written
            .lines()
            .map(|line| line.split(' ').nth(1).unwrap())
            .collect();
        assert_eq!(sequences, vec!["1", "3"]);
    }

    #[test]
    fn test_taken_segment_name_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        let now = Local::now();
        let taken = dir.path().join(segment_file_name(&process(), &now, 0));
        std::fs::write(&taken, "INFO 1 other logger\n")?;

        let mut writer = writer(0);
        let path = writer.open_new_file(dir.path(), &now)?.to_path_buf();
        assert!(path.to_string_lossy().ends_with("_Seg1.qlog"));
        assert_eq!(writer.next_segment(), 2);

        writer.write_line(&record(1, "mine"))?;
        assert_eq!(std::fs::read_to_string(&taken)?, "INFO 1 other logger\n");
        Ok(())
    }
}
