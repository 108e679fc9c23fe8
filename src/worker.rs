//! The single writer thread.
//!
//! The thread owns the [`SegmentWriter`] and the [`RotationPolicy`], so file
//! handles, line counters and rotation snapshots are never shared. It blocks on
//! the queue while it is empty, drains everything available once woken, and
//! evaluates rotation before every individual write. The shutdown message is
//! terminal: once seen, the active segment is finished and the thread exits
//! without waiting again.

use crate::config::LoggerConfig;
use crate::error::Result;
use crate::formatters::LogRecord;
use crate::logger::LoggerStats;
use crate::process::Clock;
use crate::queue::{Message, QueueReceiver};
use crate::rotation::RotationPolicy;
use crate::writers::SegmentWriter;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Lifecycle of the writer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Blocked until a message arrives
    Waiting,
    /// Writing queued records
    Draining,
    /// Closing the active segment
    ShuttingDown,
    /// Thread has exited
    Terminated,
}

impl WorkerState {
    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Waiting => 0,
            WorkerState::Draining => 1,
            WorkerState::ShuttingDown => 2,
            WorkerState::Terminated => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Waiting,
            1 => WorkerState::Draining,
            2 => WorkerState::ShuttingDown,
            _ => WorkerState::Terminated,
        }
    }
}

/// Shared handles the writer thread reads from and reports into.
#[derive(Clone)]
pub struct WorkerContext {
    /// Live settings; read before every write
    pub settings: Arc<RwLock<LoggerConfig>>,
    /// Counters updated by the writer
    pub stats: Arc<Mutex<LoggerStats>>,
    /// Clock used for rotation boundaries and segment names
    pub clock: Arc<dyn Clock>,
}

/// Handle to the writer thread.
#[derive(Debug)]
pub struct Worker {
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts the writer thread.
    pub fn spawn(
        receiver: QueueReceiver,
        writer: SegmentWriter,
        context: WorkerContext,
    ) -> Result<Worker> {
        let state = Arc::new(AtomicU8::new(WorkerState::Waiting.as_u8()));

        let mut worker_loop = WorkerLoop {
            receiver,
            writer,
            policy: RotationPolicy::new(),
            context,
            state: Arc::clone(&state),
        };

        let handle = thread::Builder::new()
            .name("qlogger-writer".to_string())
            .spawn(move || worker_loop.run())?;

        Ok(Worker {
            state,
            handle: Some(handle),
        })
    }

    /// Current lifecycle state of the thread.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Waits for the thread to exit. Later calls return immediately.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                // a panicking writer never reached its terminal state
                self.state
                    .store(WorkerState::Terminated.as_u8(), Ordering::Release);
            }
        }
    }
}

struct WorkerLoop {
    receiver: QueueReceiver,
    writer: SegmentWriter,
    policy: RotationPolicy,
    context: WorkerContext,
    state: Arc<AtomicU8>,
}

impl WorkerLoop {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn run(&mut self) {
        'outer: loop {
            self.set_state(WorkerState::Waiting);

            // every producer gone without a shutdown message ends the loop too
            let Some(mut message) = self.receiver.recv() else {
                break;
            };

            self.set_state(WorkerState::Draining);
            loop {
                match message {
                    Message::Record(record) => self.write_record(&record),
                    Message::Flush(ack) => {
                        let _ = ack.send(());
                    }
                    Message::Shutdown => break 'outer,
                }

                match self.receiver.try_recv() {
                    Some(next) => message = next,
                    None => break,
                }
            }
        }

        self.set_state(WorkerState::ShuttingDown);
        self.finish();
        self.set_state(WorkerState::Terminated);
    }

    fn write_record(&mut self, record: &LogRecord) {
        let (mode, max_lines, directory) = {
            let settings = self.context.settings.read();
            (
                settings.rotation,
                settings.max_lines_per_file,
                settings.directory.clone(),
            )
        };

        let now = self.context.clock.now();
        if self
            .policy
            .should_rotate(mode, &now, self.writer.lines_in_file(), max_lines)
        {
            if self.writer.open_new_file(&directory, &now).is_err() {
                // the record is lost; its sequence number stays missing
                self.context.stats.lock().open_errors += 1;
                return;
            }
            self.context.stats.lock().segments_opened += 1;
        }

        let written = self.writer.write_line(record);
        let mut stats = self.context.stats.lock();
        match written {
            Ok(()) => stats.lines_written += 1,
            Err(_) => stats.write_errors += 1,
        }
    }

    fn finish(&mut self) {
        let finished = self.writer.finish();
        let mut stats = self.context.stats.lock();
        match finished {
            Ok(Some(segment)) if segment.removed => stats.empty_segments_removed += 1,
            Ok(_) => {}
            Err(_) => stats.write_errors += 1,
        }
    }
}
