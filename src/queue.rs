//! The producer/consumer queue between submitting threads and the writer thread.
//!
//! Producers share one critical section holding the sequence counter and the
//! channel sender. A sequence number is assigned and the record is sent inside
//! the same lock hold, so channel order and sequence order always agree. The
//! channel itself is the wake signal: the writer blocks in `recv` while it is
//! empty and wakes once per message, re-checking for more.

use crate::config::LogLevel;
use crate::error::{LoggerError, Result};
use crate::formatters::LogRecord;
use crate::process::Clock;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

/// A message travelling from producers to the writer thread.
#[derive(Debug)]
pub enum Message {
    /// A record to be written
    Record(LogRecord),
    /// Acknowledge once everything before this message has been handled
    Flush(Sender<()>),
    /// Terminal message; nothing follows it
    Shutdown,
}

#[derive(Debug)]
struct QueueState {
    next_sequence: u64,
    /// `None` once the queue has been closed
    sender: Option<Sender<Message>>,
}

/// Producer side of the queue.
#[derive(Debug)]
pub struct MessageQueue {
    state: Mutex<QueueState>,
}

/// Consumer side of the queue, owned by the writer thread.
#[derive(Debug)]
pub struct QueueReceiver {
    receiver: Receiver<Message>,
}

impl MessageQueue {
    /// Creates a connected producer/consumer pair. Sequence numbers start at 1.
    pub fn new() -> (MessageQueue, QueueReceiver) {
        let (sender, receiver) = unbounded();
        let queue = MessageQueue {
            state: Mutex::new(QueueState {
                next_sequence: 1,
                sender: Some(sender),
            }),
        };
        (queue, QueueReceiver { receiver })
    }

    /// Builds a record and appends it to the queue.
    ///
    /// The timestamp is read and the sequence number assigned while the lock is
    /// held. Returns the assigned sequence number. A rejected record consumes no
    /// sequence number.
    pub fn enqueue(
        &self,
        level: LogLevel,
        clock: &dyn Clock,
        thread: String,
        caller: String,
        message: String,
    ) -> Result<u64> {
        let mut state = self.state.lock();
        let sequence = state.next_sequence;

        let sender = state.sender.as_ref().ok_or(LoggerError::ShutDown)?;
        let record = LogRecord::new(level, sequence, clock.now(), thread, caller, message);
        sender
            .send(Message::Record(record))
            .map_err(|_| LoggerError::Channel("Writer thread is gone".to_string()))?;

        state.next_sequence += 1;
        Ok(sequence)
    }

    /// Queues a flush barrier and returns the channel its acknowledgement
    /// arrives on.
    pub fn flush_barrier(&self) -> Result<Receiver<()>> {
        let state = self.state.lock();
        let sender = state.sender.as_ref().ok_or(LoggerError::ShutDown)?;

        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send(Message::Flush(ack_tx))
            .map_err(|_| LoggerError::Channel("Writer thread is gone".to_string()))?;
        Ok(ack_rx)
    }

    /// Sends the terminal shutdown message and stops accepting records.
    ///
    /// Returns `false` if the queue was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        match state.sender.take() {
            Some(sender) => {
                // the receiver may already be gone; dropping the sender still
                // disconnects the channel
                let _ = sender.send(Message::Shutdown);
                true
            }
            None => false,
        }
    }

    /// Whether the queue still accepts records.
    pub fn is_closed(&self) -> bool {
        self.state.lock().sender.is_none()
    }

    /// The sequence number the next accepted record will receive.
    pub fn next_sequence(&self) -> u64 {
        self.state.lock().next_sequence
    }

    /// Number of messages waiting for the writer.
    pub fn len(&self) -> usize {
        self.state.lock().sender.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueReceiver {
    /// Blocks until a message arrives. Returns `None` once every producer is
    /// gone and the queue is empty.
    pub fn recv(&self) -> Option<Message> {
        self.receiver.recv().ok()
    }

    /// Takes the next message without blocking.
    pub fn try_recv(&self) -> Option<Message> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
