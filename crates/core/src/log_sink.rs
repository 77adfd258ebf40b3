//! The operator-facing activity log.
//!
//! Producers append through a cloneable [`LogSink`]; a single [`LogStream`]
//! consumer receives the records in exactly the order `append` was called,
//! whichever task or thread called it. The consumer owns the entries in a
//! [`LogBook`], so nothing else mutates them.

use std::fmt::{Display, Formatter};

use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};

/// Severity of a log entry, rendered as a fixed glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Ok,
    Warn,
    Error,
}

impl Severity {
    pub fn glyph(self) -> char {
        match self {
            Severity::Info => '-',
            Severity::Ok => '+',
            Severity::Warn => '*',
            Severity::Error => '!',
        }
    }
}

/// One timestamped line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: OffsetDateTime,
    pub severity: Severity,
    pub message: String,
}

impl LogEvent {
    /// Stamps a message with the local wall clock, or UTC if the local offset is unknown.
    pub fn now(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
            severity,
            message: message.into(),
        }
    }
}

impl Display for LogEvent {
    /// Renders as `[HH:MM:SS] <glyph>  <message>`.
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let clock = self
            .timestamp
            .format(format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| std::fmt::Error)?;

        write!(
            formatter,
            "[{}] {}  {}",
            clock,
            self.severity.glyph(),
            self.message
        )
    }
}

/// What travels from producers to the consumer.
#[derive(Debug)]
pub enum LogRecord {
    Append(LogEvent),
    Clear,
    /// Acknowledged once every earlier record has been applied.
    Sync(oneshot::Sender<()>),
}

/// Creates a connected producer/consumer pair.
pub fn channel() -> (LogSink, LogStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (LogSink { sender }, LogStream { receiver })
}

/// Producer side of the activity log. Cheap to clone and usable from any task.
#[derive(Debug, Clone)]
pub struct LogSink {
    sender: mpsc::UnboundedSender<LogRecord>,
}

impl LogSink {
    /// Appends a message, stamped now.
    ///
    /// Appending after the consumer has gone away is silently dropped; there
    /// is nobody left to read it.
    pub fn append(&self, message: impl Into<String>, severity: Severity) {
        let _ = self
            .sender
            .send(LogRecord::Append(LogEvent::now(message, severity)));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.append(message, Severity::Info);
    }

    pub fn ok(&self, message: impl Into<String>) {
        self.append(message, Severity::Ok);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.append(message, Severity::Warn);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.append(message, Severity::Error);
    }

    /// Discards every earlier entry, then records the clear itself.
    pub fn clear(&self) {
        let _ = self.sender.send(LogRecord::Clear);
        self.info("Log limpo.");
    }

    /// Waits until the consumer has applied everything appended before this call.
    ///
    /// Returns immediately if the consumer is gone.
    pub async fn sync(&self) {
        let (ack, acked) = oneshot::channel();
        if self.sender.send(LogRecord::Sync(ack)).is_ok() {
            let _ = acked.await;
        }
    }
}

/// A change the consumer made to its book, handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub enum LogChange<'a> {
    Appended(&'a LogEvent),
    Cleared,
}

/// Ordered, append-only store of log entries, owned by the consumer.
#[derive(Debug, Default)]
pub struct LogBook {
    entries: Vec<LogEvent>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one record, returning the visible change if any.
    pub fn apply(&mut self, record: LogRecord) -> Option<LogChange<'_>> {
        match record {
            LogRecord::Append(event) => {
                self.entries.push(event);
                self.entries.last().map(LogChange::Appended)
            }
            LogRecord::Clear => {
                self.entries.clear();
                Some(LogChange::Cleared)
            }
            LogRecord::Sync(ack) => {
                let _ = ack.send(());
                None
            }
        }
    }

    pub fn entries(&self) -> &[LogEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry rendered as a display line.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

/// Consumer side of the activity log. There is exactly one per channel.
#[derive(Debug)]
pub struct LogStream {
    receiver: mpsc::UnboundedReceiver<LogRecord>,
}

impl LogStream {
    /// Waits for the next record; None once every sink is dropped.
    pub async fn recv(&mut self) -> Option<LogRecord> {
        self.receiver.recv().await
    }

    /// Applies every record already queued, without waiting.
    ///
    /// Returns the number of records applied.
    pub fn drain_into(&mut self, book: &mut LogBook) -> usize {
        let mut applied = 0;
        while let Ok(record) = self.receiver.try_recv() {
            book.apply(record);
            applied += 1;
        }
        applied
    }

    /// Consumer loop: applies records in order and hands each change to `render`.
    ///
    /// Ends when every [`LogSink`] has been dropped and returns the final book.
    pub async fn run<F>(mut self, mut render: F) -> LogBook
    where
        F: FnMut(LogChange<'_>),
    {
        let mut book = LogBook::new();
        while let Some(record) = self.recv().await {
            if let Some(change) = book.apply(record) {
                render(change);
            }
        }
        book
    }
}
