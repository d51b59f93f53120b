//! Non-blocking handle for recording audit entries.

use crate::context::AuditContext;
use crate::health::{AuditHealth, AuditHealthSnapshot};
use crate::sink::AuditSink;
use crate::writer::{AuditWriter, WriterMessage};
use staffgate_audit_types::{AuditEntry, AuditError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Recorder and writer settings.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Queue capacity before overflow sends are spawned.
    pub buffer_size: usize,
    /// Write attempts per entry, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay: Duration,
    /// Upper bound on a single retry delay.
    pub retry_max_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_size: 10_000,
            max_attempts: 5,
            retry_base_delay: Duration::from_millis(50),
            retry_max_delay: Duration::from_secs(5),
        }
    }
}

/// Handle for submitting audit entries.
///
/// Cloning is cheap. [`AuditRecorder::record`] never waits on storage.
#[derive(Clone)]
pub struct AuditRecorder {
    sender: mpsc::Sender<WriterMessage>,
    health: Arc<AuditHealth>,
}

impl AuditRecorder {
    /// Create a recorder and the writer that drains it.
    ///
    /// The writer does nothing until [`AuditWriter::run`] is awaited or
    /// spawned.
    pub fn new(sink: Arc<dyn AuditSink>, config: CaptureConfig) -> (Self, AuditWriter) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let health = Arc::new(AuditHealth::default());
        let writer = AuditWriter::new(receiver, sink, config, health.clone());
        (Self { sender, health }, writer)
    }

    /// Create a recorder and spawn its writer on the current runtime.
    pub fn spawn(sink: Arc<dyn AuditSink>, config: CaptureConfig) -> (Self, tokio::task::JoinHandle<()>) {
        let (recorder, writer) = Self::new(sink, config);
        (recorder, tokio::spawn(writer.run()))
    }

    /// Build the entry for `context` and queue it.
    pub fn record(&self, context: AuditContext) {
        match context.into_entry() {
            Ok(entry) => self.enqueue(entry),
            Err(e) => {
                self.health.rejected();
                error!(error = %e, "audit entry could not be built");
            }
        }
    }

    /// Queue a prepared entry.
    pub fn enqueue(&self, entry: AuditEntry) {
        if let Err(e) = entry.validate() {
            self.health.rejected();
            error!(request_id = %entry.request_id, error = %e, "refusing invalid audit entry");
            return;
        }

        self.health.accepted();
        let request_id = entry.request_id;

        match self.sender.try_send(WriterMessage::Entry(Box::new(entry))) {
            Ok(()) => debug!(request_id = %request_id, "audit entry queued"),
            Err(mpsc::error::TrySendError::Full(message)) => {
                self.health.overflowed();
                warn!(request_id = %request_id, "audit queue full, handing entry to overflow send");

                let sender = self.sender.clone();
                let health = self.health.clone();
                tokio::spawn(async move {
                    if sender.send(message).await.is_err() {
                        health.failed();
                        error!(request_id = %request_id, "audit writer closed before overflow entry was queued");
                    }
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.health.failed();
                error!(request_id = %request_id, "audit writer closed, entry lost");
            }
        }
    }

    /// Wait until every entry recorded before this call has been written or
    /// has failed for good.
    pub async fn flush(&self) -> Result<(), AuditError> {
        loop {
            let (ack, done) = oneshot::channel();
            self.sender
                .send(WriterMessage::Flush(ack))
                .await
                .map_err(|_| AuditError::Closed)?;
            done.await.map_err(|_| AuditError::Closed)?;

            // Overflow sends may still be on their way into the queue.
            if self.health.in_flight() == 0 {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub fn health(&self) -> AuditHealthSnapshot {
        self.health.snapshot()
    }

    /// Whether the writer is still accepting entries.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Fraction of the queue in use.
    pub fn buffer_usage(&self) -> f64 {
        let capacity = self.sender.capacity();
        let max_capacity = self.sender.max_capacity();
        1.0 - (capacity as f64 / max_capacity as f64)
    }
}
