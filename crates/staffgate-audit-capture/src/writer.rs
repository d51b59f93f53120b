//! Background writer that drains the recorder queue into a sink.

use crate::health::AuditHealth;
use crate::recorder::CaptureConfig;
use crate::sink::{AuditSink, WriteReceipt};
use staffgate_audit_types::AuditEntry;
use staffgate_common_log::spans::audit_write_span;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn, Instrument};

pub(crate) enum WriterMessage {
    Entry(Box<AuditEntry>),
    Flush(oneshot::Sender<()>),
}

/// Drains queued entries one at a time, in queue order.
pub struct AuditWriter {
    receiver: mpsc::Receiver<WriterMessage>,
    sink: Arc<dyn AuditSink>,
    config: CaptureConfig,
    health: Arc<AuditHealth>,
}

impl AuditWriter {
    pub(crate) fn new(
        receiver: mpsc::Receiver<WriterMessage>,
        sink: Arc<dyn AuditSink>,
        config: CaptureConfig,
        health: Arc<AuditHealth>,
    ) -> Self {
        Self {
            receiver,
            sink,
            config,
            health,
        }
    }

    /// Run until every recorder handle is dropped and the queue is empty.
    pub async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            match message {
                WriterMessage::Entry(entry) => self.write_with_retry(&entry).await,
                WriterMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        info!("audit writer stopped");
    }

    async fn write_with_retry(&self, entry: &AuditEntry) {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let span = audit_write_span(&entry.request_id.to_string(), attempt);
            let result = self.sink.write(entry).instrument(span).await;

            match result {
                Ok(WriteReceipt::Stored { sequence }) => {
                    debug!(request_id = %entry.request_id, sequence, "audit entry stored");
                    self.health.stored();
                    return;
                }
                Ok(WriteReceipt::Duplicate) => {
                    debug!(request_id = %entry.request_id, "audit entry already stored");
                    self.health.duplicate();
                    return;
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.backoff(attempt);
                    self.health.retry();
                    warn!(
                        request_id = %entry.request_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "audit write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.health.failed();
                    error!(
                        request_id = %entry.request_id,
                        actor_id = %entry.actor_id,
                        original_actor_id = ?entry.original_actor_id,
                        is_impersonated = entry.is_impersonated,
                        action = %entry.action,
                        resource = %entry.resource,
                        resource_id = ?entry.resource_id,
                        attempts = attempt,
                        entry = %serde_json::to_string(entry).unwrap_or_default(),
                        error = %e,
                        "audit write failed permanently"
                    );
                    return;
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .retry_base_delay
            .saturating_mul(factor)
            .min(self.config.retry_max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_with(config: CaptureConfig) -> AuditWriter {
        struct Nothing;

        #[async_trait::async_trait]
        impl AuditSink for Nothing {
            async fn write(&self, _: &AuditEntry) -> Result<WriteReceipt, staffgate_audit_types::AuditError> {
                Ok(WriteReceipt::Duplicate)
            }
        }

        let (_tx, rx) = mpsc::channel(1);
        AuditWriter::new(rx, Arc::new(Nothing), config, Arc::new(AuditHealth::default()))
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let writer = writer_with(CaptureConfig {
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_millis(350),
            ..Default::default()
        });

        assert_eq!(writer.backoff(1), Duration::from_millis(100));
        assert_eq!(writer.backoff(2), Duration::from_millis(200));
        assert_eq!(writer.backoff(3), Duration::from_millis(350));
        assert_eq!(writer.backoff(30), Duration::from_millis(350));
    }
}
