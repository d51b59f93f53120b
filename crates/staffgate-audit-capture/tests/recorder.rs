//! Recorder and writer behaviour against scripted sinks.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use staffgate_audit_capture::{
    AuditAction, AuditActors, AuditEntry, AuditError, AuditRecorder, AuditSink, CaptureConfig, WriteReceipt,
};
use staffgate_common_core::{PrincipalId, RequestId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stores entries, deduplicating by request id, after `fail_first` storage errors.
#[derive(Default)]
struct ScriptedSink {
    fail_first: u32,
    calls: AtomicU32,
    entries: Mutex<Vec<AuditEntry>>,
    seen: Mutex<HashSet<RequestId>>,
}

impl ScriptedSink {
    fn failing(times: u32) -> Self {
        Self {
            fail_first: times,
            ..Default::default()
        }
    }

    fn stored(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl AuditSink for ScriptedSink {
    async fn write(&self, entry: &AuditEntry) -> Result<WriteReceipt, AuditError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(AuditError::Storage("disk unavailable".into()));
        }
        if !self.seen.lock().insert(entry.request_id) {
            return Ok(WriteReceipt::Duplicate);
        }
        let mut entries = self.entries.lock();
        entries.push(entry.clone());
        Ok(WriteReceipt::Stored {
            sequence: entries.len() as u64 - 1,
        })
    }
}

fn fast_retries(max_attempts: u32) -> CaptureConfig {
    CaptureConfig {
        buffer_size: 64,
        max_attempts,
        retry_base_delay: Duration::from_millis(1),
        retry_max_delay: Duration::from_millis(4),
    }
}

fn entry() -> AuditEntry {
    AuditEntry::builder(AuditAction::Update, "shifts", AuditActors::direct(PrincipalId::new()), RequestId::new())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_entries_reach_sink_in_order() {
    let sink = Arc::new(ScriptedSink::default());
    let (recorder, writer) = AuditRecorder::spawn(sink.clone(), fast_retries(3));

    let entries: Vec<_> = (0..10).map(|_| entry()).collect();
    for e in &entries {
        recorder.enqueue(e.clone());
    }
    recorder.flush().await.unwrap();

    let stored: Vec<_> = sink.stored().iter().map(|e| e.request_id).collect();
    let expected: Vec<_> = entries.iter().map(|e| e.request_id).collect();
    assert_eq!(stored, expected);
    assert_eq!(recorder.health().stored, 10);

    drop(recorder);
    writer.await.unwrap();
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let sink = Arc::new(ScriptedSink::failing(2));
    let (recorder, _writer) = AuditRecorder::spawn(sink.clone(), fast_retries(5));

    recorder.enqueue(entry());
    recorder.flush().await.unwrap();

    assert_eq!(sink.stored().len(), 1);
    let health = recorder.health();
    assert_eq!(health.retries, 2);
    assert_eq!(health.failed, 0);
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_exhausted_retries_raise_failure_signal() {
    let sink = Arc::new(ScriptedSink::failing(u32::MAX));
    let (recorder, _writer) = AuditRecorder::spawn(sink.clone(), fast_retries(3));

    recorder.enqueue(entry());
    recorder.flush().await.unwrap();

    let health = recorder.health();
    assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    assert_eq!(health.failed, 1);
    assert_eq!(health.in_flight, 0);
    assert!(!health.is_healthy());
}

#[tokio::test]
async fn test_resubmitted_entry_is_deduplicated() {
    let sink = Arc::new(ScriptedSink::default());
    let (recorder, _writer) = AuditRecorder::spawn(sink.clone(), fast_retries(1));

    let e = entry();
    recorder.enqueue(e.clone());
    recorder.enqueue(e);
    recorder.flush().await.unwrap();

    assert_eq!(sink.stored().len(), 1);
    assert_eq!(recorder.health().duplicates, 1);
}

#[tokio::test]
async fn test_overflow_entries_are_not_lost() {
    let sink = Arc::new(ScriptedSink::default());
    let config = CaptureConfig {
        buffer_size: 1,
        ..fast_retries(1)
    };
    let (recorder, writer) = AuditRecorder::new(sink.clone(), config);

    for _ in 0..20 {
        recorder.enqueue(entry());
    }
    let writer = tokio::spawn(writer.run());
    recorder.flush().await.unwrap();

    assert_eq!(sink.stored().len(), 20);
    assert!(recorder.health().overflowed > 0);

    drop(recorder);
    writer.await.unwrap();
}

#[tokio::test]
async fn test_invalid_entry_refused() {
    let sink = Arc::new(ScriptedSink::default());
    let (recorder, _writer) = AuditRecorder::spawn(sink.clone(), fast_retries(1));

    let id = PrincipalId::new();
    let mut bad = entry();
    bad.is_impersonated = true;
    bad.original_actor_id = Some(id);
    bad.impersonation_started_at = Some(Utc::now());
    bad.actor_id = id;

    recorder.enqueue(bad);
    recorder.flush().await.unwrap();

    assert!(sink.stored().is_empty());
    assert_eq!(recorder.health().failed, 1);
}

#[tokio::test]
async fn test_flush_after_writer_stops_reports_closed() {
    let sink = Arc::new(ScriptedSink::default());
    let (recorder, writer) = AuditRecorder::new(sink, fast_retries(1));
    drop(writer);

    assert!(matches!(recorder.flush().await, Err(AuditError::Closed)));
    assert!(!recorder.is_open());
}
