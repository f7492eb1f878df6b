//! Tests for the collector contract

use super::*;
use crate::cache::MemoryCache;
use crate::error::Error;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collector stub that replays a scripted sequence of outcomes
struct ScriptedCollector {
    descriptor: CollectorDescriptor,
    script: Mutex<VecDeque<std::result::Result<Payload, Error>>>,
    delay: Duration,
    runs: AtomicUsize,
}

impl ScriptedCollector {
    fn new(name: &str, key: &str, ttl: Duration) -> Self {
        Self {
            descriptor: CollectorDescriptor::new(name, Duration::from_secs(60), ttl, key),
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            runs: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn push(&self, result: std::result::Result<Payload, Error>) {
        self.script.lock().await.push_back(result);
    }

    fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collector for ScriptedCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> crate::error::Result<Payload> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Payload::raw("{}")))
    }
}

/// Cache stub whose writes always fail
struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> crate::error::Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> crate::error::Result<()> {
        Err(Error::cache("connection refused"))
    }
}

#[tokio::test]
async fn test_successful_run_publishes_to_cache() {
    let cache = Arc::new(MemoryCache::new());
    let collector = Arc::new(ScriptedCollector::new(
        "quake_alerts",
        "quakes:recent",
        Duration::from_secs(300),
    ));
    collector
        .push(Ok(Payload::from_value_with_records(
            &serde_json::json!([{"mag": 5.1}]),
            1,
        )
        .unwrap()))
        .await;

    let handle = CollectorHandle::new(collector, cache.clone());
    let result = handle.run_once().await;

    assert!(result.is_success());
    match result.outcome {
        RunOutcome::Success { bytes, records } => {
            assert!(bytes > 0);
            assert_eq!(records, Some(1));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        cache.get("quakes:recent").await.unwrap().as_deref(),
        Some(r#"[{"mag":5.1}]"#)
    );
}

#[tokio::test]
async fn test_failed_run_leaves_previous_entry() {
    let cache = Arc::new(MemoryCache::new());
    cache
        .set("quakes:recent", "old-value", Duration::from_secs(600))
        .await
        .unwrap();

    let collector = Arc::new(ScriptedCollector::new(
        "quake_alerts",
        "quakes:recent",
        Duration::from_secs(300),
    ));
    collector
        .push(Err(Error::http_status(404, "gone")))
        .await;

    let handle = CollectorHandle::new(collector, cache.clone());
    let result = handle.run_once().await;

    match result.outcome {
        RunOutcome::Failed { kind, .. } => {
            assert_eq!(kind, crate::error::FailureKind::PermanentUpstream);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Stale-but-available is preferred over absent
    assert_eq!(
        cache.get("quakes:recent").await.unwrap().as_deref(),
        Some("old-value")
    );
}

#[tokio::test]
async fn test_cache_write_failure_is_contained() {
    let collector = Arc::new(ScriptedCollector::new(
        "sst",
        "sst:global",
        Duration::from_secs(300),
    ));
    let handle = CollectorHandle::new(collector.clone(), Arc::new(BrokenCache));

    let result = handle.run_once().await;
    match result.outcome {
        RunOutcome::Failed { kind, .. } => {
            assert_eq!(kind, crate::error::FailureKind::CacheStore);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // The next run proceeds unaffected
    let result = handle.run_once().await;
    assert!(!result.is_skipped());
    assert_eq!(collector.run_count(), 2);
}

#[tokio::test]
async fn test_overlapping_run_is_skipped() {
    let cache = Arc::new(MemoryCache::new());
    let collector = Arc::new(
        ScriptedCollector::new("slow", "slow:data", Duration::from_secs(60))
            .with_delay(Duration::from_millis(200)),
    );
    let handle = Arc::new(CollectorHandle::new(collector.clone(), cache));

    let first = {
        let handle = Arc::clone(&handle);
        tokio::spawn(async move { handle.run_once().await })
    };
    // Let the first run reach its fetch before contending
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = handle.run_once().await;
    assert!(second.is_skipped());

    let first = first.await.unwrap();
    assert!(first.is_success());
    assert_eq!(collector.run_count(), 1);
}

#[tokio::test]
async fn test_run_after_completion_is_not_skipped() {
    let cache = Arc::new(MemoryCache::new());
    let collector = Arc::new(ScriptedCollector::new(
        "fast",
        "fast:data",
        Duration::from_secs(60),
    ));
    let handle = CollectorHandle::new(collector.clone(), cache);

    assert!(handle.run_once().await.is_success());
    assert!(handle.run_once().await.is_success());
    assert_eq!(collector.run_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_run_then_ttl_expiry() {
    // Successful run writes TTL 600s; a failing run at t=400s writes
    // nothing; the old value survives to t=500s and is absent by t=650s.
    let cache = Arc::new(MemoryCache::new());
    let collector = Arc::new(ScriptedCollector::new(
        "warnings",
        "source:warnings",
        Duration::from_secs(600),
    ));
    collector
        .push(Ok(Payload::raw(r#"["heat","flood"]"#)))
        .await;
    collector
        .push(Err(Error::Timeout { timeout_ms: 5000 }))
        .await;

    let handle = CollectorHandle::new(collector, cache.clone());

    assert!(handle.run_once().await.is_success());

    tokio::time::advance(Duration::from_secs(400)).await;
    assert!(!handle.run_once().await.is_success());

    tokio::time::advance(Duration::from_secs(100)).await;
    assert_eq!(
        cache.get("source:warnings").await.unwrap().as_deref(),
        Some(r#"["heat","flood"]"#)
    );

    tokio::time::advance(Duration::from_secs(150)).await;
    assert_eq!(cache.get("source:warnings").await.unwrap(), None);
}

#[test]
fn test_payload_from_value_counts_arrays() {
    let payload = Payload::from_value(&serde_json::json!([1, 2, 3])).unwrap();
    assert_eq!(payload.records, Some(3));

    let payload = Payload::from_value(&serde_json::json!({"a": 1})).unwrap();
    assert_eq!(payload.records, None);
}
