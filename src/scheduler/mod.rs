//! Collector scheduler
//!
//! Owns the complete set of collector handles and drives each on its own
//! interval until shutdown. There is no global tick: every collector gets
//! its own task and timer, so one collector's slow run or failure can
//! never delay another's cadence.
//!
//! Guarantees per collector:
//! - successive runs never overlap: a tick that lands while a run is in
//!   flight is skipped, not queued
//! - an optional randomized start offset staggers the initial fan-out so
//!   process start does not produce a synchronized burst of requests
//! - shutdown stops new runs and lets in-flight runs finish; nothing is
//!   force-killed mid-cache-write

use crate::cache::CacheStore;
use crate::collector::{Collector, CollectorDescriptor, CollectorHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};


/// Drives all registered collectors on their own intervals
pub struct Scheduler {
    cache: Arc<dyn CacheStore>,
    handles: Vec<Arc<CollectorHandle>>,
    stagger: bool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler publishing to the given cache store
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            cache,
            handles: Vec::new(),
            stagger: true,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Disable the randomized start offset (tests want determinism)
    #[must_use]
    pub fn without_stagger(mut self) -> Self {
        self.stagger = false;
        self
    }

    /// Register a collector
    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        let handle = CollectorHandle::new(collector, Arc::clone(&self.cache));
        self.handles.push(Arc::new(handle));
    }

    /// Descriptors of all registered collectors
    pub fn descriptors(&self) -> Vec<CollectorDescriptor> {
        self.handles
            .iter()
            .map(|h| h.descriptor().clone())
            .collect()
    }

    /// Number of registered collectors
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no collectors are registered
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Spawn one task per collector and start ticking
    pub fn start(&mut self) {
        info!(collectors = self.handles.len(), "starting scheduler");
        for handle in &self.handles {
            let handle = Arc::clone(handle);
            let shutdown = self.shutdown_rx.clone();
            let stagger = self.stagger;
            self.tasks.push(tokio::spawn(run_collector_loop(
                handle, shutdown, stagger,
            )));
        }
    }

    /// Stop issuing new runs and wait for in-flight runs to finish
    pub async fn shutdown(mut self) {
        info!("scheduler shutting down");
        // Receivers see the change and exit their loops after any
        // in-flight run_once completes.
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("scheduler stopped");
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("collectors", &self.handles.len())
            .field("stagger", &self.stagger)
            .finish_non_exhaustive()
    }
}

/// Per-collector loop: optional stagger, then tick forever until shutdown
async fn run_collector_loop(
    handle: Arc<CollectorHandle>,
    mut shutdown: watch::Receiver<bool>,
    stagger: bool,
) {
    let descriptor = handle.descriptor().clone();

    if stagger {
        let offset = stagger_offset(descriptor.interval);
        debug!(
            collector = %descriptor.name,
            offset_ms = offset.as_millis() as u64,
            "staggering initial run"
        );
        tokio::select! {
            () = tokio::time::sleep(offset) => {}
            _ = shutdown.changed() => return,
        }
    }

    let mut ticker = tokio::time::interval(descriptor.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(
        collector = %descriptor.name,
        interval_secs = descriptor.interval.as_secs(),
        "collector scheduled"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                handle.run_once().await;
            }
            _ = shutdown.changed() => {
                debug!(collector = %descriptor.name, "collector stopped");
                return;
            }
        }
    }
}

/// Random initial offset within the collector's own interval, capped so
/// slow-cadence sources still come up reasonably soon after start.
fn stagger_offset(interval: Duration) -> Duration {
    const MAX_STAGGER: Duration = Duration::from_secs(30);
    let cap = interval.min(MAX_STAGGER);
    if cap.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::random_range(0..=cap.as_millis() as u64))
}
