//! Collector contract
//!
//! The abstract unit of work the scheduler drives. A [`Collector`] supplies
//! only its identity and a source-specific fetch-and-transform step; the
//! uniform lifecycle (timing, error containment, cache publishing, and the
//! in-flight guard) lives in [`CollectorHandle`] and is identical for the
//! declarative collector and every bespoke one.
//!
//! Failure isolation is the central property here: a failed run produces a
//! classified [`RunResult`] and a structured log event, leaves the previous
//! cache entry untouched, and never propagates past the handle.

use crate::cache::CacheStore;
use crate::error::{FailureKind, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

#[cfg(test)]
mod tests;

// ============================================================================
// Descriptor
// ============================================================================

/// Runtime identity of a collector
///
/// Every collector, declarative or bespoke, is addressable and schedulable
/// purely through this descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorDescriptor {
    /// Unique collector name
    pub name: String,
    /// Polling interval
    pub interval: Duration,
    /// TTL applied to each cache write
    pub cache_ttl: Duration,
    /// Destination cache key
    pub cache_key: String,
}

impl CollectorDescriptor {
    /// Create a descriptor
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        cache_ttl: Duration,
        cache_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            interval,
            cache_ttl,
            cache_key: cache_key.into(),
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The value one collection cycle produces
///
/// `body` is written to the cache verbatim; `records` feeds the run result
/// when the payload is a record sequence.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Serialized value destined for the cache
    pub body: String,
    /// Record count, when the payload is a sequence
    pub records: Option<usize>,
}

impl Payload {
    /// Payload from a raw body, no record count
    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            records: None,
        }
    }

    /// Payload from a JSON value; arrays carry their length as the count
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let records = value.as_array().map(Vec::len);
        Ok(Self {
            body: serde_json::to_string(value)?,
            records,
        })
    }

    /// Payload from a JSON value with an explicit record count
    pub fn from_value_with_records(value: &JsonValue, records: usize) -> Result<Self> {
        Ok(Self {
            body: serde_json::to_string(value)?,
            records: Some(records),
        })
    }
}

// ============================================================================
// Run result
// ============================================================================

/// Outcome of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fetch, transform, and cache write all succeeded
    Success {
        /// Bytes written to the cache
        bytes: usize,
        /// Records in the payload, when it was a sequence
        records: Option<usize>,
    },
    /// The run failed; the previous cache entry was left untouched
    Failed {
        /// Error classification
        kind: FailureKind,
        /// Human-readable cause
        message: String,
    },
    /// A prior run was still in flight; nothing was executed
    Skipped,
}

/// Outcome of one collector execution, for logging and observability only
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Collector name
    pub collector: String,
    /// What happened
    pub outcome: RunOutcome,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunResult {
    /// Whether the run published a fresh cache entry
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }

    /// Whether the run was skipped due to an in-flight predecessor
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, RunOutcome::Skipped)
    }
}

// ============================================================================
// Collector trait
// ============================================================================

/// Source-specific fetch-and-transform logic
///
/// Implementations hold their own fetch client and configuration; they do
/// not touch the cache and they do not schedule themselves. New source
/// kinds are added by implementing this trait, never by branching on a
/// concrete type.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Identity, schedule, and cache destination
    fn descriptor(&self) -> &CollectorDescriptor;

    /// Execute one fetch-and-transform cycle
    async fn collect(&self) -> Result<Payload>;
}

// ============================================================================
// Handle
// ============================================================================

/// Uniform lifecycle wrapper around a collector
///
/// This is what the scheduler holds: `descriptor()` plus `run_once()`, and
/// nothing else. One handle per collector instance; the in-flight mutex
/// guarantees successive runs of the same collector never overlap.
pub struct CollectorHandle {
    collector: Arc<dyn Collector>,
    cache: Arc<dyn CacheStore>,
    in_flight: Mutex<()>,
}

impl CollectorHandle {
    /// Wrap a collector with the shared cache store
    pub fn new(collector: Arc<dyn Collector>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            collector,
            cache,
            in_flight: Mutex::new(()),
        }
    }

    /// The wrapped collector's descriptor
    pub fn descriptor(&self) -> &CollectorDescriptor {
        self.collector.descriptor()
    }

    /// Execute one collection cycle
    ///
    /// Never returns an error: every failure mode is converted into a
    /// classified [`RunResult`] and a structured log event. A call made
    /// while a prior run is still in flight is rejected with
    /// [`RunOutcome::Skipped`].
    pub async fn run_once(&self) -> RunResult {
        let descriptor = self.collector.descriptor();
        let name = descriptor.name.clone();

        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(collector = %name, "previous run still in flight, skipping");
            return RunResult {
                collector: name,
                outcome: RunOutcome::Skipped,
                duration: Duration::ZERO,
            };
        };

        let started = Instant::now();
        let outcome = match self.collector.collect().await {
            Ok(payload) => {
                let bytes = payload.body.len();
                match self
                    .cache
                    .set(&descriptor.cache_key, &payload.body, descriptor.cache_ttl)
                    .await
                {
                    Ok(()) => RunOutcome::Success {
                        bytes,
                        records: payload.records,
                    },
                    Err(e) => RunOutcome::Failed {
                        kind: FailureKind::CacheStore,
                        message: e.to_string(),
                    },
                }
            }
            Err(e) => RunOutcome::Failed {
                kind: e.classification(),
                message: e.to_string(),
            },
        };
        let duration = started.elapsed();

        match &outcome {
            RunOutcome::Success { bytes, records } => {
                info!(
                    collector = %name,
                    outcome = "success",
                    duration_ms = duration.as_millis() as u64,
                    bytes,
                    records = records.unwrap_or(0),
                    "collector run finished"
                );
            }
            RunOutcome::Failed { kind, message } => {
                warn!(
                    collector = %name,
                    outcome = "failed",
                    duration_ms = duration.as_millis() as u64,
                    error_kind = %kind,
                    error = %message,
                    "collector run finished"
                );
            }
            RunOutcome::Skipped => {}
        }

        RunResult {
            collector: name,
            outcome,
            duration,
        }
    }
}

impl std::fmt::Debug for CollectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorHandle")
            .field("descriptor", self.collector.descriptor())
            .finish_non_exhaustive()
    }
}
