//! # Hazard Pipeline
//!
//! Background collection and caching pipeline for live environmental and
//! hazard data: weather grids, lightning strikes, storm tracks, government
//! warnings, and any JSON upstream that can be described declaratively.
//!
//! Request-serving endpoints never call upstream providers; they read the
//! shared cache this pipeline keeps warm.
//!
//! ## Features
//!
//! - **Declarative onboarding**: a new upstream is one YAML document (URL,
//!   schedule, auth, path extraction, filter, field allow-list), no code
//! - **Bounded retry fetch**: per-attempt timeout, capped backoff, retry
//!   only on transient failures, rate-limited outbound calls
//! - **Failure isolation**: a collector's failed run is classified, logged,
//!   and contained; the previous cache entry stays readable
//! - **Independent schedules**: one timer per collector with overlap
//!   prevention and staggered start
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hazard_pipeline::cache::MemoryCache;
//! use hazard_pipeline::scheduler::Scheduler;
//! use hazard_pipeline::source::{load_sources_dir, SourceCollector};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut scheduler = Scheduler::new(Arc::new(MemoryCache::new()));
//!     for config in load_sources_dir("sources") {
//!         scheduler.register(Arc::new(SourceCollector::from_config(config).unwrap()));
//!     }
//!     scheduler.start();
//!     tokio::signal::ctrl_c().await.unwrap();
//!     scheduler.shutdown().await;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Scheduler                             │
//! │   one interval per collector · skip-on-overlap · stagger        │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ run_once()
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │                       Collector Contract                        │
//! │   timing · error classification · cache publish · isolation     │
//! ├──────────────┬──────────────────────────────┬───────────────────┤
//! │ Declarative  │      Source-specific         │   Bounded Fetch   │
//! │ YAML source  │  grid / stream / track / cap │  retry · backoff  │
//! └──────────────┴──────────────┬───────────────┴───────────────────┘
//!                               │ set(key, value, ttl)
//!                     ┌─────────┴─────────┐
//!                     │    Cache Store    │  ← read by endpoints
//!                     └───────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: finish field-level docs before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication for upstream sources
pub mod auth;

/// Bounded retry fetch with rate limiting
pub mod http;

/// Shared cache store (memory and redis backends)
pub mod cache;

/// Collector contract: descriptor, run result, lifecycle wrapper
pub mod collector;

/// Declarative sources: config documents, loader, transform engine
pub mod source;

/// Bespoke source-specific collectors
pub mod collectors;

/// Per-collector interval scheduling
pub mod scheduler;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FailureKind, Result};
pub use types::*;

// Re-export commonly used types
pub use cache::CacheStore;
pub use collector::{Collector, CollectorDescriptor, CollectorHandle, RunOutcome, RunResult};
pub use scheduler::Scheduler;
pub use source::{load_sources_dir, SourceCollector, SourceConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
