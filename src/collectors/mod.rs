//! Source-specific collectors
//!
//! The family of bespoke collectors for upstreams whose payloads cannot be
//! expressed as a JSON path plus a field map: binary grid decoding, a
//! streaming strike feed, cross-field derivation over storm tracks, and a
//! CAP/Atom XML warning feed. Each one implements the same
//! [`Collector`](crate::collector::Collector) contract as the declarative
//! collector; only the fetch-and-transform internals differ.

mod cap_alerts;
mod lightning;
mod storm_track;
mod weather_grid;

pub use cap_alerts::CapAlertsCollector;
pub use lightning::LightningCollector;
pub use storm_track::StormTrackCollector;
pub use weather_grid::WeatherGridCollector;

use crate::collector::Collector;
use std::sync::Arc;

/// The built-in bespoke collector set with production upstreams
pub fn builtin() -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(WeatherGridCollector::new()),
        Arc::new(LightningCollector::new()),
        Arc::new(StormTrackCollector::new()),
        Arc::new(CapAlertsCollector::new()),
    ]
}
