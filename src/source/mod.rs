//! Declarative sources
//!
//! A brand-new upstream can be onboarded with a single YAML document and no
//! new code: the document declares what to fetch, on what schedule, how to
//! authenticate, which part of the response matters, and where in the cache
//! the result lands. [`SourceCollector`] realizes the collector contract
//! purely from that document.

mod collector;
mod loader;
mod transform;
mod types;

pub use collector::SourceCollector;
pub use loader::{load_source_file, load_source_str, load_sources_dir};
pub use transform::apply_transform;
pub use types::{CacheSpec, FetchSpec, ScheduleSpec, SourceConfig, TransformSpec};

#[cfg(test)]
mod tests;
