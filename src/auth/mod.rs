//! Authentication for declarative and bespoke sources
//!
//! A source document names a scheme and the environment variables holding
//! its credentials. That declaration is resolved once, at collector
//! construction, into a ready-to-apply [`AuthConfig`]; credential values
//! never appear in configuration files or log output.

mod types;

pub use types::{AuthConfig, AuthSpec};
