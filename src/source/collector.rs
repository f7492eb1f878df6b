//! Declarative source collector
//!
//! Realizes the collector contract purely from a [`SourceConfig`]. All the
//! behavior (URL, method, headers, auth, retry policy, transform) comes
//! from the document; there is no source-specific code here.

use super::transform::apply_transform;
use super::types::{SourceConfig, TransformSpec};
use crate::auth::AuthConfig;
use crate::collector::{Collector, CollectorDescriptor, Payload};
use crate::error::{Error, Result};
use crate::http::{FetchClient, FetchConfig, FetchRequest};
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use std::time::Duration;

/// A collector built entirely from a source document
pub struct SourceCollector {
    descriptor: CollectorDescriptor,
    client: FetchClient,
    method: Method,
    url: String,
    transform: Option<TransformSpec>,
}

impl SourceCollector {
    /// Build a collector from a loaded source definition
    ///
    /// Credentials named in the auth block are resolved here, once; a
    /// missing credential variable fails construction and excludes the
    /// source from the schedulable set.
    pub fn from_config(config: SourceConfig) -> Result<Self> {
        let method: Method = config.fetch.method.parse()?;

        let auth = match &config.auth {
            Some(spec) => spec.resolve()?,
            None => AuthConfig::None,
        };

        let mut builder = FetchConfig::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_secs))
            .max_retries(config.fetch.max_retries);
        for (key, value) in &config.fetch.headers {
            builder = builder.header(key, value);
        }
        let client = FetchClient::with_auth(builder.build(), auth);

        let descriptor = CollectorDescriptor::new(
            config.name,
            Duration::from_secs(config.schedule.interval_secs),
            Duration::from_secs(config.schedule.cache_ttl_secs),
            config.cache.key,
        );

        Ok(Self {
            descriptor,
            client,
            method,
            url: config.fetch.url,
            transform: config.transform,
        })
    }
}

#[async_trait]
impl Collector for SourceCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> Result<Payload> {
        let response = self
            .client
            .request(self.method, &self.url, FetchRequest::new())
            .await?;
        let body = response.text().await.map_err(Error::Http)?;

        match &self.transform {
            // No transform configured: the raw body goes to the cache verbatim
            None => Ok(Payload::raw(body)),
            Some(transform) => {
                let parsed: JsonValue = serde_json::from_str(&body)
                    .map_err(|e| Error::decode(format!("response body is not JSON: {e}")))?;
                let value = apply_transform(transform, &parsed)?;
                Payload::from_value(&value)
            }
        }
    }
}

impl std::fmt::Debug for SourceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCollector")
            .field("descriptor", &self.descriptor)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
