//! Lightning strike feed collector
//!
//! The upstream exposes strikes as a newline-delimited JSON stream. One
//! collection cycle consumes the stream incrementally (chunks land in a
//! buffer and complete lines are parsed as they arrive) until the feed
//! ends or the per-run cap is reached. Lines that fail to parse are
//! dropped individually; the run only fails when the feed produced nothing
//! parseable at all.

use crate::collector::{Collector, CollectorDescriptor, Payload};
use crate::error::{Error, Result};
use crate::http::FetchClient;
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_FEED_URL: &str = "https://stream.hazardhub.io/v1/strikes/live";

/// Upper bound on strikes accumulated in a single run
const MAX_STRIKES_PER_RUN: usize = 5000;

/// One strike record from the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Strike {
    /// Event timestamp (RFC 3339)
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    /// Peak current in kiloamperes, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp_ka: Option<f64>,
}

/// Collector for the streaming strike feed
pub struct LightningCollector {
    descriptor: CollectorDescriptor,
    client: FetchClient,
    url: String,
    max_strikes: usize,
}

impl LightningCollector {
    /// Collector against the production feed
    pub fn new() -> Self {
        Self::with_url(DEFAULT_FEED_URL)
    }

    /// Collector against a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            descriptor: CollectorDescriptor::new(
                "lightning",
                Duration::from_secs(60),
                Duration::from_secs(300),
                "lightning:recent",
            ),
            client: FetchClient::new(),
            url: url.into(),
            max_strikes: MAX_STRIKES_PER_RUN,
        }
    }
}

impl Default for LightningCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for LightningCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> Result<Payload> {
        let response = self.client.get(&self.url).await?;
        let mut stream = response.bytes_stream();

        let mut buf = BytesMut::new();
        let mut strikes: Vec<Strike> = Vec::new();
        let mut malformed = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                // A feed that dies mid-stream still yields what arrived
                // before the cut; only a strike-free failure aborts the run.
                Err(e) if !strikes.is_empty() => {
                    debug!(error = %e, kept = strikes.len(), "strike stream ended early");
                    break;
                }
                Err(e) => return Err(Error::Http(e)),
            };
            buf.extend_from_slice(&chunk);
            drain_lines(&mut buf, self.max_strikes, &mut strikes, &mut malformed);
            if strikes.len() >= self.max_strikes {
                debug!(cap = self.max_strikes, "strike cap reached, ending run early");
                break;
            }
        }

        // The stream may end without a trailing newline
        if !buf.is_empty() && strikes.len() < self.max_strikes {
            parse_line(&buf, &mut strikes, &mut malformed);
        }

        if strikes.is_empty() && malformed > 0 {
            return Err(Error::decode(format!(
                "strike feed produced {malformed} unparseable lines and no records"
            )));
        }

        if malformed > 0 {
            debug!(malformed, kept = strikes.len(), "dropped unparseable strike lines");
        }

        let count = strikes.len();
        let value = json!({ "count": count, "strikes": strikes });
        Payload::from_value_with_records(&value, count)
    }
}

/// Parse every complete line currently in the buffer
fn drain_lines(
    buf: &mut BytesMut,
    cap: usize,
    strikes: &mut Vec<Strike>,
    malformed: &mut usize,
) {
    while strikes.len() < cap {
        let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
            return;
        };
        let line = buf.split_to(pos + 1);
        parse_line(&line[..pos], strikes, malformed);
    }
}

fn parse_line(line: &[u8], strikes: &mut Vec<Strike>, malformed: &mut usize) {
    let trimmed = line.strip_suffix(b"\r").unwrap_or(line);
    if trimmed.is_empty() {
        return;
    }
    match serde_json::from_slice::<Strike>(trimmed) {
        Ok(strike) => strikes.push(strike),
        Err(_) => *malformed += 1,
    }
}
