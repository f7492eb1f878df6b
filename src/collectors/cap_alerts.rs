//! Government warning feed collector (CAP over Atom)
//!
//! The warning service publishes an Atom feed whose entries carry Common
//! Alerting Protocol fields in the `cap:` namespace. Entries are
//! normalized to a flat alert record; ordering and feed-level metadata are
//! dropped.

use crate::collector::{Collector, CollectorDescriptor, Payload};
use crate::error::{Error, Result};
use crate::http::FetchClient;
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_FEED_URL: &str = "https://warnings.hazardhub.io/v1/cap/atom";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    updated: Option<String>,
    #[serde(rename = "cap:event")]
    event: Option<String>,
    #[serde(rename = "cap:severity")]
    severity: Option<String>,
    #[serde(rename = "cap:urgency")]
    urgency: Option<String>,
    #[serde(rename = "cap:areaDesc")]
    area: Option<String>,
    #[serde(rename = "cap:expires")]
    expires: Option<String>,
}

/// Normalized warning record published to the cache
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

/// Collector for the CAP/Atom warning feed
pub struct CapAlertsCollector {
    descriptor: CollectorDescriptor,
    client: FetchClient,
    url: String,
}

impl CapAlertsCollector {
    /// Collector against the production warning feed
    pub fn new() -> Self {
        Self::with_url(DEFAULT_FEED_URL)
    }

    /// Collector against a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            descriptor: CollectorDescriptor::new(
                "cap_alerts",
                Duration::from_secs(120),
                Duration::from_secs(600),
                "alerts:cap",
            ),
            client: FetchClient::new(),
            url: url.into(),
        }
    }
}

impl Default for CapAlertsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for CapAlertsCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> Result<Payload> {
        let response = self.client.get(&self.url).await?;
        let body = response.text().await.map_err(Error::Http)?;
        let alerts = parse_feed(&body)?;

        let count = alerts.len();
        let value = json!({ "count": count, "alerts": alerts });
        Payload::from_value_with_records(&value, count)
    }
}

/// Parse an Atom feed body into normalized alerts
///
/// Entries without an id are dropped; everything else is optional and
/// passed through as-is.
pub fn parse_feed(xml: &str) -> Result<Vec<Alert>> {
    let feed: Feed = from_str(xml).map_err(|e| Error::xml(format!("cap atom feed: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id?;
            Some(Alert {
                id,
                title: entry.title.unwrap_or_default(),
                event: entry.event,
                severity: entry.severity,
                urgency: entry.urgency,
                area: entry.area,
                updated: entry.updated,
                expires: entry.expires,
            })
        })
        .collect())
}
