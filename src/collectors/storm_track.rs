//! Tropical storm track collector
//!
//! The advisory document carries one entry per active storm with a
//! sequence of timed track points. Publishing the raw points is not enough
//! for the map endpoints: the forecast cone has to be derived by combining
//! each point's position with its lead time relative to the first fix, so
//! this cannot be expressed as a path-and-field-map transform.

use crate::collector::{Collector, CollectorDescriptor, Payload};
use crate::error::{Error, Result};
use crate::http::FetchClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_ADVISORY_URL: &str = "https://api.hazardhub.io/v1/storms/active";

/// Cone radius at the analysis point
const CONE_BASE_NM: f64 = 15.0;
/// Cone growth per hour of forecast lead time
const CONE_GROWTH_NM_PER_HOUR: f64 = 1.75;

/// One timed fix along a storm track
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPoint {
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub max_wind_kt: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Advisory {
    #[serde(default)]
    storms: Vec<StormEntry>,
}

#[derive(Debug, Deserialize)]
struct StormEntry {
    id: String,
    name: String,
    #[serde(default)]
    classification: Option<String>,
    #[serde(default)]
    track: Vec<TrackPoint>,
}

/// Derived cone point published to the cache
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConePoint {
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_nm: f64,
}

/// Collector for active storm advisories
pub struct StormTrackCollector {
    descriptor: CollectorDescriptor,
    client: FetchClient,
    url: String,
}

impl StormTrackCollector {
    /// Collector against the production advisory endpoint
    pub fn new() -> Self {
        Self::with_url(DEFAULT_ADVISORY_URL)
    }

    /// Collector against a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            descriptor: CollectorDescriptor::new(
                "storm_track",
                Duration::from_secs(600),
                Duration::from_secs(3600),
                "storms:tracks",
            ),
            client: FetchClient::new(),
            url: url.into(),
        }
    }
}

impl Default for StormTrackCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for StormTrackCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> Result<Payload> {
        let response = self.client.get(&self.url).await?;
        let body = response.text().await.map_err(Error::Http)?;
        let advisory: Advisory = serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("advisory body: {e}")))?;

        let mut storms = Vec::with_capacity(advisory.storms.len());
        for storm in &advisory.storms {
            let cone = forecast_cone(&storm.track)?;
            let max_wind_kt = storm
                .track
                .iter()
                .filter_map(|p| p.max_wind_kt)
                .max();
            storms.push(json!({
                "id": storm.id,
                "name": storm.name,
                "classification": storm.classification,
                "max_wind_kt": max_wind_kt,
                "cone": cone,
            }));
        }

        let count = storms.len();
        let value = json!({ "count": count, "storms": storms });
        Payload::from_value_with_records(&value, count)
    }
}

/// Derive the forecast cone from a timed track
///
/// Radius widens linearly with each point's lead time relative to the
/// first fix. An empty track yields an empty cone, not an error: a storm
/// can appear in an advisory before its first forecast is issued.
pub fn forecast_cone(track: &[TrackPoint]) -> Result<Vec<ConePoint>> {
    let Some(first) = track.first() else {
        return Ok(Vec::new());
    };
    let origin = parse_time(&first.time)?;

    let mut cone = Vec::with_capacity(track.len());
    for point in track {
        let at = parse_time(&point.time)?;
        let lead_hours = (at - origin).num_minutes().max(0) as f64 / 60.0;
        cone.push(ConePoint {
            time: point.time.clone(),
            lat: point.lat,
            lon: point.lon,
            radius_nm: CONE_BASE_NM + CONE_GROWTH_NM_PER_HOUR * lead_hours,
        });
    }
    Ok(cone)
}

fn parse_time(time: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(time)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::decode(format!("track point time '{time}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: &str, lat: f64, wind: Option<u32>) -> TrackPoint {
        TrackPoint {
            time: time.to_string(),
            lat,
            lon: -60.0,
            max_wind_kt: wind,
        }
    }

    #[test]
    fn test_cone_radius_grows_with_lead_time() {
        let track = vec![
            point("2026-08-06T00:00:00Z", 14.0, Some(65)),
            point("2026-08-06T12:00:00Z", 15.2, Some(75)),
            point("2026-08-07T00:00:00Z", 16.5, Some(85)),
        ];
        let cone = forecast_cone(&track).unwrap();

        assert_eq!(cone.len(), 3);
        assert!((cone[0].radius_nm - 15.0).abs() < 1e-9);
        assert!((cone[1].radius_nm - (15.0 + 1.75 * 12.0)).abs() < 1e-9);
        assert!((cone[2].radius_nm - (15.0 + 1.75 * 24.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_track_yields_empty_cone() {
        assert!(forecast_cone(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_time_is_a_decode_error() {
        let track = vec![point("yesterday-ish", 14.0, None)];
        let err = forecast_cone(&track).unwrap_err();
        assert_eq!(
            err.classification(),
            crate::error::FailureKind::PermanentUpstream
        );
    }

    #[test]
    fn test_out_of_order_point_clamps_to_zero_lead() {
        let track = vec![
            point("2026-08-06T12:00:00Z", 14.0, None),
            point("2026-08-06T06:00:00Z", 13.5, None),
        ];
        let cone = forecast_cone(&track).unwrap();
        assert!((cone[1].radius_nm - CONE_BASE_NM).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_collect_via_http() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "storms": [{
                    "id": "AL052026",
                    "name": "ERNESTO",
                    "classification": "hurricane",
                    "track": [
                        {"time": "2026-08-06T00:00:00Z", "lat": 14.0, "lon": -55.0, "max_wind_kt": 70},
                        {"time": "2026-08-06T12:00:00Z", "lat": 15.1, "lon": -57.2, "max_wind_kt": 80}
                    ]
                }]
            })))
            .mount(&mock_server)
            .await;

        let collector = StormTrackCollector::with_url(format!("{}/storms", mock_server.uri()));
        let payload = collector.collect().await.unwrap();

        assert_eq!(payload.records, Some(1));
        let value: serde_json::Value = serde_json::from_str(&payload.body).unwrap();
        assert_eq!(value["storms"][0]["max_wind_kt"], 80);
        assert_eq!(value["storms"][0]["cone"][0]["radius_nm"], 15.0);
        assert_eq!(value["storms"][0]["cone"][1]["radius_nm"], 36.0);
    }

    #[tokio::test]
    async fn test_collect_no_active_storms() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let collector = StormTrackCollector::with_url(format!("{}/storms", mock_server.uri()));
        let payload = collector.collect().await.unwrap();
        assert_eq!(payload.records, Some(0));
    }
}
