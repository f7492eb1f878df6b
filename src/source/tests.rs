//! Tests for declarative sources: parsing, loading, and the transform engine

use super::types::validate_source;
use super::*;
use crate::collector::Collector;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATIONS_YAML: &str = r#"
name: metar_stations
fetch:
  url: https://api.example.com/stations
  headers:
    Accept: application/json
schedule:
  interval_secs: 300
  cache_ttl_secs: 900
cache:
  key: weather:stations
transform:
  data_path: list.stations
  filter:
    status: active
  fields:
    station_id: id
    temp_c: temperature
"#;

fn transform(
    data_path: Option<&str>,
    filter: Option<Vec<(&str, serde_json::Value)>>,
    fields: Option<Vec<(&str, &str)>>,
) -> TransformSpec {
    TransformSpec {
        data_path: data_path.map(String::from),
        filter: filter.map(|f| {
            f.into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>()
        }),
        fields: fields.map(|f| {
            f.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        }),
    }
}

// ============================================================================
// Parsing and validation
// ============================================================================

#[test]
fn test_parse_full_document() {
    let config = load_source_str(STATIONS_YAML).unwrap();
    assert_eq!(config.name, "metar_stations");
    assert!(config.enabled);
    assert_eq!(config.fetch.method, "GET");
    assert_eq!(config.fetch.timeout_secs, 30);
    assert_eq!(config.fetch.max_retries, 3);
    assert_eq!(config.schedule.interval_secs, 300);
    assert_eq!(config.cache.key, "weather:stations");

    let transform = config.transform.unwrap();
    assert_eq!(transform.data_path.as_deref(), Some("list.stations"));
    assert_eq!(
        transform.filter.unwrap().get("status"),
        Some(&json!("active"))
    );
}

#[test]
fn test_parse_minimal_document() {
    let yaml = r"
name: kp_index
fetch:
  url: https://services.swpc.noaa.gov/json/planetary_k_index_1m.json
schedule:
  interval_secs: 600
  cache_ttl_secs: 1800
cache:
  key: space:kp_index
";
    let config = load_source_str(yaml).unwrap();
    assert_eq!(config.name, "kp_index");
    assert!(config.transform.is_none());
    assert!(config.auth.is_none());
}

#[test]
fn test_validation_rejects_bad_documents() {
    let mut config = load_source_str(STATIONS_YAML).unwrap();
    config.schedule.interval_secs = 0;
    assert!(validate_source(&config).is_err());

    let mut config = load_source_str(STATIONS_YAML).unwrap();
    config.cache.key = String::new();
    assert!(validate_source(&config).is_err());

    let mut config = load_source_str(STATIONS_YAML).unwrap();
    config.fetch.method = "FETCH".to_string();
    assert!(validate_source(&config).is_err());
}

#[test]
fn test_malformed_yaml_is_an_error() {
    assert!(load_source_str("name: [unclosed").is_err());
    assert!(load_source_str("name: x\n# missing everything else").is_err());
}

// ============================================================================
// Directory loading
// ============================================================================

#[test]
fn test_load_dir_skips_malformed_documents() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stations.yaml"), STATIONS_YAML).unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "nope: [").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a source").unwrap();

    let configs = load_sources_dir(dir.path());
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].name, "metar_stations");
}

#[test]
fn test_load_dir_skips_duplicate_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.yaml"), STATIONS_YAML).unwrap();
    std::fs::write(dir.path().join("b.yaml"), STATIONS_YAML).unwrap();

    let configs = load_sources_dir(dir.path());
    assert_eq!(configs.len(), 1);
}

#[test]
fn test_load_missing_dir_is_empty_not_fatal() {
    let configs = load_sources_dir("/definitely/not/a/real/dir");
    assert!(configs.is_empty());
}

// ============================================================================
// Transform engine
// ============================================================================

#[test]
fn test_station_filter_and_rename_scenario() {
    let body = json!({
        "list": {
            "stations": [
                {"station_id": "A1", "temp_c": 21.5, "status": "active"},
                {"station_id": "B2", "temp_c": 19.0, "status": "inactive"}
            ]
        }
    });
    let spec = transform(
        Some("list.stations"),
        Some(vec![("status", json!("active"))]),
        Some(vec![("station_id", "id"), ("temp_c", "temperature")]),
    );

    let result = apply_transform(&spec, &body).unwrap();
    assert_eq!(result, json!([{"id": "A1", "temperature": 21.5}]));
}

#[test]
fn test_absent_path_yields_empty_result() {
    let body = json!({"list": {"regions": []}});
    let spec = transform(Some("list.stations"), None, None);
    assert_eq!(apply_transform(&spec, &body).unwrap(), json!([]));

    // Deep absence behaves the same
    let spec = transform(Some("a.b.c.d"), None, None);
    assert_eq!(apply_transform(&spec, &body).unwrap(), json!([]));
}

#[test]
fn test_bracket_path_navigation() {
    let body = json!({"result": [{"rows": [1, 2, 3]}, {"rows": []}]});
    let spec = transform(Some("result[0].rows"), None, None);
    assert_eq!(apply_transform(&spec, &body).unwrap(), json!([1, 2, 3]));

    let spec = transform(Some("result[5].rows"), None, None);
    assert_eq!(apply_transform(&spec, &body).unwrap(), json!([]));
}

#[test]
fn test_filter_on_scalar_target_is_type_mismatch() {
    let body = json!({"count": 7});
    let spec = transform(Some("count"), Some(vec![("status", json!("ok"))]), None);
    let err = apply_transform(&spec, &body).unwrap_err();
    assert!(matches!(err, crate::error::Error::PathType { .. }));
    assert_eq!(
        err.classification(),
        crate::error::FailureKind::Transform
    );
}

#[test]
fn test_filter_on_object_target_is_type_mismatch() {
    let body = json!({"station": {"id": "A1"}});
    let spec = transform(Some("station"), Some(vec![("id", json!("A1"))]), None);
    assert!(apply_transform(&spec, &body).is_err());
}

#[test]
fn test_filter_field_absent_excludes_record() {
    // A record without the constrained field does not match
    let body = json!([
        {"severity": "Severe", "id": 1},
        {"id": 2}
    ]);
    let spec = transform(None, Some(vec![("severity", json!("Severe"))]), None);
    let result = apply_transform(&spec, &body).unwrap();
    assert_eq!(result, json!([{"severity": "Severe", "id": 1}]));
}

#[test]
fn test_filter_with_dotted_field() {
    let body = json!([
        {"properties": {"status": "Actual"}, "id": "x"},
        {"properties": {"status": "Test"}, "id": "y"}
    ]);
    let spec = transform(None, Some(vec![("properties.status", json!("Actual"))]), None);
    let result = apply_transform(&spec, &body).unwrap();
    assert_eq!(result.as_array().unwrap().len(), 1);
}

#[test]
fn test_fields_are_a_strict_allow_list() {
    // Unlisted upstream fields never reach the cache
    let body = json!([{"id": "A1", "temp": 20.0, "debug_blob": {"huge": true}}]);
    let spec = transform(None, None, Some(vec![("id", "station"), ("temp", "temp")]));
    let result = apply_transform(&spec, &body).unwrap();
    assert_eq!(result, json!([{"station": "A1", "temp": 20.0}]));
}

#[test]
fn test_rename_on_single_object_target() {
    let body = json!({"data": {"kp": 4, "noise": "x"}});
    let spec = transform(Some("data"), None, Some(vec![("kp", "kp_index")]));
    let result = apply_transform(&spec, &body).unwrap();
    assert_eq!(result, json!({"kp_index": 4}));
}

#[test]
fn test_no_transform_steps_passes_target_through() {
    let body = json!({"a": {"b": [1, 2]}});
    let spec = transform(Some("a"), None, None);
    assert_eq!(apply_transform(&spec, &body).unwrap(), json!({"b": [1, 2]}));
}

// ============================================================================
// End-to-end declarative collector
// ============================================================================

#[tokio::test]
async fn test_source_collector_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stations"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": {
                "stations": [
                    {"station_id": "A1", "temp_c": 21.5, "status": "active"},
                    {"station_id": "B2", "temp_c": 19.0, "status": "inactive"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let yaml = STATIONS_YAML.replace(
        "https://api.example.com/stations",
        &format!("{}/stations", mock_server.uri()),
    );
    let config = load_source_str(&yaml).unwrap();
    let collector = SourceCollector::from_config(config).unwrap();

    assert_eq!(collector.descriptor().cache_key, "weather:stations");

    let payload = collector.collect().await.unwrap();
    assert_eq!(payload.records, Some(1));
    let value: serde_json::Value = serde_json::from_str(&payload.body).unwrap();
    assert_eq!(value, json!([{"id": "A1", "temperature": 21.5}]));
}

#[tokio::test]
async fn test_source_collector_raw_body_without_transform() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text payload"))
        .mount(&mock_server)
        .await;

    let yaml = format!(
        r"
name: raw_feed
fetch:
  url: {}/raw
schedule:
  interval_secs: 60
  cache_ttl_secs: 120
cache:
  key: raw:feed
",
        mock_server.uri()
    );
    let config = load_source_str(&yaml).unwrap();
    let collector = SourceCollector::from_config(config).unwrap();

    let payload = collector.collect().await.unwrap();
    assert_eq!(payload.body, "plain text payload");
    assert_eq!(payload.records, None);
}

#[test]
fn test_missing_credential_fails_construction() {
    let yaml = r"
name: secure_feed
fetch:
  url: https://api.example.com/secure
schedule:
  interval_secs: 60
  cache_ttl_secs: 120
cache:
  key: secure:feed
auth:
  scheme: bearer
  token_env: TEST_SOURCE_UNSET_TOKEN
";
    let config = load_source_str(yaml).unwrap();
    let err = SourceCollector::from_config(config).unwrap_err();
    assert!(err.to_string().contains("TEST_SOURCE_UNSET_TOKEN"));
}
