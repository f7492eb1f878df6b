//! Surface temperature grid collector
//!
//! The upstream publishes a packed binary grid (big-endian, `HZG1` magic):
//!
//! ```text
//! magic    4 bytes  "HZG1"
//! cols     u16      grid width
//! rows     u16      grid height
//! lat0     f32      latitude of the first cell
//! lon0     f32      longitude of the first cell
//! dlat     f32      latitude step per row
//! dlon     f32      longitude step per column
//! cells    i16 × cols·rows   temperature in tenths of °C, i16::MIN = missing
//! ```
//!
//! The decoded grid is published as a summary document; the full cell
//! array is too large to be useful to the map endpoints.

use crate::collector::{Collector, CollectorDescriptor, Payload};
use crate::error::{Error, Result};
use crate::http::FetchClient;
use async_trait::async_trait;
use bytes::Buf;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_GRID_URL: &str = "https://grid.hazardhub.io/v1/surface-temp/latest.hzg";

const MAGIC: &[u8; 4] = b"HZG1";
const HEADER_LEN: usize = 4 + 2 + 2 + 4 * 4;
const MISSING: i16 = i16::MIN;

/// Collector for the packed surface temperature grid
pub struct WeatherGridCollector {
    descriptor: CollectorDescriptor,
    client: FetchClient,
    url: String,
}

impl WeatherGridCollector {
    /// Collector against the production grid endpoint
    pub fn new() -> Self {
        Self::with_url(DEFAULT_GRID_URL)
    }

    /// Collector against a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            descriptor: CollectorDescriptor::new(
                "weather_grid",
                Duration::from_secs(600),
                Duration::from_secs(1800),
                "weather:grid:summary",
            ),
            client: FetchClient::new(),
            url: url.into(),
        }
    }
}

impl Default for WeatherGridCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for WeatherGridCollector {
    fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    async fn collect(&self) -> Result<Payload> {
        let response = self.client.get(&self.url).await?;
        let data = response.bytes().await.map_err(Error::Http)?;
        let summary = decode_grid(&data)?;
        let cells = summary.cells;
        Payload::from_value_with_records(&serde_json::to_value(&summary)?, cells)
    }
}

/// Decoded grid summary published to the cache
#[derive(Debug, Serialize, PartialEq)]
pub struct GridSummary {
    pub cols: u16,
    pub rows: u16,
    pub lat0: f32,
    pub lon0: f32,
    pub dlat: f32,
    pub dlon: f32,
    /// Cells carrying a value
    pub cells: usize,
    /// Cells flagged missing by the upstream
    pub missing: usize,
    pub min_c: f32,
    pub max_c: f32,
    pub mean_c: f32,
}

/// Decode a packed grid buffer into its summary
pub fn decode_grid(data: &[u8]) -> Result<GridSummary> {
    if data.len() < HEADER_LEN {
        return Err(Error::decode(format!(
            "grid header truncated: {} bytes",
            data.len()
        )));
    }

    let mut buf = data;
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(Error::decode("grid magic mismatch"));
    }

    let cols = buf.get_u16();
    let rows = buf.get_u16();
    let lat0 = buf.get_f32();
    let lon0 = buf.get_f32();
    let dlat = buf.get_f32();
    let dlon = buf.get_f32();

    let expected = cols as usize * rows as usize;
    if buf.remaining() != expected * 2 {
        return Err(Error::decode(format!(
            "grid body expected {expected} cells, found {} bytes",
            buf.remaining()
        )));
    }

    let mut cells = 0usize;
    let mut missing = 0usize;
    let mut min_c = f32::INFINITY;
    let mut max_c = f32::NEG_INFINITY;
    let mut sum = 0f64;

    for _ in 0..expected {
        let raw = buf.get_i16();
        if raw == MISSING {
            missing += 1;
            continue;
        }
        let value = f32::from(raw) / 10.0;
        min_c = min_c.min(value);
        max_c = max_c.max(value);
        sum += f64::from(value);
        cells += 1;
    }

    if cells == 0 {
        // An all-missing grid still decodes; the summary just has no range
        min_c = 0.0;
        max_c = 0.0;
    }
    let mean_c = if cells == 0 {
        0.0
    } else {
        (sum / cells as f64) as f32
    };

    Ok(GridSummary {
        cols,
        rows,
        lat0,
        lon0,
        dlat,
        dlon,
        cells,
        missing,
        min_c,
        max_c,
        mean_c,
    })
}
