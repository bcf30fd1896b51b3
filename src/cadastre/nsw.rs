//! NSW Cadastre MapServer client
//!
//! Uses the ArcGIS REST `identify` operation against the lot layer to find the
//! parcel containing a point.

use std::time::Duration;

use serde::Deserialize;

use super::BoundaryProvider;
use crate::domain::{Boundary, GeoPoint, Ring};
use crate::error::LookupError;

/// Layer 9 of the NSW cadastre service holds individual lots
const LOT_LAYER: &str = "visible:9";

/// Half-width of the map extent sent with the query, in degrees (~500 m)
const EXTENT_OFFSET_DEG: f64 = 0.005;

/// Identify tolerance in screen pixels
const TOLERANCE_PX: u32 = 1;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identify response body
#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    #[serde(default)]
    results: Vec<IdentifyResult>,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyResult {
    geometry_type: Option<String>,
    geometry: Option<Geometry>,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// Rings of `[lng, lat]` pairs (extra ordinates such as z are ignored)
    #[serde(default)]
    rings: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    code: Option<i64>,
    message: Option<String>,
}

/// Boundary provider backed by the NSW Spatial Services cadastre
#[derive(Debug)]
pub struct NswCadastre {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl NswCadastre {
    /// Create a client for the MapServer at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a provider sharing an existing HTTP client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn query_params(point: GeoPoint) -> Vec<(&'static str, String)> {
        let bbox = format!(
            "{},{},{},{}",
            point.lng - EXTENT_OFFSET_DEG,
            point.lat - EXTENT_OFFSET_DEG,
            point.lng + EXTENT_OFFSET_DEG,
            point.lat + EXTENT_OFFSET_DEG
        );
        vec![
            ("geometry", format!("{},{}", point.lng, point.lat)),
            ("geometryType", "esriGeometryPoint".to_string()),
            ("sr", "4326".to_string()),
            ("layers", LOT_LAYER.to_string()),
            ("tolerance", TOLERANCE_PX.to_string()),
            ("mapExtent", bbox),
            ("imageDisplay", "400,400,96".to_string()),
            ("returnGeometry", "true".to_string()),
            ("f", "json".to_string()),
        ]
    }
}

impl BoundaryProvider for NswCadastre {
    fn lookup(&self, point: GeoPoint) -> Result<Boundary, LookupError> {
        let url = format!("{}/identify", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(point))
            .send()?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: IdentifyResponse = response.json()?;
        boundary_from_response(body)
    }
}

/// Take the first identified feature's polygon rings
fn boundary_from_response(body: IdentifyResponse) -> Result<Boundary, LookupError> {
    if let Some(err) = body.error {
        return Err(LookupError::Service(format!(
            "{} (code {})",
            err.message.unwrap_or_else(|| "unknown error".to_string()),
            err.code.unwrap_or_default()
        )));
    }

    let Some(first) = body.results.into_iter().next() else {
        return Ok(Boundary::not_found());
    };

    if let Some(lot) = first.attributes.get("lotidstring").and_then(|v| v.as_str()) {
        log::debug!("Cadastre returned lot {lot}");
    }

    let is_polygon = first
        .geometry_type
        .as_deref()
        .is_none_or(|kind| kind == "esriGeometryPolygon");
    let Some(geometry) = first.geometry.filter(|_| is_polygon) else {
        log::debug!("Identify result has no polygon geometry");
        return Ok(Boundary::not_found());
    };

    let rings = geometry
        .rings
        .into_iter()
        .map(|ring| {
            Ring::new(
                ring.into_iter()
                    .filter(|pair| pair.len() >= 2)
                    .map(|pair| GeoPoint::new(pair[1], pair[0]))
                    .collect(),
            )
        })
        .filter(|ring| !ring.is_empty())
        .collect();

    Ok(Boundary::new(rings))
}
