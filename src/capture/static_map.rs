//! Google Static Maps satellite tiles

use std::time::Duration;

use super::ImageSource;
use crate::domain::GeoPoint;
use crate::error::FetchError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Image source backed by the Static Maps API
pub struct StaticMapClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for StaticMapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticMapClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StaticMapClient {
    /// Create a client for the `staticmap` endpoint at `base_url`
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(base_url, api_key, client))
    }

    /// Create a client sharing an existing HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::blocking::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn query_params(&self, center: GeoPoint, zoom: u8, size_px: u32) -> [(&'static str, String); 5] {
        [
            ("center", format!("{},{}", center.lat, center.lng)),
            ("zoom", zoom.to_string()),
            ("size", format!("{size_px}x{size_px}")),
            ("maptype", "satellite".to_string()),
            ("key", self.api_key.clone()),
        ]
    }
}

impl ImageSource for StaticMapClient {
    fn fetch(&self, center: GeoPoint, zoom: u8, size_px: u32) -> Result<Vec<u8>, FetchError> {
        log::debug!(
            "Fetching {size_px}px satellite tile at ({:.6}, {:.6}) zoom {zoom}",
            center.lat,
            center.lng
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(center, zoom, size_px))
            .send()?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(bytes.to_vec())
    }
}
