//! Google Places nearby-search backend.
//!
//! Implements the two-phase lookup strategy: a distance-ranked
//! nearest-match query first, falling back to a radius-bounded query
//! when the first yields no results. At most one best-matching place is
//! returned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use remind_core::defaults;
use remind_core::{Error, Place, PlacesBackend, Result};

/// Default Google Places API base URL.
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Configuration for the Google Places backend.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl PlacesConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(defaults::PLACES_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment. Returns `None` when
    /// `PLACES_API_KEY` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("PLACES_API_KEY").ok()?;
        if api_key.is_empty() {
            return None;
        }

        let base_url = std::env::var("PLACES_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PLACES_BASE_URL.to_string());
        let timeout_secs = std::env::var("PLACES_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::PLACES_TIMEOUT_SECS);

        Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Google Places implementation of [`PlacesBackend`].
pub struct GooglePlacesBackend {
    client: Client,
    config: PlacesConfig,
}

impl GooglePlacesBackend {
    /// Create a new backend from explicit configuration.
    pub fn new(config: PlacesConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("PLACES_API_KEY is empty".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables. Returns `None` when no API
    /// key is configured.
    pub fn from_env() -> Option<Self> {
        PlacesConfig::from_env().and_then(|config| Self::new(config).ok())
    }

    async fn nearby_search(&self, params: &[(&str, String)]) -> Result<Vec<WirePlace>> {
        let url = format!("{}/maps/api/place/nearbysearch/json", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::Places(format!("nearby search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Places(format!(
                "nearby search returned {}",
                response.status()
            )));
        }

        let body: NearbySearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Places(format!("nearby search decode failed: {}", e)))?;

        match body.status.as_str() {
            "OK" => Ok(body.results),
            "ZERO_RESULTS" => Ok(vec![]),
            other => Err(Error::Places(format!(
                "nearby search status {}: {}",
                other,
                body.error_message.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<WirePlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct WirePlace {
    place_id: String,
    name: String,
    #[serde(default)]
    rating: Option<f32>,
    geometry: WireGeometry,
}

#[derive(Deserialize)]
struct WireGeometry {
    location: WireLatLng,
}

#[derive(Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

impl From<WirePlace> for Place {
    fn from(wire: WirePlace) -> Self {
        Place {
            id: wire.place_id,
            name: wire.name,
            rating: wire.rating,
            lat: wire.geometry.location.lat,
            lng: wire.geometry.location.lng,
        }
    }
}

#[async_trait]
impl PlacesBackend for GooglePlacesBackend {
    async fn find_nearest_by_keyword(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
        keyword: &str,
    ) -> Result<Option<Place>> {
        let location = format!("{},{}", lat, lng);

        // Phase 1: nearest match ranked by distance.
        let ranked = self
            .nearby_search(&[
                ("location", location.clone()),
                ("rankby", "distance".to_string()),
                ("keyword", keyword.to_string()),
            ])
            .await?;

        if let Some(hit) = ranked.into_iter().next() {
            debug!(
                subsystem = "places",
                component = "google",
                phase = "ranked",
                place = %hit.name,
                "Resolved place"
            );
            return Ok(Some(hit.into()));
        }

        // Phase 2: radius-bounded search.
        let bounded = self
            .nearby_search(&[
                ("location", location),
                ("radius", format!("{}", radius_m.round() as i64)),
                ("keyword", keyword.to_string()),
            ])
            .await?;

        Ok(bounded.into_iter().next().map(|hit| {
            debug!(
                subsystem = "places",
                component = "google",
                phase = "radius",
                place = %hit.name,
                "Resolved place"
            );
            hit.into()
        }))
    }
}
