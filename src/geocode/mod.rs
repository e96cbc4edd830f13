//! Reverse geocoding: provider abstraction, a Nominatim client and an
//! in-memory cache with a request spacing limit. Everything here is
//! best-effort; callers treat any error as "no place name".

pub mod cache;
pub mod nominatim;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeocoderConfig;
use crate::errors::EnrichmentError;
use crate::record::Coordinates;
use cache::CachingGeocoder;
use nominatim::NominatimGeocoder;

/// Human-readable place for a coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl PlaceInfo {
    /// `"name, region, country"` without the missing parts.
    pub fn label(&self) -> String {
        [&self.name, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, at: Coordinates) -> Result<PlaceInfo, EnrichmentError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type SharedGeocoder = Arc<dyn ReverseGeocoder>;

/// Always fails with [`EnrichmentError::Disabled`].
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _at: Coordinates) -> Result<PlaceInfo, EnrichmentError> {
        Err(EnrichmentError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns the same place for every lookup, optionally after a delay.
#[derive(Clone)]
pub struct FixedGeocoder {
    pub place: PlaceInfo,
    pub delay: Duration,
}

impl FixedGeocoder {
    pub fn new(place: PlaceInfo) -> Self {
        Self {
            place,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn reverse(&self, _at: Coordinates) -> Result<PlaceInfo, EnrichmentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.place.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Build the geocoder described by `config`: disabled, or Nominatim behind the cache.
pub fn build_geocoder(config: &GeocoderConfig) -> SharedGeocoder {
    if !config.enabled {
        tracing::info!(target: "geocode", "reverse geocoding disabled");
        return Arc::new(DisabledGeocoder);
    }
    match NominatimGeocoder::new(config) {
        Ok(provider) => Arc::new(CachingGeocoder::new(
            provider,
            Duration::from_millis(config.min_interval_ms),
            config.cache_capacity,
        )),
        Err(e) => {
            tracing::warn!(target: "geocode", error = %e, "could not build HTTP client, geocoding disabled");
            Arc::new(DisabledGeocoder)
        }
    }
}
