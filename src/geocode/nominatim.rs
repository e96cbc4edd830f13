use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PlaceInfo, ReverseGeocoder};
use crate::config::GeocoderConfig;
use crate::errors::EnrichmentError;
use crate::record::Coordinates;

/// OpenStreetMap Nominatim `/reverse` client.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    endpoint: String,
    zoom: u8,
}

#[derive(Debug, Deserialize)]
struct ReverseResp {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            zoom: config.zoom,
        })
    }
}

fn to_place(resp: ReverseResp) -> Result<PlaceInfo, EnrichmentError> {
    if resp.error.is_some() {
        return Err(EnrichmentError::NotFound);
    }
    let addr = resp.address.unwrap_or_default();
    let locality = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.hamlet)
        .or(addr.county);
    let place = PlaceInfo {
        name: locality.or(resp.name.filter(|n| !n.trim().is_empty())),
        region: addr.state,
        country: addr.country,
    };
    if place == PlaceInfo::default() {
        return Err(EnrichmentError::NotFound);
    }
    Ok(place)
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinates) -> Result<PlaceInfo, EnrichmentError> {
        let url = format!("{}/reverse", self.endpoint);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("zoom", self.zoom.to_string()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(EnrichmentError::Status(resp.status().as_u16()));
        }
        let body: ReverseResp = resp.json().await?;
        to_place(body)
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}
