//! Reverse geocoding: coordinates to a place name for the overlay header.

use std::{fmt::Debug, time::Duration};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{model::Coordinate, provider::truncate_body};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("otenki/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve_location_label(&self, coordinate: Coordinate) -> Result<String>;
}

/// OpenStreetMap Nominatim reverse geocoder. Free, no API key required.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create geocoding client")?;

        Ok(Self {
            base_url: NOMINATIM_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl NominatimAddress {
    /// Locality only: city > town > village > municipality.
    fn locality(self) -> Option<String> {
        [self.city, self.town, self.village, self.municipality]
            .into_iter()
            .flatten()
            .find(|place| !place.trim().is_empty())
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self), fields(lat = %coordinate.latitude, lon = %coordinate.longitude))]
    async fn resolve_location_label(&self, coordinate: Coordinate) -> Result<String> {
        let url = format!("{}/reverse", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
            .context("Failed to send reverse geocode request")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read reverse geocode response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Reverse geocode request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: NominatimResponse =
            serde_json::from_str(&body).context("Failed to parse reverse geocode JSON")?;

        let label = parsed
            .address
            .and_then(NominatimAddress::locality)
            .ok_or_else(|| anyhow!("No locality found for {coordinate}"))?;

        debug!(label = %label, "Reverse geocoded");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locality_prefers_city() {
        let address = NominatimAddress {
            city: Some("Tokyo".into()),
            town: Some("Shinjuku".into()),
            village: None,
            municipality: None,
        };
        assert_eq!(address.locality().as_deref(), Some("Tokyo"));
    }

    #[test]
    fn locality_falls_back_through_the_chain() {
        let address = NominatimAddress {
            city: None,
            town: None,
            village: Some("Shirakawa".into()),
            municipality: Some("Ono District".into()),
        };
        assert_eq!(address.locality().as_deref(), Some("Shirakawa"));
    }

    #[test]
    fn blank_names_are_skipped() {
        let address = NominatimAddress {
            city: Some("  ".into()),
            town: Some("Hakone".into()),
            village: None,
            municipality: None,
        };
        assert_eq!(address.locality().as_deref(), Some("Hakone"));

        let empty = NominatimAddress { city: None, town: None, village: None, municipality: None };
        assert!(empty.locality().is_none());
    }
}
