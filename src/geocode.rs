//! Cache-first geocoding over a pluggable provider.

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::geo::{Coordinate, GeoCache};
use crate::normalize::normalize_city;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(20);

/// Nominatim asks callers to identify themselves.
pub const USER_AGENT: &str = concat!("tripmatch/", env!("CARGO_PKG_VERSION"), " (personal use)");

/// Failure of a geocode call. A provider that answers "no result" is not a
/// failure; that is `Ok(None)` on the trait. Transport problems must abort
/// the run rather than be mistaken for not-found.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected geocoder response: {0}")]
    Malformed(String),
}

/// External lookup from free-text place name to at most one coordinate.
#[async_trait]
pub trait Geocoder {
    async fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Geocoder backed by the public Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(GEOCODE_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError> {
        debug!("Geocoding '{}' via Nominatim", place);
        let response = self
            .client
            .get(NOMINATIM_URL)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        let results: Vec<Value> = response.json().await?;
        let Some(first) = results.first() else {
            return Ok(None);
        };

        // Nominatim returns lat/lon as strings.
        let parse = |field: &str| -> Result<f64, GeocodeError> {
            first
                .get(field)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| GeocodeError::Malformed(format!("missing or bad '{field}' field")))
        };
        Ok(Some(Coordinate { lat: parse("lat")?, lon: parse("lon")? }))
    }
}

/// Resolves city names to coordinates, consulting the cache before the
/// provider. Issues at most one external call per distinct normalized city
/// per run.
pub struct GeocodeResolver<'a> {
    geocoder: &'a dyn Geocoder,
    cache: &'a mut GeoCache,
}

impl<'a> GeocodeResolver<'a> {
    pub fn new(geocoder: &'a dyn Geocoder, cache: &'a mut GeoCache) -> Self {
        Self { geocoder, cache }
    }

    /// Resolve `city` to a coordinate, or `Ok(None)` if the provider has no
    /// result. A "no result" is deliberately NOT cached: a transient miss
    /// must not permanently poison the cache.
    pub async fn resolve(&mut self, city: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let key = normalize_city(city);
        if let Some(coord) = self.cache.get(&key) {
            debug!("Geo cache hit for '{}'", key);
            return Ok(Some(coord));
        }

        // The provider sees the raw display name, not the normalized key.
        match self.geocoder.lookup(city).await? {
            Some(coord) => {
                info!("Geocoded '{}' to ({:.4}, {:.4})", city, coord.lat, coord.lon);
                self.cache.insert(key, coord);
                Ok(Some(coord))
            }
            None => {
                info!("No geocoding result for '{}'", city);
                Ok(None)
            }
        }
    }
}
