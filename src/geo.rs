//! Coordinates, great-circle distance and the persistent geocode cache.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Mean Earth radius in kilometers, used by the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Durable mapping from normalized city key to coordinates.
///
/// Entries are never evicted or refreshed; the cache only grows. It is loaded
/// once at the start of a run and written back exactly once at the end.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeoCache {
    #[serde(flatten)]
    entries: BTreeMap<String, Coordinate>,
}

impl GeoCache {
    /// Load the cache from `path`, or start empty if the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read geo cache {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse geo cache {}", path.display()))
    }

    /// Write the cache back as a whole-file rewrite (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::state::write_json_atomic(path, self)
            .with_context(|| format!("Failed to write geo cache {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<Coordinate> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: String, coord: Coordinate) {
        self.entries.insert(key, coord);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PARIS: Coordinate = Coordinate { lat: 48.8566, lon: 2.3522 };
    const LONDON: Coordinate = Coordinate { lat: 51.5074, lon: -0.1278 };

    #[test]
    fn haversine_paris_london() {
        let d = haversine_km(PARIS, LONDON);
        // Known distance is roughly 344 km.
        assert!((d - 344.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        assert!(haversine_km(PARIS, PARIS) < 1e-9);
    }

    #[test]
    fn haversine_symmetric() {
        let there = haversine_km(PARIS, LONDON);
        let back = haversine_km(LONDON, PARIS);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn cache_round_trips_through_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("geo_cache.json");

        let mut cache = GeoCache::default();
        cache.insert("paris".to_string(), PARIS);
        cache.insert("london".to_string(), LONDON);
        cache.save(&path)?;

        let loaded = GeoCache::load(&path)?;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("paris"), Some(PARIS));
        assert_eq!(loaded.get("missing"), None);
        Ok(())
    }

    #[test]
    fn missing_cache_file_starts_empty() -> Result<()> {
        let dir = tempdir()?;
        let cache = GeoCache::load(&dir.path().join("nope.json"))?;
        assert!(cache.is_empty());
        Ok(())
    }
}
