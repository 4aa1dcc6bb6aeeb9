pub mod app;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod feed;
pub mod geo;
pub mod geocode;
pub mod matcher;
pub mod normalize;
pub mod state;
pub mod tasks;
pub mod trips;

use anyhow::Result;
use std::path::Path;

/// Execute one outreach run against the configured collaborators.
pub async fn run(config_path: &Path, ignore_state: bool) -> Result<()> {
    app::run(config_path, ignore_state).await
}

// Re-export commonly used types
pub use config::Config;
pub use geo::{haversine_km, Coordinate, GeoCache};
pub use matcher::{MatchKind, MatchResult};
pub use normalize::normalize_city;
pub use state::OutreachState;
pub use trips::Trip;
