use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::contacts::expand_home;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_CONTACTS_DIR: &str = "~/travel-contacts";
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 90;
const STATE_DIR: &str = ".tripmatch";

/// Run configuration, loaded from a TOML file given on the command line.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Calendar feed to read upcoming trips from.
    #[serde(default)]
    pub ics_url: String,
    /// Directory of per-city contact files.
    #[serde(default = "default_contacts_dir")]
    pub contacts_dir: String,
    /// Radius for the distance-matching fallback.
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    /// IANA timezone name used for windowing and date rendering.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// How far ahead to look for trips, in days.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Where state.json and geo_cache.json live. Defaults to ~/.tripmatch.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub todoist: TodoistConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TodoistConfig {
    pub api_token: Option<String>,
}

fn default_contacts_dir() -> String {
    DEFAULT_CONTACTS_DIR.to_string()
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_lookahead_days() -> i64 {
    DEFAULT_LOOKAHEAD_DAYS
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Reject configurations that cannot possibly run, before any external
    /// call is made. The Todoist token may come from the file or from the
    /// TODOIST_API_TOKEN environment variable.
    pub fn validate(&self) -> Result<()> {
        if self.ics_url.trim().is_empty() {
            return Err(anyhow!("Missing calendar feed URL (ics_url) in config"));
        }
        if self.api_token().is_none() {
            return Err(anyhow!(
                "Missing Todoist API token (set todoist.api_token in config or TODOIST_API_TOKEN)"
            ));
        }
        Ok(())
    }

    pub fn api_token(&self) -> Option<String> {
        self.todoist
            .api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("TODOIST_API_TOKEN").ok().filter(|t| !t.trim().is_empty()))
    }

    /// Parsed timezone, falling back to UTC when the name is unknown.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!("Unknown timezone '{}', falling back to UTC", self.timezone);
            chrono_tz::UTC
        })
    }

    pub fn contacts_path(&self) -> PathBuf {
        expand_home(&self.contacts_dir)
    }

    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(STATE_DIR))
    }
}
