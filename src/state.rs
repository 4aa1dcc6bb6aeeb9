//! Persisted run state: the set of trip identities already turned into
//! outreach tasks.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// The processed-trip record, stored as `state.json`.
///
/// The set only grows: a trip id is added once its run has handled it
/// (matched or not) and is never removed. `--ignore-state` bypasses the
/// filter for one run without touching the persisted document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutreachState {
    #[serde(default)]
    processed_trip_ids: BTreeSet<String>,
}

impl OutreachState {
    /// Load the state from `path`, or start empty if the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    /// Write the state back as a whole-file rewrite (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
            .with_context(|| format!("Failed to write state file {}", path.display()))
    }

    pub fn is_processed(&self, trip_id: &str) -> bool {
        self.processed_trip_ids.contains(trip_id)
    }

    pub fn mark_processed(&mut self, trip_id: &str) {
        self.processed_trip_ids.insert(trip_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.processed_trip_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_trip_ids.is_empty()
    }
}

/// Serialize `value` as pretty JSON and replace `path` in one rename, so a
/// crash mid-write never leaves a truncated document behind.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn marks_and_persists_processed_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        let mut state = OutreachState::default();
        assert!(!state.is_processed("tokyo"));
        state.mark_processed("tokyo");
        state.mark_processed("paris france");
        state.save(&path)?;

        let loaded = OutreachState::load(&path)?;
        assert!(loaded.is_processed("tokyo"));
        assert!(loaded.is_processed("paris france"));
        assert!(!loaded.is_processed("berlin"));
        assert_eq!(loaded.len(), 2);
        Ok(())
    }

    #[test]
    fn reload_after_second_save_is_superset() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        let mut state = OutreachState::default();
        state.mark_processed("tokyo");
        state.save(&path)?;

        // A later run loads, adds, and saves again; nothing is lost.
        let mut second = OutreachState::load(&path)?;
        second.mark_processed("berlin");
        second.save(&path)?;

        let final_state = OutreachState::load(&path)?;
        assert!(final_state.is_processed("tokyo"));
        assert!(final_state.is_processed("berlin"));
        Ok(())
    }

    #[test]
    fn marking_twice_is_a_noop() {
        let mut state = OutreachState::default();
        state.mark_processed("tokyo");
        state.mark_processed("tokyo");
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn missing_state_file_starts_empty() -> Result<()> {
        let dir = tempdir()?;
        let state = OutreachState::load(&dir.path().join("state.json"))?;
        assert!(state.is_empty());
        Ok(())
    }

    #[test]
    fn keeps_original_document_shape() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        let mut state = OutreachState::default();
        state.mark_processed("tokyo");
        state.save(&path)?;

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(raw["processed_trip_ids"], serde_json::json!(["tokyo"]));
        Ok(())
    }
}
