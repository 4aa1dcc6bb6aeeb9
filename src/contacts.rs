//! The contact directory: one plain-text file per city, one contact per line.

use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::normalize::normalize_city;

/// Separator between a contact's name and their free-form notes.
const NOTES_SEPARATOR: &str = "—";

/// One contact-list file, keyed by the normalized form of its file stem.
#[derive(Debug, Clone)]
pub struct ContactFile {
    /// City name as written in the file stem, used for geocoding.
    pub city: String,
    pub path: PathBuf,
}

/// A single line of a contact file.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub name: String,
    pub notes: Option<String>,
}

/// All contact files under the configured directory, keyed by normalized
/// city name. Read-only within a run.
#[derive(Debug, Default)]
pub struct ContactDirectory {
    entries: BTreeMap<String, ContactFile>,
}

impl ContactDirectory {
    /// Scan `dir` for `.txt` files. A missing directory yields an empty
    /// directory; the caller decides whether that is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();
        if !dir.is_dir() {
            return Ok(Self { entries });
        }
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read contacts directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_txt = path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"));
            if !is_txt {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = normalize_city(stem);
            if key.is_empty() {
                continue;
            }
            debug!("Found contact file for '{}' at {}", stem, path.display());
            entries.insert(key, ContactFile { city: stem.to_string(), path });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&ContactFile> {
        self.entries.get(key)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContactFile)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContactFile {
    /// Read and parse the file's non-empty lines.
    pub fn read_contacts(&self) -> Result<Vec<Contact>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read contact file {}", self.path.display()))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(parse_contact_line)
            .collect())
    }
}

/// Split a contact line into name and optional notes on the first "—".
/// Lines with an empty name are dropped.
pub fn parse_contact_line(line: &str) -> Option<Contact> {
    let (name, notes) = match line.split_once(NOTES_SEPARATOR) {
        Some((name, rest)) => {
            let rest = rest.trim();
            (name.trim(), (!rest.is_empty()).then(|| rest.to_string()))
        }
        None => (line.trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some(Contact { name: name.to_string(), notes })
}

/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn parses_name_and_notes() {
        let contact = parse_contact_line("Alice Chen — loves sushi, ask about the move").unwrap();
        assert_eq!(contact.name, "Alice Chen");
        assert_eq!(
            contact.notes.as_deref(),
            Some("loves sushi, ask about the move")
        );
    }

    #[test]
    fn parses_name_without_notes() {
        let contact = parse_contact_line("Bob").unwrap();
        assert_eq!(contact.name, "Bob");
        assert_eq!(contact.notes, None);
    }

    #[test]
    fn empty_notes_after_separator_become_none() {
        let contact = parse_contact_line("Carol —  ").unwrap();
        assert_eq!(contact.name, "Carol");
        assert_eq!(contact.notes, None);
    }

    #[test]
    fn blank_name_is_dropped() {
        assert_eq!(parse_contact_line("— only notes"), None);
    }

    #[test]
    fn only_first_separator_splits() {
        let contact = parse_contact_line("Dan — note — with a dash").unwrap();
        assert_eq!(contact.name, "Dan");
        assert_eq!(contact.notes.as_deref(), Some("note — with a dash"));
    }

    #[test]
    fn loads_txt_files_keyed_by_normalized_stem() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("San Francisco, CA.txt"), "Alice — notes\n")?;
        fs::write(dir.path().join("tokyo.txt"), "Bob\n")?;
        fs::write(dir.path().join("readme.md"), "not a contact file")?;

        let contacts = ContactDirectory::load(dir.path())?;
        assert_eq!(contacts.len(), 2);
        assert!(contacts.get("san francisco ca").is_some());
        assert!(contacts.get("tokyo").is_some());
        assert_eq!(contacts.get("san francisco ca").unwrap().city, "San Francisco, CA");
        Ok(())
    }

    #[test]
    fn reads_contacts_skipping_blank_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tokyo.txt");
        fs::write(&path, "Alice — ramen guide\n\n  \nBob\n")?;

        let file = ContactFile { city: "tokyo".to_string(), path };
        let contacts = file.read_contacts()?;
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Alice");
        assert_eq!(contacts[1].name, "Bob");
        Ok(())
    }

    #[test]
    fn missing_directory_is_empty_not_error() -> Result<()> {
        let contacts = ContactDirectory::load(Path::new("/nonexistent/contacts"))?;
        assert!(contacts.is_empty());
        Ok(())
    }
}
