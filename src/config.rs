//! Configuration types for versebase
//!
//! All tunables live here. Defaults are chosen for a single-user desktop
//! deployment; everything can be overridden from a JSON config file.

use crate::error::{Result, VersebaseError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistent storage settings
    pub storage: StorageConfig,

    /// Import pipeline settings
    pub import: ImportConfig,

    /// Search settings
    pub search: SearchConfig,

    /// Annotation listing settings
    pub listing: ListingConfig,

    /// Auxiliary reference pack settings
    pub packs: PackConfig,
}

/// Persistent storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("versebase.db"),
        }
    }
}

/// Import pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Invoke the progress callback every N accumulated records.
    /// Throttled so a large import doesn't flood the caller.
    pub progress_every: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { progress_every: 250 }
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hard cap on collected search results per query
    pub result_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { result_cap: 120 }
    }
}

/// Annotation listing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Display limit under a "recent" filter
    pub recent_limit: usize,

    /// Display limit under an "all" filter
    pub all_limit: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            recent_limit: 50,
            all_limit: 500,
        }
    }
}

/// Auxiliary reference pack configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Directory holding the bundled pack JSON files
    pub dir: PathBuf,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("packs"),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VersebaseError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| VersebaseError::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.import.progress_every, 250);
        assert_eq!(config.search.result_cap, 120);
        assert_eq!(config.listing.recent_limit, 50);
        assert_eq!(config.listing.all_limit, 500);
    }

    #[test]
    fn test_partial_config_file() {
        let json = r#"{ "search": { "result_cap": 40 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.search.result_cap, 40);
        // Untouched sections keep their defaults
        assert_eq!(config.import.progress_every, 250);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file("no/such/config.json");
        assert!(result.is_err());
    }
}
