//! Auxiliary reference packs
//!
//! Three static, read-only JSON resources keyed by `"book|chapter|verse"`:
//! topical tags, study insights and cross-references. Each pack is loaded
//! from disk once on first access and memoized for the cache's lifetime;
//! a missing entry is an explicit empty value, never an error.
//!
//! The cache is owned by the provider instance - there is no module-level
//! state - and is cleared only by an explicit [`PackCache::reset`].

use crate::config::PackConfig;
use crate::error::{Result, VersebaseError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Study insight payload for one verse
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VerseInsight {
    /// Plain-language explanation
    #[serde(default)]
    pub explanation: Option<String>,

    /// Discussion points
    #[serde(default)]
    pub discussion: Vec<String>,

    /// Reflection questions
    #[serde(default)]
    pub reflection: Vec<String>,
}

/// One cross-reference target
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CrossReference {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,

    #[serde(default)]
    pub note: Option<String>,
}

/// Lazy, memoized loader for the bundled reference packs
pub struct PackCache {
    dir: PathBuf,
    tags: Option<HashMap<String, Vec<String>>>,
    insights: Option<HashMap<String, VerseInsight>>,
    cross_refs: Option<HashMap<String, Vec<CrossReference>>>,
}

impl PackCache {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            tags: None,
            insights: None,
            cross_refs: None,
        }
    }

    /// Topical tags for a locator key; empty when the verse has none
    pub fn tags_for(&mut self, key: &str) -> Result<Vec<String>> {
        if self.tags.is_none() {
            self.tags = Some(self.load("tags.json")?);
        }

        Ok(self
            .tags
            .as_ref()
            .and_then(|m| m.get(key))
            .cloned()
            .unwrap_or_default())
    }

    /// Study insight for a locator key; `None` when the verse has none
    pub fn insight_for(&mut self, key: &str) -> Result<Option<VerseInsight>> {
        if self.insights.is_none() {
            self.insights = Some(self.load("insights.json")?);
        }

        Ok(self.insights.as_ref().and_then(|m| m.get(key)).cloned())
    }

    /// Cross-references for a locator key; empty when the verse has none
    pub fn cross_refs_for(&mut self, key: &str) -> Result<Vec<CrossReference>> {
        if self.cross_refs.is_none() {
            self.cross_refs = Some(self.load("cross_refs.json")?);
        }

        Ok(self
            .cross_refs
            .as_ref()
            .and_then(|m| m.get(key))
            .cloned()
            .unwrap_or_default())
    }

    /// Drop all memoized packs; the next access per kind reloads from disk.
    /// Intended for test teardown and explicit cache invalidation.
    pub fn reset(&mut self) {
        self.tags = None;
        self.insights = None;
        self.cross_refs = None;
        log::debug!("Reference pack cache cleared");
    }

    fn load<T: for<'de> Deserialize<'de>>(&self, file_name: &str) -> Result<HashMap<String, T>> {
        let path = self.dir.join(file_name);
        log::info!("Loading reference pack {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            VersebaseError::Pack(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            VersebaseError::Pack(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}
