//! Import pipeline for versebase
//!
//! Fetches a source document, parses it into text units and bulk-writes
//! them into a collection in one transaction.

pub mod xml;

pub use xml::DocumentParser;

use crate::config::ImportConfig;
use crate::error::{Result, VersebaseError};
use crate::storage::Database;
use std::collections::HashSet;
use std::path::Path;

/// Progress callback invoked with the running record count
pub type ProgressFn = dyn Fn(usize) + Send + Sync;

/// Outcome of one import run
#[derive(Debug, Clone)]
pub struct ImportStats {
    /// Total verses written
    pub verse_count: usize,

    /// Distinct books actually written
    pub book_count: usize,

    /// Total processing time in seconds
    pub processing_time: f64,
}

/// Importer for book/chapter/verse source documents
pub struct SourceImporter {
    parser: DocumentParser,
}

impl SourceImporter {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        Ok(Self {
            parser: DocumentParser::new(config)?,
        })
    }

    /// Fetch a source document as raw text from a filesystem path or an
    /// http(s) URL. No retries - a transient failure surfaces immediately
    /// and the caller decides whether to re-invoke.
    pub async fn fetch_source(&self, location: &str) -> Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            log::info!("Fetching source document from {}", location);
            let response = reqwest::get(location).await?.error_for_status()?;
            Ok(response.text().await?)
        } else {
            let path = Path::new(location);
            std::fs::read_to_string(path).map_err(|e| {
                VersebaseError::SourceFetch(format!("Failed to read {}: {}", path.display(), e))
            })
        }
    }

    /// Parse `xml` and bulk-upsert the resulting units into `collection_id`.
    ///
    /// All-or-nothing: a malformed document or an empty yield fails before
    /// any write, and the bulk write itself is a single transaction, so a
    /// failed import leaves the collection exactly as it was. Rerunning the
    /// same import is an idempotent upsert by locator key.
    pub async fn import(
        &self,
        db: &mut Database,
        collection_id: &str,
        xml: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<ImportStats> {
        let start_time = std::time::Instant::now();

        let units = self.parser.parse(collection_id, xml, |count| {
            if let Some(cb) = progress {
                cb(count);
            }
        })?;

        // A shape that yields nothing must not silently succeed with an
        // empty collection.
        if units.is_empty() {
            return Err(VersebaseError::EmptySource);
        }

        db.upsert_units(&units)?;

        if let Some(cb) = progress {
            cb(units.len());
        }

        let book_count = units
            .iter()
            .map(|u| u.book.as_str())
            .collect::<HashSet<_>>()
            .len();

        let stats = ImportStats {
            verse_count: units.len(),
            book_count,
            processing_time: start_time.elapsed().as_secs_f64(),
        };

        log::info!(
            "Imported {} verses across {} books into '{}'",
            stats.verse_count,
            stats.book_count,
            collection_id
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <bible>
          <book number="1">
            <chapter number="1">
              <verse number="1">In the beginning</verse>
              <verse number="2">And the earth</verse>
            </chapter>
          </book>
          <book number="2">
            <chapter number="1">
              <verse number="1">Now these are the names</verse>
              <verse number="2">Reuben, Simeon, Levi, and Judah</verse>
            </chapter>
          </book>
          <book number="3">
            <chapter number="1">
              <verse number="1">And the LORD called</verse>
              <verse number="2">Speak unto the children</verse>
            </chapter>
          </book>
        </bible>
    "#;

    #[tokio::test]
    async fn test_import_fixture() {
        let mut db = Database::memory().unwrap();
        let importer = SourceImporter::new(&ImportConfig::default()).unwrap();

        let stats = importer.import(&mut db, "kjv", FIXTURE, None).await.unwrap();
        assert_eq!(stats.verse_count, 6);
        assert_eq!(stats.book_count, 3);
        assert_eq!(db.unit_count("kjv").unwrap(), 6);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let mut db = Database::memory().unwrap();
        let importer = SourceImporter::new(&ImportConfig::default()).unwrap();

        importer.import(&mut db, "kjv", FIXTURE, None).await.unwrap();
        let stats = importer.import(&mut db, "kjv", FIXTURE, None).await.unwrap();

        assert_eq!(stats.verse_count, 6);
        // Row count never doubles
        assert_eq!(db.unit_count("kjv").unwrap(), 6);
    }

    #[tokio::test]
    async fn test_empty_shape_fails_without_writes() {
        let mut db = Database::memory().unwrap();
        let importer = SourceImporter::new(&ImportConfig::default()).unwrap();

        // Well-formed, wrong shape: no book elements
        let result = importer
            .import(&mut db, "kjv", "<library><shelf/></library>", None)
            .await;
        assert!(matches!(result, Err(VersebaseError::EmptySource)));
        assert_eq!(db.unit_count("kjv").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_source_fails_without_writes() {
        let mut db = Database::memory().unwrap();
        let importer = SourceImporter::new(&ImportConfig::default()).unwrap();

        let result = importer.import(&mut db, "kjv", "<bible><book", None).await;
        assert!(matches!(result, Err(VersebaseError::MalformedSource(_))));
        assert_eq!(db.unit_count("kjv").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_source_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.xml");
        std::fs::write(&path, FIXTURE).unwrap();

        let importer = SourceImporter::new(&ImportConfig::default()).unwrap();
        let text = importer.fetch_source(path.to_str().unwrap()).await.unwrap();
        assert!(text.contains("In the beginning"));

        let missing = importer.fetch_source("no/such/file.xml").await;
        assert!(matches!(missing, Err(VersebaseError::SourceFetch(_))));
    }
}
