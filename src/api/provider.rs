//! VerseProvider - Main domain API
//!
//! This is the facade the presentation layer calls; it owns the database
//! handle, key construction, the merge of text and annotations at render
//! time, and the auxiliary pack cache. UI code never touches the store
//! adapter directly.

use crate::config::Config;
use crate::error::Result;
use crate::importer::{ImportStats, ProgressFn, SourceImporter};
use crate::keys;
use crate::packs::{CrossReference, PackCache, VerseInsight};
use crate::storage::{
    Annotation, AnnotationPatch, ChapterBookmark, Database, NoteType, TextUnit,
};
use crate::utils;
use std::collections::HashMap;

/// Outcome of a bookmark toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkToggle {
    Added,
    Removed,
}

/// Client-side predicate for annotation listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFilter {
    /// Has a non-empty note
    Notes,

    /// Has a non-empty note marked favorite
    FavoriteNotes,

    /// Has a non-empty note of the given category
    NotesOfType(NoteType),

    /// Verse-level bookmark flag set
    Bookmarked,

    /// Highlight color other than "none"
    Highlighted,
}

impl AnnotationFilter {
    fn matches(&self, annotation: &Annotation) -> bool {
        match self {
            AnnotationFilter::Notes => !annotation.note.is_empty(),
            AnnotationFilter::FavoriteNotes => {
                !annotation.note.is_empty() && annotation.note_favorite
            }
            AnnotationFilter::NotesOfType(note_type) => {
                !annotation.note.is_empty() && annotation.note_type == *note_type
            }
            AnnotationFilter::Bookmarked => annotation.bookmarked,
            AnnotationFilter::Highlighted => annotation.color != "none",
        }
    }
}

/// Provider statistics
#[derive(Debug, Clone)]
pub struct ProviderStats {
    /// Total text units across all collections
    pub unit_count: usize,

    /// Total annotation records
    pub annotation_count: usize,

    /// Total chapter bookmarks
    pub bookmark_count: usize,

    /// Database file size in bytes
    pub database_size_bytes: usize,
}

/// Main provider for reading, annotating and searching collections
pub struct VerseProvider {
    config: Config,
    database: Database,
    importer: SourceImporter,
    packs: PackCache,
}

impl VerseProvider {
    /// Open the provider against the configured database file, creating or
    /// upgrading the schema as needed.
    ///
    /// A `StorageUnavailable` error here means the environment denies
    /// persistent storage; the caller should degrade rather than crash.
    pub async fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.storage.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                utils::ensure_directory(parent)?;
            }
        }

        let database = Database::new(&config.storage.database_path)?;
        let importer = SourceImporter::new(&config.import)?;
        let packs = PackCache::new(&config.packs);

        log::info!(
            "VerseProvider initialized with database {}",
            config.storage.database_path.display()
        );

        Ok(Self {
            config,
            database,
            importer,
            packs,
        })
    }

    /// Open a provider over an in-memory database (for testing)
    pub fn open_in_memory(config: Config) -> Result<Self> {
        let database = Database::memory()?;
        let importer = SourceImporter::new(&config.import)?;
        let packs = PackCache::new(&config.packs);

        Ok(Self {
            config,
            database,
            importer,
            packs,
        })
    }

    // ---- import ----

    /// "Count > 0" heuristic for whether a collection is already imported.
    /// A partial prior import is indistinguishable from a complete one.
    pub async fn is_imported(&self, collection_id: &str) -> Result<bool> {
        Ok(self.database.unit_count(collection_id)? > 0)
    }

    /// Fetch a source document as raw text from a path or http(s) URL
    pub async fn fetch_source(&self, location: &str) -> Result<String> {
        self.importer.fetch_source(location).await
    }

    /// Parse and bulk-import a source document into a collection.
    /// Rerunnable: the underlying write is an idempotent upsert by key.
    pub async fn import_source(
        &mut self,
        collection_id: &str,
        xml: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<ImportStats> {
        self.importer
            .import(&mut self.database, collection_id, xml, progress)
            .await
    }

    // ---- chapter views ----

    /// Fetch one chapter's text units, sorted ascending by verse.
    ///
    /// Index row order is not guaranteed stable across engines, so the
    /// sort here is explicit. An empty result is valid and means "not
    /// imported yet" or "out of range".
    pub async fn get_chapter(
        &self,
        collection_id: &str,
        book: &str,
        chapter: u32,
    ) -> Result<Vec<TextUnit>> {
        let mut units = self.database.units_by_chapter(collection_id, book, chapter)?;
        units.sort_by_key(|u| u.verse);
        Ok(units)
    }

    /// Fetch one chapter's annotations keyed by unit key, for an O(1) join
    /// against the chapter's text units at render time.
    pub async fn annotations_for_chapter(
        &self,
        collection_id: &str,
        book: &str,
        chapter: u32,
    ) -> Result<HashMap<String, Annotation>> {
        let annotations = self
            .database
            .annotations_by_chapter(collection_id, book, chapter)?;

        Ok(annotations.into_iter().map(|a| (a.key.clone(), a)).collect())
    }

    // ---- annotations ----

    /// Read one annotation, if any exists for the locator
    pub async fn get_annotation(
        &self,
        collection_id: &str,
        book: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<Annotation>> {
        let key = keys::unit_key(book, chapter, verse);
        self.database.get_annotation(collection_id, &key)
    }

    /// Upsert an annotation: read the current record (or the default when
    /// none exists), shallow-merge the patch over it, stamp `updated_at`
    /// and write it back.
    ///
    /// Read-modify-write across two suspension points: two overlapping
    /// upserts to the same locator resolve last-writer-wins at whole-record
    /// granularity, and the earlier patch's unrelated fields can be lost.
    /// Callers with concurrent writers must serialize their own writes.
    pub async fn upsert_annotation(
        &mut self,
        collection_id: &str,
        book: &str,
        chapter: u32,
        verse: u32,
        patch: &AnnotationPatch,
    ) -> Result<Annotation> {
        let key = keys::unit_key(book, chapter, verse);

        let mut annotation = self
            .database
            .get_annotation(collection_id, &key)?
            .unwrap_or_else(|| Annotation::default_for(collection_id, book, chapter, verse));

        annotation.apply(patch);
        annotation.updated_at = utils::now_millis();

        self.database.upsert_annotation(&annotation)?;
        Ok(annotation)
    }

    /// List a collection's annotations matching `filter`, newest first,
    /// capped at `limit` (a display limit, e.g. 50 for "recent" vs 500 for
    /// "all" - see `ListingConfig`).
    pub async fn list_annotations(
        &self,
        collection_id: &str,
        filter: AnnotationFilter,
        limit: usize,
    ) -> Result<Vec<Annotation>> {
        let mut matches: Vec<Annotation> = self
            .database
            .annotations_for_collection(collection_id)?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();

        matches.sort_by_key(|a| std::cmp::Reverse(a.updated_at));
        matches.truncate(limit);
        Ok(matches)
    }

    // ---- chapter bookmarks ----

    /// Toggle the chapter-level bookmark: delete it when present, create
    /// it when absent. At most one bookmark exists per (collection, book,
    /// chapter).
    pub async fn toggle_chapter_bookmark(
        &mut self,
        collection_id: &str,
        book: &str,
        chapter: u32,
    ) -> Result<BookmarkToggle> {
        let key = keys::chapter_bookmark_key(collection_id, book, chapter);

        if self.database.get_bookmark(&key)?.is_some() {
            self.database.delete_bookmark(&key)?;
            Ok(BookmarkToggle::Removed)
        } else {
            let bookmark = ChapterBookmark::new(collection_id, book, chapter, utils::now_millis());
            self.database.put_bookmark(&bookmark)?;
            Ok(BookmarkToggle::Added)
        }
    }

    /// Current chapter bookmarks for a collection, newest first
    pub async fn list_bookmarks(&self, collection_id: &str) -> Result<Vec<ChapterBookmark>> {
        let mut bookmarks = self.database.bookmarks_for_collection(collection_id)?;
        bookmarks.sort_by_key(|b| std::cmp::Reverse(b.saved_at));
        Ok(bookmarks)
    }

    // ---- search ----

    /// Substring search over one collection's text.
    ///
    /// Lower-cases the query and each visited unit's text and collects
    /// containment matches in primary-key visitation order until `cap` is
    /// reached or the collection is exhausted. O(collection size) per call;
    /// collections are bounded and search is user-triggered. An empty or
    /// whitespace-only query returns no results without touching storage.
    pub async fn search(
        &self,
        collection_id: &str,
        query: &str,
        cap: usize,
    ) -> Result<Vec<TextUnit>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let needle = trimmed.to_lowercase();
        let results = self
            .database
            .scan_units(collection_id, |u| u.text.to_lowercase().contains(&needle), cap)?;

        log::info!(
            "Search '{}' matched {} units in '{}'",
            trimmed,
            results.len(),
            collection_id
        );
        Ok(results)
    }

    // ---- settings ----

    /// Read one user preference
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.database.get_setting(key)
    }

    /// Write one user preference, last-write-wins
    pub async fn put_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.database.put_setting(key, value)
    }

    // ---- auxiliary packs ----

    /// Topical tags for a verse; empty when the verse has none
    pub async fn tags_for(&mut self, book: &str, chapter: u32, verse: u32) -> Result<Vec<String>> {
        let key = keys::unit_key(book, chapter, verse);
        self.packs.tags_for(&key)
    }

    /// Study insight for a verse; `None` when the verse has none
    pub async fn insight_for(
        &mut self,
        book: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<VerseInsight>> {
        let key = keys::unit_key(book, chapter, verse);
        self.packs.insight_for(&key)
    }

    /// Cross-references for a verse; empty when the verse has none
    pub async fn cross_refs_for(
        &mut self,
        book: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<Vec<CrossReference>> {
        let key = keys::unit_key(book, chapter, verse);
        self.packs.cross_refs_for(&key)
    }

    /// Clear the memoized packs; the next access reloads from disk
    pub fn reset_packs(&mut self) {
        self.packs.reset();
    }

    // ---- stats & accessors ----

    /// Get provider statistics
    pub fn get_stats(&self) -> Result<ProviderStats> {
        let db_stats = self.database.get_stats()?;

        Ok(ProviderStats {
            unit_count: db_stats.unit_count,
            annotation_count: db_stats.annotation_count,
            bookmark_count: db_stats.bookmark_count,
            database_size_bytes: db_stats.file_size_bytes,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <bible>
          <book number="1">
            <chapter number="1">
              <verse number="3">And God said, Let there be light</verse>
              <verse number="1">In the beginning God created the heaven and the earth</verse>
              <verse number="2">And the earth was without form, and void</verse>
            </chapter>
            <chapter number="2">
              <verse number="1">Thus the heavens and the earth were finished</verse>
            </chapter>
          </book>
        </bible>
    "#;

    async fn provider_with_fixture() -> VerseProvider {
        let mut provider = VerseProvider::open_in_memory(Config::default()).unwrap();
        provider
            .import_source("kjv", FIXTURE, None)
            .await
            .unwrap();
        provider
    }

    #[tokio::test]
    async fn test_chapter_sorted_ascending_by_verse() {
        let provider = provider_with_fixture().await;

        let units = provider.get_chapter("kjv", "Genesis", 1).await.unwrap();
        let verses: Vec<u32> = units.iter().map(|u| u.verse).collect();
        // Ascending regardless of document (insertion) order 3, 1, 2
        assert_eq!(verses, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_chapter_is_valid() {
        let provider = provider_with_fixture().await;

        let units = provider.get_chapter("kjv", "Genesis", 50).await.unwrap();
        assert!(units.is_empty());
        let units = provider.get_chapter("web", "Genesis", 1).await.unwrap();
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_annotation_merge_preserves_earlier_fields() {
        let mut provider = provider_with_fixture().await;

        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                1,
                &AnnotationPatch {
                    bookmarked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                1,
                &AnnotationPatch {
                    note: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let annotation = provider
            .get_annotation("kjv", "Genesis", 1, 1)
            .await
            .unwrap()
            .unwrap();
        assert!(annotation.bookmarked);
        assert_eq!(annotation.note, "x");
    }

    #[tokio::test]
    async fn test_first_upsert_creates_defaults_merged_with_patch() {
        let mut provider = provider_with_fixture().await;

        let annotation = provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                2,
                &AnnotationPatch {
                    color: Some("amber".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(annotation.color, "amber");
        assert!(!annotation.bold);
        assert_eq!(annotation.note_type, NoteType::Study);
        assert!(annotation.updated_at > 0);
    }

    #[tokio::test]
    async fn test_annotation_join_keys_match_unit_keys() {
        let mut provider = provider_with_fixture().await;

        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                3,
                &AnnotationPatch {
                    underline: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let units = provider.get_chapter("kjv", "Genesis", 1).await.unwrap();
        let annotations = provider
            .annotations_for_chapter("kjv", "Genesis", 1)
            .await
            .unwrap();

        let decorated: Vec<&TextUnit> = units
            .iter()
            .filter(|u| annotations.contains_key(&u.key))
            .collect();
        assert_eq!(decorated.len(), 1);
        assert_eq!(decorated[0].verse, 3);
    }

    #[tokio::test]
    async fn test_no_cross_chapter_contamination() {
        let mut provider = provider_with_fixture().await;

        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                1,
                &AnnotationPatch {
                    note: Some("chapter one".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                2,
                1,
                &AnnotationPatch {
                    note: Some("chapter two".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ch1 = provider
            .annotations_for_chapter("kjv", "Genesis", 1)
            .await
            .unwrap();
        assert_eq!(ch1.len(), 1);
        assert_eq!(ch1.values().next().unwrap().note, "chapter one");
    }

    #[tokio::test]
    async fn test_bookmark_toggle_cycle() {
        let mut provider = provider_with_fixture().await;

        let first = provider
            .toggle_chapter_bookmark("kjv", "Genesis", 1)
            .await
            .unwrap();
        assert_eq!(first, BookmarkToggle::Added);

        let second = provider
            .toggle_chapter_bookmark("kjv", "Genesis", 1)
            .await
            .unwrap();
        assert_eq!(second, BookmarkToggle::Removed);

        let third = provider
            .toggle_chapter_bookmark("kjv", "Genesis", 1)
            .await
            .unwrap();
        assert_eq!(third, BookmarkToggle::Added);

        let bookmarks = provider.list_bookmarks("kjv").await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].chapter, 1);
    }

    #[tokio::test]
    async fn test_listing_filters_and_recency_order() {
        let mut provider = provider_with_fixture().await;

        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                1,
                &AnnotationPatch {
                    note: Some("older note".to_string()),
                    note_type: Some(NoteType::Research),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // Millisecond timestamps need daylight between writes for the
        // recency assertions below
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                2,
                &AnnotationPatch {
                    color: Some("amber".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        provider
            .upsert_annotation(
                "kjv",
                "Genesis",
                1,
                3,
                &AnnotationPatch {
                    note: Some("newer note".to_string()),
                    note_favorite: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let limit = provider.config().listing.all_limit;

        let notes = provider
            .list_annotations("kjv", AnnotationFilter::Notes, limit)
            .await
            .unwrap();
        assert_eq!(notes.len(), 2);
        // Newest first
        assert_eq!(notes[0].note, "newer note");

        let favorites = provider
            .list_annotations("kjv", AnnotationFilter::FavoriteNotes, limit)
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);

        let research = provider
            .list_annotations(
                "kjv",
                AnnotationFilter::NotesOfType(NoteType::Research),
                limit,
            )
            .await
            .unwrap();
        assert_eq!(research.len(), 1);
        assert_eq!(research[0].note, "older note");

        let highlighted = provider
            .list_annotations("kjv", AnnotationFilter::Highlighted, limit)
            .await
            .unwrap();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].verse, 2);

        // Display limit caps the listing
        let capped = provider
            .list_annotations("kjv", AnnotationFilter::Notes, 1)
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_search_containment_and_cap() {
        let provider = provider_with_fixture().await;

        let results = provider.search("kjv", "the earth", 120).await.unwrap();
        assert_eq!(results.len(), 3);

        // Case-insensitive containment
        let results = provider.search("kjv", "GOD SAID", 120).await.unwrap();
        assert_eq!(results.len(), 1);

        // Cap applies
        let results = provider.search("kjv", "the", 2).await.unwrap();
        assert_eq!(results.len(), 2);

        // Whitespace-only query returns nothing without a scan
        let results = provider.search("kjv", "   ", 120).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let mut provider = provider_with_fixture().await;

        assert!(provider.get_setting("theme").await.unwrap().is_none());
        provider.put_setting("theme", "dark").await.unwrap();
        provider.put_setting("theme", "sepia").await.unwrap();
        assert_eq!(
            provider.get_setting("theme").await.unwrap().as_deref(),
            Some("sepia")
        );
    }

    #[tokio::test]
    async fn test_is_imported_heuristic() {
        let mut provider = VerseProvider::open_in_memory(Config::default()).unwrap();
        assert!(!provider.is_imported("kjv").await.unwrap());

        provider.import_source("kjv", FIXTURE, None).await.unwrap();
        assert!(provider.is_imported("kjv").await.unwrap());
        assert!(!provider.is_imported("web").await.unwrap());
    }
}
