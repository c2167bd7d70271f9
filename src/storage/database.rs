//! SQLite database operations for versebase
//!
//! This module is the persistent store adapter: a thin deterministic
//! wrapper over embedded SQLite exposing per-collection CRUD, compound
//! secondary-index lookups and a lazy cursor scan. No retry policy lives
//! here; callers decide whether a failed operation is worth re-running.

use crate::error::{Result, VersebaseError};
use crate::storage::records::{Annotation, ChapterBookmark, NoteType, TextUnit};
use crate::storage::schema::*;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating or upgrading on first use) a database at the given path.
    ///
    /// Fails with `StorageUnavailable` when the environment denies access;
    /// callers surface a degraded mode rather than crash.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| VersebaseError::StorageUnavailable(format!("Failed to open database: {}", e)))?;

        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            VersebaseError::StorageUnavailable(format!("Failed to create in-memory database: {}", e))
        })?;

        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        // Enable WAL mode for better concurrency
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| VersebaseError::Storage(format!("Failed to enable WAL mode: {}", e)))?;

        for (sql, what) in [
            (CREATE_TEXT_UNITS_TABLE, "text_units table"),
            (CREATE_ANNOTATIONS_TABLE, "annotations table"),
            (CREATE_CHAPTER_BOOKMARKS_TABLE, "chapter_bookmarks table"),
            (CREATE_SETTINGS_TABLE, "settings table"),
            (CREATE_METADATA_TABLE, "metadata table"),
        ] {
            self.conn
                .execute(sql, [])
                .map_err(|e| VersebaseError::Storage(format!("Failed to create {}: {}", what, e)))?;
        }

        self.conn
            .execute_batch(CREATE_INDEXES)
            .map_err(|e| VersebaseError::Storage(format!("Failed to create indexes: {}", e)))?;

        // Set schema version
        self.conn
            .execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)",
                params![SCHEMA_VERSION.to_string()],
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to set schema version: {}", e)))?;

        log::info!("Database initialized with schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    // ---- text units ----

    /// Count the text units in one collection
    pub fn unit_count(&self, collection_id: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM text_units WHERE collection_id = ?",
                params![collection_id],
                |row| row.get(0),
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to count units: {}", e)))?;

        Ok(count as usize)
    }

    /// Upsert a batch of text units in a single transaction.
    ///
    /// All-or-nothing: on failure nothing is visible and the error is
    /// `TransactionAborted`. Keyed by `(collection_id, unit_key)`, so
    /// re-running the same batch overwrites rather than duplicates.
    pub fn upsert_units(&mut self, units: &[TextUnit]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| VersebaseError::Storage(format!("Failed to start transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT OR REPLACE INTO text_units (collection_id, unit_key, book, chapter, verse, text)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .map_err(|e| VersebaseError::Storage(format!("Failed to prepare statement: {}", e)))?;

            for unit in units {
                stmt.execute(params![
                    unit.collection_id,
                    unit.key,
                    unit.book,
                    unit.chapter as i64,
                    unit.verse as i64,
                    unit.text,
                ])
                .map_err(|e| {
                    VersebaseError::TransactionAborted(format!(
                        "Failed to upsert unit {}: {}",
                        unit.key, e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| VersebaseError::TransactionAborted(format!("Failed to commit: {}", e)))?;

        log::info!("Upserted {} text units", units.len());
        Ok(())
    }

    /// Point lookup of one text unit by composite key
    pub fn get_unit(&self, collection_id: &str, key: &str) -> Result<Option<TextUnit>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, text
                 FROM text_units WHERE collection_id = ? AND unit_key = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let unit = stmt
            .query_row(params![collection_id, key], Self::row_to_unit)
            .optional()
            .map_err(|e| VersebaseError::Storage(format!("Failed to query unit: {}", e)))?;

        Ok(unit)
    }

    /// Equality lookup on the `(collection_id, book, chapter)` compound index.
    ///
    /// Row order follows the index and is not guaranteed to be verse order;
    /// callers that need verse order sort explicitly.
    pub fn units_by_chapter(
        &self,
        collection_id: &str,
        book: &str,
        chapter: u32,
    ) -> Result<Vec<TextUnit>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, text
                 FROM text_units WHERE collection_id = ? AND book = ? AND chapter = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection_id, book, chapter as i64], Self::row_to_unit)
            .map_err(|e| VersebaseError::Storage(format!("Failed to query chapter: {}", e)))?;

        let mut result = Vec::new();
        for unit in rows {
            result.push(
                unit.map_err(|e| VersebaseError::Storage(format!("Failed to read unit row: {}", e)))?,
            );
        }

        Ok(result)
    }

    /// Cursor scan over one collection in primary-key order.
    ///
    /// Visits rows lazily, keeps the ones `predicate` accepts and stops as
    /// soon as `limit` matches are collected; the remainder of the cursor
    /// is abandoned, so a capped scan never materializes the collection.
    /// This is the mechanism behind substring search - no text index exists.
    pub fn scan_units<F>(&self, collection_id: &str, predicate: F, limit: usize) -> Result<Vec<TextUnit>>
    where
        F: Fn(&TextUnit) -> bool,
    {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, text
                 FROM text_units WHERE collection_id = ? ORDER BY unit_key",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare scan: {}", e)))?;

        let rows = stmt
            .query_map(params![collection_id], Self::row_to_unit)
            .map_err(|e| VersebaseError::Storage(format!("Failed to open scan cursor: {}", e)))?;

        let mut matches = Vec::new();
        for unit in rows {
            if matches.len() >= limit {
                break;
            }
            let unit = unit
                .map_err(|e| VersebaseError::Storage(format!("Failed to read unit row: {}", e)))?;
            if predicate(&unit) {
                matches.push(unit);
            }
        }

        Ok(matches)
    }

    // ---- annotations ----

    /// Point lookup of one annotation by composite key
    pub fn get_annotation(&self, collection_id: &str, key: &str) -> Result<Option<Annotation>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, color, underline, bold,
                        bookmarked, note, note_type, note_favorite, updated_at
                 FROM annotations WHERE collection_id = ? AND unit_key = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let annotation = stmt
            .query_row(params![collection_id, key], Self::row_to_annotation)
            .optional()
            .map_err(|e| VersebaseError::Storage(format!("Failed to query annotation: {}", e)))?;

        Ok(annotation)
    }

    /// Upsert one annotation by primary key
    pub fn upsert_annotation(&self, annotation: &Annotation) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO annotations
                    (collection_id, unit_key, book, chapter, verse, color, underline, bold,
                     bookmarked, note, note_type, note_favorite, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    annotation.collection_id,
                    annotation.key,
                    annotation.book,
                    annotation.chapter as i64,
                    annotation.verse as i64,
                    annotation.color,
                    annotation.underline,
                    annotation.bold,
                    annotation.bookmarked,
                    annotation.note,
                    annotation.note_type.as_str(),
                    annotation.note_favorite,
                    annotation.updated_at,
                ],
            )
            .map_err(|e| {
                VersebaseError::Storage(format!("Failed to upsert annotation {}: {}", annotation.key, e))
            })?;

        Ok(())
    }

    /// Equality lookup of a chapter's annotations on the compound index
    pub fn annotations_by_chapter(
        &self,
        collection_id: &str,
        book: &str,
        chapter: u32,
    ) -> Result<Vec<Annotation>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, color, underline, bold,
                        bookmarked, note, note_type, note_favorite, updated_at
                 FROM annotations WHERE collection_id = ? AND book = ? AND chapter = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(
                params![collection_id, book, chapter as i64],
                Self::row_to_annotation,
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to query annotations: {}", e)))?;

        let mut result = Vec::new();
        for annotation in rows {
            result.push(annotation.map_err(|e| {
                VersebaseError::Storage(format!("Failed to read annotation row: {}", e))
            })?);
        }

        Ok(result)
    }

    /// All annotations for one collection (full scan, filtered client-side
    /// by listing queries)
    pub fn annotations_for_collection(&self, collection_id: &str) -> Result<Vec<Annotation>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT collection_id, unit_key, book, chapter, verse, color, underline, bold,
                        bookmarked, note, note_type, note_favorite, updated_at
                 FROM annotations WHERE collection_id = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection_id], Self::row_to_annotation)
            .map_err(|e| VersebaseError::Storage(format!("Failed to query annotations: {}", e)))?;

        let mut result = Vec::new();
        for annotation in rows {
            result.push(annotation.map_err(|e| {
                VersebaseError::Storage(format!("Failed to read annotation row: {}", e))
            })?);
        }

        Ok(result)
    }

    // ---- chapter bookmarks ----

    /// Point lookup of one chapter bookmark
    pub fn get_bookmark(&self, key: &str) -> Result<Option<ChapterBookmark>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT bookmark_key, collection_id, book, chapter, saved_at
                 FROM chapter_bookmarks WHERE bookmark_key = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let bookmark = stmt
            .query_row(params![key], Self::row_to_bookmark)
            .optional()
            .map_err(|e| VersebaseError::Storage(format!("Failed to query bookmark: {}", e)))?;

        Ok(bookmark)
    }

    /// Upsert one chapter bookmark by primary key
    pub fn put_bookmark(&self, bookmark: &ChapterBookmark) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO chapter_bookmarks (bookmark_key, collection_id, book, chapter, saved_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    bookmark.key,
                    bookmark.collection_id,
                    bookmark.book,
                    bookmark.chapter as i64,
                    bookmark.saved_at,
                ],
            )
            .map_err(|e| {
                VersebaseError::Storage(format!("Failed to put bookmark {}: {}", bookmark.key, e))
            })?;

        Ok(())
    }

    /// Delete one chapter bookmark. Idempotent: deleting a key that does
    /// not exist is a no-op success, not an error.
    pub fn delete_bookmark(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM chapter_bookmarks WHERE bookmark_key = ?", params![key])
            .map_err(|e| VersebaseError::Storage(format!("Failed to delete bookmark {}: {}", key, e)))?;

        Ok(())
    }

    /// All chapter bookmarks for one collection
    pub fn bookmarks_for_collection(&self, collection_id: &str) -> Result<Vec<ChapterBookmark>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT bookmark_key, collection_id, book, chapter, saved_at
                 FROM chapter_bookmarks WHERE collection_id = ?",
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection_id], Self::row_to_bookmark)
            .map_err(|e| VersebaseError::Storage(format!("Failed to query bookmarks: {}", e)))?;

        let mut result = Vec::new();
        for bookmark in rows {
            result.push(bookmark.map_err(|e| {
                VersebaseError::Storage(format!("Failed to read bookmark row: {}", e))
            })?);
        }

        Ok(result)
    }

    // ---- settings ----

    /// Read one setting value
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| VersebaseError::Storage(format!("Failed to query setting: {}", e)))?;

        Ok(value)
    }

    /// Write one setting value, last-write-wins
    pub fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                params![key, value],
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to put setting {}: {}", key, e)))?;

        Ok(())
    }

    // ---- stats ----

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let unit_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM text_units", [], |row| row.get(0))
            .map_err(|e| VersebaseError::Storage(format!("Failed to count units: {}", e)))?;

        let annotation_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))
            .map_err(|e| VersebaseError::Storage(format!("Failed to count annotations: {}", e)))?;

        let bookmark_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chapter_bookmarks", [], |row| row.get(0))
            .map_err(|e| VersebaseError::Storage(format!("Failed to count bookmarks: {}", e)))?;

        let file_size: i64 = self
            .conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to get database size: {}", e)))?;

        Ok(DatabaseStats {
            unit_count: unit_count as usize,
            annotation_count: annotation_count as usize,
            bookmark_count: bookmark_count as usize,
            file_size_bytes: file_size as usize,
        })
    }

    // ---- row mapping helpers ----

    fn row_to_unit(row: &Row) -> rusqlite::Result<TextUnit> {
        Ok(TextUnit {
            collection_id: row.get(0)?,
            key: row.get(1)?,
            book: row.get(2)?,
            chapter: row.get::<_, i64>(3)? as u32,
            verse: row.get::<_, i64>(4)? as u32,
            text: row.get(5)?,
        })
    }

    fn row_to_annotation(row: &Row) -> rusqlite::Result<Annotation> {
        Ok(Annotation {
            collection_id: row.get(0)?,
            key: row.get(1)?,
            book: row.get(2)?,
            chapter: row.get::<_, i64>(3)? as u32,
            verse: row.get::<_, i64>(4)? as u32,
            color: row.get(5)?,
            underline: row.get(6)?,
            bold: row.get(7)?,
            bookmarked: row.get(8)?,
            note: row.get(9)?,
            note_type: NoteType::from_str_or_default(&row.get::<_, String>(10)?),
            note_favorite: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn row_to_bookmark(row: &Row) -> rusqlite::Result<ChapterBookmark> {
        Ok(ChapterBookmark {
            key: row.get(0)?,
            collection_id: row.get(1)?,
            book: row.get(2)?,
            chapter: row.get::<_, i64>(3)? as u32,
            saved_at: row.get(4)?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub unit_count: usize,
    pub annotation_count: usize,
    pub bookmark_count: usize,
    pub file_size_bytes: usize,
}
