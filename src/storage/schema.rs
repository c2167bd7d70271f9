//! Database schema definitions

/// Database schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL for creating the text units table.
///
/// All translations share one table discriminated by `collection_id`;
/// a new translation is therefore pure data and can never disturb the
/// rows of an existing one.
pub const CREATE_TEXT_UNITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS text_units (
    collection_id TEXT NOT NULL,
    unit_key TEXT NOT NULL,
    book TEXT NOT NULL,
    chapter INTEGER NOT NULL,
    verse INTEGER NOT NULL,
    text TEXT NOT NULL,
    PRIMARY KEY (collection_id, unit_key)
);
"#;

/// SQL for creating the annotations table
pub const CREATE_ANNOTATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS annotations (
    collection_id TEXT NOT NULL,
    unit_key TEXT NOT NULL,
    book TEXT NOT NULL,
    chapter INTEGER NOT NULL,
    verse INTEGER NOT NULL,
    color TEXT NOT NULL DEFAULT 'none',
    underline INTEGER NOT NULL DEFAULT 0,
    bold INTEGER NOT NULL DEFAULT 0,
    bookmarked INTEGER NOT NULL DEFAULT 0,
    note TEXT NOT NULL DEFAULT '',
    note_type TEXT NOT NULL DEFAULT 'study',
    note_favorite INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (collection_id, unit_key)
);
"#;

/// SQL for creating the chapter bookmarks table
pub const CREATE_CHAPTER_BOOKMARKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chapter_bookmarks (
    bookmark_key TEXT PRIMARY KEY,
    collection_id TEXT NOT NULL,
    book TEXT NOT NULL,
    chapter INTEGER NOT NULL,
    saved_at INTEGER NOT NULL
);
"#;

/// SQL for creating the settings table
pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQL for creating the metadata table
pub const CREATE_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQL for creating secondary indexes.
///
/// The compound `(collection_id, book, chapter)` indexes serve the
/// chapter range queries; `updated_at` serves recency-ordered listings.
pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_text_units_chapter ON text_units(collection_id, book, chapter);
CREATE INDEX IF NOT EXISTS idx_annotations_chapter ON annotations(collection_id, book, chapter);
CREATE INDEX IF NOT EXISTS idx_annotations_updated_at ON annotations(updated_at);
CREATE INDEX IF NOT EXISTS idx_chapter_bookmarks_collection ON chapter_bookmarks(collection_id);
"#;
