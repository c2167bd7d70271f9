//! Record types for the persistent collections
//!
//! One struct per stored collection. Keys are composite locator strings
//! built by [`crate::keys`]; the collection discriminator is carried as
//! its own field so lookups join in O(1) without scans.

use crate::keys;
use serde::{Deserialize, Serialize};

/// One addressable unit of source text (a verse) at a given locator.
///
/// Immutable once imported; re-import overwrites by key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextUnit {
    /// Composite key `"<book>|<chapter>|<verse>"`, unique within a collection
    pub key: String,

    /// Collection (translation/edition) this unit belongs to
    pub collection_id: String,

    /// Canonical book name
    pub book: String,

    /// 1-based chapter ordinal
    pub chapter: u32,

    /// 1-based verse ordinal
    pub verse: u32,

    /// Normalized verse text
    pub text: String,
}

impl TextUnit {
    pub fn new(collection_id: &str, book: &str, chapter: u32, verse: u32, text: String) -> Self {
        Self {
            key: keys::unit_key(book, chapter, verse),
            collection_id: collection_id.to_string(),
            book: book.to_string(),
            chapter,
            verse,
            text,
        }
    }
}

/// Category of a user note
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Study,
    Research,
    Personal,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Study => "study",
            NoteType::Research => "research",
            NoteType::Personal => "personal",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "research" => NoteType::Research,
            "personal" => NoteType::Personal,
            _ => NoteType::Study,
        }
    }
}

/// User-authored decoration attached to one text unit.
///
/// Keyed identically to the unit it annotates. Absence in storage means
/// "no annotation"; a record only exists after the first explicit write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    /// Same composite key as the decorated text unit
    pub key: String,

    /// Collection discriminator
    pub collection_id: String,

    /// Canonical book name
    pub book: String,

    /// 1-based chapter ordinal
    pub chapter: u32,

    /// 1-based verse ordinal
    pub verse: u32,

    /// Highlight color name, `"none"` when unhighlighted
    pub color: String,

    pub underline: bool,

    pub bold: bool,

    /// Verse-level bookmark flag (distinct from chapter bookmarks)
    pub bookmarked: bool,

    /// User note text, empty when absent
    pub note: String,

    pub note_type: NoteType,

    pub note_favorite: bool,

    /// Unix-millis timestamp, overwritten on every save (last-writer-wins)
    pub updated_at: i64,
}

impl Annotation {
    /// The default annotation contract, defined in exactly one place.
    ///
    /// This is what an upsert merges its patch over when no record exists
    /// yet for the locator.
    pub fn default_for(collection_id: &str, book: &str, chapter: u32, verse: u32) -> Self {
        Self {
            key: keys::unit_key(book, chapter, verse),
            collection_id: collection_id.to_string(),
            book: book.to_string(),
            chapter,
            verse,
            color: "none".to_string(),
            underline: false,
            bold: false,
            bookmarked: false,
            note: String::new(),
            note_type: NoteType::Study,
            note_favorite: false,
            updated_at: 0,
        }
    }

    /// Shallow-merge a patch over this record. Unset patch fields keep
    /// the current value; the timestamp is stamped by the caller.
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(underline) = patch.underline {
            self.underline = underline;
        }
        if let Some(bold) = patch.bold {
            self.bold = bold;
        }
        if let Some(bookmarked) = patch.bookmarked {
            self.bookmarked = bookmarked;
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(note_type) = patch.note_type {
            self.note_type = note_type;
        }
        if let Some(note_favorite) = patch.note_favorite {
            self.note_favorite = note_favorite;
        }
    }

    /// True when any style or note content is set, i.e. the record carries
    /// something beyond the defaults.
    pub fn is_decorated(&self) -> bool {
        self.color != "none"
            || self.underline
            || self.bold
            || self.bookmarked
            || !self.note.is_empty()
            || self.note_favorite
    }
}

/// Partial update for an annotation upsert. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct AnnotationPatch {
    pub color: Option<String>,
    pub underline: Option<bool>,
    pub bold: Option<bool>,
    pub bookmarked: Option<bool>,
    pub note: Option<String>,
    pub note_type: Option<NoteType>,
    pub note_favorite: Option<bool>,
}

/// Chapter-level bookmark. Presence/absence only - toggling is the sole
/// mutation, there is no count or history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterBookmark {
    /// Composite key `"<collection>|<book>|<chapter>"`
    pub key: String,

    pub collection_id: String,

    pub book: String,

    pub chapter: u32,

    /// Unix-millis timestamp of when the bookmark was set
    pub saved_at: i64,
}

impl ChapterBookmark {
    pub fn new(collection_id: &str, book: &str, chapter: u32, saved_at: i64) -> Self {
        Self {
            key: keys::chapter_bookmark_key(collection_id, book, chapter),
            collection_id: collection_id.to_string(),
            book: book.to_string(),
            chapter,
            saved_at,
        }
    }
}
