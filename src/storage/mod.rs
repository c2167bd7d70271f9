//! Storage functionality for versebase
//!
//! This module provides the persistent store adapter over embedded SQLite.

pub mod database;
pub mod migrations;
pub mod records;
pub mod schema;

// Re-export main types
pub use database::{Database, DatabaseStats};
pub use records::{Annotation, AnnotationPatch, ChapterBookmark, NoteType, TextUnit};
