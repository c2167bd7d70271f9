//! API layer for versebase
//!
//! This module provides the main public interface the presentation layer
//! consumes for reading, annotating and searching collections.

pub mod provider;

// Re-export main API types
pub use provider::{AnnotationFilter, BookmarkToggle, ProviderStats, VerseProvider};
