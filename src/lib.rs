//! # versebase
//!
//! An offline-first, verse-addressed text store: imports book/chapter/verse
//! XML documents into embedded SQLite, serves chapter views with per-verse
//! user annotations merged on top, and answers capped substring searches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use versebase::{Config, VerseProvider, AnnotationPatch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open (or create) the local store
//!     let mut provider = VerseProvider::open(Config::default()).await?;
//!
//!     // Import a source document once
//!     if !provider.is_imported("kjv").await? {
//!         let xml = provider.fetch_source("sources/kjv.xml").await?;
//!         let stats = provider.import_source("kjv", &xml, None).await?;
//!         println!("Imported {} verses", stats.verse_count);
//!     }
//!
//!     // Read a chapter and decorate a verse
//!     let chapter = provider.get_chapter("kjv", "Genesis", 1).await?;
//!     println!("{} verses", chapter.len());
//!
//!     provider.upsert_annotation("kjv", "Genesis", 1, 1, &AnnotationPatch {
//!         note: Some("Opening words".to_string()),
//!         ..Default::default()
//!     }).await?;
//!
//!     // Search the whole collection
//!     let hits = provider.search("kjv", "light", 120).await?;
//!     for unit in hits {
//!         println!("{}: {}", unit.key, unit.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod canon;
pub mod config;
pub mod error;
pub mod importer;
pub mod keys;
pub mod packs;
pub mod storage;
pub mod utils;

// Re-export main API types
pub use api::{AnnotationFilter, BookmarkToggle, ProviderStats, VerseProvider};
pub use config::Config;
pub use error::{Result, VersebaseError};

// Re-export commonly used types
pub use importer::{ImportStats, SourceImporter};
pub use packs::{CrossReference, VerseInsight};
pub use storage::{Annotation, AnnotationPatch, ChapterBookmark, NoteType, TextUnit};
