//! versebase CLI application
//!
//! Command-line interface for the versebase library. Stands in for the
//! presentation layer and talks only to the provider surface.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use versebase::{
    AnnotationFilter, AnnotationPatch, BookmarkToggle, Config, NoteType, VerseProvider,
};

#[derive(Parser)]
#[command(name = "versebase")]
#[command(about = "An offline-first verse-addressed text store with annotations and search")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "versebase.db")]
    db: PathBuf,

    /// Directory holding the bundled reference packs
    #[arg(long, global = true, default_value = "packs")]
    packs_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a source document into a collection
    Import {
        /// Source document: a file path or an http(s) URL
        source: String,

        /// Target collection identifier (e.g. "kjv")
        #[arg(short, long)]
        collection: String,

        /// Re-import even if the collection already has rows
        #[arg(long)]
        force: bool,
    },

    /// Print one chapter with its annotations merged in
    Chapter {
        #[arg(short, long)]
        collection: String,

        book: String,

        chapter: u32,
    },

    /// Substring search within a collection
    Search {
        #[arg(short, long)]
        collection: String,

        /// Search query
        query: String,

        /// Maximum number of results to collect
        #[arg(long, default_value = "120")]
        cap: usize,
    },

    /// Create or update an annotation on one verse
    Annotate {
        #[arg(short, long)]
        collection: String,

        book: String,
        chapter: u32,
        verse: u32,

        /// Highlight color name ("none" clears the highlight)
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        underline: bool,

        /// Set the verse-level bookmark flag
        #[arg(long)]
        bookmark: bool,

        /// Note text
        #[arg(long)]
        note: Option<String>,

        /// Note category: study, research or personal
        #[arg(long)]
        note_type: Option<String>,

        /// Mark the note as favorite
        #[arg(long)]
        favorite: bool,
    },

    /// Toggle the chapter-level bookmark
    Bookmark {
        #[arg(short, long)]
        collection: String,

        book: String,
        chapter: u32,
    },

    /// List current chapter bookmarks
    Bookmarks {
        #[arg(short, long)]
        collection: String,
    },

    /// List annotations with notes
    Notes {
        #[arg(short, long)]
        collection: String,

        /// Only favorite notes
        #[arg(long)]
        favorites: bool,

        /// Only notes of this category
        #[arg(long)]
        note_type: Option<String>,

        /// Show up to the "all" limit instead of the "recent" limit
        #[arg(long)]
        all: bool,
    },

    /// Write a user preference
    Set { key: String, value: String },

    /// Read a user preference
    Get { key: String },

    /// Show store statistics
    Stats,
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();
    config.storage.database_path = cli.db.clone();
    config.packs.dir = cli.packs_dir.clone();
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    match &cli.command {
        Commands::Import {
            source,
            collection,
            force,
        } => import_command(config, source, collection, *force).await?,
        Commands::Chapter {
            collection,
            book,
            chapter,
        } => chapter_command(config, collection, book, *chapter).await?,
        Commands::Search {
            collection,
            query,
            cap,
        } => search_command(config, collection, query, *cap).await?,
        Commands::Annotate {
            collection,
            book,
            chapter,
            verse,
            color,
            bold,
            underline,
            bookmark,
            note,
            note_type,
            favorite,
        } => {
            let patch = AnnotationPatch {
                color: color.clone(),
                underline: underline.then_some(true),
                bold: bold.then_some(true),
                bookmarked: bookmark.then_some(true),
                note: note.clone(),
                note_type: note_type.as_deref().map(NoteType::from_str_or_default),
                note_favorite: favorite.then_some(true),
            };
            annotate_command(config, collection, book, *chapter, *verse, patch).await?;
        }
        Commands::Bookmark {
            collection,
            book,
            chapter,
        } => bookmark_command(config, collection, book, *chapter).await?,
        Commands::Bookmarks { collection } => bookmarks_command(config, collection).await?,
        Commands::Notes {
            collection,
            favorites,
            note_type,
            all,
        } => notes_command(config, collection, *favorites, note_type.as_deref(), *all).await?,
        Commands::Set { key, value } => {
            let mut provider = VerseProvider::open(config).await?;
            provider.put_setting(key, value).await?;
            println!("✅ {} = {}", key, value);
        }
        Commands::Get { key } => {
            let provider = VerseProvider::open(config).await?;
            match provider.get_setting(key).await? {
                Some(value) => println!("{}", value),
                None => println!("(unset)"),
            }
        }
        Commands::Stats => stats_command(config).await?,
    }

    Ok(())
}

async fn import_command(
    config: Config,
    source: &str,
    collection: &str,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut provider = VerseProvider::open(config).await?;

    if !force && provider.is_imported(collection).await? {
        println!("✅ Collection '{}' already imported (use --force to re-import)", collection);
        return Ok(());
    }

    println!("📥 Importing {} into '{}'...", source, collection);

    let xml = provider.fetch_source(source).await?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("progress template is valid"),
    );
    let progress_bar = bar.clone();
    let progress = move |count: usize| {
        progress_bar.set_message(format!("{} verses processed", count));
        progress_bar.tick();
    };

    let stats = provider
        .import_source(collection, &xml, Some(&progress))
        .await?;
    bar.finish_and_clear();

    println!("✅ Import complete!");
    println!("   📖 Books: {}", stats.book_count);
    println!("   📊 Verses: {}", stats.verse_count);
    println!("   ⏱️  Time: {:.2}s", stats.processing_time);

    Ok(())
}

async fn chapter_command(
    config: Config,
    collection: &str,
    book: &str,
    chapter: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = VerseProvider::open(config).await?;

    if versebase::canon::ordinal_for_name(book).is_none() {
        println!("⚠️  '{}' is not a canonical book name", book);
    }

    let units = provider.get_chapter(collection, book, chapter).await?;
    if units.is_empty() {
        println!("❌ No text for {} {} in '{}'", book, chapter, collection);
        return Ok(());
    }

    let annotations = provider
        .annotations_for_chapter(collection, book, chapter)
        .await?;

    println!("📖 {} {} ({} verses)", book, chapter, units.len());
    println!();

    for unit in &units {
        let mut markers = String::new();
        if let Some(annotation) = annotations.get(&unit.key) {
            if annotation.color != "none" {
                markers.push_str(&format!(" [{}]", annotation.color));
            }
            if annotation.bookmarked {
                markers.push_str(" 🔖");
            }
            if !annotation.note.is_empty() {
                markers.push_str(" 📝");
            }
        }
        println!("{:>3}. {}{}", unit.verse, unit.text, markers);
    }

    Ok(())
}

async fn search_command(
    config: Config,
    collection: &str,
    query: &str,
    cap: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Searching for: \"{}\"", query);

    let provider = VerseProvider::open(config).await?;
    let results = provider.search(collection, query, cap).await?;

    if results.is_empty() {
        println!("❌ No results found");
        return Ok(());
    }

    println!("📋 Found {} results:", results.len());
    println!();

    for unit in &results {
        println!("{} {}:{} - {}", unit.book, unit.chapter, unit.verse, unit.text);
    }

    Ok(())
}

async fn annotate_command(
    config: Config,
    collection: &str,
    book: &str,
    chapter: u32,
    verse: u32,
    patch: AnnotationPatch,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut provider = VerseProvider::open(config).await?;

    let annotation = provider
        .upsert_annotation(collection, book, chapter, verse, &patch)
        .await?;

    println!("✅ Annotated {} {}:{}", book, chapter, verse);
    if annotation.color != "none" {
        println!("   🎨 Color: {}", annotation.color);
    }
    if !annotation.note.is_empty() {
        println!(
            "   📝 Note ({}): {}",
            annotation.note_type.as_str(),
            annotation.note
        );
    }

    Ok(())
}

async fn bookmark_command(
    config: Config,
    collection: &str,
    book: &str,
    chapter: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut provider = VerseProvider::open(config).await?;

    match provider
        .toggle_chapter_bookmark(collection, book, chapter)
        .await?
    {
        BookmarkToggle::Added => println!("🔖 Bookmarked {} {}", book, chapter),
        BookmarkToggle::Removed => println!("❌ Removed bookmark for {} {}", book, chapter),
    }

    Ok(())
}

async fn bookmarks_command(
    config: Config,
    collection: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = VerseProvider::open(config).await?;

    let bookmarks = provider.list_bookmarks(collection).await?;
    if bookmarks.is_empty() {
        println!("No bookmarks in '{}'", collection);
        return Ok(());
    }

    println!("🔖 {} bookmarks:", bookmarks.len());
    for bookmark in &bookmarks {
        println!("   {} {}", bookmark.book, bookmark.chapter);
    }

    Ok(())
}

async fn notes_command(
    config: Config,
    collection: &str,
    favorites: bool,
    note_type: Option<&str>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = VerseProvider::open(config).await?;

    let filter = if favorites {
        AnnotationFilter::FavoriteNotes
    } else if let Some(nt) = note_type {
        AnnotationFilter::NotesOfType(NoteType::from_str_or_default(nt))
    } else {
        AnnotationFilter::Notes
    };

    let limit = if all {
        provider.config().listing.all_limit
    } else {
        provider.config().listing.recent_limit
    };

    let notes = provider.list_annotations(collection, filter, limit).await?;
    if notes.is_empty() {
        println!("No matching notes in '{}'", collection);
        return Ok(());
    }

    println!("📝 {} notes:", notes.len());
    for annotation in &notes {
        let favorite = if annotation.note_favorite { " ⭐" } else { "" };
        println!(
            "   {} {}:{} ({}){} - {}",
            annotation.book,
            annotation.chapter,
            annotation.verse,
            annotation.note_type.as_str(),
            favorite,
            annotation.note
        );
    }

    Ok(())
}

async fn stats_command(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let provider = VerseProvider::open(config).await?;
    let stats = provider.get_stats()?;

    println!("📊 Store statistics:");
    println!("   📖 Text units: {}", stats.unit_count);
    println!("   📝 Annotations: {}", stats.annotation_count);
    println!("   🔖 Bookmarks: {}", stats.bookmark_count);
    println!(
        "   💾 Database size: {}",
        versebase::utils::format_file_size(stats.database_size_bytes as u64)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        // Test that CLI parsing works
        let cli = Cli::try_parse_from(["versebase", "import", "kjv.xml", "--collection", "kjv"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_global_db_arg() {
        let cli =
            Cli::try_parse_from(["versebase", "--db", "other.db", "stats"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("other.db"));
    }
}
