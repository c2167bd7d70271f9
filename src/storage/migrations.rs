//! Database migrations and compatibility
//!
//! Schema upgrades are additive and non-destructive: a migration may add
//! tables, columns or indexes, never drop or rewrite existing collections.

use crate::error::{Result, VersebaseError};
use crate::storage::schema::*;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Database migration manager
pub struct MigrationManager {
    db_path: String,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new("versebase.db")
    }
}

impl MigrationManager {
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
        }
    }

    /// Run all pending migrations
    pub fn run_migrations(&self) -> Result<()> {
        if !Path::new(&self.db_path).exists() {
            self.create_initial_schema()?;
        } else {
            self.apply_pending_migrations()?;
        }
        Ok(())
    }

    /// Create initial database schema
    fn create_initial_schema(&self) -> Result<()> {
        log::info!("Creating initial database schema at: {}", self.db_path);

        let connection = Connection::open(&self.db_path)
            .map_err(|e| VersebaseError::StorageUnavailable(format!("Failed to create database: {}", e)))?;

        // Migration tracking table
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS migrations (
                    id INTEGER PRIMARY KEY,
                    version TEXT NOT NULL UNIQUE,
                    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to create migrations table: {}", e)))?;

        for (sql, what) in [
            (CREATE_TEXT_UNITS_TABLE, "text_units table"),
            (CREATE_ANNOTATIONS_TABLE, "annotations table"),
            (CREATE_CHAPTER_BOOKMARKS_TABLE, "chapter_bookmarks table"),
            (CREATE_SETTINGS_TABLE, "settings table"),
            (CREATE_METADATA_TABLE, "metadata table"),
        ] {
            connection
                .execute(sql, [])
                .map_err(|e| VersebaseError::Storage(format!("Failed to create {}: {}", what, e)))?;
        }

        // Mark initial migration as applied
        connection
            .execute("INSERT INTO migrations (version) VALUES (?)", ["initial_schema"])
            .map_err(|e| VersebaseError::Storage(format!("Failed to record initial migration: {}", e)))?;

        log::info!("Initial database schema created successfully");
        Ok(())
    }

    /// Apply any pending migrations
    fn apply_pending_migrations(&self) -> Result<()> {
        let connection = Connection::open(&self.db_path)
            .map_err(|e| VersebaseError::StorageUnavailable(format!("Failed to open database: {}", e)))?;

        // Older databases predate the tracking table
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS migrations (
                    id INTEGER PRIMARY KEY,
                    version TEXT NOT NULL UNIQUE,
                    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )
            .map_err(|e| VersebaseError::Storage(format!("Failed to create migrations table: {}", e)))?;

        let mut stmt = connection
            .prepare("SELECT version FROM migrations ORDER BY applied_at DESC")
            .map_err(|e| VersebaseError::Storage(format!("Failed to prepare migration query: {}", e)))?;

        let migration_rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| VersebaseError::Storage(format!("Failed to execute migration query: {}", e)))?;

        let mut current_versions = Vec::new();
        for version_result in migration_rows {
            let version = version_result
                .map_err(|e| VersebaseError::Storage(format!("Failed to read migration version: {}", e)))?;
            current_versions.push(version);
        }

        // Define available migrations in order
        let available_migrations = vec![
            ("initial_schema", "Initial database schema"),
            ("add_chapter_indexes", "Add compound chapter lookup indexes"),
            ("add_recency_index", "Add annotation recency index"),
        ];

        // Apply missing migrations
        for (version, description) in available_migrations {
            if !current_versions.contains(&version.to_string()) {
                log::info!("Applying migration: {} - {}", version, description);
                self.apply_migration(&connection, version)?;

                connection
                    .execute("INSERT INTO migrations (version) VALUES (?)", [version])
                    .map_err(|e| {
                        VersebaseError::Storage(format!("Failed to record migration {}: {}", version, e))
                    })?;
            }
        }

        Ok(())
    }

    /// Apply a specific migration
    fn apply_migration(&self, connection: &Connection, version: &str) -> Result<()> {
        match version {
            "initial_schema" => {
                for sql in [
                    CREATE_TEXT_UNITS_TABLE,
                    CREATE_ANNOTATIONS_TABLE,
                    CREATE_CHAPTER_BOOKMARKS_TABLE,
                    CREATE_SETTINGS_TABLE,
                    CREATE_METADATA_TABLE,
                ] {
                    connection.execute(sql, [])?;
                }
                Ok(())
            }
            "add_chapter_indexes" => {
                connection.execute(
                    "CREATE INDEX IF NOT EXISTS idx_text_units_chapter
                     ON text_units(collection_id, book, chapter)",
                    [],
                )?;
                connection.execute(
                    "CREATE INDEX IF NOT EXISTS idx_annotations_chapter
                     ON annotations(collection_id, book, chapter)",
                    [],
                )?;
                connection.execute(
                    "CREATE INDEX IF NOT EXISTS idx_chapter_bookmarks_collection
                     ON chapter_bookmarks(collection_id)",
                    [],
                )?;
                Ok(())
            }
            "add_recency_index" => {
                connection.execute(
                    "CREATE INDEX IF NOT EXISTS idx_annotations_updated_at
                     ON annotations(updated_at)",
                    [],
                )?;
                Ok(())
            }
            _ => Err(VersebaseError::Storage(format!(
                "Unknown migration version: {}",
                version
            ))),
        }
    }

    /// Get current database version
    pub fn get_current_version(&self) -> Result<Option<String>> {
        if !Path::new(&self.db_path).exists() {
            return Ok(None);
        }

        let connection = Connection::open(&self.db_path)
            .map_err(|e| VersebaseError::StorageUnavailable(format!("Failed to open database: {}", e)))?;

        let version = connection
            .prepare("SELECT version FROM migrations ORDER BY applied_at DESC LIMIT 1")?
            .query_row([], |row| row.get::<_, String>(0))
            .optional()
            .map_err(|e| VersebaseError::Storage(format!("Failed to query current version: {}", e)))?;

        Ok(version)
    }

    /// Check if database is up to date
    pub fn is_up_to_date(&self) -> Result<bool> {
        let connection = Connection::open(&self.db_path)
            .map_err(|e| VersebaseError::StorageUnavailable(format!("Failed to open database: {}", e)))?;

        let applied: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM migrations WHERE version IN
                 ('initial_schema', 'add_chapter_indexes', 'add_recency_index')",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        Ok(applied == 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_migration_manager_creation() {
        let manager = MigrationManager::new("test.db");
        assert_eq!(manager.db_path, "test.db");
    }

    #[test]
    fn test_initial_schema_creation() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let manager = MigrationManager::new(db_path.to_str().unwrap());

        manager.run_migrations().unwrap();
        assert!(db_path.exists());

        let version = manager.get_current_version().unwrap();
        assert!(version.is_some());
    }

    #[test]
    fn test_migrations_are_additive() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let manager = MigrationManager::new(db_path.to_str().unwrap());

        manager.run_migrations().unwrap();

        // Seed a row, then re-run the full migration chain
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                "INSERT INTO text_units (collection_id, unit_key, book, chapter, verse, text)
                 VALUES ('kjv', 'Genesis|1|1', 'Genesis', 1, 1, 'In the beginning')",
                [],
            )
            .unwrap();
        }

        manager.run_migrations().unwrap();
        assert!(manager.is_up_to_date().unwrap());

        // Existing data survives every upgrade
        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM text_units", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
