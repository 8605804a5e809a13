//! Zotero library access
//!
//! Locates the data directory, finds the book's EPUB attachment and writes
//! highlight annotations into `zotero.sqlite`.

mod library;
mod prefs;
mod writer;

pub use library::{find_epub, identifier_tokens, jaccard, BookMatch, EpubAttachment, MatchMethod};
pub use prefs::{find_prefs_file, profiles_dir, read_pref, ZoteroPaths, ZoteroPrefs};
pub use writer::{
    backup_database, generate_key, position_json, AnnotationWriter, InsertOutcome, NewAnnotation,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Open an existing Zotero database
///
/// A short busy timeout makes a running Zotero show up as a locked database
/// instead of a hang.
pub async fn open_database(path: &Path) -> Result<SqlitePool> {
    if !path.is_file() {
        return Err(AppError::NotFound(format!("database {}", path.display())));
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false)
        .busy_timeout(Duration::from_secs(2));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Minimal Zotero schema and fixtures for tests
#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
    use tempfile::TempDir;

    const SCHEMA_SQL: &str = r#"
CREATE TABLE items (
    itemID INTEGER PRIMARY KEY,
    itemTypeID INT NOT NULL,
    dateAdded TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    dateModified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    clientDateModified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    libraryID INT NOT NULL,
    key TEXT NOT NULL,
    version INT NOT NULL DEFAULT 0,
    synced INT NOT NULL DEFAULT 0,
    UNIQUE (libraryID, key)
);

CREATE TABLE itemAttachments (
    itemID INTEGER PRIMARY KEY,
    parentItemID INT,
    linkMode INT,
    contentType TEXT,
    path TEXT
);

CREATE TABLE itemAnnotations (
    itemID INTEGER PRIMARY KEY,
    parentItemID INT NOT NULL,
    type INTEGER NOT NULL,
    authorName TEXT,
    text TEXT,
    comment TEXT,
    color TEXT,
    pageLabel TEXT,
    sortIndex TEXT NOT NULL,
    position TEXT NOT NULL,
    isExternal INT NOT NULL
);

CREATE TABLE creators (
    creatorID INTEGER PRIMARY KEY,
    firstName TEXT,
    lastName TEXT,
    fieldMode INT
);

CREATE TABLE itemCreators (
    itemID INT NOT NULL,
    creatorID INT NOT NULL,
    creatorTypeID INT NOT NULL DEFAULT 1,
    orderIndex INT NOT NULL DEFAULT 0
);

CREATE TABLE itemData (
    itemID INT,
    fieldID INT,
    valueID INT
);

CREATE TABLE itemDataValues (
    valueID INTEGER PRIMARY KEY,
    value UNIQUE
);
"#;

    /// A fresh database file with the schema; keep the `TempDir` alive
    pub async fn test_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("zotero.sqlite"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(SCHEMA_SQL).execute(&pool).await.unwrap();
        (dir, pool)
    }

    /// Add a book item `parent_id` with an EPUB attachment `parent_id + 1`
    pub async fn add_epub(
        pool: &SqlitePool,
        parent_id: i64,
        key: &str,
        path: &str,
        title: &str,
        creators: &[(&str, &str)],
    ) {
        sqlx::query("INSERT INTO items (itemID, itemTypeID, libraryID, key) VALUES (?, 2, 1, ?)")
            .bind(parent_id)
            .bind(format!("P{}", &key[1..]))
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO items (itemID, itemTypeID, libraryID, key) VALUES (?, 3, 1, ?)")
            .bind(parent_id + 1)
            .bind(key)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO itemAttachments (itemID, parentItemID, linkMode, contentType, path) VALUES (?, ?, 0, 'application/epub+zip', ?)",
        )
        .bind(parent_id + 1)
        .bind(parent_id)
        .bind(path)
        .execute(pool)
        .await
        .unwrap();

        let value_id = sqlx::query("INSERT INTO itemDataValues (value) VALUES (?)")
            .bind(title)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO itemData (itemID, fieldID, valueID) VALUES (?, 1, ?)")
            .bind(parent_id)
            .bind(value_id)
            .execute(pool)
            .await
            .unwrap();

        for (index, (last, first)) in creators.iter().enumerate() {
            let creator_id = sqlx::query("INSERT INTO creators (firstName, lastName, fieldMode) VALUES (?, ?, 0)")
                .bind(first)
                .bind(last)
                .execute(pool)
                .await
                .unwrap()
                .last_insert_rowid();
            sqlx::query("INSERT INTO itemCreators (itemID, creatorID, orderIndex) VALUES (?, ?, ?)")
                .bind(parent_id)
                .bind(creator_id)
                .bind(index as i64)
                .execute(pool)
                .await
                .unwrap();
        }
    }
}
