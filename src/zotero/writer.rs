//! Annotation inserts
//!
//! All inserts of one import run share a single transaction. Each annotation
//! gets its own savepoint, so a failed insert leaves nothing behind and the
//! rest of the run carries on.

use serde::Serialize;
use sqlx::{Acquire, Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::cfi::Cfi;
use crate::config::{ANNOTATION_ITEM_TYPE_ID, HIGHLIGHT_TYPE, ZOTERO_KEY_CHARS, ZOTERO_KEY_LENGTH};
use crate::error::Result;

const CFI_CONFORMS_TO: &str = "http://www.idpf.org/epub/linking/cfi/epub-cfi.html";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FragmentSelector<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    conforms_to: &'static str,
    value: &'a str,
}

/// Zotero `position` value for an EPUB annotation
pub fn position_json(cfi: &Cfi) -> Result<String> {
    let value = cfi.to_string();
    let selector = FragmentSelector {
        kind: "FragmentSelector",
        conforms_to: CFI_CONFORMS_TO,
        value: &value,
    };
    Ok(serde_json::to_string(&selector)?)
}

/// Copy the database to `<path>.pre-import-backup`
pub fn backup_database(path: &Path) -> Result<PathBuf> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".pre-import-backup");
    let backup = PathBuf::from(backup);
    std::fs::copy(path, &backup)?;
    Ok(backup)
}

/// A random key in Zotero's alphabet
pub fn generate_key() -> String {
    // 256 is a multiple of the alphabet size, so `% len` stays uniform
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(ZOTERO_KEY_LENGTH)
        .map(|b| ZOTERO_KEY_CHARS[*b as usize % ZOTERO_KEY_CHARS.len()] as char)
        .collect()
}

/// One highlight ready to be written
#[derive(Debug, Clone)]
pub struct NewAnnotation<'a> {
    /// The EPUB attachment item the highlight belongs to
    pub parent_item_id: i64,
    pub text: &'a str,
    /// `%Y-%m-%d %H:%M:%S`
    pub date_added: &'a str,
    pub sort_index: &'a str,
    pub position: &'a str,
}

/// What happened to one annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { item_id: i64 },
    Duplicate,
    Failed,
}

/// Writes annotations inside one transaction
pub struct AnnotationWriter {
    tx: Transaction<'static, Sqlite>,
    existing_keys: HashSet<String>,
    library_id: i64,
    color: String,
}

impl AnnotationWriter {
    pub async fn begin(pool: &SqlitePool, library_id: i64, color: &str) -> Result<Self> {
        let mut tx = pool.begin().await?;
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM items")
            .fetch_all(&mut *tx)
            .await?;

        Ok(Self {
            tx,
            existing_keys: keys.into_iter().collect(),
            library_id,
            color: color.to_string(),
        })
    }

    /// Whether the same highlight was already imported
    ///
    /// Same parent item, same text and same `dateAdded`.
    pub async fn exists(&mut self, annotation: &NewAnnotation<'_>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM itemAnnotations ia
            JOIN items i ON ia.itemID = i.itemID
            WHERE ia.parentItemID = ? AND ia.text = ? AND i.dateAdded = ?
            "#,
        )
        .bind(annotation.parent_item_id)
        .bind(annotation.text)
        .bind(annotation.date_added)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count > 0)
    }

    fn unique_key(&mut self) -> String {
        loop {
            let key = generate_key();
            if self.existing_keys.insert(key.clone()) {
                return key;
            }
        }
    }

    /// Insert one highlight unless it is a duplicate
    ///
    /// Errors are logged and reported as [`InsertOutcome::Failed`].
    pub async fn insert(&mut self, annotation: &NewAnnotation<'_>) -> InsertOutcome {
        match self.exists(annotation).await {
            Ok(true) => {
                tracing::debug!("Duplicate detected, skipping");
                return InsertOutcome::Duplicate;
            }
            Ok(false) => {}
            // Unknown is treated as new so nothing gets dropped
            Err(e) => tracing::warn!("Error checking for duplicate annotation: {}", e),
        }

        let key = self.unique_key();
        match self.insert_rows(&key, annotation).await {
            Ok(item_id) => InsertOutcome::Inserted { item_id },
            Err(e) => {
                tracing::error!("Failed to insert annotation: {}", e);
                self.existing_keys.remove(&key);
                InsertOutcome::Failed
            }
        }
    }

    async fn insert_rows(&mut self, key: &str, annotation: &NewAnnotation<'_>) -> Result<i64> {
        let mut savepoint = (&mut self.tx).begin().await?;

        let item_id = sqlx::query(
            r#"
            INSERT INTO items (
                itemTypeID, dateAdded, dateModified,
                clientDateModified, libraryID, key, version, synced
            )
            VALUES (?, ?, ?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(ANNOTATION_ITEM_TYPE_ID)
        .bind(annotation.date_added)
        .bind(annotation.date_added)
        .bind(annotation.date_added)
        .bind(self.library_id)
        .bind(key)
        .execute(&mut *savepoint)
        .await?
        .last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO itemAnnotations (
                itemID, parentItemID, type, text, comment,
                color, pageLabel, sortIndex, position, isExternal
            )
            VALUES (?, ?, ?, ?, '', ?, '', ?, ?, 0)
            "#,
        )
        .bind(item_id)
        .bind(annotation.parent_item_id)
        .bind(HIGHLIGHT_TYPE)
        .bind(annotation.text)
        .bind(&self.color)
        .bind(annotation.sort_index)
        .bind(annotation.position)
        .execute(&mut *savepoint)
        .await?;

        savepoint.commit().await?;
        Ok(item_id)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
