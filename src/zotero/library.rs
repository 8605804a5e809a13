//! Finding the EPUB attachment a notes export belongs to

use sqlx::SqlitePool;
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;

const STOP_WORDS: &[&str] = &["the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for"];

/// Minimum token overlap for a fuzzy match to be accepted
const MIN_SIMILARITY: f64 = 0.3;

/// How an attachment was matched to the book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Identifier is a substring of the attachment path
    Substring,
    /// Token overlap with the file name
    Filename,
    /// Token overlap with the parent item's creators and title
    Metadata,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchMethod::Substring => "substring",
            MatchMethod::Filename => "filename",
            MatchMethod::Metadata => "metadata",
        };
        write!(f, "{}", name)
    }
}

/// An EPUB attachment row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EpubAttachment {
    #[sqlx(rename = "itemID")]
    pub item_id: i64,
    #[sqlx(rename = "parentItemID")]
    pub parent_item_id: Option<i64>,
    /// The attachment item's key (names its storage folder)
    pub key: String,
    /// Stored path, e.g. `storage:Book.epub` or `attachments:dir/Book.epub`
    pub path: String,
}

impl EpubAttachment {
    /// Path without its `storage:` / `attachments:` prefix
    pub fn filename(&self) -> &str {
        self.path
            .strip_prefix("storage:")
            .or_else(|| self.path.strip_prefix("attachments:"))
            .unwrap_or(&self.path)
    }
}

/// A located attachment and how confident the match is
#[derive(Debug, Clone, PartialEq)]
pub struct BookMatch {
    pub attachment: EpubAttachment,
    pub method: MatchMethod,
    /// 1.0 for substring matches, the similarity score otherwise
    pub confidence: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct MetadataRow {
    #[sqlx(flatten)]
    attachment: EpubAttachment,
    creators: String,
    title: String,
}

/// Lowercased whitespace tokens without stop words
fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Tokens of a book identifier; bare numbers (years, volumes) are dropped
pub fn identifier_tokens(identifier: &str) -> HashSet<String> {
    tokens(identifier)
        .into_iter()
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Jaccard similarity of two token sets
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

const ATTACHMENT_COLUMNS: &str = "ia.itemID, ia.parentItemID, i.key, ia.path";

/// Find the EPUB attachment for `identifier`
///
/// Tries a path substring match, then file-name token similarity, then
/// similarity against the parent item's creators and title.
pub async fn find_epub(pool: &SqlitePool, identifier: &str) -> Result<Option<BookMatch>> {
    let exact = sqlx::query_as::<_, EpubAttachment>(&format!(
        r#"
        SELECT {}
        FROM itemAttachments ia
        JOIN items i ON i.itemID = ia.itemID
        WHERE ia.path LIKE ? AND ia.path LIKE '%.epub'
        LIMIT 1
        "#,
        ATTACHMENT_COLUMNS
    ))
    .bind(format!("%{}%", identifier))
    .fetch_optional(pool)
    .await?;

    if let Some(attachment) = exact {
        tracing::debug!("Database match (substring): {}", attachment.filename());
        return Ok(Some(BookMatch {
            attachment,
            method: MatchMethod::Substring,
            confidence: 1.0,
        }));
    }

    let all = sqlx::query_as::<_, EpubAttachment>(&format!(
        r#"
        SELECT {}
        FROM itemAttachments ia
        JOIN items i ON i.itemID = ia.itemID
        WHERE ia.path LIKE '%.epub'
        ORDER BY ia.itemID
        "#,
        ATTACHMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    if all.is_empty() {
        tracing::warn!("No EPUB files found in Zotero database");
        return Ok(None);
    }

    let wanted = identifier_tokens(identifier);
    if wanted.is_empty() {
        tracing::warn!("Book identifier '{}' has no usable words", identifier);
        return Ok(None);
    }

    let by_filename = best_match(all.iter().map(|attachment| {
        let base = attachment.filename().trim_end_matches(".epub");
        (attachment, jaccard(&wanted, &tokens(base)))
    }));
    if let Some((attachment, score)) = by_filename {
        tracing::debug!(
            "Database match (filename, score={:.2}): {}",
            score,
            attachment.filename()
        );
        return Ok(Some(BookMatch {
            attachment: attachment.clone(),
            method: MatchMethod::Filename,
            confidence: score,
        }));
    }

    let rows = sqlx::query_as::<_, MetadataRow>(&format!(
        r#"
        SELECT {},
               COALESCE(
                   (SELECT GROUP_CONCAT(c.lastName || ' ' || c.firstName, ', ')
                    FROM itemCreators ic
                    JOIN creators c ON ic.creatorID = c.creatorID
                    WHERE ic.itemID = ia.parentItemID),
                   ''
               ) AS creators,
               COALESCE(
                   (SELECT idv.value FROM itemData id
                    JOIN itemDataValues idv ON id.valueID = idv.valueID
                    WHERE id.itemID = ia.parentItemID AND id.fieldID = 1),
                   ''
               ) AS title
        FROM itemAttachments ia
        JOIN items i ON i.itemID = ia.itemID
        WHERE ia.path LIKE '%.epub'
        ORDER BY ia.itemID
        "#,
        ATTACHMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    let by_metadata = best_match(rows.iter().map(|row| {
        let words: HashSet<String> = tokens(&format!("{} {}", row.creators, row.title))
            .into_iter()
            .filter(|t| t.chars().count() > 2)
            .collect();
        (row, jaccard(&wanted, &words))
    }));
    if let Some((row, score)) = by_metadata {
        tracing::debug!(
            "Database match (metadata, score={:.2}): {}",
            score,
            row.attachment.filename()
        );
        tracing::debug!("  Authors: {}", row.creators);
        tracing::debug!("  Title: {}", row.title);
        return Ok(Some(BookMatch {
            attachment: row.attachment.clone(),
            method: MatchMethod::Metadata,
            confidence: score,
        }));
    }

    tracing::error!("No matching EPUB found. Available EPUB files:");
    for attachment in all.iter().take(10) {
        tracing::error!("  - {}", attachment.filename());
    }
    if all.len() > 10 {
        tracing::error!("  ... and {} more", all.len() - 10);
    }

    Ok(None)
}

/// Highest-scoring candidate above the similarity floor; ties keep the first
fn best_match<T>(candidates: impl Iterator<Item = (T, f64)>) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for (candidate, score) in candidates {
        if score > best.as_ref().map_or(0.0, |(_, s)| *s) {
            best = Some((candidate, score));
        }
    }
    best.filter(|(_, score)| *score > MIN_SIMILARITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zotero::testing::{add_epub, test_pool};

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_identifier_tokens() {
        assert_eq!(
            identifier_tokens("The Name of the Rose 1980"),
            set(&["name", "of", "rose"])
        );
        assert!(identifier_tokens("The 1984").is_empty());
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["a", "b"])), 1.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[tokio::test]
    async fn test_substring_match() {
        let (_dir, pool) = test_pool().await;
        add_epub(&pool, 10, "AAAA2222", "storage:Dune - Frank Herbert.epub", "Dune", &[]).await;
        add_epub(&pool, 20, "BBBB3333", "storage:Emma - Jane Austen.epub", "Emma", &[]).await;

        let found = find_epub(&pool, "Emma - Jane Austen").await.unwrap().unwrap();
        assert_eq!(found.method, MatchMethod::Substring);
        assert_eq!(found.confidence, 1.0);
        assert_eq!(found.attachment.item_id, 21);
        assert_eq!(found.attachment.key, "BBBB3333");
        assert_eq!(found.attachment.filename(), "Emma - Jane Austen.epub");
    }

    #[tokio::test]
    async fn test_filename_similarity_match() {
        let (_dir, pool) = test_pool().await;
        add_epub(&pool, 10, "AAAA2222", "storage:Herbert, Frank - Dune Messiah.epub", "x", &[]).await;
        add_epub(&pool, 20, "BBBB3333", "attachments:Austen - Emma.epub", "y", &[]).await;

        let found = find_epub(&pool, "Emma Austen 1815").await.unwrap().unwrap();
        assert_eq!(found.method, MatchMethod::Filename);
        assert_eq!(found.attachment.key, "BBBB3333");
        // {emma, austen} against {austen, -, emma}
        assert!((found.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_metadata_match() {
        let (_dir, pool) = test_pool().await;
        add_epub(
            &pool,
            10,
            "AAAA2222",
            "storage:9780141439587.epub",
            "Pride and Prejudice",
            &[("Austen", "Jane")],
        )
        .await;

        let found = find_epub(&pool, "Pride Prejudice Austen").await.unwrap().unwrap();
        assert_eq!(found.method, MatchMethod::Metadata);
        assert_eq!(found.attachment.parent_item_id, Some(10));
        assert!(found.confidence > MIN_SIMILARITY);
    }

    #[tokio::test]
    async fn test_no_match() {
        let (_dir, pool) = test_pool().await;
        assert!(find_epub(&pool, "Anything").await.unwrap().is_none());

        add_epub(&pool, 10, "AAAA2222", "storage:Dune.epub", "Dune", &[("Herbert", "Frank")]).await;
        assert!(find_epub(&pool, "War and Peace").await.unwrap().is_none());
    }
}
