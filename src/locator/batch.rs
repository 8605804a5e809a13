//! Sequential quotation locating
//!
//! Quotations from a reading-notes export arrive in reading order, so each
//! search resumes where the previous successful one ended. That is what
//! tells repeated sentences apart: the second "the cat" resolves to the
//! second occurrence, not the first one again.

use super::accumulate::FlatText;
use super::matcher::{find_best, MatchMode, MatchedSpan};
use super::resolve::{resolve, ResolvedAnchor};

/// Scan position carried from one query to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    /// Index of the document the last match was found in
    pub document: usize,
    /// Flattened-text position right after the last match
    pub offset: usize,
}

/// A successfully located quotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<N> {
    /// Index of the document the quotation was found in
    pub document: usize,
    pub span: MatchedSpan,
    pub mode: MatchMode,
    pub anchor: ResolvedAnchor<N>,
}

/// Result for one query of a batch
#[derive(Debug, Clone)]
pub struct Outcome<N> {
    pub query: String,
    pub located: Option<Located<N>>,
}

/// Locate `query` starting from `cursor`
///
/// Documents are `(index, flattened text)` pairs in reading order. Documents
/// before `cursor.document` are not searched; the cursor's own document is
/// searched from `cursor.offset`, later ones from the start. Returns the
/// advanced cursor on success and `cursor` unchanged otherwise.
pub fn locate_next<N: Copy>(
    documents: &[(usize, FlatText<N>)],
    query: &str,
    cursor: Cursor,
) -> (Option<Located<N>>, Cursor) {
    for (index, flat) in documents {
        let index = *index;
        if index < cursor.document {
            continue;
        }

        let skip = if index == cursor.document { cursor.offset } else { 0 };
        let Some((span, mode)) = find_best(&flat.text, query, skip) else {
            continue;
        };

        let Some(anchor) = resolve(&flat.leaves, span) else {
            tracing::warn!(
                "Match at {}..{} in document {} did not resolve to text nodes",
                span.start,
                span.end,
                index
            );
            continue;
        };

        let next = Cursor {
            document: index,
            offset: span.end,
        };
        let located = Located {
            document: index,
            span,
            mode,
            anchor,
        };
        return (Some(located), next);
    }

    (None, cursor)
}

/// Locate every query in order, threading the cursor from `(0, 0)`
pub fn locate_sequence<N: Copy, Q: AsRef<str>>(
    documents: &[(usize, FlatText<N>)],
    queries: &[Q],
) -> Vec<Outcome<N>> {
    let mut cursor = Cursor::default();
    let mut outcomes = Vec::with_capacity(queries.len());

    for query in queries {
        let query = query.as_ref();
        let (located, next) = locate_next(documents, query, cursor);

        match &located {
            Some(hit) => tracing::debug!(
                "Located in document {} at {}..{} ({:?})",
                hit.document,
                hit.span.start,
                hit.span.end,
                hit.mode
            ),
            None => tracing::debug!(
                "Not found after document {} offset {}",
                cursor.document,
                cursor.offset
            ),
        }

        cursor = next;
        outcomes.push(Outcome {
            query: query.to_string(),
            located,
        });
    }

    outcomes
}
