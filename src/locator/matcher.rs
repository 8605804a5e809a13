//! Quotation matching over flattened text
//!
//! Two strategies, tried in order:
//! - exact: case-insensitive substring search of the normalized query
//! - fuzzy: the same search with all whitespace removed on both sides,
//!   which survives spaces the export dropped at soft line breaks
//!
//! All positions are char indices into the flattened text.

use super::normalize::{fold_case, normalize, strip_whitespace};

/// A half-open range `[start, end)` of flattened-text positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchedSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

/// Search `flat` for `query`, ignoring matches that start before `skip`
///
/// `skip` is always expressed in flattened-text positions, whitespace
/// included, for both modes. An empty query never matches.
pub fn find(flat: &str, query: &str, skip: usize, mode: MatchMode) -> Option<MatchedSpan> {
    match mode {
        MatchMode::Exact => find_exact(flat, query, skip),
        MatchMode::Fuzzy => find_fuzzy(flat, query, skip),
    }
}

/// Exact first, fuzzy only if exact finds nothing
pub fn find_best(flat: &str, query: &str, skip: usize) -> Option<(MatchedSpan, MatchMode)> {
    if let Some(span) = find_exact(flat, query, skip) {
        return Some((span, MatchMode::Exact));
    }
    find_fuzzy(flat, query, skip).map(|span| (span, MatchMode::Fuzzy))
}

fn find_exact(flat: &str, query: &str, skip: usize) -> Option<MatchedSpan> {
    let needle: Vec<char> = normalize(query).chars().map(fold_case).collect();
    if needle.is_empty() {
        return None;
    }

    let haystack: Vec<char> = flat.chars().map(fold_case).collect();
    let start = position_from(&haystack, &needle, skip)?;

    Some(MatchedSpan {
        start,
        end: start + needle.len(),
    })
}

fn find_fuzzy(flat: &str, query: &str, skip: usize) -> Option<MatchedSpan> {
    let needle: Vec<char> = strip_whitespace(&normalize(query))
        .chars()
        .map(fold_case)
        .collect();
    if needle.is_empty() {
        return None;
    }

    // Flattened position of every non-whitespace char, in order
    let mut positions = Vec::new();
    let mut haystack = Vec::new();
    for (pos, c) in flat.chars().enumerate() {
        if !c.is_whitespace() {
            positions.push(pos);
            haystack.push(fold_case(c));
        }
    }

    // Non-whitespace chars consumed before `skip`
    let stripped_skip = positions.partition_point(|&pos| pos < skip);
    let stripped_start = position_from(&haystack, &needle, stripped_skip)?;
    let stripped_last = stripped_start + needle.len() - 1;

    Some(MatchedSpan {
        start: positions[stripped_start],
        end: positions[stripped_last] + 1,
    })
}

/// Leftmost occurrence of `needle` in `haystack` at or after `from`
fn position_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
