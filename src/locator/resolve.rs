//! Span resolution
//!
//! Maps a flattened-text span back onto the text leaves it came from and
//! turns flattened positions into offsets within each leaf's raw content.

use super::accumulate::LeafRecord;
use super::matcher::MatchedSpan;

/// Start and end of a located quotation as (leaf, raw char offset) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAnchor<N> {
    pub start_node: N,
    pub start_offset: usize,
    pub end_node: N,
    pub end_offset: usize,
}

/// Resolve `span` against the leaves it was matched in
///
/// The start belongs to the leaf with `flat_start <= pos < flat_end`, the end
/// to the leaf with `flat_start < pos <= flat_end`, so a match ending exactly
/// at a leaf boundary stays in the leaf it ends in.
pub fn resolve<N: Copy>(leaves: &[LeafRecord<N>], span: MatchedSpan) -> Option<ResolvedAnchor<N>> {
    if span.is_empty() {
        return None;
    }

    let start_leaf = leaves.iter().find(|leaf| leaf.contains_start(span.start))?;
    let end_leaf = leaves.iter().find(|leaf| leaf.contains_end(span.end))?;

    Some(ResolvedAnchor {
        start_node: start_leaf.node,
        start_offset: raw_offset(&start_leaf.raw, span.start - start_leaf.flat_start),
        end_node: end_leaf.node,
        end_offset: raw_offset(&end_leaf.raw, span.end - end_leaf.flat_start),
    })
}

/// Convert an offset into `normalize(raw)` to a char offset into `raw`
///
/// Leading whitespace, trimmed away by normalization, is skipped first. A
/// whitespace run stands for one normalized space whatever its length; every
/// other char maps one to one.
pub fn raw_offset(raw: &str, normalized_offset: usize) -> usize {
    let chars: Vec<char> = raw.chars().collect();
    let mut cursor = chars.iter().take_while(|c| c.is_whitespace()).count();

    for _ in 0..normalized_offset {
        if cursor >= chars.len() {
            break;
        }
        if chars[cursor].is_whitespace() {
            while cursor < chars.len() && chars[cursor].is_whitespace() {
                cursor += 1;
            }
        } else {
            cursor += 1;
        }
    }

    cursor.min(chars.len())
}
