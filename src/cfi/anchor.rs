//! Text-node anchors to CFI ranges
//!
//! Step numbering follows the reading-system convention: element steps count
//! element siblings (`/2`, `/4`, ...), text steps count text-node siblings
//! (`/1`, `/3`, ...) including whitespace-only ones, and offsets are in
//! UTF-16 code units.

use super::generator::{even_step, generate_cfi_range, odd_step, TextPosition};
use super::types::{Cfi, CfiStep};
use crate::locator::ResolvedAnchor;

/// A text node that can describe its own place in a content document
pub trait CfiLocatable {
    /// CFI position of the char offset `char_offset` within this text node
    fn text_position(&self, char_offset: usize) -> Option<TextPosition>;
}

impl<'a, 'input> CfiLocatable for roxmltree::Node<'a, 'input> {
    fn text_position(&self, char_offset: usize) -> Option<TextPosition> {
        if !self.is_text() {
            return None;
        }
        let parent = self.parent_element()?;

        // Steps stop below the document element
        let mut parents = Vec::new();
        let mut current = parent;
        while let Some(up) = current.parent_element() {
            parents.push(element_step(up, current)?);
            current = up;
        }
        parents.reverse();

        let text_index = parent
            .children()
            .filter(|n| n.is_text())
            .position(|n| n == *self)?;

        let text = self.text().unwrap_or_default();
        Some(TextPosition {
            parents,
            text_step: odd_step(text_index),
            offset: utf16_offset(text, char_offset),
        })
    }
}

fn element_step(parent: roxmltree::Node, child: roxmltree::Node) -> Option<CfiStep> {
    let index = parent
        .children()
        .filter(|n| n.is_element())
        .position(|n| n == child)?;

    Some(match child.attribute("id") {
        Some(id) if !id.is_empty() => CfiStep::element_with_id(even_step(index), id),
        _ => CfiStep::element(even_step(index)),
    })
}

/// Length in UTF-16 code units of the first `char_offset` chars of `text`
pub fn utf16_offset(text: &str, char_offset: usize) -> u32 {
    text.chars()
        .take(char_offset)
        .map(|c| c.len_utf16() as u32)
        .sum()
}

/// Format a resolved anchor in spine item `spine_index` as a CFI range
pub fn format_anchor<N: CfiLocatable>(spine_index: usize, anchor: &ResolvedAnchor<N>) -> Option<Cfi> {
    let start = anchor.start_node.text_position(anchor.start_offset)?;
    let end = anchor.end_node.text_position(anchor.end_offset)?;
    Some(generate_cfi_range(spine_index, &start, &end))
}
