//! CFI Generator
//!
//! Builds CFI strings from spine positions and text-node locations.

use super::types::*;

/// Builder for constructing CFIs programmatically
#[derive(Debug, Clone, Default)]
pub struct CfiBuilder {
    path: CfiPath,
}

impl CfiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step to the package document (/6 is the spine)
    pub fn package_step(mut self) -> Self {
        self.path.push(CfiStep::element(6));
        self
    }

    /// Add a spine item step (converts 0-based index to CFI format)
    /// CFI uses 1-based even numbering: index 0 -> /2, index 1 -> /4, etc.
    pub fn spine_item(mut self, index: usize) -> Self {
        self.path.push(CfiStep::element(even_step(index)));
        self
    }

    /// Add an indirection step (entering a content document)
    pub fn indirection(mut self) -> Self {
        self.path.push(CfiStep::indirection());
        self
    }

    /// Add an element step with raw CFI index
    pub fn element_raw(mut self, cfi_index: u32) -> Self {
        self.path.push(CfiStep::element(cfi_index));
        self
    }

    /// Add an already computed step
    pub fn step(mut self, step: CfiStep) -> Self {
        self.path.push(step);
        self
    }

    /// Add a run of already computed steps
    pub fn steps<'s>(mut self, steps: impl IntoIterator<Item = &'s CfiStep>) -> Self {
        for step in steps {
            self.path.push(step.clone());
        }
        self
    }

    /// Set the character offset within a text node
    pub fn character_offset(mut self, offset: u32) -> Self {
        self.path.set_character_offset(offset);
        self
    }

    pub fn build(self) -> Cfi {
        Cfi::new(self.path)
    }

    pub fn into_path(self) -> CfiPath {
        self.path
    }
}

/// Even CFI index for the 0-based child `index`
pub fn even_step(index: usize) -> u32 {
    ((index + 1) * 2) as u32
}

/// Odd CFI index for the 0-based text node `index`
pub fn odd_step(index: usize) -> u32 {
    (index * 2 + 1) as u32
}

/// A character position inside a content document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPosition {
    /// Element steps from the document element down to the text node's parent
    pub parents: Vec<CfiStep>,
    /// Odd step of the text node within its parent
    pub text_step: u32,
    /// Offset within the text node
    pub offset: u32,
}

/// Generate a CFI range for a text selection inside one spine item
///
/// The shared element steps go into the parent path; each side keeps the
/// rest of its element steps, its text step and its offset.
///
/// ```ignore
/// // epubcfi(/6/4!/4/2,/1:0,/3:12)
/// let cfi = generate_cfi_range(1, &start, &end);
/// ```
pub fn generate_cfi_range(spine_index: usize, start: &TextPosition, end: &TextPosition) -> Cfi {
    let common_len = start
        .parents
        .iter()
        .zip(end.parents.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let common = CfiBuilder::new()
        .package_step()
        .spine_item(spine_index)
        .indirection()
        .steps(&start.parents[..common_len])
        .into_path();

    let start_rel = CfiBuilder::new()
        .steps(&start.parents[common_len..])
        .element_raw(start.text_step)
        .character_offset(start.offset)
        .into_path();

    let end_rel = CfiBuilder::new()
        .steps(&end.parents[common_len..])
        .element_raw(end.text_step)
        .character_offset(end.offset)
        .into_path();

    Cfi::with_range(
        common,
        CfiRange {
            start: start_rel,
            end: end_rel,
        },
    )
}

/// Coarse chapter-level CFI derived from a printed page number
///
/// Used when a quotation can't be located; assumes roughly ten pages per
/// spine item and points at the start of the body's first child.
pub fn fallback_for_page(page: u32) -> Cfi {
    let approx_spine = (page / 10) as usize;
    CfiBuilder::new()
        .package_step()
        .spine_item(approx_spine)
        .indirection()
        .element_raw(4)
        .element_raw(2)
        .character_offset(0)
        .build()
}
