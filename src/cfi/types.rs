//! CFI (Canonical Fragment Identifier) types for EPUB
//!
//! Format: epubcfi(/6/4[chap01ref]!/4/2/22/3:268)
//!
//! Reference: <https://idpf.org/epub/linking/cfi/epub-cfi.html>

use std::fmt;

/// A complete EPUB CFI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cfi {
    /// The path components of this CFI (the common parent for ranges)
    pub path: CfiPath,
    /// Optional range (for selections)
    pub range: Option<CfiRange>,
}

/// A CFI path (sequence of steps)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfiPath {
    pub steps: Vec<CfiStep>,
    /// Optional character offset at the end
    pub character_offset: Option<u32>,
}

/// A CFI range (for text selections)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfiRange {
    /// Start of the range (relative path from common parent)
    pub start: CfiPath,
    /// End of the range (relative path from common parent)
    pub end: CfiPath,
}

/// A single step in a CFI path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfiStep {
    pub step_type: StepType,
    /// Optional ID assertion [id]
    pub id_assertion: Option<String>,
}

/// Type of CFI step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// Even index for elements, odd index for text
    Element(u32),
    /// Indirection step (!) - steps into a referenced document
    Indirection,
}

impl Cfi {
    pub fn new(path: CfiPath) -> Self {
        Self { path, range: None }
    }

    pub fn with_range(path: CfiPath, range: CfiRange) -> Self {
        Self {
            path,
            range: Some(range),
        }
    }
}

impl CfiPath {
    pub fn push(&mut self, step: CfiStep) {
        self.steps.push(step);
    }

    pub fn set_character_offset(&mut self, offset: u32) {
        self.character_offset = Some(offset);
    }
}

impl CfiStep {
    pub fn element(index: u32) -> Self {
        Self {
            step_type: StepType::Element(index),
            id_assertion: None,
        }
    }

    pub fn element_with_id(index: u32, id: impl Into<String>) -> Self {
        Self {
            step_type: StepType::Element(index),
            id_assertion: Some(id.into()),
        }
    }

    pub fn indirection() -> Self {
        Self {
            step_type: StepType::Indirection,
            id_assertion: None,
        }
    }
}

/// Escape CFI special characters with `^`
fn escape_assertion(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '^' | '[' | ']' | '(' | ')' | ',' | ';' | '=') {
            out.push('^');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epubcfi({}", self.path)?;
        if let Some(ref range) = self.range {
            write!(f, ",{},{}", range.start, range.end)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for CfiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        if let Some(offset) = self.character_offset {
            write!(f, ":{}", offset)?;
        }
        Ok(())
    }
}

impl fmt::Display for CfiStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_type {
            StepType::Element(n) => write!(f, "/{}", n)?,
            StepType::Indirection => write!(f, "!")?,
        }
        if let Some(ref id) = self.id_assertion {
            write!(f, "[{}]", escape_assertion(id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(steps: Vec<CfiStep>, character_offset: Option<u32>) -> CfiPath {
        CfiPath {
            steps,
            character_offset,
        }
    }

    #[test]
    fn test_simple_cfi_display() {
        let cfi = Cfi::new(path(
            vec![
                CfiStep::element(6),
                CfiStep::element(4),
                CfiStep::indirection(),
                CfiStep::element(4),
                CfiStep::element(2),
            ],
            None,
        ));

        assert_eq!(cfi.to_string(), "epubcfi(/6/4!/4/2)");
    }

    #[test]
    fn test_range_display() {
        let start = path(vec![CfiStep::element(140), CfiStep::element(1)], Some(0));
        let end = path(vec![CfiStep::element(142), CfiStep::element(3)], Some(41));

        let cfi = Cfi::with_range(
            path(
                vec![
                    CfiStep::element(6),
                    CfiStep::element(16),
                    CfiStep::indirection(),
                    CfiStep::element(4),
                    CfiStep::element_with_id(2, "pgepubid00024"),
                ],
                None,
            ),
            CfiRange { start, end },
        );

        assert_eq!(
            cfi.to_string(),
            "epubcfi(/6/16!/4/2[pgepubid00024],/140/1:0,/142/3:41)"
        );
    }

    #[test]
    fn test_id_assertion_is_escaped() {
        let step = CfiStep::element_with_id(2, "a[b],c");
        assert_eq!(step.to_string(), "/2[a^[b^]^,c]");
    }
}
