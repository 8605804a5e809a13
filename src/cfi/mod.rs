//! CFI (Canonical Fragment Identifier) module for EPUB
//!
//! Generates the range CFIs stored as annotation positions.
//!
//! # Example CFI
//!
//! ```text
//! epubcfi(/6/4!/4/2[intro],/6/1:0,/8/1:22)
//!         │  │ │ │ │      │       └── end: element /8, text node /1, offset 22
//!         │  │ │ │ │      └────────── start: element /6, text node /1, offset 0
//!         │  │ │ │ └───────────────── common parent element with id assertion
//!         │  │ │ └─────────────────── body
//!         │  │ └───────────────────── indirection (into content doc)
//!         │  └─────────────────────── spine item 1
//!         └────────────────────────── spine element
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use crate::cfi::{format_anchor, fallback_for_page};
//!
//! let cfi = format_anchor(spine_index, &located.anchor)
//!     .unwrap_or_else(|| fallback_for_page(note.page));
//! println!("{}", cfi);
//! ```

mod anchor;
mod generator;
mod types;

pub use anchor::{format_anchor, utf16_offset, CfiLocatable};
pub use generator::{fallback_for_page, generate_cfi_range, CfiBuilder, TextPosition};
pub use types::{Cfi, CfiPath, CfiRange, CfiStep, StepType};
