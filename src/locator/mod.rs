//! Quotation locator
//!
//! Finds a short, possibly damaged, quotation inside a structured document
//! and reports the exact text-node range it occupies.
//!
//! # Pipeline
//!
//! ```text
//! document tree ──accumulate──▶ FlatText ──find_best──▶ MatchedSpan ──resolve──▶ ResolvedAnchor
//!                                  │                         ▲
//!                                  └──── locate_sequence ────┘ (cursor threaded between queries)
//! ```
//!
//! - [`normalize`]: whitespace collapsing and quote folding
//! - [`accumulate`]: text leaves to one flattened string plus leaf intervals
//! - [`find`] / [`find_best`]: exact match, falling back to whitespace-free match
//! - [`resolve`]: flattened span back to (text node, raw offset) pairs
//! - [`locate_sequence`]: in-order batch search with a forward-moving cursor
//!
//! # Usage
//!
//! ```ignore
//! use crate::locator::{accumulate, locate_sequence};
//!
//! let doc = roxmltree::Document::parse("<body><p>Hello</p><p>world.</p></body>")?;
//! let chapters = vec![(0, accumulate(doc.root_element()))];
//! let outcomes = locate_sequence(&chapters, &["Hello world"]);
//! let hit = outcomes[0].located.unwrap();
//! assert_eq!(hit.anchor.end_offset, 5);
//! ```

mod accumulate;
mod batch;
mod matcher;
mod normalize;
mod resolve;
mod tree;

pub use accumulate::{accumulate, FlatText, LeafRecord};
pub use batch::{locate_next, locate_sequence, Cursor, Located, Outcome};
pub use matcher::{find, find_best, MatchMode, MatchedSpan};
pub use normalize::{fold_case, normalize, strip_whitespace};
pub use resolve::{raw_offset, resolve, ResolvedAnchor};
pub use tree::{NodeKind, TextNode};
