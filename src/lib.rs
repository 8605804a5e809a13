//! Boox Import Library
//!
//! Imports highlights from a Boox reading-notes export into Zotero as EPUB
//! annotations. The binary is in main.rs.
//!
//! # Modules
//!
//! - `locator`: finds a quotation in a document tree and resolves it to text nodes
//! - `cfi`: formats located ranges as EPUB CFIs
//! - `epub`: archive, OPF and chapter parsing
//! - `notes`: the reading-notes export format
//! - `zotero`: data directory discovery, book lookup and annotation inserts
//! - `import`: the end-to-end pipeline

pub mod cfi;
pub mod config;
pub mod epub;
pub mod error;
pub mod import;
pub mod locator;
pub mod notes;
pub mod zotero;

pub use error::{AppError, Result};
