//! EPUB reading
//!
//! Opens the archive, follows container.xml to the OPF and exposes the spine
//! items as parseable chapter documents.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

mod chapter;
mod opf;

pub use chapter::{rewrite_entities, text_root, ChapterDocument};
pub use opf::{parse_container, parse_opf, ParsedOpf};

const CONTAINER_PATH: &str = "META-INF/container.xml";

#[derive(Error, Debug)]
pub enum EpubError {
    #[error("Failed to read ZIP archive: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

/// Book metadata
#[derive(Debug, Clone, Default)]
pub struct BookMetadata {
    pub title: String,
    pub creators: Vec<String>,
}

/// Spine item (reading order entry)
///
/// An itemref with no manifest entry has an empty href and media type.
#[derive(Debug, Clone)]
pub struct SpineItem {
    pub idref: String,
    pub href: String,
    pub media_type: String,
}

impl SpineItem {
    pub(crate) fn unresolved(idref: &str) -> Self {
        Self {
            idref: idref.to_string(),
            href: String::new(),
            media_type: String::new(),
        }
    }

    /// Whether this item is an (X)HTML content document
    pub fn is_markup(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html" | "application/xml"
        )
    }
}

/// Manifest item from OPF
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

/// An opened EPUB with its files held in memory
pub struct EpubBook {
    pub metadata: BookMetadata,
    pub spine: Vec<SpineItem>,
    pub manifest: HashMap<String, ManifestItem>,
    resources: HashMap<String, Vec<u8>>,
    opf_dir: String,
}

impl EpubBook {
    /// Open an EPUB file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EpubError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Parse an EPUB from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, EpubError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let mut resources = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_file() {
                let name = file.name().to_string();
                let mut content = Vec::new();
                file.read_to_end(&mut content)?;
                resources.insert(name, content);
            }
        }

        let container = resources
            .get(CONTAINER_PATH)
            .ok_or_else(|| EpubError::InvalidEpub(format!("missing {}", CONTAINER_PATH)))?;
        let opf_path = parse_container(&decode_utf8(CONTAINER_PATH, container)?)?;
        let opf_dir = opf_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();

        let opf_bytes = resources
            .get(&opf_path)
            .ok_or_else(|| EpubError::ResourceNotFound(opf_path.clone()))?;
        let opf = parse_opf(&decode_utf8(&opf_path, opf_bytes)?)?;

        tracing::debug!(
            "Opened EPUB '{}' by {} with {} spine item(s)",
            opf.metadata.title,
            if opf.metadata.creators.is_empty() {
                "unknown".to_string()
            } else {
                opf.metadata.creators.join(", ")
            },
            opf.spine.len()
        );

        Ok(Self {
            metadata: opf.metadata,
            spine: opf.spine,
            manifest: opf.manifest,
            resources,
            opf_dir,
        })
    }

    /// Archive path of a manifest href (relative to the OPF, percent-encoded)
    pub fn resolve_href(&self, href: &str) -> String {
        let href = href.split('#').next().unwrap_or(href);
        let decoded = urlencoding::decode(href)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| href.to_string());

        let mut parts: Vec<&str> = self
            .opf_dir
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        parts.join("/")
    }

    /// Read a spine item's markup
    pub fn chapter_source(&self, index: usize) -> Result<String, EpubError> {
        let item = self
            .spine
            .get(index)
            .ok_or_else(|| EpubError::ResourceNotFound(format!("spine item {}", index)))?;
        let path = self.resolve_href(&item.href);
        let bytes = self
            .resources
            .get(&path)
            .ok_or_else(|| EpubError::ResourceNotFound(path.clone()))?;
        decode_utf8(&path, bytes)
    }

    /// Every readable markup chapter in spine order
    ///
    /// Chapters that are missing or unreadable are logged and skipped; their
    /// spine indices are simply absent from the result.
    pub fn chapters(&self) -> Vec<ChapterDocument> {
        let mut chapters = Vec::with_capacity(self.spine.len());

        for (index, item) in self.spine.iter().enumerate() {
            if !item.is_markup() {
                tracing::debug!(
                    "Skipping spine item {} ('{}', media type '{}')",
                    index,
                    item.idref,
                    item.media_type
                );
                continue;
            }
            match self.chapter_source(index) {
                Ok(source) => chapters.push(ChapterDocument::new(index, item.href.clone(), &source)),
                Err(e) => tracing::warn!("Skipping chapter {} ({}): {}", index, item.href, e),
            }
        }

        chapters
    }
}

fn decode_utf8(path: &str, bytes: &[u8]) -> Result<String, EpubError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| EpubError::InvalidEpub(format!("{} is not UTF-8: {}", path, e)))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
