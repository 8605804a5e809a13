//! Boox reading-notes export
//!
//! ```text
//! Reading Notes | <<The Time Machine - H. G. Wells>>H. G. Wells
//! -------------------
//! 2024-03-02 21:14  |  Page No.: 12
//! The Time Traveller (for so it will be convenient to speak of him)
//! -------------------
//! ```

use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const SECTION_SEPARATOR: &str = "-------------------";

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Failed to read notes file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not extract book identifier from first line: {0}")]
    MissingIdentifier(String),
}

/// One highlighted passage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// When the highlight was made (minute precision)
    pub created: NaiveDateTime,
    /// Printed page number as exported
    pub page: String,
    pub text: String,
}

impl Note {
    /// Page as a number; non-numeric pages count as 0
    pub fn page_number(&self) -> u32 {
        self.page.parse().unwrap_or(0)
    }

    /// Timestamp in Zotero's `dateAdded` format
    pub fn date_added(&self) -> String {
        self.created.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// A parsed export: the book it belongs to plus its notes
#[derive(Debug, Clone)]
pub struct NotesFile {
    pub book_identifier: String,
    pub notes: Vec<Note>,
}

impl NotesFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NotesError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, NotesError> {
        let first_line = content.lines().next().unwrap_or_default();
        Ok(Self {
            book_identifier: extract_book_identifier(first_line)?,
            notes: parse_notes(content),
        })
    }
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2})\s+\|\s+Page No\.:\s+(\d+)")
            .expect("header pattern is valid")
    })
}

/// Text between `<<` and `>>` on the export's first line
pub fn extract_book_identifier(first_line: &str) -> Result<String, NotesError> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    let re = IDENTIFIER.get_or_init(|| Regex::new(r"<<(.+?)>>").expect("identifier pattern is valid"));

    let line = first_line.trim();
    re.captures(line)
        .map(|caps| caps[1].trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NotesError::MissingIdentifier(line.to_string()))
}

/// Parse every well-formed section of an export
///
/// A section needs a `YYYY-MM-DD HH:MM | Page No.: N` header line; its text
/// is everything after that line. Sections without a header or with empty
/// text are skipped.
pub fn parse_notes(content: &str) -> Vec<Note> {
    let header = header_regex();
    let mut notes = Vec::new();

    for section in content.split(SECTION_SEPARATOR) {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }

        let mut lines = section.lines();
        let Some(caps) = lines.by_ref().find_map(|line| header.captures(line)) else {
            continue;
        };

        let stamp = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
        let created = match NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M") {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!("Skipping note with bad timestamp '{}': {}", stamp, e);
                continue;
            }
        };

        let text = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        if text.is_empty() {
            continue;
        }

        notes.push(Note {
            created,
            page: caps[2].to_string(),
            text,
        });
    }

    notes
}

/// Stable sort into reading order by page number
pub fn sort_by_page(notes: &mut [Note]) {
    notes.sort_by_key(Note::page_number);
}
