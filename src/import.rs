//! Import pipeline
//!
//! Notes are put in page order, located in the book's chapters with one
//! forward-moving cursor, turned into CFI positions and written to Zotero.

use sqlx::SqlitePool;

use crate::cfi::{fallback_for_page, format_anchor, Cfi};
use crate::epub::{text_root, EpubBook};
use crate::error::Result;
use crate::locator::{accumulate, locate_sequence, MatchMode};
use crate::notes::{sort_by_page, Note};
use crate::zotero::{position_json, AnnotationWriter, InsertOutcome, NewAnnotation};

/// Where a note's highlight ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Located { spine_index: usize, mode: MatchMode },
    /// Text not found; positioned from the page number
    Fallback,
}

/// A note with its computed position
#[derive(Debug, Clone)]
pub struct PlannedAnnotation<'n> {
    pub note: &'n Note,
    pub cfi: Cfi,
    pub sort_index: String,
    pub placement: Placement,
}

/// Counts reported at the end of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub located_exact: usize,
    pub located_fuzzy: usize,
    pub fallback: usize,
}

/// Target item and styling for inserted highlights
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// The EPUB attachment item
    pub parent_item_id: i64,
    pub library_id: i64,
    pub color: String,
}

/// Zotero sort index for a located highlight
pub fn sort_index(spine_index: usize, offset: usize) -> String {
    format!("{:05}|{:08}", spine_index, offset)
}

/// Zotero sort index approximated from a page number
pub fn page_sort_index(page: u32) -> String {
    sort_index(0, page as usize * 1000)
}

/// Locate every note in `book`, in the given order
///
/// Chapters that fail to parse are logged and left out of the search.
pub fn plan_annotations<'n>(book: &EpubBook, notes: &'n [Note]) -> Vec<PlannedAnnotation<'n>> {
    let chapters = book.chapters();

    let mut documents = Vec::with_capacity(chapters.len());
    for chapter in &chapters {
        match chapter.parse() {
            Ok(doc) => documents.push((chapter.spine_index, doc)),
            Err(e) => tracing::warn!("Skipping chapter {}: {}", chapter.spine_index, e),
        }
    }

    let flats: Vec<_> = documents
        .iter()
        .map(|(index, doc)| (*index, accumulate(text_root(doc))))
        .collect();
    tracing::debug!("Searching {} chapter(s)", flats.len());

    let queries: Vec<&str> = notes.iter().map(|note| note.text.as_str()).collect();
    let outcomes = locate_sequence(&flats, &queries);

    notes
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(i, (note, outcome))| {
            let located = outcome.located.and_then(|hit| {
                let cfi = format_anchor(hit.document, &hit.anchor)?;
                Some((hit, cfi))
            });

            match located {
                Some((hit, cfi)) => {
                    tracing::debug!("[{}/{}] {:?} match: {}", i + 1, notes.len(), hit.mode, cfi);
                    PlannedAnnotation {
                        note,
                        cfi,
                        sort_index: sort_index(hit.document, hit.span.start),
                        placement: Placement::Located {
                            spine_index: hit.document,
                            mode: hit.mode,
                        },
                    }
                }
                None => {
                    tracing::warn!(
                        "[{}/{}] Text not found in EPUB, using fallback CFI (page {})",
                        i + 1,
                        notes.len(),
                        note.page
                    );
                    tracing::debug!("  Search text: {}", preview(&note.text, 50));
                    PlannedAnnotation {
                        note,
                        cfi: fallback_for_page(note.page_number()),
                        sort_index: page_sort_index(note.page_number()),
                        placement: Placement::Fallback,
                    }
                }
            }
        })
        .collect()
}

/// Sort, locate and insert `notes` as highlights on one EPUB attachment
pub async fn import_notes(
    pool: &SqlitePool,
    book: &EpubBook,
    notes: &mut [Note],
    options: &ImportOptions,
) -> Result<ImportSummary> {
    tracing::info!("Importing {} annotation(s)...", notes.len());
    sort_by_page(notes);

    let planned = plan_annotations(book, notes);
    let mut summary = ImportSummary::default();

    let mut writer = AnnotationWriter::begin(pool, options.library_id, &options.color).await?;
    for plan in &planned {
        match plan.placement {
            Placement::Located { mode: MatchMode::Exact, .. } => summary.located_exact += 1,
            Placement::Located { mode: MatchMode::Fuzzy, .. } => summary.located_fuzzy += 1,
            Placement::Fallback => summary.fallback += 1,
        }

        let position = position_json(&plan.cfi)?;
        let date_added = plan.note.date_added();
        let annotation = NewAnnotation {
            parent_item_id: options.parent_item_id,
            text: &plan.note.text,
            date_added: &date_added,
            sort_index: &plan.sort_index,
            position: &position,
        };

        match writer.insert(&annotation).await {
            InsertOutcome::Inserted { .. } => summary.inserted += 1,
            InsertOutcome::Duplicate => summary.duplicates += 1,
            InsertOutcome::Failed => summary.failed += 1,
        }
    }
    writer.commit().await?;

    Ok(summary)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
