//! Text normalization
//!
//! Canonicalizes text so that differences introduced by the reader export
//! (collapsed line breaks, typographic quotes) don't break matching.

/// Fold typographic quotes to their ASCII counterparts
fn fold_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        other => other,
    }
}

/// Normalize text for matching
///
/// Collapses every whitespace run to a single ASCII space, folds
/// typographic quotes and trims both ends.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(fold_quote(c));
    }

    out
}

/// Remove every whitespace character
///
/// Uses the same whitespace predicate as [`normalize`].
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Per-character case folding
///
/// Characters whose lowercase form is more than one char are kept as-is so
/// folded text stays aligned with the original position for position.
pub fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}
