//! Text accumulation
//!
//! Flattens a document's text leaves into one normalized search string and
//! remembers which slice of that string each leaf contributed.

use super::normalize::normalize;
use super::tree::{NodeKind, TextNode};

/// Bookkeeping for one kept text leaf
#[derive(Debug, Clone)]
pub struct LeafRecord<N> {
    /// The text node itself
    pub node: N,
    /// Content as it appears in the document
    pub raw: String,
    /// `normalize(raw)`
    pub normalized: String,
    /// First flattened position covered by this leaf (chars)
    pub flat_start: usize,
    /// One past the last flattened position covered by this leaf (chars)
    pub flat_end: usize,
}

impl<N> LeafRecord<N> {
    /// Whether `pos` lies in `[flat_start, flat_end)`
    pub fn contains_start(&self, pos: usize) -> bool {
        self.flat_start <= pos && pos < self.flat_end
    }

    /// Whether `pos` lies in `(flat_start, flat_end]`
    pub fn contains_end(&self, pos: usize) -> bool {
        self.flat_start < pos && pos <= self.flat_end
    }
}

/// Flattened view of one document
#[derive(Debug, Clone)]
pub struct FlatText<N> {
    /// Normalized leaf texts joined by single spaces
    pub text: String,
    /// Kept leaves in document order
    pub leaves: Vec<LeafRecord<N>>,
}

impl<N> FlatText<N> {
    /// Length of the flattened text in chars
    pub fn char_len(&self) -> usize {
        self.leaves.last().map(|leaf| leaf.flat_end).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Walk `root` in document order and build its flattened text
///
/// Leaves whose content is only whitespace are dropped and never produce a
/// separator.
pub fn accumulate<'a, N: TextNode<'a>>(root: N) -> FlatText<N> {
    let mut text = String::new();
    let mut leaves: Vec<LeafRecord<N>> = Vec::new();
    let mut flat_len = 0usize;

    // Pre-order walk with an explicit stack; children are pushed reversed
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            NodeKind::Text => {
                let Some(raw) = node.text() else { continue };
                if raw.trim().is_empty() {
                    continue;
                }

                let normalized = normalize(raw);
                if !leaves.is_empty() {
                    text.push(' ');
                    flat_len += 1;
                }

                let flat_start = flat_len;
                flat_len += normalized.chars().count();
                text.push_str(&normalized);

                leaves.push(LeafRecord {
                    node,
                    raw: raw.to_string(),
                    normalized,
                    flat_start,
                    flat_end: flat_len,
                });
            }
            NodeKind::Container => {
                let children: Vec<N> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
            NodeKind::Other => {}
        }
    }

    FlatText { text, leaves }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(xml: &str) -> (String, Vec<(String, usize, usize)>) {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let flat = accumulate(doc.root_element());
        let leaves = flat
            .leaves
            .iter()
            .map(|l| (l.normalized.clone(), l.flat_start, l.flat_end))
            .collect();
        (flat.text, leaves)
    }

    #[test]
    fn test_two_leaves_get_one_separator() {
        let (text, leaves) = flatten("<body><p>Hello</p><p>world.</p></body>");
        assert_eq!(text, "Hello world.");
        assert_eq!(
            leaves,
            vec![("Hello".to_string(), 0, 5), ("world.".to_string(), 6, 12)]
        );
    }

    #[test]
    fn test_whitespace_leaves_are_dropped() {
        let xml = "<body>\n  <p>  It   was\n</p>\n  <p><i>raining</i></p>\n</body>";
        let (text, leaves) = flatten(xml);
        assert_eq!(text, "It was raining");
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], ("It was".to_string(), 0, 6));
        assert_eq!(leaves[1], ("raining".to_string(), 7, 14));
    }

    #[test]
    fn test_document_order_is_preorder() {
        let xml = "<body><p>a<b>b<i>c</i></b>d</p><p>e</p></body>";
        let (text, _) = flatten(xml);
        assert_eq!(text, "a b c d e");
    }

    #[test]
    fn test_empty_document() {
        let doc = roxmltree::Document::parse("<body>  <p/> </body>").unwrap();
        let flat = accumulate(doc.root_element());
        assert!(flat.text.is_empty());
        assert!(flat.is_empty());
        assert_eq!(flat.char_len(), 0);
    }

    #[test]
    fn test_length_invariant() {
        let xml = "<body><h1>CHAPTER\n VIII.</h1><p>GERMANY: ANCIENT, \u{201C}MEDI\u{00C6}VAL\u{201D}</p><p> </p><p>end</p></body>";
        let doc = roxmltree::Document::parse(xml).unwrap();
        let flat = accumulate(doc.root_element());

        let sum: usize = flat.leaves.iter().map(|l| l.normalized.chars().count()).sum();
        let expected = sum + flat.leaves.len().saturating_sub(1);
        assert_eq!(flat.text.chars().count(), expected);
        assert_eq!(flat.char_len(), expected);

        for pair in flat.leaves.windows(2) {
            assert_eq!(pair[1].flat_start, pair[0].flat_end + 1);
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        let (text, leaves) = flatten("<body><p>one<!-- hidden --> two</p></body>");
        assert_eq!(text, "one two");
        assert_eq!(leaves.len(), 2);
    }
}
