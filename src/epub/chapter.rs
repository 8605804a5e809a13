//! XHTML chapter documents
//!
//! Chapters are parsed as XML. Named HTML entities are not known to an XML
//! parser, so they are rewritten to numeric references first.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

use super::EpubError;

/// One spine item's markup, ready to parse
#[derive(Debug, Clone)]
pub struct ChapterDocument {
    /// Position in the spine (0-based, counts every itemref)
    pub spine_index: usize,
    pub href: String,
    markup: String,
}

impl ChapterDocument {
    pub fn new(spine_index: usize, href: impl Into<String>, source: &str) -> Self {
        Self {
            spine_index,
            href: href.into(),
            markup: rewrite_entities(source).into_owned(),
        }
    }

    /// Parse the chapter into a tree borrowing from this document
    pub fn parse(&self) -> Result<roxmltree::Document<'_>, EpubError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        roxmltree::Document::parse_with_options(&self.markup, options)
            .map_err(|e| EpubError::XmlError(format!("{}: {}", self.href, e)))
    }
}

/// The element whose text is searched: `<body>`, or the root element
pub fn text_root<'a, 'input>(doc: &'a roxmltree::Document<'input>) -> roxmltree::Node<'a, 'input> {
    doc.root_element()
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "body")
        .unwrap_or_else(|| doc.root_element())
}

const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Replace named HTML entities with numeric character references
///
/// XML's own entities (`amp`, `lt`, `gt`, `quot`, `apos`) and names HTML
/// does not define are left alone.
pub fn rewrite_entities(source: &str) -> Cow<'_, str> {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY.get_or_init(|| {
        Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity pattern is valid")
    });

    re.replace_all(source, |caps: &Captures| {
        if XML_ENTITIES.contains(&&caps[1]) {
            return caps[0].to_string();
        }
        match html_escape::decode_html_entities(&caps[0]) {
            Cow::Owned(decoded) => decoded.chars().map(|c| format!("&#{};", c as u32)).collect(),
            Cow::Borrowed(_) => caps[0].to_string(),
        }
    })
}
