//! OPF (Open Packaging Format) parser
//!
//! Parses container.xml and the OPF file to extract metadata, manifest and spine.

use super::{BookMetadata, EpubError, ManifestItem, SpineItem};
use std::collections::HashMap;

/// Parsed OPF structure
pub struct ParsedOpf {
    pub metadata: BookMetadata,
    pub manifest: HashMap<String, ManifestItem>,
    pub spine: Vec<SpineItem>,
}

/// Find the OPF path declared in `META-INF/container.xml`
pub fn parse_container(content: &str) -> Result<String, EpubError> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| EpubError::XmlError(e.to_string()))?;

    doc.descendants()
        .find(|n| n.tag_name().name() == "rootfile")
        .and_then(|n| n.attribute("full-path"))
        .map(|s| s.to_string())
        .ok_or_else(|| EpubError::InvalidEpub("container.xml has no rootfile".to_string()))
}

/// Parse an OPF file
pub fn parse_opf(content: &str) -> Result<ParsedOpf, EpubError> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| EpubError::XmlError(e.to_string()))?;

    let metadata = parse_metadata(&doc);
    let manifest = parse_manifest(&doc);
    let spine = parse_spine(&doc, &manifest);

    Ok(ParsedOpf {
        metadata,
        manifest,
        spine,
    })
}

fn parse_metadata(doc: &roxmltree::Document) -> BookMetadata {
    let mut metadata = BookMetadata::default();

    for node in doc.descendants() {
        match node.tag_name().name() {
            "title" if metadata.title.is_empty() => {
                if let Some(text) = node.text() {
                    metadata.title = text.trim().to_string();
                }
            }
            "creator" => {
                if let Some(text) = node.text() {
                    metadata.creators.push(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    metadata
}

fn parse_manifest(doc: &roxmltree::Document) -> HashMap<String, ManifestItem> {
    let mut manifest = HashMap::new();

    for node in doc.descendants() {
        if node.tag_name().name() == "item" {
            if let (Some(id), Some(href), Some(media_type)) = (
                node.attribute("id"),
                node.attribute("href"),
                node.attribute("media-type"),
            ) {
                manifest.insert(
                    id.to_string(),
                    ManifestItem {
                        id: id.to_string(),
                        href: href.to_string(),
                        media_type: media_type.to_string(),
                    },
                );
            }
        }
    }

    manifest
}

/// Every itemref keeps its position; ones missing from the manifest become
/// unresolved placeholders so later items are numbered as reading systems do
fn parse_spine(
    doc: &roxmltree::Document,
    manifest: &HashMap<String, ManifestItem>,
) -> Vec<SpineItem> {
    let mut spine = Vec::new();

    for node in doc.descendants() {
        if node.tag_name().name() != "itemref" {
            continue;
        }
        let idref = node.attribute("idref").unwrap_or_default();
        match manifest.get(idref) {
            Some(item) => spine.push(SpineItem {
                idref: idref.to_string(),
                href: item.href.clone(),
                media_type: item.media_type.clone(),
            }),
            None => {
                tracing::warn!("Spine itemref '{}' is not in the manifest", idref);
                spine.push(SpineItem::unresolved(idref));
            }
        }
    }

    spine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container() {
        let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

        assert_eq!(parse_container(container).unwrap(), "OEBPS/content.opf");
        assert!(parse_container("<container/>").is_err());
    }

    #[test]
    fn test_parse_simple_opf() {
        let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Test Book</dc:title>
        <dc:creator>Test Author</dc:creator>
        <dc:identifier>urn:isbn:123</dc:identifier>
        <dc:language>en</dc:language>
    </metadata>
    <manifest>
        <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
        <item id="chapter1" href="text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
        <item id="css" href="style.css" media-type="text/css"/>
    </manifest>
    <spine>
        <itemref idref="cover" linear="no"/>
        <itemref idref="chapter1"/>
        <itemref idref="missing"/>
    </spine>
</package>"#;

        let parsed = parse_opf(opf).unwrap();
        assert_eq!(parsed.metadata.title, "Test Book");
        assert_eq!(parsed.metadata.creators, vec!["Test Author".to_string()]);
        assert_eq!(parsed.manifest.len(), 3);

        assert_eq!(parsed.spine.len(), 3);
        assert_eq!(parsed.spine[1].idref, "chapter1");
        assert_eq!(parsed.spine[1].href, "text/chapter%201.xhtml");
        assert!(parsed.spine[1].is_markup());

        let missing = &parsed.spine[2];
        assert_eq!(missing.idref, "missing");
        assert!(missing.href.is_empty());
        assert!(!missing.is_markup());
    }

    #[test]
    fn test_dangling_itemref_keeps_later_positions() {
        let opf = r#"<package><manifest>
            <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
        </manifest><spine>
            <itemref idref="gone"/>
            <itemref idref="b"/>
        </spine></package>"#;

        let parsed = parse_opf(opf).unwrap();
        assert_eq!(parsed.spine.len(), 2);
        assert_eq!(parsed.spine[1].idref, "b");
        assert_eq!(parsed.spine[1].href, "b.xhtml");
    }
}
