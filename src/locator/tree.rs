//! Document tree capability interface
//!
//! The locator only needs three things from a document tree: ordered
//! children, literal text of text nodes, and a way to tell text nodes from
//! containers. Any parser can plug in by implementing [`TextNode`].

/// Kind of a node as seen by the text accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf holding literal character content
    Text,
    /// Node whose children are visited
    Container,
    /// Comments, processing instructions and the like; never visited
    Other,
}

/// A node in a document tree
///
/// Handles are cheap to copy and compare; their identity is what ends up in
/// a resolved anchor.
pub trait TextNode<'a>: Copy {
    type Children: Iterator<Item = Self>;

    fn kind(&self) -> NodeKind;

    /// Children in document order
    fn children(&self) -> Self::Children;

    /// Literal content of a text node
    fn text(&self) -> Option<&'a str>;
}

impl<'a, 'input: 'a> TextNode<'a> for roxmltree::Node<'a, 'input> {
    type Children = roxmltree::Children<'a, 'input>;

    fn kind(&self) -> NodeKind {
        if self.is_text() {
            NodeKind::Text
        } else if self.is_element() || self.is_root() {
            NodeKind::Container
        } else {
            NodeKind::Other
        }
    }

    fn children(&self) -> Self::Children {
        roxmltree::Node::children(self)
    }

    fn text(&self) -> Option<&'a str> {
        if self.is_text() {
            roxmltree::Node::text(self)
        } else {
            None
        }
    }
}
