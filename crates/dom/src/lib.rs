//! Arena-backed HTML document for the fragment engine.
//!
//! The document plays the role of the browser DOM: it owns every node, keeps
//! parent/child links consistent, and carries the live state the engine has
//! to preserve across swaps (focus, selection, scroll offsets).
//!
//! Response HTML is parsed into the *same* arena as a detached fragment, so
//! inserting a new element is a move and node identity (`NodeId`) survives.

mod builder;
mod document;
mod entities;
mod selection;
mod serialize;
mod tokenizer;
mod types;

pub use crate::document::{Ancestors, Descendants, Document};
pub use crate::selection::SelectionRange;
pub use crate::tokenizer::{Token, tokenize};
pub use crate::types::{Attribute, DomError, NodeId, NodeKind, ScrollOffset};

impl Document {
    /// Parse a whole page. Missing `html`, `head` or `body` elements are created.
    pub fn parse(html: &str) -> Document {
        let mut doc = Document::bare();
        let root = doc.root();
        builder::build_into(&mut doc, root, html);
        doc.ensure_skeleton();
        log::debug!(target: "dom.parse", "parsed document with {} nodes", doc.len());
        doc
    }

    /// Parse `html` into a new detached fragment node owned by this document.
    pub fn parse_fragment(&mut self, html: &str) -> NodeId {
        let fragment = self.create_fragment();
        builder::build_into(self, fragment, html);
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wraps_loose_content_in_body() {
        let doc = Document::parse("<div id=a>x</div>");
        let body = doc.body().unwrap();
        let div = doc.first_element_child(body).unwrap();
        assert_eq!(doc.attr(div, "id"), Some("a"));
        assert!(doc.head().is_some());
    }

    #[test]
    fn parse_keeps_existing_skeleton_and_doctype() {
        let doc = Document::parse(
            "<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>",
        );
        assert_eq!(
            doc.outer_html(doc.root()),
            "<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>"
        );
    }

    #[test]
    fn fragment_nodes_move_into_the_page() {
        let mut doc = Document::parse("<main></main>");
        let main = doc.first_element_child(doc.body().unwrap()).unwrap();
        let fragment = doc.parse_fragment("<p>new</p>");
        let p = doc.first_element_child(fragment).unwrap();
        assert!(!doc.is_connected(p));
        doc.append_child(main, p).unwrap();
        assert!(doc.is_connected(p));
        assert_eq!(doc.inner_html(main), "<p>new</p>");
    }
}
