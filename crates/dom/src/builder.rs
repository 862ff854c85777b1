//! Tree construction from a token stream.
//!
//! The builder keeps a stack of open elements. End tags pop up to the matching
//! open element; an end tag with no matching open element is ignored. Void
//! and self-closing elements are never pushed.

use crate::document::Document;
use crate::tokenizer::{Token, tokenize};
use crate::types::NodeId;
use std::sync::Arc;

/// Elements that close an open `<p>` when they start.
fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "nav"
            | "ul"
            | "ol"
            | "table"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

/// Elements whose start implicitly closes an open sibling of the same name.
fn closes_same_sibling(name: &str) -> bool {
    matches!(name, "li" | "option" | "dt" | "dd" | "tr" | "td" | "th")
}

pub(crate) fn build_into(doc: &mut Document, parent: NodeId, input: &str) {
    let tokens = tokenize(input);
    let mut open: Vec<NodeId> = Vec::new();

    for token in tokens {
        let current = open.last().copied().unwrap_or(parent);
        match token {
            Token::Doctype(doctype) => {
                if parent == doc.root() {
                    doc.set_doctype(doctype);
                }
            }
            Token::Comment(text) => {
                let node = doc.create_comment(&text);
                attach(doc, current, node);
            }
            Token::Text(text) => {
                let node = doc.create_text(&text);
                attach(doc, current, node);
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if closes_paragraph(&name) {
                    pop_through(doc, &mut open, "p", true);
                }
                if closes_same_sibling(&name) {
                    pop_through(doc, &mut open, &name, true);
                }
                let current = open.last().copied().unwrap_or(parent);
                let attributes = attributes
                    .into_iter()
                    .map(|(k, v)| (Arc::from(k), v))
                    .collect();
                let node = doc.create_element_with(&name, attributes);
                attach(doc, current, node);
                if !self_closing {
                    open.push(node);
                }
            }
            Token::EndTag(name) => {
                pop_through(doc, &mut open, &name, false);
            }
        }
    }
}

fn attach(doc: &mut Document, parent: NodeId, node: NodeId) {
    if let Err(err) = doc.append_child(parent, node) {
        log::warn!(target: "dom.parse", "dropping node {node}: {err}");
    }
}

/// Pop open elements up to and including the innermost `name`. When
/// `implicit` is set, only the top of the stack is considered so that an
/// implied close never crosses an unrelated open element.
fn pop_through(doc: &Document, open: &mut Vec<NodeId>, name: &str, implicit: bool) {
    let found = if implicit {
        open.last()
            .filter(|&&top| doc.tag_name(top) == Some(name))
            .map(|_| open.len() - 1)
    } else {
        open.iter().rposition(|&el| doc.tag_name(el) == Some(name))
    };
    if let Some(pos) = found {
        open.truncate(pos);
    }
}
