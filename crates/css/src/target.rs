//! Deriving a selector that finds an element again after it was replaced.

use crate::matching::query_first;
use crate::syntax::{SelectorList, escape_ident, quote_value};
use dom::{Document, NodeId};

/// Attribute that pins a derived target explicitly.
pub const ID_ATTRIBUTE: &str = "sp-id";

/// Classes with this prefix are engine state and never part of a target.
const INTERNAL_CLASS_PREFIX: &str = "sp-";

/// Tags that occur once per document.
fn is_unique_tag(tag: &str) -> bool {
    matches!(tag, "html" | "head" | "body" | "main")
}

fn is_named_control(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea" | "button" | "form")
}

/// Candidate targets for `node`, most specific first.
pub fn target_candidates(doc: &Document, node: NodeId) -> Vec<String> {
    let Some(tag) = doc.tag_name(node) else {
        return Vec::new();
    };
    let mut out = Vec::new();

    if let Some(value) = doc.attr(node, ID_ATTRIBUTE).filter(|v| !v.is_empty()) {
        out.push(format!("[{ID_ATTRIBUTE}={}]", quote_value(value)));
    }
    if let Some(id) = doc.id_attr(node).filter(|v| !v.is_empty()) {
        out.push(format!("#{}", escape_ident(id)));
    }
    if is_named_control(tag) {
        if let Some(name) = doc.attr(node, "name").filter(|v| !v.is_empty()) {
            out.push(format!("{tag}[name={}]", quote_value(name)));
        }
    }
    let classes: Vec<&str> = doc
        .classes(node)
        .filter(|c| !c.starts_with(INTERNAL_CLASS_PREFIX))
        .collect();
    if !classes.is_empty() {
        let mut selector = tag.to_string();
        for class in classes {
            selector.push('.');
            selector.push_str(&escape_ident(class));
        }
        out.push(selector);
    }
    if is_unique_tag(tag) {
        out.push(tag.to_string());
    }
    out
}

/// First candidate target that finds `node` again as the first match in the
/// tree `node` belongs to.
pub fn derive_target(doc: &Document, node: NodeId) -> Option<String> {
    let scope = doc.root_of(node);
    let derived = target_candidates(doc, node).into_iter().find(|candidate| {
        SelectorList::parse(candidate)
            .ok()
            .and_then(|list| first_in(doc, scope, &list))
            == Some(node)
    });
    if derived.is_none() {
        log::trace!(target: "splice.resolve", "no target derivable for {node}");
    }
    derived
}

fn first_in(doc: &Document, scope: NodeId, list: &SelectorList) -> Option<NodeId> {
    if crate::matching::matches(doc, scope, list) {
        return Some(scope);
    }
    query_first(doc, scope, list)
}
