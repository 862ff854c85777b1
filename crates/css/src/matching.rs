use crate::syntax::{Combinator, ComplexSelector, Compound, SelectorList};
use dom::{Document, NodeId};

/// Does `node` match any selector of `list`?
pub fn matches(doc: &Document, node: NodeId, list: &SelectorList) -> bool {
    doc.is_element(node)
        && list
            .selectors
            .iter()
            .any(|selector| matches_complex(doc, node, selector))
}

/// Closest inclusive ancestor of `node` matching `list`.
pub fn closest(doc: &Document, node: NodeId, list: &SelectorList) -> Option<NodeId> {
    doc.self_and_ancestors(node)
        .find(|&candidate| matches(doc, candidate, list))
}

/// Descendants of `scope` matching `list`, in document order.
pub fn query_all(doc: &Document, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
    doc.descendants(scope)
        .filter(|&node| matches(doc, node, list))
        .collect()
}

pub fn query_first(doc: &Document, scope: NodeId, list: &SelectorList) -> Option<NodeId> {
    doc.descendants(scope).find(|&node| matches(doc, node, list))
}

/// Like [`query_all`] but `scope` itself is a candidate as well.
pub fn subtree(doc: &Document, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
    doc.subtree(scope)
        .filter(|&node| matches(doc, node, list))
        .collect()
}

fn matches_complex(doc: &Document, node: NodeId, selector: &ComplexSelector) -> bool {
    let parts = &selector.parts;
    let Some(last) = parts.last() else {
        return false;
    };
    if !matches_compound(doc, node, &last.compound) {
        return false;
    }
    matches_left(doc, node, parts, parts.len() - 1)
}

/// Match `parts[..index]` against the context of `node`, which already
/// matched `parts[index]`. Backtracks over descendant and sibling choices.
fn matches_left(doc: &Document, node: NodeId, parts: &[crate::syntax::Part], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let left = &parts[index - 1].compound;
    let combinator = parts[index].combinator.unwrap_or(Combinator::Descendant);
    match combinator {
        Combinator::Child => doc
            .parent_element(node)
            .is_some_and(|p| matches_compound(doc, p, left) && matches_left(doc, p, parts, index - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .filter(|&a| doc.is_element(a))
            .any(|a| matches_compound(doc, a, left) && matches_left(doc, a, parts, index - 1)),
        Combinator::NextSibling => doc
            .previous_element_sibling(node)
            .is_some_and(|s| matches_compound(doc, s, left) && matches_left(doc, s, parts, index - 1)),
        Combinator::SubsequentSibling => {
            let mut cursor = doc.previous_element_sibling(node);
            while let Some(sibling) = cursor {
                if matches_compound(doc, sibling, left) && matches_left(doc, sibling, parts, index - 1)
                {
                    return true;
                }
                cursor = doc.previous_element_sibling(sibling);
            }
            false
        }
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if compound.tag.as_deref().is_some_and(|want| want != tag) {
        return false;
    }
    if let Some(id) = &compound.id {
        if doc.attr(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| doc.has_class(node, class)) {
        return false;
    }
    for condition in &compound.attrs {
        let Some(actual) = doc.attr(node, condition.key()) else {
            return false;
        };
        if !condition.test(actual) {
            return false;
        }
    }
    !compound
        .negations
        .iter()
        .any(|negated| matches(doc, node, negated))
}
