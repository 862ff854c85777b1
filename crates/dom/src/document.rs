//! Arena-backed mutable document.
//!
//! Invariants:
//! - A node has at most one parent; `children` and `parent` links always agree.
//! - Operations never create cycles.
//! - Node handles are never reused; detached nodes stay addressable.
//! - Detaching a connected subtree resets the scroll offsets of every node in it
//!   and blurs the active element if it was inside. Browsers behave the same way
//!   when nodes are moved, which is what makes scroll revivers necessary.

use crate::selection::SelectionRange;
use crate::types::{Attribute, DomError, NodeId, NodeKind, NodeRecord, ScrollOffset};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    root: NodeId,
    active_element: Option<NodeId>,
    revealed: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self::bare();
        doc.ensure_skeleton();
        doc
    }

    /// A document node without any children.
    pub(crate) fn bare() -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document { doctype: None })],
            root: NodeId(0),
            active_element: None,
            revealed: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.index()]
    }

    fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.index()]
    }

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        if self.contains_node(id) {
            Ok(())
        } else {
            Err(DomError::UnknownNode(id))
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    // --- Construction ---

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeId {
        self.push(NodeKind::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    pub(crate) fn set_doctype(&mut self, doctype: String) {
        let root = self.root;
        if let NodeKind::Document { doctype: dt } = &mut self.record_mut(root).kind {
            *dt = Some(doctype);
        }
    }

    /// Make sure `html > (head, body)` exist, moving loose top-level content into `body`.
    pub(crate) fn ensure_skeleton(&mut self) {
        let root = self.root;
        let html = match self.child_named(root, "html") {
            Some(html) => html,
            None => {
                let html = self.create_element("html");
                let loose: Vec<NodeId> = self.children(root).to_vec();
                for child in loose {
                    if matches!(self.kind(child), NodeKind::Comment { .. }) {
                        continue;
                    }
                    self.detach_quiet(child);
                    self.link_append(html, child);
                }
                self.link_append(root, html);
                html
            }
        };
        let body = match self.child_named(html, "body") {
            Some(body) => body,
            None => {
                let body = self.create_element("body");
                let loose: Vec<NodeId> = self
                    .children(html)
                    .iter()
                    .copied()
                    .filter(|&c| self.tag_name(c) != Some("head"))
                    .collect();
                for child in loose {
                    self.detach_quiet(child);
                    self.link_append(body, child);
                }
                self.link_append(html, body);
                body
            }
        };
        if self.child_named(html, "head").is_none() {
            let head = self.create_element("head");
            self.link_insert_before(html, head, body);
        }
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.tag_name(c) == Some(name))
    }

    // --- Navigation ---

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.record(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).parent
    }

    /// Parent only when it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.record(id).children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id).next()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.previous_sibling(id);
        while let Some(sibling) = cursor {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            cursor = self.previous_sibling(sibling);
        }
        None
    }

    /// Strict ancestors, closest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Strict descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// `id` followed by its descendants in document order.
    pub fn subtree(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Returns `true` if `other` is `ancestor` or inside it.
    pub fn contains(&self, ancestor: NodeId, other: NodeId) -> bool {
        other == ancestor || self.ancestors(other).any(|a| a == ancestor)
    }

    /// `id` followed by its ancestors.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// Topmost ancestor of `id` (the node itself when detached).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.root_of(id) == self.root
    }

    pub fn html(&self) -> Option<NodeId> {
        self.child_named(self.root, "html")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.html().and_then(|html| self.child_named(html, "body"))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.html().and_then(|html| self.child_named(html, "head"))
    }

    /// The element that stays attached for the whole page lifetime.
    pub fn stable_root(&self) -> NodeId {
        self.body().or_else(|| self.html()).unwrap_or(self.root)
    }

    // --- Elements and attributes ---

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.record(id).kind, NodeKind::Element { .. })
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.record(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.record(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Attribute value; boolean attributes read as `""`.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id)
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: Option<&str>) {
        if let NodeKind::Element { attributes, .. } = &mut self.record_mut(id).kind {
            let value = value.map(str::to_string);
            match attributes
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => *existing = value,
                None => attributes.push((Arc::from(name.to_ascii_lowercase()), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.record_mut(id).kind {
            attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    pub fn id_attr(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|v| !v.is_empty())
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.attr(id, "class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut list: Vec<String> = self.classes(id).map(str::to_string).collect();
        list.push(class.to_string());
        let joined = list.join(" ");
        self.set_attr(id, "class", Some(&joined));
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let joined = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", Some(&joined));
    }

    // --- Mutation ---

    fn ensure_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if !self.record(parent).allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if matches!(
            self.record(child).kind,
            NodeKind::Document { .. } | NodeKind::Fragment
        ) {
            return Err(DomError::InvalidParent(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn link_append(&mut self, parent: NodeId, child: NodeId) {
        self.record_mut(parent).children.push(child);
        self.record_mut(child).parent = Some(parent);
    }

    fn link_insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        let siblings = &mut self.record_mut(parent).children;
        let pos = siblings
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.record_mut(child).parent = Some(parent);
    }

    /// Unlink without touching live state. Used while building trees.
    fn detach_quiet(&mut self, id: NodeId) {
        if let Some(parent) = self.record_mut(id).parent.take() {
            self.record_mut(parent).children.retain(|&c| c != id);
        }
    }

    /// Remove `id` (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        let was_connected = self.is_connected(id);
        self.detach_quiet(id);
        if !was_connected {
            return;
        }
        let subtree: Vec<NodeId> = self.subtree(id).collect();
        for node in &subtree {
            self.record_mut(*node).state.scroll = ScrollOffset::ZERO;
        }
        if let Some(active) = self.active_element {
            if subtree.contains(&active) {
                log::trace!(target: "dom.focus", "blurring {active} after detaching {id}");
                self.active_element = None;
            }
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.ensure_insertable(parent, child)?;
        self.detach(child);
        self.link_append(parent, child);
        Ok(())
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.ensure_insertable(parent, child)?;
        self.detach(child);
        match self.children(parent).first().copied() {
            Some(first) => self.link_insert_before(parent, child, first),
            None => self.link_append(parent, child),
        }
        Ok(())
    }

    /// Insert `child` into `parent` before `reference`, or at the end when `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.ensure_insertable(parent, child)?;
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        if reference == child {
            return Ok(());
        }
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        self.detach(child);
        self.link_insert_before(parent, child, reference);
        Ok(())
    }

    /// Insert `child` as the next sibling of `target`.
    pub fn insert_after(&mut self, target: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(target).ok_or(DomError::Detached(target))?;
        let next = self.next_sibling(target);
        self.insert_before(parent, child, next)
    }

    /// Put `new` where `old` is, detaching `old`.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        if old == new {
            return Ok(());
        }
        self.insert_before(parent, new, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Deep-clone `id`. The clone is detached and carries markup only: no
    /// scroll, selection or destroying state, like `cloneNode(true)`.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let kind = self.record(id).kind.clone();
        let value = self.record(id).state.value.clone();
        let copy = self.push(kind);
        self.record_mut(copy).state.value = value;
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.link_append(copy, child_copy);
        }
        copy
    }

    /// Move all children of `id` into a new `<name>` element appended to `id`.
    pub fn wrap_children(&mut self, id: NodeId, name: &str) -> NodeId {
        let wrapper = self.create_element(name);
        let children = self.children(id).to_vec();
        for child in children {
            self.detach_quiet(child);
            self.link_append(wrapper, child);
        }
        self.link_append(id, wrapper);
        wrapper
    }

    /// Replace `wrapper` by its children.
    pub fn unwrap(&mut self, wrapper: NodeId) -> Result<(), DomError> {
        let parent = self.parent(wrapper).ok_or(DomError::Detached(wrapper))?;
        let children = self.children(wrapper).to_vec();
        for child in children {
            self.insert_before(parent, child, Some(wrapper))?;
        }
        self.detach(wrapper);
        Ok(())
    }

    /// Remove all children of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.detach(child);
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let NodeKind::Text { text } | NodeKind::Comment { text } = &mut self.record_mut(id).kind {
            text.clear();
            text.push_str(value);
            return;
        }
        if matches!(
            self.record(id).kind,
            NodeKind::Element { .. } | NodeKind::Fragment
        ) {
            self.clear_children(id);
            let text = self.create_text(value);
            self.link_append(id, text);
        }
    }

    // --- Live state ---

    pub fn scroll(&self, id: NodeId) -> ScrollOffset {
        self.record(id).state.scroll
    }

    pub fn set_scroll(&mut self, id: NodeId, offset: ScrollOffset) {
        self.record_mut(id).state.scroll = offset;
    }

    /// Current value of a form control: live value, then `value` attribute,
    /// then text content for `<textarea>`.
    pub fn value(&self, id: NodeId) -> Option<String> {
        if let Some(value) = &self.record(id).state.value {
            return Some(value.clone());
        }
        match self.tag_name(id)? {
            "textarea" => Some(self.text_content(id)),
            "input" | "select" | "option" | "button" => {
                Some(self.attr(id, "value").unwrap_or("").to_string())
            }
            _ => None,
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        let state = &mut self.record_mut(id).state;
        state.value = Some(value.to_string());
        if let Some(selection) = state.selection {
            state.selection = Some(selection.clamp_to(value));
        }
    }

    pub fn selection(&self, id: NodeId) -> Option<SelectionRange> {
        self.record(id).state.selection
    }

    pub fn set_selection(&mut self, id: NodeId, selection: Option<SelectionRange>) {
        let clamped = match (selection, self.value(id)) {
            (Some(range), Some(value)) => Some(range.clamp_to(&value)),
            (other, _) => other,
        };
        self.record_mut(id).state.selection = clamped;
    }

    /// The focused element, if it is still connected.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element.filter(|&id| self.is_connected(id))
    }

    /// Focus a connected element. Returns `false` when the element cannot take focus.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_connected(id) {
            return false;
        }
        self.active_element = Some(id);
        true
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    /// Mark an element as being swapped out.
    pub fn mark_destroying(&mut self, id: NodeId) {
        self.record_mut(id).state.destroying = true;
    }

    /// `true` when the element or one of its ancestors is being destroyed.
    pub fn is_destroying(&self, id: NodeId) -> bool {
        self.self_and_ancestors(id)
            .any(|node| self.record(node).state.destroying)
    }

    /// Record that `id` was scrolled into view.
    pub fn reveal(&mut self, id: NodeId) {
        self.revealed = Some(id);
    }

    pub fn revealed(&self) -> Option<NodeId> {
        self.revealed
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.subtree(id) {
            if let NodeKind::Text { text } = &self.record(node).kind {
                out.push_str(text);
            }
        }
        out
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let outer = doc.create_element("div");
        let inner = doc.create_element("p");
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        (doc, body, outer, inner)
    }

    #[test]
    fn new_document_has_skeleton() {
        let doc = Document::new();
        let html = doc.html().unwrap();
        let tags: Vec<_> = doc
            .element_children(html)
            .map(|c| doc.tag_name(c).unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["head", "body"]);
    }

    #[test]
    fn append_moves_node_between_parents() {
        let (mut doc, body, outer, inner) = sample();
        doc.append_child(body, inner).unwrap();
        assert_eq!(doc.parent(inner), Some(body));
        assert!(doc.children(outer).is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut doc, _body, outer, inner) = sample();
        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::CycleDetected {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn detaching_resets_scroll_and_blurs() {
        let (mut doc, _body, outer, inner) = sample();
        doc.set_scroll(inner, ScrollOffset { top: 40.0, left: 0.0 });
        assert!(doc.focus(inner));
        doc.detach(outer);
        assert!(doc.scroll(inner).is_zero());
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn clone_is_detached_and_stateless() {
        let (mut doc, _body, outer, inner) = sample();
        doc.set_attr(inner, "class", Some("x"));
        doc.set_scroll(inner, ScrollOffset { top: 5.0, left: 1.0 });
        let copy = doc.clone_subtree(outer);
        assert_ne!(copy, outer);
        assert_eq!(doc.parent(copy), None);
        let inner_copy = doc.first_element_child(copy).unwrap();
        assert_eq!(doc.attr(inner_copy, "class"), Some("x"));
        assert!(doc.scroll(inner_copy).is_zero());
    }

    #[test]
    fn wrap_and_unwrap_keep_child_order() {
        let (mut doc, body, outer, inner) = sample();
        let extra = doc.create_text("tail");
        doc.append_child(outer, extra).unwrap();
        let wrapper = doc.wrap_children(outer, "sp-wrapper");
        assert_eq!(doc.children(outer), &[wrapper]);
        assert_eq!(doc.children(wrapper), &[inner, extra]);
        doc.unwrap(wrapper).unwrap();
        assert_eq!(doc.children(outer), &[inner, extra]);
        assert!(doc.contains(body, inner));
    }

    #[test]
    fn destroying_mark_is_inherited() {
        let (mut doc, _body, outer, inner) = sample();
        doc.mark_destroying(outer);
        assert!(doc.is_destroying(inner));
    }

    #[test]
    fn class_helpers_edit_class_attribute() {
        let (mut doc, _body, outer, _inner) = sample();
        doc.add_class(outer, "a");
        doc.add_class(outer, "b");
        doc.add_class(outer, "a");
        assert_eq!(doc.attr(outer, "class"), Some("a b"));
        doc.remove_class(outer, "a");
        assert_eq!(doc.attr(outer, "class"), Some("b"));
    }

    #[test]
    fn selection_is_clamped_to_value() {
        let (mut doc, body, _outer, _inner) = sample();
        let input = doc.create_element("input");
        doc.append_child(body, input).unwrap();
        doc.set_value(input, "abc");
        doc.set_selection(input, Some(SelectionRange::new(1, 10)));
        assert_eq!(doc.selection(input), Some(SelectionRange::new(1, 3)));
    }
}
