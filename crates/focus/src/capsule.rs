//! Focus snapshots.

use css::{SelectorList, derive_target, subtree};
use dom::{Document, NodeId, ScrollOffset, SelectionRange};

/// Re-discoverable description of the focused element.
///
/// A capsule does not hold on to the element itself. It stores a selector
/// that finds the element (or its replacement) again, plus the cursor state
/// that the element had when the capsule was taken:
/// - the text selection, for inputs and textareas
/// - the element's own scroll offsets
///
/// Restoring is best-effort. When the selector no longer matches, nothing
/// happens.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusCapsule {
    target: String,
    selection: Option<SelectionRange>,
    scroll: ScrollOffset,
}

impl FocusCapsule {
    /// Capture the active element if it lies within `scope`.
    ///
    /// Returns `None` when nothing in `scope` has focus, or when no target
    /// can be derived for the focused element.
    pub fn preserve(doc: &Document, scope: NodeId) -> Option<Self> {
        let active = doc.active_element()?;
        if !doc.contains(scope, active) {
            return None;
        }
        let target = derive_target(doc, active)?;
        log::trace!(target: "splice.focus", "preserving focus of {active} as {target}");
        Some(Self {
            target,
            selection: doc.selection(active),
            scroll: doc.scroll(active),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// `true` when no connected element holds focus anymore, or focus sits
    /// in an element that is being swapped out.
    pub fn was_lost(doc: &Document) -> bool {
        doc.active_element()
            .is_none_or(|active| doc.is_destroying(active))
    }

    /// Find the element again inside `scope`.
    pub fn rediscover(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        let list = SelectorList::parse(&self.target).ok()?;
        subtree(doc, scope, &list)
            .into_iter()
            .find(|&node| !doc.is_destroying(node))
    }

    /// Put focus back if it was lost.
    ///
    /// Focuses the rediscovered element, then reapplies selection (clamped to
    /// the element's current value) and scroll offsets. Returns `false` when
    /// focus was not lost or nothing in `scope` matches.
    pub fn restore(&self, doc: &mut Document, scope: NodeId) -> bool {
        if !Self::was_lost(doc) {
            return false;
        }
        let Some(element) = self.rediscover(doc, scope) else {
            log::trace!(target: "splice.focus", "{} is gone, not restoring focus", self.target);
            return false;
        };
        if !doc.focus(element) {
            return false;
        }
        doc.set_selection(element, self.selection);
        doc.set_scroll(element, self.scroll);
        log::debug!(target: "splice.focus", "restored focus to {element} ({})", self.target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_input(doc: &Document) -> NodeId {
        doc.descendants(doc.root())
            .find(|&n| doc.tag_name(n) == Some("input"))
            .unwrap()
    }

    #[test]
    fn survives_a_replacement_and_clamps_the_selection() {
        let mut doc = Document::parse(r#"<form id=f><input name=q value="hello world"></form>"#);
        let body = doc.body().unwrap();
        let input = first_input(&doc);
        doc.focus(input);
        doc.set_selection(input, Some(SelectionRange::new(6, 11)));
        doc.set_scroll(input, ScrollOffset { top: 0.0, left: 12.0 });

        let capsule = FocusCapsule::preserve(&doc, body).unwrap();
        assert_eq!(capsule.target(), r#"input[name="q"]"#);

        let form = doc.first_element_child(body).unwrap();
        let fragment = doc.parse_fragment(r#"<form id=f><input name=q value="hello"></form>"#);
        let new_form = doc.first_element_child(fragment).unwrap();
        doc.replace_with(form, new_form).unwrap();
        assert!(FocusCapsule::was_lost(&doc));

        assert!(capsule.restore(&mut doc, body));
        let new_input = first_input(&doc);
        assert_ne!(new_input, input);
        assert_eq!(doc.active_element(), Some(new_input));
        assert_eq!(doc.selection(new_input), Some(SelectionRange::new(5, 5)));
        assert_eq!(doc.scroll(new_input).left, 12.0);
    }

    #[test]
    fn restore_is_a_no_op_when_focus_was_kept_or_target_vanished() {
        let mut doc = Document::parse("<input name=a><input name=b>");
        let body = doc.body().unwrap();
        let inputs: Vec<_> = doc.element_children(body).collect();
        doc.focus(inputs[0]);
        let capsule = FocusCapsule::preserve(&doc, body).unwrap();

        doc.focus(inputs[1]);
        assert!(!capsule.restore(&mut doc, body));
        assert_eq!(doc.active_element(), Some(inputs[1]));

        doc.blur();
        doc.detach(inputs[0]);
        assert!(!capsule.restore(&mut doc, body));
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn focus_outside_scope_is_not_captured() {
        let mut doc = Document::parse("<div id=a></div><input name=x>");
        let body = doc.body().unwrap();
        let div = doc.first_element_child(body).unwrap();
        let input = first_input(&doc);
        doc.focus(input);
        assert!(FocusCapsule::preserve(&doc, div).is_none());
    }
}
