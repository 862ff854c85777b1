//! Scroll offsets of scrollable elements.
//!
//! Moving an element to another parent resets the scroll offsets of its whole
//! subtree. A [`ViewportCursor`] remembers the offsets of one element so they
//! can be put back once the element reached its final position.

use dom::{Document, NodeId, ScrollOffset};

/// Scroll position of a single element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportCursor {
    pub element: NodeId,
    pub scroll_top: f32,
    pub scroll_left: f32,
}

impl ViewportCursor {
    /// Capture the current offsets of `element`.
    pub fn capture(doc: &Document, element: NodeId) -> Self {
        let offset = doc.scroll(element);
        Self {
            element,
            scroll_top: offset.top,
            scroll_left: offset.left,
        }
    }

    /// Reapply the captured offsets.
    pub fn revive(&self, doc: &mut Document) {
        doc.set_scroll(
            self.element,
            ScrollOffset {
                top: self.scroll_top,
                left: self.scroll_left,
            },
        );
    }
}

/// Cursors for every element in `root`'s subtree (including `root`) that is
/// currently scrolled away from the origin.
pub fn capture_viewports(doc: &Document, root: NodeId) -> Vec<ViewportCursor> {
    doc.subtree(root)
        .filter(|&node| doc.is_element(node) && !doc.scroll(node).is_zero())
        .map(|node| ViewportCursor::capture(doc, node))
        .collect()
}

/// Reapply all `cursors`.
pub fn revive_viewports(doc: &mut Document, cursors: &[ViewportCursor]) {
    for cursor in cursors {
        cursor.revive(doc);
    }
    if !cursors.is_empty() {
        log::trace!(target: "splice.focus", "revived {} viewports", cursors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_resets_scroll_and_revivers_restore_it() {
        let mut doc = Document::parse("<div id=a><div id=scroller><p>x</p></div></div><div id=b></div>");
        let body = doc.body().unwrap();
        let a = doc.first_element_child(body).unwrap();
        let b = doc.element_children(body).nth(1).unwrap();
        let scroller = doc.first_element_child(a).unwrap();
        doc.set_scroll(scroller, ScrollOffset { top: 40.0, left: 3.0 });

        let cursors = capture_viewports(&doc, a);
        assert_eq!(cursors.len(), 1);

        doc.append_child(b, a).unwrap();
        assert!(doc.scroll(scroller).is_zero());

        revive_viewports(&mut doc, &cursors);
        assert_eq!(doc.scroll(scroller), ScrollOffset { top: 40.0, left: 3.0 });
    }
}
