//! Focus and scroll handling after a fragment was inserted.

use crate::matcher::LayerMatcher;
use crate::page::Page;
use core_types::LayerId;
use css::SelectorList;
use dom::{Document, NodeId, ScrollOffset};
use focus::{FocusCapsule, FocusOption, ScrollOption};

/// The element an overlay focuses when it opens: the box around its
/// content. `body` for the root layer.
pub(crate) fn layer_box(doc: &Document, content: NodeId, is_root: bool) -> NodeId {
    if is_root {
        return content;
    }
    doc.parent(content).unwrap_or(content)
}

/// The scrolling element of a layer: `html` for the root layer, the overlay's
/// viewport otherwise.
pub(crate) fn layer_viewport(doc: &Document, element: NodeId, content: NodeId, is_root: bool) -> NodeId {
    if is_root {
        return element;
    }
    doc.parent(content)
        .and_then(|b| doc.parent(b))
        .unwrap_or(element)
}

/// Apply `option` for `fragment`. Returns `true` when focus moved.
pub(crate) fn handle_focus(
    page: &Page,
    layer: LayerId,
    fragment: NodeId,
    option: &FocusOption,
    capsule: Option<&FocusCapsule>,
) -> bool {
    let Some((element, content, is_root, key)) = page
        .stack()
        .layer(layer)
        .map(|l| (l.element, l.content, l.is_root(), l.saved_state_key()))
    else {
        return false;
    };
    let focused = match option {
        FocusOption::False => return false,
        FocusOption::Keep => restore_capsule(page, capsule, element),
        FocusOption::Target => page.document_mut().focus(fragment),
        FocusOption::Layer => {
            let mut doc = page.document_mut();
            let target = layer_box(&doc, content, is_root);
            doc.focus(target)
        }
        FocusOption::Auto => {
            let autofocus = {
                let doc = page.document();
                SelectorList::parse(&page.fragment_config().autofocus_selector)
                    .ok()
                    .and_then(|list| css::subtree(&doc, fragment, &list).into_iter().next())
            };
            match autofocus {
                Some(target) => page.document_mut().focus(target),
                None => restore_capsule(page, capsule, element),
            }
        }
        FocusOption::Restore => {
            let saved = page.stack().layer(layer).and_then(|l| l.saved.focus_for(&key).cloned());
            restore_capsule(page, saved.as_ref(), element)
        }
        FocusOption::Selector(selector) => {
            match LayerMatcher::new(page, layer, Some(fragment)).resolve(selector) {
                Ok(Some((_, target))) => page.document_mut().focus(target),
                Ok(None) => false,
                Err(err) => {
                    log::warn!(target: "splice.focus", "cannot focus {selector}: {err}");
                    false
                }
            }
        }
    };
    if focused {
        log::debug!(target: "splice.focus", "focus {option} applied in {layer}");
    }
    focused
}

fn restore_capsule(page: &Page, capsule: Option<&FocusCapsule>, scope: NodeId) -> bool {
    capsule.is_some_and(|capsule| capsule.restore(&mut page.document_mut(), scope))
}

/// Apply `option` for `fragment`. Returns `true` when something scrolled.
pub(crate) fn handle_scroll(page: &Page, layer: LayerId, fragment: NodeId, option: &ScrollOption) -> bool {
    if let ScrollOption::Selector(selector) = option {
        return match LayerMatcher::new(page, layer, Some(fragment)).resolve(selector) {
            Ok(Some((_, target))) => {
                page.document_mut().reveal(target);
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::warn!(target: "splice.focus", "cannot scroll to {selector}: {err}");
                false
            }
        };
    }
    let stack = page.stack();
    let Some(l) = stack.layer(layer) else {
        return false;
    };
    let mut doc = page.document_mut();
    let viewport = layer_viewport(&doc, l.element, l.content, l.is_root());
    match option {
        ScrollOption::False | ScrollOption::Selector(_) => false,
        ScrollOption::Target => {
            doc.reveal(fragment);
            true
        }
        ScrollOption::Top => {
            doc.set_scroll(viewport, ScrollOffset::ZERO);
            true
        }
        ScrollOption::Layer => {
            doc.set_scroll(viewport, ScrollOffset::ZERO);
            doc.reveal(l.element);
            true
        }
        ScrollOption::Reset => {
            let scrolled: Vec<NodeId> = doc
                .subtree(l.element)
                .filter(|&node| !doc.scroll(node).is_zero())
                .collect();
            for node in scrolled {
                doc.set_scroll(node, ScrollOffset::ZERO);
            }
            true
        }
        ScrollOption::Restore => l.saved.restore_scroll(&mut doc, &l.saved_state_key(), l.element),
    }
}

/// Remember focus and scroll positions of `layer` under its current location.
pub(crate) fn save_layer_state(page: &Page, layer: LayerId) {
    let (capsule, viewports, key) = {
        let stack = page.stack();
        let Some(l) = stack.layer(layer) else {
            return;
        };
        let doc = page.document();
        let above = stack.elements_above(layer);
        let viewports: Vec<NodeId> = doc
            .subtree(l.element)
            .filter(|&node| !doc.scroll(node).is_zero())
            .filter(|&node| !above.iter().any(|&a| doc.contains(a, node)))
            .collect();
        (FocusCapsule::preserve(&doc, l.element), viewports, l.saved_state_key())
    };
    let mut stack = page.stack_mut();
    let Some(l) = stack.layer_mut(layer) else {
        return;
    };
    if let Some(capsule) = capsule {
        l.saved.save_focus(&key, capsule);
    }
    l.saved.save_scroll(&page.document(), &key, viewports);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_focus_prefers_autofocus_then_keeps_lost_focus() {
        let page = Page::parse(r#"<div id=f><input name=a autofocus><input name=b></div>"#);
        let fragment = page.first("#f").unwrap();
        assert!(handle_focus(&page, LayerId::ROOT, fragment, &FocusOption::Auto, None));
        assert_eq!(page.document().active_element(), page.first("input[name=a]"));

        let b = page.first("input[name=b]").unwrap();
        page.document_mut().focus(b);
        let capsule = FocusCapsule::preserve(&page.document(), fragment).unwrap();
        assert!(!handle_focus(&page, LayerId::ROOT, b, &FocusOption::Auto, Some(&capsule)));
        assert_eq!(page.document().active_element(), Some(b));
    }

    #[test]
    fn scroll_options() {
        let page = Page::parse("<div id=a></div><div id=b></div>");
        let a = page.first("#a").unwrap();
        let html = page.first("html").unwrap();
        page.document_mut().set_scroll(html, ScrollOffset { top: 10.0, left: 0.0 });
        page.document_mut().set_scroll(a, ScrollOffset { top: 5.0, left: 0.0 });

        assert!(!handle_scroll(&page, LayerId::ROOT, a, &ScrollOption::False));
        assert!(handle_scroll(&page, LayerId::ROOT, a, &ScrollOption::Selector("#b".into())));
        assert_eq!(page.document().revealed(), page.first("#b"));
        assert!(handle_scroll(&page, LayerId::ROOT, a, &ScrollOption::Top));
        assert!(page.document().scroll(html).is_zero());
        assert!(handle_scroll(&page, LayerId::ROOT, a, &ScrollOption::Reset));
        assert!(page.document().scroll(a).is_zero());
    }
}
