//! Finding targets in a layer or in a response.
//!
//! A target is CSS plus a few pseudo selectors expanded before parsing:
//! - `:layer` is the first swappable element of a layer
//! - `:main` is the first configured main target found in the layer
//! - `&` and `:origin` stand for the origin element
//!
//! Candidates in a layer must sit inside the layer's element, outside every
//! layer stacked above it, and must not be in the middle of being removed.

use crate::config::MatchMode;
use crate::error::ChangeError;
use crate::page::Page;
use core_types::LayerId;
use css::SelectorList;
use dom::{Document, NodeId};

pub const LAYER_PSEUDO: &str = ":layer";
pub const MAIN_PSEUDO: &str = ":main";

/// Replace `&` and `:origin` outside of quoted strings with `origin_target`.
pub fn substitute_origin(selector: &str, origin_target: Option<&str>) -> Result<String, ChangeError> {
    let mut out = String::with_capacity(selector.len());
    let mut quote: Option<char> = None;
    let mut rest = selector;
    while let Some(ch) = rest.chars().next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }
        let token_len = if ch == '&' {
            Some(1)
        } else if rest.starts_with(":origin") {
            Some(":origin".len())
        } else {
            None
        };
        match token_len {
            Some(len) => {
                let target = origin_target.ok_or_else(|| {
                    ChangeError::cannot_match(selector, "refers to an origin but none is known")
                })?;
                out.push_str(target);
                rest = &rest[len..];
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    Ok(out)
}

fn mentions_origin(selector: &str) -> bool {
    selector.contains('&') || selector.contains(":origin")
}

/// Resolves targets against the live document, scoped to one layer.
pub struct LayerMatcher<'a> {
    page: &'a Page,
    layer: LayerId,
    origin: Option<NodeId>,
}

impl<'a> LayerMatcher<'a> {
    pub fn new(page: &'a Page, layer: LayerId, origin: Option<NodeId>) -> Self {
        Self {
            page,
            layer,
            origin,
        }
    }

    /// Expand origin references and `:main` into a concrete target.
    ///
    /// Returns the expanded target together with its first match, or `None`
    /// when nothing in the layer matches.
    pub fn resolve(&self, target: &str) -> Result<Option<(String, NodeId)>, ChangeError> {
        let target = self.expand_origin(target)?;
        if target.trim() == MAIN_PSEUDO {
            for main in &self.page.fragment_config().main_targets {
                let main = self.expand_origin(main)?;
                if let Some(found) = self.find(&main)? {
                    log::trace!(target: "splice.resolve", ":main is {main} in {}", self.layer);
                    return Ok(Some((main, found)));
                }
            }
            return Ok(None);
        }
        Ok(self.find(&target)?.map(|found| (target, found)))
    }

    /// First element of the layer matching an already expanded target.
    pub fn find(&self, target: &str) -> Result<Option<NodeId>, ChangeError> {
        if target.trim() == LAYER_PSEUDO {
            return Ok(self.layer_element());
        }
        let list = SelectorList::parse(target)?;
        let candidates = self.candidates(&list);
        if candidates.is_empty() {
            log::trace!(target: "splice.resolve", "{target} matches nothing in {}", self.layer);
            return Ok(None);
        }
        let mode = self.page.fragment_config().match_mode;
        if let (MatchMode::Region, Some(origin)) = (mode, self.origin) {
            if let Some(found) = self.near_origin(origin, &list, &candidates) {
                return Ok(Some(found));
            }
        }
        Ok(candidates.first().copied())
    }

    /// Every element of the layer matching `list`, in document order.
    pub fn candidates(&self, list: &SelectorList) -> Vec<NodeId> {
        let stack = self.page.stack();
        let Some(layer) = stack.layer(self.layer) else {
            return Vec::new();
        };
        let above = stack.elements_above(self.layer);
        let doc = self.page.document();
        css::subtree(&doc, layer.element, list)
            .into_iter()
            .filter(|&node| {
                !doc.is_destroying(node) && !above.iter().any(|&a| doc.contains(a, node))
            })
            .collect()
    }

    /// The layer's first swappable element: `body` for the root layer, the
    /// first element inside an overlay's content box.
    pub fn layer_element(&self) -> Option<NodeId> {
        let stack = self.page.stack();
        let layer = stack.layer(self.layer)?;
        if layer.is_root() {
            return Some(layer.content);
        }
        let doc = self.page.document();
        doc.element_children(layer.content)
            .find(|&node| !doc.is_destroying(node))
    }

    /// Region preference: the origin itself or its closest matching ancestor,
    /// then a match inside the origin's closest region.
    fn near_origin(&self, origin: NodeId, list: &SelectorList, candidates: &[NodeId]) -> Option<NodeId> {
        let doc = self.page.document();
        if let Some(closest) = css::closest(&doc, origin, list) {
            if candidates.contains(&closest) {
                log::trace!(target: "splice.resolve", "{list} resolved to origin ancestor {closest}");
                return Some(closest);
            }
        }
        let regions = list.leading_compounds()?;
        let region = css::closest(&doc, origin, &regions)?;
        let found = candidates
            .iter()
            .copied()
            .find(|&c| c != region && doc.contains(region, c));
        if let Some(found) = found {
            log::trace!(target: "splice.resolve", "{list} resolved to {found} inside region {region}");
        }
        found
    }

    fn expand_origin(&self, target: &str) -> Result<String, ChangeError> {
        if !mentions_origin(target) {
            return Ok(target.to_string());
        }
        let derived = self
            .origin
            .and_then(|origin| css::derive_target(&self.page.document(), origin));
        substitute_origin(target, derived.as_deref())
    }
}

/// First element of the response fragment `root` matching an expanded target.
pub fn find_in_response(doc: &Document, root: NodeId, target: &str) -> Result<Option<NodeId>, ChangeError> {
    if target.trim() == LAYER_PSEUDO {
        return Ok(response_layer_element(doc, root));
    }
    let list = SelectorList::parse(target)?;
    Ok(css::subtree(doc, root, &list).into_iter().next())
}

/// `:layer` in a response: its `body` when it has one, else its first element.
pub fn response_layer_element(doc: &Document, root: NodeId) -> Option<NodeId> {
    doc.descendants(root)
        .find(|&node| doc.tag_name(node) == Some("body"))
        .or_else(|| doc.first_element_child(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_references_are_replaced_outside_quotes() {
        assert_eq!(
            substitute_origin(r#"& .item, [title="&"], :origin"#, Some("#card")).unwrap(),
            r##"#card .item, [title="&"], #card"##
        );
        assert!(substitute_origin("&", None).unwrap_err().is_cannot_match());
    }

    #[test]
    fn region_prefers_matches_near_the_origin() {
        let page = Page::parse(
            r#"<div class=card id=one><p class=title>1</p></div>
               <div class=card id=two><p class=title>2</p><a id=link>x</a></div>"#,
        );
        let origin = page.first("#link");
        let matcher = LayerMatcher::new(&page, LayerId::ROOT, origin);
        let (_, found) = matcher.resolve(".card .title").unwrap().unwrap();
        assert_eq!(page.document().text_content(found), "2");

        let anywhere = LayerMatcher::new(&page, LayerId::ROOT, None);
        let (_, found) = anywhere.resolve(".card .title").unwrap().unwrap();
        assert_eq!(page.document().text_content(found), "1");
    }

    #[test]
    fn main_expands_to_the_first_configured_target() {
        let page = Page::parse("<nav></nav><main id=m></main>");
        let matcher = LayerMatcher::new(&page, LayerId::ROOT, None);
        let (target, found) = matcher.resolve(":main").unwrap().unwrap();
        assert_eq!(target, "main");
        assert_eq!(Some(found), page.first("#m"));
    }

    #[test]
    fn elements_being_destroyed_are_invisible() {
        let page = Page::parse("<p class=x id=a></p><p class=x id=b></p>");
        let a = page.first("#a").unwrap();
        page.document_mut().mark_destroying(a);
        let matcher = LayerMatcher::new(&page, LayerId::ROOT, None);
        assert_eq!(matcher.find(".x").unwrap(), page.first("#b"));
    }

    #[test]
    fn response_layer_is_body_or_first_element() {
        let mut doc = Document::new();
        let fragment = doc.parse_fragment("<div id=x></div>");
        assert_eq!(response_layer_element(&doc, fragment), doc.first_element_child(fragment));
    }
}
