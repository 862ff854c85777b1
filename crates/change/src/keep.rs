//! Keeping elements alive across a swap.
//!
//! An element marked with `sp-keep` survives a swap when the new content has
//! a partner for it. The old element then stays in the page (same
//! `NodeId`, same state) and the partner is discarded.

use crate::matcher::substitute_origin;
use crate::page::Page;
use bus::Notification;
use core_types::LayerId;
use css::SelectorList;
use dom::{Document, NodeId};
use focus::{capture_viewports, revive_viewports};
use serde_json::{Map, Value};
use std::fmt;

/// Restores state of a kept element once it reached its final position.
pub type Reviver = Box<dyn FnOnce(&mut Document)>;

/// Decision to keep `old` instead of inserting `new`.
pub struct KeepPlan {
    pub old: NodeId,
    pub new: NodeId,
    /// `sp-data` of the discarded partner.
    pub new_data: Value,
    pub revivers: Vec<Reviver>,
}

impl fmt::Debug for KeepPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepPlan")
            .field("old", &self.old)
            .field("new", &self.new)
            .field("new_data", &self.new_data)
            .field("revivers", &self.revivers.len())
            .finish()
    }
}

/// How a kept descendant gets out of the way of the outer swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relocation {
    /// Moved into the partner's position in the new content right away.
    Direct,
    /// Moved under the document's stable root, then into the partner's
    /// position once the new content is attached.
    Parked,
}

/// A kept descendant waiting for its final position.
#[derive(Debug)]
pub struct Transplant {
    pub plan: KeepPlan,
    pub relocation: Relocation,
}

/// The target the partner of `old` must match, if `old` wants to be kept.
fn partner_target(doc: &Document, old: NodeId, keep_attribute: &str) -> Option<String> {
    let marker = doc.attr(old, keep_attribute)?.trim();
    match marker {
        "false" => None,
        "" | "true" | "&" => css::derive_target(doc, old),
        selector => {
            let own = css::derive_target(doc, old);
            substitute_origin(selector, own.as_deref()).ok()
        }
    }
}

/// Parse the `sp-data` of `element`. Missing data is an empty object.
fn parse_data(doc: &Document, element: NodeId, data_attribute: &str) -> Value {
    let Some(raw) = doc.attr(element, data_attribute) else {
        return Value::Object(Map::new());
    };
    serde_json::from_str(raw).unwrap_or_else(|err| {
        log::warn!(target: "splice.keep", "ignoring invalid data on {element}: {err}");
        Value::Null
    })
}

/// Decide whether `old` survives being replaced by `new`.
///
/// The partner is searched among the descendants of `new`, or in the whole
/// subtree of `new` unless `descendants_only` is set. Listeners may veto.
pub fn find_keep_plan(
    page: &Page,
    old: NodeId,
    new: NodeId,
    descendants_only: bool,
    layer: LayerId,
) -> Option<KeepPlan> {
    let config = page.fragment_config();
    let (partner, new_data) = {
        let doc = page.document();
        let target = partner_target(&doc, old, &config.keep_attribute)?;
        let list = SelectorList::parse(&target).ok()?;
        let candidates = if descendants_only {
            css::query_all(&doc, new, &list)
        } else {
            css::subtree(&doc, new, &list)
        };
        let partner = candidates
            .into_iter()
            .find(|&p| doc.attr(p, &config.keep_attribute).map(str::trim) != Some("false"));
        let Some(partner) = partner else {
            log::trace!(target: "splice.keep", "{old} has no partner for {target}");
            return None;
        };
        (partner, parse_data(&doc, partner, &config.data_attribute))
    };

    let request = Notification::KeepRequested {
        layer,
        old,
        new: partner,
        new_data: new_data.clone(),
    };
    if page.emit(&request).is_prevented() {
        log::debug!(target: "splice.keep", "keeping {old} was prevented");
        return None;
    }
    log::debug!(target: "splice.keep", "keeping {old} instead of {partner}");
    Some(KeepPlan {
        old,
        new: partner,
        new_data,
        revivers: Vec::new(),
    })
}

/// Move keepable descendants of `old` out of the way before `old` is
/// swapped for `new`.
///
/// Each kept element leaves a clone in its place so that `old` still looks
/// complete while it transitions out. Scroll positions inside the kept
/// element are captured so they can be revived after the move.
pub fn preserve_descendants(page: &Page, old: NodeId, new: NodeId, layer: LayerId) -> Vec<Transplant> {
    let keepables: Vec<NodeId> = {
        let doc = page.document();
        let attr = &page.fragment_config().keep_attribute;
        doc.descendants(old)
            .filter(|&node| doc.has_attr(node, attr))
            .collect()
    };
    if keepables.is_empty() {
        return Vec::new();
    }
    let relocation = {
        let doc = page.document();
        // Parking under the stable root only works if it stays attached.
        if doc.contains(old, doc.stable_root()) {
            Relocation::Direct
        } else {
            Relocation::Parked
        }
    };

    let mut transplants: Vec<Transplant> = Vec::new();
    for keepable in keepables {
        if transplants
            .iter()
            .any(|t| page.document().contains(t.plan.old, keepable))
        {
            continue;
        }
        let Some(mut plan) = find_keep_plan(page, keepable, new, true, layer) else {
            continue;
        };
        let mut doc = page.document_mut();
        let cursors = capture_viewports(&doc, keepable);
        if !cursors.is_empty() {
            plan.revivers
                .push(Box::new(move |doc: &mut Document| revive_viewports(doc, &cursors)));
        }

        let stand_in = doc.clone_subtree(keepable);
        let placed = match doc.parent(keepable) {
            Some(parent) => doc.insert_before(parent, stand_in, Some(keepable)),
            None => Err(dom::DomError::Detached(keepable)),
        }
        .and_then(|()| match relocation {
            Relocation::Direct => doc.replace_with(plan.new, keepable),
            Relocation::Parked => {
                let parking = doc.stable_root();
                doc.append_child(parking, keepable)
            }
        });
        if let Err(err) = placed {
            log::warn!(target: "splice.keep", "could not relocate {keepable}: {err}");
            doc.detach(stand_in);
            continue;
        }
        log::trace!(target: "splice.keep", "relocated {keepable} ({relocation:?})");
        transplants.push(Transplant { plan, relocation });
    }
    transplants
}

/// Kept elements in their final position whose state still has to be
/// revived.
pub struct Placed {
    /// Each kept element with the data of its partner.
    pub kept: Vec<(NodeId, Value)>,
    pub revivers: Vec<Reviver>,
}

/// Put transplanted elements into their final position. Revivers are handed
/// back because a later move would reset what they restore.
pub fn place_descendants(page: &Page, transplants: Vec<Transplant>) -> Placed {
    let mut placed = Placed {
        kept: Vec::with_capacity(transplants.len()),
        revivers: Vec::new(),
    };
    let mut doc = page.document_mut();
    for Transplant { plan, relocation } in transplants {
        if relocation == Relocation::Parked {
            if let Err(err) = doc.replace_with(plan.new, plan.old) {
                log::warn!(target: "splice.keep", "could not place {}: {err}", plan.old);
                continue;
            }
        }
        placed.revivers.extend(plan.revivers);
        placed.kept.push((plan.old, plan.new_data));
    }
    placed
}

pub fn revive(page: &Page, revivers: Vec<Reviver>) {
    let mut doc = page.document_mut();
    for reviver in revivers {
        reviver(&mut doc);
    }
}

/// Put transplanted elements into their final position and revive their
/// state. Returns each kept element with the data of its partner.
pub fn restore_descendants(page: &Page, transplants: Vec<Transplant>) -> Vec<(NodeId, Value)> {
    let Placed { kept, revivers } = place_descendants(page, transplants);
    revive(page, revivers);
    kept
}
