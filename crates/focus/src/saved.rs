//! Per-key caches of focus and scroll state.
//!
//! A layer remembers where it was scrolled and what had focus for each
//! location it showed, so that navigating back can restore both.

use crate::capsule::FocusCapsule;
use css::{SelectorList, derive_target, subtree};
use dom::{Document, NodeId, ScrollOffset};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct SavedStates {
    focus: HashMap<String, FocusCapsule>,
    scroll: HashMap<String, Vec<(String, ScrollOffset)>>,
}

impl SavedStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_focus(&mut self, key: &str, capsule: FocusCapsule) {
        self.focus.insert(key.to_string(), capsule);
    }

    pub fn focus_for(&self, key: &str) -> Option<&FocusCapsule> {
        self.focus.get(key)
    }

    /// Remember the offsets of `viewports` under `key`. Viewports without a
    /// derivable target are skipped.
    pub fn save_scroll(
        &mut self,
        doc: &Document,
        key: &str,
        viewports: impl IntoIterator<Item = NodeId>,
    ) {
        let positions: Vec<(String, ScrollOffset)> = viewports
            .into_iter()
            .filter_map(|node| Some((derive_target(doc, node)?, doc.scroll(node))))
            .collect();
        log::trace!(
            target: "splice.focus",
            "saved {} scroll positions for {key}",
            positions.len()
        );
        self.scroll.insert(key.to_string(), positions);
    }

    /// Apply the offsets saved under `key` to matching viewports in `scope`.
    /// Returns `false` when nothing was saved for `key`.
    pub fn restore_scroll(&self, doc: &mut Document, key: &str, scope: NodeId) -> bool {
        let Some(positions) = self.scroll.get(key) else {
            return false;
        };
        for (target, offset) in positions {
            let Ok(list) = SelectorList::parse(target) else {
                continue;
            };
            if let Some(viewport) = subtree(doc, scope, &list).into_iter().next() {
                doc.set_scroll(viewport, *offset);
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.focus.clear();
        self.scroll.clear();
    }
}
