//! The ordered collection of open layers.
//!
//! Index 0 is always the root layer; higher indices are further in front.
//! The layer at index `i` is the parent of the layer at `i + 1`. All
//! relations are computed from positions, never stored.

use crate::error::LayerError;
use crate::layer::Layer;
use crate::lookup::{GetOptions, LayerRef};
use core_types::LayerId;
use dom::{Document, NodeId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
    overrides: Rc<RefCell<Vec<LayerId>>>,
    next_id: u64,
}

/// Pops a current-layer override when dropped.
#[must_use = "the override ends when the guard is dropped"]
pub struct CurrentGuard {
    overrides: Rc<RefCell<Vec<LayerId>>>,
    layer: LayerId,
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let popped = self.overrides.borrow_mut().pop();
        debug_assert_eq!(popped, Some(self.layer), "current overrides must nest");
    }
}

impl LayerStack {
    pub fn new(root: Layer) -> Self {
        assert!(root.is_root(), "the first layer must be the root layer");
        let stack = Self {
            layers: vec![root],
            overrides: Rc::new(RefCell::new(Vec::new())),
            next_id: 1,
        };
        stack.debug_assert_invariants();
        stack
    }

    /// Reserve an id for a layer about to be opened.
    pub fn next_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- Mutation ---

    /// Put `layer` in front of the current front layer.
    pub fn push(&mut self, layer: Layer) {
        log::debug!(
            target: "splice.layer",
            "push {} ({}) above {}",
            layer.id(),
            layer.mode,
            self.front().id()
        );
        self.layers.push(layer);
        self.debug_assert_invariants();
    }

    /// Take the front layer `id` off the stack.
    pub fn remove(&mut self, id: LayerId) -> Result<Layer, LayerError> {
        let index = self.index_of(id).ok_or(LayerError::NotOpen(id))?;
        if index == 0 {
            return Err(LayerError::RootNotClosable);
        }
        if index + 1 != self.layers.len() {
            return Err(LayerError::HasDescendants(id));
        }
        let layer = self.layers.remove(index);
        log::debug!(target: "splice.layer", "removed {id}, {} layers left", self.count());
        self.debug_assert_invariants();
        Ok(layer)
    }

    /// Descendants of `id` in the order they must be closed: frontmost first.
    pub fn peel_order(&self, id: LayerId) -> Vec<LayerId> {
        let mut order = self.descendants_of(id);
        order.reverse();
        order
    }

    // --- Topology ---

    pub fn count(&self) -> usize {
        self.layers.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn root(&self) -> &Layer {
        &self.layers[0]
    }

    pub fn front(&self) -> &Layer {
        // The root layer is never removed.
        &self.layers[self.layers.len() - 1]
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn is_open(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    pub fn parent_of(&self, id: LayerId) -> Option<LayerId> {
        let index = self.index_of(id)?;
        index.checked_sub(1).map(|i| self.layers[i].id())
    }

    pub fn child_of(&self, id: LayerId) -> Option<LayerId> {
        let index = self.index_of(id)?;
        self.layers.get(index + 1).map(Layer::id)
    }

    /// Closest ancestor first.
    pub fn ancestors_of(&self, id: LayerId) -> Vec<LayerId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        self.layers[..index].iter().rev().map(Layer::id).collect()
    }

    /// Closest descendant first.
    pub fn descendants_of(&self, id: LayerId) -> Vec<LayerId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        self.layers[index + 1..].iter().map(Layer::id).collect()
    }

    /// The frontmost layer whose element contains `node`.
    pub fn layer_of_element(&self, doc: &Document, node: NodeId) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|layer| doc.contains(layer.element, node))
            .map(Layer::id)
    }

    /// Elements of the layers in front of `id`. Content inside them does not
    /// belong to `id` even though it sits inside `id`'s element.
    pub fn elements_above(&self, id: LayerId) -> Vec<NodeId> {
        self.descendants_of(id)
            .into_iter()
            .filter_map(|d| self.layer(d).map(|l| l.element))
            .collect()
    }

    // --- Current layer ---

    /// The innermost override that is still open, else the front layer.
    pub fn current(&self) -> &Layer {
        let overrides = self.overrides.borrow();
        overrides
            .iter()
            .rev()
            .find_map(|&id| self.layer(id))
            .unwrap_or_else(|| self.front())
    }

    pub fn current_id(&self) -> LayerId {
        self.current().id()
    }

    /// Make `layer` the current layer until the guard is dropped.
    pub fn push_current(&self, layer: LayerId) -> CurrentGuard {
        self.overrides.borrow_mut().push(layer);
        CurrentGuard {
            overrides: Rc::clone(&self.overrides),
            layer,
        }
    }

    /// Run `f` with `layer` as the current layer.
    pub fn as_current<R>(&self, layer: LayerId, f: impl FnOnce() -> R) -> R {
        let _guard = self.push_current(layer);
        f()
    }

    // --- Lookup ---

    pub fn get(&self, doc: &Document, reference: &LayerRef, options: GetOptions) -> Option<LayerId> {
        self.get_all(doc, reference, options).into_iter().next()
    }

    pub fn get_all(&self, doc: &Document, reference: &LayerRef, options: GetOptions) -> Vec<LayerId> {
        let base = options
            .base
            .filter(|&b| self.is_open(b))
            .unwrap_or_else(|| self.current_id());
        match reference {
            LayerRef::Id(id) => self.is_open(*id).then_some(*id).into_iter().collect(),
            LayerRef::Index(index) => self.layers.get(*index).map(Layer::id).into_iter().collect(),
            LayerRef::Element(node) => self.layer_of_element(doc, *node).into_iter().collect(),
            LayerRef::Current => vec![self.current_id()],
            LayerRef::Front => vec![self.front().id()],
            LayerRef::Root => vec![self.root().id()],
            LayerRef::Parent => self.parent_of(base).into_iter().collect(),
            LayerRef::Child => self.child_of(base).into_iter().collect(),
            LayerRef::Ancestors => self.ancestors_of(base),
            LayerRef::Descendants => self.descendants_of(base),
            LayerRef::Closest => {
                let mut out = vec![base];
                out.extend(self.ancestors_of(base));
                out
            }
            LayerRef::Overlay => self
                .layers
                .iter()
                .rev()
                .filter(|l| l.is_overlay())
                .map(Layer::id)
                .collect(),
            LayerRef::Any => {
                let mut out = vec![base];
                out.extend(self.layers.iter().rev().map(Layer::id).filter(|&id| id != base));
                out
            }
            LayerRef::New => Vec::new(),
            LayerRef::Origin => options
                .origin
                .and_then(|node| self.layer_of_element(doc, node))
                .into_iter()
                .collect(),
            LayerRef::List(refs) => {
                let mut out: Vec<LayerId> = Vec::new();
                for r in refs {
                    for id in self.get_all(doc, r, options) {
                        if !out.contains(&id) {
                            out.push(id);
                        }
                    }
                }
                out
            }
        }
    }

    // --- Invariants ---

    /// Exactly one root at index 0, unique ids, unique elements.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !self.root().is_root() {
            return Err("index 0 is not the root layer".into());
        }
        if let Some(extra) = self.layers[1..].iter().find(|l| l.is_root()) {
            return Err(format!("second root layer {}", extra.id()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if self.layers[..i].iter().any(|l| l.id() == layer.id()) {
                return Err(format!("duplicate layer {}", layer.id()));
            }
            if i > 0 && self.layers[..i].iter().any(|l| l.element == layer.element) {
                return Err(format!("{} shares its element", layer.id()));
            }
        }
        Ok(())
    }

    fn debug_assert_invariants(&self) {
        if cfg!(debug_assertions) {
            if let Err(problem) = self.check_invariants() {
                panic!("layer stack invariant violated: {problem}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use core_types::LayerMode;

    struct Fixture {
        doc: Document,
        stack: LayerStack,
    }

    impl Fixture {
        fn new() -> Self {
            let doc = Document::parse("<main>root</main>");
            let html = doc.html().unwrap();
            let body = doc.body().unwrap();
            let stack = LayerStack::new(Layer::root(html, body, LayerConfig::default()));
            Self { doc, stack }
        }

        fn open(&mut self, mode: LayerMode) -> LayerId {
            let body = self.doc.body().unwrap();
            let element = self.doc.create_element("sp-modal");
            let content = self.doc.create_element("sp-modal-content");
            self.doc.append_child(element, content).unwrap();
            self.doc.append_child(body, element).unwrap();
            let id = self.stack.next_id();
            self.stack
                .push(Layer::overlay(id, mode, element, content, LayerConfig::default()));
            id
        }

        fn close(&mut self, id: LayerId) {
            for descendant in self.stack.peel_order(id) {
                self.stack.remove(descendant).unwrap();
            }
            self.stack.remove(id).unwrap();
        }
    }

    #[test]
    fn relations_follow_positions() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        let b = fx.open(LayerMode::Drawer);
        let root = fx.stack.root().id();

        assert_eq!(fx.stack.count(), 3);
        assert_eq!(fx.stack.parent_of(b), Some(a));
        assert_eq!(fx.stack.child_of(root), Some(a));
        assert_eq!(fx.stack.ancestors_of(b), vec![a, root]);
        assert_eq!(fx.stack.descendants_of(root), vec![a, b]);
        assert_eq!(fx.stack.peel_order(root), vec![b, a]);
        assert_eq!(fx.stack.front().id(), b);
        assert_eq!(fx.stack.current_id(), b);
    }

    #[test]
    fn open_close_sequences_keep_the_stack_consistent() {
        let mut fx = Fixture::new();
        let modes = [LayerMode::Modal, LayerMode::Popup, LayerMode::Cover];
        for round in 0..12 {
            let count = fx.stack.count();
            if round % 3 == 2 && count > 1 {
                let victim = fx.stack.layers[1 + round % (count - 1)].id();
                fx.close(victim);
            } else {
                fx.open(modes[round % modes.len()].clone());
            }
            fx.stack.check_invariants().unwrap();
            let ids: Vec<LayerId> = fx.stack.iter().map(Layer::id).collect();
            for i in 1..ids.len() {
                assert_eq!(fx.stack.parent_of(ids[i]), Some(ids[i - 1]));
            }
            let parentless = ids.iter().filter(|&&id| fx.stack.parent_of(id).is_none());
            assert_eq!(parentless.count(), 1);
        }
    }

    #[test]
    fn peeling_leaves_the_layer_in_front() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        fx.open(LayerMode::Modal);
        fx.open(LayerMode::Popup);
        for id in fx.stack.peel_order(a) {
            fx.stack.remove(id).unwrap();
        }
        assert!(fx.stack.descendants_of(a).is_empty());
        assert_eq!(fx.stack.front().id(), a);
    }

    #[test]
    fn removal_preconditions() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        fx.open(LayerMode::Modal);
        assert!(matches!(fx.stack.remove(LayerId::ROOT), Err(LayerError::RootNotClosable)));
        assert!(matches!(fx.stack.remove(a), Err(LayerError::HasDescendants(_))));
        assert!(matches!(fx.stack.remove(LayerId(99)), Err(LayerError::NotOpen(_))));
    }

    #[test]
    fn current_override_nests_and_falls_back_to_front() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        let b = fx.open(LayerMode::Modal);
        let root = fx.stack.root().id();

        let seen = fx.stack.as_current(root, || {
            let inner = fx.stack.as_current(a, || fx.stack.current_id());
            (inner, fx.stack.current_id())
        });
        assert_eq!(seen, (a, root));
        assert_eq!(fx.stack.current_id(), b);

        // An override for a layer that closed meanwhile is skipped.
        let guard = fx.stack.push_current(b);
        fx.stack.remove(b).unwrap();
        assert_eq!(fx.stack.current_id(), a);
        drop(guard);
    }

    #[test]
    fn override_is_restored_when_the_callback_panics() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        let root = fx.stack.root().id();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fx.stack.as_current(root, || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(fx.stack.current_id(), a);
    }

    #[test]
    fn lookup_modes() {
        let mut fx = Fixture::new();
        let a = fx.open(LayerMode::Modal);
        let b = fx.open(LayerMode::Popup);
        let root = fx.stack.root().id();
        let doc = &fx.doc;
        let stack = &fx.stack;
        let get_all = |s: &str, options: GetOptions| {
            stack.get_all(doc, &LayerRef::parse(s).unwrap(), options)
        };

        assert_eq!(get_all("overlay", GetOptions::default()), vec![b, a]);
        assert_eq!(get_all("any", GetOptions::with_base(a)), vec![a, b, root]);
        assert_eq!(get_all("parent root", GetOptions::default()), vec![a, root]);
        assert_eq!(get_all("closest", GetOptions::with_base(a)), vec![a, root]);
        assert_eq!(get_all("child", GetOptions::with_base(root)), vec![a]);
        assert_eq!(get_all("1", GetOptions::default()), vec![a]);
        assert!(get_all("new", GetOptions::default()).is_empty());

        let content_of_a = stack.layer(a).unwrap().content;
        let main = doc.first_element_child(doc.body().unwrap()).unwrap();
        assert_eq!(stack.get(doc, &LayerRef::Element(content_of_a), GetOptions::default()), Some(a));
        assert_eq!(stack.get(doc, &LayerRef::Element(main), GetOptions::default()), Some(root));
        let origin = GetOptions {
            base: None,
            origin: Some(content_of_a),
        };
        assert_eq!(stack.get(doc, &LayerRef::Origin, origin), Some(a));
    }
}
