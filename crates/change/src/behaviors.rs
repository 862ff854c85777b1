//! Activation and teardown of element subtrees.
//!
//! Activation turns freshly inserted markup into live elements by running
//! registered compilers. Compilers may return a destructor that teardown
//! runs when the element is swapped out or its layer closes.

use crate::error::HookError;
use core_types::LayerId;
use css::SelectorList;
use dom::{Document, NodeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Cleanup registered for an element. An `Err` is reported, never fatal.
pub type Destructor = Box<dyn FnOnce() -> Result<(), String>>;

type Compiler = Rc<dyn Fn(&mut Document, NodeId, LayerId) -> Option<Destructor>>;

pub trait Activation {
    /// Make `root` and its descendants live. `layer` is the current layer
    /// while this runs.
    fn activate(&self, doc: &mut Document, root: NodeId, layer: LayerId);
}

pub trait Teardown {
    /// Run and forget the cleanups of `root` and its descendants. Every
    /// cleanup runs even if an earlier one failed.
    fn teardown(&self, doc: &mut Document, root: NodeId) -> Vec<HookError>;
}

/// Does nothing. Used when a page has no behaviors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inert;

impl Activation for Inert {
    fn activate(&self, _: &mut Document, _: NodeId, _: LayerId) {}
}

impl Teardown for Inert {
    fn teardown(&self, _: &mut Document, _: NodeId) -> Vec<HookError> {
        Vec::new()
    }
}

/// Selector-keyed compilers plus the destructors they registered.
#[derive(Default)]
pub struct Behaviors {
    compilers: RefCell<Vec<(SelectorList, Compiler)>>,
    destructors: RefCell<HashMap<NodeId, Vec<Destructor>>>,
    compiled: RefCell<HashSet<NodeId>>,
}

impl Behaviors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `compiler` for every activated element matching `selector`.
    pub fn compiler(
        &self,
        selector: SelectorList,
        compiler: impl Fn(&mut Document, NodeId, LayerId) -> Option<Destructor> + 'static,
    ) {
        self.compilers
            .borrow_mut()
            .push((selector, Rc::new(compiler)));
    }

    pub fn on_teardown(&self, element: NodeId, destructor: Destructor) {
        self.destructors
            .borrow_mut()
            .entry(element)
            .or_default()
            .push(destructor);
    }

    pub fn is_compiled(&self, element: NodeId) -> bool {
        self.compiled.borrow().contains(&element)
    }

    pub fn destructor_count(&self) -> usize {
        self.destructors.borrow().values().map(Vec::len).sum()
    }
}

impl Activation for Behaviors {
    fn activate(&self, doc: &mut Document, root: NodeId, layer: LayerId) {
        let compilers: Vec<(SelectorList, Compiler)> = self
            .compilers
            .borrow()
            .iter()
            .map(|(selector, compiler)| (selector.clone(), Rc::clone(compiler)))
            .collect();
        // Kept elements moved into new content were compiled before.
        let fresh: Vec<NodeId> = doc
            .subtree(root)
            .filter(|&node| doc.is_element(node) && !self.is_compiled(node))
            .collect();
        for node in fresh {
            self.compiled.borrow_mut().insert(node);
            for (selector, compiler) in &compilers {
                if !css::matches(doc, node, selector) {
                    continue;
                }
                if let Some(destructor) = compiler(doc, node, layer) {
                    self.on_teardown(node, destructor);
                }
            }
        }
    }
}

impl Teardown for Behaviors {
    fn teardown(&self, doc: &mut Document, root: NodeId) -> Vec<HookError> {
        let nodes: Vec<NodeId> = doc.subtree(root).collect();
        let mut errors = Vec::new();
        for node in nodes {
            self.compiled.borrow_mut().remove(&node);
            let destructors = self.destructors.borrow_mut().remove(&node);
            for destructor in destructors.into_iter().flatten() {
                if let Err(message) = destructor() {
                    log::warn!(target: "splice.update", "cleanup of {node} failed: {message}");
                    errors.push(HookError {
                        element: node,
                        message,
                    });
                }
            }
        }
        errors
    }
}
