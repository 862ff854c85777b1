//! The page: one document, its layer stack and the collaborators that act on
//! both.
//!
//! `Page` is a cheap handle; clones share everything. Borrows of the
//! document or stack are never held across a call into a collaborator, so
//! listeners and compilers may inspect the page while they run.

use crate::behaviors::{Activation, Behaviors, Inert, Teardown};
use crate::config::FragmentConfig;
use crate::motion::{InstantMotion, Motion, SharedDocument};
use bus::{EventBus, Events, Notification, Outcome};
use core_types::{LayerId, LayerMode};
use css::SelectorList;
use dom::{Document, NodeId};
use layer::{History, Layer, LayerOptions, LayerStack};
use serde_json::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// Called with the value a layer was accepted or dismissed with.
pub type ValueCallback = Rc<dyn Fn(&Value)>;

#[derive(Clone, Default)]
pub(crate) struct LayerCallbacks {
    pub on_accepted: Option<ValueCallback>,
    pub on_dismissed: Option<ValueCallback>,
}

#[derive(Clone)]
pub struct Page {
    inner: Rc<PageInner>,
}

struct PageInner {
    doc: SharedDocument,
    stack: RefCell<LayerStack>,
    history: RefCell<History>,
    events: Rc<dyn Events>,
    motion: Rc<dyn Motion>,
    activation: Rc<dyn Activation>,
    teardown: Rc<dyn Teardown>,
    fragments: FragmentConfig,
    layers: layer::Config,
    callbacks: RefCell<HashMap<LayerId, LayerCallbacks>>,
}

impl Page {
    pub fn builder(html: impl Into<String>) -> PageBuilder {
        PageBuilder::new(html)
    }

    /// A page with default collaborators.
    pub fn parse(html: &str) -> Page {
        PageBuilder::new(html).build()
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.doc.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.doc.borrow_mut()
    }

    pub fn shared_document(&self) -> &SharedDocument {
        &self.inner.doc
    }

    pub fn stack(&self) -> Ref<'_, LayerStack> {
        self.inner.stack.borrow()
    }

    pub(crate) fn stack_mut(&self) -> RefMut<'_, LayerStack> {
        self.inner.stack.borrow_mut()
    }

    pub fn history(&self) -> Ref<'_, History> {
        self.inner.history.borrow()
    }

    pub(crate) fn history_mut(&self) -> RefMut<'_, History> {
        self.inner.history.borrow_mut()
    }

    pub fn events(&self) -> &Rc<dyn Events> {
        &self.inner.events
    }

    pub(crate) fn motion(&self) -> &Rc<dyn Motion> {
        &self.inner.motion
    }

    pub fn fragment_config(&self) -> &FragmentConfig {
        &self.inner.fragments
    }

    pub fn layer_config(&self) -> &layer::Config {
        &self.inner.layers
    }

    /// First element in the whole document matching `selector`.
    pub fn first(&self, selector: &str) -> Option<NodeId> {
        let list = SelectorList::parse(selector).ok()?;
        let doc = self.document();
        css::query_first(&doc, doc.root(), &list)
    }

    /// Activate the initial content of the root layer.
    pub fn boot(&self) {
        let body = self.stack().root().content;
        self.activate(body, LayerId::ROOT);
    }

    pub fn html(&self) -> String {
        let doc = self.document();
        doc.outer_html(doc.root())
    }

    pub(crate) fn emit(&self, notification: &Notification) -> Outcome {
        self.inner.events.emit(notification)
    }

    /// Activate `root` with `layer` as the current layer.
    pub(crate) fn activate(&self, root: NodeId, layer: LayerId) {
        let _current = self.stack().push_current(layer);
        let mut doc = self.document_mut();
        self.inner.activation.activate(&mut doc, root, layer);
    }

    pub(crate) fn teardown(&self, root: NodeId) -> Vec<crate::HookError> {
        let mut doc = self.document_mut();
        self.inner.teardown.teardown(&mut doc, root)
    }

    pub(crate) fn set_callbacks(&self, layer: LayerId, callbacks: LayerCallbacks) {
        self.inner.callbacks.borrow_mut().insert(layer, callbacks);
    }

    pub(crate) fn take_callbacks(&self, layer: LayerId) -> LayerCallbacks {
        self.inner
            .callbacks
            .borrow_mut()
            .remove(&layer)
            .unwrap_or_default()
    }

    pub(crate) fn is_open(&self, layer: LayerId) -> bool {
        self.stack().is_open(layer)
    }
}

pub struct PageBuilder {
    html: String,
    events: Option<Rc<dyn Events>>,
    motion: Option<Rc<dyn Motion>>,
    activation: Option<Rc<dyn Activation>>,
    teardown: Option<Rc<dyn Teardown>>,
    fragments: FragmentConfig,
    layers: layer::Config,
    location: Option<String>,
    title: Option<String>,
}

impl PageBuilder {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            events: None,
            motion: None,
            activation: None,
            teardown: None,
            fragments: FragmentConfig::default(),
            layers: layer::Config::builtin(),
            location: None,
            title: None,
        }
    }

    pub fn events(mut self, events: Rc<dyn Events>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn motion(mut self, motion: Rc<dyn Motion>) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Use `behaviors` for both activation and teardown.
    pub fn behaviors(mut self, behaviors: Rc<Behaviors>) -> Self {
        let activation: Rc<dyn Activation> = behaviors.clone();
        self.activation = Some(activation);
        self.teardown = Some(behaviors);
        self
    }

    pub fn activation(mut self, activation: Rc<dyn Activation>) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn teardown(mut self, teardown: Rc<dyn Teardown>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    pub fn fragment_config(mut self, config: FragmentConfig) -> Self {
        self.fragments = config;
        self
    }

    /// Layer settings. Unset fields fall back to the built-in defaults.
    pub fn layer_config(mut self, config: layer::Config) -> Self {
        self.layers = config.over(layer::Config::builtin());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn build(self) -> Page {
        let doc = Document::parse(&self.html);
        let element = doc.html().unwrap_or_else(|| doc.root());
        let content = doc.body().unwrap_or(element);

        let mut root = Layer::root(
            element,
            content,
            self.layers
                .settings_for(&LayerMode::Root, &LayerOptions::default()),
        );
        root.location = self.location.clone();
        root.title = self.title.clone();

        let mut history = History::new();
        if let Some(location) = &self.location {
            history.visit(location, self.title.as_deref());
        }

        let inert = Rc::new(Inert);
        let activation: Rc<dyn Activation> = match self.activation {
            Some(activation) => activation,
            None => inert.clone(),
        };
        let teardown: Rc<dyn Teardown> = match self.teardown {
            Some(teardown) => teardown,
            None => inert,
        };
        let events: Rc<dyn Events> = match self.events {
            Some(events) => events,
            None => Rc::new(EventBus::new()),
        };
        let motion: Rc<dyn Motion> = match self.motion {
            Some(motion) => motion,
            None => Rc::new(InstantMotion),
        };
        Page {
            inner: Rc::new(PageInner {
                doc: Rc::new(RefCell::new(doc)),
                stack: RefCell::new(LayerStack::new(root)),
                history: RefCell::new(history),
                events,
                motion,
                activation,
                teardown,
                fragments: self.fragments,
                layers: self.layers,
                callbacks: RefCell::new(HashMap::new()),
            }),
        }
    }
}
