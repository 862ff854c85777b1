//! Notifications emitted by the fragment engine.
//!
//! Some notifications are cancelable: any listener returning
//! [`Outcome::Prevented`] vetoes the operation that emitted it. Observers
//! attached through [`EventBus::observe`] receive a copy of everything that
//! was emitted, after listeners ran.

use core_types::{LayerId, LayerMode};
use dom::NodeId;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Where a notification is dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Element(NodeId),
    Document,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Cancelable. `old` is about to survive a swap instead of `new`.
    KeepRequested {
        layer: LayerId,
        old: NodeId,
        new: NodeId,
        new_data: Value,
    },
    FragmentKept {
        layer: LayerId,
        element: NodeId,
        new_data: Value,
    },
    FragmentInserted {
        layer: LayerId,
        element: NodeId,
    },
    FragmentDestroyed {
        layer: LayerId,
        element: NodeId,
    },
    /// Cancelable. Emitted before any stack mutation.
    LayerOpenRequested {
        mode: LayerMode,
        origin: Option<NodeId>,
    },
    LayerOpened {
        layer: LayerId,
        origin: Option<NodeId>,
    },
    /// Cancelable.
    LayerAcceptRequested {
        layer: LayerId,
        value: Value,
    },
    /// Cancelable.
    LayerDismissRequested {
        layer: LayerId,
        value: Value,
    },
    LayerAccepted {
        layer: LayerId,
        value: Value,
        target: Target,
    },
    LayerDismissed {
        layer: LayerId,
        value: Value,
        target: Target,
    },
    /// Pending work scoped to these layers should stop.
    AbortRequested {
        layers: Vec<LayerId>,
        reason: String,
    },
    LocationChanged {
        layer: LayerId,
        location: String,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeepRequested { .. } => "fragment:keep",
            Self::FragmentKept { .. } => "fragment:kept",
            Self::FragmentInserted { .. } => "fragment:inserted",
            Self::FragmentDestroyed { .. } => "fragment:destroyed",
            Self::LayerOpenRequested { .. } => "layer:open",
            Self::LayerOpened { .. } => "layer:opened",
            Self::LayerAcceptRequested { .. } => "layer:accept",
            Self::LayerDismissRequested { .. } => "layer:dismiss",
            Self::LayerAccepted { .. } => "layer:accepted",
            Self::LayerDismissed { .. } => "layer:dismissed",
            Self::AbortRequested { .. } => "abort",
            Self::LocationChanged { .. } => "layer:location:changed",
        }
    }

    /// The layer a notification is scoped to, if any.
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            Self::KeepRequested { layer, .. }
            | Self::FragmentKept { layer, .. }
            | Self::FragmentInserted { layer, .. }
            | Self::FragmentDestroyed { layer, .. }
            | Self::LayerOpened { layer, .. }
            | Self::LayerAcceptRequested { layer, .. }
            | Self::LayerDismissRequested { layer, .. }
            | Self::LayerAccepted { layer, .. }
            | Self::LayerDismissed { layer, .. }
            | Self::LocationChanged { layer, .. } => Some(*layer),
            Self::LayerOpenRequested { .. } | Self::AbortRequested { .. } => None,
        }
    }

    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            Self::KeepRequested { .. }
                | Self::LayerOpenRequested { .. }
                | Self::LayerAcceptRequested { .. }
                | Self::LayerDismissRequested { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Prevented,
}

impl Outcome {
    pub fn is_prevented(self) -> bool {
        self == Outcome::Prevented
    }
}

/// The eventing collaborator of the engine.
pub trait Events {
    /// Dispatch `notification`. A veto is only honored for cancelable
    /// notifications; for all others the result is always `Continue`.
    fn emit(&self, notification: &Notification) -> Outcome;

    /// Forget listeners bound to a layer that closed.
    fn drop_layer(&self, _layer: LayerId) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&Notification) -> Outcome>;

struct Entry {
    id: ListenerId,
    scope: Option<LayerId>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<Entry>>,
    observers: RefCell<Vec<Sender<Notification>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every notification.
    pub fn on(&self, listener: impl Fn(&Notification) -> Outcome + 'static) -> ListenerId {
        self.register(None, Rc::new(listener))
    }

    /// Listen to notifications scoped to `layer`. Dropped by [`Self::drop_layer`].
    pub fn on_layer(
        &self,
        layer: LayerId,
        listener: impl Fn(&Notification) -> Outcome + 'static,
    ) -> ListenerId {
        self.register(Some(layer), Rc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Remove every listener bound to `layer`.
    pub fn drop_layer(&self, layer: LayerId) {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.scope != Some(layer));
        let dropped = before - listeners.len();
        if dropped > 0 {
            log::debug!(target: "splice.layer", "dropped {dropped} listeners of {layer}");
        }
    }

    /// A channel that receives a copy of every emitted notification.
    pub fn observe(&self) -> Receiver<Notification> {
        let (tx, rx) = channel();
        self.observers.borrow_mut().push(tx);
        rx
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn register(&self, scope: Option<LayerId>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Entry {
            id,
            scope,
            listener,
        });
        id
    }
}

impl Events for EventBus {
    fn emit(&self, notification: &Notification) -> Outcome {
        // Snapshot so listeners may (un)register while we dispatch.
        let scope = notification.layer();
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.scope.is_none() || entry.scope == scope)
            .map(|entry| Rc::clone(&entry.listener))
            .collect();

        let mut outcome = Outcome::Continue;
        for listener in listeners {
            if listener(notification).is_prevented() && notification.is_cancelable() {
                outcome = Outcome::Prevented;
            }
        }
        if outcome.is_prevented() {
            log::debug!(target: "splice.layer", "{} was prevented", notification.name());
        }

        self.observers
            .borrow_mut()
            .retain(|tx| tx.send(notification.clone()).is_ok());
        outcome
    }

    fn drop_layer(&self, layer: LayerId) {
        EventBus::drop_layer(self, layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(layer: u64) -> Notification {
        Notification::LayerOpened {
            layer: LayerId(layer),
            origin: None,
        }
    }

    #[test]
    fn vetoes_only_apply_to_cancelable_notifications() {
        let bus = EventBus::new();
        bus.on(|_| Outcome::Prevented);
        let request = Notification::LayerOpenRequested {
            mode: LayerMode::Modal,
            origin: None,
        };
        assert_eq!(bus.emit(&request), Outcome::Prevented);
        assert_eq!(bus.emit(&opened(1)), Outcome::Continue);
    }

    #[test]
    fn layer_scoped_listeners_only_see_their_layer() {
        let bus = EventBus::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        bus.on_layer(LayerId(2), move |_| {
            counter.set(counter.get() + 1);
            Outcome::Continue
        });
        bus.emit(&opened(1));
        bus.emit(&opened(2));
        assert_eq!(seen.get(), 1);

        bus.drop_layer(LayerId(2));
        bus.emit(&opened(2));
        assert_eq!(seen.get(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn observers_receive_copies_and_listeners_can_unregister_themselves() {
        let bus = Rc::new(EventBus::new());
        let rx = bus.observe();
        let weak = Rc::downgrade(&bus);
        let id = Rc::new(Cell::new(None));
        let own_id = Rc::clone(&id);
        let registered = bus.on(move |_| {
            if let (Some(bus), Some(id)) = (weak.upgrade(), own_id.get()) {
                bus.off(id);
            }
            Outcome::Continue
        });
        id.set(Some(registered));

        bus.emit(&opened(1));
        bus.emit(&opened(3));
        assert_eq!(bus.listener_count(), 0);
        let names: Vec<_> = rx.try_iter().map(|n| n.layer()).collect();
        assert_eq!(names, vec![Some(LayerId(1)), Some(LayerId(3))]);
    }
}
