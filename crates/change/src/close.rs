//! Closing overlays.
//!
//! The stack shrinks synchronously. Only the close animation and the
//! removal of the overlay's elements wait, inside the returned future.

use crate::error::ChangeError;
use crate::motion::{Effect, settle};
use crate::page::Page;
use bus::{Notification, Target};
use core_types::LayerId;
use focus::FocusCapsule;
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use layer::LayerError;
use serde_json::Value;

pub type Closing = LocalBoxFuture<'static, Result<(), ChangeError>>;

/// Whether a layer closes because its work was confirmed or abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseIntent {
    Accept,
    Dismiss,
}

impl CloseIntent {
    fn request(self, layer: LayerId, value: Value) -> Notification {
        match self {
            Self::Accept => Notification::LayerAcceptRequested { layer, value },
            Self::Dismiss => Notification::LayerDismissRequested { layer, value },
        }
    }

    fn done(self, layer: LayerId, value: Value, target: Target) -> Notification {
        match self {
            Self::Accept => Notification::LayerAccepted {
                layer,
                value,
                target,
            },
            Self::Dismiss => Notification::LayerDismissed {
                layer,
                value,
                target,
            },
        }
    }
}

/// Close `layer`. `forced` closes skip the cancelable request.
pub(crate) fn close_layer(
    page: &Page,
    layer: LayerId,
    intent: CloseIntent,
    value: Value,
    forced: bool,
) -> Result<Closing, ChangeError> {
    check_closable(page, layer)?;
    if !forced {
        let request = intent.request(layer, value.clone());
        if page.emit(&request).is_prevented() {
            log::warn!(target: "splice.layer", "closing {layer} was prevented");
            return Err(ChangeError::Vetoed {
                notification: request.name(),
            });
        }
        // A listener may have closed it already.
        check_closable(page, layer)?;
    }

    let mut doomed = vec![layer];
    doomed.extend(page.stack().descendants_of(layer));
    page.emit(&Notification::AbortRequested {
        layers: doomed,
        reason: format!("{layer} is closing"),
    });

    let peeled = peel(page, layer)?;
    let parent = page.stack().parent_of(layer);
    let removed = page.stack_mut().remove(layer)?;
    log::debug!(target: "splice.layer", "closing {layer} ({intent:?})");

    if removed.config.history {
        restore_parent_history(page, parent);
    }
    restore_parent_focus(page, parent, removed.element, removed.origin);

    let callbacks = page.take_callbacks(layer);
    let callback = match intent {
        CloseIntent::Accept => callbacks.on_accepted,
        CloseIntent::Dismiss => callbacks.on_dismissed,
    };
    if let Some(callback) = callback {
        callback(&value);
    }
    page.events().drop_layer(layer);

    let element = removed.element;
    page.document_mut().mark_destroying(element);
    let errors = page.teardown(element);
    let effect = Effect::new(removed.config.close_animation.clone(), removed.config.duration);
    let animation = page.motion().animate(page.shared_document(), element, &effect);

    let page = page.clone();
    let closing = async move {
        let (peeled, ()) = future::join(peeled, animation).await;
        page.document_mut().detach(element);
        page.emit(&intent.done(layer, value.clone(), Target::Element(element)));
        page.emit(&intent.done(layer, value, Target::Document));
        log::debug!(target: "splice.layer", "{layer} detached");
        peeled?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ChangeError::HookFailed(errors))
        }
    };
    Ok(settle(closing))
}

/// Dismiss every descendant of `layer`, frontmost first, without asking
/// listeners.
pub(crate) fn peel(page: &Page, layer: LayerId) -> Result<Closing, ChangeError> {
    if !page.is_open(layer) {
        return Err(ChangeError::LayerNotOpen(layer));
    }
    let order = page.stack().peel_order(layer);
    if order.is_empty() {
        return Ok(future::ready(Ok(())).boxed_local());
    }
    log::debug!(target: "splice.layer", "peeling {} layer(s) above {layer}", order.len());
    let closings = order
        .into_iter()
        .map(|descendant| close_layer(page, descendant, CloseIntent::Dismiss, Value::Null, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(settle(async move {
        future::join_all(closings)
            .await
            .into_iter()
            .collect::<Result<Vec<()>, _>>()
            .map(drop)
    }))
}

fn check_closable(page: &Page, layer: LayerId) -> Result<(), ChangeError> {
    let stack = page.stack();
    match stack.layer(layer) {
        None => Err(ChangeError::LayerNotOpen(layer)),
        Some(l) if l.is_root() => Err(LayerError::RootNotClosable.into()),
        Some(_) => Ok(()),
    }
}

fn restore_parent_history(page: &Page, parent: Option<LayerId>) {
    let Some((location, title)) = parent.and_then(|id| {
        let stack = page.stack();
        let l = stack.layer(id)?;
        Some((l.location.clone()?, l.title.clone()))
    }) else {
        return;
    };
    page.history_mut().visit(&location, title.as_deref());
}

/// Focus the element that opened the layer, else whatever the parent had
/// focused when the layer opened.
fn restore_parent_focus(page: &Page, parent: Option<LayerId>, closing: dom::NodeId, origin: Option<dom::NodeId>) {
    let Some(parent) = parent else {
        return;
    };
    {
        let mut doc = page.document_mut();
        if doc.active_element().is_some_and(|a| doc.contains(closing, a)) {
            doc.blur();
        }
    }
    let usable_origin = origin.filter(|&o| {
        let doc = page.document();
        doc.is_connected(o) && !doc.is_destroying(o) && !doc.contains(closing, o)
    });
    if let Some(origin) = usable_origin {
        if page.document_mut().focus(origin) {
            log::trace!(target: "splice.focus", "focus returned to origin {origin}");
            return;
        }
    }
    let saved = {
        let stack = page.stack();
        stack
            .layer(parent)
            .and_then(|l| Some((l.saved.focus_for(&l.saved_state_key())?.clone(), l.element)))
    };
    if let Some((capsule, scope)) = saved {
        FocusCapsule::restore(&capsule, &mut page.document_mut(), scope);
    }
}
