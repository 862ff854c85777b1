//! Opening overlays.
//!
//! An overlay is built as
//!
//! ```text
//! <sp-modal sp-mode="modal" sp-size="medium">
//!   <sp-modal-backdrop></sp-modal-backdrop>
//!   <sp-modal-viewport>
//!     <sp-modal-box>
//!       <sp-modal-content>…</sp-modal-content>
//!       <sp-modal-dismiss sp-dismiss aria-label="×">×</sp-modal-dismiss>
//!     </sp-modal-box>
//!   </sp-modal-viewport>
//! </sp-modal>
//! ```
//!
//! and appended to `body`. The stack grows before the open animation starts.

use crate::close::peel;
use crate::error::ChangeError;
use crate::focus_scroll::{handle_focus, handle_scroll};
use crate::matcher::{MAIN_PSEUDO, find_in_response, substitute_origin};
use crate::motion::{Effect, settle};
use crate::page::{LayerCallbacks, Page};
use crate::render::{RenderOptions, RenderResult};
use bus::Notification;
use core_types::{LayerId, LayerMode};
use dom::{Document, NodeId};
use focus::{FocusCapsule, FocusOption};
use layer::{DismissMethod, GetOptions, Layer, LayerConfig, LayerRef};

/// Elements of a freshly built overlay.
struct OverlayElements {
    element: NodeId,
    content: NodeId,
}

pub(crate) fn open_layer(
    page: &Page,
    options: &RenderOptions,
    response: NodeId,
) -> Result<RenderResult, ChangeError> {
    let mode = match &options.mode {
        LayerMode::Root => LayerMode::Modal,
        other => other.clone(),
    };
    let request = Notification::LayerOpenRequested {
        mode: mode.clone(),
        origin: options.origin,
    };
    if page.emit(&request).is_prevented() {
        log::warn!(target: "splice.layer", "opening a {mode} was prevented");
        return Err(ChangeError::Vetoed {
            notification: request.name(),
        });
    }

    let fragment = find_content(page, options, response)?;
    let base = {
        let doc = page.document();
        let base_ref = options
            .base_layer
            .map(LayerRef::Id)
            .unwrap_or(LayerRef::Current);
        page.stack()
            .get(&doc, &base_ref, GetOptions::default())
            .unwrap_or(LayerId::ROOT)
    };
    // A layer has at most one child.
    let peeled = peel(page, base)?;

    let config = page
        .layer_config()
        .settings_for(&mode, &options.layer_options);
    let overlay = {
        let mut doc = page.document_mut();
        let overlay = build_overlay(&mut doc, &mode, &config)?;
        doc.append_child(overlay.content, fragment)?;
        overlay
    };
    save_base_focus(page, base);

    let id = page.stack_mut().next_id();
    let mut layer = Layer::overlay(id, mode.clone(), overlay.element, overlay.content, config.clone());
    layer.origin = options.origin;
    layer.context = options.context.clone();
    layer.location = options.location.clone();
    layer.title = options.title.clone();
    page.stack_mut().push(layer);
    page.set_callbacks(
        id,
        LayerCallbacks {
            on_accepted: options.on_accepted.clone(),
            on_dismissed: options.on_dismissed.clone(),
        },
    );
    log::debug!(target: "splice.layer", "opened {id} as {mode} above {base}");

    page.activate(overlay.element, id);
    page.emit(&Notification::FragmentInserted {
        layer: id,
        element: fragment,
    });
    if let Some(location) = &options.location {
        if config.history {
            page.history_mut().visit(location, options.title.as_deref());
        }
        page.emit(&Notification::LocationChanged {
            layer: id,
            location: location.clone(),
        });
    }
    page.emit(&Notification::LayerOpened {
        layer: id,
        origin: options.origin,
    });

    handle_scroll(page, id, fragment, &options.scroll);
    let focus = if options.focus.is_false() {
        FocusOption::Auto
    } else {
        options.focus.clone()
    };
    if !handle_focus(page, id, fragment, &focus, None) {
        handle_focus(page, id, fragment, &FocusOption::Layer, None);
    }

    let effect = Effect::new(config.open_animation.clone(), config.duration);
    let animation = page
        .motion()
        .animate(page.shared_document(), overlay.element, &effect);
    let page = page.clone();
    let finished = async move {
        let (peeled, ()) = futures::future::join(peeled, animation).await;
        if let Some(layer) = page.stack_mut().layer_mut(id) {
            layer.opening = false;
        }
        peeled?;
        if page.is_open(id) {
            Ok(())
        } else {
            Err(ChangeError::aborted(format!("{id} closed while opening")))
        }
    };
    Ok(RenderResult {
        layer: id,
        fragments: vec![fragment],
        kept: Vec::new(),
        finished: settle(finished),
    })
}

/// The element of the response that becomes the overlay's content.
fn find_content(page: &Page, options: &RenderOptions, response: NodeId) -> Result<NodeId, ChangeError> {
    let doc = page.document();
    let origin_target = options.origin.and_then(|o| css::derive_target(&doc, o));
    let mut last_target = String::new();
    for plan in options.plans() {
        let targets = if plan.trim() == MAIN_PSEUDO {
            page.fragment_config().main_targets.clone()
        } else {
            vec![plan]
        };
        for target in targets {
            let target = substitute_origin(&target, origin_target.as_deref())?;
            if let Some(found) = find_in_response(&doc, response, &target)? {
                log::trace!(target: "splice.resolve", "overlay content is {target}");
                return Ok(found);
            }
            last_target = target;
        }
    }
    Err(ChangeError::cannot_match(
        last_target,
        "nothing in the response can become the overlay's content",
    ))
}

fn build_overlay(
    doc: &mut Document,
    mode: &LayerMode,
    config: &LayerConfig,
) -> Result<OverlayElements, ChangeError> {
    let name = config.element_name_for(mode);
    let part = |doc: &mut Document, suffix: &str| doc.create_element(&format!("{name}-{suffix}"));

    let element = doc.create_element(&name);
    doc.set_attr(element, "sp-mode", Some(mode.name()));
    doc.set_attr(element, "sp-size", Some(&config.size));
    if let Some(position) = &config.position {
        doc.set_attr(element, "sp-position", Some(position));
    }
    if let Some(class) = &config.class {
        for class in class.split_whitespace() {
            doc.add_class(element, class);
        }
    }

    let backdrop = part(doc, "backdrop");
    let viewport = part(doc, "viewport");
    let frame = part(doc, "box");
    let content = part(doc, "content");
    doc.append_child(element, backdrop)?;
    doc.append_child(element, viewport)?;
    doc.append_child(viewport, frame)?;
    doc.append_child(frame, content)?;
    if config.is_dismissable_by(DismissMethod::Button) {
        let dismiss = part(doc, "dismiss");
        doc.set_attr(dismiss, "sp-dismiss", None);
        doc.set_attr(dismiss, "aria-label", Some(&config.dismiss_label));
        doc.set_text(dismiss, "×");
        doc.append_child(frame, dismiss)?;
    }
    let parking = doc.stable_root();
    doc.append_child(parking, element)?;
    Ok(OverlayElements { element, content })
}

/// Remember what had focus in `base` so closing the new layer can return to it.
fn save_base_focus(page: &Page, base: LayerId) {
    let saved = {
        let stack = page.stack();
        let doc = page.document();
        stack.layer(base).and_then(|l| {
            Some((l.saved_state_key(), FocusCapsule::preserve(&doc, l.element)?))
        })
    };
    if let Some((key, capsule)) = saved {
        if let Some(l) = page.stack_mut().layer_mut(base) {
            l.saved.save_focus(&key, capsule);
        }
    }
}
