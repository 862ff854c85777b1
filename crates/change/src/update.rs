//! Executing steps against the page.
//!
//! Steps run in reverse order so the first declared step handles focus
//! last and nothing later can steal it. DOM changes happen before
//! [`execute`] returns; only animations are left for `finished`.

use crate::close::{Closing, peel};
use crate::error::{ChangeError, HookError};
use crate::focus_scroll::{handle_focus, handle_scroll, save_layer_state};
use crate::keep::{Placed, Reviver, find_keep_plan, place_descendants, preserve_descendants, revive};
use crate::motion::{MorphPlan, settle};
use crate::page::Page;
use crate::render::{RenderOptions, RenderResult};
use crate::steps::{Step, set_scroll_and_focus_options};
use bus::Notification;
use core_types::{LayerId, Placement};
use dom::NodeId;
use focus::{FocusCapsule, FocusOption, ScrollOption};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use std::cell::RefCell;
use std::rc::Rc;

type Errors = Rc<RefCell<Vec<HookError>>>;
/// Revivers held back until kept elements stop moving.
type Deferred = Rc<RefCell<Vec<Reviver>>>;

struct StepOutcome {
    fragments: Vec<NodeId>,
    kept: Vec<NodeId>,
    done: LocalBoxFuture<'static, ()>,
}

impl StepOutcome {
    fn immediate(fragments: Vec<NodeId>, kept: Vec<NodeId>) -> Self {
        Self {
            fragments,
            kept,
            done: future::ready(()).boxed_local(),
        }
    }
}

/// Run `steps` in `layer`.
pub fn execute(
    page: &Page,
    layer: LayerId,
    mut steps: Vec<Step>,
    options: &RenderOptions,
) -> Result<RenderResult, ChangeError> {
    if !page.is_open(layer) {
        return Err(ChangeError::LayerNotOpen(layer));
    }
    set_scroll_and_focus_options(&mut steps);
    // Overlays live inside the root layer's body; a swap that would take
    // them along closes them first.
    let peeled = close_covered_overlays(page, &steps)?;
    let capsule = {
        let stack = page.stack();
        let doc = page.document();
        stack
            .layer(layer)
            .and_then(|l| FocusCapsule::preserve(&doc, l.element))
    };
    update_layer_state(page, layer, options);

    let errors: Errors = Rc::default();
    let mut fragments = vec![Vec::new(); steps.len()];
    let mut kept = Vec::new();
    let mut pending = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate().rev() {
        let outcome = execute_step(page, step, capsule.as_ref(), &errors)?;
        fragments[index] = outcome.fragments;
        kept.extend(outcome.kept);
        pending.push(outcome.done);
    }
    finish_location(page, layer, options);
    log::debug!(
        target: "splice.update",
        "updated {} step(s) in {layer}, kept {}",
        steps.len(),
        kept.len()
    );

    let page = page.clone();
    let finished = async move {
        let (peeled, _) = future::join(future::join_all(peeled), future::join_all(pending)).await;
        if !page.is_open(layer) {
            return Err(ChangeError::aborted(format!("{layer} closed while updating")));
        }
        peeled.into_iter().collect::<Result<Vec<()>, _>>()?;
        let errors = std::mem::take(&mut *errors.borrow_mut());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ChangeError::HookFailed(errors))
        }
    };
    Ok(RenderResult {
        layer,
        fragments: fragments.into_iter().flatten().collect(),
        kept,
        finished: settle(finished),
    })
}

/// Dismiss the layers above each step's layer when the step replaces an
/// element containing one of them.
fn close_covered_overlays(page: &Page, steps: &[Step]) -> Result<Vec<Closing>, ChangeError> {
    let mut covering: Vec<LayerId> = Vec::new();
    {
        let stack = page.stack();
        let doc = page.document();
        for step in steps.iter().filter(|s| s.placement.is_replacing()) {
            if covering.contains(&step.layer) {
                continue;
            }
            let above = stack.elements_above(step.layer);
            if above.iter().any(|&element| doc.contains(step.old, element)) {
                covering.push(step.layer);
            }
        }
    }
    let mut closings = Vec::with_capacity(covering.len());
    for layer in covering {
        if page.is_open(layer) {
            log::debug!(target: "splice.update", "swap in {layer} covers overlays, closing them");
            closings.push(peel(page, layer)?);
        }
    }
    Ok(closings)
}

fn execute_step(
    page: &Page,
    step: &Step,
    capsule: Option<&FocusCapsule>,
    errors: &Errors,
) -> Result<StepOutcome, ChangeError> {
    let Some(new) = step.new else {
        return Err(ChangeError::cannot_match(
            step.selector.clone(),
            "no new element was matched",
        ));
    };
    log::trace!(
        target: "splice.update",
        "{} {} with {new} ({})",
        step.placement,
        step.old,
        step.selector
    );
    match step.placement {
        Placement::Replace => Ok(replace(page, step, new, capsule, errors, None)),
        Placement::Content => Ok(replace_content(page, step, new, capsule, errors)),
        Placement::Before | Placement::After => insert(page, step, new, capsule),
    }
}

fn replace(
    page: &Page,
    step: &Step,
    new: NodeId,
    capsule: Option<&FocusCapsule>,
    errors: &Errors,
    deferred: Option<&Deferred>,
) -> StepOutcome {
    let layer = step.layer;
    let old = step.old;
    if step.keep {
        if let Some(plan) = find_keep_plan(page, old, new, false, layer) {
            page.emit(&Notification::FragmentKept {
                layer,
                element: old,
                new_data: plan.new_data,
            });
            handle_scroll(page, layer, old, &step.scroll);
            handle_focus(page, layer, old, &step.focus, capsule);
            return StepOutcome::immediate(vec![old], vec![old]);
        }
    }

    // Kept descendants leave before teardown so they are not destructed.
    let transplants = if step.keep {
        preserve_descendants(page, old, new, layer)
    } else {
        Vec::new()
    };
    let kept: Rc<RefCell<Vec<NodeId>>> = Rc::default();

    let before_start = {
        let page = page.clone();
        move || page.document_mut().mark_destroying(old)
    };
    let after_insert = {
        let page = page.clone();
        let kept = Rc::clone(&kept);
        let scroll = step.scroll.clone();
        let focus = step.focus.clone();
        let capsule = capsule.cloned();
        let deferred = deferred.cloned();
        move || {
            let Placed { kept: placed, revivers } = place_descendants(&page, transplants);
            match &deferred {
                Some(deferred) => deferred.borrow_mut().extend(revivers),
                None => revive(&page, revivers),
            }
            for (element, new_data) in placed {
                page.emit(&Notification::FragmentKept {
                    layer,
                    element,
                    new_data,
                });
                kept.borrow_mut().push(element);
            }
            page.activate(new, layer);
            page.emit(&Notification::FragmentInserted {
                layer,
                element: new,
            });
            handle_scroll(&page, layer, new, &scroll);
            handle_focus(&page, layer, new, &focus, capsule.as_ref());
        }
    };
    let before_detach = {
        let page = page.clone();
        let errors = Rc::clone(errors);
        move || {
            let failed = page.teardown(old);
            errors.borrow_mut().extend(failed);
        }
    };
    let after_detach = {
        let page = page.clone();
        move || {
            page.emit(&Notification::FragmentDestroyed {
                layer,
                element: old,
            });
        }
    };

    let plan = MorphPlan {
        old,
        new,
        effect: step.transition.clone(),
        before_start: Box::new(before_start),
        after_insert: Box::new(after_insert),
        before_detach: Box::new(before_detach),
        after_detach: Box::new(after_detach),
    };
    let done = page.motion().morph(page.shared_document(), plan);
    if let Some(l) = page.stack_mut().layer_mut(layer) {
        // The root layer's content is `body`, which a swap can replace.
        if l.content == old {
            l.content = new;
        }
    }
    let kept = std::mem::take(&mut *kept.borrow_mut());
    StepOutcome {
        fragments: vec![new],
        kept,
        done,
    }
}

/// Swap the children of the old element, keeping the element itself.
fn replace_content(
    page: &Page,
    step: &Step,
    new: NodeId,
    capsule: Option<&FocusCapsule>,
    errors: &Errors,
) -> StepOutcome {
    let wrapper_name = &page.fragment_config().wrapper_name;
    let (old_wrapper, new_wrapper) = {
        let mut doc = page.document_mut();
        (
            doc.wrap_children(step.old, wrapper_name),
            doc.wrap_children(new, wrapper_name),
        )
    };
    let inner = Step {
        old: old_wrapper,
        new: Some(new_wrapper),
        placement: Placement::Replace,
        scroll: ScrollOption::False,
        focus: FocusOption::False,
        ..step.clone()
    };
    let deferred = Deferred::default();
    let outcome = replace(page, &inner, new_wrapper, capsule, errors, Some(&deferred));
    if let Err(err) = page.document_mut().unwrap(new_wrapper) {
        log::warn!(target: "splice.update", "could not unwrap {new_wrapper}: {err}");
    }
    // Unwrapping moved the kept elements again.
    let revivers = std::mem::take(&mut *deferred.borrow_mut());
    revive(page, revivers);
    // Unwrapping moves the new children, which can drop focus.
    handle_scroll(page, step.layer, step.old, &step.scroll);
    handle_focus(page, step.layer, step.old, &step.focus, capsule);
    StepOutcome {
        fragments: vec![step.old],
        kept: outcome.kept,
        done: outcome.done,
    }
}

/// Prepend or append the new children inside the old element.
fn insert(
    page: &Page,
    step: &Step,
    new: NodeId,
    capsule: Option<&FocusCapsule>,
) -> Result<StepOutcome, ChangeError> {
    let layer = step.layer;
    let (wrapper, fragments) = {
        let mut doc = page.document_mut();
        let wrapper = doc.wrap_children(new, &page.fragment_config().wrapper_name);
        if step.placement == Placement::Before {
            doc.prepend_child(step.old, wrapper)?;
        } else {
            doc.append_child(step.old, wrapper)?;
        }
        let fragments: Vec<NodeId> = doc.element_children(wrapper).collect();
        (wrapper, fragments)
    };
    page.activate(wrapper, layer);
    for &element in &fragments {
        page.emit(&Notification::FragmentInserted { layer, element });
    }
    let first = fragments.first().copied().unwrap_or(step.old);
    handle_scroll(page, layer, first, &step.scroll);

    let animation = page
        .motion()
        .animate(page.shared_document(), wrapper, &step.transition);
    let focus = step.focus.clone();
    let capsule = capsule.cloned();
    let page = page.clone();
    let done = async move {
        animation.await;
        if let Err(err) = page.document_mut().unwrap(wrapper) {
            log::warn!(target: "splice.update", "could not unwrap {wrapper}: {err}");
        }
        handle_focus(&page, layer, first, &focus, capsule.as_ref());
    };
    Ok(StepOutcome {
        fragments,
        kept: Vec::new(),
        done: settle(done),
    })
}

/// Save state for the location being left, then take over the new
/// location, title and context.
fn update_layer_state(page: &Page, layer: LayerId, options: &RenderOptions) {
    if options.location.is_some() {
        save_layer_state(page, layer);
    }
    let mut stack = page.stack_mut();
    let Some(l) = stack.layer_mut(layer) else {
        return;
    };
    if let Some(location) = &options.location {
        l.location = Some(location.clone());
    }
    if let Some(title) = &options.title {
        l.title = Some(title.clone());
    }
    l.context
        .extend(options.context.iter().map(|(k, v)| (k.clone(), v.clone())));
}

/// Push the new location to history when the layer shows its location.
fn finish_location(page: &Page, layer: LayerId, options: &RenderOptions) {
    let Some(location) = &options.location else {
        return;
    };
    let shows_history = page
        .stack()
        .layer(layer)
        .is_some_and(|l| l.config.history);
    if shows_history {
        page.history_mut()
            .visit(location, options.title.as_deref());
    }
    page.emit(&Notification::LocationChanged {
        layer,
        location: location.clone(),
    });
}
