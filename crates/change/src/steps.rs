//! Turning a target expression into steps.

use crate::error::ChangeError;
use crate::matcher::{LayerMatcher, find_in_response};
use crate::motion::Effect;
use crate::page::Page;
use crate::render::RenderOptions;
use core_types::{LayerId, Placement};
use css::{SelectorError, SelectorList, split_top_level};
use dom::{Document, NodeId};
use focus::{FocusOption, ScrollOption};

/// One old element, the new element that replaces or joins it, and how.
#[derive(Clone, Debug)]
pub struct Step {
    pub selector: String,
    pub placement: Placement,
    pub old: NodeId,
    /// Set by [`postflight`].
    pub new: Option<NodeId>,
    /// A missing match drops the step instead of failing the render.
    pub maybe: bool,
    pub layer: LayerId,
    pub origin: Option<NodeId>,
    pub transition: Effect,
    pub scroll: ScrollOption,
    pub focus: FocusOption,
    pub keep: bool,
    /// Added because the old element is marked hungry, not because it was
    /// targeted.
    pub hungry: bool,
}

/// Split `expr` into selectors and placements.
///
/// Groups are separated by top-level commas. A trailing `:before`,
/// `:after`, `:content` or `:replace` (and their aliases) overrides
/// `default`. `none` stands for nothing.
pub fn parse_target(expr: &str, default: Placement) -> Result<Vec<(String, Placement)>, SelectorError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut pairs = Vec::new();
    for group in split_top_level(expr, ',')? {
        if group == "none" {
            continue;
        }
        let (selector, placement) = split_placement(&group, default);
        if selector.is_empty() {
            return Err(SelectorError::Invalid(group));
        }
        pairs.push((selector, placement));
    }
    Ok(pairs)
}

fn split_placement(group: &str, default: Placement) -> (String, Placement) {
    if let Some(pos) = group.rfind(':') {
        let suffix = &group[pos + 1..];
        let is_pseudo_element = group[..pos].ends_with(':');
        if !is_pseudo_element {
            if let Some(placement) = Placement::from_suffix(suffix) {
                return (group[..pos].trim().to_string(), placement);
            }
        }
    }
    (group.to_string(), default)
}

/// Like [`parse_target`], but a suffix that is not a placement is an error
/// instead of part of the selector. For placements given on their own.
pub fn parse_placement(value: &str) -> Result<Placement, SelectorError> {
    Placement::from_suffix(value.trim().trim_start_matches(':'))
        .ok_or_else(|| SelectorError::UnknownPlacement(value.to_string()))
}

/// Match every group of `target` in `layer`.
///
/// Fails with `CannotMatch` when a group matches nothing. Contained steps
/// are resolved away.
pub fn preflight(
    page: &Page,
    layer: LayerId,
    target: &str,
    options: &RenderOptions,
) -> Result<Vec<Step>, ChangeError> {
    let pairs = parse_target(target, options.placement)?;
    let matcher = LayerMatcher::new(page, layer, options.origin);
    let keep = options.keep.unwrap_or(page.fragment_config().keep);
    let explicit = options
        .target_element
        .filter(|&element| page.stack().layer_of_element(&page.document(), element) == Some(layer));

    let mut steps = Vec::with_capacity(pairs.len());
    for (index, (selector, placement)) in pairs.into_iter().enumerate() {
        let resolved = match explicit.filter(|_| index == 0) {
            Some(element) => Some((selector.clone(), element)),
            None => matcher.resolve(&selector)?,
        };
        let Some((selector, old)) = resolved else {
            return Err(ChangeError::cannot_match(
                selector,
                format!("nothing matches in {layer}"),
            ));
        };
        steps.push(Step {
            selector,
            placement,
            old,
            new: None,
            maybe: false,
            layer,
            origin: options.origin,
            transition: options.transition.clone(),
            scroll: options.scroll.clone(),
            focus: options.focus.clone(),
            keep,
            hungry: false,
        });
    }
    let steps = resolve_nesting(&page.document(), steps);
    log::debug!(
        target: "splice.resolve",
        "{target} resolved to {} step(s) in {layer}",
        steps.len()
    );
    Ok(steps)
}

/// Find the new element of every step in the response `root`.
pub fn postflight(page: &Page, steps: Vec<Step>, root: NodeId) -> Result<Vec<Step>, ChangeError> {
    let doc = page.document();
    let mut matched = Vec::with_capacity(steps.len());
    for mut step in steps {
        match find_in_response(&doc, root, &step.selector)? {
            Some(new) => {
                step.new = Some(new);
                matched.push(step);
            }
            None if step.maybe => {
                log::trace!(target: "splice.resolve", "dropping optional {}", step.selector);
            }
            None => {
                return Err(ChangeError::cannot_match(
                    step.selector,
                    "nothing matches in the response",
                ));
            }
        }
    }
    Ok(matched)
}

/// Steps for hungry elements that also appear in the response.
///
/// Hungry elements of `layer` always qualify. Hungry elements of other
/// layers only when they opt in with `sp-if-layer="any"`.
pub fn hungry_steps(page: &Page, layer: LayerId, steps: &[Step], root: NodeId, options: &RenderOptions) -> Vec<Step> {
    let config = page.fragment_config();
    let Ok(hungry) = SelectorList::parse(&format!("[{}]", config.hungry_attribute)) else {
        return Vec::new();
    };
    let layers: Vec<LayerId> = page.stack().iter().map(|l| l.id()).collect();
    let keep = options.keep.unwrap_or(config.keep);

    let mut added = Vec::new();
    for candidate_layer in layers {
        for old in LayerMatcher::new(page, candidate_layer, None).candidates(&hungry) {
            let doc = page.document();
            let any_layer = doc.attr(old, &config.if_layer_attribute) == Some("any");
            if candidate_layer != layer && !any_layer {
                continue;
            }
            if steps.iter().chain(&added).any(|s: &Step| s.old == old) {
                continue;
            }
            let Some(selector) = css::derive_target(&doc, old) else {
                log::warn!(target: "splice.resolve", "hungry element {old} has no derivable target");
                continue;
            };
            let Ok(Some(new)) = find_in_response(&doc, root, &selector) else {
                continue;
            };
            log::trace!(target: "splice.resolve", "hungry {selector} joins the render");
            added.push(Step {
                selector,
                placement: Placement::Replace,
                old,
                new: Some(new),
                maybe: true,
                layer: candidate_layer,
                origin: options.origin,
                transition: options.transition.clone(),
                scroll: ScrollOption::False,
                focus: FocusOption::False,
                keep,
                hungry: true,
            });
        }
    }
    added
}

/// Drop steps that another step already covers.
///
/// Of several steps with the same old element the first wins. A step whose
/// old element lies inside the old element of another replacing step is
/// dropped, no matter which came first.
pub fn resolve_nesting(doc: &Document, steps: Vec<Step>) -> Vec<Step> {
    let mut unique: Vec<Step> = Vec::with_capacity(steps.len());
    for step in steps {
        if !unique.iter().any(|u| u.old == step.old) {
            unique.push(step);
        }
    }
    let covered: Vec<bool> = unique
        .iter()
        .enumerate()
        .map(|(i, step)| {
            step.placement.is_replacing()
                && unique.iter().enumerate().any(|(j, rival)| {
                    i != j && rival.placement.is_replacing() && doc.contains(rival.old, step.old)
                })
        })
        .collect();
    unique
        .into_iter()
        .zip(covered)
        .filter_map(|(step, covered)| {
            if covered {
                log::trace!(target: "splice.resolve", "{} is nested, dropping it", step.selector);
            }
            (!covered).then_some(step)
        })
        .collect()
}

/// Only the first step may move focus or scroll.
pub fn set_scroll_and_focus_options(steps: &mut [Step]) {
    for step in steps.iter_mut().skip(1) {
        step.scroll = ScrollOption::False;
        step.focus = FocusOption::False;
    }
}
