//! The render entry point.

use crate::close::{CloseIntent, close_layer};
use crate::error::ChangeError;
use crate::motion::Effect;
use crate::page::{Page, ValueCallback};
use crate::{open, steps, update};
use core_types::{LayerId, LayerMode, Placement};
use dom::NodeId;
use focus::{FocusOption, ScrollOption};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use layer::{GetOptions, LayerOptions, LayerRef, UrlPattern};
use serde_json::{Map, Value};
use std::fmt;

/// What to render where.
#[derive(Clone)]
pub struct RenderOptions {
    /// Layers to try, in order. [`LayerRef::New`] opens an overlay.
    pub layer: LayerRef,
    /// Layer that relative references like `parent` start from.
    pub base_layer: Option<LayerId>,
    /// Target expression. Defaults to `:main`.
    pub target: Option<String>,
    /// Use this element as the old element of the first target.
    pub target_element: Option<NodeId>,
    /// Targets tried when `target` cannot be matched.
    pub fallback: Vec<String>,
    pub placement: Placement,
    /// Response markup.
    pub html: String,
    /// Element that caused the render.
    pub origin: Option<NodeId>,
    /// `None` uses the configured default.
    pub keep: Option<bool>,
    pub hungry: Option<bool>,
    pub scroll: ScrollOption,
    pub focus: FocusOption,
    pub transition: Effect,
    pub location: Option<String>,
    pub title: Option<String>,
    /// Merged into the layer's context.
    pub context: Map<String, Value>,
    /// Mode of a new layer.
    pub mode: LayerMode,
    pub layer_options: LayerOptions,
    pub on_accepted: Option<ValueCallback>,
    pub on_dismissed: Option<ValueCallback>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            layer: LayerRef::Current,
            base_layer: None,
            target: None,
            target_element: None,
            fallback: Vec::new(),
            placement: Placement::Replace,
            html: String::new(),
            origin: None,
            keep: None,
            hungry: None,
            scroll: ScrollOption::False,
            focus: FocusOption::False,
            transition: Effect::none(),
            location: None,
            title: None,
            context: Map::new(),
            mode: LayerMode::Modal,
            layer_options: LayerOptions::default(),
            on_accepted: None,
            on_dismissed: None,
        }
    }
}

impl RenderOptions {
    pub fn new(target: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            html: html.into(),
            ..Self::default()
        }
    }

    /// Open a new overlay of `mode` with `html`.
    pub fn overlay(mode: LayerMode, html: impl Into<String>) -> Self {
        Self {
            layer: LayerRef::New,
            mode,
            html: html.into(),
            ..Self::default()
        }
    }

    /// Targets in the order they are tried.
    pub(crate) fn plans(&self) -> Vec<String> {
        let mut plans = vec![self.target.clone().unwrap_or_else(|| ":main".to_string())];
        plans.extend(self.fallback.iter().cloned());
        plans
    }
}

/// Outcome of a render whose DOM changes are done.
pub struct RenderResult {
    pub layer: LayerId,
    /// New elements, in target order.
    pub fragments: Vec<NodeId>,
    /// Elements that survived instead of being replaced.
    pub kept: Vec<NodeId>,
    /// Resolves once all animations settled. Fails with `Aborted` if the
    /// layer closed in the meantime.
    pub finished: LocalBoxFuture<'static, Result<(), ChangeError>>,
}

impl fmt::Debug for RenderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResult")
            .field("layer", &self.layer)
            .field("fragments", &self.fragments)
            .field("kept", &self.kept)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Render `options.html` into the page.
    ///
    /// Every layer of `options.layer` is tried with every plan (the target,
    /// then each fallback) until one matches in the layer and in the
    /// response. The DOM is updated before this returns.
    ///
    /// When the new location meets an overlay's accept or dismiss condition,
    /// the overlay closes instead and `finished` fails with `Aborted`.
    pub fn render(&self, options: RenderOptions) -> Result<RenderResult, ChangeError> {
        let response = self.document_mut().parse_fragment(&options.html);
        if options.layer.is_new() {
            return open::open_layer(self, &options, response);
        }

        let layers = {
            let doc = self.document();
            self.stack().get_all(
                &doc,
                &options.layer,
                GetOptions {
                    base: options.base_layer,
                    origin: options.origin,
                },
            )
        };
        let Some(&first) = layers.first() else {
            return Err(ChangeError::cannot_match(
                options.target.clone().unwrap_or_default(),
                format!("no layer matches {:?}", options.layer),
            ));
        };
        if let Some((intent, value)) = self.close_condition(first, options.location.as_deref()) {
            log::debug!(target: "splice.layer", "location closes {first}");
            let closing = close_layer(self, first, intent, value, false)?;
            return Ok(RenderResult {
                layer: first,
                fragments: Vec::new(),
                kept: Vec::new(),
                finished: async move {
                    closing.await?;
                    Err(ChangeError::aborted(format!("{first} closed by its location")))
                }
                .boxed_local(),
            });
        }

        let mut last_error = None;
        for &layer in &layers {
            for target in options.plans() {
                match self.try_plan(layer, &target, &options, response) {
                    Ok(result) => return Ok(result),
                    Err(err) if err.is_cannot_match() => {
                        log::debug!(target: "splice.resolve", "plan {target} in {layer} failed: {err}");
                        last_error = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ChangeError::cannot_match("", "no plan to try")))
    }

    fn try_plan(
        &self,
        layer: LayerId,
        target: &str,
        options: &RenderOptions,
        response: NodeId,
    ) -> Result<RenderResult, ChangeError> {
        let planned = steps::preflight(self, layer, target, options)?;
        let mut matched = steps::postflight(self, planned, response)?;
        let hungry = options.hungry.unwrap_or(self.fragment_config().hungry);
        if hungry && !matched.is_empty() {
            let extra = steps::hungry_steps(self, layer, &matched, response, options);
            if !extra.is_empty() {
                matched.extend(extra);
                matched = steps::resolve_nesting(&self.document(), matched);
            }
        }
        update::execute(self, layer, matched, options)
    }

    /// Does navigating an overlay to `location` accept or dismiss it?
    fn close_condition(&self, layer: LayerId, location: Option<&str>) -> Option<(CloseIntent, Value)> {
        let location = location?;
        let (accept, dismiss) = {
            let stack = self.stack();
            let l = stack.layer(layer).filter(|l| l.is_overlay())?;
            (l.config.accept_location.clone(), l.config.dismiss_location.clone())
        };
        let conditions = [(CloseIntent::Accept, accept), (CloseIntent::Dismiss, dismiss)];
        for (intent, pattern) in conditions {
            let Some(pattern) = pattern else {
                continue;
            };
            match UrlPattern::parse(&pattern) {
                Ok(pattern) => {
                    if let Some(captures) = pattern.captures(location) {
                        let value = serde_json::to_value(captures).unwrap_or(Value::Null);
                        return Some((intent, value));
                    }
                }
                Err(err) => log::warn!(target: "splice.layer", "ignoring close condition: {err}"),
            }
        }
        None
    }

    /// Accept `layer` with `value`. Its descendants are dismissed first.
    ///
    /// The stack shrinks before this returns. The future resolves once the
    /// layer's elements are detached.
    pub fn accept(
        &self,
        layer: LayerId,
        value: Value,
    ) -> Result<LocalBoxFuture<'static, Result<(), ChangeError>>, ChangeError> {
        close_layer(self, layer, CloseIntent::Accept, value, false)
    }

    pub fn dismiss(
        &self,
        layer: LayerId,
        value: Value,
    ) -> Result<LocalBoxFuture<'static, Result<(), ChangeError>>, ChangeError> {
        close_layer(self, layer, CloseIntent::Dismiss, value, false)
    }

    /// Dismiss every descendant of `layer`, frontmost first.
    pub fn peel(&self, layer: LayerId) -> Result<LocalBoxFuture<'static, Result<(), ChangeError>>, ChangeError> {
        crate::close::peel(self, layer)
    }
}
