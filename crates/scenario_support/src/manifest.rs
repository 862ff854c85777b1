use serde::Deserialize;
use serde_json::Value;

pub const SCENARIO_FORMAT_V1: &str = "splice-scenario-v1";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub format: String,
    pub name: String,
    /// Markup of the starting page.
    pub page: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Elements focused before the first action, by selector.
    #[serde(default)]
    pub focus: Option<String>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub expect: Expectation,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Render(RenderSpec),
    Accept(CloseSpec),
    Dismiss(CloseSpec),
}

/// Render options in their textual form.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSpec {
    pub target: Option<String>,
    pub fallback: Vec<String>,
    pub html: String,
    pub placement: Option<String>,
    pub layer: Option<String>,
    pub mode: Option<String>,
    /// Selector of the origin element.
    pub origin: Option<String>,
    pub keep: Option<bool>,
    pub hungry: Option<bool>,
    pub focus: Option<String>,
    pub scroll: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    /// Whether the render is expected to fail, and with which error kind.
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CloseSpec {
    /// Layer reference. The front layer when unset.
    pub layer: Option<String>,
    pub value: Value,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Expectation {
    /// Inner markup of `body`, compared after normalization.
    pub body: Option<String>,
    pub layer_count: Option<usize>,
    /// Current history location.
    pub location: Option<String>,
    /// Selector of the focused element.
    pub focused: Option<String>,
    /// Selectors that must match.
    pub present: Vec<String>,
    /// Selectors that must not match.
    pub absent: Vec<String>,
    /// Notification names in emission order. Only checked when set.
    pub notifications: Option<Vec<String>>,
}
