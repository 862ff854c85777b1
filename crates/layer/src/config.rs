//! Layer settings.
//!
//! Every layer gets one plain [`LayerConfig`] at construction time. It is
//! built by [`merge_chain`] from an ordered list of partial [`LayerOptions`],
//! most specific first:
//!
//! 1. options passed by the caller of the open operation
//! 2. defaults of the layer's mode (`modal`, `drawer`, ...)
//! 3. defaults shared by all overlays (skipped for the root layer)
//! 4. defaults shared by any layer
//!
//! For each field the first link that sets it wins. Fields no link sets fall
//! back to [`LayerConfig::default`].

use crate::error::LayerError;
use core_types::LayerMode;
use serde::Deserialize;
use std::collections::HashMap;

/// Ways a user may dismiss an overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissMethod {
    /// The close button inside the overlay box.
    Button,
    /// The escape key.
    Key,
    /// A click on the backdrop or outside the overlay.
    Outside,
}

/// Resolved settings of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    pub history: bool,
    pub dismissable: Vec<DismissMethod>,
    pub size: String,
    pub position: Option<String>,
    pub class: Option<String>,
    pub open_animation: String,
    pub close_animation: String,
    /// Animation duration in milliseconds.
    pub duration: u32,
    pub accept_location: Option<String>,
    pub dismiss_location: Option<String>,
    /// Tag of the overlay container. Defaults to `sp-{mode}`.
    pub element_name: Option<String>,
    pub dismiss_label: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            history: false,
            dismissable: Vec::new(),
            size: "medium".to_string(),
            position: None,
            class: None,
            open_animation: "none".to_string(),
            close_animation: "none".to_string(),
            duration: 0,
            accept_location: None,
            dismiss_location: None,
            element_name: None,
            dismiss_label: "×".to_string(),
        }
    }
}

impl LayerConfig {
    pub fn is_dismissable_by(&self, method: DismissMethod) -> bool {
        self.dismissable.contains(&method)
    }

    pub fn element_name_for(&self, mode: &LayerMode) -> String {
        self.element_name
            .clone()
            .unwrap_or_else(|| format!("sp-{}", mode.name()))
    }
}

/// One link of the merge chain. Unset fields defer to the next link.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerOptions {
    pub history: Option<bool>,
    pub dismissable: Option<Vec<DismissMethod>>,
    pub size: Option<String>,
    pub position: Option<String>,
    pub class: Option<String>,
    pub open_animation: Option<String>,
    pub close_animation: Option<String>,
    pub duration: Option<u32>,
    pub accept_location: Option<String>,
    pub dismiss_location: Option<String>,
    pub element_name: Option<String>,
    pub dismiss_label: Option<String>,
}

impl LayerOptions {
    /// Fields of `self`, falling back to `fallback` where unset.
    pub fn or(&self, fallback: &LayerOptions) -> LayerOptions {
        LayerOptions {
            history: self.history.or(fallback.history),
            dismissable: self.dismissable.clone().or_else(|| fallback.dismissable.clone()),
            size: self.size.clone().or_else(|| fallback.size.clone()),
            position: self.position.clone().or_else(|| fallback.position.clone()),
            class: self.class.clone().or_else(|| fallback.class.clone()),
            open_animation: self
                .open_animation
                .clone()
                .or_else(|| fallback.open_animation.clone()),
            close_animation: self
                .close_animation
                .clone()
                .or_else(|| fallback.close_animation.clone()),
            duration: self.duration.or(fallback.duration),
            accept_location: self
                .accept_location
                .clone()
                .or_else(|| fallback.accept_location.clone()),
            dismiss_location: self
                .dismiss_location
                .clone()
                .or_else(|| fallback.dismiss_location.clone()),
            element_name: self.element_name.clone().or_else(|| fallback.element_name.clone()),
            dismiss_label: self
                .dismiss_label
                .clone()
                .or_else(|| fallback.dismiss_label.clone()),
        }
    }

    fn resolve(self) -> LayerConfig {
        let base = LayerConfig::default();
        LayerConfig {
            history: self.history.unwrap_or(base.history),
            dismissable: self.dismissable.unwrap_or(base.dismissable),
            size: self.size.unwrap_or(base.size),
            position: self.position,
            class: self.class,
            open_animation: self.open_animation.unwrap_or(base.open_animation),
            close_animation: self.close_animation.unwrap_or(base.close_animation),
            duration: self.duration.unwrap_or(base.duration),
            accept_location: self.accept_location,
            dismiss_location: self.dismiss_location,
            element_name: self.element_name,
            dismiss_label: self.dismiss_label.unwrap_or(base.dismiss_label),
        }
    }
}

/// Merge `chain`, most specific link first.
pub fn merge_chain(chain: &[&LayerOptions]) -> LayerConfig {
    chain
        .iter()
        .fold(LayerOptions::default(), |merged, link| merged.or(link))
        .resolve()
}

/// Defaults for every mode plus the shared `overlay` and `any` links.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub any: LayerOptions,
    pub overlay: LayerOptions,
    pub modes: HashMap<String, LayerOptions>,
}

impl Config {
    /// Built-in defaults.
    pub fn builtin() -> Self {
        let all_methods = vec![
            DismissMethod::Button,
            DismissMethod::Key,
            DismissMethod::Outside,
        ];
        let overlay = LayerOptions {
            history: Some(true),
            dismissable: Some(all_methods),
            open_animation: Some("fade-in".into()),
            close_animation: Some("fade-out".into()),
            duration: Some(200),
            ..LayerOptions::default()
        };
        let mut modes = HashMap::new();
        modes.insert(
            "root".to_string(),
            LayerOptions {
                history: Some(true),
                ..LayerOptions::default()
            },
        );
        modes.insert("modal".to_string(), LayerOptions::default());
        modes.insert(
            "drawer".to_string(),
            LayerOptions {
                size: Some("medium".into()),
                position: Some("left".into()),
                open_animation: Some("move-from-left".into()),
                close_animation: Some("move-to-left".into()),
                ..LayerOptions::default()
            },
        );
        modes.insert(
            "popup".to_string(),
            LayerOptions {
                history: Some(false),
                dismissable: Some(vec![DismissMethod::Key, DismissMethod::Outside]),
                size: Some("medium".into()),
                position: Some("bottom".into()),
                open_animation: Some("zoom-in".into()),
                close_animation: Some("zoom-out".into()),
                ..LayerOptions::default()
            },
        );
        modes.insert(
            "cover".to_string(),
            LayerOptions {
                size: Some("full".into()),
                open_animation: Some("move-from-top".into()),
                close_animation: Some("move-to-top".into()),
                ..LayerOptions::default()
            },
        );
        Self {
            any: LayerOptions::default(),
            overlay,
            modes,
        }
    }

    /// Parse user overrides and lay them over the built-in defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, LayerError> {
        let user: Config = toml::from_str(input)?;
        Ok(user.over(Config::builtin()))
    }

    /// `self` with unset fields taken from `fallback`.
    pub fn over(self, fallback: Config) -> Config {
        let mut modes = fallback.modes;
        for (name, options) in self.modes {
            let merged = match modes.get(&name) {
                Some(builtin) => options.or(builtin),
                None => options,
            };
            modes.insert(name, merged);
        }
        Config {
            any: self.any.or(&fallback.any),
            overlay: self.overlay.or(&fallback.overlay),
            modes,
        }
    }

    /// The merge chain for a layer of `mode` opened with `caller` options.
    pub fn chain<'a>(&'a self, mode: &LayerMode, caller: &'a LayerOptions) -> Vec<&'a LayerOptions> {
        let mut chain = vec![caller];
        if let Some(mode_defaults) = self.modes.get(mode.name()) {
            chain.push(mode_defaults);
        }
        if mode.is_overlay() {
            chain.push(&self.overlay);
        }
        chain.push(&self.any);
        chain
    }

    pub fn settings_for(&self, mode: &LayerMode, caller: &LayerOptions) -> LayerConfig {
        merge_chain(&self.chain(mode, caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_specific_link_wins() {
        let caller = LayerOptions {
            size: Some("large".into()),
            ..LayerOptions::default()
        };
        let mode = LayerOptions {
            size: Some("small".into()),
            position: Some("right".into()),
            ..LayerOptions::default()
        };
        let any = LayerOptions {
            position: Some("left".into()),
            history: Some(true),
            ..LayerOptions::default()
        };
        let config = merge_chain(&[&caller, &mode, &any]);
        assert_eq!(config.size, "large");
        assert_eq!(config.position.as_deref(), Some("right"));
        assert!(config.history);
        assert_eq!(config.open_animation, "none");
    }

    #[test]
    fn builtin_modes_differ() {
        let config = Config::builtin();
        let none = LayerOptions::default();
        let popup = config.settings_for(&LayerMode::Popup, &none);
        assert!(!popup.history);
        assert!(!popup.is_dismissable_by(DismissMethod::Button));

        let modal = config.settings_for(&LayerMode::Modal, &none);
        assert!(modal.history);
        assert!(modal.is_dismissable_by(DismissMethod::Button));
        assert_eq!(modal.element_name_for(&LayerMode::Modal), "sp-modal");

        let root = config.settings_for(&LayerMode::Root, &none);
        assert!(root.history);
        assert!(root.dismissable.is_empty());

        let custom = config.settings_for(&LayerMode::Custom("sheet".into()), &none);
        assert_eq!(custom.open_animation, "fade-in");
    }

    #[test]
    fn toml_overrides_sit_on_top_of_builtins() {
        let config = Config::from_toml_str(
            r#"
            [overlay]
            duration = 0

            [modes.drawer]
            position = "right"
            "#,
        )
        .unwrap();
        let drawer = config.settings_for(&LayerMode::Drawer, &LayerOptions::default());
        assert_eq!(drawer.position.as_deref(), Some("right"));
        assert_eq!(drawer.open_animation, "move-from-left");
        assert_eq!(drawer.duration, 0);
        assert!(drawer.history);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[overlay]\nwobble = true\n").unwrap_err();
        assert!(matches!(err, LayerError::Config(_)));
    }
}
