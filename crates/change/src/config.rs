use serde::Deserialize;

/// Which of several matches a target resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Prefer matches close to the origin element.
    #[default]
    Region,
    /// Always the first match in the layer.
    First,
}

/// Settings for fragment updates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FragmentConfig {
    /// Targets tried in order when a render asks for `:main`.
    pub main_targets: Vec<String>,
    pub match_mode: MatchMode,
    /// Whether `sp-keep` is honored unless a render disables it.
    pub keep: bool,
    /// Whether `sp-hungry` elements join renders unless a render disables it.
    pub hungry: bool,
    pub autofocus_selector: String,
    pub keep_attribute: String,
    pub hungry_attribute: String,
    pub if_layer_attribute: String,
    pub data_attribute: String,
    /// Tag used for the throwaway wrappers of content, before and after swaps.
    pub wrapper_name: String,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            main_targets: vec!["[sp-main]".into(), "main".into(), ":layer".into()],
            match_mode: MatchMode::Region,
            keep: true,
            hungry: true,
            autofocus_selector: "[autofocus]".into(),
            keep_attribute: "sp-keep".into(),
            hungry_attribute: "sp-hungry".into(),
            if_layer_attribute: "sp-if-layer".into(),
            data_attribute: "sp-data".into(),
            wrapper_name: "sp-wrapper".into(),
        }
    }
}

impl FragmentConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_single_fields() {
        let config = FragmentConfig::from_toml_str(
            r##"
            main_targets = ["#app"]
            match_mode = "first"
            "##,
        )
        .unwrap();
        assert_eq!(config.main_targets, vec!["#app"]);
        assert_eq!(config.match_mode, MatchMode::First);
        assert!(config.keep);
        assert_eq!(config.keep_attribute, "sp-keep");
    }
}
