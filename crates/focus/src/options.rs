use serde::Deserialize;
use std::fmt;

/// What to focus once a fragment was inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOption")]
pub enum FocusOption {
    /// Leave focus alone.
    #[default]
    False,
    /// Put back the focus that was captured before the swap, if it was lost.
    Keep,
    /// Focus the inserted fragment.
    Target,
    /// Focus the layer's container.
    Layer,
    /// `[autofocus]` in the new fragment, else `Keep`.
    Auto,
    /// Restore a capsule cached for the layer's location.
    Restore,
    Selector(String),
}

/// Where to scroll once a fragment was inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOption")]
pub enum ScrollOption {
    #[default]
    False,
    /// Reveal the inserted fragment.
    Target,
    /// Scroll the layer's viewport to the top.
    Top,
    /// Reveal the layer's container.
    Layer,
    /// Reset every viewport of the layer to the origin.
    Reset,
    /// Restore scroll positions cached for the layer's location.
    Restore,
    Selector(String),
}

impl FocusOption {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "false" => Self::False,
            "keep" => Self::Keep,
            "target" | "true" => Self::Target,
            "layer" => Self::Layer,
            "auto" => Self::Auto,
            "restore" => Self::Restore,
            other => Self::Selector(other.to_string()),
        }
    }

    pub fn is_false(&self) -> bool {
        *self == Self::False
    }
}

impl ScrollOption {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "false" => Self::False,
            "target" | "true" => Self::Target,
            "top" => Self::Top,
            "layer" => Self::Layer,
            "reset" => Self::Reset,
            "restore" => Self::Restore,
            other => Self::Selector(other.to_string()),
        }
    }

    pub fn is_false(&self) -> bool {
        *self == Self::False
    }
}

impl fmt::Display for FocusOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::False => f.write_str("false"),
            Self::Keep => f.write_str("keep"),
            Self::Target => f.write_str("target"),
            Self::Layer => f.write_str("layer"),
            Self::Auto => f.write_str("auto"),
            Self::Restore => f.write_str("restore"),
            Self::Selector(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for ScrollOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::False => f.write_str("false"),
            Self::Target => f.write_str("target"),
            Self::Top => f.write_str("top"),
            Self::Layer => f.write_str("layer"),
            Self::Reset => f.write_str("reset"),
            Self::Restore => f.write_str("restore"),
            Self::Selector(s) => f.write_str(s),
        }
    }
}

/// Config files may say `focus = false` or `focus = "auto"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Flag(bool),
    Text(String),
}

impl RawOption {
    fn as_text(&self) -> &str {
        match self {
            RawOption::Flag(true) => "true",
            RawOption::Flag(false) => "false",
            RawOption::Text(text) => text,
        }
    }
}

impl From<RawOption> for FocusOption {
    fn from(raw: RawOption) -> Self {
        FocusOption::parse(raw.as_text())
    }
}

impl From<RawOption> for ScrollOption {
    fn from(raw: RawOption) -> Self {
        ScrollOption::parse(raw.as_text())
    }
}
