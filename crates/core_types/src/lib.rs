use std::fmt;
use std::str::FromStr;

/// Identity of a layer. Ids are handed out once per page and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl LayerId {
    pub const ROOT: LayerId = LayerId(0);
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// How a new fragment relates to the element it was matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Swap the old element for the new one.
    #[default]
    Replace,
    /// Swap only the children, keeping the old container.
    Content,
    /// Prepend the new children inside the old element.
    Before,
    /// Append the new children inside the old element.
    After,
}

impl Placement {
    /// Placements that remove the old element's subtree.
    pub fn is_replacing(self) -> bool {
        matches!(self, Placement::Replace | Placement::Content)
    }

    /// Parse a placement suffix without its leading colon.
    pub fn from_suffix(suffix: &str) -> Option<Placement> {
        match suffix.to_ascii_lowercase().as_str() {
            "replace" | "outer" => Some(Placement::Replace),
            "content" | "inner" => Some(Placement::Content),
            "before" | "prepend" => Some(Placement::Before),
            "after" | "append" => Some(Placement::After),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Placement::Replace => "replace",
            Placement::Content => "content",
            Placement::Before => "before",
            Placement::After => "after",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual flavor of a layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayerMode {
    Root,
    #[default]
    Modal,
    Drawer,
    Popup,
    Cover,
    Custom(String),
}

impl LayerMode {
    pub fn name(&self) -> &str {
        match self {
            LayerMode::Root => "root",
            LayerMode::Modal => "modal",
            LayerMode::Drawer => "drawer",
            LayerMode::Popup => "popup",
            LayerMode::Cover => "cover",
            LayerMode::Custom(name) => name,
        }
    }

    pub fn is_overlay(&self) -> bool {
        !matches!(self, LayerMode::Root)
    }
}

/// A mode name that cannot become part of an element name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidMode(pub String);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid layer mode {:?}", self.0)
    }
}

impl std::error::Error for InvalidMode {}

impl FromStr for LayerMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Ok(match name.as_str() {
            "root" => LayerMode::Root,
            "modal" => LayerMode::Modal,
            "drawer" => LayerMode::Drawer,
            "popup" => LayerMode::Popup,
            "cover" => LayerMode::Cover,
            // Custom modes name the overlay element, e.g. `sp-sheet`.
            other
                if other.starts_with(|c: char| c.is_ascii_alphabetic())
                    && other.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
            {
                LayerMode::Custom(other.to_string())
            }
            _ => return Err(InvalidMode(s.to_string())),
        })
    }
}

impl fmt::Display for LayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
