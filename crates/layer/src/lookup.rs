//! Textual and structural layer references.

use crate::error::LayerError;
use core_types::LayerId;
use dom::NodeId;
use std::str::FromStr;

/// How a caller addresses one or more layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerRef {
    Id(LayerId),
    /// Stack position, `0` being the root layer.
    Index(usize),
    /// The closest layer containing an element.
    Element(NodeId),
    Current,
    Front,
    Root,
    Parent,
    Child,
    Ancestors,
    Descendants,
    /// The base layer followed by its ancestors.
    Closest,
    /// Overlays, frontmost first.
    Overlay,
    /// The base layer first, then every other layer front to back.
    Any,
    /// A layer that does not exist yet. Never resolves.
    New,
    /// The layer of the origin element.
    Origin,
    /// Each reference in turn; duplicates are skipped.
    List(Vec<LayerRef>),
}

impl LayerRef {
    pub fn parse(input: &str) -> Result<Self, LayerError> {
        let mut refs = input
            .split_whitespace()
            .map(parse_one)
            .collect::<Result<Vec<_>, _>>()?;
        match refs.len() {
            0 => Err(LayerError::InvalidRef(input.to_string())),
            1 => Ok(refs.remove(0)),
            _ => Ok(LayerRef::List(refs)),
        }
    }

    pub fn is_new(&self) -> bool {
        *self == LayerRef::New
    }
}

impl FromStr for LayerRef {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_one(token: &str) -> Result<LayerRef, LayerError> {
    Ok(match token.to_ascii_lowercase().as_str() {
        "current" => LayerRef::Current,
        "front" => LayerRef::Front,
        "root" => LayerRef::Root,
        "parent" => LayerRef::Parent,
        "child" => LayerRef::Child,
        "ancestor" | "ancestors" => LayerRef::Ancestors,
        "descendant" | "descendants" => LayerRef::Descendants,
        "closest" => LayerRef::Closest,
        "overlay" | "overlays" => LayerRef::Overlay,
        "any" => LayerRef::Any,
        "new" => LayerRef::New,
        "origin" => LayerRef::Origin,
        other => match other.parse::<usize>() {
            Ok(index) => LayerRef::Index(index),
            Err(_) => return Err(LayerError::InvalidRef(token.to_string())),
        },
    })
}

/// Context for resolving relative references.
#[derive(Clone, Copy, Debug, Default)]
pub struct GetOptions {
    /// Layer that `parent`, `child`, `closest` and friends are relative to.
    /// Defaults to the current layer.
    pub base: Option<LayerId>,
    /// Element whose layer `origin` refers to.
    pub origin: Option<NodeId>,
}

impl GetOptions {
    pub fn with_base(base: LayerId) -> Self {
        Self {
            base: Some(base),
            origin: None,
        }
    }
}
