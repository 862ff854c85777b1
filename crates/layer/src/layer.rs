use crate::config::LayerConfig;
use core_types::{LayerId, LayerMode};
use dom::NodeId;
use focus::SavedStates;
use serde_json::{Map, Value};

/// One visual plane: the root page or an overlay.
///
/// A layer never points at its neighbors. Parent, child and ancestors are
/// derived from its position in the [`LayerStack`](crate::LayerStack).
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    pub mode: LayerMode,
    /// Outermost element owned by the layer.
    pub element: NodeId,
    /// Element that receives the layer's content: `body` for the root layer,
    /// the content box for overlays.
    pub content: NodeId,
    pub config: LayerConfig,
    pub context: Map<String, Value>,
    pub location: Option<String>,
    pub title: Option<String>,
    /// Focus and scroll state cached per location.
    pub saved: SavedStates,
    /// Set while the open animation is still running.
    pub opening: bool,
    /// Element that caused the layer to open.
    pub origin: Option<NodeId>,
}

impl Layer {
    pub fn root(element: NodeId, content: NodeId, config: LayerConfig) -> Self {
        Self {
            id: LayerId::ROOT,
            mode: LayerMode::Root,
            element,
            content,
            config,
            context: Map::new(),
            location: None,
            title: None,
            saved: SavedStates::new(),
            opening: false,
            origin: None,
        }
    }

    pub fn overlay(
        id: LayerId,
        mode: LayerMode,
        element: NodeId,
        content: NodeId,
        config: LayerConfig,
    ) -> Self {
        debug_assert!(mode.is_overlay(), "overlays cannot use the root mode");
        Self {
            id,
            mode,
            element,
            content,
            config,
            context: Map::new(),
            location: None,
            title: None,
            saved: SavedStates::new(),
            opening: true,
            origin: None,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.mode == LayerMode::Root
    }

    pub fn is_overlay(&self) -> bool {
        !self.is_root()
    }

    /// Key under which focus and scroll state is cached.
    pub fn saved_state_key(&self) -> String {
        self.location.clone().unwrap_or_default()
    }
}
