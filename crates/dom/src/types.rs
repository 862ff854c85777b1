use crate::selection::SelectionRange;
use std::fmt;
use std::sync::Arc;

/// Stable handle of a node inside a [`Document`](crate::Document) arena.
///
/// Handles are never reused, so two equal handles always denote the same node
/// object even after it has been moved between parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Attribute = (Arc<str>, Option<String>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document { doctype: Option<String> },
    /// Detached container produced by fragment parsing.
    Fragment,
    Element {
        name: Arc<str>,
        attributes: Vec<Attribute>,
    },
    Text { text: String },
    Comment { text: String },
}

/// Scroll offsets of an element's own scrollbar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    pub top: f32,
    pub left: f32,
}

impl ScrollOffset {
    pub const ZERO: ScrollOffset = ScrollOffset { top: 0.0, left: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.left == 0.0
    }
}

/// Live state that browsers keep outside of markup.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeState {
    pub scroll: ScrollOffset,
    /// Current value of a form control, once it diverged from markup.
    pub value: Option<String>,
    pub selection: Option<SelectionRange>,
    /// Set while an element is being swapped out.
    pub destroying: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct NodeRecord {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub state: NodeState,
}

impl NodeRecord {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            state: NodeState::default(),
        }
    }

    pub fn allows_children(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document { .. } | NodeKind::Fragment | NodeKind::Element { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not belong to this document.
    UnknownNode(NodeId),
    /// Text, comment and document nodes cannot be inserted below this parent.
    InvalidParent(NodeId),
    /// The insertion would make a node its own ancestor.
    CycleDetected { parent: NodeId, child: NodeId },
    /// The reference node is not a child of the given parent.
    NotAChild { parent: NodeId, child: NodeId },
    /// The node has no parent, so it cannot be replaced or used as a sibling anchor.
    Detached(NodeId),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::InvalidParent(id) => write!(f, "node {id} cannot have children"),
            Self::CycleDetected { parent, child } => {
                write!(f, "inserting {child} into {parent} would create a cycle")
            }
            Self::NotAChild { parent, child } => write!(f, "{child} is not a child of {parent}"),
            Self::Detached(id) => write!(f, "node {id} is detached"),
        }
    }
}

impl std::error::Error for DomError {}
