use core_types::LayerId;
use css::SelectorError;
use dom::{DomError, NodeId};
use layer::LayerError;
use thiserror::Error;

/// A cleanup callback that failed while an element was torn down.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cleanup of {element} failed: {message}")]
pub struct HookError {
    pub element: NodeId,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ChangeError {
    /// A required target matched nothing. The next plan may still succeed.
    #[error("could not match `{target}`: {reason}")]
    CannotMatch { target: String, reason: String },
    /// The layer closed, or the operation was cancelled, while in flight.
    #[error("aborted: {reason}")]
    Aborted { reason: String },
    #[error("`{notification}` was prevented by a listener")]
    Vetoed { notification: &'static str },
    /// Cleanup callbacks failed. The DOM work they belonged to still completed.
    #[error("{} cleanup callback(s) failed", .0.len())]
    HookFailed(Vec<HookError>),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("{0} is not open")]
    LayerNotOpen(LayerId),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ChangeError {
    pub fn cannot_match(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CannotMatch {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Errors that do not indicate a defect and need no reporting.
    pub fn is_uncritical(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    pub fn is_cannot_match(&self) -> bool {
        matches!(self, Self::CannotMatch { .. })
    }
}
