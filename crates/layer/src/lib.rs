//! Layers and the layer stack.

pub mod config;
mod error;
pub mod history;
mod layer;
mod lookup;
pub mod pattern;
mod stack;

pub use config::{Config, DismissMethod, LayerConfig, LayerOptions, merge_chain};
pub use error::LayerError;
pub use history::{History, HistoryEntry};
pub use layer::Layer;
pub use lookup::{GetOptions, LayerRef};
pub use pattern::UrlPattern;
pub use stack::{CurrentGuard, LayerStack};
