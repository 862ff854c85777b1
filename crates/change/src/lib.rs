//! Fragment updates and overlay changes for a [`Page`].
//!
//! A render resolves a target expression into steps, matches each step in
//! the current layer and in the response, and then swaps, inserts or keeps
//! elements. Opening and closing overlays goes through the same entry
//! point ([`Page::render`] with [`layer::LayerRef::New`]) or through
//! [`Page::accept`], [`Page::dismiss`] and [`Page::peel`].
//!
//! Everything runs on one thread. DOM and stack changes are done when a
//! call returns; animations are represented by futures.

pub mod behaviors;
pub mod close;
pub mod config;
pub mod error;
mod focus_scroll;
pub mod keep;
pub mod matcher;
pub mod motion;
mod open;
pub mod page;
pub mod render;
pub mod steps;
pub mod update;

pub use behaviors::{Activation, Behaviors, Destructor, Inert, Teardown};
pub use close::{CloseIntent, Closing};
pub use config::{FragmentConfig, MatchMode};
pub use error::{ChangeError, HookError};
pub use keep::{KeepPlan, Relocation, Reviver, Transplant, find_keep_plan};
pub use matcher::LayerMatcher;
#[cfg(any(test, feature = "test-support"))]
pub use motion::ManualMotion;
pub use motion::{Effect, Hook, InstantMotion, MorphExit, MorphPlan, Motion, SharedDocument};
pub use page::{Page, PageBuilder, ValueCallback};
pub use render::{RenderOptions, RenderResult};
pub use steps::{Step, parse_placement, parse_target, resolve_nesting, set_scroll_and_focus_options};
