//! Selectors over a [`dom::Document`].

pub mod matching;
pub mod syntax;
pub mod target;

pub use matching::{closest, matches, query_all, query_first, subtree};
pub use syntax::{
    AttrCondition, Combinator, ComplexSelector, Compound, Part, SelectorError, SelectorList,
    escape_ident, quote_value, split_top_level,
};
pub use target::{ID_ATTRIBUTE, derive_target, target_candidates};
