//! Per-address DOM snapshot cache.
//!
//! A full page scan is expensive to hand to a reasoning model, so captured
//! elements are cached per page address and read back in chunks: paginated,
//! optionally narrowed by fuzzy filters. Refreshing an address replaces its
//! element set wholesale; there is no incremental merge.

mod fuzzy;
mod model;
mod policy;
mod store;

pub use fuzzy::partial_ratio;
pub use model::{
    ElementExtras, ElementFilters, ElementRecord, ElementView, SelectorType, INTERACTIVE_TAGS,
};
pub use policy::FilterPolicy;
pub use store::DomCache;
