//! Path primitives: normalization, containment and real-path resolution.
//!
//! These are the building blocks every mode validator composes. None of
//! them decides policy on its own.

pub mod containment;
pub mod normalize;
pub mod resolve;

pub use containment::dedup_roots;
pub use containment::is_contained;
pub use containment::is_contained_in_any;
pub use containment::matching_root;
pub use normalize::ExpansionContext;
pub use normalize::lexical_clean;
pub use normalize::normalize;
pub use normalize::normalize_with;
pub use resolve::Resolved;
pub use resolve::open_no_follow;
pub use resolve::resolve_no_follow;
pub use resolve::resolve_real;
