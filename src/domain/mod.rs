//! Domain layer: entities and hierarchy algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod adjacency;
pub mod entities;
pub mod error;
pub mod forest;
pub mod nested_set;
pub mod sanitize;
pub mod selection;
pub mod validate;

pub use adjacency::{AdjacencyGrouper, FlatTree};
pub use entities::*;
pub use error::{BoundsViolation, DomainError};
pub use forest::Forest;
pub use nested_set::{GapPolicy, NestedSetReconstructor};
pub use sanitize::LabelSanitizer;
pub use selection::{annotate_flat, annotate_forest, Selection};
pub use validate::validate_bounds;
