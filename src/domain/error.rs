//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::Identifier;

/// Kind of nested-set bounds violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsViolation {
    /// `left >= right`
    Inverted,
    /// Row sorts before its predecessor by (root, left)
    Unsorted,
    /// Interval overlaps an open ancestor without being contained in it
    Overlapping,
    /// Same left bound used twice within one root
    DuplicateLeft,
}

impl std::fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BoundsViolation::Inverted => "left bound is not below right bound",
            BoundsViolation::Unsorted => "rows are not sorted by (root, left)",
            BoundsViolation::Overlapping => "interval overlaps without nesting",
            BoundsViolation::DuplicateLeft => "left bound used twice",
        };
        f.write_str(s)
    }
}

/// Domain errors represent violated hierarchy invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed nested-set bounds at row {id} (left={left}, right={right}): {violation}")]
    MalformedBounds {
        id: Identifier,
        left: i64,
        right: i64,
        violation: BoundsViolation,
    },
}
