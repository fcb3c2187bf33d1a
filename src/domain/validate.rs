//! Linear-time well-formedness check for nested-set rows.

use tracing::debug;

use crate::domain::entities::Row;
use crate::domain::error::{BoundsViolation, DomainError};

/// Check that rows are sorted by `(root, left)` and that intervals within
/// each root are strictly nested or disjoint. Reports the first violation.
pub fn validate_bounds(rows: &[Row]) -> Result<(), DomainError> {
    // Open ancestors of the current row, innermost last
    let mut open: Vec<&Row> = Vec::new();
    let mut previous: Option<&Row> = None;

    for row in rows {
        if row.left >= row.right {
            return Err(violation(row, BoundsViolation::Inverted));
        }
        if let Some(prev) = previous {
            match (row.root, row.left).cmp(&(prev.root, prev.left)) {
                std::cmp::Ordering::Less => return Err(violation(row, BoundsViolation::Unsorted)),
                std::cmp::Ordering::Equal => {
                    return Err(violation(row, BoundsViolation::DuplicateLeft))
                }
                std::cmp::Ordering::Greater => {}
            }
            if prev.root != row.root {
                open.clear();
            }
        }
        while open.last().is_some_and(|top| top.right < row.left) {
            open.pop();
        }
        if open.last().is_some_and(|top| row.right >= top.right) {
            return Err(violation(row, BoundsViolation::Overlapping));
        }
        open.push(row);
        previous = Some(row);
    }

    debug!(rows = rows.len(), "nested-set bounds are well-formed");
    Ok(())
}

fn violation(row: &Row, violation: BoundsViolation) -> DomainError {
    DomainError::MalformedBounds {
        id: row.id,
        left: row.left,
        right: row.right,
        violation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn well_formed() -> Vec<Row> {
        vec![
            Row::new(1, 1, 8, "r"),
            Row::new(2, 2, 5, "a"),
            Row::new(3, 3, 4, "a1"),
            Row::new(4, 6, 7, "b"),
            Row::new(5, 1, 2, "other").with_root(2),
        ]
    }

    #[test]
    fn given_well_formed_rows_when_validating_then_ok() {
        assert_eq!(validate_bounds(&well_formed()), Ok(()));
        assert_eq!(validate_bounds(&[]), Ok(()));
    }

    #[rstest]
    #[case(vec![Row::new(1, 2, 2, "x")], BoundsViolation::Inverted)]
    #[case(vec![Row::new(1, 1, 4, "r"), Row::new(2, 3, 6, "x")], BoundsViolation::Overlapping)]
    #[case(vec![Row::new(1, 1, 4, "r"), Row::new(2, 2, 4, "x")], BoundsViolation::Overlapping)]
    #[case(vec![Row::new(1, 3, 4, "a"), Row::new(2, 1, 2, "b")], BoundsViolation::Unsorted)]
    #[case(vec![Row::new(1, 1, 2, "a").with_root(2), Row::new(2, 1, 2, "b")], BoundsViolation::Unsorted)]
    #[case(vec![Row::new(1, 1, 4, "a"), Row::new(2, 1, 2, "b")], BoundsViolation::DuplicateLeft)]
    fn test_violations(#[case] rows: Vec<Row>, #[case] expected: BoundsViolation) {
        match validate_bounds(&rows) {
            Err(DomainError::MalformedBounds { violation, .. }) => assert_eq!(violation, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
}
