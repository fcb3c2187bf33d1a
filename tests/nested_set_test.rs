//! Integration tests for nested-set reconstruction

use rstest::rstest;

use rstree::domain::{
    validate_bounds, BoundsViolation, DomainError, Forest, GapPolicy, NestedSetReconstructor, Row,
    TreeNode,
};
use rstree::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Electronics catalog, one root:
///
/// ```text
/// 1 Electronics (1,10)
/// ├── 2 Phones (2,5)
/// │   └── 3 Android (3,4)
/// └── 4 Laptops (6,9)
///     └── 5 Ultrabooks (7,8)
/// ```
fn catalog() -> Vec<Row> {
    vec![
        Row::new(1, 1, 10, "Electronics"),
        Row::new(2, 2, 5, "Phones"),
        Row::new(3, 3, 4, "Android"),
        Row::new(4, 6, 9, "Laptops"),
        Row::new(5, 7, 8, "Ultrabooks"),
    ]
}

fn reconstruct(rows: &[Row]) -> Forest {
    NestedSetReconstructor::default().reconstruct(rows)
}

fn ids(nodes: &[TreeNode]) -> Vec<i64> {
    nodes.iter().map(|n| n.id).collect()
}

/// Walk the forest and check every child lies strictly inside its parent's
/// interval, siblings ordered by left bound.
fn assert_nested(nodes: &[TreeNode], rows: &[Row], parent: Option<&Row>) {
    let bounds = |id: i64| rows.iter().find(|r| r.id == id).unwrap();
    let mut last_left = i64::MIN;
    for node in nodes {
        let row = bounds(node.id);
        assert!(row.left > last_left, "siblings out of order at {}", node.id);
        last_left = row.left;
        if let Some(parent) = parent {
            assert!(parent.left < row.left && row.right < parent.right);
        }
        assert_nested(&node.children, rows, Some(row));
    }
}

#[test]
fn given_well_formed_rows_when_reconstructing_then_every_row_appears_once() {
    // Arrange
    let rows = catalog();

    // Act
    let forest = reconstruct(&rows);

    // Assert
    let mut seen: Vec<i64> = forest.iter().map(|n| n.id).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(forest.node_count(), rows.len());
}

#[test]
fn given_well_formed_rows_when_reconstructing_then_children_nest_inside_parent() {
    // Arrange
    let rows = catalog();

    // Act
    let forest = reconstruct(&rows);

    // Assert
    assert_eq!(ids(forest.roots()), vec![1]);
    let root = &forest.roots()[0];
    assert_eq!(ids(&root.children), vec![2, 4]);
    assert_eq!(ids(&root.children[0].children), vec![3]);
    assert_eq!(ids(&root.children[1].children), vec![5]);
    assert_nested(forest.roots(), &rows, None);
    assert_eq!(forest.depth(), 3);
}

#[test]
fn given_leaf_bounds_when_reconstructing_then_children_are_empty() {
    // Arrange
    let rows = catalog();

    // Act
    let forest = reconstruct(&rows);

    // Assert
    for row in rows.iter().filter(|r| r.is_leaf()) {
        let node = forest.find(row.id).unwrap();
        assert!(node.children.is_empty(), "leaf {} has children", row.id);
    }
}

#[test]
fn given_node_when_serializing_then_has_widget_shape() {
    // Arrange
    let rows = vec![Row::new(7, 1, 2, "Solo")];

    // Act
    let json = serde_json::to_value(reconstruct(&rows)).unwrap();

    // Assert
    assert_eq!(
        json,
        serde_json::json!([{
            "id": 7,
            "text": "Solo",
            "a_attr": {"data-id": 7},
            "children": [],
            "state": {"selected": false}
        }])
    );
}

#[test]
fn given_two_roots_when_reconstructing_then_each_root_has_its_own_tree() {
    // Arrange: both trees use bounds starting at 1
    let rows = vec![
        Row::new(1, 1, 4, "Books").with_root(1),
        Row::new(2, 2, 3, "Novels").with_root(1),
        Row::new(3, 1, 4, "Music").with_root(3),
        Row::new(4, 2, 3, "Jazz").with_root(3),
    ];

    // Act
    let forest = reconstruct(&rows);

    // Assert
    assert_eq!(ids(forest.roots()), vec![1, 3]);
    assert_eq!(ids(&forest.roots()[0].children), vec![2]);
    assert_eq!(ids(&forest.roots()[1].children), vec![4]);
}

#[test]
fn given_row_of_next_root_at_left_two_when_reconstructing_then_it_is_not_top_level() {
    // Arrange: row 3 starts at 2 inside root 3's numbering, not root 1's
    let rows = vec![
        Row::new(1, 1, 2, "A").with_root(1),
        Row::new(3, 2, 3, "B").with_root(3),
    ];

    // Act
    let forest = reconstruct(&rows);

    // Assert
    assert_eq!(ids(forest.roots()), vec![1]);
}

#[test]
fn given_same_rows_when_reconstructing_twice_then_results_are_equal() {
    // Arrange
    let rows = catalog();
    let reconstructor = NestedSetReconstructor::default();

    // Act
    let first = reconstructor.reconstruct(&rows);
    let second = reconstructor.reconstruct(&rows);

    // Assert
    assert_eq!(first, second);
}

#[test]
fn given_empty_rows_when_reconstructing_then_forest_is_empty() {
    let forest = reconstruct(&[]);
    assert!(forest.is_empty());
    assert_eq!(serde_json::to_string(&forest).unwrap(), "[]");
}

#[test]
fn given_deep_single_chain_when_reconstructing_then_keeps_every_level() {
    // Arrange: row i encloses row i + 1, the last one is a leaf
    const DEPTH: i64 = 20_000;
    let rows: Vec<Row> = (0..DEPTH)
        .map(|i| Row::new(i + 1, i + 1, 2 * DEPTH - i, "level"))
        .collect();

    // Act
    let forest = reconstruct(&rows);

    // Assert: walk and tear down without recursion
    assert_eq!(forest.node_count(), DEPTH as usize);
    let mut expected_id = 1;
    let mut pending = forest.into_roots();
    while let Some(mut node) = pending.pop() {
        assert_eq!(node.id, expected_id);
        assert!(node.children.len() <= 1);
        expected_id += 1;
        pending.append(&mut node.children);
    }
    assert_eq!(expected_id, DEPTH + 1);
}

#[test]
fn given_gap_after_deleted_sibling_when_dropping_then_detached_rows_are_left_out() {
    // Arrange: a deleted row once held (2,3)
    let rows = vec![
        Row::new(1, 1, 8, "Root"),
        Row::new(3, 4, 5, "Kept?"),
        Row::new(4, 6, 7, "Next"),
    ];

    // Act
    let forest = NestedSetReconstructor::new(GapPolicy::Drop).reconstruct(&rows);

    // Assert
    assert_eq!(ids(forest.roots()), vec![1]);
    assert!(forest.roots()[0].children.is_empty());
}

#[test]
fn given_gap_after_deleted_sibling_when_adopting_then_rows_stay_in_tree() {
    // Arrange
    let rows = vec![
        Row::new(1, 1, 8, "Root"),
        Row::new(3, 4, 5, "Kept"),
        Row::new(4, 6, 7, "Next"),
    ];

    // Act
    let forest = NestedSetReconstructor::new(GapPolicy::Adopt).reconstruct(&rows);

    // Assert
    assert_eq!(ids(&forest.roots()[0].children), vec![3, 4]);
}

#[test]
fn given_row_overlapping_parent_when_reconstructing_then_it_is_dropped() {
    // Arrange: row 2 claims (2,9) inside (1,6)
    let rows = vec![
        Row::new(1, 1, 6, "Root"),
        Row::new(2, 2, 9, "Overlap"),
        Row::new(3, 2, 3, "Child"),
    ];

    // Act
    let forest = reconstruct(&rows);

    // Assert
    assert!(forest.find(2).is_none());
    assert!(forest.find(1).is_some());
}

#[test]
fn given_hostile_label_when_reconstructing_then_text_is_sanitized() {
    let rows = vec![Row::new(1, 1, 2, "<script>alert(1)</script>Phones & <b>Co</b>")];

    let forest = reconstruct(&rows);

    assert_eq!(forest.roots()[0].text, "Phones &amp; Co");
}

#[rstest]
#[case::inverted(vec![Row::new(1, 3, 2, "x")], BoundsViolation::Inverted)]
#[case::unsorted(
    vec![Row::new(1, 3, 4, "a"), Row::new(2, 1, 2, "b")],
    BoundsViolation::Unsorted
)]
#[case::duplicate_left(
    vec![Row::new(1, 1, 4, "a"), Row::new(2, 1, 2, "b")],
    BoundsViolation::DuplicateLeft
)]
#[case::overlapping(
    vec![Row::new(1, 1, 4, "a"), Row::new(2, 2, 6, "b")],
    BoundsViolation::Overlapping
)]
fn given_malformed_rows_when_validating_then_reports_violation(
    #[case] rows: Vec<Row>,
    #[case] expected: BoundsViolation,
) {
    // Act
    let result = validate_bounds(&rows);

    // Assert
    match result {
        Err(DomainError::MalformedBounds { violation, .. }) => assert_eq!(violation, expected),
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

#[test]
fn given_well_formed_rows_when_validating_then_ok() {
    assert_eq!(validate_bounds(&catalog()), Ok(()));
}
