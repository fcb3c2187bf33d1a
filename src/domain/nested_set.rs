//! Nested-set to tree reconstruction.
//!
//! Rows arrive sorted by `(root, left)`. A single cursor is shared by every
//! nesting level: each row is looked at once, at the level whose frame it
//! falls into, so well-formed input costs O(n) overall.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::domain::entities::{AnchorAttributes, Identifier, NodeState, Row, TreeNode};
use crate::domain::forest::Forest;
use crate::domain::sanitize::LabelSanitizer;

/// What to do with a row whose left bound does not directly follow its
/// preceding sibling (e.g. a soft-deleted row left a hole in the bounds).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Only `left == lft + 1` is a direct child; detached rows are dropped.
    #[default]
    Drop,
    /// Any row starting after the preceding sibling is a direct child.
    Adopt,
}

/// Interval a recursion level collects children for.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Opening bound: the parent's left bound, then each sibling's right bound
    lft: i64,
    /// Closing bound; `None` at the top of a root's tree
    rgt: Option<i64>,
    root: Identifier,
}

impl Frame {
    fn top(root: Identifier) -> Self {
        Self {
            lft: 0,
            rgt: None,
            root,
        }
    }

    fn inside(row: &Row) -> Self {
        Self {
            lft: row.left,
            rgt: Some(row.right),
            root: row.root,
        }
    }
}

/// Children collected so far for one open frame.
struct Level<'a> {
    frame: Frame,
    /// Right bound of the last accepted sibling, or the frame's opening bound
    lft: i64,
    /// Row the children belong to; `None` for a root's top frame
    owner: Option<&'a Row>,
    nodes: Vec<TreeNode>,
}

impl<'a> Level<'a> {
    fn new(frame: Frame, owner: Option<&'a Row>) -> Self {
        Self {
            lft: frame.lft,
            frame,
            owner,
            nodes: Vec::new(),
        }
    }
}

/// Converts sorted nested-set rows into a forest.
#[derive(Debug, Clone, Default)]
pub struct NestedSetReconstructor {
    sanitizer: LabelSanitizer,
    gap_policy: GapPolicy,
}

impl NestedSetReconstructor {
    pub fn new(gap_policy: GapPolicy) -> Self {
        Self {
            sanitizer: LabelSanitizer::new(),
            gap_policy,
        }
    }

    /// Rebuild the forest from rows sorted by `(root, left)`.
    ///
    /// Each run of rows sharing a root value opens its own top-level frame,
    /// so every root contributes its own trees to the result. Malformed bounds
    /// never fail: offending rows are dropped and the rest is kept.
    #[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
    pub fn reconstruct(&self, rows: &[Row]) -> Forest {
        let mut cursor = 0;
        let mut roots = Vec::new();

        while let Some(first) = rows.get(cursor) {
            let root = first.root;
            trace!(root, cursor, "opening root frame");
            roots.extend(self.collect(rows, &mut cursor, Frame::top(root)));
        }

        let forest = Forest::new(roots);
        debug!(
            roots = forest.roots().len(),
            nodes = forest.node_count(),
            "reconstructed forest"
        );
        forest
    }

    /// Collect the trees of one frame. Descending into a branch pushes a
    /// level instead of recursing, so tree depth is bounded by memory only.
    fn collect<'a>(&self, rows: &'a [Row], cursor: &mut usize, frame: Frame) -> Vec<TreeNode> {
        let mut parents: Vec<Level<'a>> = Vec::new();
        let mut level = Level::new(frame, None);

        loop {
            match self.next_child(rows, cursor, &level) {
                Some(row) if row.is_leaf() => {
                    level.nodes.push(self.node(row, Vec::new()));
                    level.lft = row.right;
                }
                Some(row) => {
                    let inner = Level::new(Frame::inside(row), Some(row));
                    parents.push(std::mem::replace(&mut level, inner));
                }
                None => {
                    let Some(mut parent) = parents.pop() else {
                        return level.nodes;
                    };
                    if let Some(owner) = level.owner {
                        parent.nodes.push(self.node(owner, level.nodes));
                        parent.lft = owner.right;
                    }
                    level = parent;
                }
            }
        }
    }

    /// Advance to the next direct child of `level`, skipping rows that
    /// overlap the frame or are detached. `None` once the frame is closed.
    fn next_child<'a>(
        &self,
        rows: &'a [Row],
        cursor: &mut usize,
        level: &Level<'_>,
    ) -> Option<&'a Row> {
        let frame = level.frame;
        while let Some(row) = rows.get(*cursor) {
            if row.root != frame.root {
                return None;
            }
            if let Some(rgt) = frame.rgt {
                if row.left >= rgt {
                    return None;
                }
                if row.right >= rgt {
                    warn!(
                        id = row.id,
                        left = row.left,
                        right = row.right,
                        rgt,
                        "dropping row overlapping its enclosing interval"
                    );
                    *cursor += 1;
                    continue;
                }
            }
            *cursor += 1;

            if self.is_direct_child(row, level.lft) {
                return Some(row);
            }
            trace!(id = row.id, left = row.left, lft = level.lft, "dropping detached row");
        }
        None
    }

    fn is_direct_child(&self, row: &Row, lft: i64) -> bool {
        match self.gap_policy {
            GapPolicy::Drop => row.left == lft.saturating_add(1),
            GapPolicy::Adopt => row.left > lft,
        }
    }

    fn node(&self, row: &Row, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            id: row.id,
            text: self.sanitizer.sanitize(&row.label),
            a_attr: AnchorAttributes::node(row.id),
            children,
            state: NodeState::default(),
        }
    }
}
