//! Selection marking for both output forms.

use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::domain::adjacency::FlatTree;
use crate::domain::entities::{Identifier, NodeState};
use crate::domain::forest::Forest;

/// Currently selected nodes of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Node to select and open (flat form only)
    pub primary: Option<Identifier>,
    /// Nodes to mark selected
    pub selected: BTreeSet<Identifier>,
}

impl Selection {
    pub fn new(primary: Option<Identifier>, selected: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            primary,
            selected: selected.into_iter().collect(),
        }
    }

    /// Build from raw parameter values: a single primary id and a
    /// comma-separated list. Empty and non-numeric entries are ignored.
    pub fn parse(primary: Option<&str>, selected: Option<&str>) -> Self {
        Self {
            primary: primary.and_then(parse_id),
            selected: selected.map(parse_id_list).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.selected.is_empty()
    }
}

fn parse_id(raw: &str) -> Option<Identifier> {
    raw.trim().parse().ok()
}

/// Parse `"3,7,,x"` into `{3, 7}`.
pub fn parse_id_list(raw: &str) -> BTreeSet<Identifier> {
    raw.split(',').filter_map(parse_id).collect()
}

/// Mark nested nodes whose id is selected. The primary id is not used here.
pub fn annotate_forest(forest: &mut Forest, selection: &Selection) {
    let mut marked = 0usize;
    forest.visit_mut(|node| {
        node.state.selected = selection.selected.contains(&node.id);
        if node.state.selected {
            marked += 1;
        }
    });
    debug!(marked, "annotated forest selection");
}

/// Mark flat nodes: the primary id is opened and selected, listed ids are
/// selected. Unknown ids are ignored.
pub fn annotate_flat(tree: &mut FlatTree, selection: &Selection) {
    if let Some(node) = selection.primary.and_then(|id| tree.get_mut(id)) {
        node.state = Some(NodeState::opened_and_selected());
    }
    for id in &selection.selected {
        match tree.get_mut(*id) {
            Some(node) => {
                let state = node.state.get_or_insert_with(NodeState::default);
                state.selected = true;
            }
            None => trace!(id, "ignoring unknown selected id"),
        }
    }
    debug!(
        primary = ?selection.primary,
        selected = %selection.selected.iter().join(","),
        "annotated flat selection"
    );
}
