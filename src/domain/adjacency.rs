//! Adjacency-list grouping into a flat, parent-referencing node list.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::entities::{AdjacencyRow, AnchorAttributes, FlatNode, Identifier, ParentRef};
use crate::domain::sanitize::LabelSanitizer;

/// Insertion-ordered mapping id -> flat node.
///
/// Inserting an id again replaces the earlier node but keeps its position.
/// Serializes as a plain JSON array of nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTree {
    nodes: Vec<FlatNode>,
    index: HashMap<Identifier, usize>,
}

impl FlatTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: FlatNode) {
        match self.index.get(&node.id) {
            Some(&pos) => self.nodes[pos] = node,
            None => {
                self.index.insert(node.id, self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    pub fn get(&self, id: Identifier) -> Option<&FlatNode> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    pub fn get_mut(&mut self, id: Identifier) -> Option<&mut FlatNode> {
        self.index.get(&id).map(|&pos| &mut self.nodes[pos])
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatNode> {
        self.nodes.iter()
    }

    /// Rebuild the hierarchy for terminal display, the way the widget would.
    /// Nodes whose parent is missing are shown at the top level.
    pub fn to_tree_strings(&self) -> Vec<Tree<String>> {
        let mut children: HashMap<Identifier, Vec<&FlatNode>> = HashMap::new();
        let mut tops = Vec::new();
        for node in &self.nodes {
            match node.parent {
                ParentRef::Node(parent) if parent != node.id && self.contains(parent) => {
                    children.entry(parent).or_default().push(node)
                }
                _ => tops.push(node),
            }
        }

        fn convert(
            node: &FlatNode,
            children: &HashMap<Identifier, Vec<&FlatNode>>,
            depth: usize,
            limit: usize,
        ) -> Tree<String> {
            let marker = match node.state {
                Some(s) if s.opened => " *+",
                Some(s) if s.selected => " *",
                _ => "",
            };
            let mut tree = Tree::new(format!("{} [{}]{}", node.text, node.id, marker));
            // Parent cycles never reach the top level; the limit guards the rest.
            if depth < limit {
                for child in children.get(&node.id).into_iter().flatten() {
                    tree.push(convert(child, children, depth + 1, limit));
                }
            }
            tree
        }

        tops.into_iter()
            .map(|node| convert(node, &children, 0, self.nodes.len()))
            .collect()
    }
}

impl Serialize for FlatTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nodes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FlatTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = Vec::<FlatNode>::deserialize(deserializer)?;
        Ok(nodes.into_iter().collect())
    }
}

impl FromIterator<FlatNode> for FlatTree {
    fn from_iter<I: IntoIterator<Item = FlatNode>>(iter: I) -> Self {
        let mut tree = FlatTree::new();
        for node in iter {
            tree.insert(node);
        }
        tree
    }
}

/// Groups adjacency rows by id.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGrouper {
    sanitizer: LabelSanitizer,
}

impl AdjacencyGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
    pub fn group(&self, rows: &[AdjacencyRow]) -> FlatTree {
        let tree: FlatTree = rows.iter().map(|row| self.node(row)).collect();
        debug!(nodes = tree.len(), "grouped adjacency rows");
        tree
    }

    fn node(&self, row: &AdjacencyRow) -> FlatNode {
        FlatNode {
            id: row.id,
            parent: row.parent,
            text: self.sanitizer.sanitize(&row.label),
            a_attr: AnchorAttributes::with_parent(row.id, row.parent.as_id()),
            kind: row.kind.clone(),
            state: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_id_when_grouping_then_later_row_replaces_in_place() {
        let rows = vec![
            AdjacencyRow::new(1, 0, "first"),
            AdjacencyRow::new(2, 1, "child"),
            AdjacencyRow::new(1, 0, "again"),
        ];

        let tree = AdjacencyGrouper::new().group(&rows);

        let texts: Vec<_> = tree.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["again", "child"]);
    }

    #[test]
    fn given_parent_cycle_when_rendering_then_terminates() {
        let rows = vec![
            AdjacencyRow::new(1, 0, "root"),
            AdjacencyRow::new(2, 3, "a"),
            AdjacencyRow::new(3, 2, "b"),
        ];

        let rendered = AdjacencyGrouper::new().group(&rows).to_tree_strings();

        assert_eq!(rendered.len(), 1);
    }

    #[test]
    fn given_flat_tree_when_round_tripping_json_then_rebuilds_index() {
        let tree = AdjacencyGrouper::new().group(&[
            AdjacencyRow::new(1, 0, "A"),
            AdjacencyRow::new(2, 1, "B"),
        ]);

        let json = serde_json::to_string(&tree).unwrap();
        let back: FlatTree = serde_json::from_str(&json).unwrap();

        assert_eq!(back, tree);
        assert!(back.get(2).is_some());
    }
}
