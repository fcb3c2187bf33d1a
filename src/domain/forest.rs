use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{Identifier, TreeNode};

/// Ordered root-level nodes of one or more independent trees.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<TreeNode>,
}

impl Forest {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<TreeNode> {
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes across all nesting levels.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Pre-order traversal, roots left to right.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    pub fn find(&self, id: Identifier) -> Option<&TreeNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Apply `f` to every node, parents before children.
    pub fn visit_mut<F: FnMut(&mut TreeNode)>(&mut self, mut f: F) {
        let mut stack: Vec<&mut TreeNode> = self.roots.iter_mut().rev().collect();
        while let Some(node) = stack.pop() {
            f(&mut *node);
            stack.extend(node.children.iter_mut().rev());
        }
    }

    /// Render for terminal display.
    pub fn to_tree_strings(&self) -> Vec<Tree<String>> {
        fn convert(node: &TreeNode) -> Tree<String> {
            let marker = if node.state.selected { " *" } else { "" };
            let leaves: Vec<_> = node.children.iter().map(convert).collect();
            Tree::new(format!("{} [{}]{}", node.text, node.id, marker)).with_leaves(leaves)
        }
        self.roots.iter().map(convert).collect()
    }
}

pub struct ForestIterator<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        // Push in reverse for left-to-right traversal
        Self {
            stack: forest.roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
