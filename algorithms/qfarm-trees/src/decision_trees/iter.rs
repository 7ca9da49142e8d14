use std::collections::VecDeque;

use super::TreeNode;
use qfarm::{Float, Label};

/// Breadth-first walk over the nodes of a tree, starting at the root
pub struct NodeIter<'a, F, L> {
    pending: VecDeque<&'a TreeNode<F, L>>,
}

impl<'a, F, L> NodeIter<'a, F, L> {
    pub fn new(root: &'a TreeNode<F, L>) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(root);

        NodeIter { pending }
    }
}

impl<'a, F: Float, L: Label> Iterator for NodeIter<'a, F, L> {
    type Item = &'a TreeNode<F, L>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop_front()?;
        for child in node.children().into_iter().filter_map(|child| child.as_deref()) {
            self.pending.push_back(child);
        }

        Some(node)
    }
}
