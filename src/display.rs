//! Diagnostic rendering of a model as a textual tree.

use std::fmt;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::element::TreeElement;
use crate::model::TreeModel;

impl<T: TreeElement + fmt::Display> TreeModel<T> {
    /// Renders the current hierarchy as a [`termtree::Tree`] for logs and
    /// diagnostics. Each element is labeled with its `Display` output.
    #[instrument(level = "debug", skip(self))]
    pub fn to_tree_string(&self) -> Tree<String> {
        if let Some(root_idx) = self.tree().root() {
            let mut rendered = Tree::new(self.label(root_idx));
            self.push_children(root_idx, &mut rendered);
            rendered
        } else {
            Tree::new("Empty tree".to_string())
        }
    }

    fn label(&self, idx: Index) -> String {
        self.tree()
            .get_node(idx)
            .and_then(|node| self.data().get(node.slot))
            .map(|element| element.to_string())
            .unwrap_or_default()
    }

    fn push_children(&self, idx: Index, parent_tree: &mut Tree<String>) {
        if let Some(node) = self.tree().get_node(idx) {
            for &child_idx in &node.children {
                let mut child_tree = Tree::new(self.label(child_idx));
                self.push_children(child_idx, &mut child_tree);
                parent_tree.push(child_tree);
            }
        }
    }
}
