use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::errors::{TreeError, TreeResult};

/// Tree node in the arena-based hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    /// Position of this node's element in the backing flat list
    pub slot: usize,
    /// Index of the parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in sibling order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Arena-based tree over flat-list slots.
///
/// Uses a generational arena for memory-safe node references and O(1)
/// lookups. Parent and child links are stored as arena indices, giving O(1)
/// navigation both ways without ownership cycles.
#[derive(Debug)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for an empty tree
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Inserts a node as the last child of `parent`, or as the root when
    /// `parent` is None.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, slot: usize, parent: Option<Index>) -> Index {
        let node = TreeNode {
            slot,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    /// Inserts a node under `parent` at `position` within its children.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child_at(
        &mut self,
        slot: usize,
        parent: Index,
        position: usize,
    ) -> TreeResult<Index> {
        let child_count = self
            .arena
            .get(parent)
            .ok_or_else(|| TreeError::Internal(format!("no parent node at {parent:?}")))?
            .children
            .len();
        if position > child_count {
            return Err(TreeError::InvalidArgument(format!(
                "insertion position {position} exceeds child count {child_count}"
            )));
        }

        let node_idx = self.arena.insert(TreeNode {
            slot,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.insert(position, node_idx);
        }
        Ok(node_idx)
    }

    /// Unlinks a node from its parent. The node and its subtree stay in the
    /// arena but are no longer reachable from the root.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) -> TreeResult<()> {
        let parent_idx = self
            .arena
            .get(idx)
            .ok_or_else(|| TreeError::Internal(format!("no node at {idx:?}")))?
            .parent
            .ok_or_else(|| TreeError::InvalidOperation("cannot detach the root".to_string()))?;

        if let Some(parent) = self.arena.get_mut(parent_idx) {
            parent.children.retain(|&child| child != idx);
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
        Ok(())
    }

    /// Links a detached node under `parent` at `position` within its children.
    #[instrument(level = "trace", skip(self))]
    pub fn attach_at(&mut self, idx: Index, parent: Index, position: usize) -> TreeResult<()> {
        let child_count = self
            .arena
            .get(parent)
            .ok_or_else(|| TreeError::Internal(format!("no parent node at {parent:?}")))?
            .children
            .len();
        if position > child_count {
            return Err(TreeError::InvalidArgument(format!(
                "insertion position {position} exceeds child count {child_count}"
            )));
        }

        self.arena
            .get_mut(idx)
            .ok_or_else(|| TreeError::Internal(format!("no node at {idx:?}")))?
            .parent = Some(parent);
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.insert(position, idx);
        }
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// True if `ancestor` lies on the parent chain of `node`.
    #[instrument(level = "trace", skip(self))]
    pub fn is_ancestor(&self, ancestor: Index, node: Index) -> bool {
        let mut current = self.arena.get(node).and_then(|n| n.parent);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    /// Number of levels in the tree, 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, 1));
        }

        while let Some((idx, depth)) = stack.pop() {
            if depth > max_depth {
                max_depth = depth;
            }
            if let Some(node) = self.arena.get(idx) {
                for &child in &node.children {
                    stack.push((child, depth + 1));
                }
            }
        }

        max_depth
    }
}

/// Pre-order iterator over the tree: each node before its subtree, children
/// visited left to right.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
