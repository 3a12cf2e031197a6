//! Tree model: a canonical flat list plus the arena tree derived from it.

use std::fmt;

use generational_arena::Index;
use tracing::instrument;

use crate::arena::TreeArena;
use crate::element::TreeElement;
use crate::errors::{TreeError, TreeResult};
use crate::structure;

type ChangeListener = Box<dyn FnMut()>;

/// Maintains a parent/child hierarchy over a flat, depth-annotated list.
///
/// The list is the canonical representation: a pre-order sequence whose
/// first element is the root at depth -1. The tree (arena nodes with
/// parent/child links) is derived from it on load and after every mutation,
/// so the two stay synchronized. Structural edits go through the model;
/// registered change listeners fire once per successful mutation.
///
/// The model is single-threaded and synchronous; wrap it in external
/// synchronization or confine it to one owning thread.
pub struct TreeModel<T: TreeElement> {
    /// Canonical flat list, pre-order
    data: Vec<T>,
    /// Derived parent/child links, rebuilt whenever the list changes
    tree: TreeArena,
    /// Highest id ever observed or issued
    max_id: i32,
    /// Fired once after each successful structural mutation
    listeners: Vec<ChangeListener>,
}

impl<T: TreeElement> TreeModel<T> {
    /// Creates a model over `data`. Non-empty data must encode a well-formed
    /// tree (see [`structure::list_to_tree`]); an empty vector yields an
    /// empty model that only accepts [`add_root`](Self::add_root).
    pub fn new(data: Vec<T>) -> TreeResult<Self> {
        let mut model = Self {
            data: Vec::new(),
            tree: TreeArena::new(),
            max_id: 0,
            listeners: Vec::new(),
        };
        model.set_data(data)?;
        Ok(model)
    }

    /// Replaces the backing list wholesale and rebuilds the tree from it.
    /// On failure the previous state is left untouched.
    #[instrument(level = "debug", skip(self, data))]
    pub fn set_data(&mut self, data: Vec<T>) -> TreeResult<()> {
        let tree = if data.is_empty() {
            TreeArena::new()
        } else {
            structure::list_to_tree(&data)?
        };
        self.max_id = data.iter().map(TreeElement::id).max().unwrap_or(0);
        self.data = data;
        self.tree = tree;
        Ok(())
    }

    /// The flat list in current pre-order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the model, handing the flat list back to the caller.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn root(&self) -> Option<&T> {
        let idx = self.tree.root()?;
        let node = self.tree.get_node(idx)?;
        self.data.get(node.slot)
    }

    /// First element in the flat list with the given id.
    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, id: i32) -> Option<&T> {
        self.data.iter().find(|element| element.id() == id)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find_mut(&mut self, id: i32) -> Option<&mut T> {
        self.data.iter_mut().find(|element| element.id() == id)
    }

    /// Issues the next unique id: a pre-increment of the running maximum.
    /// Monotonically increasing, never reused even across removals.
    pub fn generate_unique_id(&mut self) -> i32 {
        self.max_id += 1;
        self.max_id
    }

    /// Registers a listener fired once after each successful structural
    /// mutation.
    pub fn on_changed(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Ancestor ids of the element, nearest first. The root has no parent
    /// and therefore reports no ancestors; descendants include the root's
    /// id as their last entry. Empty for unknown ids.
    #[instrument(level = "debug", skip(self))]
    pub fn get_ancestors(&self, id: i32) -> Vec<i32> {
        let mut ancestors = Vec::new();
        let Some(start) = self.node_of_id(id) else {
            return ancestors;
        };

        let mut current = self.tree.get_node(start).and_then(|node| node.parent);
        while let Some(idx) = current {
            if let Some(element) = self.element_of(idx) {
                ancestors.push(element.id());
            }
            current = self.tree.get_node(idx).and_then(|node| node.parent);
        }
        ancestors
    }

    /// Ids of every node in the element's subtree (the element itself
    /// included) that has at least one child. Stack-based depth-first
    /// traversal, siblings visited left to right. Empty for unknown ids.
    #[instrument(level = "debug", skip(self))]
    pub fn get_descendants_that_have_children(&self, id: i32) -> Vec<i32> {
        let mut parents = Vec::new();
        let Some(start) = self.node_of_id(id) else {
            return parents;
        };

        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if let Some(node) = self.tree.get_node(idx) {
                if node.has_children() {
                    if let Some(element) = self.data.get(node.slot) {
                        parents.push(element.id());
                    }
                    for &child in node.children.iter().rev() {
                        stack.push(child);
                    }
                }
            }
        }
        parents
    }

    /// Removes the elements with the given ids, each with its whole subtree.
    ///
    /// Unknown ids are ignored and duplicates collapse. The target set is
    /// first reduced to its topmost members so a descendant covered by an
    /// ancestor removal is not processed twice. Removing the root is
    /// rejected before any mutation. Notifies once per call.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_elements(&mut self, ids: &[i32]) -> TreeResult<()> {
        let targets: Vec<Index> = self
            .tree
            .iter()
            .filter(|(_, node)| {
                self.data
                    .get(node.slot)
                    .is_some_and(|element| ids.contains(&element.id()))
            })
            .map(|(idx, _)| idx)
            .collect();

        if let Some(root) = self.tree.root() {
            if targets.contains(&root) {
                return Err(TreeError::InvalidOperation(
                    "removing the root element is not allowed".to_string(),
                ));
            }
        }

        for idx in structure::find_common_ancestors(&self.tree, &targets) {
            self.tree.detach(idx)?;
        }

        self.resync()?;
        self.notify_changed();
        Ok(())
    }

    /// Inserts `elements` as a contiguous block of children of the parent,
    /// starting at `insert_position` and preserving their relative order.
    /// Each element's depth becomes parent depth + 1. Notifies once.
    #[instrument(level = "debug", skip(self, elements))]
    pub fn add_elements(
        &mut self,
        elements: Vec<T>,
        parent_id: i32,
        insert_position: usize,
    ) -> TreeResult<()> {
        if elements.is_empty() {
            return Err(TreeError::EmptyInput("elements"));
        }
        let parent_idx = self
            .node_of_id(parent_id)
            .ok_or(TreeError::ElementNotFound(parent_id))?;

        let (parent_depth, child_count) = {
            let node = self
                .tree
                .get_node(parent_idx)
                .ok_or_else(|| TreeError::Internal("parent node vanished".to_string()))?;
            let depth = self
                .data
                .get(node.slot)
                .ok_or_else(|| TreeError::Internal(format!("slot {} out of range", node.slot)))?
                .depth();
            (depth, node.children.len())
        };
        if insert_position > child_count {
            return Err(TreeError::InvalidArgument(format!(
                "insert position {insert_position} exceeds child count {child_count}"
            )));
        }

        let mut inserted = Vec::with_capacity(elements.len());
        for (offset, mut element) in elements.into_iter().enumerate() {
            element.set_depth(parent_depth + 1);
            self.max_id = self.max_id.max(element.id());
            let slot = self.data.len();
            self.data.push(element);
            let idx = self
                .tree
                .insert_child_at(slot, parent_idx, insert_position + offset)?;
            inserted.push(idx);
        }
        // Depths are recomputed per inserted subtree only, not tree-wide
        for idx in inserted {
            structure::update_depth_values(&self.tree, &mut self.data, idx)?;
        }

        self.resync()?;
        self.notify_changed();
        Ok(())
    }

    /// Establishes the root of an empty model. The element receives a
    /// freshly generated id and depth -1. Does not notify.
    #[instrument(level = "debug", skip(self, element))]
    pub fn add_root(&mut self, mut element: T) -> TreeResult<()> {
        if !self.data.is_empty() {
            return Err(TreeError::InvalidOperation(
                "add_root is only allowed on an empty model".to_string(),
            ));
        }

        let id = self.generate_unique_id();
        element.set_id(id);
        element.set_depth(-1);
        self.data.push(element);
        self.tree = TreeArena::new();
        self.tree.insert_node(0, None);
        Ok(())
    }

    /// Single-element form of [`add_elements`](Self::add_elements). Depths
    /// are recomputed starting from the parent, cascading over its whole
    /// subtree. Notifies once.
    #[instrument(level = "debug", skip(self, element))]
    pub fn add_element(&mut self, element: T, parent_id: i32, insert_position: usize) -> TreeResult<()> {
        let parent_idx = self
            .node_of_id(parent_id)
            .ok_or(TreeError::ElementNotFound(parent_id))?;
        let child_count = self
            .tree
            .get_node(parent_idx)
            .map(|node| node.children.len())
            .unwrap_or(0);
        if insert_position > child_count {
            return Err(TreeError::InvalidArgument(format!(
                "insert position {insert_position} exceeds child count {child_count}"
            )));
        }

        self.max_id = self.max_id.max(element.id());
        let slot = self.data.len();
        self.data.push(element);
        self.tree.insert_child_at(slot, parent_idx, insert_position)?;
        structure::update_depth_values(&self.tree, &mut self.data, parent_idx)?;

        self.resync()?;
        self.notify_changed();
        Ok(())
    }

    /// Reparents the elements with the given ids under `new_parent`,
    /// inserted as a block at `insertion_index` in caller order.
    ///
    /// `None` as the drop target is a silent no-op (a normal "invalid drop"
    /// outcome, not a programming error): nothing mutates, nothing fires.
    /// The insertion index is adjusted downward by the number of moved
    /// elements already sitting among the parent's children before it, since
    /// those are removed before reinsertion. Depths are recomputed from the
    /// tree root because moved subtrees may change depth arbitrarily.
    /// Notifies once.
    #[instrument(level = "debug", skip(self))]
    pub fn move_elements(
        &mut self,
        new_parent: Option<i32>,
        insertion_index: usize,
        ids: &[i32],
    ) -> TreeResult<()> {
        let Some(parent_id) = new_parent else {
            return Ok(());
        };
        let parent_idx = self
            .node_of_id(parent_id)
            .ok_or(TreeError::ElementNotFound(parent_id))?;

        // Resolve in caller order; a repeated id moves once
        let mut moved: Vec<Index> = Vec::with_capacity(ids.len());
        for &id in ids {
            let idx = self.node_of_id(id).ok_or(TreeError::ElementNotFound(id))?;
            if !moved.contains(&idx) {
                moved.push(idx);
            }
        }

        let root = self.tree.root();
        for &idx in &moved {
            if Some(idx) == root {
                return Err(TreeError::InvalidOperation(
                    "moving the root element is not allowed".to_string(),
                ));
            }
            if idx == parent_idx || self.tree.is_ancestor(idx, parent_idx) {
                return Err(TreeError::InvalidOperation(
                    "cannot move an element into its own subtree".to_string(),
                ));
            }
        }

        let children = &self
            .tree
            .get_node(parent_idx)
            .ok_or_else(|| TreeError::Internal("parent node vanished".to_string()))?
            .children;
        if insertion_index > children.len() {
            return Err(TreeError::InvalidArgument(format!(
                "insertion index {} exceeds child count {}",
                insertion_index,
                children.len()
            )));
        }
        // Moved items above the insertion point are removed before
        // reinsertion, shift the index to compensate
        let adjusted = insertion_index
            - children[..insertion_index]
                .iter()
                .filter(|child| moved.contains(*child))
                .count();

        for &idx in &moved {
            self.tree.detach(idx)?;
        }
        for (offset, &idx) in moved.iter().enumerate() {
            self.tree.attach_at(idx, parent_idx, adjusted + offset)?;
        }

        if let Some(root) = self.tree.root() {
            structure::update_depth_values(&self.tree, &mut self.data, root)?;
        }
        self.resync()?;
        self.notify_changed();
        Ok(())
    }

    pub(crate) fn tree(&self) -> &TreeArena {
        &self.tree
    }

    fn element_of(&self, idx: Index) -> Option<&T> {
        self.tree
            .get_node(idx)
            .and_then(|node| self.data.get(node.slot))
    }

    /// Arena index of the first element with the given id. After a resync,
    /// node slots line up with list positions in pre-order.
    fn node_of_id(&self, id: i32) -> Option<Index> {
        let slot = self.data.iter().position(|element| element.id() == id)?;
        self.tree
            .iter()
            .find(|(_, node)| node.slot == slot)
            .map(|(idx, _)| idx)
    }

    /// Re-flattens the tree into the list, then rebuilds the tree so node
    /// slots line up with list positions again.
    fn resync(&mut self) -> TreeResult<()> {
        structure::tree_to_list(&self.tree, &mut self.data)?;
        self.tree = if self.data.is_empty() {
            TreeArena::new()
        } else {
            structure::list_to_tree(&self.data)?
        };
        Ok(())
    }

    fn notify_changed(&mut self) {
        for listener in &mut self.listeners {
            listener();
        }
    }
}

impl<T: TreeElement + fmt::Debug> fmt::Debug for TreeModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("data", &self.data)
            .field("tree", &self.tree)
            .field("max_id", &self.max_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
