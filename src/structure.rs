//! Stateless structural algorithms over flat lists and arena trees.
//!
//! The flat list is the canonical representation: a pre-order serialization
//! where each element's depth encodes the hierarchy. These functions convert
//! between the two representations and keep depth values consistent after
//! structural edits.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::instrument;

use crate::arena::TreeArena;
use crate::element::TreeElement;
use crate::errors::{TreeError, TreeResult};

/// Builds the parent/child link structure from a depth-annotated flat list.
///
/// The first element must have depth -1 (it becomes the root) and depths may
/// deepen by at most one level per element. Single left-to-right pass with an
/// explicit ancestor stack, O(n) time and O(depth) auxiliary space. The tree
/// is built into a fresh arena so a mid-pass failure leaves the caller's
/// state untouched.
#[instrument(level = "debug", skip(list))]
pub fn list_to_tree<T: TreeElement>(list: &[T]) -> TreeResult<TreeArena> {
    let first = list.first().ok_or(TreeError::EmptyInput("data list"))?;
    if first.depth() != -1 {
        return Err(TreeError::InvalidStructure {
            index: 0,
            id: first.id(),
            reason: format!("first element must have depth -1, found {}", first.depth()),
        });
    }

    let mut tree = TreeArena::new();
    let root = tree.insert_node(0, None);
    // Ancestors of the element currently being attached, deepest last.
    // The root at depth -1 is never popped.
    let mut path: Vec<(Index, i32)> = vec![(root, -1)];

    for (slot, element) in list.iter().enumerate().skip(1) {
        let depth = element.depth();
        if depth < 0 {
            return Err(TreeError::InvalidStructure {
                index: slot,
                id: element.id(),
                reason: "only the first element may have a negative depth".to_string(),
            });
        }

        while path.last().is_some_and(|&(_, d)| d >= depth) {
            path.pop();
        }
        match path.last() {
            Some(&(parent, parent_depth)) if parent_depth == depth - 1 => {
                let idx = tree.insert_node(slot, Some(parent));
                path.push((idx, depth));
            }
            _ => {
                return Err(TreeError::InvalidStructure {
                    index: slot,
                    id: element.id(),
                    reason: format!(
                        "depth {} skips a level, no ancestor at depth {}",
                        depth,
                        depth - 1
                    ),
                });
            }
        }
    }

    Ok(tree)
}

/// Rebuilds the flat list as the pre-order traversal of the tree.
///
/// Elements whose nodes are no longer reachable from the root (detached
/// subtrees) are dropped. The list is only replaced once the traversal is
/// known to be consistent with it.
#[instrument(level = "debug", skip(tree, data))]
pub fn tree_to_list<T: TreeElement>(tree: &TreeArena, data: &mut Vec<T>) -> TreeResult<()> {
    let order: Vec<usize> = tree.iter().map(|(_, node)| node.slot).collect();
    if let Some(&bad) = order.iter().find(|&&slot| slot >= data.len()) {
        return Err(TreeError::Internal(format!(
            "tree slot {} is out of sync with the data list (len {})",
            bad,
            data.len()
        )));
    }

    let mut taken: Vec<Option<T>> = std::mem::take(data).into_iter().map(Some).collect();
    for slot in order {
        if let Some(element) = taken[slot].take() {
            data.push(element);
        }
    }
    Ok(())
}

/// Recomputes depth values for every descendant of `start`, using the
/// current depth of `start` itself as the base.
///
/// Must be called after reparenting so that depth(child) == depth(parent) + 1
/// holds again. Iterative so deep trees cannot exhaust the call stack.
#[instrument(level = "debug", skip(tree, data))]
pub fn update_depth_values<T: TreeElement>(
    tree: &TreeArena,
    data: &mut [T],
    start: Index,
) -> TreeResult<()> {
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        let node = tree
            .get_node(idx)
            .ok_or_else(|| TreeError::Internal(format!("no node at {idx:?}")))?;
        let base = data
            .get(node.slot)
            .ok_or_else(|| TreeError::Internal(format!("slot {} out of range", node.slot)))?
            .depth();

        for &child_idx in &node.children {
            let child = tree
                .get_node(child_idx)
                .ok_or_else(|| TreeError::Internal(format!("no node at {child_idx:?}")))?;
            data.get_mut(child.slot)
                .ok_or_else(|| TreeError::Internal(format!("slot {} out of range", child.slot)))?
                .set_depth(base + 1);
            stack.push(child_idx);
        }
    }
    Ok(())
}

/// Reduces a node set to its topmost members: a node is dropped when another
/// node of the set lies on its ancestor chain. Removing the survivors covers
/// every dropped node implicitly. Input order is preserved.
#[instrument(level = "debug", skip(tree))]
pub fn find_common_ancestors(tree: &TreeArena, nodes: &[Index]) -> Vec<Index> {
    let set: HashSet<Index> = nodes.iter().copied().collect();
    nodes
        .iter()
        .copied()
        .filter(|&idx| !has_ancestor_in_set(tree, idx, &set))
        .collect()
}

fn has_ancestor_in_set(tree: &TreeArena, idx: Index, set: &HashSet<Index>) -> bool {
    let mut current = tree.get_node(idx).and_then(|node| node.parent);
    while let Some(parent) = current {
        if set.contains(&parent) {
            return true;
        }
        current = tree.get_node(parent).and_then(|node| node.parent);
    }
    false
}

/// Diagnostic check that a flat list encodes a well-formed tree: exactly one
/// root at depth -1 in front, no later element with a negative depth, and no
/// step deepening by more than one level. Reports the offending element
/// instead of repairing.
#[instrument(level = "debug", skip(list))]
pub fn validate_depth_values<T: TreeElement>(list: &[T]) -> TreeResult<()> {
    let first = list.first().ok_or(TreeError::EmptyInput("data list"))?;
    if first.depth() != -1 {
        return Err(TreeError::InvalidStructure {
            index: 0,
            id: first.id(),
            reason: format!("first element must have depth -1, found {}", first.depth()),
        });
    }

    for (index, window) in list.windows(2).enumerate() {
        let (prev, current) = (&window[0], &window[1]);
        if current.depth() < 0 {
            return Err(TreeError::InvalidStructure {
                index: index + 1,
                id: current.id(),
                reason: "only the first element may have a negative depth".to_string(),
            });
        }
        if current.depth() > prev.depth() + 1 {
            return Err(TreeError::InvalidStructure {
                index: index + 1,
                id: current.id(),
                reason: format!(
                    "depth increases from {} to {}, at most one level per element",
                    prev.depth(),
                    current.depth()
                ),
            });
        }
    }
    Ok(())
}
