//! Element capability contract and a minimal ready-made element type.

use std::fmt;

/// Capability contract for elements managed by a tree model.
///
/// An element carries its unique identifier and its depth in the hierarchy
/// (root = -1, children = parent depth + 1). Parent and child links are not
/// part of the element itself; they live in the arena as index handles.
pub trait TreeElement {
    fn id(&self) -> i32;
    fn set_id(&mut self, id: i32);
    fn depth(&self) -> i32;
    fn set_depth(&mut self, depth: i32);
}

/// Minimal element with a display name payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleElement {
    /// Unique identifier within one model
    pub id: i32,
    /// Distance from the root, root itself is -1
    pub depth: i32,
    /// Display name
    pub name: String,
}

impl SimpleElement {
    pub fn new(name: impl Into<String>, depth: i32, id: i32) -> Self {
        Self {
            id,
            depth,
            name: name.into(),
        }
    }
}

impl TreeElement for SimpleElement {
    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }
}

impl fmt::Display for SimpleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
