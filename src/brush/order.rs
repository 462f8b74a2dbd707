//! Hierarchy-derived sort key establishing the CSG evaluation sequence.

use std::fmt;

/// Sibling indices from the CSG root down to a brush.
///
/// Ordering is lexicographic over the path, where a missing trailing component
/// sorts before any value: `[1] < [1, 0] < [1, 3] < [2]`. A group therefore
/// sorts before everything in its subtree, and the subtree of an earlier
/// sibling sorts entirely before a later sibling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BrushOrder(Vec<usize>);

impl BrushOrder {
    pub const fn new(path: Vec<usize>) -> Self {
        BrushOrder(path)
    }

    /// Key of the `index`-th child of the node with this key.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        BrushOrder(path)
    }

    pub fn path(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Strict prefix test.
    pub fn is_ancestor_of(&self, other: &BrushOrder) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for BrushOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "[{}]", parts.join("."))
    }
}

impl From<Vec<usize>> for BrushOrder {
    fn from(path: Vec<usize>) -> Self {
        BrushOrder(path)
    }
}
