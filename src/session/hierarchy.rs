//! Ordered tree of groups and brushes. Sibling order is evaluation order.

use crate::brush::BrushOrder;
use crate::errors::CsgError;

/// Handle to a node of a [`Hierarchy`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed tree with an implicit root whose children are `roots`.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    fn node(&self, id: NodeId) -> Result<&Node, CsgError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(CsgError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, CsgError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(CsgError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, CsgError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: Option<NodeId>) -> Result<&[NodeId], CsgError> {
        match id {
            Some(id) => Ok(&self.node(id)?.children),
            None => Ok(&self.roots),
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> Result<&mut Vec<NodeId>, CsgError> {
        match parent {
            Some(id) => Ok(&mut self.node_mut(id)?.children),
            None => Ok(&mut self.roots),
        }
    }

    /// Append a new node as the last child of `parent` (or of the root).
    pub fn insert(&mut self, parent: Option<NodeId>) -> Result<NodeId, CsgError> {
        let id = NodeId(self.nodes.len());
        self.siblings_mut(parent)?.push(id);
        self.nodes.push(Some(Node {
            parent,
            children: Vec::new(),
        }));
        Ok(id)
    }

    /// `id` and all of its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>, CsgError> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = self.node(next)?;
            out.push(next);
            stack.extend(node.children.iter().rev());
        }
        Ok(out)
    }

    /// Detach and drop `id` with its subtree. Returns the removed ids.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, CsgError> {
        let removed = self.subtree(id)?;
        let parent = self.node(id)?.parent;
        self.siblings_mut(parent)?.retain(|&c| c != id);
        for node in &removed {
            self.nodes[node.0] = None;
        }
        Ok(removed)
    }

    /// Re-parent `id` under `new_parent` at `index` (clamped to the end).
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: usize,
    ) -> Result<(), CsgError> {
        let old_parent = self.node(id)?.parent;
        if let Some(target) = new_parent {
            self.node(target)?;
            let mut cursor = Some(target);
            while let Some(ancestor) = cursor {
                if ancestor == id {
                    return Err(CsgError::HierarchyCycle(id));
                }
                cursor = self.node(ancestor)?.parent;
            }
        }

        self.siblings_mut(old_parent)?.retain(|&c| c != id);
        let siblings = self.siblings_mut(new_parent)?;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        self.node_mut(id)?.parent = new_parent;
        Ok(())
    }

    /// Sibling-index path from the root to `id`.
    pub fn order_of(&self, id: NodeId) -> Result<BrushOrder, CsgError> {
        let mut path = Vec::new();
        let mut cursor = id;
        loop {
            let parent = self.node(cursor)?.parent;
            let siblings = self.children(parent)?;
            let index = siblings
                .iter()
                .position(|&c| c == cursor)
                .ok_or(CsgError::UnknownNode(cursor))?;
            path.push(index);
            match parent {
                Some(p) => cursor = p,
                None => break,
            }
        }
        path.reverse();
        Ok(BrushOrder::new(path))
    }
}
