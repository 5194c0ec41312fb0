#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Arena-backed binary trees shared by every engine.
//!
//! Children are owning links (`left`/`right`), the parent link is a plain
//! back-index used only to walk upward while rebalancing. Every mutation that
//! relinks a child goes through [`Tree::set_child`] so the back-index can never
//! drift from the actual structure.

/// Per-node annotations (plain, balance, color).
pub mod annotation;
/// Node storage.
pub(crate) mod arena;
/// JSON wire representation.
pub mod wire;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use annotation::{Annotation, Balance, Color, Plain};
pub use arena::NodeId;
use arena::Arena;

/// Direction taken from a node to one of its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The left child.
    Left,
    /// The right child.
    Right,
}

impl Side {
    /// The other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Sequence of left/right steps from the root to a node. The root has the
/// empty path.
pub type Path = Vec<Side>;

/// A single tree node.
#[derive(Clone, Debug)]
pub struct Node<A> {
    /// Key stored in the node.
    value:      i64,
    /// Kind-specific payload.
    annotation: A,
    /// Owning link to the left child.
    left:       Option<NodeId>,
    /// Owning link to the right child.
    right:      Option<NodeId>,
    /// Non-owning back-link to the parent.
    parent:     Option<NodeId>,
}

impl<A> Node<A> {
    /// The node's key.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The node's annotation.
    pub fn annotation(&self) -> &A {
        &self.annotation
    }

    /// Left child id.
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child id.
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Parent id.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A binary search tree whose nodes carry an annotation `A`.
///
/// `Clone` produces an independent deep copy, used for solution snapshots.
#[derive(Clone, Debug)]
pub struct Tree<A> {
    /// Node storage.
    nodes: Arena<Node<A>>,
    /// Root node, absent for the empty tree.
    root:  Option<NodeId>,
}

impl<A> Default for Tree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Tree<A> {
    /// Creates an empty tree.
    pub const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root:  None,
        }
    }

    /// Root node id.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.preorder().len()
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &Node<A> {
        self.nodes.get(id)
    }

    /// Key of `id`.
    pub fn value(&self, id: NodeId) -> i64 {
        self.node(id).value
    }

    /// Annotation of `id`.
    pub fn annotation(&self, id: NodeId) -> &A {
        &self.node(id).annotation
    }

    /// Left child of `id`.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    /// Right child of `id`.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    /// Child of `id` on `side`.
    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left(id),
            Side::Right => self.right(id),
        }
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Which side of its parent `id` hangs on; `None` for the root.
    pub fn side_of(&self, id: NodeId) -> Option<Side> {
        let parent = self.parent(id)?;
        if self.left(parent) == Some(id) {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }

    /// Allocates a detached node.
    pub(crate) fn alloc(&mut self, value: i64, annotation: A) -> NodeId {
        self.nodes.alloc(Node {
            value,
            annotation,
            left: None,
            right: None,
            parent: None,
        })
    }

    /// Overwrites the key of `id`.
    pub(crate) fn set_value(&mut self, id: NodeId, value: i64) {
        self.nodes.get_mut(id).value = value;
    }

    /// Mutably borrows the annotation of `id`.
    pub(crate) fn annotation_mut(&mut self, id: NodeId) -> &mut A {
        &mut self.nodes.get_mut(id).annotation
    }

    /// Links `child` below `parent` on `side` and points the child back at its
    /// new parent.
    pub(crate) fn set_child(&mut self, parent: NodeId, side: Side, child: Option<NodeId>) {
        let node = self.nodes.get_mut(parent);
        match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
        if let Some(child) = child {
            self.nodes.get_mut(child).parent = Some(parent);
        }
    }

    /// Shorthand for [`Tree::set_child`] on the left.
    pub(crate) fn set_left(&mut self, parent: NodeId, child: Option<NodeId>) {
        self.set_child(parent, Side::Left, child);
    }

    /// Shorthand for [`Tree::set_child`] on the right.
    pub(crate) fn set_right(&mut self, parent: NodeId, child: Option<NodeId>) {
        self.set_child(parent, Side::Right, child);
    }

    /// Makes `root` the root of the tree and clears its parent link.
    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
        if let Some(root) = root {
            self.nodes.get_mut(root).parent = None;
        }
    }

    /// Puts `new` into the slot `old` occupies below `parent`, or at the root
    /// when `parent` is `None`.
    pub(crate) fn replace_child(
        &mut self,
        parent: Option<NodeId>,
        old: NodeId,
        new: Option<NodeId>,
    ) {
        match parent {
            Some(parent) if self.left(parent) == Some(old) => self.set_left(parent, new),
            Some(parent) if self.right(parent) == Some(old) => self.set_right(parent, new),
            Some(_) => {}
            None => self.set_root(new),
        }
    }

    /// Frees a node that has already been unlinked.
    pub(crate) fn release(&mut self, id: NodeId) {
        self.nodes.take(id);
    }

    /// Rotates the subtree at `node` to the left and returns the new subtree
    /// root. Does nothing if `node` has no right child.
    pub(crate) fn rotate_left(&mut self, node: NodeId) -> Option<NodeId> {
        let pivot = self.right(node)?;
        let parent = self.parent(node);
        let inner = self.left(pivot);
        self.set_right(node, inner);
        self.set_left(pivot, Some(node));
        self.replace_child(parent, node, Some(pivot));
        Some(pivot)
    }

    /// Rotates the subtree at `node` to the right and returns the new subtree
    /// root. Does nothing if `node` has no left child.
    pub(crate) fn rotate_right(&mut self, node: NodeId) -> Option<NodeId> {
        let pivot = self.left(node)?;
        let parent = self.parent(node);
        let inner = self.right(pivot);
        self.set_left(node, inner);
        self.set_right(pivot, Some(node));
        self.replace_child(parent, node, Some(pivot));
        Some(pivot)
    }

    /// Finds the first node holding `value` on the search path (strictly less
    /// goes left, everything else right).
    pub fn find(&self, value: i64) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(node) = current {
            let here = self.value(node);
            if value == here {
                return Some(node);
            }
            current = if value < here { self.left(node) } else { self.right(node) };
        }
        None
    }

    /// Inserts `value` as a new leaf at its search position (duplicates go
    /// right) and returns its id. Becomes the root of an empty tree.
    pub(crate) fn attach_leaf(&mut self, value: i64, annotation: A) -> NodeId {
        let leaf = self.alloc(value, annotation);
        let mut current = self.root;
        let mut slot = None;
        while let Some(node) = current {
            let side = if value < self.value(node) { Side::Left } else { Side::Right };
            slot = Some((node, side));
            current = self.child(node, side);
        }
        match slot {
            Some((parent, side)) => self.set_child(parent, side, Some(leaf)),
            None => self.set_root(Some(leaf)),
        }
        leaf
    }

    /// Node ids in left-node-right order.
    pub fn inorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = Vec::new();
        let mut current = self.root;
        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = self.left(node);
            }
            if let Some(node) = stack.pop() {
                order.push(node);
                current = self.right(node);
            }
        }
        order
    }

    /// Node ids in node-left-right order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.right(node));
            stack.extend(self.left(node));
        }
        order
    }

    /// Node ids in left-right-node order.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.left(node));
            stack.extend(self.right(node));
        }
        order.reverse();
        order
    }

    /// Keys in in-order sequence.
    pub fn values(&self) -> Vec<i64> {
        self.inorder().into_iter().map(|id| self.value(id)).collect()
    }

    /// Every node as `(value, path from the root)`, in pre-order.
    pub fn paths(&self) -> Vec<(i64, Path)> {
        let mut paths = Vec::new();
        let mut stack: Vec<(NodeId, Path)> =
            self.root.into_iter().map(|root| (root, Vec::new())).collect();
        while let Some((node, path)) = stack.pop() {
            paths.push((self.value(node), path.clone()));
            if let Some(right) = self.right(node) {
                let mut next = path.clone();
                next.push(Side::Right);
                stack.push((right, next));
            }
            if let Some(left) = self.left(node) {
                let mut next = path;
                next.push(Side::Left);
                stack.push((left, next));
            }
        }
        paths
    }

    /// Follows `path` from the root.
    pub fn node_at(&self, path: &[Side]) -> Option<NodeId> {
        let mut current = self.root?;
        for &side in path {
            current = self.child(current, side)?;
        }
        Some(current)
    }

    /// Height of every node, counting a leaf as 1.
    pub fn heights(&self) -> HashMap<NodeId, usize> {
        let mut heights = HashMap::new();
        for node in self.postorder() {
            let left = self.left(node).map_or(0, |id| heights[&id]);
            let right = self.right(node).map_or(0, |id| heights[&id]);
            heights.insert(node, 1 + left.max(right));
        }
        heights
    }

    /// Height of the whole tree; 0 when empty.
    pub fn height(&self) -> usize {
        self.root.map_or(0, |root| self.heights()[&root])
    }

    /// True if every child's parent link names the node that owns it and the
    /// root has no parent.
    pub fn links_consistent(&self) -> bool {
        if let Some(root) = self.root
            && self.parent(root).is_some()
        {
            return false;
        }
        self.preorder().into_iter().all(|node| {
            [self.left(node), self.right(node)]
                .into_iter()
                .flatten()
                .all(|child| self.parent(child) == Some(node))
        })
    }
}

impl<A: PartialEq> Tree<A> {
    /// Exact recursive equality of shape, keys and annotations.
    pub fn same_as(&self, other: &Tree<A>) -> bool {
        let mut stack = vec![(self.root, other.root)];
        while let Some(pair) = stack.pop() {
            match pair {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    let (x, y) = (self.node(a), other.node(b));
                    if x.value != y.value || x.annotation != y.annotation {
                        return false;
                    }
                    stack.push((x.left, y.left));
                    stack.push((x.right, y.right));
                }
                _ => return false,
            }
        }
        true
    }
}

impl<A: PartialEq> PartialEq for Tree<A> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}
