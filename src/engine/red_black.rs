#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Red-black insert with bottom-up fixup, and the stepwise repair used to
//! grade partially repaired trees.

use crate::{
    error::TreeError,
    tree::{Color, NodeId, Side, Tree},
};

/// A red-black property violation that a single fixup step can address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The root is red.
    RedRoot {
        /// The root.
        node: NodeId,
    },
    /// A red node has a red parent.
    RedRed {
        /// The lower red node.
        node:   NodeId,
        /// Its red parent.
        parent: NodeId,
    },
}

impl Violation {
    /// The node a fixup step starts from.
    pub fn node(&self) -> NodeId {
        match *self {
            Violation::RedRoot { node } | Violation::RedRed { node, .. } => node,
        }
    }
}

/// True if `id` is red.
fn is_red(tree: &Tree<Color>, id: NodeId) -> bool {
    tree.annotation(id).is_red()
}

/// Recolors `id`.
fn paint(tree: &mut Tree<Color>, id: NodeId, color: Color) {
    *tree.annotation_mut(id) = color;
}

/// Inserts `value`: the first node of an empty tree is black, every other new
/// node starts red and is fixed up.
pub fn insert(tree: &mut Tree<Color>, value: i64) {
    if tree.is_empty() {
        tree.attach_leaf(value, Color::Black);
        return;
    }
    let leaf = tree.attach_leaf(value, Color::Red);
    fixup(tree, leaf);
}

/// Repeats [`fixup_step`] until no further step is needed.
pub fn fixup(tree: &mut Tree<Color>, node: NodeId) {
    let mut current = Some(node);
    while let Some(node) = current {
        current = fixup_step(tree, node);
    }
}

/// Applies exactly one fixup case at `node` and returns the node to continue
/// from, if the step may have created a new violation higher up.
///
/// * `node` is the root: it is painted black.
/// * `node` and its parent are red: the parent/grandparent configuration is
///   rotated so that the middle key becomes the local root, which is painted
///   red while its two children are painted black. If the red parent is the
///   root itself it is simply painted black.
/// * otherwise nothing happens.
pub fn fixup_step(tree: &mut Tree<Color>, node: NodeId) -> Option<NodeId> {
    let Some(parent) = tree.parent(node) else {
        paint(tree, node, Color::Black);
        return None;
    };
    if !(is_red(tree, node) && is_red(tree, parent)) {
        return None;
    }
    let Some(grandparent) = tree.parent(parent) else {
        tracing::debug!("red-black: painting red root {} black", tree.value(parent));
        paint(tree, parent, Color::Black);
        return None;
    };

    let parent_side = tree.side_of(parent)?;
    let node_side = tree.side_of(node)?;
    tracing::debug!(
        "red-black: {:?}-{:?} case at {}",
        parent_side,
        node_side,
        tree.value(node)
    );
    let top = match (parent_side, node_side) {
        (Side::Left, Side::Left) => tree.rotate_right(grandparent)?,
        (Side::Left, Side::Right) => {
            tree.rotate_left(parent)?;
            tree.rotate_right(grandparent)?
        }
        (Side::Right, Side::Left) => {
            tree.rotate_right(parent)?;
            tree.rotate_left(grandparent)?
        }
        (Side::Right, Side::Right) => tree.rotate_left(grandparent)?,
    };

    paint(tree, top, Color::Red);
    for child in [tree.left(top), tree.right(top)].into_iter().flatten() {
        paint(tree, child, Color::Black);
    }
    Some(top)
}

/// Locates the violation to fix next: the first red node with a red parent
/// in post-order (the deepest pair), else a red root.
pub fn find_violation(tree: &Tree<Color>) -> Option<Violation> {
    let red_red = tree.postorder().into_iter().find_map(|node| {
        let parent = tree.parent(node)?;
        (is_red(tree, node) && is_red(tree, parent)).then_some(Violation::RedRed { node, parent })
    });
    red_red.or_else(|| {
        let root = tree.root()?;
        is_red(tree, root).then_some(Violation::RedRoot { node: root })
    })
}

/// Repairs a copy of `existing` one fixup step at a time.
///
/// Returns one snapshot per step; the last snapshot is the fully repaired
/// tree. Fails with [`TreeError::NoViolationFound`] if `existing` has neither a
/// red root nor a red-red pair.
pub fn repair(existing: &Tree<Color>) -> Result<Vec<Tree<Color>>, TreeError> {
    let mut tree = existing.clone();
    let mut violation = find_violation(&tree).ok_or(TreeError::NoViolationFound)?;
    let mut checkpoints = Vec::new();
    loop {
        tracing::debug!("red-black repair step {}: {:?}", checkpoints.len() + 1, violation);
        fixup_step(&mut tree, violation.node());
        checkpoints.push(tree.clone());
        match find_violation(&tree) {
            Some(next) => violation = next,
            None => break,
        }
    }
    Ok(checkpoints)
}

/// Inserts every value into a copy of `existing`.
pub fn solve_insert(existing: &Tree<Color>, values: &[i64]) -> Tree<Color> {
    let mut tree = existing.clone();
    for &value in values {
        insert(&mut tree, value);
    }
    tree
}
