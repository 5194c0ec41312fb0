#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! AVL insert and delete.
//!
//! Balance factors are `height(left) - height(right)` and are maintained
//! incrementally: insert walks back up the search path, delete walks up the
//! parent links from the node whose subtree shrank.

use std::collections::HashMap;

use crate::tree::{Balance, NodeId, Side, Tree};

/// Balance of `id` as a plain integer.
fn balance(tree: &Tree<Balance>, id: NodeId) -> i8 {
    tree.annotation(id).0
}

/// Overwrites the balance of `id`.
fn set_balance(tree: &mut Tree<Balance>, id: NodeId, value: i8) {
    *tree.annotation_mut(id) = Balance(value);
}

/// Adds `delta` to the balance of `id`.
fn shift_balance(tree: &mut Tree<Balance>, id: NodeId, delta: i8) {
    let current = balance(tree, id);
    set_balance(tree, id, current.saturating_add(delta));
}

/// Balance change of a parent whose `side` subtree grew by one level.
fn lean(side: Side) -> i8 {
    match side {
        Side::Left => 1,
        Side::Right => -1,
    }
}

/// Rotates the subtree at `node` so that its child on `side` becomes the new
/// subtree root. Returns the new root, or `None` if that child is missing.
fn rotate_up(tree: &mut Tree<Balance>, node: NodeId, side: Side) -> Option<NodeId> {
    match side {
        Side::Left => tree.rotate_right(node),
        Side::Right => tree.rotate_left(node),
    }
}

/// Double rotation lifting the grandchild `node -> side -> opposite` to the
/// top, then fixing balances from the grandchild's old balance. Returns the
/// new subtree root.
fn double_rotate(tree: &mut Tree<Balance>, node: NodeId, side: Side) -> Option<NodeId> {
    let child = tree.child(node, side)?;
    let grandchild = tree.child(child, side.opposite())?;
    let old = balance(tree, grandchild);
    rotate_up(tree, child, side.opposite())?;
    let top = rotate_up(tree, node, side)?;

    if let Some(left) = tree.left(top) {
        set_balance(tree, left, if old == -1 { 1 } else { 0 });
    }
    if let Some(right) = tree.right(top) {
        set_balance(tree, right, if old == 1 { -1 } else { 0 });
    }
    set_balance(tree, top, 0);
    Some(top)
}

/// Inserts `value` and restores the balance invariant along the search path.
pub fn insert(tree: &mut Tree<Balance>, value: i64) -> NodeId {
    let mut path = Vec::new();
    let mut current = tree.root();
    while let Some(node) = current {
        let side = if value < tree.value(node) { Side::Left } else { Side::Right };
        path.push((node, side));
        current = tree.child(node, side);
    }
    let leaf = tree.attach_leaf(value, Balance::LEVEL);

    // The new leaf always raises the height of its own slot.
    while let Some((node, side)) = path.pop() {
        let toward = lean(side);
        if balance(tree, node) != toward {
            shift_balance(tree, node, toward);
            if balance(tree, node) != toward {
                // 1 -> 0 or -1 -> 0: the growth is absorbed here.
                break;
            }
            continue;
        }

        // `node` already leaned toward the grown side.
        let Some(child) = tree.child(node, side) else {
            break;
        };
        let single = balance(tree, child) == toward || tree.child(child, side.opposite()).is_none();
        if single {
            tracing::debug!("avl insert: single rotation at {}", tree.value(node));
            if let Some(top) = rotate_up(tree, node, side) {
                set_balance(tree, top, 0);
                set_balance(tree, node, 0);
            }
        } else {
            tracing::debug!("avl insert: double rotation at {}", tree.value(node));
            double_rotate(tree, node, side);
        }
        break;
    }
    leaf
}

/// Deletes the first node holding `value` and rebalances.
///
/// A node with two children keeps its identity and takes over the key of its
/// in-order successor, which is spliced out instead. Returns `false` (leaving
/// the tree untouched) if the value is absent.
pub fn delete(tree: &mut Tree<Balance>, value: i64) -> bool {
    let Some(target) = tree.find(value) else {
        return false;
    };

    let impacted = match (tree.left(target), tree.right(target)) {
        (Some(_), Some(right)) => {
            let mut holder = target;
            let mut successor = right;
            while let Some(next) = tree.left(successor) {
                holder = successor;
                successor = next;
            }
            // Keyed on values: a successor equal to its holder counts as the right side.
            let delta = if tree.value(successor) < tree.value(holder) { -1 } else { 1 };
            let slot = if holder == target { Side::Right } else { Side::Left };
            tree.set_value(target, tree.value(successor));
            let orphan = tree.right(successor);
            tree.set_child(holder, slot, orphan);
            tree.release(successor);
            Some((holder, delta))
        }
        (left, right) => {
            let survivor = left.or(right);
            let parent = tree.parent(target);
            let side = tree.side_of(target);
            tree.replace_child(parent, target, survivor);
            tree.release(target);
            parent.zip(side).map(|(parent, side)| (parent, -lean(side)))
        }
    };

    if let Some((node, delta)) = impacted {
        shift_balance(tree, node, delta);
        rebalance_after_delete(tree, node);
    }
    true
}

/// Walks upward from `start`, whose balance already reflects a one-level
/// shrink of one of its subtrees, rotating where needed.
pub fn rebalance_after_delete(tree: &mut Tree<Balance>, start: NodeId) {
    let mut current = Some(start);
    while let Some(node) = current {
        match balance(tree, node) {
            1 | -1 => break,
            0 => {
                let (Some(parent), Some(side)) = (tree.parent(node), tree.side_of(node)) else {
                    break;
                };
                shift_balance(tree, parent, -lean(side));
                current = Some(parent);
            }
            imbalance => {
                let heavy_side = if imbalance > 0 { Side::Left } else { Side::Right };
                current = rotate_after_delete(tree, node, heavy_side);
            }
        }
    }
}

/// Rotation step for a node that is two levels heavier on `heavy_side`.
/// Returns the new subtree root, or `None` when the shape cannot be rotated.
fn rotate_after_delete(tree: &mut Tree<Balance>, node: NodeId, heavy_side: Side) -> Option<NodeId> {
    let heavy = tree.child(node, heavy_side)?;
    let toward = lean(heavy_side);
    let heavy_balance = balance(tree, heavy);

    let single = heavy_balance == 0
        || heavy_balance.signum() == toward.signum()
        || tree.child(heavy, heavy_side.opposite()).is_none();
    if !single {
        tracing::debug!("avl delete: double rotation at {}", tree.value(node));
        return double_rotate(tree, node, heavy_side);
    }

    tracing::debug!("avl delete: single rotation at {}", tree.value(node));
    let top = rotate_up(tree, node, heavy_side)?;
    if heavy_balance == 0 {
        // Height below is unchanged, so the walk stops at `top`.
        set_balance(tree, top, -toward);
        set_balance(tree, node, toward);
    } else {
        set_balance(tree, top, 0);
        set_balance(tree, node, 0);
    }
    Some(top)
}

/// Height-derived balance of every node, unclamped.
pub fn derived_balances<A>(tree: &Tree<A>) -> HashMap<NodeId, i64> {
    let heights = tree.heights();
    let height = |id: Option<NodeId>| id.map_or(0, |id| heights[&id] as i64);
    tree.preorder()
        .into_iter()
        .map(|id| (id, height(tree.left(id)) - height(tree.right(id))))
        .collect()
}

/// Replaces every stored balance with the one derived from subtree heights,
/// clamped to the representable range.
pub fn recompute_balances(tree: &mut Tree<Balance>) {
    for (id, derived) in derived_balances(tree) {
        set_balance(tree, id, derived.clamp(-2, 2) as i8);
    }
}

/// True if every node's stored balance matches its subtree heights and lies
/// in {-1, 0, 1}.
pub fn is_balanced(tree: &Tree<Balance>) -> bool {
    derived_balances(tree)
        .into_iter()
        .all(|(id, derived)| (-1..=1).contains(&derived) && derived == i64::from(balance(tree, id)))
}

/// Inserts every value into a copy of `existing` whose balances have been
/// recomputed from heights.
pub fn solve_insert(existing: &Tree<Balance>, values: &[i64]) -> Tree<Balance> {
    let mut tree = existing.clone();
    recompute_balances(&mut tree);
    for &value in values {
        insert(&mut tree, value);
    }
    tree
}

/// Deletes every value from a copy of `existing` whose balances have been
/// recomputed from heights.
pub fn solve_delete(existing: &Tree<Balance>, values: &[i64]) -> Tree<Balance> {
    let mut tree = existing.clone();
    recompute_balances(&mut tree);
    for &value in values {
        if tree.is_empty() {
            break;
        }
        delete(&mut tree, value);
    }
    tree
}
