#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::tree::{Plain, Side, Tree};

/// Which neighbour replaces a deleted node that has two children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// Smallest key of the right subtree (the expected behaviour).
    Successor,
    /// Largest key of the left subtree.
    Predecessor,
}

/// Inserts `value` as a new leaf. Duplicates are routed right.
pub fn insert(tree: &mut Tree<Plain>, value: i64) {
    tree.attach_leaf(value, Plain);
}

/// Deletes the first node holding `value`, replacing a node with two children
/// by its in-order successor. Returns `false` if the value is absent.
pub fn delete(tree: &mut Tree<Plain>, value: i64) -> bool {
    delete_with(tree, value, Replacement::Successor)
}

/// Deletes the first node holding `value`, replacing a node with two children
/// by its in-order predecessor. Returns `false` if the value is absent.
pub fn delete_with_predecessor(tree: &mut Tree<Plain>, value: i64) -> bool {
    delete_with(tree, value, Replacement::Predecessor)
}

/// Shared delete: the located node keeps its identity when it has two
/// children; the replacement node is spliced out instead.
fn delete_with(tree: &mut Tree<Plain>, value: i64, replacement: Replacement) -> bool {
    let Some(target) = tree.find(value) else {
        return false;
    };

    match (tree.left(target), tree.right(target)) {
        (Some(left), Some(right)) => {
            // `toward` is the side the replacement hangs on, `away` the side
            // its only possible child hangs on.
            let (start, toward) = match replacement {
                Replacement::Successor => (right, Side::Left),
                Replacement::Predecessor => (left, Side::Right),
            };
            let mut holder = target;
            let mut extreme = start;
            while let Some(next) = tree.child(extreme, toward) {
                holder = extreme;
                extreme = next;
            }
            tracing::debug!(
                "bst: replacing {value} with {:?} {}",
                replacement,
                tree.value(extreme)
            );
            tree.set_value(target, tree.value(extreme));
            let orphan = tree.child(extreme, toward.opposite());
            let slot = if holder == target { toward.opposite() } else { toward };
            tree.set_child(holder, slot, orphan);
            tree.release(extreme);
        }
        (left, right) => {
            let survivor = left.or(right);
            let parent = tree.parent(target);
            tree.replace_child(parent, target, survivor);
            tree.release(target);
        }
    }
    true
}

/// Inserts every value into a copy of `existing`.
pub fn solve_insert(existing: &Tree<Plain>, values: &[i64]) -> Tree<Plain> {
    let mut tree = existing.clone();
    for &value in values {
        insert(&mut tree, value);
    }
    tree
}

/// Deletes every value from a copy of `existing` using `replacement` for nodes
/// with two children. Values that are absent are skipped.
pub fn solve_delete(
    existing: &Tree<Plain>,
    values: &[i64],
    replacement: Replacement,
) -> Tree<Plain> {
    let mut tree = existing.clone();
    for &value in values {
        if tree.is_empty() {
            break;
        }
        delete_with(&mut tree, value, replacement);
    }
    tree
}
