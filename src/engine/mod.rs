#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reference algorithms that compute the expected outcome of a task.
//!
//! Every engine mutates the tree it is handed. The `solve_*` helpers clone the
//! caller's tree first, so the pre-operation tree stays available for diffing.

/// AVL insert and delete with rebalancing.
pub mod avl;
/// Plain binary search tree insert and delete.
pub mod bst;
/// Red-black insert, fixup and stepwise repair.
pub mod red_black;
