#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use super::diagnostics::{BlackHeightGroup, ColorViolations};
use crate::tree::{Color, NodeId, Tree};

/// The root's value if the root is red.
pub fn red_root(student: &Tree<Color>) -> Option<i64> {
    let root = student.root()?;
    student.annotation(root).is_red().then(|| student.value(root))
}

/// `(parent, child)` value pairs where both nodes are red, in pre-order.
pub fn red_red_pairs(student: &Tree<Color>) -> Vec<(i64, i64)> {
    let red = |id: NodeId| student.annotation(id).is_red();
    student
        .preorder()
        .into_iter()
        .filter(|&node| red(node))
        .flat_map(|node| {
            [student.left(node), student.right(node)]
                .into_iter()
                .flatten()
                .filter(|&child| red(child))
                .map(move |child| (student.value(node), student.value(child)))
        })
        .collect()
}

/// Black heights of all null-leaf positions, grouped by height.
///
/// Every missing child contributes its owner's value to the group of the
/// black height reached at that owner (root and owner included). Groups are
/// ascending by height; a valid tree has exactly one.
pub fn black_heights(student: &Tree<Color>) -> Vec<BlackHeightGroup> {
    /// Pending work on the explicit stack.
    enum Step {
        /// Visit a node with the black count of its ancestors.
        Enter(NodeId, usize),
        /// Continue with the right side of an already visited node.
        Right(NodeId, usize),
    }

    let mut groups: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
    let mut stack: Vec<Step> = student
        .root()
        .into_iter()
        .map(|root| Step::Enter(root, 0))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node, above) => {
                let height = above + usize::from(student.annotation(node).is_black());
                stack.push(Step::Right(node, height));
                match student.left(node) {
                    Some(left) => stack.push(Step::Enter(left, height)),
                    None => groups.entry(height).or_default().push(student.value(node)),
                }
            }
            Step::Right(node, height) => match student.right(node) {
                Some(right) => stack.push(Step::Enter(right, height)),
                None => groups.entry(height).or_default().push(student.value(node)),
            },
        }
    }

    groups
        .into_iter()
        .map(|(black_height, leaves)| BlackHeightGroup {
            black_height,
            leaves,
        })
        .collect()
}

/// Non-root student values that occur in the solution with another color.
/// Sorted and de-duplicated; empty if the solution is empty.
pub fn miscolored(solution: &Tree<Color>, student: &Tree<Color>) -> Vec<i64> {
    let mut expected: HashMap<i64, HashSet<Color>> = HashMap::new();
    for id in solution.preorder() {
        expected
            .entry(solution.value(id))
            .or_default()
            .insert(*solution.annotation(id));
    }

    student
        .preorder()
        .into_iter()
        .skip(1)
        .filter(|&id| {
            let color = *student.annotation(id);
            expected
                .get(&student.value(id))
                .is_some_and(|colors| colors.iter().any(|&other| other != color))
        })
        .map(|id| student.value(id))
        .sorted()
        .dedup()
        .collect()
}

/// All red-black facts about `student`, with colors compared to `solution`.
pub fn color_violations(solution: &Tree<Color>, student: &Tree<Color>) -> ColorViolations {
    ColorViolations {
        red_root:      red_root(student),
        red_red_pairs: red_red_pairs(student),
        black_heights: black_heights(student),
        miscolored:    miscolored(solution, student),
    }
}
