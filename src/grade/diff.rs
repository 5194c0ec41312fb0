#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Structural comparison of a submitted tree against the reference.
//!
//! All functions take trees by shared reference and never mutate them.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use super::diagnostics::{BalanceFact, HandledValues, OrderingViolation, ViolationKind};
use crate::{
    engine::avl,
    tree::{Balance, NodeId, Path, Tree},
};

/// The operation a task asked the student to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Insert the requested values.
    Insert,
    /// Delete the requested values.
    Delete,
    /// Repair the tree without adding or removing values.
    Repair,
}

/// Number of occurrences of each key.
pub fn value_counts<A>(tree: &Tree<A>) -> HashMap<i64, usize> {
    tree.values().into_iter().counts()
}

/// Looks up a count, treating absent keys as zero.
fn count_of(counts: &HashMap<i64, usize>, value: i64) -> usize {
    counts.get(&value).copied().unwrap_or(0)
}

/// Splits the distinct requested values by whether the student tree holds the
/// number of copies the operation requires.
///
/// * insert: at least `existing + requested` copies
/// * delete: at most `max(existing - requested, 0)` copies
/// * repair: exactly as many copies as before, for every pre-existing value
pub fn handled_values<A>(
    operation: Operation,
    existing: &Tree<A>,
    student: &Tree<A>,
    values: &[i64],
) -> HandledValues {
    let before = value_counts(existing);
    let after = value_counts(student);
    let requested = values.iter().copied().counts();

    let mut handled = HandledValues::default();
    let mut classify = |value: i64, ok: bool| {
        if ok {
            handled.handled.push(value);
        } else {
            handled.not_handled.push(value);
        }
    };

    match operation {
        Operation::Insert | Operation::Delete => {
            for (&value, &count) in requested.iter().sorted() {
                let existing_count = count_of(&before, value);
                let student_count = count_of(&after, value);
                let ok = if operation == Operation::Insert {
                    student_count >= existing_count + count
                } else {
                    student_count <= existing_count.saturating_sub(count)
                };
                classify(value, ok);
            }
        }
        Operation::Repair => {
            for (&value, &count) in before.iter().sorted() {
                classify(value, count_of(&after, value) == count);
            }
        }
    }
    handled
}

/// Values the student tree holds more often than the solution, mapped to the
/// excess. Values listed in `ignored` are skipped.
pub fn extra_values<A>(
    student: &Tree<A>,
    solution: &Tree<A>,
    ignored: &[i64],
) -> BTreeMap<i64, usize> {
    let expected = value_counts(solution);
    value_counts(student)
        .into_iter()
        .filter(|(value, _)| !ignored.contains(value))
        .filter_map(|(value, count)| {
            let excess = count.checked_sub(count_of(&expected, value))?;
            (excess > 0).then_some((value, excess))
        })
        .collect()
}

/// Pre-existing values that the student tree holds fewer times than the
/// operation justifies, sorted ascending.
///
/// Only a delete may legitimately remove copies, and only as many as were
/// requested.
pub fn missing_values<A>(
    operation: Operation,
    existing: &Tree<A>,
    student: &Tree<A>,
    values: &[i64],
) -> Vec<i64> {
    let after = value_counts(student);
    let requested = values.iter().copied().counts();
    value_counts(existing)
        .into_iter()
        .filter(|&(value, count)| {
            let expected = match operation {
                Operation::Delete => count.saturating_sub(count_of(&requested, value)),
                Operation::Insert | Operation::Repair => count,
            };
            count_of(&after, value) < expected
        })
        .map(|(value, _)| value)
        .sorted()
        .collect()
}

/// Value-count differences between a submission and the solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultisetDelta {
    /// Values present more often than in the solution, with the excess.
    pub extra:   BTreeMap<i64, usize>,
    /// Pre-existing values that disappeared without being requested.
    pub missing: Vec<i64>,
}

impl MultisetDelta {
    /// True if neither extra nor missing values were found.
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }
}

/// Combines [`extra_values`] and [`missing_values`]. For deletes the
/// requested values are not reported as extra.
pub fn multiset_delta<A>(
    operation: Operation,
    existing: &Tree<A>,
    values: &[i64],
    student: &Tree<A>,
    solution: &Tree<A>,
) -> MultisetDelta {
    let ignored: &[i64] = if operation == Operation::Delete { values } else { &[] };
    MultisetDelta {
        extra:   extra_values(student, solution, ignored),
        missing: missing_values(operation, existing, student, values),
    }
}

/// Checks every node against the bounds inherited from its ancestors.
///
/// Left subtrees must be strictly smaller, right subtrees greater or equal.
/// After a violation the broken bound is dropped for the violator's children
/// so one misplaced node does not flag its whole subtree. Reported in
/// pre-order.
pub fn ordering_violations<A>(student: &Tree<A>) -> Vec<OrderingViolation> {
    let mut violations = Vec::new();
    let mut stack: Vec<(NodeId, Option<i64>, Option<i64>)> =
        student.root().into_iter().map(|root| (root, None, None)).collect();

    while let Some((node, min, max)) = stack.pop() {
        let value = student.value(node);
        let (left_bounds, right_bounds) = if max.is_some_and(|max| value >= max) {
            violations.push(
                OrderingViolation::builder()
                    .value(value)
                    .kind(ViolationKind::TooLargeForLeftSubtree)
                    .build(),
            );
            ((None, Some(value)), (Some(value), None))
        } else if min.is_some_and(|min| value < min) {
            violations.push(
                OrderingViolation::builder()
                    .value(value)
                    .kind(ViolationKind::TooSmallForRightSubtree)
                    .build(),
            );
            ((None, max), (Some(value), None))
        } else {
            ((min, Some(value)), (Some(value), max))
        };

        if let Some(right) = student.right(node) {
            stack.push((right, right_bounds.0, right_bounds.1));
        }
        if let Some(left) = student.left(node) {
            stack.push((left, left_bounds.0, left_bounds.1));
        }
    }
    violations
}

/// Counts `(value, path)` entries of `tree`, keeping only values in `wanted`.
fn path_counts<A>(tree: &Tree<A>, wanted: &HashSet<i64>) -> HashMap<(i64, Path), usize> {
    tree.paths()
        .into_iter()
        .filter(|(value, _)| wanted.contains(value))
        .counts()
}

/// Requested values the student inserted, but not where the solution put
/// them. Sorted and de-duplicated.
///
/// A value is only flagged once the student added at least as many copies as
/// the solution expects at the missed position, so a value that was simply
/// never inserted is not reported twice.
pub fn inserted_at_wrong_position<A>(
    solution: &Tree<A>,
    existing: &Tree<A>,
    student: &Tree<A>,
    values: &[i64],
) -> Vec<i64> {
    let wanted: HashSet<i64> = values.iter().copied().collect();
    let solution_paths = path_counts(solution, &wanted);
    let existing_paths = path_counts(existing, &wanted);
    let student_paths = path_counts(student, &wanted);

    let total_for = |counts: &HashMap<(i64, Path), usize>, value: i64| -> i64 {
        counts
            .iter()
            .filter(|((v, _), _)| *v == value)
            .map(|(_, &count)| count as i64)
            .sum()
    };

    solution_paths
        .iter()
        .filter_map(|(key, &count)| {
            let before = existing_paths.get(key).copied().unwrap_or(0);
            let expected = count.checked_sub(before).filter(|&expected| expected > 0)?;
            let placed = student_paths.get(key).copied().unwrap_or(0);
            if placed >= expected {
                return None;
            }
            let inserted = total_for(&student_paths, key.0) - total_for(&existing_paths, key.0);
            (inserted >= expected as i64).then_some(key.0)
        })
        .sorted()
        .dedup()
        .collect()
}

/// Student values that occur at a different set of paths than in the
/// solution, although the student holds at least as many copies. Sorted.
///
/// A value with too few copies is already reported as missing.
pub fn positional_mismatch<A>(solution: &Tree<A>, student: &Tree<A>) -> Vec<i64> {
    let expected = solution.paths().into_iter().into_group_map();
    student
        .paths()
        .into_iter()
        .into_group_map()
        .into_iter()
        .filter(|(value, paths)| {
            expected.get(value).is_some_and(|want| {
                paths.len() >= want.len()
                    && want.iter().collect::<HashSet<_>>() != paths.iter().collect::<HashSet<_>>()
            })
        })
        .map(|(value, _)| value)
        .sorted()
        .collect()
}

/// Share of the positions changed by the operation that the student tree
/// reproduces.
///
/// The changed positions are the symmetric difference of the `(value, path)`
/// sets of `existing` and `solution`. If the operation changed nothing the
/// result is 1.0 for an exact match and 0.0 otherwise.
pub fn adjusted_similarity<A>(solution: &Tree<A>, existing: &Tree<A>, student: &Tree<A>) -> f64 {
    let solution_paths: HashSet<(i64, Path)> = solution.paths().into_iter().collect();
    let existing_paths: HashSet<(i64, Path)> = existing.paths().into_iter().collect();
    let changed: HashSet<&(i64, Path)> =
        solution_paths.symmetric_difference(&existing_paths).collect();

    if changed.is_empty() {
        let student_paths: HashSet<(i64, Path)> = student.paths().into_iter().collect();
        return if student_paths == solution_paths { 1.0 } else { 0.0 };
    }

    let targets: Vec<&(i64, Path)> =
        solution_paths.iter().filter(|entry| changed.contains(entry)).collect();
    if targets.is_empty() {
        return 1.0;
    }
    let correct = targets
        .iter()
        .filter(|(value, path)| {
            student
                .node_at(path)
                .is_some_and(|node| student.value(node) == *value)
        })
        .count();
    correct as f64 / targets.len() as f64
}

/// Number of repair steps the student tree corresponds to: the 1-based index
/// of the last checkpoint exactly equal to `student`, or 0 if none is.
pub fn checkpoint_match<A: PartialEq>(checkpoints: &[Tree<A>], student: &Tree<A>) -> usize {
    checkpoints
        .iter()
        .rposition(|checkpoint| checkpoint.same_as(student))
        .map_or(0, |index| index + 1)
}

/// Nodes whose recorded balance differs from the height-derived balance or
/// whose derived balance leaves {-1, 0, 1}. In pre-order.
pub fn balance_facts(student: &Tree<Balance>) -> Vec<BalanceFact> {
    let derived = avl::derived_balances(student);
    student
        .preorder()
        .into_iter()
        .filter_map(|id| {
            let actual = derived[&id];
            let recorded = i64::from(student.annotation(id).0);
            (recorded != actual || !(-1..=1).contains(&actual)).then_some(BalanceFact {
                value: student.value(id),
                recorded,
                actual,
            })
        })
        .collect()
}
