use std::collections::{BTreeMap, BTreeSet};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};
use treegrade::{
    Color, Plain, Tree,
    engine::{avl, bst},
    grade::{
        color,
        diagnostics::{OrderingViolation, ViolationKind},
        diff::{self, Operation},
    },
};

fn plain(wire: Value) -> Tree<Plain> {
    Tree::from_json(&wire).expect("valid tree")
}

fn colored(wire: Value) -> Tree<Color> {
    Tree::from_json(&wire).expect("valid red-black tree")
}

fn build(values: &[i64]) -> Tree<Plain> {
    bst::solve_insert(&Tree::new(), values)
}

#[test]
fn handled_values_follow_the_operation() {
    let existing = build(&[5, 3]);
    let student = build(&[5, 3, 8]);

    let insert = diff::handled_values(Operation::Insert, &existing, &student, &[8, 9]);
    assert_eq!(insert.handled, vec![8]);
    assert_eq!(insert.not_handled, vec![9]);

    let delete = diff::handled_values(Operation::Delete, &student, &existing, &[8, 5]);
    assert_eq!(delete.handled, vec![8]);
    assert_eq!(delete.not_handled, vec![5]);
}

#[test]
fn inserting_a_duplicate_needs_another_copy() {
    let existing = build(&[5]);
    let unchanged = build(&[5]);
    let handled = diff::handled_values(Operation::Insert, &existing, &unchanged, &[5]);
    assert_eq!(handled.not_handled, vec![5]);
}

#[test]
fn extra_and_missing_values() {
    let existing = build(&[5, 3, 7]);
    let solution = build(&[5, 3, 7, 9]);
    let student = build(&[5, 7, 9, 9, 1]);

    let delta = diff::multiset_delta(Operation::Insert, &existing, &[9], &student, &solution);
    assert_eq!(delta.extra, BTreeMap::from([(1, 1), (9, 1)]));
    assert_eq!(delta.missing, vec![3]);
}

#[test]
fn deleted_values_are_not_extra() {
    let existing = build(&[5, 3, 7]);
    let solution = bst::solve_delete(&existing, &[3], bst::Replacement::Successor);
    // The student forgot the delete entirely.
    let delta = diff::multiset_delta(Operation::Delete, &existing, &[3], &existing, &solution);
    assert!(delta.is_empty());
}

#[test]
fn ordering_violation_is_reported_once() {
    let student = plain(json!({
        "value": 10,
        "left": {
            "value": 5,
            "right": {"value": 12, "left": {"value": 11}}
        }
    }));
    assert_eq!(
        diff::ordering_violations(&student),
        vec![
            OrderingViolation::builder()
                .value(12)
                .kind(ViolationKind::TooLargeForLeftSubtree)
                .build()
        ]
    );
}

#[test]
fn equal_key_on_the_left_violates_ordering() {
    let student = plain(json!({"value": 4, "left": {"value": 4}}));
    let violations = diff::ordering_violations(&student);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::TooLargeForLeftSubtree);

    let student = plain(json!({"value": 4, "right": {"value": 2}}));
    assert_eq!(
        diff::ordering_violations(&student)[0].kind,
        ViolationKind::TooSmallForRightSubtree
    );
}

#[test]
fn misplaced_insert_is_flagged_only_once_inserted() {
    let existing = build(&[8]);
    let solution = build(&[8, 4]);
    let misplaced = plain(json!({"value": 8, "right": {"value": 4}}));
    let forgotten = build(&[8]);

    assert_eq!(diff::inserted_at_wrong_position(&solution, &existing, &misplaced, &[4]), vec![4]);
    assert!(diff::inserted_at_wrong_position(&solution, &existing, &forgotten, &[4]).is_empty());
    assert!(diff::inserted_at_wrong_position(&solution, &existing, &solution, &[4]).is_empty());
}

#[test]
fn similarity_counts_changed_positions() {
    let existing = build(&[8, 4, 12, 2, 6, 10, 14]);
    let solution = bst::solve_delete(&existing, &[8], bst::Replacement::Successor);
    let predecessor = bst::solve_delete(&existing, &[8], bst::Replacement::Predecessor);

    assert_eq!(diff::adjusted_similarity(&solution, &existing, &solution), 1.0);
    assert_eq!(diff::adjusted_similarity(&solution, &existing, &predecessor), 0.0);
}

#[test]
fn similarity_without_changes_requires_an_exact_match() {
    let existing = build(&[2, 1, 3]);
    assert_eq!(diff::adjusted_similarity(&existing, &existing, &existing), 1.0);
    assert_eq!(diff::adjusted_similarity(&existing, &existing, &build(&[1, 2, 3])), 0.0);
}

#[test]
fn positional_mismatch_lists_moved_values() {
    let solution = build(&[2, 1, 3]);
    let student = build(&[1, 2, 3]);
    assert_eq!(diff::positional_mismatch(&solution, &student), vec![1, 2, 3]);
    assert!(diff::positional_mismatch(&solution, &solution).is_empty());
}

#[test]
fn color_violations_of_a_broken_tree() {
    let solution = colored(json!({
        "value": 2, "color": "BLACK",
        "left": {"value": 1, "color": "RED"},
        "right": {"value": 3, "color": "RED"}
    }));
    let student = colored(json!({
        "value": 2, "color": "RED",
        "left": {"value": 1, "color": "RED"},
        "right": {"value": 3, "color": "BLACK"}
    }));

    let facts = color::color_violations(&solution, &student);
    assert_eq!(facts.red_root, Some(2));
    assert_eq!(facts.red_red_pairs, vec![(2, 1)]);
    assert_eq!(facts.miscolored, vec![3]);
    assert!(facts.non_uniform_black_height());
    assert_eq!(facts.black_heights[0].black_height, 0);
    assert_eq!(facts.black_heights[0].leaves, vec![1, 1]);
    assert_eq!(facts.black_heights[1].leaves, vec![3, 3]);
}

proptest! {
    #[test]
    fn identical_trees_have_no_delta(values in prop::collection::vec(-20i64..20, 0..40)) {
        let tree = build(&values);
        prop_assert!(diff::multiset_delta(Operation::Insert, &tree, &[], &tree, &tree).is_empty());
        prop_assert!(diff::positional_mismatch(&tree, &tree).is_empty());
    }

    #[test]
    fn inserted_trees_are_ordered(values in prop::collection::vec(-20i64..20, 0..40)) {
        prop_assert!(diff::ordering_violations(&build(&values)).is_empty());
        let distinct: Vec<i64> = values.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let balanced = avl::solve_insert(&Tree::new(), &distinct);
        prop_assert!(diff::ordering_violations(&balanced).is_empty());
    }
}
