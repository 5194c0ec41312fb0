use std::{collections::BTreeMap, path::PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use treegrade::{
    GradeRequest, Plain, TaskType, Tree, TreeError,
    engine::bst,
    grade::{
        diagnostics::{CheckpointProgress, Outcome, RemainingViolation},
        score::{self, Criterion},
    },
};

fn fixture(name: &str) -> GradeRequest {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("requests")
        .join(name);
    let raw = std::fs::read_to_string(&path).expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

#[test]
fn correct_bst_insert_scores_full_marks() {
    let report = treegrade::grade(&fixture("bst_insert.json")).unwrap();
    assert_eq!(report.score, 100);
    assert_eq!(report.diagnostics.outcome, Outcome::Graded);
    assert!(report.diagnostics.wrong_position.is_empty());
}

#[test]
fn predecessor_delete_is_recognised() {
    let report = treegrade::grade(&fixture("bst_delete_predecessor.json")).unwrap();
    assert!(report.diagnostics.replaced_with_predecessor);
    assert_eq!(report.diagnostics.similarity, Some(0.0));
    assert_eq!(report.score, 40);
    assert_eq!(report.solution["value"], json!(10));
}

#[test]
fn wrong_avl_balance_is_informational() {
    let report = treegrade::grade(&fixture("avl_delete.json")).unwrap();
    assert_eq!(report.score, 100);
    assert_eq!(report.diagnostics.balance_facts.len(), 1);
    assert_eq!(report.diagnostics.balance_facts[0].value, 5);
    assert_eq!(report.diagnostics.balance_facts[0].recorded, 1);
    assert_eq!(report.diagnostics.balance_facts[0].actual, 0);
}

#[test]
fn correct_avl_insert_scores_full_marks() {
    let report = treegrade::grade(&fixture("avl_insert.json")).unwrap();
    assert_eq!(report.score, 100);
    assert!(report.diagnostics.balance_facts.is_empty());
}

#[test]
fn misplaced_avl_insert_loses_placement_points() {
    let request = GradeRequest::builder()
        .task_type(TaskType::AvlTreeInsert)
        .values(vec![1, 2, 3])
        .student_tree(json!({
            "value": 1, "balance": -2,
            "right": {"value": 2, "balance": -1, "right": {"value": 3, "balance": 0}}
        }))
        .build();
    let report = treegrade::grade(&request).unwrap();

    // All three were inserted, none where the rotation puts them.
    assert_eq!(report.diagnostics.wrong_position, vec![1, 2, 3]);
    assert_eq!(report.score, 40);
    assert!(report.diagnostics.ordering_violations.is_empty());
}

#[test]
fn red_black_insert_scores() {
    let report = treegrade::grade(&fixture("red_black_insert.json")).unwrap();
    assert_eq!(report.score, 100);

    let mut request = fixture("red_black_insert.json");
    request.student_tree = json!(null);
    let report = treegrade::grade(&request).unwrap();
    assert_eq!(report.score, 0);
    assert_eq!(report.diagnostics.outcome, Outcome::EmptySubmission);
}

#[test]
fn unbalanced_red_black_insert_is_penalised() {
    let mut request = fixture("red_black_insert.json");
    // Plain BST shape with insertion colors, never rebalanced.
    request.student_tree = json!({
        "value": 10, "color": "BLACK",
        "right": {
            "value": 20, "color": "RED",
            "right": {"value": 30, "color": "RED"}
        }
    });
    let report = treegrade::grade(&request).unwrap();
    let colors = report.diagnostics.colors.as_ref().unwrap();

    assert_eq!(colors.red_red_pairs, vec![(20, 30)]);
    assert!(!colors.non_uniform_black_height());
    assert_eq!(report.diagnostics.wrong_position, vec![10, 20, 30]);
    assert_eq!(colors.miscolored, vec![20, 30]);
    // 100 - 3 x 10 - 2 x 5 - 1 x 10
    assert_eq!(report.score, 50);
}

#[test]
fn partial_repair_earns_a_share_of_the_upper_half() {
    let report = treegrade::grade(&fixture("red_black_repair_partial.json")).unwrap();
    assert_eq!(report.diagnostics.outcome, Outcome::PartialRepair);
    assert_eq!(
        report.diagnostics.checkpoint,
        Some(CheckpointProgress {
            reached:   1,
            total:     3,
            remaining: Some(RemainingViolation::RedRed {
                value:  40,
                parent: 20,
            }),
        })
    );
    assert_eq!(report.score, 67);
    assert_eq!(report.checkpoints.as_ref().map(Vec::len), Some(3));
}

#[test]
fn complete_repair_scores_full_marks() {
    let mut request = fixture("red_black_repair_partial.json");
    let solution = treegrade::solve(&request).unwrap();
    request.student_tree = solution.solution;

    let report = treegrade::grade(&request).unwrap();
    assert_eq!(report.diagnostics.outcome, Outcome::Repaired);
    assert_eq!(report.score, 100);
}

#[test]
fn untouched_repair_is_graded_by_deductions() {
    let mut request = fixture("red_black_repair_partial.json");
    request.student_tree = request.existing_tree.clone();

    let report = treegrade::grade(&request).unwrap();
    assert_eq!(report.diagnostics.outcome, Outcome::Graded);
    let progress = report.diagnostics.checkpoint.unwrap();
    assert_eq!((progress.reached, progress.total), (0, 3));
    // 100 - 7 wrong x 10 - 3 miscolored x 10 - 1 red-red x 5
    let raw: f64 = report.breakdown.iter().map(|entry| entry.points.0).sum();
    assert_eq!(raw, -5.0);
    assert_eq!(report.score, 0);
}

/// Repair task whose only fix is one rotation at 30; the solution is
/// 20B(10B, 40R(30B, 50B)).
fn single_step_repair(student: serde_json::Value) -> GradeRequest {
    GradeRequest::builder()
        .task_type(TaskType::RedBlackTreeRepair)
        .existing_tree(json!({
            "value": 20, "color": "BLACK",
            "left": {"value": 10, "color": "BLACK"},
            "right": {
                "value": 30, "color": "BLACK",
                "right": {
                    "value": 40, "color": "RED",
                    "right": {"value": 50, "color": "RED"}
                }
            }
        }))
        .student_tree(student)
        .build()
}

#[test]
fn recolored_repair_deducts_color_weights() {
    let request = single_step_repair(json!({
        "value": 20, "color": "RED",
        "left": {"value": 10, "color": "RED"},
        "right": {
            "value": 40, "color": "BLACK",
            "left": {"value": 30, "color": "RED"},
            "right": {"value": 50, "color": "BLACK"}
        }
    }));
    let report = treegrade::grade(&request).unwrap();
    let colors = report.diagnostics.colors.as_ref().unwrap();

    assert_eq!(report.diagnostics.outcome, Outcome::Graded);
    assert!(report.diagnostics.wrong_position.is_empty());
    assert_eq!(colors.miscolored, vec![10, 30, 40]);
    assert_eq!(colors.red_root, Some(20));
    assert_eq!(colors.red_red_pairs, vec![(20, 10)]);
    assert!(colors.non_uniform_black_height());
    // 100 - 3 x 10 - 15 - 1 x 5 - 15
    assert_eq!(report.score, 35);
}

#[test]
fn restructured_repair_deducts_value_weights() {
    let request = single_step_repair(json!({
        "value": 20, "color": "BLACK",
        "left": {
            "value": 10, "color": "BLACK",
            "right": {"value": 25, "color": "RED"}
        },
        "right": {
            "value": 30, "color": "BLACK",
            "right": {"value": 40, "color": "RED"}
        }
    }));
    let report = treegrade::grade(&request).unwrap();
    let diagnostics = &report.diagnostics;
    let colors = diagnostics.colors.as_ref().unwrap();

    assert_eq!(diagnostics.outcome, Outcome::Graded);
    assert_eq!(diagnostics.wrong_position, vec![30, 40]);
    assert_eq!(diagnostics.extra_occurrences(), 1);
    assert_eq!(diagnostics.missing_values, vec![50]);
    assert_eq!(diagnostics.ordering_violations.len(), 1);
    assert!(colors.miscolored.is_empty());
    assert!(colors.red_red_pairs.is_empty());
    assert!(!colors.non_uniform_black_height());
    // 100 - 2 x 10 - 1 x 15 - 1 x 15 - 1 x 10
    assert_eq!(report.score, 40);
}

#[test]
fn bst_insert_deducts_every_extra_copy() {
    let request = GradeRequest::builder()
        .task_type(TaskType::BinarySearchTreeInsert)
        .existing_tree(json!({"value": 5, "left": {"value": 3}, "right": {"value": 7}}))
        .values(vec![9])
        .student_tree(json!({
            "value": 5,
            "right": {
                "value": 7,
                "left": {"value": 6, "right": {"value": 6}},
                "right": {"value": 9}
            }
        }))
        .build();
    let report = treegrade::grade(&request).unwrap();

    assert_eq!(report.diagnostics.extra_values, BTreeMap::from([(6, 2)]));
    assert_eq!(report.diagnostics.missing_values, vec![3]);
    assert!(report.diagnostics.ordering_violations.is_empty());
    // 40 + 60 - 2 x 10 - 1 x 10
    assert_eq!(report.score, 70);
}

#[test]
fn bst_insert_deducts_ordering_violations() {
    let request = GradeRequest::builder()
        .task_type(TaskType::BinarySearchTreeInsert)
        .existing_tree(json!({"value": 5}))
        .values(vec![3, 8])
        .student_tree(json!({"value": 5, "left": {"value": 3, "right": {"value": 8}}}))
        .build();
    let report = treegrade::grade(&request).unwrap();

    assert_eq!(report.diagnostics.wrong_position, vec![8]);
    assert_eq!(report.diagnostics.ordering_violations.len(), 1);
    // 40 + 60 x 1/2 - 1 x 5
    assert_eq!(report.score, 65);
}

#[test]
fn bst_delete_deducts_distinct_extra_values() {
    let request = GradeRequest::builder()
        .task_type(TaskType::BinarySearchTreeDelete)
        .existing_tree(bst::solve_insert(&Tree::new(), &[8, 4, 12, 2, 6, 10, 14]).to_json())
        .values(vec![2])
        .student_tree(json!({
            "value": 8,
            "left": {"value": 4},
            "right": {
                "value": 12,
                "left": {"value": 10, "right": {"value": 1}},
                "right": {
                    "value": 14,
                    "left": {"value": 13, "right": {"value": 13}},
                    "right": {"value": 15}
                }
            }
        }))
        .build();
    let report = treegrade::grade(&request).unwrap();
    let diagnostics = &report.diagnostics;

    assert_eq!(diagnostics.handled.as_ref().unwrap().handled, vec![2]);
    assert_eq!(diagnostics.similarity, Some(1.0));
    assert_eq!(diagnostics.extra_values, BTreeMap::from([(1, 1), (13, 2), (15, 1)]));
    assert_eq!(diagnostics.missing_values, vec![6]);
    assert_eq!(diagnostics.ordering_violations.len(), 1);
    // 40 + 60 - 1 x 10 - 3 distinct x 10 - 1 x 10
    assert_eq!(report.score, 50);
}

#[test]
fn red_black_insert_deducts_extras_and_red_root() {
    let mut request = fixture("red_black_insert.json");
    request.student_tree = json!({
        "value": 20, "color": "RED",
        "left": {
            "value": 10, "color": "BLACK",
            "left": {"value": 5, "color": "RED"},
            "right": {"value": 25, "color": "RED"}
        },
        "right": {"value": 30, "color": "BLACK"}
    });
    let report = treegrade::grade(&request).unwrap();
    let colors = report.diagnostics.colors.as_ref().unwrap();

    assert_eq!(report.diagnostics.extra_occurrences(), 2);
    assert_eq!(report.diagnostics.ordering_violations.len(), 1);
    assert_eq!(colors.red_root, Some(20));
    assert!(colors.miscolored.is_empty());
    assert!(!colors.non_uniform_black_height());
    // 100 - 2 x 10 - 1 x 10 - 10
    assert_eq!(report.score, 60);
}

#[test]
fn red_black_insert_deducts_missing_values_and_black_height() {
    let request = GradeRequest::builder()
        .task_type(TaskType::RedBlackTreeInsert)
        .existing_tree(json!({
            "value": 20, "color": "BLACK",
            "left": {"value": 10, "color": "RED"},
            "right": {"value": 30, "color": "RED"}
        }))
        .values(vec![40])
        .student_tree(json!({
            "value": 30, "color": "BLACK",
            "left": {"value": 20, "color": "BLACK"},
            "right": {"value": 40, "color": "RED"}
        }))
        .build();
    let report = treegrade::grade(&request).unwrap();
    let colors = report.diagnostics.colors.as_ref().unwrap();

    assert_eq!(report.solution["left"]["left"]["value"], json!(10));
    assert_eq!(report.diagnostics.missing_values, vec![10]);
    assert!(report.diagnostics.wrong_position.is_empty());
    assert_eq!(colors.miscolored, vec![40]);
    assert!(colors.non_uniform_black_height());
    // 100 - 1 x 10 - 1 x 5 - 10
    assert_eq!(report.score, 75);
}

#[test]
fn deep_chains_are_graded() {
    let values: Vec<i64> = (0..300).collect();
    let existing = bst::solve_insert(&Tree::new(), &values);
    let student = bst::solve_insert(&existing, &[300]);
    assert_eq!(student.height(), 301);

    let request = GradeRequest::builder()
        .task_type(TaskType::BinarySearchTreeInsert)
        .existing_tree(existing.to_json())
        .values(vec![300])
        .student_tree(student.to_json())
        .build();
    let report = treegrade::grade(&request).unwrap();
    assert_eq!(report.score, 100);
    assert_eq!(Tree::<Plain>::from_json(&report.solution).unwrap().len(), 301);
}

#[test]
fn repair_of_a_valid_tree_awards_full_marks() {
    let request = GradeRequest::builder()
        .task_type(TaskType::RedBlackTreeRepair)
        .existing_tree(json!({
            "value": 2, "color": "BLACK",
            "left": {"value": 1, "color": "RED"},
            "right": {"value": 3, "color": "RED"}
        }))
        .student_tree(json!(null))
        .build();

    let report = treegrade::grade(&request).unwrap();
    assert_eq!(report.diagnostics.outcome, Outcome::AlreadyValid);
    assert_eq!(report.score, 100);
    assert!(report.checkpoints.is_none());
    assert_eq!(treegrade::solve(&request), Err(TreeError::NoViolationFound));
}

#[test]
fn malformed_trees_are_rejected_with_their_role() {
    let err = treegrade::grade(&fixture("malformed_avl.json")).unwrap_err();
    let TreeError::InvalidFormat(message) = err else {
        panic!("expected an invalid format error");
    };
    assert!(message.starts_with("existing tree"), "{message}");
}

#[test]
fn breakdown_adds_up_to_the_score() {
    let report = treegrade::grade(&fixture("bst_delete_predecessor.json")).unwrap();
    let raw: f64 = report.breakdown.iter().map(|entry| entry.points.0).sum();
    assert_eq!(score::finalize(raw), report.score);
    assert_eq!(report.breakdown[0].criterion, Criterion::HandledValues);
}

#[test]
fn requests_use_the_platform_field_names() {
    let request: GradeRequest = serde_json::from_value(json!({
        "taskType": "BINARY_SEARCH_TREE_INSERT",
        "values": [1]
    }))
    .unwrap();
    assert_eq!(request.task_type, TaskType::BinarySearchTreeInsert);
    assert!(request.existing_tree.is_null());
    assert!(request.student_tree.is_null());
}
