#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;

use super::{
    color,
    diagnostics::{CheckpointProgress, Diagnostics, Outcome, RemainingViolation},
    diff::{self, Operation},
    score::{self, ScoreEntry, ScoreSheet},
};
use crate::{
    engine::{
        avl,
        bst::{self, Replacement},
        red_black::{self, Violation},
    },
    error::TreeError,
    tree::{Annotation, Balance, Color, Plain, Tree},
};

/// The exercise a submission belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Insert values into a plain binary search tree.
    BinarySearchTreeInsert,
    /// Delete values from a plain binary search tree.
    BinarySearchTreeDelete,
    /// Insert values into an AVL tree.
    AvlTreeInsert,
    /// Delete values from an AVL tree.
    AvlTreeDelete,
    /// Insert values into a red-black tree.
    RedBlackTreeInsert,
    /// Repair a red-black tree with one outstanding violation.
    RedBlackTreeRepair,
}

impl TaskType {
    /// The operation the student was asked to perform.
    pub fn operation(self) -> Operation {
        match self {
            TaskType::BinarySearchTreeInsert
            | TaskType::AvlTreeInsert
            | TaskType::RedBlackTreeInsert => Operation::Insert,
            TaskType::BinarySearchTreeDelete | TaskType::AvlTreeDelete => Operation::Delete,
            TaskType::RedBlackTreeRepair => Operation::Repair,
        }
    }
}

impl Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskType::BinarySearchTreeInsert => "BINARY_SEARCH_TREE_INSERT",
            TaskType::BinarySearchTreeDelete => "BINARY_SEARCH_TREE_DELETE",
            TaskType::AvlTreeInsert => "AVL_TREE_INSERT",
            TaskType::AvlTreeDelete => "AVL_TREE_DELETE",
            TaskType::RedBlackTreeInsert => "RED_BLACK_TREE_INSERT",
            TaskType::RedBlackTreeRepair => "RED_BLACK_TREE_REPAIR",
        };
        write!(f, "{name}")
    }
}

#[derive(Serialize, Deserialize, TypedBuilder, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// A submission to grade, as received from the exercise platform.
///
/// Trees stay in their JSON wire form until the task type decides which
/// annotation they carry.
pub struct GradeRequest {
    /// * `task_type`: which exercise this is
    pub task_type:     TaskType,
    /// * `existing_tree`: the tree before the operation (`null`/`{}` if empty)
    #[serde(default)]
    #[builder(default)]
    pub existing_tree: Value,
    /// * `values`: values to insert or delete, in order
    #[serde(default)]
    #[builder(default)]
    pub values:        Vec<i64>,
    /// * `student_tree`: the student's resulting tree (`null`/`{}` if empty)
    #[serde(default)]
    #[builder(default)]
    pub student_tree:  Value,
}

/// Reference answer for a request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Solution {
    /// The expected tree, `null` when empty.
    pub solution:    Value,
    /// Every intermediate repair step, for repair tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoints: Option<Vec<Value>>,
}

/// Score and diagnostics for one submission.
#[derive(Debug, Clone)]
struct Graded {
    /// Final score in [0, 100].
    score:       u8,
    /// Structured facts behind the score.
    diagnostics: Diagnostics,
    /// Points per criterion.
    breakdown:   Vec<ScoreEntry>,
}

impl Graded {
    /// Scores `diagnostics` with the lines in `sheet`.
    fn new(diagnostics: Diagnostics, sheet: ScoreSheet) -> Self {
        Self {
            score: sheet.score(),
            diagnostics,
            breakdown: sheet.into_entries(),
        }
    }
}

/// What is sent back for a graded request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeReport {
    /// Final score in [0, 100].
    pub score:       u8,
    /// Structured facts behind the score.
    pub diagnostics: Diagnostics,
    /// Points per criterion.
    pub breakdown:   Vec<ScoreEntry>,
    /// The expected tree, `null` when empty.
    pub solution:    Value,
    /// Every intermediate repair step, for repair tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoints: Option<Vec<Value>>,
}

impl GradeReport {
    /// Combines a grade with the reference answer it was computed against.
    fn new(graded: Graded, solution: Solution) -> Self {
        Self {
            score:       graded.score,
            diagnostics: graded.diagnostics,
            breakdown:   graded.breakdown,
            solution:    solution.solution,
            checkpoints: solution.checkpoints,
        }
    }
}

/// Parses one tree of a request, naming it in the error message.
fn parse<A: Annotation>(label: &str, value: &Value) -> Result<Tree<A>, TreeError> {
    Tree::from_json(value).map_err(|err| match err {
        TreeError::InvalidFormat(message) => TreeError::invalid(format!("{label}: {message}")),
        other => other,
    })
}

/// Wraps a single solution tree.
fn single<A: Annotation>(tree: &Tree<A>) -> Solution {
    Solution {
        solution:    tree.to_json(),
        checkpoints: None,
    }
}

/// Wraps a repair trail; the last checkpoint is the solution.
fn trail(checkpoints: &[Tree<Color>]) -> Solution {
    Solution {
        solution:    checkpoints.last().map_or(Value::Null, Tree::to_json),
        checkpoints: Some(checkpoints.iter().map(Tree::to_json).collect()),
    }
}

/// Computes the reference answer for `request` without looking at the
/// student tree.
///
/// Fails with [`TreeError::InvalidFormat`] for a malformed existing tree, and
/// with [`TreeError::NoViolationFound`] for a repair task whose tree is
/// already valid.
pub fn solve(request: &GradeRequest) -> Result<Solution, TreeError> {
    let values = &request.values;
    let solution = match request.task_type {
        TaskType::BinarySearchTreeInsert => {
            let existing: Tree<Plain> = parse("existing tree", &request.existing_tree)?;
            single(&bst::solve_insert(&existing, values))
        }
        TaskType::BinarySearchTreeDelete => {
            let existing: Tree<Plain> = parse("existing tree", &request.existing_tree)?;
            single(&bst::solve_delete(&existing, values, Replacement::Successor))
        }
        TaskType::AvlTreeInsert => {
            let existing: Tree<Balance> = parse("existing tree", &request.existing_tree)?;
            single(&avl::solve_insert(&existing, values))
        }
        TaskType::AvlTreeDelete => {
            let existing: Tree<Balance> = parse("existing tree", &request.existing_tree)?;
            single(&avl::solve_delete(&existing, values))
        }
        TaskType::RedBlackTreeInsert => {
            let existing: Tree<Color> = parse("existing tree", &request.existing_tree)?;
            single(&red_black::solve_insert(&existing, values))
        }
        TaskType::RedBlackTreeRepair => {
            let existing: Tree<Color> = parse("existing tree", &request.existing_tree)?;
            trail(&red_black::repair(&existing)?)
        }
    };
    Ok(solution)
}

/// Diffs and scores a BST or AVL insert/delete submission against its
/// solution.
fn diff_and_score<A: Annotation>(
    operation: Operation,
    existing: &Tree<A>,
    values: &[i64],
    student: &Tree<A>,
    solution: &Tree<A>,
) -> Graded {
    let delta = diff::multiset_delta(operation, existing, values, student, solution);
    let mut diagnostics = Diagnostics {
        handled: Some(diff::handled_values(operation, existing, student, values)),
        extra_values: delta.extra,
        missing_values: delta.missing,
        ordering_violations: diff::ordering_violations(student),
        ..Diagnostics::default()
    };

    let sheet = if operation == Operation::Delete {
        diagnostics.similarity = Some(diff::adjusted_similarity(solution, existing, student));
        score::delete_sheet(&diagnostics, values.len())
    } else {
        diagnostics.wrong_position =
            diff::inserted_at_wrong_position(solution, existing, student, values);
        score::insert_sheet(&diagnostics, values.len())
    };
    Graded::new(diagnostics, sheet)
}

/// Diffs and scores a red-black insert submission.
fn diff_and_score_red_black_insert(
    existing: &Tree<Color>,
    values: &[i64],
    student: &Tree<Color>,
    solution: &Tree<Color>,
) -> Graded {
    let diagnostics = if student.is_empty() {
        Diagnostics::with_outcome(Outcome::EmptySubmission)
    } else {
        red_black_facts(Operation::Insert, existing, values, student, solution)
    };
    let sheet = score::red_black_insert_sheet(&diagnostics, values.len());
    Graded::new(diagnostics, sheet)
}

/// Diffs and scores a red-black repair submission against the repair trail.
///
/// An empty `checkpoints` slice means the task tree was already valid.
fn diff_and_score_red_black_repair(
    existing: &Tree<Color>,
    student: &Tree<Color>,
    checkpoints: &[Tree<Color>],
) -> Graded {
    let diagnostics = match checkpoints.last() {
        None => Diagnostics::with_outcome(Outcome::AlreadyValid),
        Some(_) if student.is_empty() => Diagnostics::with_outcome(Outcome::EmptySubmission),
        Some(solution) => {
            let reached = diff::checkpoint_match(checkpoints, student);
            let total = checkpoints.len();
            let mut diagnostics = if reached == total {
                Diagnostics::with_outcome(Outcome::Repaired)
            } else if reached > 0 {
                Diagnostics::with_outcome(Outcome::PartialRepair)
            } else {
                red_black_facts(Operation::Repair, existing, &[], student, solution)
            };
            let remaining = reached
                .checked_sub(1)
                .filter(|_| reached < total)
                .and_then(|index| remaining_violation(&checkpoints[index]));
            diagnostics.checkpoint = Some(CheckpointProgress {
                reached,
                total,
                remaining,
            });
            diagnostics
        }
    };
    let sheet = score::red_black_repair_sheet(&diagnostics);
    Graded::new(diagnostics, sheet)
}

/// Facts shared by red-black insert and repair grading.
fn red_black_facts(
    operation: Operation,
    existing: &Tree<Color>,
    values: &[i64],
    student: &Tree<Color>,
    solution: &Tree<Color>,
) -> Diagnostics {
    let delta = diff::multiset_delta(operation, existing, values, student, solution);
    Diagnostics {
        handled: Some(diff::handled_values(operation, existing, student, values)),
        extra_values: delta.extra,
        missing_values: delta.missing,
        ordering_violations: diff::ordering_violations(student),
        wrong_position: diff::positional_mismatch(solution, student),
        colors: Some(color::color_violations(solution, student)),
        ..Diagnostics::default()
    }
}

/// The violation a partially repaired checkpoint still has, by value.
fn remaining_violation(checkpoint: &Tree<Color>) -> Option<RemainingViolation> {
    let violation = red_black::find_violation(checkpoint)?;
    Some(match violation {
        Violation::RedRoot { node } => RemainingViolation::RedRoot {
            value: checkpoint.value(node),
        },
        Violation::RedRed { node, parent } => RemainingViolation::RedRed {
            value:  checkpoint.value(node),
            parent: checkpoint.value(parent),
        },
    })
}

/// Solves `request`, compares the student tree with the solution and scores
/// it. The report carries the score, the diagnostics and the serialized
/// solution.
///
/// Only malformed trees fail. A repair task on an already valid tree is
/// graded as full marks.
pub fn grade(request: &GradeRequest) -> Result<GradeReport, TreeError> {
    let task = request.task_type;
    let values = &request.values;

    let report = match task {
        TaskType::BinarySearchTreeInsert | TaskType::BinarySearchTreeDelete => {
            let existing: Tree<Plain> = parse("existing tree", &request.existing_tree)?;
            let student: Tree<Plain> = parse("student tree", &request.student_tree)?;
            let (solution, alternative) = if task.operation() == Operation::Delete {
                (
                    bst::solve_delete(&existing, values, Replacement::Successor),
                    Some(bst::solve_delete(&existing, values, Replacement::Predecessor)),
                )
            } else {
                (bst::solve_insert(&existing, values), None)
            };
            let mut graded =
                diff_and_score(task.operation(), &existing, values, &student, &solution);
            graded.diagnostics.replaced_with_predecessor = alternative
                .is_some_and(|alternative| alternative == student && alternative != solution);
            GradeReport::new(graded, single(&solution))
        }
        TaskType::AvlTreeInsert | TaskType::AvlTreeDelete => {
            let existing: Tree<Balance> = parse("existing tree", &request.existing_tree)?;
            let student: Tree<Balance> = parse("student tree", &request.student_tree)?;
            let solution = if task.operation() == Operation::Delete {
                avl::solve_delete(&existing, values)
            } else {
                avl::solve_insert(&existing, values)
            };
            let mut graded =
                diff_and_score(task.operation(), &existing, values, &student, &solution);
            graded.diagnostics.balance_facts = diff::balance_facts(&student);
            GradeReport::new(graded, single(&solution))
        }
        TaskType::RedBlackTreeInsert => {
            let existing: Tree<Color> = parse("existing tree", &request.existing_tree)?;
            let student: Tree<Color> = parse("student tree", &request.student_tree)?;
            let solution = red_black::solve_insert(&existing, values);
            let graded = diff_and_score_red_black_insert(&existing, values, &student, &solution);
            GradeReport::new(graded, single(&solution))
        }
        TaskType::RedBlackTreeRepair => {
            let existing: Tree<Color> = parse("existing tree", &request.existing_tree)?;
            let student: Tree<Color> = parse("student tree", &request.student_tree)?;
            let (checkpoints, solution) = match red_black::repair(&existing) {
                Ok(checkpoints) => {
                    let solution = trail(&checkpoints);
                    (checkpoints, solution)
                }
                Err(TreeError::NoViolationFound) => {
                    tracing::warn!(
                        "Repair requested for a tree that is already a valid red-black tree"
                    );
                    (Vec::new(), single(&existing))
                }
                Err(err) => return Err(err),
            };
            let graded = diff_and_score_red_black_repair(&existing, &student, &checkpoints);
            GradeReport::new(graded, solution)
        }
    };

    tracing::info!("Graded {} submission: {}/100", task, report.score);
    Ok(report)
}
