#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// How a submission was judged before any deductions were applied.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Scored with the regular deduction table.
    #[default]
    Graded,
    /// The student submitted an empty tree.
    EmptySubmission,
    /// A repair was requested for a tree without violations.
    AlreadyValid,
    /// The student tree equals the fully repaired tree.
    Repaired,
    /// The student tree equals an intermediate repair checkpoint.
    PartialRepair,
}

/// Direction in which a node breaks the search-tree ordering.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// The node sits in a left subtree but is not smaller than an ancestor.
    TooLargeForLeftSubtree,
    /// The node sits in a right subtree but is smaller than an ancestor.
    TooSmallForRightSubtree,
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::TooLargeForLeftSubtree => write!(f, "too large for left subtree"),
            ViolationKind::TooSmallForRightSubtree => write!(f, "too small for right subtree"),
        }
    }
}

/// A node of the student tree that breaks the ordering invariant.
#[derive(Serialize, Deserialize, TypedBuilder, Debug, Clone, Copy, PartialEq, Eq)]
#[builder(field_defaults(setter(into)))]
pub struct OrderingViolation {
    /// * `value`: key of the offending node
    pub value: i64,
    /// * `kind`: which bound it broke
    pub kind:  ViolationKind,
}

/// Requested values split by whether the student applied the operation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandledValues {
    /// Values whose count in the student tree is what the operation requires.
    pub handled:     Vec<i64>,
    /// Values the student did not insert or delete (often enough).
    pub not_handled: Vec<i64>,
}

/// Null-leaf positions sharing one black height.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlackHeightGroup {
    /// Black nodes counted from the root, root included.
    pub black_height: usize,
    /// Values of the nodes owning a missing child at this height, once per
    /// missing child.
    pub leaves:       Vec<i64>,
}

/// Red-black property facts about the student tree.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorViolations {
    /// Value of the root when it is red.
    pub red_root:      Option<i64>,
    /// `(parent, child)` value pairs where both nodes are red, in pre-order.
    pub red_red_pairs: Vec<(i64, i64)>,
    /// Null-leaf black heights grouped by height, ascending.
    pub black_heights: Vec<BlackHeightGroup>,
    /// Non-root values whose color differs from the same value in the
    /// solution.
    pub miscolored:    Vec<i64>,
}

impl ColorViolations {
    /// True if null leaves are reached through different numbers of black
    /// nodes.
    pub fn non_uniform_black_height(&self) -> bool {
        self.black_heights.len() > 1
    }
}

/// The violation still left in a partially repaired tree.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemainingViolation {
    /// The root is still red.
    RedRoot {
        /// Value of the root.
        value: i64,
    },
    /// A red node still has a red parent.
    RedRed {
        /// Value of the red node.
        value:  i64,
        /// Value of its red parent.
        parent: i64,
    },
}

/// How far along the repair trail a submission got.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointProgress {
    /// Number of completed steps the submission corresponds to (0 = none).
    pub reached:   usize,
    /// Number of steps in the full repair.
    pub total:     usize,
    /// The violation still present at the reached checkpoint.
    pub remaining: Option<RemainingViolation>,
}

/// An AVL node whose recorded balance is inconsistent or out of range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceFact {
    /// Key of the node.
    pub value:    i64,
    /// Balance written in the submission.
    pub recorded: i64,
    /// Balance derived from subtree heights.
    pub actual:   i64,
}

/// Every structured fact the diff engine produced for one submission.
///
/// Facts that do not apply to a task type are left empty and skipped when
/// serialized.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Overall judgement.
    pub outcome:                   Outcome,
    /// Requested values split by handled / not handled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled:                   Option<HandledValues>,
    /// Values occurring more often than in the solution, with the excess.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_values:              BTreeMap<i64, usize>,
    /// Pre-existing values that disappeared without being requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_values:            Vec<i64>,
    /// Ordering violations in the student tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ordering_violations:       Vec<OrderingViolation>,
    /// Values found at a different position than in the solution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wrong_position:            Vec<i64>,
    /// Fraction of changed positions the student got right (delete tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity:                Option<f64>,
    /// The student used in-order predecessors instead of successors.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub replaced_with_predecessor: bool,
    /// Red-black property facts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors:                    Option<ColorViolations>,
    /// Repair progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint:                Option<CheckpointProgress>,
    /// Inconsistent AVL balances in the submission. Informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub balance_facts:             Vec<BalanceFact>,
}

impl Diagnostics {
    /// Diagnostics carrying only an outcome.
    pub fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    /// Total number of excess occurrences over all extra values.
    pub fn extra_occurrences(&self) -> usize {
        self.extra_values.values().sum()
    }
}
