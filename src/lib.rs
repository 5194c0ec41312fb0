//! # treegrade
//!
//! An autograder for binary search tree, AVL tree and red-black tree
//! exercises. It computes the reference tree for a task, compares a student's
//! tree against it and reports a score with structured feedback.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Environment-driven settings.
pub mod config;
/// Reference insert, delete and repair algorithms.
pub mod engine;
/// Errors surfaced to callers.
pub mod error;
/// Diffing and scoring of submissions.
pub mod grade;
/// Arena-backed binary trees and their wire format.
pub mod tree;

pub use error::TreeError;
pub use grade::{
    diagnostics::Diagnostics,
    task::{GradeReport, GradeRequest, Solution, TaskType, grade, solve},
};
pub use tree::{Annotation, Balance, Color, Plain, Tree};
