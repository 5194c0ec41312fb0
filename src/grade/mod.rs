#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grading of submitted trees.
//!
//! A request is solved by the matching engine, the student tree is diffed
//! against the solution, and the resulting [`diagnostics::Diagnostics`] are
//! turned into a score by the task's scoring table.

/// Red-black property checks on a submission.
pub mod color;
/// Structured facts reported for a submission.
pub mod diagnostics;
/// Structural comparison of a submission with its solution.
pub mod diff;
/// Scoring tables and the score breakdown.
pub mod score;
/// Requests, task dispatch and reports.
pub mod task;
