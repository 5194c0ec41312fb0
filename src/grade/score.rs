#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use super::diagnostics::{Diagnostics, Outcome};

/// What a line of the score breakdown awards or deducts points for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criterion {
    /// Fixed starting points.
    Baseline,
    /// Requested values the student inserted or deleted.
    HandledValues,
    /// Requested values that ended up in the right place.
    Placement,
    /// Changed positions reproduced by a delete.
    Similarity,
    /// Values present more often than in the solution.
    ExtraValues,
    /// Pre-existing values that went missing.
    MissingValues,
    /// Search-tree ordering violations.
    OrderingViolations,
    /// Values at a different position than in the solution.
    WrongPosition,
    /// Non-root nodes with a different color than in the solution.
    Miscolored,
    /// The root is red.
    RedRoot,
    /// Red nodes with red children.
    RedRedPairs,
    /// Null leaves with different black heights.
    BlackHeight,
    /// Progress along the repair checkpoints.
    Checkpoint,
}

impl Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Criterion::Baseline => "Baseline",
            Criterion::HandledValues => "Handled values",
            Criterion::Placement => "Placement",
            Criterion::Similarity => "Adjusted nodes",
            Criterion::ExtraValues => "Extra values",
            Criterion::MissingValues => "Missing values",
            Criterion::OrderingViolations => "Ordering violations",
            Criterion::WrongPosition => "Wrong position",
            Criterion::Miscolored => "Miscolored nodes",
            Criterion::RedRoot => "Red root",
            Criterion::RedRedPairs => "Red-red pairs",
            Criterion::BlackHeight => "Black height",
            Criterion::Checkpoint => "Repair progress",
        };
        write!(f, "{label}")
    }
}

/// Signed points of one breakdown line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[serde(transparent)]
pub struct Points(pub f64);

impl Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2}", self.0)
    }
}

/// One line of the score breakdown.
#[derive(Tabled, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    /// * `criterion`: what the points are for
    #[tabled(rename = "Criterion")]
    pub criterion: Criterion,
    /// * `detail`: the counts behind the points
    #[tabled(rename = "Detail")]
    pub detail:    String,
    /// * `points`: points awarded (positive) or deducted (negative)
    #[tabled(rename = "Points")]
    pub points:    Points,
}

/// Accumulates breakdown lines and turns them into a final score.
#[derive(Debug, Clone, Default)]
pub struct ScoreSheet {
    /// Lines in the order they were added.
    entries: Vec<ScoreEntry>,
}

impl ScoreSheet {
    /// Adds a line worth `points`.
    pub fn award(&mut self, criterion: Criterion, detail: impl Into<String>, points: f64) {
        self.entries.push(ScoreEntry {
            criterion,
            detail: detail.into(),
            points: Points(points),
        });
    }

    /// Deducts `count * weight` points; nothing is recorded for a zero count.
    pub fn deduct(&mut self, criterion: Criterion, count: usize, weight: f64) {
        if count > 0 {
            self.award(criterion, format!("{count} x {weight}"), -(count as f64) * weight);
        }
    }

    /// Sum of all lines before rounding.
    pub fn raw(&self) -> f64 {
        self.entries.iter().map(|entry| entry.points.0).sum()
    }

    /// Rounded and clamped score.
    pub fn score(&self) -> u8 {
        finalize(self.raw())
    }

    /// The recorded lines.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Consumes the sheet, returning its lines.
    pub fn into_entries(self) -> Vec<ScoreEntry> {
        self.entries
    }
}

/// Rounds half to even and clamps into [0, 100].
pub fn finalize(raw: f64) -> u8 {
    raw.round_ties_even().clamp(0.0, 100.0) as u8
}

/// `part / whole`, where an empty whole counts as complete.
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 1.0 } else { part as f64 / whole as f64 }
}

/// Number of handled and not handled requested values.
fn handled_counts(diagnostics: &Diagnostics) -> (usize, usize) {
    diagnostics
        .handled
        .as_ref()
        .map_or((0, 0), |handled| (handled.handled.len(), handled.not_handled.len()))
}

/// Deductions for red-black property violations.
fn deduct_colors(sheet: &mut ScoreSheet, diagnostics: &Diagnostics, weights: [f64; 4]) {
    let [miscolored, red_root, red_red, black_height] = weights;
    if let Some(colors) = &diagnostics.colors {
        sheet.deduct(Criterion::Miscolored, colors.miscolored.len(), miscolored);
        sheet.deduct(Criterion::RedRoot, usize::from(colors.red_root.is_some()), red_root);
        sheet.deduct(Criterion::RedRedPairs, colors.red_red_pairs.len(), red_red);
        sheet.deduct(
            Criterion::BlackHeight,
            usize::from(colors.non_uniform_black_height()),
            black_height,
        );
    }
}

/// BST and AVL insert: 40 points for handled values, 60 for placing them
/// correctly, then deductions.
pub fn insert_sheet(diagnostics: &Diagnostics, requested: usize) -> ScoreSheet {
    let (handled, not_handled) = handled_counts(diagnostics);
    let wrong = diagnostics.wrong_position.len();
    let mut sheet = ScoreSheet::default();

    sheet.award(
        Criterion::HandledValues,
        format!("{handled}/{requested}"),
        ratio(handled, requested) * 40.0,
    );
    let misplaced = if requested == 0 {
        0.0
    } else {
        (wrong + not_handled) as f64 / requested as f64
    };
    sheet.award(
        Criterion::Placement,
        format!("{wrong} misplaced, {not_handled} not inserted"),
        (1.0 - misplaced) * 60.0,
    );
    sheet.deduct(Criterion::ExtraValues, diagnostics.extra_occurrences(), 10.0);
    sheet.deduct(Criterion::MissingValues, diagnostics.missing_values.len(), 10.0);
    sheet.deduct(Criterion::OrderingViolations, diagnostics.ordering_violations.len(), 5.0);
    sheet
}

/// BST and AVL delete: 40% of the handled share, 60% of it scaled by how
/// well the changed positions were reproduced, then deductions.
pub fn delete_sheet(diagnostics: &Diagnostics, requested: usize) -> ScoreSheet {
    let (handled, _) = handled_counts(diagnostics);
    let deleted = ratio(handled, requested) * 100.0;
    let similarity = diagnostics.similarity.unwrap_or(0.0);
    let mut sheet = ScoreSheet::default();

    sheet.award(Criterion::HandledValues, format!("{handled}/{requested}"), 0.4 * deleted);
    sheet.award(
        Criterion::Similarity,
        format!("{:.0}% of changed positions", similarity * 100.0),
        0.6 * deleted * similarity,
    );
    sheet.deduct(Criterion::OrderingViolations, diagnostics.ordering_violations.len(), 10.0);
    sheet.deduct(Criterion::ExtraValues, diagnostics.extra_values.len(), 10.0);
    sheet.deduct(Criterion::MissingValues, diagnostics.missing_values.len(), 10.0);
    sheet
}

/// Red-black insert: up to 100 points for handled values, then deductions.
/// An empty submission scores nothing.
pub fn red_black_insert_sheet(diagnostics: &Diagnostics, requested: usize) -> ScoreSheet {
    let mut sheet = ScoreSheet::default();
    if diagnostics.outcome == Outcome::EmptySubmission {
        sheet.award(Criterion::Baseline, "empty submission", 0.0);
        return sheet;
    }

    let (handled, _) = handled_counts(diagnostics);
    sheet.award(
        Criterion::HandledValues,
        format!("{handled}/{requested}"),
        ratio(handled, requested) * 100.0,
    );
    sheet.deduct(Criterion::WrongPosition, diagnostics.wrong_position.len(), 10.0);
    sheet.deduct(Criterion::ExtraValues, diagnostics.extra_occurrences(), 10.0);
    sheet.deduct(Criterion::MissingValues, diagnostics.missing_values.len(), 10.0);
    sheet.deduct(Criterion::OrderingViolations, diagnostics.ordering_violations.len(), 10.0);
    deduct_colors(&mut sheet, diagnostics, [5.0, 10.0, 10.0, 10.0]);
    sheet
}

/// Red-black repair: full marks for an already valid task or a complete
/// repair, 50 to 100 for stopping at an intermediate checkpoint, otherwise
/// 100 minus deductions.
pub fn red_black_repair_sheet(diagnostics: &Diagnostics) -> ScoreSheet {
    let mut sheet = ScoreSheet::default();
    match diagnostics.outcome {
        Outcome::AlreadyValid => {
            sheet.award(Criterion::Baseline, "tree was already valid", 100.0);
        }
        Outcome::EmptySubmission => {
            sheet.award(Criterion::Baseline, "empty submission", 0.0);
        }
        Outcome::Repaired => {
            sheet.award(Criterion::Checkpoint, "fully repaired", 100.0);
        }
        Outcome::PartialRepair => {
            let (reached, total) = diagnostics
                .checkpoint
                .map_or((0, 0), |progress| (progress.reached, progress.total));
            sheet.award(Criterion::Baseline, "partial repair", 50.0);
            sheet.award(
                Criterion::Checkpoint,
                format!("{reached}/{total} steps"),
                ratio(reached, total) * 50.0,
            );
        }
        Outcome::Graded => {
            sheet.award(Criterion::Baseline, "", 100.0);
            sheet.deduct(Criterion::WrongPosition, diagnostics.wrong_position.len(), 10.0);
            sheet.deduct(Criterion::ExtraValues, diagnostics.extra_occurrences(), 15.0);
            sheet.deduct(Criterion::MissingValues, diagnostics.missing_values.len(), 15.0);
            sheet.deduct(
                Criterion::OrderingViolations,
                diagnostics.ordering_violations.len(),
                10.0,
            );
            deduct_colors(&mut sheet, diagnostics, [10.0, 15.0, 5.0, 15.0]);
        }
    }
    sheet
}
