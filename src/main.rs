#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # treegrade
//! ## Introduction
//!
//! Grades binary search tree, AVL tree and red-black tree exercises.
//!
//! A request is a JSON document with a `taskType`, an `existingTree`, the
//! `values` to insert or delete and the student's `studentTree`. `grade`
//! prints the score, diagnostics and reference solution as JSON; `solve` only
//! prints the reference solution. Pass `-` to read the request from stdin.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use serde::Serialize;
use tabled::{
    Table,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};
use treegrade::{
    GradeReport, GradeRequest, config,
    tree::wire::{from_str_unbounded, to_vec_unbounded},
};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade a submission, optionally printing a breakdown table
    Grade(bool, String),
    /// Print the reference solution of a request
    Solve(String),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the request location
    fn r() -> impl Parser<String> {
        positional("REQUEST").help("Path to a JSON grading request, or - for stdin")
    }

    /// parses the table switch
    fn t() -> impl Parser<bool> {
        long("table")
            .short('t')
            .help("Print a score breakdown table to stderr")
            .switch()
    }

    let grade = construct!(Cmd::Grade(t(), r()))
        .to_options()
        .command("grade")
        .help("Grade a student tree against the reference solution");

    let solve = construct!(Cmd::Solve(r()))
        .to_options()
        .command("solve")
        .help("Compute the reference solution for a request");

    let cmd = construct!([grade, solve]);

    cmd.to_options()
        .descr("Autograder for binary search tree exercises")
        .run()
}

/// Reads a request from a file, or from stdin for `-`.
fn read_request(location: &str) -> Result<GradeRequest> {
    let raw = if location == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(location)
            .with_context(|| format!("Failed to read request file `{location}`"))?
    };
    from_str_unbounded(&raw).with_context(|| format!("`{location}` is not a valid request"))
}

/// Writes `value` to stdout as JSON.
fn print_json(value: &impl Serialize) -> Result<()> {
    let mut out = to_vec_unbounded(value, config::get().pretty())?;
    out.push(b'\n');
    std::io::stdout()
        .lock()
        .write_all(&out)
        .context("Failed to write to stdout")
}

/// Prints the score breakdown of `report` as a table on stderr.
fn show_breakdown(report: &GradeReport) {
    let score = format!("{}/100", report.score);
    let score = match report.score {
        100 => score.green(),
        0 => score.red(),
        _ => score.yellow(),
    }
    .bold();

    let table = Table::new(&report.breakdown)
        .with(Panel::header(format!("Outcome: {:?}", report.diagnostics.outcome)))
        .with(Panel::footer(format!("Score: {score}")))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(40).keep_words(true)))
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Modify::new(Rows::last()).with(Alignment::right()))
        .with(Style::modern())
        .to_string();
    eprintln!("{table}");
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = config::get().log_level();
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Grade(table, location) => {
            let request = read_request(&location)?;
            let report = treegrade::grade(&request)
                .with_context(|| format!("Failed to grade `{location}`"))?;
            if table {
                show_breakdown(&report);
            }
            print_json(&report)?;
        }
        Cmd::Solve(location) => {
            let request = read_request(&location)?;
            let solution = treegrade::solve(&request)
                .with_context(|| format!("Failed to solve `{location}`"))?;
            print_json(&solution)?;
        }
    };

    Ok(())
}
