use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use crate::report::{OutcomeStatus, ResultReport, TaskOutcome};
use crate::task::{ExecutionMode, TaskId};
use crate::utils::{display_path, format_size};

/// Entries listed per task unless verbose output is on.
const MAX_LISTED_ENTRIES: usize = 20;

fn status_text(status: OutcomeStatus) -> ColoredString {
    let label = format!("{:<10}", status.label());
    match status {
        OutcomeStatus::Succeeded => label.green(),
        OutcomeStatus::Partial => label.yellow(),
        OutcomeStatus::Failed => label.red().bold(),
        OutcomeStatus::Skipped => label.dimmed(),
        OutcomeStatus::Cancelled => label.magenta(),
    }
}

pub fn print_banner(out: &mut impl Write, mode: ExecutionMode) -> io::Result<()> {
    let title = match mode {
        ExecutionMode::Analyze => "sysclean - analysis (no files will be changed)",
        ExecutionMode::Execute => "sysclean - cleanup",
    };
    writeln!(out, "{}", title.bold().cyan())?;
    writeln!(out)
}

fn print_outcome(out: &mut impl Write, outcome: &TaskOutcome, verbose: bool) -> io::Result<()> {
    writeln!(
        out,
        "  {:<12} {} {:>12}",
        outcome.id.as_str().bold(),
        status_text(outcome.status),
        format_size(outcome.bytes).yellow()
    )?;
    if let Some(message) = &outcome.message {
        writeln!(out, "      {}", message.dimmed())?;
    }

    // The finder exists to show what it found
    let list_all = verbose || outcome.id == TaskId::LargeOld;
    if list_all || outcome.id == TaskId::EmptyDirs {
        let limit = if verbose { usize::MAX } else { MAX_LISTED_ENTRIES };
        for entry in outcome.entries.iter().take(limit) {
            if entry.size_bytes > 0 {
                writeln!(
                    out,
                    "      {}  {}",
                    display_path(&entry.path).dimmed(),
                    format_size(entry.size_bytes).yellow()
                )?;
            } else {
                writeln!(out, "      {}", display_path(&entry.path).dimmed())?;
            }
        }
        if outcome.entries.len() > limit {
            writeln!(
                out,
                "      {}",
                format!("... and {} more", outcome.entries.len() - limit).dimmed()
            )?;
        }
    }

    for err in &outcome.errors {
        writeln!(
            out,
            "      {} {}: {}",
            "Failed".red().bold(),
            display_path(&err.path).dimmed(),
            err.message.red()
        )?;
    }
    Ok(())
}

pub fn print_grand_total(
    out: &mut impl Write,
    report: &ResultReport,
    mode: ExecutionMode,
) -> io::Result<()> {
    let label = match mode {
        ExecutionMode::Analyze => "Total reclaimable:",
        ExecutionMode::Execute => "Total reclaimed:",
    };
    writeln!(out, "  {}", "─".repeat(45).dimmed())?;
    writeln!(
        out,
        "  {:<23} {:>12}",
        label.bold(),
        format_size(report.total_bytes()).green().bold()
    )?;
    writeln!(out)
}

/// One line per outcome in canonical order, then the total.
pub fn render_report(
    out: &mut impl Write,
    report: &ResultReport,
    mode: ExecutionMode,
    verbose: bool,
) -> io::Result<()> {
    print_banner(out, mode)?;
    if report.is_empty() {
        writeln!(out, "  {}", "No tasks selected.".dimmed())?;
    }
    for outcome in report.outcomes() {
        print_outcome(out, outcome, verbose)?;
    }
    print_grand_total(out, report, mode)?;

    if report.was_cancelled() {
        writeln!(out, "{}", "Run was cancelled; totals cover completed work only.".yellow().bold())?;
    } else if mode == ExecutionMode::Analyze {
        writeln!(
            out,
            "{}",
            "This was a dry run. Run again without --analyze to clean."
                .yellow()
                .bold()
        )?;
    }
    Ok(())
}
