use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use crate::cancel::CancelToken;
use crate::config::CleanupConfig;
use crate::engine::ExecutionEngine;
use crate::error::InvocationError;
use crate::output;
use crate::report::ResultReport;
use crate::task::{ExecutionMode, TaskId};
use crate::utils;

/// Engine ran and no task failed.
pub const EXIT_OK: u8 = 0;
/// At least one task failed.
pub const EXIT_TASK_FAILURE: u8 = 1;
/// The command line was invalid.
pub const EXIT_INVALID: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "sysclean",
    about = "Disk cleanup utility: temp files, trash, caches, prefetch, defrag, large/old files, empty directories",
    version
)]
pub struct Cli {
    /// Run in command-line mode instead of opening the window
    #[arg(long)]
    pub cli: bool,

    /// Only estimate reclaimable space; change nothing
    #[arg(long)]
    pub analyze: bool,

    /// Select every task (overrides individual task flags)
    #[arg(long)]
    pub all: bool,

    /// Clean temporary files
    #[arg(long)]
    pub temp: bool,

    /// Empty the recycle bin / trash
    #[arg(long)]
    pub trash: bool,

    /// Clean system and browser caches
    #[arg(long)]
    pub cache: bool,

    /// Clean prefetch files (Windows only)
    #[arg(long)]
    pub prefetch: bool,

    /// Defragment the system disk (Windows, HDD only)
    #[arg(long)]
    pub defrag: bool,

    /// Find large and old files (report only, never deletes)
    #[arg(long)]
    pub large_old: bool,

    /// Remove empty directories
    #[arg(long)]
    pub empty_dirs: bool,

    /// Minimum size for the large/old finder (e.g. "100MB", "1GB")
    #[arg(long, env = "SYSCLEAN_MIN_SIZE", default_value = "100MB", value_parser = utils::parse_size)]
    pub min_size: u64,

    /// Minimum age in days for the large/old finder
    #[arg(long, env = "SYSCLEAN_OLDER_THAN", default_value_t = 30)]
    pub older_than: u64,

    /// Root for the large/old finder and empty directory removal
    #[arg(long, env = "SYSCLEAN_PATH")]
    pub path: Option<PathBuf>,

    /// Number of tasks to run at once (1-7)
    #[arg(long, env = "SYSCLEAN_JOBS")]
    pub jobs: Option<usize>,

    /// Show every item and debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Task flags that were set, in canonical order.
    pub fn requested(&self) -> Vec<TaskId> {
        [
            (self.temp, TaskId::Temp),
            (self.trash, TaskId::Trash),
            (self.cache, TaskId::Cache),
            (self.prefetch, TaskId::Prefetch),
            (self.defrag, TaskId::Defrag),
            (self.large_old, TaskId::LargeOld),
            (self.empty_dirs, TaskId::EmptyDirs),
        ]
        .into_iter()
        .filter_map(|(set, id)| set.then_some(id))
        .collect()
    }

    pub fn mode(&self) -> ExecutionMode {
        if self.analyze {
            ExecutionMode::Analyze
        } else {
            ExecutionMode::Execute
        }
    }

    /// Command-line mode needs something to do.
    pub fn validate(&self) -> Result<(), InvocationError> {
        if !self.all && self.requested().is_empty() {
            return Err(InvocationError::NoTasks);
        }
        Ok(())
    }

    /// Host locations with the command-line overrides applied.
    pub fn config(&self) -> CleanupConfig {
        let mut config = CleanupConfig::detect().with_large_thresholds(
            self.min_size,
            Duration::from_secs(self.older_than.saturating_mul(86_400)),
        );
        if let Some(path) = &self.path {
            config = config.with_scan_root(path);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_workers(jobs);
        }
        config
    }
}

pub fn exit_code(report: &ResultReport) -> u8 {
    if report.has_failures() {
        EXIT_TASK_FAILURE
    } else {
        EXIT_OK
    }
}

/// Command-line mode: validate, run the engine once, print the report.
pub fn run(cli: &Cli) -> ExitCode {
    if let Err(e) = cli.validate() {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_INVALID);
    }

    let engine = ExecutionEngine::for_host(cli.config());
    abort_on_interrupt(engine.cancel_token());

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(execute(&engine, cli, &mut stdout))
}

/// Ctrl-C stops the run between items; the partial report is still printed.
fn abort_on_interrupt(cancel: CancelToken) {
    let installed = ctrlc::set_handler(move || {
        if !cancel.is_cancelled() {
            eprintln!("Interrupted, finishing the current item...");
            cancel.cancel();
        }
    });
    if let Err(e) = installed {
        tracing::warn!("cannot install Ctrl-C handler: {e}");
    }
}

/// Run the selection on `engine` and render the report to `out`.
/// Returns the process exit code.
pub fn execute(engine: &ExecutionEngine, cli: &Cli, out: &mut impl Write) -> u8 {
    let mode = cli.mode();
    let report = engine.run(cli.requested(), cli.all, mode);

    if let Err(e) = output::render_report(out, &report, mode, cli.verbose) {
        tracing::warn!("cannot write report: {e}");
    }
    if let Err(e) = out.flush() {
        tracing::debug!("cannot flush report: {e}");
    }
    exit_code(&report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sysclean").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_to_ids_in_canonical_order() {
        let cli = parse(&["--cli", "--empty-dirs", "--temp", "--large-old"]);
        assert_eq!(
            cli.requested(),
            vec![TaskId::Temp, TaskId::LargeOld, TaskId::EmptyDirs]
        );
        assert_eq!(cli.mode(), ExecutionMode::Execute);
    }

    #[test]
    fn analyze_selects_analyze_mode() {
        assert_eq!(parse(&["--cli", "--analyze", "--all"]).mode(), ExecutionMode::Analyze);
    }

    #[test]
    fn cli_without_tasks_is_invalid() {
        assert_eq!(parse(&["--cli"]).validate(), Err(InvocationError::NoTasks));
        assert_eq!(parse(&["--cli", "--analyze"]).validate(), Err(InvocationError::NoTasks));
        assert!(parse(&["--cli", "--all"]).validate().is_ok());
        assert!(parse(&["--cli", "--trash"]).validate().is_ok());
    }

    #[test]
    fn help_and_unknown_flags_bypass_the_engine() {
        let help = Cli::try_parse_from(["sysclean", "--cli", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        let bad = Cli::try_parse_from(["sysclean", "--cli", "--shred"]).unwrap_err();
        assert_eq!(bad.exit_code(), i32::from(EXIT_INVALID));
    }

    #[test]
    fn aborted_run_still_prints_a_report() {
        use crate::platform::{OsFamily, PlatformCapabilities, StorageMedium};
        use crate::registry::DefaultTaskFactory;

        let dir = tempfile::tempdir().unwrap();
        let item = dir.path().join("scratch.tmp");
        std::fs::write(&item, vec![0u8; 64]).unwrap();
        let config = CleanupConfig {
            temp_dirs: vec![dir.path().to_path_buf()],
            ..CleanupConfig::default()
        };
        let engine = ExecutionEngine::new(
            PlatformCapabilities::new(OsFamily::Linux, StorageMedium::Unknown),
            DefaultTaskFactory::new(config),
        );
        // as if Ctrl-C arrived before the first task
        engine.cancel_token().cancel();

        colored::control::set_override(false);
        let mut out = Vec::new();
        let code = execute(&engine, &parse(&["--cli", "--temp"]), &mut out);
        let text = String::from_utf8(out).unwrap();

        assert_eq!(code, EXIT_OK);
        assert!(text.contains("cancelled"));
        assert!(text.contains("Run was cancelled"));
        assert!(item.exists());
    }

    #[test]
    fn thresholds_parse_human_sizes() {
        let cli = parse(&["--cli", "--large-old", "--min-size", "1GB", "--older-than", "90"]);
        assert_eq!(cli.min_size, 1_073_741_824);
        assert_eq!(cli.older_than, 90);
    }
}
