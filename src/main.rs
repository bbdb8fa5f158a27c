use std::process::ExitCode;

use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use sysclean::app::SyscleanApp;
use sysclean::cli::{self, Cli};
use sysclean::TaskId;

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "sysclean=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.cli {
        return cli::run(&args);
    }

    match run_gui(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_gui(args: &Cli) -> anyhow::Result<()> {
    let config = args.config();
    let preselected = if args.all {
        TaskId::ALL.to_vec()
    } else {
        args.requested()
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("sysclean")
            .with_inner_size([760.0, 680.0])
            .with_min_inner_size([560.0, 460.0]),
        ..Default::default()
    };

    eframe::run_native(
        "sysclean",
        options,
        Box::new(move |_cc| Ok(Box::new(SyscleanApp::new(config, &preselected)))),
    )
    .map_err(|e| anyhow::anyhow!("cannot open the window: {e}"))
}
