//! tplgen - JSX component to template compiler.

use clap::Parser;
use miette::Result;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod orchestrator;
mod output;

use cli::Args;
use orchestrator::Orchestrator;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TPLGEN_LOG";

fn main() -> ExitCode {
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    init_tracing(args.verbose);

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let watch = args.watch;
    let orchestrator = Orchestrator::new(args)?;

    if watch {
        orchestrator.run_watch_mode()?;
        Ok(ExitCode::SUCCESS)
    } else {
        let report = orchestrator.run_once()?;
        Ok(ExitCode::from(report.exit_code()))
    }
}
