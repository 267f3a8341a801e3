//! Orchestrator for compile runs.

use crate::cli::Args;
use crate::output::OutputFormatter;
use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::time::Duration;
use tplgen::{discover, write_previews, BackendRegistry, BatchCompiler, BatchReport, Config};

/// Orchestrator for running tplgen.
pub struct Orchestrator {
    /// Directory that globs and relative paths resolve against.
    base: Utf8PathBuf,
    /// Configuration with CLI overrides applied.
    config: Config,
    /// CLI arguments.
    args: Args,
    compiler: BatchCompiler,
    formatter: OutputFormatter,
}

impl Orchestrator {
    /// Load configuration and resolve the requested backends.
    pub fn new(mut args: Args) -> Result<Self> {
        let cwd = std::env::current_dir().into_diagnostic()?;
        let cwd = Utf8PathBuf::try_from(cwd).into_diagnostic()?;

        let config_path = match &args.config {
            Some(path) => Some(cwd.join(path)),
            None => Config::find(&cwd),
        };
        let (mut config, base) = match config_path {
            Some(path) => {
                let config = Config::load(&path).into_diagnostic()?;
                tracing::debug!(config = %path, "loaded configuration");
                let base = path.parent().map_or_else(|| cwd.clone(), Utf8Path::to_owned);
                (config, base)
            }
            None => (Config::default(), cwd.clone()),
        };

        args.inputs = args.inputs.iter().map(|input| cwd.join(input)).collect();
        args.preview = args.preview.map(|data| cwd.join(data));
        if !args.targets.is_empty() {
            config.targets = args.targets.clone();
        }
        if let Some(out_dir) = &args.out_dir {
            config.out_dir = cwd.join(out_dir);
        }
        config.out_dir = base.join(&config.out_dir);
        config.fail_fast |= args.fail_fast;

        let compiler = BatchCompiler::new(&BackendRegistry::with_builtins(), &config.targets)
            .into_diagnostic()?
            .fail_fast(config.fail_fast)
            .jobs(args.jobs);
        tracing::debug!(?compiler, out_dir = %config.out_dir, "ready");

        let formatter = OutputFormatter::new(args.output, base.clone());
        Ok(Self {
            base,
            config,
            args,
            compiler,
            formatter,
        })
    }

    fn inputs(&self) -> Vec<Utf8PathBuf> {
        if self.args.inputs.is_empty() {
            vec![self.base.clone()]
        } else {
            self.args.inputs.clone()
        }
    }

    /// Compile every input once and write the outputs.
    pub fn run_once(&self) -> Result<BatchReport> {
        let files = discover(&self.inputs(), &self.config, &self.base).into_diagnostic()?;
        if files.is_empty() {
            tracing::warn!("no component files found");
        }

        let report = self.compiler.compile_files(&files).into_diagnostic()?;
        let mut written = report
            .write_outputs(&self.config.out_dir, self.args.emit_ir)
            .into_diagnostic()
            .wrap_err("Failed to write templates")?;

        self.formatter.print_report(&report);
        if let Some(data) = &self.args.preview {
            let data = load_data(data)?;
            let outcomes = report.preview(&data);
            written.extend(
                write_previews(&outcomes, &self.config.out_dir)
                    .into_diagnostic()
                    .wrap_err("Failed to write previews")?,
            );
            self.formatter.print_previews(&outcomes);
        }
        self.formatter.print_summary(&report, written.len());
        Ok(report)
    }

    /// Run in watch mode.
    pub fn run_watch_mode(&self) -> Result<()> {
        use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
        use std::sync::mpsc::{channel, RecvTimeoutError};

        eprintln!("Starting watch mode...\n");

        if let Err(e) = self.run_once() {
            eprintln!("{:?}", e);
        }

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
        )
        .into_diagnostic()?;

        for input in self.inputs() {
            watcher
                .watch(input.as_std_path(), RecursiveMode::Recursive)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to watch {input}"))?;
        }

        loop {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    if !event.paths.iter().any(|path| self.is_relevant(path)) {
                        continue;
                    }
                    // Drain the rest of the burst.
                    while rx.recv_timeout(Duration::from_millis(50)).is_ok() {}

                    if !self.args.preserve_watch_output {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    eprintln!("File change detected. Recompiling...\n");
                    if let Err(e) = self.run_once() {
                        eprintln!("{:?}", e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(())
    }

    /// A changed component source outside the output directory.
    fn is_relevant(&self, path: &std::path::Path) -> bool {
        Utf8Path::from_path(path).is_some_and(|path| {
            !path.starts_with(&self.config.out_dir) && self.config.has_extension(path)
        })
    }
}

fn load_data(path: &Utf8Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse {path}"))
}
