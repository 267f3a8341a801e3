//! Batch compilation over many files.

use crate::compile::{compile_with, FileError, FileReport};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tplgen_backends::{Backend, BackendRegistry, RegistryError};
use tplgen_ir::annotate;

/// Directory under the output root that receives `--emit-ir` dumps.
pub const IR_DIR: &str = "ir";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Compiles files against a fixed set of backends in parallel.
#[derive(Clone)]
pub struct BatchCompiler {
    backends: Vec<Arc<dyn Backend>>,
    fail_fast: bool,
    jobs: Option<usize>,
}

impl BatchCompiler {
    /// Resolve `targets` against the registry.
    pub fn new<S: AsRef<str>>(registry: &BackendRegistry, targets: &[S]) -> Result<Self, RegistryError> {
        Ok(Self {
            backends: registry.resolve(targets)?,
            fail_fast: false,
            jobs: None,
        })
    }

    /// Stop starting new files once one has failed.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Limit worker threads. `None` uses the global pool.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|&n| n > 0);
        self
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|b| b.id())
    }

    /// Read and compile files from disk.
    pub fn compile_files(&self, paths: &[Utf8PathBuf]) -> Result<BatchReport, BatchError> {
        self.run(paths, |path| match std::fs::read_to_string(path) {
            Ok(source) => compile_with(path, &source, &self.backends),
            Err(err) => FileReport::failed(
                path,
                &self.backends,
                FileError::Read {
                    path: path.clone(),
                    message: err.to_string(),
                },
            ),
        })
    }

    /// Compile in-memory sources.
    pub fn compile_sources(&self, sources: &[(Utf8PathBuf, String)]) -> Result<BatchReport, BatchError> {
        self.run(sources, |(path, source)| compile_with(path, source, &self.backends))
    }

    fn run<T, F>(&self, inputs: &[T], compile: F) -> Result<BatchReport, BatchError>
    where
        T: Input,
        F: Fn(&T) -> FileReport + Sync,
    {
        let start = Instant::now();
        let stop = AtomicBool::new(false);

        let work = || {
            inputs
                .par_iter()
                .map(|input| {
                    if stop.load(Ordering::Acquire) {
                        return None;
                    }
                    let report = compile(input);
                    if self.fail_fast && report.has_failures() {
                        stop.store(true, Ordering::Release);
                    }
                    Some(report)
                })
                .collect::<Vec<_>>()
        };

        let results = match self.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()?
                .install(work),
            None => work(),
        };

        let mut report = BatchReport::default();
        for (input, result) in inputs.iter().zip(results) {
            match result {
                Some(file) => report.files.push(file),
                None => report.skipped.push(input.path().to_owned()),
            }
        }
        report.duration_ms = start.elapsed().as_millis() as u64;
        report.log_summary();
        Ok(report)
    }
}

/// One unit of batch input.
trait Input: Sync {
    fn path(&self) -> &Utf8Path;
}

impl Input for Utf8PathBuf {
    fn path(&self) -> &Utf8Path {
        self
    }
}

impl Input for (Utf8PathBuf, String) {
    fn path(&self) -> &Utf8Path {
        &self.0
    }
}

impl std::fmt::Debug for BatchCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCompiler")
            .field("targets", &self.targets().collect::<Vec<_>>())
            .field("fail_fast", &self.fail_fast)
            .field("jobs", &self.jobs)
            .finish()
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// Inputs never started because of fail-fast.
    pub skipped: Vec<Utf8PathBuf>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn succeeded_units(&self) -> usize {
        self.files.iter().map(FileReport::succeeded_units).sum()
    }

    pub fn failed_units(&self) -> usize {
        self.files.iter().map(FileReport::failed_units).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|file| file.warnings.len()).sum()
    }

    /// Whether any requested (file, backend) unit failed. Warnings never count.
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(FileReport::has_failures)
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }

    /// Write every emitted template to `<out_dir>/<backend>/<Component>.<ext>`.
    ///
    /// With `emit_ir`, each component's annotated IR is also written to
    /// `<out_dir>/ir/<Component>.html`. Returns the written paths.
    pub fn write_outputs(&self, out_dir: &Utf8Path, emit_ir: bool) -> Result<Vec<Utf8PathBuf>, BatchError> {
        let mut written = Vec::new();
        let mut seen = FxHashSet::default();

        for file in &self.files {
            for unit in &file.units {
                let Ok(output) = &unit.result else { continue };
                let path = out_dir.join(unit.backend.as_str()).join(&output.file_name);
                if !seen.insert(path.clone()) {
                    tracing::warn!("{path} is written by more than one component; last one wins");
                }
                write_file(&path, &output.code)?;
                written.push(path);
            }
            if emit_ir {
                for root in &file.components {
                    let path = out_dir.join(IR_DIR).join(format!("{}.html", root.name));
                    write_file(&path, &annotate(root))?;
                    written.push(path);
                }
            }
        }

        tracing::debug!(count = written.len(), "wrote outputs");
        Ok(written)
    }

    fn log_summary(&self) {
        tracing::info!(
            files = self.files.len(),
            skipped = self.skipped.len(),
            succeeded = self.succeeded_units(),
            failed = self.failed_units(),
            warnings = self.warning_count(),
            duration_ms = self.duration_ms,
            "batch finished"
        );
    }
}

pub(crate) fn write_file(path: &Utf8Path, contents: &str) -> Result<(), BatchError> {
    let write = || {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    };
    write().map_err(|source| BatchError::Write {
        path: path.to_owned(),
        source,
    })
}
