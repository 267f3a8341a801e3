//! Output formatting for batch results.

use crate::cli::OutputFormat;
use camino::{Utf8Path, Utf8PathBuf};
use source_map::Location;
use tplgen::{BatchReport, FileError, FileReport, PreviewOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One line of output, flattened from a file report.
struct Entry<'a> {
    severity: Severity,
    code: &'static str,
    file: &'a str,
    location: Option<&'a Location>,
    backend: Option<&'a str>,
    message: String,
}

impl Entry<'_> {
    fn line_col(&self) -> (u32, u32) {
        self.location.map_or((0, 0), |loc| (loc.line(), loc.column()))
    }
}

fn entries(file: &FileReport) -> Vec<Entry<'_>> {
    let mut out = Vec::new();
    match &file.error {
        Some(FileError::Parse(err)) => out.push(Entry {
            severity: Severity::Error,
            code: err.code.as_str(),
            file: file.path.as_str(),
            location: Some(&err.location),
            backend: None,
            message: err.message.clone(),
        }),
        Some(err @ FileError::Read { message, .. }) => out.push(Entry {
            severity: Severity::Error,
            code: err.code(),
            file: file.path.as_str(),
            location: None,
            backend: None,
            message: message.clone(),
        }),
        None => {}
    }
    out.extend(file.warnings.iter().map(|w| Entry {
        severity: Severity::Warning,
        code: w.code.as_str(),
        file: file.path.as_str(),
        location: Some(&w.location),
        backend: None,
        message: w.message.clone(),
    }));
    out.extend(file.units.iter().filter_map(|unit| {
        let err = unit.result.as_ref().err()?;
        Some(Entry {
            severity: Severity::Error,
            code: err.code(),
            file: file.path.as_str(),
            location: Some(&err.location),
            backend: Some(unit.backend.as_str()),
            message: format!("cannot express {}: {}", err.node_kind, err.reason),
        })
    }));
    out
}

/// Formatter for batch output.
pub struct OutputFormatter {
    format: OutputFormat,
    /// Paths are shown relative to this directory.
    base: Utf8PathBuf,
}

impl OutputFormatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, base: Utf8PathBuf) -> Self {
        Self { format, base }
    }

    fn display_path<'a>(&self, path: &'a str) -> &'a str {
        Utf8Path::new(path)
            .strip_prefix(&self.base)
            .map_or(path, Utf8Path::as_str)
    }

    /// Print every diagnostic in the report, in input order.
    pub fn print_report(&self, report: &BatchReport) {
        for file in &report.files {
            for entry in entries(file) {
                self.print_entry(&entry);
            }
        }
    }

    /// Print preview failures. They never affect the exit status.
    pub fn print_previews(&self, outcomes: &[PreviewOutcome]) {
        for outcome in outcomes {
            let Err(err) = &outcome.result else { continue };
            let text = err.to_string();
            let prefix = format!("{}: ", err.location());
            let entry = Entry {
                severity: Severity::Warning,
                code: err.code(),
                file: outcome.file.as_str(),
                location: Some(err.location()),
                backend: Some("preview"),
                message: format!(
                    "{}: {}",
                    outcome.component,
                    text.strip_prefix(&prefix).unwrap_or(&text)
                ),
            };
            self.print_entry(&entry);
        }
    }

    fn print_entry(&self, entry: &Entry<'_>) {
        match self.format {
            OutputFormat::Human => self.print_human(entry),
            OutputFormat::Json => self.print_json(entry),
            OutputFormat::Machine => self.print_machine(entry),
        }
    }

    /// Print the summary.
    pub fn print_summary(&self, report: &BatchReport, written: usize) {
        match self.format {
            OutputFormat::Human => self.print_summary_human(report, written),
            OutputFormat::Json => self.print_summary_json(report, written),
            OutputFormat::Machine => {
                // No summary for machine format
            }
        }
    }

    // Human format

    fn print_human(&self, entry: &Entry<'_>) {
        let severity = match entry.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
        };
        let (line, col) = entry.line_col();
        let backend = entry
            .backend
            .map(|b| format!(" ({b})"))
            .unwrap_or_default();
        println!(
            "{}:{}:{}: {}[{}]{}: {}",
            self.display_path(entry.file),
            line,
            col,
            severity,
            entry.code,
            backend,
            entry.message
        );
    }

    fn print_summary_human(&self, report: &BatchReport, written: usize) {
        let failed = report.failed_units();
        let warnings = report.warning_count();
        println!();
        if failed == 0 {
            println!(
                "\x1b[32m✓\x1b[0m Compiled {} unit{} from {} files, wrote {} ({}ms)",
                report.succeeded_units(),
                plural(report.succeeded_units()),
                report.files.len(),
                written,
                report.duration_ms
            );
        } else {
            println!(
                "\x1b[31m✗\x1b[0m {} unit{} failed, {} succeeded",
                failed,
                plural(failed),
                report.succeeded_units()
            );
        }
        if warnings > 0 {
            println!("\x1b[33m⚠\x1b[0m Found {} warning{}", warnings, plural(warnings));
        }
        if !report.skipped.is_empty() {
            println!("Skipped {} files after the first failure", report.skipped.len());
        }
        if failed > 0 {
            println!("Time: {}ms", report.duration_ms);
        }
    }

    // JSON format

    fn print_json(&self, entry: &Entry<'_>) {
        let (line, col) = entry.line_col();
        let json = serde_json::json!({
            "type": "diagnostic",
            "file": self.display_path(entry.file),
            "severity": entry.severity.as_str(),
            "code": entry.code,
            "backend": entry.backend,
            "message": entry.message,
            "line": line,
            "column": col
        });
        println!("{}", json);
    }

    fn print_summary_json(&self, report: &BatchReport, written: usize) {
        let json = serde_json::json!({
            "type": "summary",
            "files": report.files.len(),
            "skipped": report.skipped.len(),
            "succeeded": report.succeeded_units(),
            "failed": report.failed_units(),
            "warnings": report.warning_count(),
            "written": written,
            "duration_ms": report.duration_ms
        });
        println!("{}", json);
    }

    // Machine format

    fn print_machine(&self, entry: &Entry<'_>) {
        let (line, col) = entry.line_col();
        println!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.display_path(entry.file),
            line,
            col,
            entry.severity.as_str(),
            entry.code,
            entry.backend.unwrap_or("-"),
            entry.message.replace(':', "\\:")
        );
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
