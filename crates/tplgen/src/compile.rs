//! Single-file compilation.

use camino::{Utf8Path, Utf8PathBuf};
use smol_str::SmolStr;
use std::sync::Arc;
use thiserror::Error;
use tplgen_analyzer::{analyze_source, AnalysisWarning};
use tplgen_backends::{emit, Backend, BackendRegistry, EmitOutput, RegistryError, UnsupportedFeatureError};
use tplgen_ir::GenRoot;
use tplgen_parser::ParseError;

/// A file that produced no components at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("failed to read {path}: {message}")]
    Read { path: Utf8PathBuf, message: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FileError {
    /// Get the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read-error",
            Self::Parse(err) => err.code.as_str(),
        }
    }
}

/// The result of emitting one component with one backend.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub component: SmolStr,
    pub backend: SmolStr,
    pub result: Result<EmitOutput, UnsupportedFeatureError>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything produced for one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: Utf8PathBuf,
    /// Backends the file was compiled for.
    pub targets: Vec<SmolStr>,
    /// Set when the file could not be read or parsed. No units run then.
    pub error: Option<FileError>,
    pub warnings: Vec<AnalysisWarning>,
    pub components: Vec<GenRoot>,
    /// One entry per (component, backend), components outermost.
    pub units: Vec<UnitOutcome>,
}

impl FileReport {
    fn empty(path: &Utf8Path, backends: &[Arc<dyn Backend>]) -> Self {
        Self {
            path: path.to_owned(),
            targets: backends.iter().map(|b| SmolStr::new(b.id())).collect(),
            error: None,
            warnings: Vec::new(),
            components: Vec::new(),
            units: Vec::new(),
        }
    }

    pub(crate) fn failed(path: &Utf8Path, backends: &[Arc<dyn Backend>], error: FileError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(path, backends)
        }
    }

    /// Count units that emitted a template.
    pub fn succeeded_units(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_ok()).count()
    }

    /// Count failed units. A file error fails every requested backend.
    pub fn failed_units(&self) -> usize {
        if self.error.is_some() {
            return self.targets.len();
        }
        self.units.iter().filter(|unit| !unit.is_ok()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.error.is_some() || self.units.iter().any(|unit| !unit.is_ok())
    }
}

/// Compile one source file for the given backend ids.
pub fn compile_source<S: AsRef<str>>(
    path: &Utf8Path,
    source: &str,
    registry: &BackendRegistry,
    targets: &[S],
) -> Result<FileReport, RegistryError> {
    let backends = registry.resolve(targets)?;
    Ok(compile_with(path, source, &backends))
}

/// Compile one source file with already resolved backends.
pub fn compile_with(path: &Utf8Path, source: &str, backends: &[Arc<dyn Backend>]) -> FileReport {
    let _span = tracing::debug_span!("compile", file = %path).entered();

    let output = match analyze_source(path.as_str(), source) {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(code = err.code.as_str(), "parse failed");
            return FileReport::failed(path, backends, err.into());
        }
    };

    let mut report = FileReport::empty(path, backends);
    report.warnings = output.all_warnings().cloned().collect();
    if !report.warnings.is_empty() {
        tracing::warn!(count = report.warnings.len(), "{path}: analysis warnings");
    }

    for component in output.components {
        for backend in backends {
            let result = emit(&component.root, backend.as_ref());
            if let Err(err) = &result {
                tracing::debug!(backend = backend.id(), "{err}");
            }
            report.units.push(UnitOutcome {
                component: component.root.name.clone(),
                backend: SmolStr::new(backend.id()),
                result,
            });
        }
        report.components.push(component.root);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAYOUT_PAGE: &str = r#"
export function Page({ title }) {
  return (
    <Extends layout="base">
      <Block name="content"><h1>{title}</h1></Block>
    </Extends>
  );
}
"#;

    #[test]
    fn test_units_are_isolated() {
        let registry = BackendRegistry::with_builtins();
        let report = compile_source(
            Utf8Path::new("src/Page.tsx"),
            LAYOUT_PAGE,
            &registry,
            &["jinja", "liquid", "twig"],
        )
        .unwrap();

        let outcomes: Vec<_> = report
            .units
            .iter()
            .map(|unit| (unit.backend.as_str(), unit.is_ok()))
            .collect();
        assert_eq!(
            outcomes,
            vec![("jinja", true), ("liquid", false), ("twig", true)]
        );
        assert_eq!(report.succeeded_units(), 2);
        assert_eq!(report.failed_units(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn test_parse_error_fails_every_target() {
        let registry = BackendRegistry::with_builtins();
        let report = compile_source(
            Utf8Path::new("src/Broken.tsx"),
            "export function Broken() { return <div>; }",
            &registry,
            &["jinja", "twig"],
        )
        .unwrap();

        assert!(matches!(report.error, Some(FileError::Parse(_))));
        assert!(report.units.is_empty());
        assert_eq!(report.failed_units(), 2);
    }

    #[test]
    fn test_unknown_target() {
        let registry = BackendRegistry::with_builtins();
        let err = compile_source(Utf8Path::new("A.tsx"), "", &registry, &["erb"]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownBackend { ref id, .. } if id == "erb"));
    }
}
