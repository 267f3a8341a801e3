//! Rendering a batch against sample data.

use crate::batch::{write_file, BatchError, BatchReport};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use smol_str::SmolStr;
use tplgen_preview::{PreviewResult, Renderer, TemplateSet};

/// Directory under the output root that receives preview HTML.
pub const PREVIEW_DIR: &str = "preview";

/// One component rendered against the preview data.
#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    pub file: Utf8PathBuf,
    pub component: SmolStr,
    pub result: PreviewResult<String>,
}

impl BatchReport {
    /// Every compiled component, keyed by its name.
    ///
    /// Include and layout names resolve against component names, the same
    /// way backends resolve them against `<Component>.<ext>` files.
    pub fn templates(&self) -> TemplateSet {
        let mut templates = TemplateSet::new();
        for root in self.files.iter().flat_map(|file| &file.components) {
            templates.insert(root.name.clone(), root.clone());
        }
        templates
    }

    /// Render every component against `data`.
    pub fn preview(&self, data: &Value) -> Vec<PreviewOutcome> {
        let templates = self.templates();
        let renderer = Renderer::new(&templates);
        self.files
            .iter()
            .flat_map(|file| file.components.iter().map(move |root| (file, root)))
            .map(|(file, root)| PreviewOutcome {
                file: file.path.clone(),
                component: root.name.clone(),
                result: renderer.render(root, data),
            })
            .collect()
    }
}

/// Write successful renders to `<out_dir>/preview/<Component>.html`.
pub fn write_previews(
    outcomes: &[PreviewOutcome],
    out_dir: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, BatchError> {
    let mut written = Vec::new();
    for outcome in outcomes {
        let Ok(html) = &outcome.result else { continue };
        let path = out_dir
            .join(PREVIEW_DIR)
            .join(format!("{}.html", outcome.component));
        write_file(&path, &format!("{html}\n"))?;
        written.push(path);
    }
    Ok(written)
}
