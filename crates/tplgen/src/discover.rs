//! Input file discovery.

use crate::config::{Config, ConfigError};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("input `{0}` does not exist")]
    Missing(Utf8PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Expand inputs into component files, sorted and deduplicated.
///
/// Files named explicitly are always kept. Directories are walked, and the
/// files found there must carry a component extension, match `include` and
/// escape `exclude`; globs are matched relative to `base`.
pub fn discover(
    inputs: &[Utf8PathBuf],
    config: &Config,
    base: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, DiscoverError> {
    let include = config.include_set()?;
    let exclude = config.exclude_set()?;
    let relative = |path: &Utf8Path| path.strip_prefix(base).unwrap_or(path).to_owned();

    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(DiscoverError::Missing(input.clone()));
        }

        let walker = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || Utf8Path::from_path(entry.path())
                        .map_or(true, |path| !exclude.is_match(relative(path)))
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                tracing::debug!("skipping non UTF-8 path");
                continue;
            };
            if !config.has_extension(&path) {
                continue;
            }
            let rel = relative(&path);
            if include.as_ref().is_some_and(|set| !set.is_match(&rel)) || exclude.is_match(&rel) {
                tracing::debug!(path = %rel, "filtered out");
                continue;
            }
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "discovered inputs");
    Ok(files)
}
