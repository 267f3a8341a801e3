//! `tplgen.json` handling.

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "tplgen.json";

/// Errors reading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid glob `{pattern}`: {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },
}

/// Project configuration (`tplgen.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Backend ids to emit.
    pub targets: Vec<String>,
    /// Output root; templates go to `<outDir>/<backend>/`.
    pub out_dir: Utf8PathBuf,
    /// Globs a discovered file must match, relative to the config directory.
    pub include: Vec<String>,
    /// Globs that exclude a discovered file.
    pub exclude: Vec<String>,
    /// Stop scheduling files after the first failure.
    pub fail_fast: bool,
    /// Component file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec!["jinja".to_string()],
            out_dir: Utf8PathBuf::from("dist/templates"),
            include: Vec::new(),
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/.git/**".to_string(),
            ],
            fail_fast: false,
            extensions: ["tsx", "jsx"].map(String::from).to_vec(),
        }
    }
}

impl Config {
    /// Load a configuration file. JSON comments are allowed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parse configuration text.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_json_comments(content))
    }

    /// Find `tplgen.json` in a directory or its parents.
    pub fn find(dir: &Utf8Path) -> Option<Utf8PathBuf> {
        dir.ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Compile the include globs. An empty list matches everything.
    pub fn include_set(&self) -> Result<Option<GlobSet>, ConfigError> {
        if self.include.is_empty() {
            return Ok(None);
        }
        build_globs(&self.include).map(Some)
    }

    /// Compile the exclude globs.
    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        build_globs(&self.exclude)
    }

    /// Check if a path has a component extension.
    pub fn has_extension(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e.trim_start_matches('.') == ext))
    }
}

fn build_globs(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Remove `//` and `/* */` comments outside of strings.
pub fn strip_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        result.push('\n');
                    }
                    prev = next;
                }
            }
            _ => result.push(c),
        }
    }

    result
}
