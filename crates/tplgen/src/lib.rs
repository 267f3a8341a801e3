//! Compile JSX components into server-side templates.
//!
//! [`compile_source`] turns one component file into one template per
//! (component, backend) pair. [`BatchCompiler`] does the same for many files
//! in parallel, keeping results in input order and isolating failures to the
//! unit that produced them.

pub mod batch;
pub mod compile;
pub mod config;
pub mod discover;
pub mod preview;

pub use batch::{BatchCompiler, BatchError, BatchReport, IR_DIR};
pub use compile::{compile_source, compile_with, FileError, FileReport, UnitOutcome};
pub use config::{Config, ConfigError, CONFIG_FILE};
pub use discover::{discover, DiscoverError};
pub use preview::{write_previews, PreviewOutcome, PREVIEW_DIR};

pub use tplgen_backends::{BackendRegistry, EmitOutput, UnsupportedFeatureError};
