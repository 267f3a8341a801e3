//! Host-runtime preview.
//!
//! Evaluates a [`GenRoot`](tplgen_ir::GenRoot) directly against JSON data,
//! the way the component itself would render: JavaScript truthiness, strict
//! equality, `??` defaults and HTML escaping. Output is compact HTML with no
//! formatting whitespace, so two renders can be compared byte for byte.

pub mod error;
pub mod filters;
pub mod render;
pub mod value;

pub use error::{PreviewError, PreviewResult};
pub use render::{render, Renderer, TemplateSet, MAX_DEPTH};
