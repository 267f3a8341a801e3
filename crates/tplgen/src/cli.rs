//! Command-line argument parsing.

use camino::Utf8PathBuf;
use clap::Parser;

/// Compile JSX components into Jinja, Twig, Handlebars and Liquid templates
#[derive(Parser, Debug, Clone)]
#[command(name = "tplgen")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Component files or directories (defaults to the project directory)
    pub inputs: Vec<Utf8PathBuf>,

    /// Backends to emit (jinja, twig, handlebars, liquid, native)
    #[arg(short, long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    pub out_dir: Option<Utf8PathBuf>,

    /// Path to tplgen.json
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,

    /// Stop starting new files after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Number of worker threads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Also write the annotated IR of every component
    #[arg(long)]
    pub emit_ir: bool,

    /// Render every component against this JSON data into <out-dir>/preview
    #[arg(long, value_name = "DATA")]
    pub preview: Option<Utf8PathBuf>,

    /// Compile, then recompile on changes
    #[arg(short, long)]
    pub watch: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long)]
    pub preserve_watch_output: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON lines
    Json,
    /// Colon-separated records
    Machine,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "tplgen",
            "src",
            "-t",
            "jinja,twig",
            "--target",
            "native",
            "--out-dir",
            "build",
            "--output",
            "json",
            "-j",
            "4",
            "--fail-fast",
        ])
        .unwrap();
        assert_eq!(args.inputs, vec![Utf8PathBuf::from("src")]);
        assert_eq!(args.targets, vec!["jinja", "twig", "native"]);
        assert_eq!(args.out_dir.as_deref().map(|p| p.as_str()), Some("build"));
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.jobs, Some(4));
        assert!(args.fail_fast);
        assert!(!args.watch);
    }
}
