use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::fs;
use serde_json::json;
use tplgen::{discover, write_previews, BackendRegistry, BatchCompiler, Config, FileError};

const LIST: &str = r#"
export function List({ title, items }) {
  return (
    <section>
      <h2>{title}</h2>
      <ul>{items.map((item) => <li key={item.id}>{item.name}</li>)}</ul>
    </section>
  );
}
"#;

const PAGE: &str = r#"
export function Page({ user }) {
  return (
    <Extends layout="base">
      <Block name="content"><p>{user.name}</p></Block>
    </Extends>
  );
}
"#;

const BROKEN: &str = "export function Broken() { return <div>; }";

fn write_sources(root: &Utf8Path, files: &[(&str, &str)]) -> Vec<Utf8PathBuf> {
    files
        .iter()
        .map(|(name, source)| {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, source).unwrap();
            path
        })
        .collect()
}

fn compiler(targets: &[&str]) -> BatchCompiler {
    BatchCompiler::new(&BackendRegistry::with_builtins(), targets).unwrap()
}

#[test]
fn test_writes_backend_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let paths = write_sources(root, &[("src/List.tsx", LIST)]);

    let report = compiler(&["jinja", "native"]).compile_files(&paths).unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.exit_code(), 0);

    let out = root.join("out");
    let written = report.write_outputs(&out, true).unwrap();
    let rel: Vec<_> = written
        .iter()
        .map(|p| p.strip_prefix(&out).unwrap().as_str())
        .collect();
    assert_eq!(rel, vec!["jinja/List.jinja", "native/List.tsx", "ir/List.html"]);

    let jinja = fs::read_to_string(out.join("jinja/List.jinja")).unwrap();
    assert!(jinja.contains("{% for item in items %}"), "{jinja}");
    let ir = fs::read_to_string(out.join("ir/List.html")).unwrap();
    assert!(ir.contains(r#"data-gen-loop="item:items""#), "{ir}");
}

#[test]
fn test_partial_failure() {
    let sources = vec![
        (Utf8PathBuf::from("List.tsx"), LIST.to_string()),
        (Utf8PathBuf::from("Broken.tsx"), BROKEN.to_string()),
        (Utf8PathBuf::from("Page.tsx"), PAGE.to_string()),
    ];
    let report = compiler(&["twig", "handlebars"])
        .compile_sources(&sources)
        .unwrap();

    let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["List.tsx", "Broken.tsx", "Page.tsx"]);
    assert!(report.skipped.is_empty());

    assert!(matches!(report.files[1].error, Some(FileError::Parse(_))));
    let page: Vec<_> = report.files[2]
        .units
        .iter()
        .map(|u| (u.backend.as_str(), u.is_ok()))
        .collect();
    assert_eq!(page, vec![("twig", true), ("handlebars", false)]);

    // List: 2 ok. Broken: 2 failed. Page: 1 ok, 1 failed.
    assert_eq!(report.succeeded_units(), 3);
    assert_eq!(report.failed_units(), 3);
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_warnings_do_not_fail() {
    let sources = vec![(
        Utf8PathBuf::from("Spread.tsx"),
        r#"export const Spread = (props) => <div {...props}>x</div>;"#.to_string(),
    )];
    let report = compiler(&["jinja"]).compile_sources(&sources).unwrap();
    assert!(report.warning_count() > 0);
    assert!(!report.has_failures());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_fail_fast_skips_remaining() {
    let sources = vec![
        (Utf8PathBuf::from("Broken.tsx"), BROKEN.to_string()),
        (Utf8PathBuf::from("List.tsx"), LIST.to_string()),
        (Utf8PathBuf::from("Page.tsx"), PAGE.to_string()),
    ];
    let report = compiler(&["jinja"])
        .fail_fast(true)
        .jobs(Some(1))
        .compile_sources(&sources)
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(
        report.skipped,
        vec![Utf8PathBuf::from("List.tsx"), Utf8PathBuf::from("Page.tsx")]
    );
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_read_error_is_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let mut paths = write_sources(root, &[("List.tsx", LIST)]);
    paths.push(root.join("Missing.tsx"));

    let report = compiler(&["liquid"]).compile_files(&paths).unwrap();
    assert_eq!(report.files[0].succeeded_units(), 1);
    assert!(matches!(report.files[1].error, Some(FileError::Read { .. })));
    assert_eq!(report.files[1].error.as_ref().unwrap().code(), "read-error");
}

#[test]
fn test_parallel_matches_sequential() {
    let sources: Vec<_> = (0..24)
        .map(|i| {
            let source = if i % 2 == 0 { LIST } else { PAGE };
            (Utf8PathBuf::from(format!("c{i}.tsx")), source.to_string())
        })
        .collect();
    let targets = ["jinja", "twig", "handlebars", "liquid", "native"];

    let flatten = |report: &tplgen::BatchReport| -> Vec<(String, String, Option<String>)> {
        report
            .files
            .iter()
            .flat_map(|file| {
                file.units.iter().map(move |unit| {
                    (
                        file.path.to_string(),
                        unit.backend.to_string(),
                        unit.result.as_ref().ok().map(|out| out.code.clone()),
                    )
                })
            })
            .collect()
    };

    let parallel = compiler(&targets).compile_sources(&sources).unwrap();
    let sequential = compiler(&targets)
        .jobs(Some(1))
        .compile_sources(&sources)
        .unwrap();
    assert_eq!(flatten(&parallel), flatten(&sequential));
    assert_eq!(parallel.files.len(), 24);
}

#[test]
fn test_config_drives_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    write_sources(
        root,
        &[
            ("components/List.tsx", LIST),
            ("components/Page.tsx", PAGE),
            ("legacy/Old.tsx", LIST),
        ],
    );
    fs::write(
        root.join("tplgen.json"),
        r#"{
  // only the component library
  "targets": ["twig"],
  "include": ["components/**"],
  "outDir": "build" /* relative to this file */
}"#,
    )
    .unwrap();

    let found = Config::find(&root.join("components")).unwrap();
    assert_eq!(found, root.join("tplgen.json"));
    let config = Config::load(&found).unwrap();
    assert_eq!(config.out_dir, "build");

    let files = discover(&[root.to_owned()], &config, root).unwrap();
    let names: Vec<_> = files.iter().filter_map(|p| p.file_name()).collect();
    assert_eq!(names, vec!["List.tsx", "Page.tsx"]);

    let report = BatchCompiler::new(&BackendRegistry::with_builtins(), &config.targets)
        .unwrap()
        .compile_files(&files)
        .unwrap();
    assert_eq!(report.succeeded_units(), 2);
}

#[test]
fn test_preview_resolves_across_files() {
    let sources = vec![
        (
            Utf8PathBuf::from("Badge.tsx"),
            r#"export const Badge = ({ label }) => <em>{label}</em>;"#.to_string(),
        ),
        (
            Utf8PathBuf::from("Users.tsx"),
            r#"
export function Users({ users }) {
  return (
    <ul>
      {users.map((user) => (
        <li><Include template="Badge" label={user.name} /></li>
      ))}
    </ul>
  );
}
"#
            .to_string(),
        ),
    ];
    let report = compiler(&["jinja"]).compile_sources(&sources).unwrap();
    assert_eq!(report.templates().len(), 2);

    let outcomes = report.preview(&json!({ "users": [{ "name": "a&b" }], "label": "x" }));
    let rendered: Vec<_> = outcomes
        .iter()
        .map(|o| (o.component.as_str(), o.result.clone().unwrap()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("Badge", "<em>x</em>".to_string()),
            ("Users", "<ul><li><em>a&amp;b</em></li></ul>".to_string()),
        ]
    );

    let failing = report.preview(&json!({}));
    assert_eq!(failing[1].result.as_ref().unwrap_err().code(), "not-iterable");

    let dir = tempfile::tempdir().unwrap();
    let out = Utf8Path::from_path(dir.path()).unwrap();
    let written = write_previews(&failing, out).unwrap();
    assert_eq!(written, vec![out.join("preview/Badge.html")]);
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), "<em></em>\n");
}
