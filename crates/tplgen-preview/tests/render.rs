use pretty_assertions::assert_eq;
use serde_json::json;
use tplgen_analyzer::analyze_source;
use tplgen_backends::{emit, Native};
use tplgen_ir::GenRoot;
use tplgen_preview::{render, PreviewError, Renderer, TemplateSet};

fn root(source: &str) -> GenRoot {
    let mut output = analyze_source("src/Component.tsx", source).expect("source parses");
    assert_eq!(output.components.len(), 1, "expected exactly one component");
    output.components.remove(0).root
}

#[test]
fn test_loop_repeats_body() {
    let ir = root(
        r#"
export function Ids({ items }) {
  return <div>{items.map((item) => <span>{item.id}</span>)}</div>;
}
"#,
    );
    let html = render(&ir, &json!({ "items": [{ "id": "a" }, { "id": "b" }] })).unwrap();
    assert_eq!(html, "<div><span>a</span><span>b</span></div>");
}

#[test]
fn test_first_true_branch_wins() {
    let ir = root(
        r#"
export function Status({ state }) {
  return <p>{state === "error" ? <b>Failed</b> : state === "busy" ? <i>Working</i> : <span>Idle</span>}</p>;
}
"#,
    );
    let html = |state: &str| render(&ir, &json!({ "state": state })).unwrap();
    assert_eq!(html("busy"), "<p><i>Working</i></p>");
    assert_eq!(html("error"), "<p><b>Failed</b></p>");
    assert_eq!(html("done"), "<p><span>Idle</span></p>");
}

#[test]
fn test_defaults_filters_and_escaping() {
    let ir = root(
        r#"
export function Price({ amount, note }) {
  return (
    <span className="price" title={note}>
      {filter(amount ?? 0, "currency")} {note} {raw(note)}
    </span>
  );
}
"#,
    );
    assert_eq!(
        render(&ir, &json!({ "amount": 1234.5, "note": "<b>" })).unwrap(),
        r#"<span class="price" title="&lt;b>">$1,234.50 &lt;b&gt; <b></span>"#
    );
    assert_eq!(
        render(&ir, &json!({})).unwrap(),
        r#"<span class="price">$0.00  </span>"#
    );
}

#[test]
fn test_predicate_truthiness() {
    let ir = root(
        r#"
export function Flags({ items, name }) {
  return (
    <ul>
      {items.length > 0 && <li>some</li>}
      {!name && <li>anonymous</li>}
    </ul>
  );
}
"#,
    );
    assert_eq!(
        render(&ir, &json!({ "items": [], "name": "" })).unwrap(),
        "<ul><li>anonymous</li></ul>"
    );
    assert_eq!(
        render(&ir, &json!({ "items": [1], "name": "x" })).unwrap(),
        "<ul><li>some</li></ul>"
    );
}

#[test]
fn test_slots_and_includes() {
    let mut templates = TemplateSet::new();
    templates.insert(
        "badge",
        root(r#"export const Badge = ({ label }) => <em>{label}</em>;"#),
    );
    let page = root(
        r#"
export function Panel({ user }) {
  return (
    <div>
      <Include template="badge" label={user.role} />
      <Slot name="aside">none</Slot>
    </div>
  );
}
"#,
    );
    let renderer = Renderer::new(&templates);

    let html = renderer
        .render(&page, &json!({ "user": { "role": "admin" } }))
        .unwrap();
    assert_eq!(html, "<div><em>admin</em>none</div>");

    let html = renderer
        .render(
            &page,
            &json!({ "user": { "role": "x" }, "slots": { "aside": "<hr>" } }),
        )
        .unwrap();
    assert_eq!(html, "<div><em>x</em><hr></div>");
}

#[test]
fn test_layout_blocks() {
    let mut templates = TemplateSet::new();
    templates.insert(
        "base",
        root(
            r#"
export function Base() {
  return (
    <main>
      <Block name="content"><p>Default</p></Block>
      <Block name="footer">(c)</Block>
    </main>
  );
}
"#,
        ),
    );
    let page = root(
        r#"
export function Page() {
  return (
    <Extends layout="base">
      <Block name="content"><p>Hi</p></Block>
    </Extends>
  );
}
"#,
    );
    let html = Renderer::new(&templates).render(&page, &json!({})).unwrap();
    assert_eq!(html, "<main><p>Hi</p>(c)</main>");
}

#[test]
fn test_errors() {
    let ir = root(
        r#"
export function List({ items }) {
  return <ul>{items.map((item) => <li>{item}</li>)}</ul>;
}
"#,
    );
    let err = render(&ir, &json!({})).unwrap_err();
    assert!(matches!(err, PreviewError::NotIterable { .. }));
    assert_eq!(err.code(), "not-iterable");

    let err = render(&ir, &json!({ "items": [{ "a": 1 }] })).unwrap_err();
    assert_eq!(err.code(), "object-child");

    let include = root(r#"export const A = () => <Include template="missing" />;"#);
    let err = render(&include, &json!({})).unwrap_err();
    assert!(matches!(err, PreviewError::UnknownTemplate { ref name, .. } if name == "missing"));
}

#[test]
fn test_native_round_trip() {
    let mut templates = TemplateSet::new();
    templates.insert(
        "card",
        root(
            r#"
export function CardItem({ title, featured }) {
  return <div>{title}{featured && <em>!</em>}</div>;
}
"#,
        ),
    );
    let source = r#"
export function Card({ user, posts }) {
  if (!user) return null;
  return (
    <article className="card" style={{ fontSize: 12, color: "red" }}>
      <h1>Hello, {user.name ?? "guest"} &amp; friends</h1>
      {posts.length > 0 && (
        <ol>
          {posts.map((post, i) => (
            <>
              <li>{i}: {raw(post.body)}</li>
              <Include template="card" title={post.title} featured count={3} />
            </>
          ))}
        </ol>
      )}
      <Slot name="footer">Nothing here</Slot>
    </article>
  );
}
"#;
    let data = json!({
        "user": { "name": null },
        "posts": [{ "title": "T1", "body": "<b>x</b>" }],
    });

    let original = root(source);
    let native = emit(&original, &Native).unwrap();
    let reparsed = root(&native.code);

    let renderer = Renderer::new(&templates);
    let expected = renderer.render(&original, &data).unwrap();
    assert_eq!(
        expected,
        "<article class=\"card\" style=\"font-size: 12px; color: red\">\
         <h1>Hello, guest &amp; friends</h1>\
         <ol><li>0: <b>x</b></li><div>T1<em>!</em></div></ol>\
         Nothing here</article>"
    );
    assert_eq!(renderer.render(&reparsed, &data).unwrap(), expected);
    assert_eq!(renderer.render(&original, &json!({ "posts": [] })).unwrap(), "");
}
