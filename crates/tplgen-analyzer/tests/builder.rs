use pretty_assertions::assert_eq;
use tplgen_analyzer::{analyze_source, ComponentIr, WarningCode};
use tplgen_ir::{
    annotate, walk, AttrValue, GenExpr, GenNode, GenPath, Literal, NodeKind, PropValue,
};

fn build(source: &str) -> Vec<ComponentIr> {
    analyze_source("src/Component.tsx", source)
        .expect("source parses")
        .components
}

fn single(source: &str) -> ComponentIr {
    let mut components = build(source);
    assert_eq!(components.len(), 1, "expected exactly one component");
    components.remove(0)
}

fn count(nodes: &[GenNode], kind: NodeKind) -> usize {
    let mut n = 0;
    walk(nodes, &mut |node| {
        if node.kind() == kind {
            n += 1;
        }
    });
    n
}

fn codes(ir: &ComponentIr) -> Vec<WarningCode> {
    ir.warnings.iter().map(|w| w.code).collect()
}

#[test]
fn test_loop_detection() {
    let ir = single(
        r#"
export function List({ items }) {
  return (
    <ul>
      {items.map((item) => (
        <li key={item.id}>
          <span>{item.id}</span>
        </li>
      ))}
    </ul>
  );
}
"#,
    );

    assert_eq!(count(&ir.root.children, NodeKind::Loop), 1);
    let GenNode::Element(ul) = &ir.root.children[0] else {
        panic!("expected <ul>");
    };
    let GenNode::Loop(l) = &ul.children[0] else {
        panic!("expected loop");
    };
    assert_eq!(l.iterable, GenPath::parse("items"));
    assert_eq!(l.item, "item");
    assert_eq!(l.key, Some(GenPath::parse("item.id")));
    assert_eq!(l.index, None);

    let GenNode::Element(li) = &l.body[0] else {
        panic!("expected <li>");
    };
    assert!(li.attrs.is_empty(), "key never reaches the IR");
    assert!(ir.warnings.is_empty());
}

#[test]
fn test_index_kept_only_when_used() {
    let used = single(
        "export const A = ({ rows }) => <ol>{rows.map((row, i) => <li>{i}: {row}</li>)}</ol>;",
    );
    let unused = single(
        "export const A = ({ rows }) => <ol>{rows.map((row, i) => <li>{row}</li>)}</ol>;",
    );

    let index_of = |ir: &ComponentIr| {
        let mut index = None;
        walk(&ir.root.children, &mut |node| {
            if let GenNode::Loop(l) = node {
                index = Some(l.index.clone());
            }
        });
        index.expect("loop present")
    };
    assert_eq!(index_of(&used), Some("i".into()));
    assert_eq!(index_of(&unused), None);
}

#[test]
fn test_ternary_chain_is_flattened_in_order() {
    let ir = single(
        r#"
export function Status({ state }) {
  return (
    <p>
      {state === "error" ? <b>Failed</b> : state === "busy" ? <i>Working</i> : <span>Done</span>}
    </p>
  );
}
"#,
    );

    let GenNode::Element(p) = &ir.root.children[0] else {
        panic!("expected <p>");
    };
    let GenNode::Condition(cond) = &p.children[0] else {
        panic!("expected condition");
    };
    let predicates: Vec<String> = cond.branches.iter().map(|b| b.predicate.to_string()).collect();
    assert_eq!(predicates, vec![r#"state === "error""#, r#"state === "busy""#]);
    assert!(cond.otherwise.is_some());
}

#[test]
fn test_early_returns_fold_into_condition() {
    let ir = single(
        r#"
export function Gate(props) {
  if (!props.user) return <a href="/login">Sign in</a>;
  if (props.user.banned) return null;
  return <p>Welcome {props.user.name}</p>;
}
"#,
    );

    let GenNode::Condition(cond) = &ir.root.children[0] else {
        panic!("expected condition");
    };
    assert_eq!(cond.branches.len(), 2);
    assert_eq!(cond.branches[0].predicate.to_string(), "!user");
    assert_eq!(cond.branches[1].predicate.to_string(), "user.banned");
    assert!(cond.branches[1].body.is_empty());

    let otherwise = cond.otherwise.as_ref().expect("final return is the default");
    let GenNode::Element(p) = &otherwise[0] else {
        panic!("expected <p>");
    };
    let GenNode::Variable(var) = &p.children[1] else {
        panic!("expected variable");
    };
    assert_eq!(var.path, GenPath::parse("user.name"));
}

#[test]
fn test_else_if_early_returns_keep_every_branch() {
    let ir = single(
        r#"
export function Mark({ a, b }) {
  if (a) return <i>A</i>;
  else if (b) return <b>B</b>;
  return <u>none</u>;
}
"#,
    );

    let GenNode::Condition(cond) = &ir.root.children[0] else {
        panic!("expected condition");
    };
    let predicates: Vec<String> = cond.branches.iter().map(|b| b.predicate.to_string()).collect();
    assert_eq!(predicates, vec!["a", "b"]);
    let tags: Vec<&str> = cond
        .branches
        .iter()
        .map(|b| match &b.body[0] {
            GenNode::Element(el) => el.tag.as_str(),
            other => panic!("expected element, got {:?}", other.kind()),
        })
        .collect();
    assert_eq!(tags, vec!["i", "b"]);
    let Some([GenNode::Element(u)]) = cond.otherwise.as_deref() else {
        panic!("expected <u> default");
    };
    assert_eq!(u.tag, "u");
    assert!(ir.warnings.is_empty());

    let chained = single(
        r#"
export function Mark({ a, b }) {
  if (a) {
    return <i>A</i>;
  } else if (b) {
    return <b>B</b>;
  } else {
    return <u>none</u>;
  }
}
"#,
    );
    assert_eq!(annotate(&chained.root), annotate(&ir.root));
}

#[test]
fn test_unsupported_statements_warn() {
    let ir = single(
        r#"
export function Counter({ n }) {
  const doubled = n * 2;
  if (n > 9) {
    console.log(n);
  }
  return <p>{n}</p>;
}
"#,
    );

    assert_eq!(
        codes(&ir),
        vec![WarningCode::UnsupportedStatement, WarningCode::UnsupportedStatement]
    );
    assert_eq!(ir.warnings[0].location.line(), 3);
    assert_eq!(ir.warnings[1].location.line(), 4);
    let GenNode::Element(p) = &ir.root.children[0] else {
        panic!("expected <p>");
    };
    assert_eq!(p.tag, "p");
}

#[test]
fn test_variable_default_and_filter() {
    let ir = single(
        r#"
export const Price = ({ amount = 0, label }) => (
  <span title={label}>{filter(amount, "currency")} {label ?? "n/a"}</span>
);
"#,
    );

    let GenNode::Element(span) = &ir.root.children[0] else {
        panic!("expected <span>");
    };
    let Some(AttrValue::Variable(title)) = span.attrs.get("title") else {
        panic!("expected title variable");
    };
    assert_eq!(title.path, GenPath::parse("label"));

    let GenNode::Variable(amount) = &span.children[0] else {
        panic!("expected amount");
    };
    assert_eq!(amount.filter.as_deref(), Some("currency"));
    assert_eq!(amount.default, Some(Literal::Num(0.0)));

    let GenNode::Variable(label) = &span.children[2] else {
        panic!("expected label");
    };
    assert_eq!(label.default, Some(Literal::Str("n/a".into())));
}

#[test]
fn test_side_effect_predicate_degrades_to_first_branch() {
    let ir = single(
        r#"
export const Flag = ({ user }) => (
  <div>{isEnabled(user) ? <b>on</b> : <i>off</i>}</div>
);
"#,
    );

    assert_eq!(codes(&ir), vec![WarningCode::SideEffectPredicate]);
    let GenNode::Element(div) = &ir.root.children[0] else {
        panic!("expected <div>");
    };
    assert_eq!(count(&div.children, NodeKind::Condition), 0);
    let GenNode::Element(b) = &div.children[0] else {
        panic!("expected first branch body");
    };
    assert_eq!(b.tag, "b");
}

#[test]
fn test_markers() {
    let ir = single(
        r#"
export function Page({ posts }) {
  return (
    <Extends layout="base">
      <Block name="content">
        {posts.map((post) => <Include template="card" title={post.title} featured count={3} />)}
      </Block>
      <p>dropped</p>
      <Block name="sidebar">
        <Slot name="aside">Nothing here</Slot>
      </Block>
    </Extends>
  );
}
"#,
    );

    assert_eq!(codes(&ir), vec![WarningCode::DroppedContent]);
    let GenNode::Extends(ext) = &ir.root.children[0] else {
        panic!("expected extends");
    };
    assert_eq!(ext.layout, "base");
    let names: Vec<&str> = ext.blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["content", "sidebar"]);

    let GenNode::Loop(l) = &ext.blocks[0].body[0] else {
        panic!("expected loop");
    };
    let GenNode::Include(inc) = &l.body[0] else {
        panic!("expected include");
    };
    assert_eq!(inc.template, "card");
    let props: Vec<(&str, &PropValue)> = inc.props.iter().map(|(k, v)| (k.as_str(), v)).collect();
    assert_eq!(
        props,
        vec![
            ("title", &PropValue::Path(GenPath::parse("post.title"))),
            ("featured", &PropValue::Literal(Literal::Bool(true))),
            ("count", &PropValue::Literal(Literal::Num(3.0))),
        ]
    );

    let GenNode::Slot(slot) = &ext.blocks[1].body[0] else {
        panic!("expected slot");
    };
    assert_eq!(slot.name, "aside");
    assert!(slot.default.is_some());
}

#[test]
fn test_malformed_marker_passes_through() {
    let ir = single("export const A = () => <Include title=\"x\" />;");
    assert_eq!(codes(&ir), vec![WarningCode::MalformedMarker]);
    let GenNode::Element(el) = &ir.root.children[0] else {
        panic!("expected passthrough element");
    };
    assert_eq!(el.tag, "Include");
    assert_eq!(el.component.as_deref(), Some("Include"));
}

#[test]
fn test_attributes() {
    let ir = single(
        r#"
export const Field = ({ id }) => (
  <label htmlFor={id} className="field" style={{ fontSize: 12, color: "red", opacity: 0.5 }}
         onClick={() => alert(1)} data-x={1} hidden={false} required
         aria-hidden={true} data-open={false} disabled={true}>
    Name
  </label>
);
"#,
    );

    let GenNode::Element(label) = &ir.root.children[0] else {
        panic!("expected <label>");
    };
    let names: Vec<&str> = label.attrs.keys().map(|k| k.as_str()).collect();
    assert_eq!(
        names,
        vec!["for", "class", "style", "data-x", "required", "aria-hidden", "data-open", "disabled"]
    );
    assert_eq!(
        label.attrs.get("style"),
        Some(&AttrValue::Literal("font-size: 12px; color: red; opacity: 0.5".into()))
    );
    assert_eq!(label.attrs.get("required"), Some(&AttrValue::Flag));
    assert_eq!(label.attrs.get("disabled"), Some(&AttrValue::Flag));
    assert_eq!(label.attrs.get("aria-hidden"), Some(&AttrValue::Literal("true".into())));
    assert_eq!(label.attrs.get("data-open"), Some(&AttrValue::Literal("false".into())));
    assert!(ir.warnings.is_empty());
}

#[test]
fn test_whitespace_and_entities() {
    let ir = single(
        r#"
export const T = ({ n }) => (
  <p>
    Total:&nbsp;{n}
    items &amp; more
  </p>
);
"#,
    );

    let GenNode::Element(p) = &ir.root.children[0] else {
        panic!("expected <p>");
    };
    let GenNode::Text(first) = &p.children[0] else {
        panic!("expected text");
    };
    assert_eq!(first.text, "Total:\u{a0}");
    let GenNode::Text(last) = &p.children[2] else {
        panic!("expected text");
    };
    assert_eq!(last.text, "items & more");
}

#[test]
fn test_unrecognized_expression_is_kept_as_text() {
    let ir = single("export const A = ({ xs }) => <p>{xs.join(\", \")}</p>;");
    assert_eq!(codes(&ir), vec![WarningCode::UnrecognizedExpression]);
    let GenNode::Element(p) = &ir.root.children[0] else {
        panic!("expected <p>");
    };
    let GenNode::Text(text) = &p.children[0] else {
        panic!("expected text");
    };
    assert_eq!(text.text, "xs.join(\", \")");
}

#[test]
fn test_multiple_components_are_independent() {
    let components = build(
        r#"
export function A() { return <a />; }
export const B = () => <b />;
"#,
    );
    let names: Vec<&str> = components.iter().map(|c| c.root.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_no_components_warning() {
    let output = analyze_source("util.ts", "export const x = 1;").unwrap();
    assert!(output.components.is_empty());
    assert_eq!(output.warnings[0].code, WarningCode::NoComponents);
}

#[test]
fn test_predicate_shapes() {
    let ir = single(
        "export const A = ({ items, user }) => <div>{items.length > 0 && !(user.admin || user.owner) && <b />}</div>;",
    );
    let mut predicate = None;
    walk(&ir.root.children, &mut |node| {
        if let GenNode::Condition(c) = node {
            predicate = Some(c.branches[0].predicate.clone());
        }
    });
    let predicate: GenExpr = predicate.expect("condition present");
    assert_eq!(predicate.to_string(), "items.length > 0 && !(user.admin || user.owner)");
}

#[test]
fn test_annotation_output() {
    let ir = single(
        r#"export const L = ({ items }) => <ul>{items.map((item) => <li key={item.id}>{item.name}</li>)}</ul>;"#,
    );
    insta::assert_snapshot!(
        annotate(&ir.root).trim_end(),
        @r#"<template data-gen-component="L"><ul><template data-gen-loop="item:items" data-gen-key="item.id"><li><template data-gen-var="item.name"></template></li></template></ul></template>"#
    );
}
