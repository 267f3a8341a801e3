use pretty_assertions::assert_eq;
use tplgen_analyzer::analyze_source;
use tplgen_backends::{
    emit, Backend, BackendRegistry, Handlebars, Jinja, Liquid, Native, Twig,
};
use tplgen_ir::{annotate, GenRoot, NodeKind};

fn root(source: &str) -> GenRoot {
    let mut output = analyze_source("src/Component.tsx", source).expect("source parses");
    assert_eq!(output.components.len(), 1, "expected exactly one component");
    output.components.remove(0).root
}

fn render(root: &GenRoot, backend: &dyn Backend) -> String {
    emit(root, backend).expect("backend supports component").code
}

const LIST: &str = r#"
export function ProductList({ items, title }) {
  return (
    <section>
      <h2>{title}</h2>
      <ul>
        {items.map((item) => (
          <li key={item.id}>{item.name}</li>
        ))}
      </ul>
    </section>
  );
}
"#;

const STATUS: &str = r#"
export function Status({ state }) {
  return (
    <p>
      {state === "error" ? <b>Failed</b> : state === "busy" ? <i>Working</i> : <span>Idle</span>}
    </p>
  );
}
"#;

const PRICE: &str = r#"
export function Price({ amount }) {
  return <span className="price">{filter(amount ?? 0, "currency")}</span>;
}
"#;

const PAGE: &str = r#"
export function Page() {
  return (
    <Extends layout="base">
      <Block name="content"><p>Hi</p></Block>
    </Extends>
  );
}
"#;

#[test]
fn test_jinja_list() {
    let ir = root(LIST);
    insta::assert_snapshot!(render(&ir, &Jinja).trim_end(), @r###"
    <section>
      <h2>{{ title }}</h2>
      <ul>
        {% for item in items %}
          <li>{{ item.name }}</li>
        {% endfor %}
      </ul>
    </section>
    "###);
}

#[test]
fn test_twig_list() {
    let ir = root(LIST);
    insta::assert_snapshot!(render(&ir, &Twig).trim_end(), @r###"
    <section>
      <h2>{{ title }}</h2>
      <ul>
        {% for item in items %}
          <li>{{ item.name }}</li>
        {% endfor %}
      </ul>
    </section>
    "###);
}

#[test]
fn test_handlebars_list() {
    let ir = root(LIST);
    insta::assert_snapshot!(render(&ir, &Handlebars).trim_end(), @r###"
    <section>
      <h2>{{title}}</h2>
      <ul>
        {{#each items as |item|}}
          <li>{{item.name}}</li>
        {{/each}}
      </ul>
    </section>
    "###);
}

#[test]
fn test_liquid_list() {
    let ir = root(LIST);
    insta::assert_snapshot!(render(&ir, &Liquid).trim_end(), @r###"
    <section>
      <h2>{{ title | escape }}</h2>
      <ul>
        {% for item in items %}
          <li>{{ item.name | escape }}</li>
        {% endfor %}
      </ul>
    </section>
    "###);
}

#[test]
fn test_native_list() {
    let ir = root(LIST);
    insta::assert_snapshot!(render(&ir, &Native).trim_end(), @r###"
    export function ProductList(props) {
      return (
        <section>
          <h2>{props.title}</h2>
          <ul>
            {props.items.map((item) => <li key={item.id}>{item.name}</li>)}
          </ul>
        </section>
      );
    }
    "###);
}

#[test]
fn test_loop_body_appears_once() {
    let ir = root(
        r#"
export function Ids({ items }) {
  return <div>{items.map((item) => <span>{item.id}</span>)}</div>;
}
"#,
    );
    let code = render(&ir, &Jinja);
    assert_eq!(code.matches("{% for item in items %}").count(), 1);
    assert_eq!(code.matches("<span>{{ item.id }}</span>").count(), 1);
}

#[test]
fn test_conditional_ordering() {
    let ir = root(STATUS);
    insta::assert_snapshot!(render(&ir, &Jinja).trim_end(), @r###"
    <p>
      {% if state == "error" %}
        <b>Failed</b>
      {% elif state == "busy" %}
        <i>Working</i>
      {% else %}
        <span>Idle</span>
      {% endif %}
    </p>
    "###);

    let registry = BackendRegistry::with_builtins();
    for id in registry.ids() {
        let backend = registry.get(id).unwrap();
        let code = render(&ir, backend.as_ref());
        let error = code.find("error").unwrap();
        let busy = code.find("busy").unwrap();
        let idle = code.find("Idle").unwrap();
        assert!(error < busy && busy < idle, "{}: branches out of order", id);
    }
}

#[test]
fn test_currency_filter() {
    let ir = root(PRICE);
    assert_eq!(
        render(&ir, &Jinja),
        "<span class=\"price\">{{ \"${:,.2f}\".format(amount|default(0)) }}</span>\n"
    );
    assert_eq!(
        render(&ir, &Twig),
        "<span class=\"price\">{{ ('$' ~ (amount ?? 0)|number_format(2)) }}</span>\n"
    );
    assert_eq!(
        render(&ir, &Handlebars),
        "<span class=\"price\">{{currency (default amount 0)}}</span>\n"
    );
    assert_eq!(
        render(&ir, &Liquid),
        "<span class=\"price\">{{ amount | default: 0 | money | escape }}</span>\n"
    );
    insta::assert_snapshot!(render(&ir, &Native).trim_end(), @r###"
    import { filter } from "tplgen/runtime";

    export function Price(props) {
      return (
        <span className="price">{filter(props.amount ?? 0, "currency")}</span>
      );
    }
    "###);
}

#[test]
fn test_inheritance() {
    let ir = root(PAGE);
    insta::assert_snapshot!(render(&ir, &Jinja).trim_end(), @r###"
    {% extends "base.jinja" %}
    {% block content %}
      <p>Hi</p>
    {% endblock %}
    "###);
    insta::assert_snapshot!(render(&ir, &Native).trim_end(), @r###"
    import { Block, Extends } from "tplgen/runtime";

    export function Page(props) {
      return (
        <Extends layout="base">
          <Block name="content">
            <p>Hi</p>
          </Block>
        </Extends>
      );
    }
    "###);
}

#[test]
fn test_unsupported_backend_is_isolated() {
    let ir = root(PAGE);

    for backend in [&Handlebars as &dyn Backend, &Liquid] {
        let err = emit(&ir, backend).unwrap_err();
        assert_eq!(err.node_kind, NodeKind::Extends);
        assert_eq!(err.backend, backend.id());
        assert_eq!(err.code(), "unsupported-feature");
    }

    let jinja = emit(&ir, &Jinja).unwrap();
    assert_eq!(jinja.file_name, "Page.jinja");
    assert!(emit(&ir, &Twig).is_ok());
}

#[test]
fn test_liquid_rejects_grouped_predicate() {
    let ir = root(
        r#"
export function Badge({ a, b, c }) {
  return <div>{a && b || c ? <em>yes</em> : null}</div>;
}
"#,
    );
    let err = emit(&ir, &Liquid).unwrap_err();
    assert_eq!(err.node_kind, NodeKind::Condition);
    assert_eq!(
        render(&ir, &Jinja),
        "<div>\n  {% if a and b or c %}\n    <em>yes</em>\n  {% endif %}\n</div>\n"
    );
}

#[test]
fn test_text_is_protected_from_delimiters() {
    let ir = root(r#"export const Doc = () => <code>{"{{ name }}"}</code>;"#);
    assert_eq!(
        render(&ir, &Jinja),
        "<code>{% raw %}{{ name }}{% endraw %}</code>\n"
    );
    assert_eq!(render(&ir, &Handlebars), "<code>\\{{ name }}</code>\n");
}

#[test]
fn test_text_next_to_variables_stays_literal() {
    let braces = root(r#"export const Braces = ({ name }) => <p>{"{"}{name}{"}"}</p>;"#);
    insta::assert_snapshot!(render(&braces, &Jinja).trim_end(), @"<p>&#123;{{ name }}&#125;</p>");
    insta::assert_snapshot!(render(&braces, &Twig).trim_end(), @"<p>&#123;{{ name }}&#125;</p>");
    insta::assert_snapshot!(render(&braces, &Handlebars).trim_end(), @"<p>&#123;{{name}}&#125;</p>");
    insta::assert_snapshot!(
        render(&braces, &Liquid).trim_end(),
        @"<p>&#123;{{ name | escape }}&#125;</p>"
    );

    let backslash = root(r#"export const Dir = ({ dir }) => <p>C:\{dir}</p>;"#);
    insta::assert_snapshot!(render(&backslash, &Handlebars).trim_end(), @"<p>C:&#92;{{dir}}</p>");
    insta::assert_snapshot!(render(&backslash, &Jinja).trim_end(), @r"<p>C:\{{ dir }}</p>");

    let escaped = root(r#"export const Doc = () => <code>{"\\{{ x }}"}</code>;"#);
    insta::assert_snapshot!(render(&escaped, &Handlebars).trim_end(), @r"<code>&#92;\{{ x }}</code>");
}

#[test]
fn test_else_if_early_returns_keep_order() {
    let ir = root(
        r#"
export function Mark({ a, b }) {
  if (a) return <i>first</i>;
  else if (b) return <b>second</b>;
  return <u>third</u>;
}
"#,
    );
    let jinja = render(&ir, &Jinja);
    assert!(jinja.contains("{% elif b %}"), "{jinja}");

    let registry = BackendRegistry::with_builtins();
    for id in registry.ids() {
        let backend = registry.get(id).unwrap();
        let code = render(&ir, backend.as_ref());
        let first = code.find("first").unwrap();
        let second = code.find("second").unwrap();
        let third = code.find("third").unwrap();
        assert!(first < second && second < third, "{}: {}", id, code);
    }
}

#[test]
fn test_handlebars_root_paths_in_loops() {
    let ir = root(
        r#"
export function Menu({ links, active }) {
  return <nav>{links.map((link) => <a href={link.url}>{active}</a>)}</nav>;
}
"#,
    );
    assert_eq!(
        render(&ir, &Handlebars),
        "<nav>\n  {{#each links as |link|}}\n    <a href=\"{{link.url}}\">{{@root.active}}</a>\n  {{/each}}\n</nav>\n"
    );
}

#[test]
fn test_emission_is_deterministic() {
    let ir = root(LIST);
    let registry = BackendRegistry::with_builtins();
    for id in registry.ids() {
        let backend = registry.get(id).unwrap();
        let first = emit(&ir, backend.as_ref()).unwrap();
        let second = emit(&ir, backend.as_ref()).unwrap();
        assert_eq!(first.code, second.code, "{}", id);
        assert_eq!(first.source_map, second.source_map, "{}", id);
    }
}

#[test]
fn test_variables_are_source_mapped() {
    let ir = root(LIST);
    let out = emit(&ir, &Jinja).unwrap();
    let generated = out.code.find("item.name").unwrap() as u32;
    assert!(out.source_map.find_source(generated).is_some());
}

#[test]
fn test_native_output_reparses_to_same_ir() {
    for source in [
        LIST,
        STATUS,
        PRICE,
        PAGE,
        r#"
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
"#,
    ] {
        let original = root(source);
        let native = render(&original, &Native);
        let reparsed = root(&native);
        assert_eq!(annotate(&reparsed), annotate(&original), "{}", native);
    }
}
