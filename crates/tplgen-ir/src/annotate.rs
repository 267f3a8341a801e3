//! Annotation protocol writer.
//!
//! Serializes an IR tree as plain markup where every template construct is a
//! `<template>` element carrying reserved `data-gen-*` attributes. Used to
//! inspect the IR (`tplgen --emit-ir`).

use crate::expr::Literal;
use crate::html::{escape_attr, escape_text, is_void_element};
use crate::nodes::*;

/// Serialize a component's IR in the annotation protocol.
pub fn annotate(root: &GenRoot) -> String {
    let mut out = String::new();
    out.push_str("<template data-gen-component=\"");
    out.push_str(&escape_attr(&root.name));
    out.push_str("\">");
    write_nodes(&mut out, &root.children);
    out.push_str("</template>\n");
    out
}

fn write_nodes(out: &mut String, nodes: &[GenNode]) {
    for node in nodes {
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &GenNode) {
    match node {
        GenNode::Element(el) => write_element(out, el),
        GenNode::Text(text) => out.push_str(&escape_text(&text.text)),
        GenNode::Loop(l) => {
            let mut attrs = vec![("data-gen-loop", format!("{}:{}", l.item, l.iterable))];
            if let Some(key) = &l.key {
                attrs.push(("data-gen-key", key.to_string()));
            }
            if let Some(index) = &l.index {
                attrs.push(("data-gen-index", index.to_string()));
            }
            write_template(out, &attrs, &l.body);
        }
        GenNode::Condition(c) => {
            for (i, branch) in c.branches.iter().enumerate() {
                let marker = if i == 0 { "data-gen-if" } else { "data-gen-elseif" };
                write_template(out, &[(marker, branch.predicate.to_string())], &branch.body);
            }
            if let Some(otherwise) = &c.otherwise {
                out.push_str("<template data-gen-else>");
                write_nodes(out, otherwise);
                out.push_str("</template>");
            }
        }
        GenNode::Variable(var) => write_template(out, &variable_attrs(var), &[]),
        GenNode::Slot(slot) => write_template(
            out,
            &[("data-gen-slot", slot.name.to_string())],
            slot.default.as_deref().unwrap_or(&[]),
        ),
        GenNode::Include(inc) => write_template(
            out,
            &[
                ("data-gen-include", inc.template.to_string()),
                ("data-gen-props", props_json(inc)),
            ],
            &[],
        ),
        GenNode::Block(block) => write_block(out, block),
        GenNode::Extends(ext) => {
            out.push_str("<template data-gen-extends=\"");
            out.push_str(&escape_attr(&ext.layout));
            out.push_str("\">");
            for block in &ext.blocks {
                write_block(out, block);
            }
            out.push_str("</template>");
        }
    }
}

fn write_block(out: &mut String, block: &GenBlock) {
    write_template(out, &[("data-gen-block", block.name.to_string())], &block.body);
}

fn write_template(out: &mut String, attrs: &[(&str, String)], body: &[GenNode]) {
    out.push_str("<template");
    for (name, value) in attrs {
        push_attr(out, name, value);
    }
    out.push('>');
    write_nodes(out, body);
    out.push_str("</template>");
}

fn write_element(out: &mut String, el: &GenElement) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        match value {
            AttrValue::Literal(text) => push_attr(out, name, text),
            AttrValue::Flag => {
                out.push(' ');
                out.push_str(name);
            }
            AttrValue::Variable(var) => {
                for (marker, value) in variable_attrs(var) {
                    push_attr(out, &format!("{}:{}", marker, name), &value);
                }
            }
        }
    }
    if el.children.is_empty() && is_void_element(&el.tag) {
        out.push('>');
        return;
    }
    out.push('>');
    write_nodes(out, &el.children);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn variable_attrs(var: &GenVariable) -> Vec<(&'static str, String)> {
    let mut attrs = vec![("data-gen-var", var.path.to_string())];
    if let Some(default) = &var.default {
        attrs.push(("data-gen-default", default.to_json().to_string()));
    }
    if let Some(filter) = &var.filter {
        attrs.push(("data-gen-filter", filter.to_string()));
    }
    if var.raw {
        attrs.push(("data-gen-raw", "true".to_string()));
    }
    attrs
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Prop bindings as a JSON object in source order: paths as `{"path": "..."}`,
/// literals as themselves.
pub fn props_json(inc: &GenInclude) -> String {
    let entries: Vec<String> = inc
        .props
        .iter()
        .map(|(name, value)| {
            let value = match value {
                PropValue::Path(path) => serde_json::json!({ "path": path.to_string() }),
                PropValue::Literal(Literal::Null) => serde_json::Value::Null,
                PropValue::Literal(lit) => lit.to_json(),
            };
            format!("{}:{}", serde_json::Value::String(name.to_string()), value)
        })
        .collect();
    format!("{{{}}}", entries.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CompareOp, GenExpr, GenPath};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use source_map::Location;

    fn loc() -> Location {
        Location::default()
    }

    fn var(path: &str) -> GenNode {
        GenNode::Variable(GenVariable::new(GenPath::parse(path), loc()))
    }

    #[test]
    fn test_annotate_loop_and_condition() {
        let root = GenRoot {
            name: "List".into(),
            children: vec![
                GenNode::Loop(GenLoop {
                    iterable: GenPath::parse("items"),
                    item: "item".into(),
                    key: Some(GenPath::parse("item.id")),
                    index: None,
                    body: vec![var("item.name")],
                    location: loc(),
                }),
                GenNode::Condition(GenCondition {
                    branches: vec![GenBranch {
                        predicate: GenExpr::compare(
                            CompareOp::Gt,
                            GenExpr::Path(GenPath::parse("items.length")),
                            GenExpr::Literal(Literal::Num(0.0)),
                        ),
                        body: vec![GenNode::Text(GenText {
                            text: "some".into(),
                            location: loc(),
                        })],
                        location: loc(),
                    }],
                    otherwise: Some(vec![]),
                    location: loc(),
                }),
            ],
            location: loc(),
        };

        assert_eq!(
            annotate(&root),
            concat!(
                r#"<template data-gen-component="List">"#,
                r#"<template data-gen-loop="item:items" data-gen-key="item.id">"#,
                r#"<template data-gen-var="item.name"></template></template>"#,
                r#"<template data-gen-if="items.length > 0">some</template>"#,
                r#"<template data-gen-else></template>"#,
                "</template>\n",
            )
        );
    }

    #[test]
    fn test_props_json_keeps_order() {
        let mut props = IndexMap::new();
        props.insert("title".into(), PropValue::Path(GenPath::parse("item.title")));
        props.insert("count".into(), PropValue::Literal(Literal::Num(3.0)));
        let inc = GenInclude {
            template: "card".into(),
            props,
            location: loc(),
        };
        assert_eq!(props_json(&inc), r#"{"title":{"path":"item.title"},"count":3}"#);
    }
}
