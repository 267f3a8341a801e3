//! IR evaluation.

use crate::error::{PreviewError, PreviewResult};
use crate::filters;
use crate::value::{compare, get_path, is_nullish, literal, to_string, truthy};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use source_map::Location;
use tplgen_ir::html::{escape_attr, escape_text, is_void_element};
use tplgen_ir::{
    AttrValue, GenElement, GenExpr, GenNode, GenPath, GenRoot, GenVariable, PathSegment, PropValue,
};

/// How deep includes and layouts may nest.
pub const MAX_DEPTH: usize = 32;

/// Named components that includes and layouts resolve against.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: IndexMap<SmolStr, GenRoot>,
}

impl TemplateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component under a template name (`card`, `layouts/base`).
    pub fn insert(&mut self, name: impl Into<SmolStr>, root: GenRoot) {
        self.templates.insert(name.into(), root);
    }

    /// Get a template by name.
    pub fn get(&self, name: &str) -> Option<&GenRoot> {
        self.templates.get(name)
    }

    /// Template names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Renders components to HTML with host-runtime semantics.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    templates: &'a TemplateSet,
}

impl<'a> Renderer<'a> {
    /// Create a renderer resolving includes and layouts in `templates`.
    pub fn new(templates: &'a TemplateSet) -> Self {
        Self { templates }
    }

    /// Render a component against `data`.
    pub fn render(&self, root: &'a GenRoot, data: &Value) -> PreviewResult<String> {
        let _span = tracing::debug_span!("preview", component = %root.name).entered();
        let mut frame = Frame {
            templates: self.templates,
            data,
            scope: Vec::new(),
            overrides: FxHashMap::default(),
            depth: 0,
            out: String::new(),
        };
        frame.nodes(&root.children)?;
        Ok(frame.out)
    }
}

/// Render a component that neither includes nor extends other templates.
pub fn render(root: &GenRoot, data: &Value) -> PreviewResult<String> {
    let templates = TemplateSet::new();
    Renderer::new(&templates).render(root, data)
}

/// One component being rendered against one data object.
struct Frame<'a, 'd> {
    templates: &'a TemplateSet,
    data: &'d Value,
    /// Loop bindings, innermost last.
    scope: Vec<(SmolStr, Value)>,
    /// Block bodies supplied by extending components.
    overrides: FxHashMap<SmolStr, &'a [GenNode]>,
    depth: usize,
    out: String,
}

impl<'a, 'd> Frame<'a, 'd> {
    fn lookup(&self, path: &GenPath) -> Option<Value> {
        if let Some(PathSegment::Key(root)) = path.segments.first() {
            if let Some((_, value)) = self.scope.iter().rev().find(|(name, _)| name == root) {
                return get_path(Some(value), &path.segments[1..]);
            }
        }
        get_path(Some(self.data), &path.segments)
    }

    fn eval(&self, expr: &GenExpr) -> Option<Value> {
        match expr {
            GenExpr::Path(path) => self.lookup(path),
            GenExpr::Literal(lit) => Some(literal(lit)),
            GenExpr::Not(inner) => Some(Value::Bool(!truthy(self.eval(inner).as_ref()))),
            GenExpr::And(l, r) => {
                let left = self.eval(l);
                if truthy(left.as_ref()) {
                    self.eval(r)
                } else {
                    left
                }
            }
            GenExpr::Or(l, r) => {
                let left = self.eval(l);
                if truthy(left.as_ref()) {
                    left
                } else {
                    self.eval(r)
                }
            }
            GenExpr::Compare { op, left, right } => Some(Value::Bool(compare(
                *op,
                self.eval(left).as_ref(),
                self.eval(right).as_ref(),
            ))),
        }
    }

    /// Value of a variable after its default and filter.
    fn resolve(&self, var: &GenVariable) -> PreviewResult<Option<Value>> {
        let mut value = self.lookup(&var.path);
        if let Some(default) = &var.default {
            if is_nullish(value.as_ref()) {
                value = Some(literal(default));
            }
        }
        if let Some(filter) = &var.filter {
            let text = filters::apply(filter, value.as_ref()).ok_or_else(|| {
                PreviewError::UnknownFilter {
                    name: filter.clone(),
                    location: var.location.clone(),
                }
            })?;
            value = Some(Value::String(text));
        }
        Ok(value)
    }

    fn nodes(&mut self, nodes: &'a [GenNode]) -> PreviewResult<()> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &'a GenNode) -> PreviewResult<()> {
        match node {
            GenNode::Element(el) => self.element(el)?,
            GenNode::Text(text) => self.out.push_str(&escape_text(&text.text)),
            GenNode::Loop(l) => {
                let items = match self.lookup(&l.iterable) {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(PreviewError::NotIterable {
                            path: l.iterable.to_string(),
                            location: l.location.clone(),
                        })
                    }
                };
                let marker = self.scope.len();
                for (i, item) in items.into_iter().enumerate() {
                    self.scope.push((l.item.clone(), item));
                    if let Some(index) = &l.index {
                        self.scope.push((index.clone(), Value::from(i)));
                    }
                    self.nodes(&l.body)?;
                    self.scope.truncate(marker);
                }
            }
            GenNode::Condition(cond) => {
                let taken = cond
                    .branches
                    .iter()
                    .find(|branch| truthy(self.eval(&branch.predicate).as_ref()))
                    .map(|branch| branch.body.as_slice())
                    .or(cond.otherwise.as_deref());
                if let Some(body) = taken {
                    self.nodes(body)?;
                }
            }
            GenNode::Variable(var) => {
                let value = self.resolve(var)?;
                let text = value
                    .as_ref()
                    .map(child_text)
                    .unwrap_or(Some(String::new()))
                    .ok_or_else(|| PreviewError::ObjectChild {
                        path: var.path.to_string(),
                        location: var.location.clone(),
                    })?;
                if var.raw {
                    self.out.push_str(&text);
                } else {
                    self.out.push_str(&escape_text(&text));
                }
            }
            GenNode::Slot(slot) => {
                let path = GenPath::new(vec![
                    PathSegment::Key("slots".into()),
                    PathSegment::Key(slot.name.clone()),
                ]);
                let value = self.lookup(&path);
                if truthy(value.as_ref()) {
                    self.out.push_str(&to_string(value.as_ref()));
                } else if let Some(default) = &slot.default {
                    self.nodes(default)?;
                }
            }
            GenNode::Include(inc) => {
                let root = self.template(&inc.template, &inc.location)?;
                let mut props = Map::new();
                for (name, value) in &inc.props {
                    let value = match value {
                        PropValue::Literal(lit) => Some(literal(lit)),
                        PropValue::Path(path) => self.lookup(path),
                    };
                    if let Some(value) = value {
                        props.insert(name.to_string(), value);
                    }
                }
                tracing::debug!(template = %inc.template, "include");
                let data = Value::Object(props);
                self.nested(root, &data, FxHashMap::default(), &inc.location)?;
            }
            GenNode::Block(block) => match self.overrides.get(&block.name).copied() {
                Some(body) => self.nodes(body)?,
                None => self.nodes(&block.body)?,
            },
            GenNode::Extends(ext) => {
                let layout = self.template(&ext.layout, &ext.location)?;
                let mut overrides: FxHashMap<SmolStr, &'a [GenNode]> = ext
                    .blocks
                    .iter()
                    .map(|block| (block.name.clone(), block.body.as_slice()))
                    .collect();
                // The most derived component wins.
                overrides.extend(self.overrides.iter().map(|(k, v)| (k.clone(), *v)));
                tracing::debug!(layout = %ext.layout, blocks = overrides.len(), "extends");
                let data = self.data;
                self.nested(layout, data, overrides, &ext.location)?;
            }
        }
        Ok(())
    }

    fn element(&mut self, el: &'a GenElement) -> PreviewResult<()> {
        self.out.push('<');
        self.out.push_str(&el.tag);
        for (name, value) in &el.attrs {
            let text = match value {
                AttrValue::Flag => None,
                AttrValue::Literal(text) => Some(text.clone()),
                AttrValue::Variable(var) => match self.resolve(var)? {
                    None | Some(Value::Null) | Some(Value::Bool(false)) => continue,
                    Some(Value::Bool(true)) => None,
                    Some(value) => Some(to_string(Some(&value))),
                },
            };
            self.out.push(' ');
            self.out.push_str(name);
            if let Some(text) = text {
                self.out.push_str("=\"");
                self.out.push_str(&escape_attr(&text));
                self.out.push('"');
            }
        }
        self.out.push('>');

        if is_void_element(&el.tag) && el.children.is_empty() {
            return Ok(());
        }
        self.nodes(&el.children)?;
        self.out.push_str("</");
        self.out.push_str(&el.tag);
        self.out.push('>');
        Ok(())
    }

    fn template(&self, name: &str, location: &Location) -> PreviewResult<&'a GenRoot> {
        self.templates
            .get(name)
            .ok_or_else(|| PreviewError::UnknownTemplate {
                name: name.into(),
                location: location.clone(),
            })
    }

    /// Render another component in place, with its own data and no loop bindings.
    fn nested(
        &mut self,
        root: &'a GenRoot,
        data: &Value,
        overrides: FxHashMap<SmolStr, &'a [GenNode]>,
        location: &Location,
    ) -> PreviewResult<()> {
        if self.depth + 1 > MAX_DEPTH {
            return Err(PreviewError::RecursionLimit {
                limit: MAX_DEPTH,
                location: location.clone(),
            });
        }
        let mut frame = Frame {
            templates: self.templates,
            data,
            scope: Vec::new(),
            overrides,
            depth: self.depth + 1,
            out: String::new(),
        };
        frame.nodes(&root.children)?;
        self.out.push_str(&frame.out);
        Ok(())
    }
}

/// Text of a value in child position: `null` and booleans render nothing,
/// arrays render each item. Objects cannot be rendered.
fn child_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(_) => Some(String::new()),
        Value::Number(_) | Value::String(_) => Some(to_string(Some(value))),
        Value::Array(items) => items.iter().map(child_text).collect(),
        Value::Object(_) => None,
    }
}
