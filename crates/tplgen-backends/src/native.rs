//! Host-runtime backend.
//!
//! Re-emits the component as TSX against the runtime helpers (`Slot`,
//! `Include`, `Block`, `Extends`, `filter`, `raw`), reading data through a
//! `props` parameter. Parsing the output again yields the same IR, which is
//! what the preview round-trip relies on.

use crate::backend::{Backend, Features};
use crate::context::EmitContext;
use crate::error::EmitResult;
use crate::syntax::{InfixSyntax, PathSyntax};
use tplgen_ir::html::{camelize, hyphenate, jsx_attr_name};
use tplgen_ir::{
    quote, walk, AttrValue, CompareOp, GenBlock, GenCondition, GenElement, GenExpr, GenExtends,
    GenInclude, GenLoop, GenNode, GenPath, GenRoot, GenSlot, GenText, GenVariable, Literal,
    PropValue,
};

/// Module the runtime helpers are imported from.
pub const RUNTIME_MODULE: &str = "tplgen/runtime";

/// The native TSX backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

const FILTERS: &[(&str, &str)] = &[
    ("currency", "filter({value}, \"currency\")"),
    ("upper", "filter({value}, \"upper\")"),
    ("lower", "filter({value}, \"lower\")"),
    ("capitalize", "filter({value}, \"capitalize\")"),
    ("trim", "filter({value}, \"trim\")"),
    ("json", "filter({value}, \"json\")"),
];

const EXPR: InfixSyntax = InfixSyntax {
    and: " && ",
    or: " || ",
    not: "!",
    null: "null",
    quote: '"',
    compare: CompareOp::js_symbol,
};

fn index(i: u32) -> String {
    format!("[{}]", i)
}

fn quoted_key(key: &str) -> String {
    format!("[{}]", quote(key, '"'))
}

const PATH: PathSyntax = PathSyntax {
    index,
    quoted_key,
    length: ".length",
};

/// Text that JSX would trim, decode or parse is written as a string expression.
fn needs_string(text: &str) -> bool {
    text.contains(['{', '}', '<', '>', '&', '\n', '\r'])
}

/// Literal attribute values JSX would decode or cannot hold.
fn needs_string_attr(value: &str) -> bool {
    value.contains(['"', '&'])
}

/// Convert CSS text back to a style object, if it round-trips.
fn style_object(css: &str) -> Option<String> {
    let mut entries = Vec::new();
    let mut rebuilt = Vec::new();
    for decl in css.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let (property, value) = decl.split_once(':')?;
        let (property, value) = (property.trim(), value.trim());
        let key = camelize(property);
        let key = if !property.starts_with('-') && hyphenate(&key) == property {
            key
        } else {
            quote(property, '"')
        };
        entries.push(format!("{}: {}", key, quote(value, '"')));
        rebuilt.push(format!("{}: {}", property, value));
    }
    (rebuilt.join("; ") == css).then(|| format!("{{{{ {} }}}}", entries.join(", ")))
}

/// Runtime helpers a component needs, sorted.
fn runtime_imports(root: &GenRoot) -> Vec<&'static str> {
    let mut names = Vec::new();
    walk(&root.children, &mut |node| {
        let name = match node {
            GenNode::Slot(_) => "Slot",
            GenNode::Include(_) => "Include",
            GenNode::Block(_) => "Block",
            GenNode::Extends(ext) => {
                if !ext.blocks.is_empty() {
                    names.push("Block");
                }
                "Extends"
            }
            GenNode::Loop(l) if l.key.is_some() && !matches!(l.body.as_slice(), [GenNode::Element(_)]) => {
                "Fragment"
            }
            _ => return,
        };
        names.push(name);
    });
    walk(&root.children, &mut |node| {
        let mut vars: Vec<&GenVariable> = Vec::new();
        match node {
            GenNode::Variable(var) => vars.push(var),
            GenNode::Element(el) => vars.extend(el.attrs.values().filter_map(|v| match v {
                AttrValue::Variable(var) => Some(var),
                _ => None,
            })),
            _ => {}
        }
        for var in vars {
            if var.filter.is_some() {
                names.push("filter");
            }
            if var.raw {
                names.push("raw");
            }
        }
    });
    names.sort_unstable_by_key(|name| name.to_ascii_lowercase());
    names.dedup();
    names
}

/// Whether a node renders as a single JSX element.
fn is_element_like(node: &GenNode) -> bool {
    matches!(
        node,
        GenNode::Element(_)
            | GenNode::Slot(_)
            | GenNode::Include(_)
            | GenNode::Block(_)
            | GenNode::Extends(_)
    )
}

impl Native {
    fn path(&self, path: &GenPath, ctx: &EmitContext) -> String {
        let spelled = PATH.spell(path);
        if ctx.is_local(path) {
            spelled
        } else if spelled.starts_with('[') {
            format!("props{}", spelled)
        } else {
            format!("props.{}", spelled)
        }
    }

    fn literal(&self, lit: &Literal) -> String {
        EXPR.literal(lit)
    }

    fn predicate(&self, expr: &GenExpr, ctx: &EmitContext) -> String {
        EXPR.expr(expr, &|p: &GenPath| self.path(p, ctx))
    }

    fn value(&self, var: &GenVariable, ctx: &EmitContext) -> String {
        let mut value = self.path(&var.path, ctx);
        if let Some(default) = &var.default {
            value = format!("{} ?? {}", value, self.literal(default));
        }
        if let Some(filter) = &var.filter {
            value = format!("filter({}, {})", value, quote(filter, '"'));
        }
        if var.raw {
            value = format!("raw({})", value);
        }
        value
    }

    /// A child list in expression position: one element, `null` or a fragment.
    fn render_body(&self, nodes: &[GenNode], ctx: &mut EmitContext) -> EmitResult {
        match nodes {
            [] => ctx.push_str("null"),
            [node] if is_element_like(node) => self.render(node, ctx)?,
            _ => {
                ctx.push_str("<>");
                self.render_children(nodes, ctx)?;
                ctx.push_str("</>");
            }
        }
        Ok(())
    }

    fn element(&self, el: &GenElement, key: Option<&GenPath>, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("<");
        ctx.push_mapped(&el.tag, &el.location);
        if let Some(key) = key {
            let key = self.path(key, ctx);
            ctx.push_str(" key={");
            ctx.push_str(&key);
            ctx.push_str("}");
        }
        for (name, value) in &el.attrs {
            ctx.push_str(" ");
            ctx.push_str(jsx_attr_name(name));
            match value {
                AttrValue::Flag => {}
                AttrValue::Literal(text) if name == "style" => match style_object(text) {
                    Some(object) => {
                        ctx.push_str("=");
                        ctx.push_str(&object);
                    }
                    None => self.literal_attr(text, ctx),
                },
                AttrValue::Literal(text) => self.literal_attr(text, ctx),
                AttrValue::Variable(var) => {
                    let value = self.value(var, ctx);
                    ctx.push_str("={");
                    ctx.push_mapped(&value, &var.location);
                    ctx.push_str("}");
                }
            }
        }

        if el.children.is_empty() {
            ctx.push_str(" />");
            return Ok(());
        }
        ctx.push_str(">");
        self.render_children(&el.children, ctx)?;
        ctx.push_str("</");
        ctx.push_str(&el.tag);
        ctx.push_str(">");
        Ok(())
    }

    fn literal_attr(&self, text: &str, ctx: &mut EmitContext) {
        if needs_string_attr(text) {
            ctx.push_str("={");
            ctx.push_str(&quote(text, '"'));
            ctx.push_str("}");
        } else {
            ctx.push_str("=\"");
            ctx.push_str(text);
            ctx.push_str("\"");
        }
    }

    fn prop_value(&self, value: &PropValue, ctx: &EmitContext) -> String {
        match value {
            PropValue::Literal(Literal::Str(s)) if !needs_string_attr(s) => format!("\"{}\"", s),
            PropValue::Literal(lit) => format!("{{{}}}", self.literal(lit)),
            PropValue::Path(path) => format!("{{{}}}", self.path(path, ctx)),
        }
    }
}

impl Backend for Native {
    fn id(&self) -> &'static str {
        "native"
    }

    fn extension(&self) -> &'static str {
        "tsx"
    }

    fn features(&self) -> Features {
        Features::all()
    }

    fn filters(&self) -> &'static [(&'static str, &'static str)] {
        FILTERS
    }

    /// Every filter name passes through to the runtime's `filter`.
    fn apply_filter(&self, name: &str, value: &str) -> Option<String> {
        Some(format!("filter({}, {})", value, quote(name, '"')))
    }

    fn render_root(&self, root: &GenRoot, ctx: &mut EmitContext) -> EmitResult {
        let imports = runtime_imports(root);
        if !imports.is_empty() {
            ctx.push_str(&format!(
                "import {{ {} }} from \"{}\";",
                imports.join(", "),
                RUNTIME_MODULE
            ));
            ctx.line();
            ctx.line();
        }

        ctx.push_str("export function ");
        ctx.push_mapped(&root.name, &root.location);
        ctx.push_str("(props) {");
        ctx.indent();
        ctx.line();
        ctx.push_str("return (");
        ctx.indent();
        ctx.line();
        self.render_body(&root.children, ctx)?;
        ctx.dedent();
        ctx.line();
        ctx.push_str(");");
        ctx.dedent();
        ctx.line();
        ctx.push_str("}");
        Ok(())
    }

    fn render_element(&self, el: &GenElement, ctx: &mut EmitContext) -> EmitResult {
        self.element(el, None, ctx)
    }

    fn render_text(&self, text: &GenText, ctx: &mut EmitContext) -> EmitResult {
        if needs_string(&text.text) {
            ctx.push_str("{");
            ctx.push_str(&quote(&text.text, '"'));
            ctx.push_str("}");
        } else {
            ctx.push_str(&text.text);
        }
        Ok(())
    }

    fn render_loop(&self, l: &GenLoop, ctx: &mut EmitContext) -> EmitResult {
        let iterable = self.path(&l.iterable, ctx);
        ctx.push_str("{");
        ctx.push_mapped(&iterable, &l.location);
        ctx.push_str(".map((");
        ctx.push_str(&l.item);
        if let Some(index) = &l.index {
            ctx.push_str(", ");
            ctx.push_str(index);
        }
        ctx.push_str(") => ");

        let marker = ctx.enter_loop(std::iter::once(&l.item).chain(&l.index));
        match (l.body.as_slice(), &l.key) {
            ([GenNode::Element(el)], key) => self.element(el, key.as_ref(), ctx)?,
            (body, Some(key)) => {
                let key = self.path(key, ctx);
                ctx.push_str("<Fragment key={");
                ctx.push_str(&key);
                ctx.push_str("}>");
                self.render_children(body, ctx)?;
                ctx.push_str("</Fragment>");
            }
            (body, None) => self.render_body(body, ctx)?,
        }
        ctx.exit_loop(marker);

        ctx.push_str(")}");
        Ok(())
    }

    fn render_condition(&self, cond: &GenCondition, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("{");
        if let ([branch], None) = (cond.branches.as_slice(), &cond.otherwise) {
            let mut predicate = self.predicate(&branch.predicate, ctx);
            if matches!(branch.predicate, GenExpr::Or(..)) {
                predicate = format!("({})", predicate);
            }
            ctx.push_mapped(&predicate, &branch.location);
            ctx.push_str(" && ");
            self.render_body(&branch.body, ctx)?;
            ctx.push_str("}");
            return Ok(());
        }

        for branch in &cond.branches {
            let predicate = self.predicate(&branch.predicate, ctx);
            ctx.push_mapped(&predicate, &branch.location);
            ctx.push_str(" ? ");
            self.render_body(&branch.body, ctx)?;
            ctx.push_str(" : ");
        }
        match &cond.otherwise {
            Some(otherwise) => self.render_body(otherwise, ctx)?,
            None => ctx.push_str("null"),
        }
        ctx.push_str("}");
        Ok(())
    }

    fn render_variable(&self, var: &GenVariable, ctx: &mut EmitContext) -> EmitResult {
        let value = self.value(var, ctx);
        ctx.push_str("{");
        ctx.push_mapped(&value, &var.location);
        ctx.push_str("}");
        Ok(())
    }

    fn render_slot(&self, slot: &GenSlot, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("<Slot name=");
        ctx.push_mapped(&quote(&slot.name, '"'), &slot.location);
        match &slot.default {
            None => ctx.push_str(" />"),
            Some(default) => {
                ctx.push_str(">");
                self.render_children(default, ctx)?;
                ctx.push_str("</Slot>");
            }
        }
        Ok(())
    }

    fn render_include(&self, inc: &GenInclude, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("<Include template=");
        ctx.push_mapped(&quote(&inc.template, '"'), &inc.location);
        for (name, value) in &inc.props {
            let value = self.prop_value(value, ctx);
            ctx.push_str(" ");
            ctx.push_str(name);
            ctx.push_str("=");
            ctx.push_str(&value);
        }
        ctx.push_str(" />");
        Ok(())
    }

    fn render_block(&self, block: &GenBlock, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("<Block name=");
        ctx.push_mapped(&quote(&block.name, '"'), &block.location);
        if block.body.is_empty() {
            ctx.push_str(" />");
            return Ok(());
        }
        ctx.push_str(">");
        self.render_children(&block.body, ctx)?;
        ctx.push_str("</Block>");
        Ok(())
    }

    fn render_extends(&self, ext: &GenExtends, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("<Extends layout=");
        ctx.push_mapped(&quote(&ext.layout, '"'), &ext.location);
        ctx.push_str(">");
        ctx.indent();
        for block in &ext.blocks {
            ctx.line();
            self.render_block(block, ctx)?;
        }
        ctx.dedent();
        ctx.line();
        ctx.push_str("</Extends>");
        Ok(())
    }
}
