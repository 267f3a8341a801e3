//! IR builder.
//!
//! Walks a component function top-down, classifies every expression in child
//! position and assembles the IR tree. Source order of attributes and children
//! is preserved.

use crate::analyzer::attrs::{attr_name, attr_value, AttrValueRef};
use crate::analyzer::markers::{
    element_name, BlockMatch, BLOCK_MARKER, EXTENDS_MARKER, INCLUDE_MARKER, SLOT_MARKER,
};
use crate::analyzer::paths::{string_value, to_literal, unwrap_expr};
use crate::analyzer::text::clean_jsx_text;
use crate::analyzer::{
    classify_expr, conditions, detect_block, detect_extends, detect_include, detect_key,
    detect_slot, detect_text, detect_variable, is_reserved, loops, Classified, ConditionMatch,
    LoopMatch, PredicateIssue, TextPart,
};
use crate::components::{find_components, ComponentBody, ComponentDecl};
use crate::context::{AnalysisContext, PropsBinding};
use crate::diagnostics::{AnalysisWarning, WarningCode};
use indexmap::IndexMap;
use smol_str::SmolStr;
use tplgen_ir::html::{html_attr_name, hyphenate, is_component_tag};
use tplgen_ir::{
    format_number, walk, AttrValue, GenBlock, GenBranch, GenCondition, GenElement, GenExpr,
    GenExtends, GenInclude, GenLoop, GenNode, GenRoot, GenSlot, GenText, GenVariable, Literal,
};
use tplgen_parser::ast::{
    BlockStmt, Expr, IfStmt, JSXAttrOrSpread, JSXElement, JSXElementChild, JSXExpr,
    ObjectPatProp, Pat, Prop, PropName, PropOrSpread, Stmt,
};
use tplgen_parser::{ParsedComponentFile, Spanned, SyntaxSpan};

/// The IR of one component and the warnings raised while building it.
#[derive(Debug, Clone)]
pub struct ComponentIr {
    pub root: GenRoot,
    pub warnings: Vec<AnalysisWarning>,
}

/// Everything built from one file.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// One entry per exported component, in source order.
    pub components: Vec<ComponentIr>,
    /// Warnings about the file as a whole.
    pub warnings: Vec<AnalysisWarning>,
}

impl BuildOutput {
    /// All warnings, file-level first.
    pub fn all_warnings(&self) -> impl Iterator<Item = &AnalysisWarning> {
        self.warnings
            .iter()
            .chain(self.components.iter().flat_map(|c| c.warnings.iter()))
    }
}

/// Build the IR of every component exported by a file.
pub fn build_file(file: &ParsedComponentFile) -> BuildOutput {
    let decls = find_components(file);
    let mut output = BuildOutput::default();

    if decls.is_empty() {
        output.warnings.push(AnalysisWarning::new(
            "file exports no components",
            file.file_location(),
            WarningCode::NoComponents,
        ));
    }

    for decl in &decls {
        output.components.push(build_component(file, decl));
    }

    tracing::debug!(
        path = file.path(),
        components = output.components.len(),
        warnings = output.all_warnings().count(),
        "built IR"
    );
    output
}

/// Build the IR of one component.
pub fn build_component(file: &ParsedComponentFile, decl: &ComponentDecl<'_>) -> ComponentIr {
    let mut builder = IrBuilder {
        ctx: AnalysisContext::new(file),
    };

    if is_reserved(&decl.name) {
        builder.ctx.warn(
            WarningCode::ReservedName,
            format!("`{}` is a reserved marker name", decl.name),
            decl.span,
        );
    }
    if let Some(pat) = decl.props {
        builder.ctx.props = props_binding(pat);
    }

    let children = match decl.body {
        ComponentBody::Expr(expr) => builder.build_expr(expr),
        ComponentBody::Block(block) => builder.build_block(block, decl.span),
        ComponentBody::Missing => Vec::new(),
    };

    let root = GenRoot {
        name: decl.name.clone(),
        children,
        location: builder.ctx.location(decl.span),
    };
    ComponentIr {
        root,
        warnings: builder.ctx.warnings,
    }
}

/// Read the props parameter: `props`, `{ a, b = 1 }` or `{ a: local }`.
fn props_binding(pat: &Pat) -> PropsBinding {
    let mut binding = PropsBinding::default();
    match pat {
        Pat::Assign(assign) => return props_binding(&assign.left),
        Pat::Ident(ident) => binding.prefix = Some(SmolStr::new(&*ident.id.sym)),
        Pat::Object(obj) => {
            for prop in &obj.props {
                match prop {
                    ObjectPatProp::Assign(assign) => {
                        let name = SmolStr::new(&*assign.key.id.sym);
                        if let Some(lit) = assign.value.as_deref().and_then(to_literal) {
                            binding.defaults.insert(name, lit);
                        }
                    }
                    ObjectPatProp::KeyValue(kv) => {
                        let key = match &kv.key {
                            PropName::Ident(ident) => SmolStr::new(&*ident.sym),
                            PropName::Str(s) => SmolStr::new(string_value(s)),
                            _ => continue,
                        };
                        let (local, default) = match &*kv.value {
                            Pat::Ident(ident) => (&ident.id.sym, None),
                            Pat::Assign(assign) => match &*assign.left {
                                Pat::Ident(ident) => (&ident.id.sym, to_literal(&assign.right)),
                                _ => continue,
                            },
                            _ => continue,
                        };
                        binding.aliases.insert(SmolStr::new(&**local), key.clone());
                        if let Some(default) = default {
                            binding.defaults.insert(key, default);
                        }
                    }
                    ObjectPatProp::Rest(_) => {}
                }
            }
        }
        _ => {}
    }
    binding
}

/// A branch waiting to be built. `body: None` renders nothing.
struct PendingBranch<'e> {
    test: &'e Expr,
    predicate: Result<GenExpr, PredicateIssue>,
    body: Option<&'e Expr>,
}

struct IrBuilder<'a> {
    ctx: AnalysisContext<'a>,
}

impl<'a> IrBuilder<'a> {
    /// Build a function body: early `if (test) return x;` statements, including
    /// `else if` chains, fold into one conditional with the final `return` as
    /// its default.
    fn build_block(&mut self, block: &BlockStmt, span: SyntaxSpan) -> Vec<GenNode> {
        let mut early = Vec::new();
        let mut last: Option<&Expr> = None;

        for stmt in &block.stmts {
            match stmt {
                Stmt::Return(ret) => {
                    last = ret.arg.as_deref();
                    break;
                }
                Stmt::If(if_stmt) => {
                    if let Some(otherwise) = self.early_returns(if_stmt, &mut early) {
                        last = otherwise;
                        break;
                    }
                }
                Stmt::Empty(_) => {}
                _ => self.ctx.warn(
                    WarningCode::UnsupportedStatement,
                    "statement has no template equivalent and is ignored",
                    stmt.span(),
                ),
            }
        }

        if early.is_empty() {
            return last.map(|expr| self.build_expr(expr)).unwrap_or_default();
        }
        self.fold_condition(early, last, span)
    }

    /// Collect the returning branches of an `if`/`else if` chain in source
    /// order. `Some` carries the final `else` return, which ends the body.
    fn early_returns<'e>(
        &mut self,
        if_stmt: &'e IfStmt,
        early: &mut Vec<PendingBranch<'e>>,
    ) -> Option<Option<&'e Expr>> {
        let Some(body) = returned(&if_stmt.cons) else {
            self.ctx.warn(
                WarningCode::UnsupportedStatement,
                "`if` branches must only `return`; the rest of the chain is ignored",
                if_stmt.cons.span(),
            );
            return None;
        };
        early.push(PendingBranch {
            test: &if_stmt.test,
            predicate: conditions::to_predicate(&self.ctx, &if_stmt.test),
            body,
        });

        match if_stmt.alt.as_deref()? {
            Stmt::If(alt) => self.early_returns(alt, early),
            alt => {
                let otherwise = returned(alt);
                if otherwise.is_none() {
                    self.ctx.warn(
                        WarningCode::UnsupportedStatement,
                        "`else` must only `return`; ignored",
                        alt.span(),
                    );
                }
                otherwise
            }
        }
    }

    /// Build the nodes for an expression in child position.
    fn build_expr(&mut self, expr: &Expr) -> Vec<GenNode> {
        match classify_expr(&self.ctx, expr) {
            Classified::Jsx(Expr::JSXElement(el)) => self.build_element(el),
            Classified::Jsx(Expr::JSXFragment(fragment)) => self.build_children(&fragment.children),
            Classified::Jsx(_) => Vec::new(),
            Classified::Loop(m) => vec![self.build_loop(m)],
            Classified::Condition(m) => self.build_condition(m),
            Classified::Variable(var) => vec![GenNode::Variable(var)],
            Classified::Text(parts) => {
                let location = self.ctx.location(expr.span());
                parts
                    .into_iter()
                    .map(|part| match part {
                        TextPart::Text(text) => GenNode::Text(GenText {
                            text,
                            location: location.clone(),
                        }),
                        TextPart::Var(var) => GenNode::Variable(var),
                    })
                    .collect()
            }
            Classified::Empty => Vec::new(),
            Classified::Passthrough => self.passthrough(expr),
        }
    }

    /// Keep an unrecognized expression as its source text.
    fn passthrough(&mut self, expr: &Expr) -> Vec<GenNode> {
        let expr = unwrap_expr(expr);
        let (code, message) = if loops::is_map_call(expr) {
            (
                WarningCode::UnsupportedLoop,
                "`.map` callbacks must take plain identifier parameters and return markup",
            )
        } else {
            (
                WarningCode::UnrecognizedExpression,
                "expression is not a template construct; kept as text",
            )
        };
        self.ctx.warn(code, message, expr.span());
        vec![GenNode::Text(GenText {
            text: self.ctx.text(expr.span()).to_string(),
            location: self.ctx.location(expr.span()),
        })]
    }

    fn build_loop(&mut self, m: LoopMatch<'_>) -> GenNode {
        let marker = self.ctx.enter_scope();
        self.ctx.add_scope_var(m.item.clone());
        if let Some(index) = &m.index {
            self.ctx.add_scope_var(index.clone());
        }
        let key = detect_key(&self.ctx, m.body);
        let body = self.build_expr(m.body);
        self.ctx.exit_scope(marker);

        let index = m.index.filter(|index| {
            key.as_ref().is_some_and(|k| k.is_rooted_at(index)) || references(&body, index)
        });

        GenNode::Loop(GenLoop {
            iterable: m.iterable,
            item: m.item,
            key,
            index,
            body,
            location: self.ctx.location(m.span),
        })
    }

    fn build_condition(&mut self, m: ConditionMatch<'_>) -> Vec<GenNode> {
        let branches = m
            .branches
            .into_iter()
            .map(|b| PendingBranch {
                test: b.test,
                predicate: b.predicate,
                body: Some(b.body),
            })
            .collect();
        self.fold_condition(branches, m.otherwise, m.span)
    }

    /// Turn pending branches into a conditional. If any predicate cannot be
    /// expressed, the first branch body is rendered unconditionally instead.
    fn fold_condition(
        &mut self,
        branches: Vec<PendingBranch<'_>>,
        otherwise: Option<&Expr>,
        span: SyntaxSpan,
    ) -> Vec<GenNode> {
        let issue = [PredicateIssue::SideEffect, PredicateIssue::Unsupported]
            .into_iter()
            .find_map(|kind| {
                branches
                    .iter()
                    .find(|b| b.predicate.as_ref().err() == Some(&kind))
                    .map(|b| (kind, b.test))
            });
        if let Some((kind, test)) = issue {
            let (code, what) = match kind {
                PredicateIssue::SideEffect => {
                    (WarningCode::SideEffectPredicate, "may have side effects")
                }
                PredicateIssue::Unsupported => {
                    (WarningCode::UnsupportedPredicate, "is not a supported predicate")
                }
            };
            let message = format!(
                "`{}` {}; rendering the first branch unconditionally",
                self.ctx.text(test.span()),
                what
            );
            self.ctx.warn(code, message, test.span());
            return match branches.first().and_then(|b| b.body) {
                Some(body) => self.build_expr(body),
                None => Vec::new(),
            };
        }

        let mut built = Vec::with_capacity(branches.len());
        for branch in branches {
            let body = match branch.body {
                Some(body) => self.build_expr(body),
                None => Vec::new(),
            };
            let Ok(predicate) = branch.predicate else {
                continue;
            };
            built.push(GenBranch {
                predicate,
                body,
                location: self.ctx.location(branch.test.span()),
            });
        }
        let otherwise = otherwise
            .map(|expr| self.build_expr(expr))
            .filter(|nodes| !nodes.is_empty());

        vec![GenNode::Condition(GenCondition {
            branches: built,
            otherwise,
            location: self.ctx.location(span),
        })]
    }

    fn build_children(&mut self, children: &[JSXElementChild]) -> Vec<GenNode> {
        let mut nodes = Vec::new();
        for child in children {
            match child {
                JSXElementChild::JSXText(text) => {
                    let cleaned = clean_jsx_text(self.ctx.text(text.span));
                    if !cleaned.is_empty() {
                        nodes.push(GenNode::Text(GenText {
                            text: cleaned,
                            location: self.ctx.location(text.span),
                        }));
                    }
                }
                JSXElementChild::JSXExprContainer(container) => {
                    if let JSXExpr::Expr(expr) = &container.expr {
                        nodes.extend(self.build_expr(expr));
                    }
                }
                JSXElementChild::JSXElement(el) => nodes.extend(self.build_element(el)),
                JSXElementChild::JSXFragment(fragment) => {
                    nodes.extend(self.build_children(&fragment.children))
                }
                JSXElementChild::JSXSpreadChild(spread) => {
                    self.ctx.warn(
                        WarningCode::UnrecognizedExpression,
                        "spread children are not supported; kept as text",
                        spread.span,
                    );
                    nodes.push(GenNode::Text(GenText {
                        text: self.ctx.text(spread.span).to_string(),
                        location: self.ctx.location(spread.span),
                    }));
                }
            }
        }
        merge_text(nodes)
    }

    fn build_element(&mut self, el: &JSXElement) -> Vec<GenNode> {
        let name = element_name(&self.ctx, el);
        let location = self.ctx.location(el.span);

        match name {
            "Fragment" | "React.Fragment" => return self.build_children(&el.children),
            SLOT_MARKER => {
                if let Some(m) = detect_slot(&self.ctx, el) {
                    let default = self.build_children(m.children);
                    return vec![GenNode::Slot(GenSlot {
                        name: m.name,
                        default: (!default.is_empty()).then_some(default),
                        location,
                    })];
                }
            }
            INCLUDE_MARKER => {
                if let Some(m) = detect_include(&mut self.ctx, el) {
                    if !el.children.is_empty() {
                        tracing::debug!(template = %m.template, "ignoring <Include> children");
                    }
                    return vec![GenNode::Include(GenInclude {
                        template: m.template,
                        props: m.props,
                        location,
                    })];
                }
            }
            BLOCK_MARKER => {
                if let Some(m) = detect_block(&mut self.ctx, el) {
                    return vec![GenNode::Block(self.build_block_marker(m))];
                }
            }
            EXTENDS_MARKER => {
                if let Some(m) = detect_extends(&mut self.ctx, el) {
                    let blocks = m
                        .blocks
                        .into_iter()
                        .map(|block| self.build_block_marker(block))
                        .collect();
                    return vec![GenNode::Extends(GenExtends {
                        layout: m.layout,
                        blocks,
                        location,
                    })];
                }
            }
            _ => {}
        }

        let (attrs, inner_html) = self.build_attrs(el);
        let children = match inner_html {
            Some(inner) => inner,
            None => self.build_children(&el.children),
        };
        vec![GenNode::Element(GenElement {
            tag: SmolStr::new(name),
            attrs,
            children,
            component: is_component_tag(name).then(|| SmolStr::new(name)),
            location,
        })]
    }

    fn build_block_marker(&mut self, m: BlockMatch<'_>) -> GenBlock {
        GenBlock {
            name: m.name,
            body: self.build_children(m.children),
            location: self.ctx.location(m.element.span),
        }
    }

    /// Build the attribute map. Also returns the children implied by
    /// `dangerouslySetInnerHTML`.
    fn build_attrs(
        &mut self,
        el: &JSXElement,
    ) -> (IndexMap<SmolStr, AttrValue>, Option<Vec<GenNode>>) {
        let mut attrs = IndexMap::new();
        let mut inner_html = None;

        for attr in &el.opening.attrs {
            let attr = match attr {
                JSXAttrOrSpread::JSXAttr(attr) => attr,
                JSXAttrOrSpread::SpreadElement(spread) => {
                    self.ctx.warn(
                        WarningCode::SpreadAttribute,
                        "spread attributes cannot be expressed in templates and are dropped",
                        spread.span(),
                    );
                    continue;
                }
            };

            let name = attr_name(&self.ctx, attr);
            if name == "key" || name == "ref" {
                continue;
            }
            if is_event_handler(name) {
                tracing::debug!(attribute = name, "dropping client-side event handler");
                continue;
            }

            let value = match attr_value(&self.ctx, attr) {
                AttrValueRef::Flag => AttrValue::Flag,
                AttrValueRef::Literal(text) => AttrValue::Literal(text),
                AttrValueRef::Empty => continue,
                AttrValueRef::Element => {
                    self.ctx.warn(
                        WarningCode::UnsupportedAttribute,
                        format!("attribute `{}` cannot hold markup; dropped", name),
                        attr.span,
                    );
                    continue;
                }
                AttrValueRef::Expr(expr) => {
                    if name == "dangerouslySetInnerHTML" {
                        match inner_html_var(&self.ctx, expr) {
                            Some(var) => inner_html = Some(vec![GenNode::Variable(var)]),
                            None => self.ctx.warn(
                                WarningCode::UnsupportedAttribute,
                                "`dangerouslySetInnerHTML` needs `{ __html: path }`; dropped",
                                attr.span,
                            ),
                        }
                        continue;
                    }
                    if name == "style" {
                        if let Some(css) = style_text(expr) {
                            attrs.insert(SmolStr::new("style"), AttrValue::Literal(css));
                            continue;
                        }
                    }
                    match self.attr_expr_value(expr, name, attr.span) {
                        Some(value) => value,
                        None => continue,
                    }
                }
            };
            attrs.insert(SmolStr::new(html_attr_name(name)), value);
        }

        (attrs, inner_html)
    }

    /// An expression-valued attribute. `None` omits the attribute.
    fn attr_expr_value(&mut self, expr: &Expr, name: &str, span: SyntaxSpan) -> Option<AttrValue> {
        if let Some(lit) = to_literal(expr) {
            return match lit {
                Literal::Str(text) => Some(AttrValue::Literal(text)),
                Literal::Num(n) => Some(AttrValue::Literal(format_number(n))),
                Literal::Bool(b) if keeps_boolean_text(name) => {
                    Some(AttrValue::Literal(b.to_string()))
                }
                Literal::Bool(true) => Some(AttrValue::Flag),
                Literal::Bool(false) | Literal::Null => None,
            };
        }
        if let Some(var) = detect_variable(&self.ctx, expr) {
            return Some(AttrValue::Variable(var));
        }
        if let Some(parts) = detect_text(&self.ctx, expr) {
            if let [TextPart::Var(var)] = parts.as_slice() {
                return Some(AttrValue::Variable(var.clone()));
            }
        }
        self.ctx.warn(
            WarningCode::UnsupportedAttribute,
            format!("attribute `{}` is neither a literal nor a path; kept as text", name),
            span,
        );
        Some(AttrValue::Literal(self.ctx.text(expr.span()).to_string()))
    }
}

/// `{ __html: path }` → raw variable.
fn inner_html_var(ctx: &AnalysisContext, expr: &Expr) -> Option<GenVariable> {
    let Expr::Object(obj) = unwrap_expr(expr) else {
        return None;
    };
    obj.props.iter().find_map(|prop| {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let Prop::KeyValue(kv) = &**prop else {
            return None;
        };
        match &kv.key {
            PropName::Ident(key) if &*key.sym == "__html" => {
                let mut var = detect_variable(ctx, &kv.value)?;
                var.raw = true;
                Some(var)
            }
            _ => None,
        }
    })
}

/// CSS properties React leaves unitless.
const UNITLESS: &[&str] = &[
    "flex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "opacity",
    "order",
    "zIndex",
    "zoom",
];

/// A style object of literals → `font-size: 12px; color: red`.
fn style_text(expr: &Expr) -> Option<String> {
    let Expr::Object(obj) = unwrap_expr(expr) else {
        return None;
    };
    let mut decls = Vec::with_capacity(obj.props.len());
    for prop in &obj.props {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let Prop::KeyValue(kv) = &**prop else {
            return None;
        };
        let key = match &kv.key {
            PropName::Ident(ident) => String::from(&*ident.sym),
            PropName::Str(s) => string_value(s),
            _ => return None,
        };
        let value = match to_literal(&kv.value)? {
            Literal::Str(s) => s,
            Literal::Num(n) if n == 0.0 || UNITLESS.contains(&key.as_str()) => format_number(n),
            Literal::Num(n) => format!("{}px", format_number(n)),
            Literal::Bool(_) | Literal::Null => continue,
        };
        let property = if key.starts_with("--") { key } else { hyphenate(&key) };
        decls.push(format!("{}: {}", property, value));
    }
    Some(decls.join("; "))
}

/// React writes booleans on `aria-*` and `data-*` attributes as text.
fn keeps_boolean_text(name: &str) -> bool {
    name.starts_with("aria-") || name.starts_with("data-")
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on") && name[2..].starts_with(|c: char| c.is_ascii_uppercase())
}

/// The expression a statement returns: `return x;` or `{ return x; }`.
/// `Some(None)` is a bare `return;`.
fn returned(stmt: &Stmt) -> Option<Option<&Expr>> {
    match stmt {
        Stmt::Return(ret) => Some(ret.arg.as_deref()),
        Stmt::Block(block) => match block.stmts.as_slice() {
            [Stmt::Return(ret)] => Some(ret.arg.as_deref()),
            _ => None,
        },
        _ => None,
    }
}

/// Whether any node under `nodes` reads a path rooted at `name`.
fn references(nodes: &[GenNode], name: &str) -> bool {
    let mut found = false;
    walk(nodes, &mut |node| {
        node.for_each_path(&mut |path| found |= path.is_rooted_at(name));
    });
    found
}

/// Merge adjacent text nodes.
fn merge_text(nodes: Vec<GenNode>) -> Vec<GenNode> {
    let mut out: Vec<GenNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(GenNode::Text(prev)), GenNode::Text(next)) = (out.last_mut(), &node) {
            prev.text.push_str(&next.text);
            continue;
        }
        out.push(node);
    }
    out
}
