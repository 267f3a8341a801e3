//! Expression analyzer.
//!
//! [`classify_expr`] decides which template construct an expression in child
//! position stands for. Rules are tried in a fixed order and the first match
//! wins:
//!
//! 1. JSX element or fragment
//! 2. loop (`path.map(cb)`)
//! 3. condition (`a && b`, `a ? b : c`)
//! 4. variable (path, `??` default, `filter(...)`, `raw(...)`)
//! 5. literal text (strings, numbers, template literals)
//! 6. empty (`null`, `undefined`, booleans)
//! 7. passthrough
//!
//! Classification is pure: warnings for degraded constructs are raised by the
//! builder, which owns the mutable context.

pub mod attrs;
pub mod conditions;
pub mod loops;
pub mod markers;
pub mod paths;
pub mod text;
pub mod variables;

use crate::context::AnalysisContext;
use std::fmt;
use tplgen_ir::GenVariable;
use tplgen_parser::ast::Expr;

pub use conditions::{detect_condition, BranchMatch, ConditionMatch, PredicateIssue};
pub use loops::{detect_key, detect_loop, LoopMatch};
pub use markers::{
    detect_block, detect_extends, detect_include, detect_slot, is_reserved, RESERVED_NAMES,
};
pub use paths::unwrap_expr;
pub use variables::detect_variable;

/// The construct an expression was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Jsx,
    Loop,
    Condition,
    Variable,
    Text,
    Empty,
    Passthrough,
}

impl ExprKind {
    /// Get the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jsx => "jsx",
            Self::Loop => "loop",
            Self::Condition => "condition",
            Self::Variable => "variable",
            Self::Text => "text",
            Self::Empty => "empty",
            Self::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Text(String),
    Var(GenVariable),
}

/// The result of classifying an expression.
#[derive(Debug)]
pub enum Classified<'e> {
    /// A JSX element or fragment, unwrapped.
    Jsx(&'e Expr),
    Loop(LoopMatch<'e>),
    Condition(ConditionMatch<'e>),
    Variable(GenVariable),
    Text(Vec<TextPart>),
    Empty,
    Passthrough,
}

impl Classified<'_> {
    /// Get the kind of construct.
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Jsx(_) => ExprKind::Jsx,
            Self::Loop(_) => ExprKind::Loop,
            Self::Condition(_) => ExprKind::Condition,
            Self::Variable(_) => ExprKind::Variable,
            Self::Text(_) => ExprKind::Text,
            Self::Empty => ExprKind::Empty,
            Self::Passthrough => ExprKind::Passthrough,
        }
    }
}

/// Classify an expression in child position.
pub fn classify_expr<'e>(ctx: &AnalysisContext, expr: &'e Expr) -> Classified<'e> {
    let expr = unwrap_expr(expr);
    if matches!(expr, Expr::JSXElement(_) | Expr::JSXFragment(_)) {
        return Classified::Jsx(expr);
    }
    if let Some(m) = detect_loop(ctx, expr) {
        return Classified::Loop(m);
    }
    if let Some(m) = detect_condition(ctx, expr) {
        return Classified::Condition(m);
    }
    if let Some(var) = detect_variable(ctx, expr) {
        return Classified::Variable(var);
    }
    if let Some(parts) = detect_text(ctx, expr) {
        return Classified::Text(parts);
    }
    if conditions::is_empty_expr(expr) {
        return Classified::Empty;
    }
    Classified::Passthrough
}

/// Match string and number literals and template literals whose
/// interpolations are all variables.
pub fn detect_text(ctx: &AnalysisContext, expr: &Expr) -> Option<Vec<TextPart>> {
    if let Some(text) = paths::literal_text(expr) {
        return Some(vec![TextPart::Text(text)]);
    }
    let Expr::Tpl(tpl) = unwrap_expr(expr) else {
        return None;
    };
    let mut parts = Vec::new();
    for (i, quasi) in tpl.quasis.iter().enumerate() {
        let text = paths::quasi_text(quasi);
        if !text.is_empty() {
            parts.push(TextPart::Text(text));
        }
        if let Some(expr) = tpl.exprs.get(i) {
            parts.push(TextPart::Var(detect_variable(ctx, expr)?));
        }
    }
    Some(parts)
}
