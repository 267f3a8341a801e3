//! Syntax helpers shared by the HTML-producing backends.

use crate::backend::Backend;
use crate::context::EmitContext;
use crate::error::EmitResult;
use tplgen_ir::html::{escape_attr, is_void_element};
use tplgen_ir::{
    format_number, quote, AttrValue, CompareOp, GenElement, GenExpr, GenPath, Literal, PathSegment,
};

/// Spelling of predicate operators in an infix template language.
#[derive(Debug, Clone, Copy)]
pub struct InfixSyntax {
    pub and: &'static str,
    pub or: &'static str,
    /// Prefix negation, including any trailing space.
    pub not: &'static str,
    pub null: &'static str,
    pub quote: char,
    pub compare: fn(CompareOp) -> &'static str,
}

impl InfixSyntax {
    /// Spell a literal.
    pub fn literal(&self, lit: &Literal) -> String {
        match lit {
            Literal::Str(s) => quote(s, self.quote),
            Literal::Num(n) => format_number(*n),
            Literal::Bool(b) => b.to_string(),
            Literal::Null => self.null.to_string(),
        }
    }

    /// Spell a predicate. `path` spells data paths.
    ///
    /// Operands of `not` and of comparisons are parenthesized unless atomic,
    /// and `or` inside `and` always is, so the result does not depend on how
    /// the target ranks `not` against comparisons.
    pub fn expr(&self, expr: &GenExpr, path: &dyn Fn(&GenPath) -> String) -> String {
        let mut out = String::new();
        self.write(expr, path, &mut out);
        out
    }

    fn write(&self, expr: &GenExpr, path: &dyn Fn(&GenPath) -> String, out: &mut String) {
        match expr {
            GenExpr::Path(p) => out.push_str(&path(p)),
            GenExpr::Literal(lit) => out.push_str(&self.literal(lit)),
            GenExpr::Not(inner) => {
                out.push_str(self.not);
                let bare = is_atom(inner) || matches!(**inner, GenExpr::Not(_));
                self.group(inner, !bare, path, out);
            }
            GenExpr::And(l, r) => {
                self.group(l, matches!(**l, GenExpr::Or(..)), path, out);
                out.push_str(self.and);
                self.group(r, matches!(**r, GenExpr::Or(..)), path, out);
            }
            GenExpr::Or(l, r) => {
                self.write(l, path, out);
                out.push_str(self.or);
                self.write(r, path, out);
            }
            GenExpr::Compare { op, left, right } => {
                self.group(left, !is_atom(left), path, out);
                out.push(' ');
                out.push_str((self.compare)(*op));
                out.push(' ');
                self.group(right, !is_atom(right), path, out);
            }
        }
    }

    fn group(&self, expr: &GenExpr, parens: bool, path: &dyn Fn(&GenPath) -> String, out: &mut String) {
        if parens {
            out.push('(');
            self.write(expr, path, out);
            out.push(')');
        } else {
            self.write(expr, path, out);
        }
    }
}

/// Spelling of data paths.
#[derive(Debug, Clone, Copy)]
pub struct PathSyntax {
    /// `[0]`-style index access, including any leading separator.
    pub index: fn(u32) -> String,
    /// Access to a key that is not an identifier, including any leading separator.
    pub quoted_key: fn(&str) -> String,
    /// Trailing length access.
    pub length: &'static str,
}

impl PathSyntax {
    /// Spell a path.
    pub fn spell(&self, path: &GenPath) -> String {
        let mut out = String::new();
        for segment in &path.segments {
            match segment {
                PathSegment::Key(key) if is_identifier(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Key(key) => out.push_str(&(self.quoted_key)(key)),
                PathSegment::Index(i) => out.push_str(&(self.index)(*i)),
                PathSegment::Length => out.push_str(self.length),
            }
        }
        out
    }
}

/// Check if an expression is a path or a literal.
pub fn is_atom(expr: &GenExpr) -> bool {
    matches!(expr, GenExpr::Path(_) | GenExpr::Literal(_))
}

/// Check if a name is a plain identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Wrap `text` in `open`/`close` if it contains any of `delimiters`.
pub fn protect(text: &str, delimiters: &[&str], open: &str, close: &str) -> String {
    if delimiters.iter().any(|d| text.contains(d)) {
        format!("{}{}{}", open, text, close)
    } else {
        text.to_string()
    }
}

/// Write a leading `}` and a trailing `{` as character references, so literal
/// text cannot join a neighbouring tag into a longer delimiter.
pub fn guard_edges(text: &str) -> String {
    let (head, rest) = match text.strip_prefix('}') {
        Some(rest) => ("&#125;", rest),
        None => ("", text),
    };
    let (body, tail) = match rest.strip_suffix('{') {
        Some(body) => (body, "&#123;"),
        None => (rest, ""),
    };
    format!("{}{}{}", head, body, tail)
}

/// Add `.ext` to a template name unless it already has an extension.
pub fn template_file(name: &str, extension: &str) -> String {
    if name.rsplit('/').next().is_some_and(|last| last.contains('.')) {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    }
}

/// The data path a slot is read from.
pub fn slot_path(name: &str) -> GenPath {
    GenPath::new(vec![
        PathSegment::Key("slots".into()),
        PathSegment::Key(name.into()),
    ])
}

/// Render `<tag attrs>children</tag>`. Attribute variables are written by
/// the backend's own `render_variable`; `escape` protects literal text.
pub fn render_html_element<B: Backend + ?Sized>(
    backend: &B,
    el: &GenElement,
    ctx: &mut EmitContext,
    escape: fn(&str) -> String,
) -> EmitResult {
    ctx.push_str("<");
    ctx.push_str(&el.tag);
    for (name, value) in &el.attrs {
        ctx.push_str(" ");
        ctx.push_str(name);
        match value {
            AttrValue::Flag => {}
            AttrValue::Literal(text) => {
                ctx.push_str("=\"");
                ctx.push_str(&escape(&escape_attr(text)));
                ctx.push_str("\"");
            }
            AttrValue::Variable(var) => {
                ctx.push_str("=\"");
                backend.render_variable(var, ctx)?;
                ctx.push_str("\"");
            }
        }
    }
    ctx.push_str(">");

    if is_void_element(&el.tag) && el.children.is_empty() {
        return Ok(());
    }
    backend.render_children(&el.children, ctx)?;
    ctx.push_str("</");
    ctx.push_str(&el.tag);
    ctx.push_str(">");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WORDS: InfixSyntax = InfixSyntax {
        and: " and ",
        or: " or ",
        not: "not ",
        null: "none",
        quote: '"',
        compare: CompareOp::symbol,
    };

    fn path(s: &str) -> GenExpr {
        GenExpr::Path(GenPath::parse(s))
    }

    fn spell(expr: &GenExpr) -> String {
        WORDS.expr(expr, &|p: &GenPath| p.to_string())
    }

    #[test]
    fn test_parenthesization() {
        let not_eq = GenExpr::Not(Box::new(GenExpr::compare(
            CompareOp::Eq,
            path("a"),
            GenExpr::Literal(Literal::Str("x".into())),
        )));
        assert_eq!(spell(&not_eq), r#"not (a == "x")"#);

        let and_or = GenExpr::And(
            Box::new(path("a")),
            Box::new(GenExpr::Or(Box::new(path("b")), Box::new(path("c")))),
        );
        assert_eq!(spell(&and_or), "a and (b or c)");

        let or_and = GenExpr::Or(
            Box::new(GenExpr::And(Box::new(path("a")), Box::new(path("b")))),
            Box::new(GenExpr::Not(Box::new(path("c")))),
        );
        assert_eq!(spell(&or_and), "a and b or not c");
    }

    #[test]
    fn test_helpers() {
        assert!(is_identifier("content_2"));
        assert!(!is_identifier("main-nav"));
        assert!(!is_identifier("2col"));
        assert_eq!(template_file("card", "jinja"), "card.jinja");
        assert_eq!(template_file("partials/card.html", "jinja"), "partials/card.html");
        assert_eq!(protect("a {{ b", &["{{"], "<", ">"), "<a {{ b>");
        assert_eq!(protect("plain", &["{{"], "<", ">"), "plain");
        assert_eq!(guard_edges("} a {"), "&#125; a &#123;");
        assert_eq!(guard_edges("{"), "&#123;");
        assert_eq!(guard_edges("}"), "&#125;");
        assert_eq!(guard_edges("a{b}c"), "a{b}c");
        assert_eq!(slot_path("aside").to_string(), "slots.aside");
    }

    #[test]
    fn test_path_spelling() {
        let syntax = PathSyntax {
            index: |i| format!("[{}]", i),
            quoted_key: |k| format!("[{}]", quote(k, '"')),
            length: "|length",
        };
        assert_eq!(syntax.spell(&GenPath::parse("items.0.name")), "items[0].name");
        assert_eq!(syntax.spell(&slot_path("main-nav")), r#"slots["main-nav"]"#);
        assert_eq!(syntax.spell(&GenPath::parse("items.length")), "items|length");
    }
}
