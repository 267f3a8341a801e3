//! Variable detection: paths, `??` defaults and the `filter`/`raw` markers.

use super::paths::{string_value, to_literal, to_path, unwrap_expr};
use crate::context::AnalysisContext;
use smol_str::SmolStr;
use tplgen_ir::{GenVariable, Literal};
use tplgen_parser::ast::{BinaryOp, Callee, Expr, Lit};
use tplgen_parser::Spanned;

/// Reserved call marker applying a named filter: `filter(price, "currency")`.
pub const FILTER_MARKER: &str = "filter";
/// Reserved call marker disabling escaping: `raw(html)`.
pub const RAW_MARKER: &str = "raw";

/// Match a bare path, `path ?? literal`, `filter(var, "name")` or `raw(var)`.
pub fn detect_variable(ctx: &AnalysisContext, expr: &Expr) -> Option<GenVariable> {
    let expr = unwrap_expr(expr);
    let location = ctx.location(expr.span());

    if let Some(path) = to_path(ctx, expr) {
        let default = ctx.prop_default(&path);
        return Some(GenVariable {
            path,
            default,
            filter: None,
            raw: false,
            location,
        });
    }

    match expr {
        Expr::Bin(bin) if bin.op == BinaryOp::NullishCoalescing => {
            let path = to_path(ctx, &bin.left)?;
            let default = to_literal(&bin.right)?;
            Some(GenVariable {
                path,
                default: Some(default).filter(|d| *d != Literal::Null),
                filter: None,
                raw: false,
                location,
            })
        }
        Expr::Call(call) => {
            let Callee::Expr(callee) = &call.callee else {
                return None;
            };
            let Expr::Ident(callee) = unwrap_expr(callee) else {
                return None;
            };
            if call.args.iter().any(|arg| arg.spread.is_some()) {
                return None;
            }
            match (&*callee.sym, call.args.as_slice()) {
                (FILTER_MARKER, [value, name]) => {
                    let Expr::Lit(Lit::Str(name)) = unwrap_expr(&name.expr) else {
                        return None;
                    };
                    let mut var = detect_variable(ctx, &value.expr)?;
                    if var.filter.is_some() || var.raw {
                        return None;
                    }
                    var.filter = Some(SmolStr::new(string_value(name)));
                    var.location = location;
                    Some(var)
                }
                (RAW_MARKER, [value]) => {
                    let mut var = detect_variable(ctx, &value.expr)?;
                    var.raw = true;
                    var.location = location;
                    Some(var)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tplgen_ir::GenPath;
    use tplgen_parser::ast::{ModuleItem, Stmt};
    use tplgen_parser::parse_component;

    fn with_expr<T>(source: &str, f: impl FnOnce(&AnalysisContext, &Expr) -> T) -> T {
        let file = parse_component("t.tsx", source).unwrap();
        let ctx = AnalysisContext::new(&file);
        let ModuleItem::Stmt(Stmt::Expr(stmt)) = &file.module.body[0] else {
            panic!("expected expression statement");
        };
        f(&ctx, &stmt.expr)
    }

    #[test]
    fn test_detect_path() {
        let var = with_expr("user?.address.city;", |ctx, e| detect_variable(ctx, e)).unwrap();
        assert_eq!(var.path, GenPath::parse("user.address.city"));
        assert_eq!(var.default, None);
    }

    #[test]
    fn test_detect_default_and_filter() {
        let var = with_expr(r#"raw(filter(price ?? 0, "currency"));"#, |ctx, e| {
            detect_variable(ctx, e)
        })
        .unwrap();
        assert_eq!(var.path, GenPath::parse("price"));
        assert_eq!(var.default, Some(Literal::Num(0.0)));
        assert_eq!(var.filter.as_deref(), Some("currency"));
        assert!(var.raw);
    }

    #[test]
    fn test_other_calls_are_not_variables() {
        assert!(with_expr("format(price);", |ctx, e| detect_variable(ctx, e)).is_none());
        assert!(with_expr(r#"filter(price, kind);"#, |ctx, e| detect_variable(ctx, e)).is_none());
    }
}
