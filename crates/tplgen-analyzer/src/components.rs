//! Component discovery.
//!
//! A component is an exported function whose name starts with an upper-case
//! letter: `export function Card`, `export const Card = () => ...`,
//! `export default function` (named after the file) or a local function
//! exported by name.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tplgen_parser::ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, Decl, DefaultDecl, Expr, ExportSpecifier, Function,
    ModuleDecl, ModuleExportName, ModuleItem, Pat, Stmt,
};
use tplgen_parser::{ParsedComponentFile, SyntaxSpan};

/// What a component function returns from.
#[derive(Debug, Clone, Copy)]
pub enum ComponentBody<'m> {
    /// `() => <div />`
    Expr(&'m Expr),
    /// `function () { ... }`
    Block(&'m BlockStmt),
    /// A declaration without a body (`declare function`).
    Missing,
}

/// A component function found in a module.
#[derive(Debug, Clone)]
pub struct ComponentDecl<'m> {
    pub name: SmolStr,
    /// The props parameter.
    pub props: Option<&'m Pat>,
    pub body: ComponentBody<'m>,
    pub span: SyntaxSpan,
}

#[derive(Clone, Copy)]
enum FnLike<'m> {
    Function(&'m Function),
    Arrow(&'m ArrowExpr),
}

impl<'m> FnLike<'m> {
    fn from_expr(expr: &'m Expr) -> Option<Self> {
        match crate::analyzer::unwrap_expr(expr) {
            Expr::Arrow(arrow) => Some(Self::Arrow(arrow)),
            Expr::Fn(func) => Some(Self::Function(&func.function)),
            _ => None,
        }
    }

    fn into_decl(self, name: SmolStr) -> ComponentDecl<'m> {
        match self {
            Self::Function(func) => ComponentDecl {
                name,
                props: func.params.first().map(|p| &p.pat),
                body: func
                    .body
                    .as_ref()
                    .map_or(ComponentBody::Missing, ComponentBody::Block),
                span: func.span,
            },
            Self::Arrow(arrow) => ComponentDecl {
                name,
                props: arrow.params.first(),
                body: match &*arrow.body {
                    BlockStmtOrExpr::Expr(expr) => ComponentBody::Expr(expr),
                    BlockStmtOrExpr::BlockStmt(block) => ComponentBody::Block(block),
                },
                span: arrow.span,
            },
        }
    }
}

/// Functions declared in a declaration, by name.
fn declared_fns(decl: &Decl) -> Vec<(SmolStr, FnLike<'_>)> {
    match decl {
        Decl::Fn(func) => vec![(SmolStr::new(&*func.ident.sym), FnLike::Function(&func.function))],
        Decl::Var(var) => var
            .decls
            .iter()
            .filter_map(|declarator| {
                let Pat::Ident(binding) = &declarator.name else {
                    return None;
                };
                let init = FnLike::from_expr(declarator.init.as_deref()?)?;
                Some((SmolStr::new(&*binding.id.sym), init))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a name is spelled like a component.
pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Turn a file stem into a component name (`price-tag` → `PriceTag`).
pub fn pascal_case(stem: &str) -> SmolStr {
    let mut out = String::with_capacity(stem.len());
    for part in stem.split(['-', '_', ' ']).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    SmolStr::new(out)
}

/// Find the exported components of a file, in source order.
pub fn find_components(file: &ParsedComponentFile) -> Vec<ComponentDecl<'_>> {
    let module = &file.module;

    let mut locals: FxHashMap<SmolStr, FnLike<'_>> = FxHashMap::default();
    for item in &module.body {
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
            _ => continue,
        };
        locals.extend(declared_fns(decl));
    }

    let mut exported: Vec<(SmolStr, FnLike<'_>)> = Vec::new();
    for item in &module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        match decl {
            ModuleDecl::ExportDecl(export) => exported.extend(declared_fns(&export.decl)),
            ModuleDecl::ExportDefaultDecl(export) => {
                if let DefaultDecl::Fn(func) = &export.decl {
                    let name = match &func.ident {
                        Some(ident) => SmolStr::new(&*ident.sym),
                        None => pascal_case(file.file_stem()),
                    };
                    exported.push((name, FnLike::Function(&func.function)));
                }
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                let expr = crate::analyzer::unwrap_expr(&export.expr);
                if let Expr::Ident(ident) = expr {
                    if let Some(func) = locals.get(&*ident.sym) {
                        exported.push((SmolStr::new(&*ident.sym), *func));
                    }
                } else if let Some(func) = FnLike::from_expr(expr) {
                    exported.push((pascal_case(file.file_stem()), func));
                }
            }
            ModuleDecl::ExportNamed(named) if named.src.is_none() => {
                for spec in &named.specifiers {
                    let ExportSpecifier::Named(spec) = spec else {
                        continue;
                    };
                    let ModuleExportName::Ident(orig) = &spec.orig else {
                        continue;
                    };
                    let Some(func) = locals.get(&*orig.sym) else {
                        continue;
                    };
                    let name = match &spec.exported {
                        Some(ModuleExportName::Ident(exported)) => SmolStr::new(&*exported.sym),
                        _ => SmolStr::new(&*orig.sym),
                    };
                    exported.push((name, *func));
                }
            }
            _ => {}
        }
    }

    let mut found: Vec<ComponentDecl<'_>> = Vec::new();
    for (name, func) in exported {
        if !is_component_name(&name) {
            tracing::debug!(%name, "skipping export that is not a component");
            continue;
        }
        if found.iter().any(|c| c.name == name) {
            continue;
        }
        found.push(func.into_decl(name));
    }

    tracing::debug!(path = file.path(), count = found.len(), "found components");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tplgen_parser::parse_component;

    fn names(path: &str, source: &str) -> Vec<String> {
        let file = parse_component(path, source).unwrap();
        find_components(&file)
            .into_iter()
            .map(|c| c.name.to_string())
            .collect()
    }

    #[test]
    fn test_export_forms() {
        let source = r#"
export function Card(props) { return <div />; }
export const Badge = ({ label }) => <span>{label}</span>;
export const helper = () => 1;
function Local() { return <p />; }
export { Local as Renamed };
"#;
        assert_eq!(names("Card.tsx", source), vec!["Card", "Badge", "Renamed"]);
    }

    #[test]
    fn test_default_export_named_after_file() {
        assert_eq!(
            names("price-tag.tsx", "export default () => <b />;"),
            vec!["PriceTag"]
        );
        assert_eq!(
            names("x.tsx", "export default function Hero() { return null; }"),
            vec!["Hero"]
        );
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("user_card"), "UserCard");
        assert_eq!(pascal_case("Card"), "Card");
    }
}
