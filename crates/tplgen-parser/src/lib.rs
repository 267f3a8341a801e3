//! Component source parser.
//!
//! Parses TSX/JSX component files with swc and keeps the source text and
//! line index around so later stages can slice expressions and resolve
//! locations.

pub mod error;
pub mod parser;

pub use error::{ErrorCode, ParseError, ParseResult};
pub use parser::{parse_component, Dialect, ParsedComponentFile};

/// Re-exported syntax tree types, so downstream crates agree on one swc version.
pub use swc_ecma_ast as ast;

/// Re-exported span helpers.
pub use swc_common::{Span as SyntaxSpan, Spanned};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_file() {
        let source = r#"export function Card({ title }) {
  return <div className="card">{title}</div>;
}
"#;
        let file = parse_component("Card.tsx", source).unwrap();
        assert_eq!(file.module.body.len(), 1);
        assert_eq!(file.dialect(), Dialect::Tsx);
    }

    #[test]
    fn test_parse_error_is_located() {
        let source = "export function Card() {\n  return <div>;\n}\n";
        let err = parse_component("Card.tsx", source).unwrap_err();
        assert_eq!(err.location.file, "Card.tsx");
        assert!(err.location.line() >= 2);
        assert!(matches!(
            err.code,
            ErrorCode::SyntaxError | ErrorCode::RecoveredError
        ));
    }

    #[test]
    fn test_typescript_annotations() {
        let source = "export const Price = ({ amount }: { amount: number }) => <span>{amount}</span>;";
        assert!(parse_component("Price.tsx", source).is_ok());
    }
}
