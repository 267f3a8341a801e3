//! swc-backed component source parser.

use crate::error::{ErrorCode, ParseError, ParseResult};
use smol_str::SmolStr;
use source_map::{LineIndex, Location, Span};
use swc_common::{BytePos, Span as SwcSpan, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// swc reserves position 0 for dummy spans, so sources start at 1.
const BASE: u32 = 1;

/// Grammar used for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// TypeScript with JSX.
    #[default]
    Tsx,
    /// ECMAScript with JSX.
    Jsx,
}

impl Dialect {
    /// Pick the grammar from a file path. `.js`/`.jsx`/`.mjs` are plain JSX,
    /// everything else is parsed as TSX.
    pub fn from_path(path: &str) -> Self {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match ext {
            "js" | "jsx" | "mjs" => Self::Jsx,
            _ => Self::Tsx,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Self::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
            Self::Jsx => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
        }
    }
}

/// A parsed component source file.
///
/// Owns the source text so analyzers can slice expression text by span.
#[derive(Debug)]
pub struct ParsedComponentFile {
    path: SmolStr,
    source: String,
    line_index: LineIndex,
    dialect: Dialect,
    /// The syntax tree.
    pub module: Module,
}

impl ParsedComponentFile {
    /// The path the file was parsed under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The grammar the file was parsed with.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The file name without directories and extensions (`src/Card.tsx` → `Card`).
    pub fn file_stem(&self) -> &str {
        let name = self
            .path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str());
        name.split('.').next().unwrap_or(name)
    }

    /// Convert an swc span to a source byte span.
    pub fn span(&self, span: SwcSpan) -> Span {
        let len = self.source.len() as u32;
        let start = span.lo.0.saturating_sub(BASE).min(len);
        let end = span.hi.0.saturating_sub(BASE).clamp(start, len);
        Span::new(start, end)
    }

    /// The source text covered by an swc span.
    pub fn text(&self, span: SwcSpan) -> &str {
        self.source.get(self.span(span).to_range()).unwrap_or("")
    }

    /// Resolve an swc span to a full location.
    pub fn location(&self, span: SwcSpan) -> Location {
        Location::new(self.path.clone(), self.span(span), &self.line_index)
    }

    /// The location of the whole file.
    pub fn file_location(&self) -> Location {
        Location::file_only(self.path.clone())
    }
}

/// Parse a component source file.
pub fn parse_component(path: &str, source: &str) -> ParseResult<ParsedComponentFile> {
    let line_index = LineIndex::new(source);
    let len = u32::try_from(source.len())
        .ok()
        .filter(|len| len.checked_add(BASE).is_some())
        .ok_or_else(|| {
            ParseError::new(
                format!("source is {} bytes, too large to parse", source.len()),
                Location::file_only(path),
                ErrorCode::SourceTooLarge,
            )
        })?;

    let dialect = Dialect::from_path(path);
    let location = |span: SwcSpan| {
        let start = span.lo.0.saturating_sub(BASE).min(len);
        let end = span.hi.0.saturating_sub(BASE).clamp(start, len);
        Location::new(path, Span::new(start, end), &line_index)
    };

    let input = StringInput::new(source, BytePos(BASE), BytePos(BASE + len));
    let lexer = Lexer::new(dialect.syntax(), EsVersion::EsNext, input, None);
    let mut parser = Parser::new_from(lexer);

    let module = parser
        .parse_module()
        .map_err(|err| ParseError::syntax(err.kind().msg().to_string(), location(err.span())))?;

    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(ParseError::recovered(
            err.kind().msg().to_string(),
            location(err.span()),
        ));
    }

    tracing::debug!(path, items = module.body.len(), "parsed component source");

    Ok(ParsedComponentFile {
        path: SmolStr::new(path),
        source: source.to_string(),
        line_index,
        dialect,
        module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{ModuleDecl, ModuleItem};

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path("src/Card.tsx"), Dialect::Tsx);
        assert_eq!(Dialect::from_path("src/Card.jsx"), Dialect::Jsx);
        assert_eq!(Dialect::from_path("Card.js"), Dialect::Jsx);
        assert_eq!(Dialect::from_path("Card"), Dialect::Tsx);
    }

    #[test]
    fn test_span_and_text() {
        let source = "export const A = () => <b>hi</b>;\n";
        let file = parse_component("src/A.tsx", source).unwrap();
        let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &file.module.body[0] else {
            panic!("expected export declaration");
        };
        let span = export.span();
        assert_eq!(file.span(span).start, 0);
        assert!(file.text(span).starts_with("export const A = () => <b>hi</b>"));
        assert_eq!(file.location(span).to_string(), "src/A.tsx:1:1");
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_component("src/B.tsx", "export const B = () => (\n  <div>;\n);\n")
            .unwrap_err();
        assert_eq!(err.location.file, "src/B.tsx");
        assert!(err.location.line() >= 2, "{}", err.location);
    }

    #[test]
    fn test_file_stem() {
        let file = parse_component("components/ui/PriceTag.tsx", "").unwrap();
        assert_eq!(file.file_stem(), "PriceTag");
    }
}
