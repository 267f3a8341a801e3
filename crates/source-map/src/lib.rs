//! Source locations and mappings for tplgen.
//!
//! Every IR node and every diagnostic carries a [`Location`] pointing back
//! into the component source. Emitters write through a [`CodeBuilder`] which
//! records a [`SourceMap`] from generated template offsets to source offsets.

use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

/// A byte range `[start, end)` in a component source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The span as a slice range into the source text.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Line start offsets of one source, for resolving byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// 0-indexed line and byte column of `offset`, clamped to the source.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }
}

/// A 0-indexed line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// A resolved position inside one component source file.
///
/// Displayed as `file:line:col` with 1-indexed line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Path of the source file, as given to the parser.
    pub file: SmolStr,
    /// Byte span of the node.
    pub span: Span,
    /// Start position of the span.
    pub start: LineCol,
}

impl Location {
    /// Create a location, resolving the line/column through `index`.
    pub fn new(file: impl Into<SmolStr>, span: Span, index: &LineIndex) -> Self {
        Self {
            file: file.into(),
            span,
            start: index.line_col(span.start),
        }
    }

    /// A location that only names a file.
    pub fn file_only(file: impl Into<SmolStr>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    /// 1-indexed line.
    pub fn line(&self) -> u32 {
        self.start.line + 1
    }

    /// 1-indexed column.
    pub fn column(&self) -> u32 {
        self.start.col + 1
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line(), self.column())
    }
}

/// One generated range and the source span it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceMapping {
    pub generated_offset: u32,
    pub generated_length: u32,
    pub source: Span,
}

impl SourceMapping {
    fn covers(&self, offset: u32) -> bool {
        self.generated_offset <= offset && offset < self.generated_offset + self.generated_length
    }
}

/// Generated-to-source mappings, sorted by generated offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceMap {
    mappings: Vec<SourceMapping>,
}

impl SourceMap {
    fn insert(&mut self, mapping: SourceMapping) {
        let pos = self
            .mappings
            .partition_point(|m| m.generated_offset <= mapping.generated_offset);
        self.mappings.insert(pos, mapping);
    }

    /// The source span behind a generated offset. When mappings nest, the
    /// shortest one wins.
    pub fn find_source(&self, generated_offset: u32) -> Option<Span> {
        let candidates = self
            .mappings
            .partition_point(|m| m.generated_offset <= generated_offset);
        self.mappings[..candidates]
            .iter()
            .filter(|m| m.covers(generated_offset))
            .min_by_key(|m| m.generated_length)
            .map(|m| m.source)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A string buffer that records where each mapped piece came from.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: String,
    source_map: SourceMap,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Append `code` and map it to `source`. Empty pieces are not recorded.
    pub fn push_mapped(&mut self, code: &str, source: Span) {
        if code.is_empty() {
            return;
        }
        self.source_map.insert(SourceMapping {
            generated_offset: self.code.len() as u32,
            generated_length: code.len() as u32,
            source,
        });
        self.code.push_str(code);
    }

    pub fn newline(&mut self) {
        self.code.push('\n');
    }

    /// The code written so far.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn finish(self) -> (String, SourceMap) {
        (self.code, self.source_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_col(0), LineCol::new(0, 0));
        assert_eq!(index.line_col(5), LineCol::new(0, 5));
        assert_eq!(index.line_col(6), LineCol::new(1, 0));
        assert_eq!(index.line_col(12), LineCol::new(2, 0));
        assert_eq!(index.line_col(400), LineCol::new(2, 3));
    }

    #[test]
    fn test_location_display() {
        let index = LineIndex::new("export function A() {\n  return <div/>;\n}");
        let location = Location::new("src/A.tsx", Span::new(31, 37), &index);
        assert_eq!(location.to_string(), "src/A.tsx:2:10");
        assert_eq!((location.line(), location.column()), (2, 10));
        assert_eq!(Location::file_only("a.tsx").to_string(), "a.tsx:1:1");
    }

    #[test]
    fn test_source_lookup() {
        let mut builder = CodeBuilder::new();
        builder.push_str("{{ ");
        builder.push_mapped("user.name", Span::new(40, 49));
        builder.push_mapped("", Span::new(0, 1));
        builder.push_str(" }}");
        builder.newline();

        let (code, map) = builder.finish();
        assert_eq!(code, "{{ user.name }}\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.find_source(3), Some(Span::new(40, 49)));
        assert_eq!(map.find_source(11), Some(Span::new(40, 49)));
        assert_eq!(map.find_source(12), None);
        assert_eq!(map.find_source(0), None);
    }
}
