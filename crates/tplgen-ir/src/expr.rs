//! Paths, literals and predicate expressions.

use smol_str::SmolStr;
use std::fmt;

/// One step of a data path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathSegment {
    /// `.name` or `["name"]`
    Key(SmolStr),
    /// `[0]`
    Index(u32),
    /// A trailing `.length`, which every template language spells differently.
    Length,
}

/// A dotted reference into the render data, e.g. `user.address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenPath {
    pub segments: Vec<PathSegment>,
}

impl GenPath {
    /// Create a path from segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse a dotted path such as `items.0.name` or `items.length`.
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "length" => PathSegment::Length,
                _ => match s.parse::<u32>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key(SmolStr::new(s)),
                },
            })
            .collect();
        Self { segments }
    }

    /// The first key, if the path starts with one.
    pub fn root(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Whether the path is rooted at `name`.
    pub fn is_rooted_at(&self, name: &str) -> bool {
        self.root() == Some(name)
    }

    /// Check if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drop a leading key, e.g. `props.title` → `title`.
    pub fn strip_root(&self, name: &str) -> Option<GenPath> {
        if self.is_rooted_at(name) && self.segments.len() > 1 {
            Some(GenPath::new(self.segments[1..].to_vec()))
        } else {
            None
        }
    }

    /// Whether the last segment is `.length`.
    pub fn is_length(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Length))
    }

    /// The path without a trailing `.length`.
    pub fn without_length(&self) -> GenPath {
        let mut segments = self.segments.clone();
        if matches!(segments.last(), Some(PathSegment::Length)) {
            segments.pop();
        }
        GenPath::new(segments)
    }

    /// Render the path with `.` between keys and a custom index syntax.
    pub fn join(&self, index: impl Fn(u32) -> String, length: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(i) => out.push_str(&index(*i)),
                PathSegment::Length => out.push_str(length),
            }
        }
        out
    }
}

impl fmt::Display for GenPath {
    /// JavaScript spelling: `items[0].name`, `items.length`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(|i| format!("[{}]", i), ".length"))
    }
}

/// A literal value in a default, a prop binding or a predicate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Convert to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Str(s) => serde_json::Value::String(s.clone()),
            Literal::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            Literal::Num(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Null => serde_json::Value::Null,
        }
    }

    /// The value as it would print in text (`3`, `1.5`, `true`, ``).
    pub fn to_text(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Num(n) => format_number(*n),
            Literal::Bool(b) => b.to_string(),
            Literal::Null => String::new(),
        }
    }
}

impl fmt::Display for Literal {
    /// JavaScript spelling, strings double-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => f.write_str(&quote(s, '"')),
            Literal::Num(n) => f.write_str(&format_number(*n)),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Format a number the way JavaScript prints it for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Quote a string with `delim`, escaping backslashes, the delimiter and control characters.
pub fn quote(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Comparison operators allowed in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// The operator as written in most template languages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// The operator as written in JavaScript.
    pub fn js_symbol(self) -> &'static str {
        match self {
            Self::Eq => "===",
            Self::Ne => "!==",
            op => op.symbol(),
        }
    }

    /// The operator that holds exactly when this one does not.
    pub fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
        }
    }
}

/// A side-effect-free predicate over render data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenExpr {
    Path(GenPath),
    Literal(Literal),
    Not(Box<GenExpr>),
    And(Box<GenExpr>, Box<GenExpr>),
    Or(Box<GenExpr>, Box<GenExpr>),
    Compare {
        op: CompareOp,
        left: Box<GenExpr>,
        right: Box<GenExpr>,
    },
}

impl GenExpr {
    /// Build a comparison.
    pub fn compare(op: CompareOp, left: GenExpr, right: GenExpr) -> Self {
        Self::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visit every path the expression reads.
    pub fn for_each_path<'a>(&'a self, f: &mut impl FnMut(&'a GenPath)) {
        match self {
            GenExpr::Path(path) => f(path),
            GenExpr::Literal(_) => {}
            GenExpr::Not(inner) => inner.for_each_path(f),
            GenExpr::And(l, r) | GenExpr::Or(l, r) => {
                l.for_each_path(f);
                r.for_each_path(f);
            }
            GenExpr::Compare { left, right, .. } => {
                left.for_each_path(f);
                right.for_each_path(f);
            }
        }
    }

    /// Binding strength in JavaScript; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            GenExpr::Or(..) => 1,
            GenExpr::And(..) => 2,
            GenExpr::Compare { .. } => 3,
            GenExpr::Not(_) => 4,
            GenExpr::Path(_) | GenExpr::Literal(_) => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for GenExpr {
    /// JavaScript spelling with minimal parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenExpr::Path(path) => write!(f, "{}", path),
            GenExpr::Literal(lit) => write!(f, "{}", lit),
            GenExpr::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_operand(f, 4)
            }
            GenExpr::And(l, r) => {
                l.fmt_operand(f, 2)?;
                f.write_str(" && ")?;
                r.fmt_operand(f, 3)
            }
            GenExpr::Or(l, r) => {
                l.fmt_operand(f, 1)?;
                f.write_str(" || ")?;
                r.fmt_operand(f, 2)
            }
            GenExpr::Compare { op, left, right } => {
                left.fmt_operand(f, 4)?;
                write!(f, " {} ", op.js_symbol())?;
                right.fmt_operand(f, 4)
            }
        }
    }
}
