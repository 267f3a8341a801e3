//! IR node types.
//!
//! The tree is owned top-down: every node has exactly one parent, the node or
//! root that holds it. Once built, the tree is only ever handed out by shared
//! reference.

use crate::expr::{GenExpr, GenPath, Literal};
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Location;
use std::fmt;

/// The IR of one compiled component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenRoot {
    /// Component name (the exported function name).
    pub name: SmolStr,
    /// Top-level nodes.
    pub children: Vec<GenNode>,
    /// Location of the component function.
    pub location: Location,
}

impl GenRoot {
    /// Whether any node needs template inheritance.
    pub fn uses_inheritance(&self) -> bool {
        let mut found = false;
        walk(&self.children, &mut |node| {
            found |= matches!(node, GenNode::Block(_) | GenNode::Extends(_));
        });
        found
    }
}

/// A node in the IR.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenNode {
    Element(GenElement),
    Text(GenText),
    Loop(GenLoop),
    Condition(GenCondition),
    Variable(GenVariable),
    Slot(GenSlot),
    Include(GenInclude),
    Block(GenBlock),
    Extends(GenExtends),
}

impl GenNode {
    /// Get the location of this node.
    pub fn location(&self) -> &Location {
        match self {
            Self::Element(n) => &n.location,
            Self::Text(n) => &n.location,
            Self::Loop(n) => &n.location,
            Self::Condition(n) => &n.location,
            Self::Variable(n) => &n.location,
            Self::Slot(n) => &n.location,
            Self::Include(n) => &n.location,
            Self::Block(n) => &n.location,
            Self::Extends(n) => &n.location,
        }
    }

    /// Get the kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Element(_) => NodeKind::Element,
            Self::Text(_) => NodeKind::Text,
            Self::Loop(_) => NodeKind::Loop,
            Self::Condition(_) => NodeKind::Condition,
            Self::Variable(_) => NodeKind::Variable,
            Self::Slot(_) => NodeKind::Slot,
            Self::Include(_) => NodeKind::Include,
            Self::Block(_) => NodeKind::Block,
            Self::Extends(_) => NodeKind::Extends,
        }
    }

    /// Visit direct children, in order.
    pub fn for_each_child<'a>(&'a self, f: &mut impl FnMut(&'a GenNode)) {
        let mut each = |nodes: &'a [GenNode]| nodes.iter().for_each(&mut *f);
        match self {
            Self::Element(el) => each(&el.children),
            Self::Loop(l) => each(&l.body),
            Self::Condition(c) => {
                for branch in &c.branches {
                    each(&branch.body);
                }
                if let Some(otherwise) = &c.otherwise {
                    each(otherwise);
                }
            }
            Self::Slot(s) => {
                if let Some(default) = &s.default {
                    each(default);
                }
            }
            Self::Block(b) => each(&b.body),
            Self::Extends(e) => {
                for block in &e.blocks {
                    each(&block.body);
                }
            }
            Self::Text(_) | Self::Variable(_) | Self::Include(_) => {}
        }
    }

    /// Visit every path this node reads directly (not its children's).
    pub fn for_each_path<'a>(&'a self, f: &mut impl FnMut(&'a GenPath)) {
        match self {
            Self::Element(el) => {
                for value in el.attrs.values() {
                    if let AttrValue::Variable(var) = value {
                        f(&var.path);
                    }
                }
            }
            Self::Loop(l) => {
                f(&l.iterable);
                if let Some(key) = &l.key {
                    f(key);
                }
            }
            Self::Condition(c) => {
                for branch in &c.branches {
                    branch.predicate.for_each_path(f);
                }
            }
            Self::Variable(v) => f(&v.path),
            Self::Include(i) => {
                for value in i.props.values() {
                    if let PropValue::Path(path) = value {
                        f(path);
                    }
                }
            }
            Self::Text(_) | Self::Slot(_) | Self::Block(_) | Self::Extends(_) => {}
        }
    }
}

/// Visit nodes depth-first, parents before children.
pub fn walk<'a>(nodes: &'a [GenNode], f: &mut impl FnMut(&'a GenNode)) {
    for node in nodes {
        f(node);
        let mut children = Vec::new();
        node.for_each_child(&mut |child| children.push(child));
        for child in children {
            walk(std::slice::from_ref(child), f);
        }
    }
}

/// Node kinds, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Element,
    Text,
    Loop,
    Condition,
    Variable,
    Slot,
    Include,
    Block,
    Extends,
}

impl NodeKind {
    /// Get the node kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "GenElement",
            Self::Text => "GenText",
            Self::Loop => "GenLoop",
            Self::Condition => "GenCondition",
            Self::Variable => "GenVariable",
            Self::Slot => "GenSlot",
            Self::Include => "GenInclude",
            Self::Block => "GenBlock",
            Self::Extends => "GenExtends",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A plain element, passed through to the output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenElement {
    /// Tag name as written in the source.
    pub tag: SmolStr,
    /// Attributes in source order.
    pub attrs: IndexMap<SmolStr, AttrValue>,
    /// Children in source order.
    pub children: Vec<GenNode>,
    /// Set when the tag names another component (`<Button>`).
    pub component: Option<SmolStr>,
    pub location: Location,
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// `class="card"`
    Literal(String),
    /// `disabled`
    Flag,
    /// `class={cls}`
    Variable(GenVariable),
}

/// Literal text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenText {
    /// Decoded text; emitters escape it for their target.
    pub text: String,
    pub location: Location,
}

/// Repeat a body once per item of a collection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenLoop {
    /// The collection.
    pub iterable: GenPath,
    /// Name bound to each item.
    pub item: SmolStr,
    /// Stable identity of each item, for host runtimes that reconcile.
    pub key: Option<GenPath>,
    /// Name bound to the zero-based position, only when the body uses it.
    pub index: Option<SmolStr>,
    pub body: Vec<GenNode>,
    pub location: Location,
}

/// Ordered conditional branches; the first true predicate wins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenCondition {
    pub branches: Vec<GenBranch>,
    /// Rendered when no predicate holds.
    pub otherwise: Option<Vec<GenNode>>,
    pub location: Location,
}

/// One `if`/`else if` arm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenBranch {
    pub predicate: GenExpr,
    pub body: Vec<GenNode>,
    /// Location of the predicate.
    pub location: Location,
}

/// An interpolated value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenVariable {
    pub path: GenPath,
    /// Used when the value is null or missing.
    pub default: Option<Literal>,
    /// Canonical filter name, e.g. `currency`.
    pub filter: Option<SmolStr>,
    /// Disable escaping.
    pub raw: bool,
    pub location: Location,
}

impl GenVariable {
    /// A plain escaped variable.
    pub fn new(path: GenPath, location: Location) -> Self {
        Self {
            path,
            default: None,
            filter: None,
            raw: false,
            location,
        }
    }
}

/// A named insertion point filled by the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenSlot {
    pub name: SmolStr,
    /// Rendered when the caller supplies nothing.
    pub default: Option<Vec<GenNode>>,
    pub location: Location,
}

/// Render another template in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenInclude {
    /// Template name without extension.
    pub template: SmolStr,
    /// Props passed to the included template, in source order.
    pub props: IndexMap<SmolStr, PropValue>,
    pub location: Location,
}

/// A prop binding on an include.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropValue {
    Literal(Literal),
    Path(GenPath),
}

/// An overridable region of a layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenBlock {
    pub name: SmolStr,
    pub body: Vec<GenNode>,
    pub location: Location,
}

/// Render a parent layout with some of its blocks overridden.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenExtends {
    /// Layout template name without extension.
    pub layout: SmolStr,
    pub blocks: Vec<GenBlock>,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> GenNode {
        GenNode::Text(GenText {
            text: s.into(),
            location: Location::default(),
        })
    }

    #[test]
    fn test_walk_order() {
        let tree = vec![GenNode::Element(GenElement {
            tag: "ul".into(),
            attrs: IndexMap::new(),
            children: vec![
                GenNode::Loop(GenLoop {
                    iterable: GenPath::parse("items"),
                    item: "item".into(),
                    key: None,
                    index: None,
                    body: vec![text("a")],
                    location: Location::default(),
                }),
                text("b"),
            ],
            component: None,
            location: Location::default(),
        })];

        let mut kinds = Vec::new();
        walk(&tree, &mut |node| kinds.push(node.kind().as_str()));
        assert_eq!(kinds, vec!["GenElement", "GenLoop", "GenText", "GenText"]);
    }

    #[test]
    fn test_uses_inheritance() {
        let root = GenRoot {
            name: "Page".into(),
            children: vec![GenNode::Extends(GenExtends {
                layout: "base".into(),
                blocks: vec![],
                location: Location::default(),
            })],
            location: Location::default(),
        };
        assert!(root.uses_inheritance());
    }
}
