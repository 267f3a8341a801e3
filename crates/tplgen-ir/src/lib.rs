//! Backend-agnostic template IR.
//!
//! One [`GenRoot`] is built per component. The node set is closed: emitters
//! match on [`GenNode`] exhaustively, so a new node kind has to be handled by
//! every backend before the workspace compiles again.

pub mod annotate;
pub mod expr;
pub mod html;
pub mod nodes;

pub use annotate::{annotate, props_json};
pub use expr::{format_number, quote, CompareOp, GenExpr, GenPath, Literal, PathSegment};
pub use nodes::{
    walk, AttrValue, GenBlock, GenBranch, GenCondition, GenElement, GenExtends, GenInclude,
    GenLoop, GenNode, GenRoot, GenSlot, GenText, GenVariable, NodeKind, PropValue,
};
