//! The lsql abstract syntax tree.
//!
//! A single homogeneous [`Node`] type covers every expression and clause
//! shape the parser produces, plus the [`NodeVisitor`]/[`NodeTransformer`]
//! framework the semantic rewrite pass uses to walk and rebuild trees.

mod node;
mod visit;

pub use node::{AggId, AggIdGen, Direction, Node, NodeKind, QueryNode};
pub use visit::{walk, Identity, NodeTransformer, NodeVisitor};
