//! The file-stat row source, the built-in namespace, and the tree-walking
//! evaluator that turns a checked query [`lsql_ast::Node`] into a [`Table`].

mod accumulate;
mod eval;
mod namespace;
mod row;

pub use eval::{eval_query, eval_query_in, Table};
pub use row::{walk_files, FileRow, Walk};
