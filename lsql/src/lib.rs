//! SQL-flavored queries over the filesystem: this crate re-exports the full
//! pipeline (lex, parse, semantic rewrite, evaluate) as a single entry point
//! and ships the `lsql` command-line front end.

pub use lsql_ast::Node;
pub use lsql_core::{Error, Result, Value};
pub use lsql_eval::{eval_query, eval_query_in, Table};
pub use lsql_parser::parse;

pub mod present;

/// Runs `query` against the process's actual current directory.
pub fn run(query: &str) -> Result<Table> {
    let node = parse(query)?;
    eval_query(&node)
}

/// Runs `query` with `root` bound to the `cwd` builtin (and so to the
/// implicit `FROM`), leaving the process's actual working directory
/// untouched.
pub fn run_in(query: &str, root: &str) -> Result<Table> {
    let node = parse(query)?;
    eval_query_in(&node, root)
}
