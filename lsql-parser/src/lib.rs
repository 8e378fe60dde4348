//! The Pratt expression parser, clause driver, and semantic rewrite pass
//! (§4.3, §4.4).
//!
//! [`parse`] runs the whole front end: tokenize, parse clauses into a raw
//! query, then rewrite it into a checked [`lsql_ast::Node`] (a
//! `NodeKind::Query`) ready for the evaluator.

mod parser;
mod rewrite;

pub use parser::Parser;

use lsql_ast::Node;
use lsql_core::Result;

/// Runs the full front end over `input`: lex, parse, and semantically
/// rewrite, returning a checked `Query` node.
pub fn parse(input: &str) -> Result<Node> {
    let tokens = lsql_lexer::tokenize(input)?;
    let raw = Parser::new(tokens).parse_query()?;
    rewrite::rewrite(raw)
}
