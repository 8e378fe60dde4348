//! Greedy longest-match tokenizer for lsql query text.
//!
//! Produces a finite token stream, terminated by an `EndQuery` sentinel,
//! carrying source spans for every token. Unit-suffixed number literals are
//! tokenized but not fully resolved here — an unrecognized suffix is
//! reported by the parser, not the lexer (§4.1).

mod keyword;
mod lexer;
mod token;

pub use keyword::Keyword;
pub use lexer::{tokenize, Lexer};
pub use token::{
    NumberValue, OpKind, Token, TokenKind, RBP_ADDITIVE, RBP_AND, RBP_BETWEEN, RBP_CALL,
    RBP_CONCAT_CMP, RBP_EQ, RBP_IN, RBP_MULTIPLICATIVE, RBP_OR, RBP_ORDERING, RBP_POWER,
    RBP_TERMINATOR, RBP_TEXT_MATCH,
};
