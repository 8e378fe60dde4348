use std::fmt;

use lsql_core::Span;

use crate::keyword::Keyword;

/// Single- and multi-character operator/punctuation kinds (§4.1, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Concat,  // ||
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Caret,   // ^
    Eq,      // =
    Lt,      // <
    Gt,      // >
    Le,      // <=
    Ge,      // >=
    Ne,      // <> or !=
    LParen,
    RParen,
    Comma,
    Dot,
}

impl OpKind {
    pub fn text(self) -> &'static str {
        use OpKind::*;
        match self {
            Concat => "||",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Caret => "^",
            Eq => "=",
            Lt => "<",
            Gt => ">",
            Le => "<=",
            Ge => ">=",
            Ne => "<>",
            LParen => "(",
            RParen => ")",
            Comma => ",",
            Dot => ".",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A number literal's numeric base, before any unit-suffix factor is
/// applied. The suffix (if present) is carried on the token as raw text and
/// resolved by the parser (§4.1): the lexer never rejects an unrecognized
/// suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

/// Right binding powers (§4.2), exported so the parser can refer to a band
/// by name instead of repeating the magic numbers (e.g. `BETWEEN`'s second
/// operand is parsed at `RBP_BETWEEN`, and its internal `AND` delimiter is
/// recognized by stopping the first operand's parse at `RBP_AND`).
pub const RBP_TERMINATOR: u32 = 0;
pub const RBP_OR: u32 = 100;
pub const RBP_AND: u32 = 200;
pub const RBP_EQ: u32 = 300;
pub const RBP_ORDERING: u32 = 400;
pub const RBP_TEXT_MATCH: u32 = 500;
pub const RBP_BETWEEN: u32 = 600;
pub const RBP_IN: u32 = 700;
pub const RBP_CONCAT_CMP: u32 = 800;
pub const RBP_ADDITIVE: u32 = 900;
pub const RBP_MULTIPLICATIVE: u32 = 1000;
pub const RBP_POWER: u32 = 1100;
pub const RBP_CALL: u32 = 1200;

/// The discriminant of a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Ident(String),
    Number {
        value: NumberValue,
        suffix: Option<String>,
    },
    String(String),
    Op(OpKind),
    EndQuery,
}

impl TokenKind {
    /// A short human name for this token's class, used in
    /// `UnexpectedToken`/`ValueExpected`/`OperatorExpected` messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(k) => k.to_string(),
            TokenKind::Ident(s) => format!("identifier {:?}", s),
            TokenKind::Number { .. } => "number".to_string(),
            TokenKind::String(s) => format!("string {:?}", s),
            TokenKind::Op(op) => format!("'{}'", op),
            TokenKind::EndQuery => "end of query".to_string(),
        }
    }

    /// The right binding power used by the Pratt driver (§4.2). Multiplied
    /// by 100 so later precedence levels can be inserted between existing
    /// bands without renumbering everything.
    pub fn rbp(&self) -> u32 {
        use Keyword::*;
        use OpKind::*;
        match self {
            TokenKind::EndQuery => RBP_TERMINATOR,
            TokenKind::Op(Comma) | TokenKind::Op(RParen) => RBP_TERMINATOR,
            TokenKind::Keyword(From)
            | TokenKind::Keyword(Where)
            | TokenKind::Keyword(Group)
            | TokenKind::Keyword(Having)
            | TokenKind::Keyword(Order)
            | TokenKind::Keyword(Limit)
            | TokenKind::Keyword(Offset)
            | TokenKind::Keyword(Asc)
            | TokenKind::Keyword(Desc) => RBP_TERMINATOR,
            TokenKind::Keyword(Or) => RBP_OR,
            TokenKind::Keyword(And) => RBP_AND,
            TokenKind::Op(Eq) => RBP_EQ,
            TokenKind::Op(Lt) | TokenKind::Op(Gt) => RBP_ORDERING,
            TokenKind::Keyword(Like)
            | TokenKind::Keyword(Ilike)
            | TokenKind::Keyword(Rlike)
            | TokenKind::Keyword(Rilike)
            | TokenKind::Keyword(LikeRegex)
            | TokenKind::Keyword(Contains)
            | TokenKind::Keyword(Icontains) => RBP_TEXT_MATCH,
            TokenKind::Keyword(Between) => RBP_BETWEEN,
            TokenKind::Keyword(In) => RBP_IN,
            TokenKind::Op(Concat) | TokenKind::Op(Le) | TokenKind::Op(Ge) | TokenKind::Op(Ne) => {
                RBP_CONCAT_CMP
            }
            TokenKind::Op(Plus) | TokenKind::Op(Minus) => RBP_ADDITIVE,
            TokenKind::Op(Star) | TokenKind::Op(Slash) | TokenKind::Op(Percent) => RBP_MULTIPLICATIVE,
            TokenKind::Op(Caret) => RBP_POWER,
            TokenKind::Op(LParen) => RBP_CALL,
            _ => RBP_TERMINATOR,
        }
    }
}

/// A single lexed token: its kind, the original source substring, and a
/// half-open byte-offset span into the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn rbp(&self) -> u32 {
        self.kind.rbp()
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.kind, TokenKind::Keyword(k) if *k == kw)
    }

    pub fn is_op(&self, op: OpKind) -> bool {
        matches!(&self.kind, TokenKind::Op(o) if *o == op)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind.describe())
    }
}
