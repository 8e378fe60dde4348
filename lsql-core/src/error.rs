use std::fmt;

use crate::location::Span;

/// The single error hierarchy for the whole query pipeline.
///
/// Every variant carries a source span when the failing token or node still
/// has one available. Written by hand rather than derived, in the style of
/// the lexer/parser error types this crate's siblings used to carry
/// individually before being merged into one hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No lexer rule matched at `span.start`; `excerpt` is a short slice of
    /// the offending input for diagnostics.
    CantTokenize { span: Span, excerpt: String },
    /// A number literal's unit suffix isn't one of the known size/time
    /// suffixes.
    UnknownLiteralSuffix {
        suffix: String,
        span: Span,
        known: Vec<&'static str>,
    },
    /// A reserved keyword was used but its clause/expression behavior isn't
    /// implemented (e.g. `DELETE`, `UPDATE`, `DROP`, `JOIN`, `CASE`, `AS`).
    NotImplementedToken { span: Span, text: String },
    /// Wrong token found at a syntactic join point.
    UnexpectedToken {
        expected: String,
        actual: String,
        span: Span,
    },
    /// The token stream ran out mid-expression.
    UnexpectedEnd,
    /// A token in prefix position has no prefix handler.
    ValueExpected { span: Span },
    /// A token in infix position has no binding power.
    OperatorExpected { span: Span },
    /// An aggregate function call appeared in `WHERE`.
    AggregateInWhere,
    /// `select`/`having`/`order` references a non-grouped column, an
    /// aggregate is nested inside another aggregate, or `GROUP BY` itself
    /// contains an aggregate call.
    IllegalGroupBy { detail: String },
    /// Column access against a row with no such attribute.
    UnknownColumn { name: String },
    /// A call to a function name the built-in namespace doesn't define.
    UnknownFunction { name: String },
    /// A requested row attribute isn't available on this platform (e.g.
    /// `birthtime` where the OS doesn't report file creation time).
    UnsupportedPlatform { feature: String },
    /// The walker's root directory does not exist.
    DirectoryDoesNotExist { path: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CantTokenize { span, excerpt } => {
                write!(f, "can't tokenize at position {}: {:?}...", span.start, excerpt)
            }
            Error::UnknownLiteralSuffix { suffix, span, known } => write!(
                f,
                "unknown literal suffix {:?} at {} (known suffixes: {})",
                suffix,
                span,
                known.join(", ")
            ),
            Error::NotImplementedToken { span, text } => {
                write!(f, "{:?} at {} is not implemented", text, span)
            }
            Error::UnexpectedToken { expected, actual, span } => write!(
                f,
                "expected {} but found {} at {}",
                expected, actual, span
            ),
            Error::UnexpectedEnd => write!(f, "unexpected end of query"),
            Error::ValueExpected { span } => write!(f, "value expected at {}", span),
            Error::OperatorExpected { span } => write!(f, "operator expected at {}", span),
            Error::AggregateInWhere => write!(f, "aggregate functions are not allowed in WHERE"),
            Error::IllegalGroupBy { detail } => write!(f, "illegal GROUP BY: {}", detail),
            Error::UnknownColumn { name } => write!(f, "unknown column: {}", name),
            Error::UnknownFunction { name } => write!(f, "unknown function: {}", name),
            Error::UnsupportedPlatform { feature } => {
                write!(f, "{} is not supported on this platform", feature)
            }
            Error::DirectoryDoesNotExist { path } => {
                write!(f, "directory does not exist: {}", path)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
