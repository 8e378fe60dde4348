use lsql_ast::{Direction, Node, NodeKind};
use lsql_core::{Error, Result, Span, Value};
use lsql_lexer::{
    Keyword, NumberValue, OpKind, Token, TokenKind, RBP_AND, RBP_BETWEEN, RBP_OR, RBP_POWER,
};

/// A raw, unchecked query: each clause is present only if the source text
/// had it. The semantic rewrite pass fills in the rest (§4.4 step 4).
pub struct RawQuery {
    pub select: Option<Node>,
    pub from: Option<Node>,
    pub where_: Option<Node>,
    pub group: Option<Node>,
    pub having: Option<Node>,
    pub order: Option<Node>,
    pub limit: Option<Node>,
    pub offset: Option<Node>,
}

/// Known number-literal unit suffixes (§4.1), case-insensitive.
const SIZE_SUFFIXES: &[(&str, f64)] = &[
    ("k", 1024.0),
    ("kb", 1024.0),
    ("m", 1024.0 * 1024.0),
    ("mb", 1024.0 * 1024.0),
    ("g", 1024.0 * 1024.0 * 1024.0),
    ("gb", 1024.0 * 1024.0 * 1024.0),
];

const TIME_SUFFIXES: &[(&str, f64)] = &[
    ("minute", 60.0),
    ("minutes", 60.0),
    ("hour", 3600.0),
    ("hours", 3600.0),
    ("day", 86400.0),
    ("days", 86400.0),
    ("week", 604800.0),
    ("weeks", 604800.0),
    ("month", 2_592_000.0),
    ("months", 2_592_000.0),
    ("year", 31_536_000.0),
    ("years", 31_536_000.0),
];

fn suffix_factor(suffix: &str) -> Option<f64> {
    let lower = suffix.to_ascii_lowercase();
    SIZE_SUFFIXES
        .iter()
        .chain(TIME_SUFFIXES.iter())
        .find(|(name, _)| *name == lower)
        .map(|(_, factor)| *factor)
}

fn known_suffixes() -> Vec<&'static str> {
    SIZE_SUFFIXES
        .iter()
        .chain(TIME_SUFFIXES.iter())
        .map(|(name, _)| *name)
        .collect()
}

/// The Pratt (operator-precedence) parser (§4.3).
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    fn at_op(&self, op: OpKind) -> bool {
        self.peek().is_op(op)
    }

    fn expect_op(&mut self, op: OpKind) -> Result<Token> {
        if self.at_op(op) {
            Ok(self.advance())
        } else {
            let actual = self.peek().kind.describe();
            let span = self.peek().span;
            Err(Error::UnexpectedToken {
                expected: format!("'{}'", op.text()),
                actual,
                span,
            })
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        if self.at_keyword(kw) {
            Ok(self.advance())
        } else {
            let actual = self.peek().kind.describe();
            let span = self.peek().span;
            Err(Error::UnexpectedToken {
                expected: kw.to_string(),
                actual,
                span,
            })
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        if matches!(self.peek().kind, TokenKind::EndQuery) {
            Ok(())
        } else {
            let actual = self.peek().kind.describe();
            let span = self.peek().span;
            Err(Error::UnexpectedToken {
                expected: "end of query".to_string(),
                actual,
                span,
            })
        }
    }

    fn parse_comma_list(&mut self, mut item: impl FnMut(&mut Self) -> Result<Node>) -> Result<Vec<Node>> {
        let mut items = vec![item(self)?];
        while self.at_op(OpKind::Comma) {
            self.advance();
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Top-level clause driver (§4.3): `SELECT → FROM → WHERE → GROUP →
    /// HAVING → ORDER → LIMIT → OFFSET`, each optional, in that fixed
    /// order, followed by `EndQuery`.
    pub fn parse_query(mut self) -> Result<RawQuery> {
        log::debug!("parser: parsing query ({} tokens)", self.tokens.len());
        let select = self.try_clause(Keyword::Select, Self::parse_select_clause)?;
        let from = self.try_clause(Keyword::From, Self::parse_expr_clause)?;
        let where_ = self.try_clause(Keyword::Where, Self::parse_expr_clause)?;
        let group = self.try_clause(Keyword::Group, Self::parse_group_clause)?;
        let having = self.try_clause(Keyword::Having, Self::parse_having_clause)?;
        let order = self.try_clause(Keyword::Order, Self::parse_order_clause)?;
        let limit = self.try_clause(Keyword::Limit, Self::parse_expr_clause)?;
        let offset = self.try_clause(Keyword::Offset, Self::parse_expr_clause)?;
        self.expect_end()?;
        Ok(RawQuery {
            select,
            from,
            where_,
            group,
            having,
            order,
            limit,
            offset,
        })
    }

    fn try_clause(
        &mut self,
        kw: Keyword,
        f: impl FnOnce(&mut Self) -> Result<Node>,
    ) -> Result<Option<Node>> {
        if self.at_keyword(kw) {
            log::trace!("parser: clause dispatch on {:?}", kw);
            self.advance();
            Ok(Some(f(self)?))
        } else {
            Ok(None)
        }
    }

    fn parse_select_clause(&mut self) -> Result<Node> {
        if self.at_op(OpKind::Star) {
            self.advance();
            return Ok(Node::select_star());
        }
        let items = self.parse_comma_list(|p| p.expr(0))?;
        Ok(Node::new(NodeKind::Select(items)))
    }

    fn parse_expr_clause(&mut self) -> Result<Node> {
        self.expr(0)
    }

    fn parse_group_clause(&mut self) -> Result<Node> {
        self.expect_keyword(Keyword::By)?;
        let items = self.parse_comma_list(|p| p.expr(0))?;
        Ok(Node::new(NodeKind::Group(items)))
    }

    fn parse_having_clause(&mut self) -> Result<Node> {
        let cond = self.expr(0)?;
        Ok(Node::having(cond))
    }

    fn parse_order_clause(&mut self) -> Result<Node> {
        self.expect_keyword(Keyword::By)?;
        let mut items = Vec::new();
        loop {
            let expr = self.expr(0)?;
            let direction = if self.at_keyword(Keyword::Asc) {
                self.advance();
                Direction::Asc
            } else if self.at_keyword(Keyword::Desc) {
                self.advance();
                Direction::Desc
            } else {
                Direction::Asc
            };
            items.push(Node::order_by_part(expr, direction));
            if self.at_op(OpKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(Node::new(NodeKind::Order(items)))
    }

    /// The Pratt expression loop (§4.3): parse a prefix term, then keep
    /// consuming infix operators whose `rbp` exceeds `lbp`.
    fn expr(&mut self, lbp: u32) -> Result<Node> {
        let token = self.advance();
        let mut left = self.prefix(token)?;
        while self.peek().rbp() > lbp {
            let token = self.advance();
            left = self.infix(left, token)?;
        }
        Ok(left)
    }

    fn prefix(&mut self, token: Token) -> Result<Node> {
        match token.kind {
            TokenKind::EndQuery => Err(Error::UnexpectedEnd),
            TokenKind::Keyword(kw) if kw.is_reserved_unimplemented() => {
                Err(Error::NotImplementedToken {
                    span: token.span,
                    text: token.text,
                })
            }
            TokenKind::Keyword(Keyword::Null) => Ok(Node::null()),
            TokenKind::Keyword(Keyword::Count) => {
                let args = self.parse_call_args("count")?;
                Ok(Node::function("count", args))
            }
            TokenKind::Ident(name) => Ok(Node::name(name)),
            TokenKind::Number { value, suffix } => self.resolve_number(value, suffix, token.span),
            TokenKind::String(s) => Ok(Node::value(Value::str(s))),
            TokenKind::Op(OpKind::LParen) => {
                let inner = self.expr(0)?;
                self.expect_op(OpKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Op(OpKind::Minus) => {
                let operand = self.expr(RBP_POWER)?;
                Ok(Node::function("negate", vec![operand]))
            }
            TokenKind::Op(OpKind::Plus) => self.expr(RBP_POWER),
            _ => Err(Error::ValueExpected { span: token.span }),
        }
    }

    fn infix(&mut self, left: Node, token: Token) -> Result<Node> {
        use Keyword::*;
        use OpKind::*;
        match &token.kind {
            TokenKind::Keyword(And) => Ok(Node::and(left, self.expr(RBP_AND)?)),
            TokenKind::Keyword(Or) => Ok(Node::or(left, self.expr(RBP_OR)?)),
            TokenKind::Keyword(Between) => self.parse_between(left),
            TokenKind::Keyword(In) => self.parse_in(left),
            TokenKind::Keyword(Like) => self.binary_call("like", left, token.rbp()),
            TokenKind::Keyword(Ilike) => self.binary_call("ilike", left, token.rbp()),
            TokenKind::Keyword(Rlike) => self.binary_call("rlike", left, token.rbp()),
            TokenKind::Keyword(Rilike) => self.binary_call("rilike", left, token.rbp()),
            TokenKind::Keyword(LikeRegex) => self.binary_call("like_regex", left, token.rbp()),
            TokenKind::Keyword(Contains) => self.binary_call("contains", left, token.rbp()),
            TokenKind::Keyword(Icontains) => self.binary_call("icontains", left, token.rbp()),
            TokenKind::Op(Eq) => self.binary_call("=", left, token.rbp()),
            TokenKind::Op(Lt) => self.binary_call("<", left, token.rbp()),
            TokenKind::Op(Gt) => self.binary_call(">", left, token.rbp()),
            TokenKind::Op(Le) => self.binary_call("<=", left, token.rbp()),
            TokenKind::Op(Ge) => self.binary_call(">=", left, token.rbp()),
            TokenKind::Op(Ne) => self.binary_call("<>", left, token.rbp()),
            TokenKind::Op(Concat) => self.binary_call("||", left, token.rbp()),
            TokenKind::Op(Plus) => self.binary_call("+", left, token.rbp()),
            TokenKind::Op(Minus) => self.binary_call("-", left, token.rbp()),
            TokenKind::Op(Star) => self.binary_call("*", left, token.rbp()),
            TokenKind::Op(Slash) => self.binary_call("/", left, token.rbp()),
            TokenKind::Op(Percent) => self.binary_call("%", left, token.rbp()),
            TokenKind::Op(Caret) => self.binary_call("^", left, token.rbp()),
            TokenKind::Op(LParen) => self.parse_call(left, token.span),
            _ => Err(Error::OperatorExpected { span: token.span }),
        }
    }

    fn binary_call(&mut self, name: &str, left: Node, rbp: u32) -> Result<Node> {
        let right = self.expr(rbp)?;
        Ok(Node::function(name, vec![left, right]))
    }

    fn parse_between(&mut self, left: Node) -> Result<Node> {
        let lo = self.expr(RBP_AND)?;
        self.expect_keyword(Keyword::And)?;
        let hi = self.expr(RBP_BETWEEN)?;
        Ok(Node::between(left, lo, hi))
    }

    fn parse_in(&mut self, left: Node) -> Result<Node> {
        self.expect_op(OpKind::LParen)?;
        let items = if self.at_op(OpKind::RParen) {
            vec![]
        } else {
            self.parse_comma_list(|p| p.expr(0))?
        };
        self.expect_op(OpKind::RParen)?;
        Ok(Node::function("in", vec![left, Node::new(NodeKind::Array(items))]))
    }

    fn parse_call(&mut self, left: Node, paren_span: Span) -> Result<Node> {
        let name = match left.as_name() {
            Some(n) => n.to_string(),
            None => {
                return Err(Error::UnexpectedToken {
                    expected: "identifier before '('".to_string(),
                    actual: "'('".to_string(),
                    span: paren_span,
                })
            }
        };
        let lower = name.to_ascii_lowercase();
        let args = self.parse_call_args(&lower)?;
        Ok(Node::function(lower, args))
    }

    /// Parses a parenthesized argument list, already past the callee name.
    /// Handles `COUNT(*)`/`count(*)` uniformly by injecting a constant `1`
    /// argument (§4.2, §9 Open Question) regardless of how the keyword was
    /// spelled.
    fn parse_call_args(&mut self, name_lower: &str) -> Result<Vec<Node>> {
        self.expect_op(OpKind::LParen)?;
        if name_lower == "count" && self.at_op(OpKind::Star) {
            let checkpoint = self.pos;
            self.advance();
            if self.at_op(OpKind::RParen) {
                self.advance();
                return Ok(vec![Node::value(Value::Int(1))]);
            }
            self.pos = checkpoint;
        }
        if self.at_op(OpKind::RParen) {
            self.advance();
            return Ok(vec![]);
        }
        let items = self.parse_comma_list(|p| p.expr(0))?;
        self.expect_op(OpKind::RParen)?;
        Ok(items)
    }

    fn resolve_number(&self, value: NumberValue, suffix: Option<String>, span: Span) -> Result<Node> {
        let suffix = match suffix {
            None => {
                return Ok(Node::value(match value {
                    NumberValue::Int(i) => Value::Int(i),
                    NumberValue::Float(f) => Value::Float(f),
                }))
            }
            Some(s) => s,
        };
        let factor = suffix_factor(&suffix).ok_or_else(|| Error::UnknownLiteralSuffix {
            suffix: suffix.clone(),
            span,
            known: known_suffixes(),
        })?;
        let result = match value {
            NumberValue::Int(i) if factor.fract() == 0.0 => Value::Int(i * factor as i64),
            NumberValue::Int(i) => Value::Float(i as f64 * factor),
            NumberValue::Float(f) => Value::Float(f * factor),
        };
        Ok(Node::value(result))
    }
}
