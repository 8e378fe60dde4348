use std::fmt;

/// The closed set of reserved words (§4.1). Case-insensitive at lex time;
/// the canonical spelling here is what `Display` renders in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    As,
    Asc,
    Between,
    By,
    Case,
    Contains,
    Count,
    Delete,
    Desc,
    Drop,
    Else,
    End,
    Exists,
    From,
    Group,
    Having,
    Icontains,
    Ilike,
    In,
    Is,
    Isnull,
    Join,
    Left,
    Like,
    LikeRegex,
    Limit,
    Not,
    Notnull,
    Null,
    Offset,
    Or,
    Order,
    Outer,
    Rilike,
    Rlike,
    Select,
    Then,
    Update,
    Where,
}

impl Keyword {
    /// Looks up a keyword by its case-insensitive spelling. Returns `None`
    /// for anything that isn't in the closed reserved-word set — the lexer
    /// then tries the identifier rule instead.
    pub fn lookup(word: &str) -> Option<Keyword> {
        use Keyword::*;
        Some(match word.to_ascii_lowercase().as_str() {
            "and" => And,
            "as" => As,
            "asc" => Asc,
            "between" => Between,
            "by" => By,
            "case" => Case,
            "contains" => Contains,
            "count" => Count,
            "delete" => Delete,
            "desc" => Desc,
            "drop" => Drop,
            "else" => Else,
            "end" => End,
            "exists" => Exists,
            "from" => From,
            "group" => Group,
            "having" => Having,
            "icontains" => Icontains,
            "ilike" => Ilike,
            "in" => In,
            "is" => Is,
            "isnull" => Isnull,
            "join" => Join,
            "left" => Left,
            "like" => Like,
            "like_regex" => LikeRegex,
            "limit" => Limit,
            "not" => Not,
            "notnull" => Notnull,
            "null" => Null,
            "offset" => Offset,
            "or" => Or,
            "order" => Order,
            "outer" => Outer,
            "rilike" => Rilike,
            "rlike" => Rlike,
            "select" => Select,
            "then" => Then,
            "update" => Update,
            "where" => Where,
            _ => return None,
        })
    }

    /// Reserved keywords whose clause/expression behavior the parser
    /// doesn't implement; they lex fine but raise `NotImplementedToken` on
    /// first use (§4.2).
    pub fn is_reserved_unimplemented(self) -> bool {
        matches!(
            self,
            Keyword::Delete
                | Keyword::Update
                | Keyword::Drop
                | Keyword::Join
                | Keyword::Case
                | Keyword::As
                | Keyword::Left
                | Keyword::Outer
                | Keyword::Exists
                | Keyword::Is
                | Keyword::Isnull
                | Keyword::Notnull
                | Keyword::Not
                | Keyword::Else
                | Keyword::End
                | Keyword::Then
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Keyword::*;
        let s = match self {
            And => "AND",
            As => "AS",
            Asc => "ASC",
            Between => "BETWEEN",
            By => "BY",
            Case => "CASE",
            Contains => "CONTAINS",
            Count => "COUNT",
            Delete => "DELETE",
            Desc => "DESC",
            Drop => "DROP",
            Else => "ELSE",
            End => "END",
            Exists => "EXISTS",
            From => "FROM",
            Group => "GROUP",
            Having => "HAVING",
            Icontains => "ICONTAINS",
            Ilike => "ILIKE",
            In => "IN",
            Is => "IS",
            Isnull => "ISNULL",
            Join => "JOIN",
            Left => "LEFT",
            Like => "LIKE",
            LikeRegex => "LIKE_REGEX",
            Limit => "LIMIT",
            Not => "NOT",
            Notnull => "NOTNULL",
            Null => "NULL",
            Offset => "OFFSET",
            Or => "OR",
            Order => "ORDER",
            Outer => "OUTER",
            Rilike => "RILIKE",
            Rlike => "RLIKE",
            Select => "SELECT",
            Then => "THEN",
            Update => "UPDATE",
            Where => "WHERE",
        };
        f.write_str(s)
    }
}
