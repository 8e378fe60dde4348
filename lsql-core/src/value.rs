use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A tag attached to a path-valued string, consumed only by the external
/// presentation layer for colorization. Tags are data, never behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Dir,
    File,
    Link,
    Mount,
    Exec,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tag::Dir => "dir",
            Tag::File => "file",
            Tag::Link => "link",
            Tag::Mount => "mount",
            Tag::Exec => "exec",
        };
        f.write_str(s)
    }
}

/// A string carrying a set of presentation tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TaggedString {
    pub text: String,
    pub tags: BTreeSet<Tag>,
}

impl TaggedString {
    pub fn plain(text: impl Into<String>) -> Self {
        TaggedString {
            text: text.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags(text: impl Into<String>, tags: impl IntoIterator<Item = Tag>) -> Self {
        TaggedString {
            text: text.into(),
            tags: tags.into_iter().collect(),
        }
    }
}

impl fmt::Display for TaggedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Unix file mode bits, rendered in its canonical octal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mode(pub u32);

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

/// Seconds since the Unix epoch, rendered as local ISO-8601.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn to_iso8601(self) -> String {
        use chrono::{Local, TimeZone};
        match Local.timestamp_opt(self.0, 0) {
            chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
            _ => format!("invalid-timestamp({})", self.0),
        }
    }
}

/// A non-negative duration in whole seconds, rendered as
/// `N days, N hours, N minutes, N seconds`, keeping up to three non-zero
/// components, with singular/plural inflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(pub i64);

impl Interval {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 3600;
    const DAY: i64 = 86400;

    pub fn as_seconds(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.0.max(0);
        let days = remaining / Self::DAY;
        remaining -= days * Self::DAY;
        let hours = remaining / Self::HOUR;
        remaining -= hours * Self::HOUR;
        let minutes = remaining / Self::MINUTE;
        remaining -= minutes * Self::MINUTE;
        let seconds = remaining;

        let mut parts = Vec::new();
        for (n, singular) in [(days, "day"), (hours, "hour"), (minutes, "minute"), (seconds, "second")] {
            if n != 0 {
                parts.push(pluralize(n, singular));
            }
            if parts.len() == 3 {
                break;
            }
        }
        if parts.is_empty() {
            parts.push(pluralize(0, "second"));
        }
        f.write_str(&parts.join(", "))
    }
}

fn pluralize(n: i64, singular: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}s", n, singular)
    }
}

/// The runtime tagged union every expression evaluates to.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(TaggedString),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Timestamp(Timestamp),
    Mode(Mode),
    Interval(Interval),
    /// A row of named columns, used for the `files(dir)` virtual table's
    /// declared row type and for nested composite values.
    Row(Vec<(String, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(TaggedString::plain(s))
    }

    pub fn tagged_str(s: impl Into<String>, tags: impl IntoIterator<Item = Tag>) -> Self {
        Value::Str(TaggedString::with_tags(s, tags))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness in boolean (`WHERE`/`HAVING`) context. `NULL` is falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.text.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(l) => !l.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Timestamp(_) => "timestamp",
            Value::Mode(_) => "mode",
            Value::Interval(_) => "interval",
            Value::Row(_) => "row",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(&s.text),
            Value::Bytes(b) => write!(f, "{:?}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Timestamp(ts) => f.write_str(&ts.to_iso8601()),
            Value::Mode(m) => write!(f, "{}", m),
            Value::Interval(iv) => write!(f, "{}", iv),
            Value::Row(_) => f.write_str("<row>"),
        }
    }
}

/// Natural equality of runtime values, used for `GROUP BY` key comparison,
/// where `NULL = NULL` is defined to be true (distinct from SQL's usual
/// three-valued equality, which this type does *not* implement via
/// `PartialEq` — see [`sql_eq`] in the evaluator for three-valued `=`).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.text == b.text,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Mode(a), Value::Mode(b)) => a == b,
            (Value::Interval(a), Value::Interval(b)) => a == b,
            (Value::Row(a), Value::Row(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordering used for `ORDER BY` and for comparison operators: `NULL` sorts
/// strictly before any non-`NULL` value.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.text.partial_cmp(&b.text),
            (Value::Bytes(a), Value::Bytes(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Mode(a), Value::Mode(b)) => a.partial_cmp(b),
            (Value::Interval(a), Value::Interval(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_before_everything() {
        assert!(Value::Null < Value::Int(i64::MIN));
        assert_eq!(Value::Null.partial_cmp(&Value::Null), Some(Ordering::Equal));
    }

    #[test]
    fn null_is_falsy() {
        assert!(!Value::Null.is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
    }

    #[test]
    fn null_equals_null_for_group_keys() {
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn interval_renders_up_to_three_components() {
        let iv = Interval(2 * 86400 + 3 * 3600 + 61);
        assert_eq!(iv.to_string(), "2 days, 3 hours, 1 minute");
    }

    #[test]
    fn interval_zero_is_zero_seconds() {
        assert_eq!(Interval(0).to_string(), "0 seconds");
    }

    #[test]
    fn mode_renders_as_octal() {
        assert_eq!(Mode(0o755).to_string(), "755");
    }
}
