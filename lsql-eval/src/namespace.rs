//! The built-in, case-insensitive namespace (§6.4): scalar functions,
//! infix operators exposed as ordinary function calls, pattern matching,
//! and the comparison helpers that give `=`/`<`/... their three-valued
//! NULL semantics.

use lsql_core::{Error, Interval, Result, Timestamp, Value};
use regex::RegexBuilder;

/// Dispatches a non-aggregate function call by its lowercased name.
/// Aggregate names (`count`, `sum`, `min`, `max`, `avg`) never reach here —
/// the semantic rewrite pass lifts them into `AggFunction` nodes, which the
/// evaluator feeds through [`crate::accumulate::Accumulator`] instead.
pub fn call(name: &str, args: &[Value], now: Timestamp) -> Result<Value> {
    match name {
        "+" => numeric2(args, |a, b| a + b),
        "-" => numeric2(args, |a, b| a - b),
        "*" => numeric2(args, |a, b| a * b),
        "/" => numeric2(args, |a, b| a / b),
        "%" => numeric2(args, |a, b| a % b),
        "^" => numeric2(args, f64::powf),
        "negate" => negate(args),
        "||" => concat_operator(args),
        "=" => Ok(three_valued_cmp(&args[0], &args[1], |o| o == std::cmp::Ordering::Equal)),
        "<>" => Ok(three_valued_cmp(&args[0], &args[1], |o| o != std::cmp::Ordering::Equal)),
        "<" => Ok(three_valued_cmp(&args[0], &args[1], |o| o == std::cmp::Ordering::Less)),
        "<=" => Ok(three_valued_cmp(&args[0], &args[1], |o| o != std::cmp::Ordering::Greater)),
        ">" => Ok(three_valued_cmp(&args[0], &args[1], |o| o == std::cmp::Ordering::Greater)),
        ">=" => Ok(three_valued_cmp(&args[0], &args[1], |o| o != std::cmp::Ordering::Less)),
        "in" => Ok(in_list(&args[0], &args[1])),
        "lower" => propagate_null(args, |v| Ok(Value::str(as_str(v)?.to_lowercase()))),
        "upper" => propagate_null(args, |v| Ok(Value::str(as_str(v)?.to_uppercase()))),
        "length" => propagate_null(args, |v| Ok(Value::Int(length_of(v)? as i64))),
        "age" => propagate_null(args, |v| age(v, now)),
        "btrim" => btrim(args),
        "concat" => Ok(concat_function(args)),
        "like" => pattern(args, PatternKind::Like, false),
        "ilike" => pattern(args, PatternKind::Like, true),
        "rlike" => pattern(args, PatternKind::Regex, false),
        "rilike" => pattern(args, PatternKind::Regex, true),
        "like_regex" => pattern(args, PatternKind::PlainRegex, false),
        "contains" => pattern(args, PatternKind::Substring, false),
        "icontains" => pattern(args, PatternKind::Substring, true),
        other => Err(Error::UnknownFunction {
            name: other.to_string(),
        }),
    }
}

fn as_f64(v: &Value) -> Result<f64> {
    v.as_f64().ok_or_else(|| Error::UnknownFunction {
        name: format!("<arithmetic on {}>", v.type_name()),
    })
}

fn as_str(v: &Value) -> Result<String> {
    match v {
        Value::Str(s) => Ok(s.text.clone()),
        other => Ok(other.to_string()),
    }
}

/// Both `+`/`-`/... and the comparison operators propagate `NULL`: "for any
/// scalar operator op in {+,-,*,/,%,^,||,=,<>,<,<=,>,>=}, if any argument is
/// NULL, the result is NULL" (§8).
fn numeric2(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    let a = as_f64(&args[0])?;
    let b = as_f64(&args[1])?;
    let result = f(a, b);
    if matches!((&args[0], &args[1]), (Value::Int(_), Value::Int(_))) && result.fract() == 0.0 {
        Ok(Value::Int(result as i64))
    } else {
        Ok(Value::Float(result))
    }
}

fn negate(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(Error::UnknownFunction {
            name: format!("<negate on {}>", other.type_name()),
        }),
    }
}

fn concat_operator(args: &[Value]) -> Result<Value> {
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::str(format!("{}{}", as_str(&args[0])?, as_str(&args[1])?)))
}

/// `concat(...)` the scalar function, unlike `||`, silently drops `NULL`
/// arguments (§6.5).
fn concat_function(args: &[Value]) -> Value {
    let mut out = String::new();
    for arg in args {
        if !arg.is_null() {
            out.push_str(&arg.to_string());
        }
    }
    Value::str(out)
}

fn three_valued_cmp(a: &Value, b: &Value, matches_ordering: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    if a.is_null() || b.is_null() {
        return Value::Null;
    }
    match a.partial_cmp(b) {
        Some(ord) => Value::Bool(matches_ordering(ord)),
        None => Value::Null,
    }
}

fn in_list(needle: &Value, haystack: &Value) -> Value {
    if needle.is_null() {
        return Value::Null;
    }
    match haystack {
        Value::List(items) => Value::Bool(items.iter().any(|item| item == needle)),
        _ => Value::Bool(false),
    }
}

fn length_of(v: &Value) -> Result<usize> {
    match v {
        Value::Str(s) => Ok(s.text.chars().count()),
        Value::Bytes(b) => Ok(b.len()),
        Value::List(l) => Ok(l.len()),
        other => Err(Error::UnknownFunction {
            name: format!("<length of {}>", other.type_name()),
        }),
    }
}

fn age(v: &Value, now: Timestamp) -> Result<Value> {
    match v {
        Value::Timestamp(ts) => Ok(Value::Interval(Interval((now.0 - ts.0).max(0)))),
        other => Err(Error::UnknownFunction {
            name: format!("<age of {}>", other.type_name()),
        }),
    }
}

fn btrim(args: &[Value]) -> Result<Value> {
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let text = as_str(&args[0])?;
    let chars: Vec<char> = match args.get(1) {
        Some(Value::Null) | None => vec![' ', '\t', '\n', '\r'],
        Some(v) => as_str(v)?.chars().collect(),
    };
    Ok(Value::str(text.trim_matches(|c| chars.contains(&c)).to_string()))
}

fn propagate_null(args: &[Value], f: impl Fn(&Value) -> Result<Value>) -> Result<Value> {
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    f(&args[0])
}

enum PatternKind {
    Like,
    Regex,
    PlainRegex,
    Substring,
}

/// SQL `LIKE`/`ILIKE`/regex/substring matching (§6.4). `args[0]` is the
/// value to test (a scalar or a list, e.g. the `lines` column), `args[1]`
/// is the pattern.
fn pattern(args: &[Value], kind: PatternKind, case_insensitive: bool) -> Result<Value> {
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    let needle = as_str(&args[1])?;

    let matches_one = |haystack: &str| -> Result<bool> {
        match kind {
            PatternKind::Substring => Ok(if case_insensitive {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            } else {
                haystack.contains(&needle)
            }),
            PatternKind::Like => {
                let re = like_pattern_to_regex(&needle);
                Ok(build_regex(&re, case_insensitive)?.is_match(haystack))
            }
            PatternKind::Regex => {
                let re = format!("(?s){}$", needle);
                Ok(build_regex(&re, case_insensitive)?.is_match(haystack))
            }
            PatternKind::PlainRegex => Ok(build_regex(&needle, case_insensitive)?.is_match(haystack)),
        }
    };

    match &args[0] {
        Value::List(items) => {
            for item in items {
                if matches_one(&as_str(item)?)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        scalar => Ok(Value::Bool(matches_one(&as_str(scalar)?)?)),
    }
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<regex::Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|_| Error::UnknownFunction {
            name: format!("<invalid pattern {:?}>", pattern),
        })
}

fn like_pattern_to_regex(pattern: &str) -> String {
    let mut re = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    re
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp(1_700_000_000)
    }

    #[test]
    fn arithmetic_propagates_null() {
        assert_eq!(call("+", &[Value::Null, Value::Int(1)], now()).unwrap(), Value::Null);
    }

    #[test]
    fn arithmetic_stays_integral_when_exact() {
        assert_eq!(call("+", &[Value::Int(1), Value::Int(2)], now()).unwrap(), Value::Int(3));
        assert_eq!(call("/", &[Value::Int(8), Value::Int(4)], now()).unwrap(), Value::Int(2));
    }

    #[test]
    fn comparison_with_null_is_null_not_false() {
        assert_eq!(call("=", &[Value::Null, Value::Int(1)], now()).unwrap(), Value::Null);
    }

    #[test]
    fn concat_function_drops_nulls_but_operator_propagates() {
        assert_eq!(
            concat_function(&[Value::str("a"), Value::Null, Value::str("b")]),
            Value::str("ab")
        );
        assert_eq!(
            call("||", &[Value::str("a"), Value::Null], now()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn like_translates_percent_and_underscore() {
        let r = call("like", &[Value::str("small.py"), Value::str("%.py")], now()).unwrap();
        assert_eq!(r, Value::Bool(true));
        let r = call("like", &[Value::str("small.pyc"), Value::str("%.py")], now()).unwrap();
        assert_eq!(r, Value::Bool(false));
    }

    #[test]
    fn ilike_is_case_insensitive() {
        let r = call("ilike", &[Value::str("README.MD"), Value::str("readme%")], now()).unwrap();
        assert_eq!(r, Value::Bool(true));
    }

    #[test]
    fn pattern_over_list_matches_if_any_element_matches() {
        let lines = Value::List(vec![Value::str("hello"), Value::str("world")]);
        let r = call("contains", &[lines, Value::str("wor")], now()).unwrap();
        assert_eq!(r, Value::Bool(true));
    }

    #[test]
    fn in_checks_membership_in_a_list() {
        let list = Value::List(vec![Value::str("py"), Value::str("rs")]);
        assert_eq!(in_list(&Value::str("py"), &list), Value::Bool(true));
        assert_eq!(in_list(&Value::str("go"), &list), Value::Bool(false));
    }

    #[test]
    fn age_computes_an_interval_from_now() {
        let r = call("age", &[Value::Timestamp(Timestamp(now().0 - 3600))], now()).unwrap();
        assert_eq!(r, Value::Interval(Interval(3600)));
    }

    #[test]
    fn unknown_function_is_an_error() {
        let err = call("frobnicate", &[Value::Int(1)], now()).unwrap_err();
        assert!(matches!(err, Error::UnknownFunction { .. }));
    }
}
