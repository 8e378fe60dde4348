//! Presentation-layer formatting (§6.2, §6.4): canonical value strings plus
//! the `ansi`-gated colorization of tagged path strings, ported from the
//! Python CLI's `LSCOLORS`-lite `colorize` — fixed colors per tag rather
//! than parsing the environment variable.

use lsql_core::{Tag, Value};

/// A value's canonical textual form. `Value`'s `Display` impl already
/// implements every rule in §6.2 (ISO-8601 timestamps, octal mode, the
/// days/hours/minutes/seconds interval, `NULL`), so this just names that
/// contract for callers outside `lsql-core`.
pub fn render(value: &Value) -> String {
    value.to_string()
}

#[cfg(feature = "ansi")]
pub fn colorize(value: &Value, text: &str) -> String {
    let tags = match value {
        Value::Str(s) => &s.tags,
        _ => return text.to_string(),
    };
    for (tag, code) in [(Tag::Link, "36"), (Tag::Exec, "32"), (Tag::Dir, "34")] {
        if tags.contains(&tag) {
            return format!("\x1b[{}m{}\x1b[0m", code, text);
        }
    }
    text.to_string()
}

#[cfg(not(feature = "ansi"))]
pub fn colorize(_value: &Value, text: &str) -> String {
    text.to_string()
}

#[cfg(all(test, feature = "ansi"))]
mod tests {
    use super::*;
    use lsql_core::TaggedString;

    #[test]
    fn directories_get_colorized_when_tagged() {
        let v = Value::Str(TaggedString::with_tags("src", [Tag::Dir]));
        assert_eq!(colorize(&v, "src"), "\x1b[34msrc\x1b[0m");
    }

    #[test]
    fn untagged_strings_pass_through() {
        let v = Value::str("a.txt");
        assert_eq!(colorize(&v, "a.txt"), "a.txt");
    }
}
