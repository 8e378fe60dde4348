//! Black-box scenarios run against `tests/fixtures/base/`: `README.md`,
//! `LICENSE`, `small.py` (4 lines), and subdirectory `small/` containing
//! its own `LICENSE` (1 line).

use lsql_core::{Error, Value};

fn fixture_dir() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/base").to_string()
}

fn query(sql: &str) -> lsql_eval::Table {
    lsql::run_in(sql, &fixture_dir()).unwrap()
}

fn names(table: &lsql_eval::Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|r| match &r[0] {
            Value::Str(s) => s.text.clone(),
            other => panic!("expected a name string, got {:?}", other),
        })
        .collect()
}

#[test]
fn selecting_name_lists_every_entry_recursively() {
    let table = query("select name");
    let mut found = names(&table);
    found.sort();
    assert_eq!(found, vec!["LICENSE", "LICENSE", "README.md", "small", "small.py"]);
}

#[test]
fn filtering_by_extension_alias_finds_the_python_file() {
    let table = query("select name where ext = 'py'");
    assert_eq!(names(&table), vec!["small.py"]);
}

#[test]
fn ordering_by_size_with_a_limit_surfaces_the_smallest_file() {
    let table = query("select name where type = 'file' order by size limit 1");
    assert_eq!(table.rows.len(), 1);
}

#[test]
fn length_of_lines_is_null_for_directories() {
    let table = query("select name, length(lines)");
    for row in &table.rows {
        let name = match &row[0] {
            Value::Str(s) => s.text.as_str(),
            _ => unreachable!(),
        };
        match name {
            "small.py" => assert_eq!(row[1], Value::Int(4)),
            "small" => assert_eq!(row[1], Value::Null),
            "README.md" | "LICENSE" => assert_eq!(row[1], Value::Int(1)),
            other => panic!("unexpected entry: {}", other),
        }
    }
}

#[test]
fn group_by_name_with_having_isolates_one_row() {
    let table = query("select name, count(*) group by name having name = 'small.py'");
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0], vec![Value::str("small.py"), Value::Int(1)]);
}

#[test]
fn arithmetic_follows_normal_operator_precedence() {
    let table = query("select 1 + 7 * 3 limit 1");
    assert_eq!(table.rows[0][0], Value::Int(22));

    let table = query("select (-1-4-3) * 5 limit 1");
    assert_eq!(table.rows[0][0], Value::Int(-40));

    let table = query("select 8 / (2 * +2) limit 1");
    assert_eq!(table.rows[0][0], Value::Int(2));
}

#[test]
fn between_filters_on_line_count() {
    let table = query("select name where length(lines) between 2 and 4");
    assert_eq!(names(&table), vec!["small.py"]);
}

#[test]
fn ungrouped_column_alongside_an_aggregate_is_illegal_group_by() {
    let err = lsql::parse("select size group by name").unwrap_err();
    assert!(matches!(err, Error::IllegalGroupBy { .. }));
}

#[test]
fn unknown_literal_suffix_is_rejected_at_parse_time() {
    let err = lsql::parse("select 5badsuffix").unwrap_err();
    assert!(matches!(err, Error::UnknownLiteralSuffix { .. }));
}

#[test]
fn unterminated_string_cannot_be_tokenized() {
    let err = lsql::parse("select 'unterminated").unwrap_err();
    assert!(matches!(err, Error::CantTokenize { .. }));
}

#[test]
fn nonexistent_directory_is_reported() {
    let err = lsql::run_in("select name", "/no/such/directory/lsql-fixture-test").unwrap_err();
    assert!(matches!(err, Error::DirectoryDoesNotExist { .. }));
}

#[test]
fn case_insensitivity_applies_to_keywords_and_column_names() {
    let a = query("SELECT NAME WHERE SIZE > 0 ORDER BY NAME");
    let b = query("select name where size > 0 order by name");
    assert_eq!(names(&a), names(&b));
}
