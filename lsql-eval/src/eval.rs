//! The staged tree-walking evaluator (§4.5): row source, filter, group,
//! project/having, sort, slice.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use lsql_ast::{AggId, Direction, Node, NodeKind};
use lsql_core::{
    resolve_column_alias, Context, Error, MapContext, Result, Timestamp, Value, FILE_COLUMNS,
};

use crate::accumulate::Accumulator;
use crate::namespace;
use crate::row::{self, FileRow};

/// A materialized query result: column headers in projection order, and one
/// value vector per output row (§6.2).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Runs a checked `Query` node end to end, using the process's actual
/// current directory as the `cwd` builtin.
pub fn eval_query(query: &Node) -> Result<Table> {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| ".".to_string());
    eval_query_in(query, &cwd)
}

/// Runs a checked `Query` node with `cwd` overridden to `root` — what the
/// CLI's optional `directory` positional argument binds to (the Python
/// original set this the same way: `BUILTIN_CONTEXT['cwd'] = directory or
/// '.'`, rather than changing the process's actual working directory).
pub fn eval_query_in(query: &Node, root: &str) -> Result<Table> {
    let q = match &query.kind {
        NodeKind::Query(q) => q.as_ref(),
        other => panic!("eval_query called on a non-Query node: {:?}", other),
    };

    let now = current_timestamp();
    let builtin = MapContext::new()
        .with("cwd", Value::str(root))
        .with("current_time", Value::Timestamp(now))
        .with("current_date", Value::Timestamp(Timestamp(now.0 - now.0.rem_euclid(86400))));

    let root = from_root(&q.from, &builtin, now)?;
    let walk = row::walk_files(&root)?;
    for path in &walk.denied {
        log::warn!("permission denied, skipping: {}", path);
    }

    let mut kept = Vec::with_capacity(walk.rows.len());
    for r in &walk.rows {
        let v = eval_expr(&q.where_, Some(r), &builtin, None, now)?;
        if v.is_truthy() {
            kept.push(r);
        }
    }

    let groups = build_groups(&q.group, kept, &builtin, now)?;

    let select_items = match &q.select.kind {
        NodeKind::Select(items) => items,
        other => panic!("select clause is always Select after rewrite: {:?}", other),
    };
    let having_cond = match &q.having.kind {
        NodeKind::Having(cond) => cond.as_ref(),
        other => panic!("having clause is always Having after rewrite: {:?}", other),
    };
    let order_parts = match &q.order.kind {
        NodeKind::Order(items) => items,
        other => panic!("order clause is always Order after rewrite: {:?}", other),
    };

    let mut produced: Vec<(Vec<Value>, Vec<(Value, Direction)>)> = Vec::new();
    for group_rows in &groups {
        let mut accum: HashMap<AggId, Accumulator> = HashMap::new();
        for r in group_rows.iter().copied() {
            feed_aggregates(&q.select, r, &builtin, &mut accum, now)?;
            feed_aggregates(&q.having, r, &builtin, &mut accum, now)?;
            feed_aggregates(&q.order, r, &builtin, &mut accum, now)?;
        }
        let representative = group_rows.first().copied();

        if !eval_expr(having_cond, representative, &builtin, Some(&accum), now)?.is_truthy() {
            continue;
        }

        let values = select_items
            .iter()
            .map(|item| eval_expr(item, representative, &builtin, Some(&accum), now))
            .collect::<Result<Vec<_>>>()?;

        let order_keys = order_parts
            .iter()
            .map(|part| match &part.kind {
                NodeKind::OrderByPart(child, dir) => {
                    eval_expr(child, representative, &builtin, Some(&accum), now).map(|v| (v, *dir))
                }
                other => panic!("order item is always OrderByPart: {:?}", other),
            })
            .collect::<Result<Vec<_>>>()?;

        produced.push((values, order_keys));
    }

    produced.sort_by(|(_, a), (_, b)| {
        for ((av, dir), (bv, _)) in a.iter().zip(b.iter()) {
            let ord = av.partial_cmp(bv).unwrap_or(std::cmp::Ordering::Equal);
            let ord = match dir {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });

    let offset = match eval_expr(&q.offset, None, &builtin, None, now)? {
        Value::Int(i) => i.max(0) as usize,
        _ => 0,
    };
    let limit = match eval_expr(&q.limit, None, &builtin, None, now)? {
        Value::Int(i) => Some(i.max(0) as usize),
        _ => None,
    };

    let rows: Vec<Vec<Value>> = produced
        .into_iter()
        .skip(offset)
        .map(|(values, _)| values)
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    let columns = select_items
        .iter()
        .enumerate()
        .map(|(i, item)| select_column_name(item, i))
        .collect();

    Ok(Table { columns, rows })
}

fn current_timestamp() -> Timestamp {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    Timestamp(secs)
}

fn select_column_name(item: &Node, index: usize) -> String {
    match &item.kind {
        NodeKind::Name(n) => n.clone(),
        _ => format!("column_{}", index + 1),
    }
}

/// Evaluates the (already rewrite-wrapped) `FROM` expression's single
/// argument against the outer context to get a directory path (§4.4 step
/// 1). There is never a row in scope here.
fn from_root(from: &Node, outer: &dyn Context, now: Timestamp) -> Result<String> {
    let arg = match &from.kind {
        NodeKind::Function(name, args) if name == "files" => &args[0],
        other => panic!("from clause is always files(...) after rewrite: {:?}", other),
    };
    let value = eval_expr(arg, None, outer, None, now)?;
    match value {
        Value::Str(s) => Ok(s.text),
        other => Ok(other.to_string()),
    }
}

type GroupRows<'a> = Vec<&'a FileRow>;

/// Partitions the filtered rows into groups (§4.5 stage 3). `FakeGroup`
/// makes every row its own singleton group; a real `Group` (including the
/// rewrite-inserted empty one) buckets by key tuple, with `NULL == NULL`
/// collapsing rows into the same bucket, and an empty key list always
/// yields exactly one bucket — even over zero rows — so pure-aggregate
/// queries still produce their one summary row.
fn build_groups<'a>(
    group: &Node,
    rows: Vec<&'a FileRow>,
    outer: &dyn Context,
    now: Timestamp,
) -> Result<Vec<GroupRows<'a>>> {
    match &group.kind {
        NodeKind::FakeGroup => Ok(rows.into_iter().map(|r| vec![r]).collect()),
        NodeKind::Group(keys) if keys.is_empty() => Ok(vec![rows]),
        NodeKind::Group(keys) => {
            let mut buckets: Vec<(Vec<Value>, GroupRows<'a>)> = Vec::new();
            for r in rows {
                let key = keys
                    .iter()
                    .map(|k| eval_expr(k, Some(r), outer, None, now))
                    .collect::<Result<Vec<_>>>()?;
                match buckets.iter_mut().find(|(existing, _)| existing == &key) {
                    Some((_, bucket)) => bucket.push(r),
                    None => buckets.push((key, vec![r])),
                }
            }
            Ok(buckets.into_iter().map(|(_, rows)| rows).collect())
        }
        other => panic!("group clause is always FakeGroup or Group after rewrite: {:?}", other),
    }
}

/// Walks `node` looking for `AggFunction` calls and feeds each one's
/// argument, evaluated against `row`, into its accumulator. Stops
/// descending once an `AggFunction` is found, since the semantic rewrite
/// pass forbids nesting one aggregate inside another.
fn feed_aggregates(
    node: &Node,
    row: &FileRow,
    outer: &dyn Context,
    accum: &mut HashMap<AggId, Accumulator>,
    now: Timestamp,
) -> Result<()> {
    if let NodeKind::AggFunction(name, args, id) = &node.kind {
        let value = eval_expr(&args[0], Some(row), outer, None, now)?;
        accum
            .entry(*id)
            .or_insert_with(|| Accumulator::new(name).expect("lifted aggregate name is always valid"))
            .feed(&value);
        return Ok(());
    }
    for child in node.children() {
        feed_aggregates(child, row, outer, accum, now)?;
    }
    Ok(())
}

/// Resolves a bare `Name` against the row layer first, then the outer
/// (builtin) layer. The row layer bypasses the generic [`Context`] trait —
/// whose `get` can only return `Option`, not a typed error — so that
/// [`FileRow::column`]'s `UnsupportedPlatform`/`UnknownColumn` failures
/// reach the caller intact.
fn resolve_name(name: &str, row: Option<&FileRow>, outer: &dyn Context) -> Result<Value> {
    let canonical = resolve_column_alias(name);
    if let Some(row) = row {
        if FILE_COLUMNS.contains(&canonical.as_str()) {
            return row.column(&canonical);
        }
    }
    outer.get(name).ok_or_else(|| Error::UnknownColumn {
        name: name.to_string(),
    })
}

fn eval_expr(
    node: &Node,
    row: Option<&FileRow>,
    outer: &dyn Context,
    accum: Option<&HashMap<AggId, Accumulator>>,
    now: Timestamp,
) -> Result<Value> {
    match &node.kind {
        NodeKind::Null => Ok(Value::Null),
        NodeKind::Value(v) => Ok(v.clone()),
        NodeKind::Name(name) => resolve_name(name, row, outer),
        NodeKind::Array(items) => {
            let values = items
                .iter()
                .map(|item| eval_expr(item, row, outer, accum, now))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(values))
        }
        NodeKind::Function(name, args) => {
            let values = args
                .iter()
                .map(|a| eval_expr(a, row, outer, accum, now))
                .collect::<Result<Vec<_>>>()?;
            namespace::call(name, &values, now)
        }
        NodeKind::AggFunction(name, _, id) => {
            let value = match accum.and_then(|map| map.get(id)) {
                Some(a) => a.value(),
                None => Accumulator::new(name)?.value(),
            };
            Ok(value)
        }
        NodeKind::And(l, r) => {
            let l = eval_expr(l, row, outer, accum, now)?;
            let r = eval_expr(r, row, outer, accum, now)?;
            Ok(three_valued_and(l, r))
        }
        NodeKind::Or(l, r) => {
            let l = eval_expr(l, row, outer, accum, now)?;
            let r = eval_expr(r, row, outer, accum, now)?;
            Ok(three_valued_or(l, r))
        }
        NodeKind::Between(v, lo, hi) => {
            let v = eval_expr(v, row, outer, accum, now)?;
            let lo = eval_expr(lo, row, outer, accum, now)?;
            let hi = eval_expr(hi, row, outer, accum, now)?;
            let ge = namespace::call(">=", &[v.clone(), lo], now)?;
            let le = namespace::call("<=", &[v, hi], now)?;
            Ok(three_valued_and(ge, le))
        }
        NodeKind::OrderByPart(child, _) => eval_expr(child, row, outer, accum, now),
        other => panic!("not an expression node: {:?}", other),
    }
}

/// Three-valued `AND`/`OR` (§6.5): a `FALSE`/`TRUE` short-circuits the
/// result regardless of the other side's nullness; otherwise any `NULL`
/// makes the whole expression `NULL`.
fn three_valued_and(l: Value, r: Value) -> Value {
    let truth = |v: &Value| if v.is_null() { None } else { Some(v.is_truthy()) };
    match (truth(&l), truth(&r)) {
        (Some(false), _) | (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => Value::Null,
    }
}

fn three_valued_or(l: Value, r: Value) -> Value {
    let truth = |v: &Value| if v.is_null() { None } else { Some(v.is_truthy()) };
    match (truth(&l), truth(&r)) {
        (Some(true), _) | (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run(dir: &std::path::Path, query: &str) -> Table {
        let node = lsql_parser::parse(&query.replace("__DIR__", dir.to_str().unwrap())).unwrap();
        eval_query(&node).unwrap()
    }

    #[test]
    fn selects_default_columns_when_select_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let table = run(dir.path(), "from files('__DIR__')");
        assert_eq!(table.columns, vec!["name", "size", "mode", "mtime"]);
        assert!(table.rows.iter().any(|r| r[0] == Value::str("a.txt")));
    }

    #[test]
    fn where_filters_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();
        fs::write(dir.path().join("b.log"), "hi").unwrap();
        let table = run(dir.path(), "select name from files('__DIR__') where extension = 'txt'");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Value::str("a.txt"));
    }

    #[test]
    fn count_star_over_an_empty_directory_is_zero_not_absent() {
        let dir = tempfile::tempdir().unwrap();
        let table = run(dir.path(), "select count(*) from files('__DIR__')");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Value::Int(0));
    }

    #[test]
    fn group_by_buckets_and_aggregates_per_bucket() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();
        fs::write(dir.path().join("b.txt"), "hi").unwrap();
        fs::write(dir.path().join("c.log"), "hi").unwrap();
        let table = run(
            dir.path(),
            "select extension, count(*) from files('__DIR__') group by extension order by extension",
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Value::str("log"));
        assert_eq!(table.rows[0][1], Value::Int(1));
        assert_eq!(table.rows[1][0], Value::str("txt"));
        assert_eq!(table.rows[1][1], Value::Int(2));
    }

    #[test]
    fn order_by_desc_and_limit_offset_slice_the_result() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let table = run(
            dir.path(),
            "select name from files('__DIR__') order by name desc limit 1 offset 1",
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Value::str("b.txt"));
    }

    #[test]
    fn having_filters_groups_after_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();
        fs::write(dir.path().join("b.txt"), "hi").unwrap();
        fs::write(dir.path().join("c.log"), "hi").unwrap();
        let table = run(
            dir.path(),
            "select extension, count(*) from files('__DIR__') group by extension having count(*) > 1",
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Value::str("txt"));
    }

    #[test]
    fn three_valued_and_short_circuits_on_false_even_with_a_null_operand() {
        assert_eq!(three_valued_and(Value::Bool(false), Value::Null), Value::Bool(false));
        assert_eq!(three_valued_and(Value::Bool(true), Value::Null), Value::Null);
    }

    #[test]
    fn three_valued_or_short_circuits_on_true_even_with_a_null_operand() {
        assert_eq!(three_valued_or(Value::Bool(true), Value::Null), Value::Bool(true));
        assert_eq!(three_valued_or(Value::Bool(false), Value::Null), Value::Null);
    }
}
