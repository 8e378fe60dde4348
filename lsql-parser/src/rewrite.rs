use lsql_ast::{AggIdGen, Node, NodeKind, NodeTransformer, QueryNode};
use lsql_core::{
    resolve_column_alias, Error, Result, Value, FILE_COLUMNS, FILE_DEFAULT_COLUMNS,
    FILE_STAR_COLUMNS,
};

use crate::parser::RawQuery;

/// Runs the semantic rewrite pass over a raw, clause-by-clause parse (§4.4):
/// fills in every omitted clause with its default, expands `SELECT *`,
/// decides whether the query groups at all, lifts aggregate calls out of
/// plain function calls, and checks the `GROUP BY` legality rules before
/// handing back a checked `Query` node.
pub fn rewrite(raw: RawQuery) -> Result<Node> {
    let from = finalize_from(raw.from);
    let select = expand_select(raw.select);
    let where_ = raw.where_.unwrap_or_else(|| Node::value(Value::Bool(true)));
    let order = raw.order.unwrap_or_else(|| Node::new(NodeKind::Order(vec![])));
    let limit = raw.limit.unwrap_or_else(Node::null);
    let offset = raw.offset.unwrap_or_else(|| Node::value(Value::Int(0)));
    let having_present = raw.having.is_some();
    let having = raw
        .having
        .unwrap_or_else(|| Node::having(Node::value(Value::Bool(true))));

    if find_aggregate_call(&where_) {
        return Err(Error::AggregateInWhere);
    }

    let group = raw.group.unwrap_or_else(|| {
        let has_aggregate = find_aggregate_call(&select)
            || find_aggregate_call(&order)
            || find_aggregate_call(&having);
        if has_aggregate || having_present {
            Node::new(NodeKind::Group(Vec::new()))
        } else {
            Node::fake_group()
        }
    });

    let group_keys = match &group.kind {
        NodeKind::Group(items) => Some(items.clone()),
        _ => None,
    };
    if let Some(keys) = &group_keys {
        for key in keys {
            if find_aggregate_call(key) {
                return Err(Error::IllegalGroupBy {
                    detail: "GROUP BY expressions cannot contain aggregate functions".to_string(),
                });
            }
        }
    }

    let mut lifter = LiftAggregates {
        gen: AggIdGen::new(),
        error: None,
    };
    let select = lifter.transform(select);
    let having = lifter.transform(having);
    let order = lifter.transform(order);
    if let Some(err) = lifter.error {
        return Err(err);
    }

    if let Some(keys) = &group_keys {
        check_legal(&select, keys)?;
        check_legal(&having, keys)?;
        check_legal(&order, keys)?;
    }

    Ok(Node::new(NodeKind::Query(Box::new(QueryNode {
        select,
        from,
        where_,
        group,
        having,
        order,
        limit,
        offset,
    }))))
}

/// The implicit `FROM` (§4.4 step 1): an omitted `FROM` becomes `Name("cwd")`
/// (resolved by the outer context at evaluation time), and a bare name or
/// literal `FROM` expression is wrapped as a `files(...)` call so the rest
/// of the pipeline only ever sees a virtual-table call.
fn finalize_from(raw_from: Option<Node>) -> Node {
    let from = raw_from.unwrap_or_else(|| Node::name("cwd"));
    match &from.kind {
        NodeKind::Name(_) | NodeKind::Value(_) => Node::function("files", vec![from]),
        _ => from,
    }
}

/// `SELECT *` expansion and the bare-`SELECT` default (§4.4 step 3, §9 Open
/// Question on `star`/default column sets).
fn expand_select(raw_select: Option<Node>) -> Node {
    match raw_select {
        None => Node::new(NodeKind::Select(
            FILE_DEFAULT_COLUMNS.iter().map(|c| Node::name(*c)).collect(),
        )),
        Some(node) => match node.kind {
            NodeKind::SelectStar => Node::new(NodeKind::Select(
                FILE_STAR_COLUMNS.iter().map(|c| Node::name(*c)).collect(),
            )),
            other => Node::new(other),
        },
    }
}

/// True if `node` contains, anywhere in its subtree, a plain (not yet
/// lifted) function call whose name is one of the aggregate names. Used to
/// reject aggregates in `WHERE` and in `GROUP BY` expressions, where lifting
/// never runs, and to decide whether an omitted `GROUP BY` still needs an
/// empty `Group([])` rather than `FakeGroup`.
fn find_aggregate_call(node: &Node) -> bool {
    if let NodeKind::Function(name, _) = &node.kind {
        if Node::is_aggregate_name(name) {
            return true;
        }
    }
    node.children().iter().any(|c| find_aggregate_call(c))
}

/// True if `node` contains an already-lifted `AggFunction` anywhere in its
/// subtree.
fn contains_agg_function(node: &Node) -> bool {
    if matches!(node.kind, NodeKind::AggFunction(..)) {
        return true;
    }
    node.children().iter().any(|c| contains_agg_function(c))
}

/// The `GROUP BY` legality check (§4.4 step 9, Design Notes §9): a node is
/// legal when a real `Group` is present if it's itself an aggregate call, or
/// if it (or some node on the path down to it) structurally equals one of
/// the `GROUP BY` key expressions. There is no parent pointer here — the
/// "ancestor" half of "self or ancestor" falls out of the recursion
/// short-circuiting as soon as a match is found on the way down, rather
/// than walking up from a leaf.
///
/// Only `Name`s that resolve to a real row column are subject to this check.
/// A bare name such as `current_time` or `cwd` names a builtin constant, not
/// a row column, and is legal anywhere regardless of grouping.
fn check_legal(node: &Node, group_keys: &[Node]) -> Result<()> {
    if matches!(node.kind, NodeKind::AggFunction(..)) {
        return Ok(());
    }
    if group_keys.iter().any(|key| key == node) {
        return Ok(());
    }
    if let NodeKind::Name(name) = &node.kind {
        if FILE_COLUMNS.contains(&resolve_column_alias(name).as_str()) {
            return Err(Error::IllegalGroupBy {
                detail: format!("column '{}' must appear in GROUP BY or inside an aggregate", name),
            });
        }
        return Ok(());
    }
    for child in node.children() {
        check_legal(child, group_keys)?;
    }
    Ok(())
}

/// Bottom-up rewrite that turns a plain `Function(name, args)` call into an
/// `AggFunction` when `name` is an aggregate name, assigning it a fresh
/// [`lsql_ast::AggId`]. Because [`NodeTransformer::transform`] recurses into
/// children before calling `transform_node`, any inner aggregate has
/// already been lifted by the time an outer one is considered, which is
/// what lets nesting be detected by checking the (already-transformed) args
/// for an `AggFunction`.
struct LiftAggregates {
    gen: AggIdGen,
    error: Option<Error>,
}

impl NodeTransformer for LiftAggregates {
    fn transform_node(&mut self, node: Node) -> Node {
        if self.error.is_some() {
            return node;
        }
        let Node { kind, location } = node;
        match kind {
            NodeKind::Function(name, args) if Node::is_aggregate_name(&name) => {
                if args.iter().any(contains_agg_function) {
                    self.error = Some(Error::IllegalGroupBy {
                        detail: format!("aggregate '{}' cannot contain a nested aggregate", name),
                    });
                    return Node {
                        kind: NodeKind::Function(name, args),
                        location,
                    };
                }
                let id = self.gen.next();
                Node {
                    kind: NodeKind::AggFunction(name, args, id),
                    location,
                }
            }
            other => Node {
                kind: other,
                location,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn rewrite_query(src: &str) -> Result<Node> {
        let tokens = lsql_lexer::tokenize(src).unwrap();
        let raw = Parser::new(tokens).parse_query().unwrap();
        rewrite(raw)
    }

    fn query_node(result: &Node) -> &QueryNode {
        match &result.kind {
            NodeKind::Query(q) => q,
            other => panic!("expected Query, got {:?}", other),
        }
    }

    #[test]
    fn omitted_from_wraps_the_cwd_name_in_files() {
        let q = rewrite_query("select name").unwrap();
        let q = query_node(&q);
        assert_eq!(q.from, Node::function("files", vec![Node::name("cwd")]));
    }

    #[test]
    fn string_from_is_wrapped_in_files() {
        let q = rewrite_query("select name from 'sub'").unwrap();
        let q = query_node(&q);
        assert_eq!(q.from, Node::function("files", vec![Node::value(Value::str("sub"))]));
    }

    #[test]
    fn explicit_files_call_passes_through_unwrapped() {
        let q = rewrite_query("select name from files('sub')").unwrap();
        let q = query_node(&q);
        assert_eq!(
            q.from,
            Node::function("files", vec![Node::value(Value::str("sub"))])
        );
    }

    #[test]
    fn star_expands_to_file_star_columns() {
        let q = rewrite_query("select * from files('.')").unwrap();
        let q = query_node(&q);
        match &q.select.kind {
            NodeKind::Select(items) => assert_eq!(items.len(), FILE_STAR_COLUMNS.len()),
            other => panic!("expected Select, got {:?}", other),
        }
    }

    #[test]
    fn bare_select_uses_the_small_default_set() {
        let q = rewrite_query("where size > 0").unwrap();
        let q = query_node(&q);
        match &q.select.kind {
            NodeKind::Select(items) => assert_eq!(items.len(), FILE_DEFAULT_COLUMNS.len()),
            other => panic!("expected Select, got {:?}", other),
        }
        assert_eq!(q.group, Node::fake_group());
    }

    #[test]
    fn aggregate_in_where_is_rejected() {
        let err = rewrite_query("select name where count(*) > 1").unwrap_err();
        assert_eq!(err, Error::AggregateInWhere);
    }

    #[test]
    fn nested_aggregate_is_rejected() {
        let err = rewrite_query("select count(sum(size))").unwrap_err();
        assert!(matches!(err, Error::IllegalGroupBy { .. }));
    }

    #[test]
    fn omitted_group_with_an_aggregate_select_still_groups_into_one_bucket() {
        let q = rewrite_query("select count(*) from files('.')").unwrap();
        let q = query_node(&q);
        assert_eq!(q.group, Node::new(NodeKind::Group(Vec::new())));
    }

    #[test]
    fn ungrouped_column_in_aggregate_query_is_illegal() {
        let err = rewrite_query("select name, count(*) from files('.')").unwrap_err();
        assert!(matches!(err, Error::IllegalGroupBy { .. }));
    }

    #[test]
    fn size_without_matching_group_by_is_illegal() {
        let err = rewrite_query("select size group by name").unwrap_err();
        assert!(matches!(err, Error::IllegalGroupBy { .. }));
    }

    #[test]
    fn grouped_column_is_legal() {
        let q = rewrite_query("select extension, count(*) from files('.') group by extension").unwrap();
        let q = query_node(&q);
        match &q.select.kind {
            NodeKind::Select(items) => {
                assert!(matches!(items[1].kind, NodeKind::AggFunction(..)));
            }
            other => panic!("expected Select, got {:?}", other),
        }
    }

    #[test]
    fn builtin_name_alongside_a_group_by_is_legal() {
        let q = rewrite_query(
            "select extension, count(*) from files('.') group by extension order by current_time",
        )
        .unwrap();
        let q = query_node(&q);
        match &q.select.kind {
            NodeKind::Select(items) => {
                assert!(matches!(items[1].kind, NodeKind::AggFunction(..)));
            }
            other => panic!("expected Select, got {:?}", other),
        }
    }

    #[test]
    fn having_without_group_by_implies_a_single_group_with_no_keys() {
        // HAVING with no GROUP BY still creates an (empty) Group, which
        // means a plain column reference in SELECT has nothing to match
        // against and is illegal, same as in standard SQL.
        let err = rewrite_query("select name having length(name) > 0").unwrap_err();
        assert!(matches!(err, Error::IllegalGroupBy { .. }));

        let q = rewrite_query("select count(*) having count(*) > 0").unwrap();
        let q = query_node(&q);
        assert_eq!(q.group, Node::new(NodeKind::Group(Vec::new())));
    }

    #[test]
    fn count_star_lifts_into_an_agg_function_with_an_id() {
        let q = rewrite_query("select count(*) from files('.')").unwrap();
        let q = query_node(&q);
        match &q.select.kind {
            NodeKind::Select(items) => {
                assert!(matches!(&items[0].kind, NodeKind::AggFunction(name, args, _) if name == "count" && args.len() == 1));
            }
            other => panic!("expected Select, got {:?}", other),
        }
    }

    #[test]
    fn omitted_clauses_all_get_sensible_defaults() {
        let q = rewrite_query("select name").unwrap();
        let q = query_node(&q);
        assert_eq!(q.where_, Node::value(Value::Bool(true)));
        assert_eq!(q.group, Node::fake_group());
        assert_eq!(q.having, Node::having(Node::value(Value::Bool(true))));
        assert_eq!(q.order, Node::new(NodeKind::Order(vec![])));
        assert_eq!(q.limit, Node::null());
        assert_eq!(q.offset, Node::value(Value::Int(0)));
    }
}
