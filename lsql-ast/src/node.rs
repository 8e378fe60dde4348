use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use lsql_core::{Location, Value};

/// The sort direction carried by an `OrderByPart` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        })
    }
}

/// Identity of one aggregate call, assigned once by the semantic rewrite
/// pass's aggregate-lifting transform. The evaluator uses this as the key
/// into its accumulator sidecar map rather than mutating the (otherwise
/// immutable) AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggId(pub u32);

/// Hands out fresh, process-unique [`AggId`]s during aggregate lifting.
#[derive(Debug, Default)]
pub struct AggIdGen(AtomicU32);

impl AggIdGen {
    pub fn new() -> Self {
        AggIdGen(AtomicU32::new(0))
    }

    pub fn next(&self) -> AggId {
        AggId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// The eight clauses of a query, each a `Node` in its own right so the
/// visitor/transformer framework can treat them uniformly with every other
/// expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub select: Node,
    pub from: Node,
    pub where_: Node,
    pub group: Node,
    pub having: Node,
    pub order: Node,
    pub limit: Node,
    pub offset: Node,
}

/// The payload of a [`Node`]. Variants mirror §3 of the specification
/// one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Value(Value),
    Name(String),
    Array(Vec<Node>),
    Function(String, Vec<Node>),
    AggFunction(String, Vec<Node>, AggId),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Between(Box<Node>, Box<Node>, Box<Node>),
    OrderByPart(Box<Node>, Direction),
    SelectStar,
    Select(Vec<Node>),
    Order(Vec<Node>),
    Group(Vec<Node>),
    /// Sentinel meaning "no grouping": every row is its own group.
    FakeGroup,
    Having(Box<Node>),
    Query(Box<QueryNode>),
}

/// One node of the AST: a kind tag plus an optional source location.
///
/// Nodes are value-equal on `kind` alone — location is metadata for error
/// reporting, not part of a node's identity. There is deliberately no parent
/// back-reference stored on the node itself (see Design Notes §9): upward
/// walks needed by the semantic checks are implemented by carrying an
/// ancestor stack down through a recursive descent instead of threading a
/// literal parent pointer through an otherwise purely functional tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Option<Location>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            location: None,
        }
    }

    pub fn with_location(kind: NodeKind, location: Location) -> Self {
        Node {
            kind,
            location: Some(location),
        }
    }

    pub fn null() -> Self {
        Node::new(NodeKind::Null)
    }

    pub fn value(v: Value) -> Self {
        Node::new(NodeKind::Value(v))
    }

    pub fn name(ident: impl Into<String>) -> Self {
        Node::new(NodeKind::Name(ident.into()))
    }

    pub fn function(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::new(NodeKind::Function(name.into(), args))
    }

    pub fn agg_function(name: impl Into<String>, args: Vec<Node>, id: AggId) -> Self {
        Node::new(NodeKind::AggFunction(name.into(), args, id))
    }

    pub fn and(l: Node, r: Node) -> Self {
        Node::new(NodeKind::And(Box::new(l), Box::new(r)))
    }

    pub fn or(l: Node, r: Node) -> Self {
        Node::new(NodeKind::Or(Box::new(l), Box::new(r)))
    }

    pub fn between(v: Node, lo: Node, hi: Node) -> Self {
        Node::new(NodeKind::Between(Box::new(v), Box::new(lo), Box::new(hi)))
    }

    pub fn order_by_part(child: Node, direction: Direction) -> Self {
        Node::new(NodeKind::OrderByPart(Box::new(child), direction))
    }

    pub fn select_star() -> Self {
        Node::new(NodeKind::SelectStar)
    }

    pub fn having(cond: Node) -> Self {
        Node::new(NodeKind::Having(Box::new(cond)))
    }

    pub fn fake_group() -> Self {
        Node::new(NodeKind::FakeGroup)
    }

    pub fn is_aggregate_name(name: &str) -> bool {
        matches!(
            name.to_ascii_lowercase().as_str(),
            "count" | "sum" | "min" | "max" | "avg"
        )
    }

    /// Identifier this node names, for `Name` nodes only.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Name(n) => Some(n),
            _ => None,
        }
    }

    /// The exact set of children considered by [`walk`](crate::walk) and
    /// [`NodeTransformer`]. Every convenience accessor elsewhere in this
    /// crate or its consumers must agree with this list.
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Null
            | NodeKind::Name(_)
            | NodeKind::SelectStar
            | NodeKind::FakeGroup => vec![],
            NodeKind::Value(_) => vec![],
            NodeKind::Array(items) => items.iter().collect(),
            NodeKind::Function(_, args) => args.iter().collect(),
            NodeKind::AggFunction(_, args, _) => args.iter().collect(),
            NodeKind::And(l, r) | NodeKind::Or(l, r) => vec![l.as_ref(), r.as_ref()],
            NodeKind::Between(v, lo, hi) => vec![v.as_ref(), lo.as_ref(), hi.as_ref()],
            NodeKind::OrderByPart(child, _) => vec![child.as_ref()],
            NodeKind::Select(items) | NodeKind::Order(items) | NodeKind::Group(items) => {
                items.iter().collect()
            }
            NodeKind::Having(cond) => vec![cond.as_ref()],
            NodeKind::Query(q) => vec![
                &q.select, &q.from, &q.where_, &q.group, &q.having, &q.order, &q.limit,
                &q.offset,
            ],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Null => write!(f, "NULL"),
            NodeKind::Value(v) => write!(f, "{}", v),
            NodeKind::Name(n) => write!(f, "{}", n),
            NodeKind::Array(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            NodeKind::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            NodeKind::AggFunction(name, args, _) => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            NodeKind::And(l, r) => write!(f, "({} AND {})", l, r),
            NodeKind::Or(l, r) => write!(f, "({} OR {})", l, r),
            NodeKind::Between(v, lo, hi) => write!(f, "{} BETWEEN {} AND {}", v, lo, hi),
            NodeKind::OrderByPart(child, dir) => write!(f, "{} {}", child, dir),
            NodeKind::SelectStar => write!(f, "*"),
            NodeKind::Select(items) => {
                write!(f, "SELECT ")?;
                join(f, items)
            }
            NodeKind::Order(items) => {
                write!(f, "ORDER BY ")?;
                join(f, items)
            }
            NodeKind::Group(items) => {
                write!(f, "GROUP BY ")?;
                join(f, items)
            }
            NodeKind::FakeGroup => write!(f, "<no grouping>"),
            NodeKind::Having(cond) => write!(f, "HAVING {}", cond),
            NodeKind::Query(q) => write!(
                f,
                "{} FROM {} WHERE {} {} {} {} LIMIT {} OFFSET {}",
                q.select, q.from, q.where_, q.group, q.having, q.order, q.limit, q.offset
            ),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: &[Node]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_location() {
        let a = Node::with_location(NodeKind::Name("size".into()), Location::new(1, 1));
        let b = Node::new(NodeKind::Name("size".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn children_agree_with_variant_shape() {
        let n = Node::and(Node::name("a"), Node::name("b"));
        assert_eq!(n.children().len(), 2);

        let n = Node::between(Node::name("x"), Node::value(Value::Int(1)), Node::value(Value::Int(2)));
        assert_eq!(n.children().len(), 3);

        assert!(Node::select_star().children().is_empty());
        assert!(Node::fake_group().children().is_empty());
    }

    #[test]
    fn agg_id_generator_hands_out_unique_ids() {
        let gen = AggIdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
    }
}
