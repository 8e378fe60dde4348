use crate::node::{Node, NodeKind, QueryNode};

/// A read-only, top-down tree walk.
///
/// `visit` is called once per node, pre-order. Returning `false` stops the
/// walk from descending into that node's children (e.g. to avoid looking
/// inside a nested `AggFunction` when searching for aggregates at the top
/// level of an expression).
pub trait NodeVisitor {
    fn visit(&mut self, node: &Node) -> bool;
}

/// Walks `node` and every descendant, depth-first, calling
/// `visitor.visit` pre-order.
pub fn walk<V: NodeVisitor + ?Sized>(visitor: &mut V, node: &Node) {
    if visitor.visit(node) {
        for child in node.children() {
            walk(visitor, child);
        }
    }
}

/// Rebuilds a tree bottom-up, node by node.
///
/// The default `transform` recurses into children first (via
/// `transform_children`) and then calls `transform_node` on the node with
/// its children already transformed, so overriding just `transform_node`
/// gives a rewrite that applies uniformly at every level — this is how
/// aggregate lifting and star expansion are implemented in the semantic
/// rewrite pass. The identity transformer (override nothing) satisfies the
/// round-trip property in §8: `transform(identity)(q) == q`.
pub trait NodeTransformer {
    fn transform(&mut self, node: Node) -> Node {
        let node = self.transform_children(node);
        self.transform_node(node)
    }

    /// Hook called after children have already been transformed. Default
    /// is the identity.
    fn transform_node(&mut self, node: Node) -> Node {
        node
    }

    fn transform_children(&mut self, node: Node) -> Node {
        let Node { kind, location } = node;
        let kind = match kind {
            NodeKind::Null
            | NodeKind::Value(_)
            | NodeKind::Name(_)
            | NodeKind::SelectStar
            | NodeKind::FakeGroup => kind,
            NodeKind::Array(items) => {
                NodeKind::Array(items.into_iter().map(|n| self.transform(n)).collect())
            }
            NodeKind::Function(name, args) => {
                NodeKind::Function(name, args.into_iter().map(|n| self.transform(n)).collect())
            }
            NodeKind::AggFunction(name, args, id) => NodeKind::AggFunction(
                name,
                args.into_iter().map(|n| self.transform(n)).collect(),
                id,
            ),
            NodeKind::And(l, r) => {
                NodeKind::And(Box::new(self.transform(*l)), Box::new(self.transform(*r)))
            }
            NodeKind::Or(l, r) => {
                NodeKind::Or(Box::new(self.transform(*l)), Box::new(self.transform(*r)))
            }
            NodeKind::Between(v, lo, hi) => NodeKind::Between(
                Box::new(self.transform(*v)),
                Box::new(self.transform(*lo)),
                Box::new(self.transform(*hi)),
            ),
            NodeKind::OrderByPart(child, dir) => {
                NodeKind::OrderByPart(Box::new(self.transform(*child)), dir)
            }
            NodeKind::Select(items) => {
                NodeKind::Select(items.into_iter().map(|n| self.transform(n)).collect())
            }
            NodeKind::Order(items) => {
                NodeKind::Order(items.into_iter().map(|n| self.transform(n)).collect())
            }
            NodeKind::Group(items) => {
                NodeKind::Group(items.into_iter().map(|n| self.transform(n)).collect())
            }
            NodeKind::Having(cond) => NodeKind::Having(Box::new(self.transform(*cond))),
            NodeKind::Query(q) => {
                let QueryNode {
                    select,
                    from,
                    where_,
                    group,
                    having,
                    order,
                    limit,
                    offset,
                } = *q;
                NodeKind::Query(Box::new(QueryNode {
                    select: self.transform(select),
                    from: self.transform(from),
                    where_: self.transform(where_),
                    group: self.transform(group),
                    having: self.transform(having),
                    order: self.transform(order),
                    limit: self.transform(limit),
                    offset: self.transform(offset),
                }))
            }
        };
        Node { kind, location }
    }
}

/// The transformer that changes nothing; used to verify the round-trip
/// property in §8.
pub struct Identity;

impl NodeTransformer for Identity {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Direction;
    use lsql_core::Value;

    struct CountNodes(usize);
    impl NodeVisitor for CountNodes {
        fn visit(&mut self, _node: &Node) -> bool {
            self.0 += 1;
            true
        }
    }

    #[test]
    fn walk_visits_every_descendant() {
        let tree = Node::and(
            Node::name("a"),
            Node::between(Node::name("b"), Node::value(Value::Int(1)), Node::value(Value::Int(2))),
        );
        let mut counter = CountNodes(0);
        walk(&mut counter, &tree);
        // and, a, between, b, 1, 2
        assert_eq!(counter.0, 6);
    }

    #[test]
    fn identity_transform_round_trips() {
        let tree = Node::order_by_part(Node::name("size"), Direction::Desc);
        let mut identity = Identity;
        let transformed = identity.transform(tree.clone());
        assert_eq!(tree, transformed);
    }

    #[test]
    fn visitor_can_refuse_to_descend() {
        use crate::node::AggId;
        let nested = Node::agg_function(
            "count",
            vec![Node::agg_function("sum", vec![Node::name("x")], AggId(1))],
            AggId(0),
        );

        struct FindSum(bool);
        impl NodeVisitor for FindSum {
            fn visit(&mut self, node: &Node) -> bool {
                if let crate::node::NodeKind::AggFunction(name, ..) = &node.kind {
                    if name == "sum" {
                        self.0 = true;
                    }
                }
                true
            }
        }
        let mut finder = FindSum(false);
        walk(&mut finder, &nested);
        assert!(finder.0);

        struct StopAtAgg(bool);
        impl NodeVisitor for StopAtAgg {
            fn visit(&mut self, node: &Node) -> bool {
                if let crate::node::NodeKind::AggFunction(name, ..) = &node.kind {
                    if name == "sum" {
                        self.0 = true;
                    }
                    return false;
                }
                true
            }
        }
        let mut gated = StopAtAgg(false);
        walk(&mut gated, &nested);
        assert!(!gated.0, "descent into the outer AggFunction should have been refused");
    }
}
