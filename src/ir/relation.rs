use std::rc::Rc;

use super::expr::ValueExpr;
use super::ids::RelId;
use crate::error::{Error, Result};

/// A relational node, shared by `Rc` so the same underlying table can be
/// referenced from multiple places in an expression tree without cloning
/// its contents. Two clones of one `Relation` share a [`RelId`]; two
/// separately-constructed relations never do, even with identical content.
#[derive(Clone, Debug)]
pub struct Relation(Rc<RelationNode>);

#[derive(Debug)]
struct RelationNode {
    id: RelId,
    kind: RelationKind,
}

#[derive(Debug)]
pub enum RelationKind {
    /// A named, column-typed physical table.
    Table { name: String, columns: Vec<ColumnSchema> },
    /// Transparent wrapper, unwrapped when building.
    SelfRef(Relation),
    Projection { table: Relation, selections: Vec<ValueExpr> },
    Aggregation {
        table: Relation,
        by: Vec<ValueExpr>,
        agg_exprs: Vec<ValueExpr>,
        having: Vec<ValueExpr>,
    },
    Filter { table: Relation, predicates: Vec<ValueExpr> },
    Limit { table: Relation, n: u64, offset: Option<u64> },
    SortBy { table: Relation, keys: Vec<Sort> },
    Join {
        kind: JoinKind,
        left: Relation,
        right: Relation,
        predicates: Vec<ValueExpr>,
    },
    /// A join whose output schema has been resolved; only these may serve
    /// as the `table_set` of a `Select`.
    MaterializedJoin {
        kind: JoinKind,
        left: Relation,
        right: Relation,
        predicates: Vec<ValueExpr>,
    },
}

#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub ty: super::SqlType,
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub expr: ValueExpr,
    pub ascending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum JoinKind {
    #[strum(serialize = "INNER JOIN")]
    Inner,
    #[strum(serialize = "LEFT OUTER JOIN")]
    Left,
    #[strum(serialize = "RIGHT OUTER JOIN")]
    Right,
    #[strum(serialize = "FULL OUTER JOIN")]
    Outer,
    #[strum(serialize = "LEFT ANTI JOIN")]
    LeftAnti,
    #[strum(serialize = "LEFT SEMI JOIN")]
    LeftSemi,
    #[strum(serialize = "CROSS JOIN")]
    Cross,
}

impl Relation {
    fn new(kind: RelationKind) -> Relation {
        Relation(Rc::new(RelationNode { id: RelId::fresh(), kind }))
    }

    pub fn table(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Relation {
        Relation::new(RelationKind::Table { name: name.into(), columns })
    }

    pub fn self_ref(inner: Relation) -> Relation {
        Relation::new(RelationKind::SelfRef(inner))
    }

    pub fn projection(table: Relation, selections: Vec<ValueExpr>) -> Relation {
        Relation::new(RelationKind::Projection { table, selections })
    }

    pub fn aggregation(
        table: Relation,
        by: Vec<ValueExpr>,
        agg_exprs: Vec<ValueExpr>,
        having: Vec<ValueExpr>,
    ) -> Relation {
        Relation::new(RelationKind::Aggregation { table, by, agg_exprs, having })
    }

    pub fn filter(table: Relation, predicates: Vec<ValueExpr>) -> Relation {
        Relation::new(RelationKind::Filter { table, predicates })
    }

    pub fn limit(table: Relation, n: u64, offset: Option<u64>) -> Relation {
        Relation::new(RelationKind::Limit { table, n, offset })
    }

    pub fn sort_by(table: Relation, keys: Vec<Sort>) -> Relation {
        Relation::new(RelationKind::SortBy { table, keys })
    }

    pub fn join(kind: JoinKind, left: Relation, right: Relation, predicates: Vec<ValueExpr>) -> Relation {
        Relation::new(RelationKind::Join { kind, left, right, predicates })
    }

    fn materialized_join(
        kind: JoinKind,
        left: Relation,
        right: Relation,
        predicates: Vec<ValueExpr>,
    ) -> Relation {
        Relation::new(RelationKind::MaterializedJoin { kind, left, right, predicates })
    }

    pub fn id(&self) -> RelId {
        self.0.id
    }

    pub fn kind(&self) -> &RelationKind {
        &self.0.kind
    }

    /// Structural (content) equality, ignoring node identity. Two
    /// independently-built trees that describe the same query are equal.
    pub fn equals(&self, other: &Relation) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.kind.equals(&other.0.kind)
    }

    /// If the root is a `Join` and not already a `MaterializedJoin`, commit
    /// it to a concrete output. Idempotent on an already-materialized join.
    pub fn materialize(&self) -> Result<Relation> {
        match self.kind() {
            RelationKind::Join { kind, left, right, predicates } => {
                Ok(Relation::materialized_join(*kind, left.clone(), right.clone(), predicates.clone()))
            }
            RelationKind::MaterializedJoin { .. } => Ok(self.clone()),
            _ => Err(Error::unsupported("materialize() called on a non-join relation")),
        }
    }

    /// The distinct base relations this one is built from, in the order a
    /// left-leaning join tree would surface them. Transparent `SelfRef`
    /// wrappers are skipped; everything else that isn't itself a join is a
    /// leaf that needs exactly one alias.
    pub fn root_tables(&self) -> Vec<Relation> {
        match self.kind() {
            RelationKind::Join { left, right, .. }
            | RelationKind::MaterializedJoin { left, right, .. } => {
                let mut roots = left.root_tables();
                roots.extend(right.root_tables());
                roots
            }
            RelationKind::SelfRef(inner) => inner.root_tables(),
            _ => vec![self.clone()],
        }
    }

    /// The bare name used in a `FROM`/`JOIN` fragment. Only physical tables
    /// carry one directly; anything else (an unnamed subquery) has none.
    pub fn root_name(&self) -> Option<&str> {
        match self.kind() {
            RelationKind::Table { name, .. } => Some(name.as_str()),
            RelationKind::SelfRef(inner) => inner.root_name(),
            _ => None,
        }
    }

    /// Look up the declared SQL type of a column by name, if this relation
    /// is (or transparently wraps) a physical table that declares it.
    /// Types are not propagated through `Projection`/`Aggregation` — that
    /// would require a type system, which is out of scope (spec §1).
    pub fn column_type(&self, field: &str) -> Option<super::SqlType> {
        match self.kind() {
            RelationKind::Table { columns, .. } => {
                columns.iter().find(|c| c.name == field).map(|c| c.ty)
            }
            RelationKind::SelfRef(inner) => inner.column_type(field),
            _ => None,
        }
    }
}

impl RelationKind {
    fn equals(&self, other: &RelationKind) -> bool {
        use RelationKind::*;
        match (self, other) {
            (Table { name: n1, .. }, Table { name: n2, .. }) => n1 == n2,
            (SelfRef(a), SelfRef(b)) => a.equals(b),
            (Projection { table: t1, selections: s1 }, Projection { table: t2, selections: s2 }) => {
                t1.equals(t2) && exprs_equal(s1, s2)
            }
            (
                Aggregation { table: t1, by: b1, agg_exprs: a1, having: h1 },
                Aggregation { table: t2, by: b2, agg_exprs: a2, having: h2 },
            ) => t1.equals(t2) && exprs_equal(b1, b2) && exprs_equal(a1, a2) && exprs_equal(h1, h2),
            (Filter { table: t1, predicates: p1 }, Filter { table: t2, predicates: p2 }) => {
                t1.equals(t2) && exprs_equal(p1, p2)
            }
            (Limit { table: t1, n: n1, offset: o1 }, Limit { table: t2, n: n2, offset: o2 }) => {
                t1.equals(t2) && n1 == n2 && o1 == o2
            }
            (SortBy { table: t1, keys: k1 }, SortBy { table: t2, keys: k2 }) => {
                t1.equals(t2)
                    && k1.len() == k2.len()
                    && k1.iter().zip(k2).all(|(a, b)| a.ascending == b.ascending && a.expr.equals(&b.expr))
            }
            (
                Join { kind: k1, left: l1, right: r1, predicates: p1 },
                Join { kind: k2, left: l2, right: r2, predicates: p2 },
            )
            | (
                MaterializedJoin { kind: k1, left: l1, right: r1, predicates: p1 },
                MaterializedJoin { kind: k2, left: l2, right: r2, predicates: p2 },
            ) => k1 == k2 && l1.equals(l2) && r1.equals(r2) && exprs_equal(p1, p2),
            _ => false,
        }
    }
}

fn exprs_equal(a: &[ValueExpr], b: &[ValueExpr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}
