//! Linearizes a (possibly joined) `table_set` into a `FROM ... JOIN ...`
//! clause.
//!
//! Only left-leaning join trees are supported: the right side of every
//! join must be a single table, never itself a join. This mirrors the
//! source compiler's own restriction (spec §4.5) rather than a Rust-side
//! simplification — a right-leaning or join-of-joins tree is rejected with
//! `Unsupported` rather than silently reassociated, since reassociating
//! joins can change results in the presence of outer joins.

use itertools::Itertools;

use crate::context::QueryContext;
use crate::error::{Error, Result};
use crate::ir::{JoinKind, Relation, RelationKind, ValueExpr};
use crate::translator::translate_expr;

struct JoinStep {
    kind: JoinKind,
    table: Relation,
    predicates: Vec<ValueExpr>,
}

pub struct JoinFormatter<'a> {
    table_set: &'a Relation,
}

impl<'a> JoinFormatter<'a> {
    pub fn new(table_set: &'a Relation) -> JoinFormatter<'a> {
        JoinFormatter { table_set }
    }

    pub fn render(&self, context: &QueryContext) -> Result<String> {
        let (base, steps) = linearize(self.table_set)?;

        let mut lines = Vec::with_capacity(steps.len() + 1);
        lines.push(format!("FROM {}", format_source(&base, context)?));

        for step in &steps {
            let predicates = step
                .predicates
                .iter()
                .map(|p| translate_expr(p, Some(context), false))
                .collect::<Result<Vec<_>>>()?;

            lines.push(format!("  {} {}", step.kind, format_source(&step.table, context)?));
            if !predicates.is_empty() {
                lines.push(format!("    ON {}", predicates.iter().join(" AND\n   ")));
            }
        }

        Ok(lines.join("\n"))
    }
}

fn format_source(relation: &Relation, context: &QueryContext) -> Result<String> {
    let name = relation
        .root_name()
        .ok_or_else(|| Error::relation("joined relation has no table name"))?;
    let alias = context
        .get_alias(relation)
        .ok_or_else(|| Error::lookup(format!("no alias assigned for table `{name}`")))?;
    Ok(format!("{name} {alias}"))
}

fn is_join(relation: &Relation) -> bool {
    match relation.kind() {
        RelationKind::Join { .. } | RelationKind::MaterializedJoin { .. } => true,
        RelationKind::SelfRef(inner) => is_join(inner),
        _ => false,
    }
}

/// Walk the left spine of a join tree, returning the leftmost base
/// relation and the ordered sequence of join steps applied on top of it.
fn linearize(relation: &Relation) -> Result<(Relation, Vec<JoinStep>)> {
    match relation.kind() {
        RelationKind::SelfRef(inner) => linearize(inner),
        RelationKind::Join { kind, left, right, predicates }
        | RelationKind::MaterializedJoin { kind, left, right, predicates } => {
            if is_join(right) {
                return Err(Error::unsupported(
                    "join-of-joins or right-leaning join trees are not supported",
                ));
            }
            let (base, mut steps) = linearize(left)?;
            steps.push(JoinStep { kind: *kind, table: right.clone(), predicates: predicates.clone() });
            Ok((base, steps))
        }
        _ => Ok((relation.clone(), Vec::new())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::BinaryOp;

    fn make_join_chain() -> (Relation, Relation, Relation) {
        let orders = Relation::table("orders", vec![]);
        let customers = Relation::table("customers", vec![]);
        let items = Relation::table("items", vec![]);
        (orders, customers, items)
    }

    #[test]
    fn left_leaning_two_table_join_renders_from_then_join() {
        let (orders, customers, _items) = make_join_chain();
        let pred = ValueExpr::binary(
            BinaryOp::Equal,
            ValueExpr::column(orders.clone(), "customer_id"),
            ValueExpr::column(customers.clone(), "id"),
        );
        let joined = Relation::join(JoinKind::Inner, orders.clone(), customers.clone(), vec![pred]);
        let materialized = joined.materialize().unwrap();

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(true);
        for table in materialized.root_tables() {
            ctx.make_alias(&table);
        }

        let sql = JoinFormatter::new(&materialized).render(&ctx).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines[0], "FROM orders t0");
        assert_eq!(lines[1], "  INNER JOIN customers t1");
        assert_eq!(lines[2], "    ON t0.customer_id = t1.id");
    }

    #[test]
    fn three_table_left_leaning_chain_renders_in_order() {
        let (orders, customers, items) = make_join_chain();
        let first = Relation::join(
            JoinKind::Inner,
            orders.clone(),
            customers.clone(),
            vec![],
        );
        let chained = Relation::join(JoinKind::Inner, first, items.clone(), vec![]);
        let materialized = chained.materialize().unwrap();

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(true);
        for table in materialized.root_tables() {
            ctx.make_alias(&table);
        }

        let sql = JoinFormatter::new(&materialized).render(&ctx).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FROM orders"));
        assert!(lines[1].contains("customers"));
        assert!(lines[2].contains("items"));
    }

    #[test]
    fn join_of_joins_on_the_right_is_unsupported() {
        let (orders, customers, items) = make_join_chain();
        let right_join = Relation::join(JoinKind::Inner, customers, items, vec![]);
        let outer = Relation::join(JoinKind::Inner, orders, right_join, vec![]);
        let materialized = outer.materialize().unwrap();

        let ctx = QueryContext::new();
        let err = JoinFormatter::new(&materialized).render(&ctx).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Unsupported(_)));
    }
}
