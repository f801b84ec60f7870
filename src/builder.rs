//! Turns a `Relation` tree into a single renderable [`Select`].
//!
//! Mirrors the source compiler's `QueryASTBuilder`: strip modifiers, look at
//! what's left, and build the one `Select` that represents it. This crate
//! has no subquery nesting to juggle (spec §4.4 scope), so the builder is a
//! single classification step rather than a recursive query-tree walker.

use crate::error::{Error, Result};
use crate::ir::{self, Relation, RelationKind};
use crate::select::Select;

/// The result of compiling a `Relation` tree: one `Select`, ready to
/// render. Kept as its own (trivial) type rather than a bare `Select` so
/// the public API has a named return type to grow into, matching
/// `prql-compiler`'s own `Query`/`Module` wrapper types in its public
/// surface.
#[derive(Debug, Clone)]
pub struct QueryAST {
    pub select: Select,
}

pub struct QueryASTBuilder {
    root: Relation,
}

impl QueryASTBuilder {
    pub fn new(root: Relation) -> QueryASTBuilder {
        QueryASTBuilder { root }
    }

    /// Build the `Select`. Pure with respect to `self.root`: calling this
    /// more than once on the same builder yields equal results every time.
    pub fn get_result(&self) -> Result<QueryAST> {
        let select = build_select(&self.root)?;
        Ok(QueryAST { select })
    }
}

fn unwrap_self_ref(relation: &Relation) -> Relation {
    match relation.kind() {
        RelationKind::SelfRef(inner) => unwrap_self_ref(inner),
        _ => relation.clone(),
    }
}

fn build_select(root: &Relation) -> Result<Select> {
    let root = unwrap_self_ref(root);
    let (base, modifiers) = ir::collect_modifiers(&root);
    let base = unwrap_self_ref(&base);

    let mut select = match base.kind() {
        RelationKind::Projection { table, selections } => {
            log::debug!("building select from a projection over {:?}", table.id());
            let mut select = Select::new(build_table_set(table)?);
            select.selections = selections.clone();
            select
        }
        RelationKind::Aggregation { table, by, agg_exprs, having } => {
            log::debug!("building select from an aggregation over {:?}", table.id());
            let mut selections = by.clone();
            selections.extend(agg_exprs.iter().cloned());
            let mut select = Select::new(build_table_set(table)?);
            select.selections = selections;
            select.group_by = by.clone();
            select.having = having.clone();
            select
        }
        RelationKind::Table { .. } => Select::new(base.clone()),
        RelationKind::Join { .. } => {
            let materialized = base.materialize()?;
            log::debug!("materializing bare join {:?}", materialized.id());
            Select::new(materialized)
        }
        RelationKind::MaterializedJoin { .. } => Select::new(base.clone()),
        RelationKind::SelfRef(_) => unreachable!("self-refs are unwrapped before classification"),
        RelationKind::Filter { .. } | RelationKind::Limit { .. } | RelationKind::SortBy { .. } => {
            return Err(Error::internal(
                "modifier node survived collect_modifiers; this is a builder bug",
            ));
        }
    };

    select.where_ = modifiers.predicates;
    if !modifiers.sort_keys.is_empty() {
        select.sort_by = modifiers.sort_keys;
    }
    select.limit = modifiers.limit;

    Ok(select)
}

/// Resolve the relation a `Select`'s `FROM`/`JOIN` clause is built against:
/// a bare join is materialized first, everything else passes through.
fn build_table_set(table: &Relation) -> Result<Relation> {
    let table = unwrap_self_ref(table);
    match table.kind() {
        RelationKind::Join { .. } => table.materialize(),
        _ => Ok(table),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{ColumnSchema, JoinKind, SqlType, ValueExpr};

    #[test]
    fn plain_table_builds_a_select_star() {
        let table = Relation::table("orders", vec![]);
        let ast = QueryASTBuilder::new(table).get_result().unwrap();
        assert!(ast.select.selections.is_empty());
    }

    #[test]
    fn projection_carries_its_selections_through() {
        let table = Relation::table(
            "orders",
            vec![ColumnSchema { name: "id".into(), ty: SqlType::Int32 }],
        );
        let id = ValueExpr::column(table.clone(), "id");
        let projected = Relation::projection(table, vec![id]);
        let ast = QueryASTBuilder::new(projected).get_result().unwrap();
        assert_eq!(ast.select.selections.len(), 1);
    }

    #[test]
    fn filter_limit_and_sort_are_shed_onto_the_select() {
        let table = Relation::table(
            "orders",
            vec![ColumnSchema { name: "id".into(), ty: SqlType::Int32 }],
        );
        let id = ValueExpr::column(table.clone(), "id");
        let pred = ValueExpr::binary(crate::ir::BinaryOp::GreaterThan, id.clone(), ValueExpr::literal(
            crate::ir::Literal::Number(crate::ir::NumberLiteral::Int(0)),
        ));
        let filtered = Relation::filter(table, vec![pred]);
        let limited = Relation::limit(filtered, 10, None);

        let ast = QueryASTBuilder::new(limited).get_result().unwrap();
        assert_eq!(ast.select.where_.len(), 1);
        assert_eq!(ast.select.limit.unwrap().n, 10);
    }

    #[test]
    fn outermost_limit_wins_over_an_inner_one() {
        let table = Relation::table("orders", vec![]);
        let inner_limit = Relation::limit(table, 5, None);
        let outer_limit = Relation::limit(inner_limit, 1, None);

        let ast = QueryASTBuilder::new(outer_limit).get_result().unwrap();
        assert_eq!(ast.select.limit.unwrap().n, 1);
    }

    #[test]
    fn bare_join_is_materialized_into_the_table_set() {
        let left = Relation::table("orders", vec![]);
        let right = Relation::table("customers", vec![]);
        let joined = Relation::join(JoinKind::Inner, left, right, vec![]);

        let ast = QueryASTBuilder::new(joined).get_result().unwrap();
        assert!(matches!(ast.select.table_set.kind(), RelationKind::MaterializedJoin { .. }));
    }

    #[test]
    fn get_result_is_idempotent() {
        let table = Relation::table("orders", vec![]);
        let builder = QueryASTBuilder::new(table);
        let first = builder.get_result().unwrap();
        let second = builder.get_result().unwrap();
        assert!(first.select.equals(&second.select));
    }
}
