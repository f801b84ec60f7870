//! Compiles a tree-shaped relational-algebra IR into a single SQL query
//! string.
//!
//! The pipeline has four stages, each owned by its own module:
//!
//! - [`ir`] — the relation/scalar-expression tree being compiled.
//! - [`context`] — per-query table-alias bookkeeping (`QueryContext`).
//! - [`translator`] — scalar-expression-to-SQL formatting.
//! - [`select`] and [`join`] — the one renderable query shape (`Select`)
//!   and its `FROM`/`JOIN` clause builder.
//! - [`builder`] — classifies a `Relation` tree into a `Select`.
//!
//! This crate does not parse any source language, plan queries, or talk to
//! a database: it only lowers an already-built IR tree into text.

pub mod builder;
pub mod context;
pub mod error;
pub mod ir;
pub mod join;
pub mod select;
pub mod translator;

pub use builder::{QueryAST, QueryASTBuilder};
pub use context::QueryContext;
pub use error::{Error, ErrorKind, Result};

/// Output-shaping configuration. Unlike a SQL dialect switch, these knobs
/// never change which operators or join shapes are accepted — only how
/// the accepted output is laid out, in the same spirit as
/// `prql-compiler`'s own `sql::compile(query, options)` entry point.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Number of spaces a continuation line of a wrapped clause is
    /// indented by.
    pub indent_width: usize,
    /// Append a trailing `-- Generated by relix-sql <version>` comment.
    pub signature_comment: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { indent_width: 2, signature_comment: false }
    }
}

/// Classify `expr` into a renderable [`QueryAST`].
pub fn build_ast(expr: ir::Relation) -> Result<QueryAST> {
    QueryASTBuilder::new(expr).get_result()
}

/// Compile `expr` all the way to a SQL string, using default [`Options`].
pub fn to_sql(expr: ir::Relation) -> Result<String> {
    to_sql_with_options(expr, &Options::default())
}

/// Compile `expr` to a SQL string with explicit [`Options`].
pub fn to_sql_with_options(expr: ir::Relation, options: &Options) -> Result<String> {
    let ast = build_ast(expr)?;
    let mut sql = ast.select.render()?;
    if options.signature_comment {
        sql.push_str(&format!("\n-- Generated by relix-sql {}", env!("CARGO_PKG_VERSION")));
    }
    log::debug!("compiled query of {} bytes", sql.len());
    Ok(sql)
}

/// Translate a single scalar expression to SQL, outside the context of a
/// full `Select`. `context` supplies table aliases for any column
/// reference the expression contains; pass `None` only when the
/// expression is known to carry no column reference.
pub fn translate_expr(
    expr: &ir::ValueExpr,
    context: Option<&QueryContext>,
    named: bool,
) -> Result<String> {
    translator::translate_expr(expr, context, named)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{BinaryOp, ColumnSchema, JoinKind, Literal, NumberLiteral, SqlType, UnaryOp, ValueExpr};

    fn orders() -> ir::Relation {
        ir::Relation::table(
            "orders",
            vec![
                ColumnSchema { name: "id".into(), ty: SqlType::Int32 },
                ColumnSchema { name: "customer_id".into(), ty: SqlType::Int32 },
                ColumnSchema { name: "amount".into(), ty: SqlType::Float },
            ],
        )
    }

    // Scenario S1 (spec §8): a bare physical table compiles to `SELECT *`.
    #[test]
    fn s1_bare_table_is_select_star() {
        let sql = to_sql(orders()).unwrap();
        assert!(sql.starts_with("SELECT *"));
        assert!(sql.contains("FROM orders"));
    }

    // Scenario: projection + filter + limit compiles to a single flat
    // query with WHERE and LIMIT clauses.
    #[test]
    fn projection_filter_limit_end_to_end() {
        let table = orders();
        let id = ValueExpr::column(table.clone(), "id");
        let amount = ValueExpr::column(table.clone(), "amount");
        let projected = ir::Relation::projection(table, vec![id.clone(), amount.clone()]);
        let pred = ValueExpr::binary(
            BinaryOp::GreaterThan,
            amount,
            ValueExpr::literal(Literal::Number(NumberLiteral::Int(100))),
        );
        let filtered = ir::Relation::filter(projected, vec![pred]);
        let limited = ir::Relation::limit(filtered, 20, None);

        let sql = to_sql(limited).unwrap();
        assert!(sql.contains("WHERE"));
        assert!(sql.contains("LIMIT 20"));
    }

    // Scenario: a two-table inner join renders a left-leaning FROM/JOIN.
    #[test]
    fn two_table_join_end_to_end() {
        let left = orders();
        let right = ir::Relation::table(
            "customers",
            vec![ColumnSchema { name: "id".into(), ty: SqlType::Int32 }],
        );
        let pred = ValueExpr::binary(
            BinaryOp::Equal,
            ValueExpr::column(left.clone(), "customer_id"),
            ValueExpr::column(right.clone(), "id"),
        );
        let joined = ir::Relation::join(JoinKind::Inner, left, right, vec![pred]);

        let sql = to_sql(joined).unwrap();
        assert!(sql.contains("INNER JOIN customers"));
    }

    // Scenario S4 (spec §8): an aggregation's group-by keys are a required
    // prefix of its selections; this is enforced, not merely documented.
    #[test]
    fn aggregation_group_by_prefix_is_enforced() {
        let table = orders();
        let customer_id = ValueExpr::column(table.clone(), "customer_id");
        let amount = ValueExpr::column(table.clone(), "amount");
        let total = ValueExpr::unary(UnaryOp::Sum, amount);
        let agg = ir::Relation::aggregation(
            table,
            vec![customer_id],
            vec![total],
            vec![],
        );

        let sql = to_sql(agg).unwrap();
        assert!(sql.contains("GROUP BY 1"));
        assert!(sql.contains("sum(amount)"));
    }

    #[test]
    fn signature_comment_is_opt_in() {
        let options = Options { signature_comment: true, ..Options::default() };
        let sql = to_sql_with_options(orders(), &options).unwrap();
        assert!(sql.contains("-- Generated by relix-sql"));
    }

    #[test]
    fn snapshot_two_table_join_with_filter() {
        let left = orders();
        let right = ir::Relation::table(
            "customers",
            vec![ColumnSchema { name: "id".into(), ty: SqlType::Int32 }],
        );
        let join_pred = ValueExpr::binary(
            BinaryOp::Equal,
            ValueExpr::column(left.clone(), "customer_id"),
            ValueExpr::column(right.clone(), "id"),
        );
        let joined = ir::Relation::join(JoinKind::Inner, left.clone(), right, vec![join_pred]);
        let materialized = joined.materialize().unwrap();
        let projected = ir::Relation::projection(
            materialized,
            vec![ValueExpr::column(left.clone(), "id"), ValueExpr::column(left, "amount")],
        );

        let sql = to_sql(projected).unwrap();
        insta::assert_snapshot!(sql, @r###"
        SELECT
          t0.id, t0.amount
        FROM orders t0
          INNER JOIN customers t1
            ON t0.customer_id = t1.id
        "###);
    }

    #[test]
    fn repeated_compiles_of_the_same_tree_are_byte_identical() {
        let first = to_sql(orders()).unwrap();
        let second = to_sql(orders()).unwrap();
        similar_asserts::assert_eq!(first, second);
    }
}
