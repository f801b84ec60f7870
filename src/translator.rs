//! Scalar-expression formatting: literals, column references, unary and
//! binary operators, casts.
//!
//! Dispatch is an exhaustive `match` over the closed IR (so every `ExprKind`
//! variant this crate can construct is handled at compile time), with the
//! actual operator *spelling* looked up from static tables built with
//! `once_cell::sync::Lazy` — the same idiom `prql-compiler`'s
//! `sql::operators` module uses for its own s-string tables.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::context::QueryContext;
use crate::error::{Error, Result};
use crate::ir::{BinaryOp, ExprKind, Literal, NumberLiteral, UnaryOp, ValueExpr};

static BINARY_SYMBOLS: Lazy<HashMap<BinaryOp, &'static str>> = Lazy::new(|| {
    use BinaryOp::*;
    HashMap::from([
        (Add, "+"),
        (Subtract, "-"),
        (Multiply, "*"),
        (Divide, "/"),
        (Modulo, "%"),
        (Power, "^"),
        (Equal, "="),
        (NotEqual, "!="),
        (LessThan, "<"),
        (LessThanOrEqual, "<="),
        (GreaterThan, ">"),
        (GreaterThanOrEqual, ">="),
        (And, "AND"),
        (Or, "OR"),
        (Like, "LIKE"),
    ])
});

/// Unary math/aggregate operators rendered as function calls (spec §4.2).
static UNARY_FUNCTIONS: Lazy<HashMap<UnaryOp, &'static str>> = Lazy::new(|| {
    use UnaryOp::*;
    HashMap::from([
        (Exp, "exp"),
        (Sqrt, "sqrt"),
        (Log, "log"),
        (Log2, "log2"),
        (Log10, "log10"),
        (Mean, "avg"),
        (Sum, "sum"),
    ])
});

/// Whether an operand that is itself this kind of operator needs wrapping
/// in parentheses when nested under another operator. A deliberately
/// coarse rule (spec §4.2): every binary infix operator plus unary
/// `Negate`, replacing the source's two separate, duplicate predicates
/// (`_needs_parens`/`_need_parenthesize_args`) with one.
pub fn needs_parens(kind: OperatorKind) -> bool {
    match kind {
        OperatorKind::Binary(_) => true,
        OperatorKind::Unary(UnaryOp::Negate) => true,
        OperatorKind::Unary(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// Render a scalar expression to SQL text.
///
/// `context` supplies table aliases for `TableColumn` references; it is
/// `None` only when translating an expression known to carry no column
/// reference (e.g. a bare literal), matching spec §4.2's documented
/// precondition. `named`, when true, appends `AS <name>` for expressions
/// that carry a derivable display name (spec §4.3's select-item framing);
/// most internal calls (operands, predicates) pass `false`.
pub fn translate_expr(expr: &ValueExpr, context: Option<&QueryContext>, named: bool) -> Result<String> {
    let body = translate_body(expr, context)?;
    if named && expr.needs_name() {
        if let Some(name) = expr.display_name() {
            return Ok(format!("{body} AS {name}"));
        }
    }
    Ok(body)
}

fn translate_body(expr: &ValueExpr, context: Option<&QueryContext>) -> Result<String> {
    match expr.kind() {
        ExprKind::Literal(lit) => Ok(format_literal(lit)),
        ExprKind::Parameter { name } => {
            Err(Error::unsupported(format!("parameter `{name}` has no bound value to translate")))
        }
        ExprKind::TableColumn { table, field, .. } => {
            let ctx = context.ok_or_else(|| {
                Error::internal("column reference translated without a QueryContext")
            })?;
            if ctx.need_aliases() {
                let alias = ctx
                    .get_alias(table)
                    .ok_or_else(|| Error::lookup(format!("no alias assigned for column `{field}`")))?;
                Ok(format!("{alias}.{}", quote_field(field)))
            } else {
                Ok(quote_field(field))
            }
        }
        ExprKind::Unary(op, operand) => translate_unary(*op, operand, context),
        ExprKind::Binary(op, lhs, rhs) => translate_binary(*op, lhs, rhs, context),
        ExprKind::Cast { expr, to } => {
            let inner = translate_body(expr, context)?;
            Ok(format!("CAST({inner} AS {to})"))
        }
    }
}

fn translate_unary(op: UnaryOp, operand: &ValueExpr, context: Option<&QueryContext>) -> Result<String> {
    if let Some(func) = UNARY_FUNCTIONS.get(&op) {
        // Function-call forms never parenthesize their argument (spec
        // §4.2's precedence policy): the call syntax already delimits it.
        let inner = translate_body(operand, context)?;
        return Ok(format!("{func}({inner})"));
    }

    let inner = translate_operand(operand, context)?;
    Ok(match op {
        UnaryOp::Negate => format!("-{inner}"),
        UnaryOp::Not => format!("NOT {inner}"),
        UnaryOp::IsNull => format!("{inner} IS NULL"),
        UnaryOp::NotNull => format!("{inner} IS NOT NULL"),
        UnaryOp::Exp | UnaryOp::Sqrt | UnaryOp::Log | UnaryOp::Log2 | UnaryOp::Log10 | UnaryOp::Mean | UnaryOp::Sum => {
            unreachable!("handled above via UNARY_FUNCTIONS")
        }
    })
}

/// Backtick-quote a column or field name, but only when it contains a
/// space (spec §4.2 point 3) — most names pass through bare.
fn quote_field(field: &str) -> String {
    if field.contains(' ') {
        format!("`{field}`")
    } else {
        field.to_string()
    }
}

fn translate_binary(
    op: BinaryOp,
    lhs: &ValueExpr,
    rhs: &ValueExpr,
    context: Option<&QueryContext>,
) -> Result<String> {
    let left = translate_operand(lhs, context)?;
    let right = translate_operand(rhs, context)?;

    if op == BinaryOp::Xor {
        // No native XOR in the target dialect: rewritten to the equivalent
        // `(l OR r) AND NOT (l AND r)`, same as the source compiler.
        return Ok(format!("({left} OR {right}) AND NOT ({left} AND {right})"));
    }

    let symbol = BINARY_SYMBOLS
        .get(&op)
        .ok_or_else(|| Error::unsupported(format!("no SQL spelling registered for {op:?}")))?;
    Ok(format!("{left} {symbol} {right}"))
}

/// Translate an operand, wrapping it in parentheses if its own top-level
/// operator needs them per [`needs_parens`]. The rule is deliberately
/// independent of what operator the operand is nested under (spec §4.2).
fn translate_operand(operand: &ValueExpr, context: Option<&QueryContext>) -> Result<String> {
    let body = translate_body(operand, context)?;
    let operand_kind = match operand.kind() {
        ExprKind::Unary(op, _) => Some(OperatorKind::Unary(*op)),
        ExprKind::Binary(op, ..) => Some(OperatorKind::Binary(*op)),
        _ => None,
    };
    match operand_kind {
        Some(kind) if needs_parens(kind) => Ok(format!("({body})")),
        _ => Ok(body),
    }
}

fn format_literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(true) => "TRUE".to_string(),
        Literal::Boolean(false) => "FALSE".to_string(),
        Literal::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        Literal::Number(NumberLiteral::Int(i)) => i.to_string(),
        Literal::Number(NumberLiteral::Float(f)) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{BinaryOp, Literal, Relation, UnaryOp};

    #[test]
    fn nested_binary_operands_get_parenthesized() {
        let table = Relation::table("t", vec![]);
        let a = ValueExpr::column(table.clone(), "a");
        let b = ValueExpr::column(table.clone(), "b");
        let c = ValueExpr::column(table, "c");

        let sum = ValueExpr::binary(BinaryOp::Add, a, b);
        let product = ValueExpr::binary(BinaryOp::Multiply, sum, c);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&product, Some(&ctx), false).unwrap();
        assert_eq!(sql, "(a + b) * c");
    }

    #[test]
    fn negate_of_a_bare_column_is_not_parenthesized() {
        let table = Relation::table("t", vec![]);
        let col = ValueExpr::column(table, "a");
        let neg = ValueExpr::unary(UnaryOp::Negate, col);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&neg, Some(&ctx), false).unwrap();
        assert_eq!(sql, "-a");
    }

    #[test]
    fn negate_of_a_binary_expression_is_parenthesized() {
        let table = Relation::table("t", vec![]);
        let a = ValueExpr::column(table.clone(), "a");
        let b = ValueExpr::column(table, "b");
        let sum = ValueExpr::binary(BinaryOp::Add, a, b);
        let neg = ValueExpr::unary(UnaryOp::Negate, sum);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&neg, Some(&ctx), false).unwrap();
        assert_eq!(sql, "-(a + b)");
    }

    #[test]
    fn xor_is_rewritten_without_a_native_operator() {
        let table = Relation::table("t", vec![]);
        let a = ValueExpr::column(table.clone(), "a");
        let b = ValueExpr::column(table, "b");
        let xor = ValueExpr::binary(BinaryOp::Xor, a, b);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&xor, Some(&ctx), false).unwrap();
        assert_eq!(sql, "(a OR b) AND NOT (a AND b)");
    }

    #[test]
    fn parameter_is_unsupported() {
        let param = ValueExpr::parameter("p1");
        let err = translate_expr(&param, None, false).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Unsupported(_)));
    }

    #[test]
    fn qualified_column_uses_context_alias() {
        let table = Relation::table("orders", vec![]);
        let col = ValueExpr::column(table.clone(), "id");

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(true);
        ctx.make_alias(&table);
        let sql = translate_expr(&col, Some(&ctx), false).unwrap();
        assert_eq!(sql, "t0.id");
    }

    #[test]
    fn column_missing_alias_is_a_lookup_error() {
        let table = Relation::table("orders", vec![]);
        let col = ValueExpr::column(table, "id");

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(true);
        let err = translate_expr(&col, Some(&ctx), false).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Lookup(_)));
    }

    #[test]
    fn column_name_with_a_space_is_backtick_quoted() {
        let table = Relation::table("orders", vec![]);
        let col = ValueExpr::column(table, "order date");

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&col, Some(&ctx), false).unwrap();
        assert_eq!(sql, "`order date`");
    }

    #[test]
    fn sum_and_mean_render_as_function_calls() {
        let table = Relation::table("orders", vec![]);
        let amount = ValueExpr::column(table, "amount");

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);

        let sum = ValueExpr::unary(UnaryOp::Sum, amount.clone());
        assert_eq!(translate_expr(&sum, Some(&ctx), false).unwrap(), "sum(amount)");

        let mean = ValueExpr::unary(UnaryOp::Mean, amount);
        assert_eq!(translate_expr(&mean, Some(&ctx), false).unwrap(), "avg(amount)");
    }

    #[test]
    fn power_is_a_binary_infix_operator() {
        let table = Relation::table("t", vec![]);
        let a = ValueExpr::column(table.clone(), "a");
        let b = ValueExpr::column(table, "b");
        let pow = ValueExpr::binary(BinaryOp::Power, a, b);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&pow, Some(&ctx), false).unwrap();
        assert_eq!(sql, "a ^ b");
    }

    #[test]
    fn not_equal_renders_as_bang_equal() {
        let table = Relation::table("t", vec![]);
        let a = ValueExpr::column(table.clone(), "a");
        let b = ValueExpr::column(table, "b");
        let ne = ValueExpr::binary(BinaryOp::NotEqual, a, b);

        let mut ctx = QueryContext::new();
        ctx.set_need_aliases(false);
        let sql = translate_expr(&ne, Some(&ctx), false).unwrap();
        assert_eq!(sql, "a != b");
    }

    #[test]
    fn string_literal_quotes_are_backslash_escaped() {
        let lit = ValueExpr::literal(Literal::String("it's".to_string()));
        let sql = translate_expr(&lit, None, false).unwrap();
        assert_eq!(sql, "'it\\'s'");
    }
}
