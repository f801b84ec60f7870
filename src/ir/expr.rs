use std::rc::Rc;

use super::ids::ExprId;
use super::relation::Relation;

/// A scalar-expression node, shared by `Rc` for the same reason as
/// [`Relation`](super::relation::Relation).
#[derive(Clone, Debug)]
pub struct ValueExpr(Rc<ExprNode>);

#[derive(Debug)]
struct ExprNode {
    id: ExprId,
    kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// A bind-time placeholder. Always `Unsupported` when translated (spec
    /// §4.2 point 2): this crate has no parameter-binding phase.
    Parameter { name: String },
    TableColumn { table: Relation, field: String, renamed_as: Option<String> },
    Unary(UnaryOp, ValueExpr),
    Binary(BinaryOp, ValueExpr, ValueExpr),
    Cast { expr: ValueExpr, to: SqlType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::AsRefStr)]
pub enum UnaryOp {
    Negate,
    Not,
    IsNull,
    NotNull,
    /// Unary math functions, rendered `f(X)` (spec §4.2's unary-value
    /// registry entries).
    Exp,
    Sqrt,
    Log,
    Log2,
    Log10,
    /// Unary aggregates, rendered `avg(X)`/`sum(X)`.
    Mean,
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::AsRefStr)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Xor,
    Like,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    String(String),
    Number(NumberLiteral),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

/// The closed set of source types a `Cast` can target, matching spec
/// §4.2's type map exactly: `int8`/`int16`/`int32`/`int64`/`float`/
/// `double`/`string`/`boolean`, each serialized to its lowercase
/// Impala/Hive-dialect spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SqlType {
    #[strum(serialize = "tinyint")]
    Int8,
    #[strum(serialize = "smallint")]
    Int16,
    #[strum(serialize = "int")]
    Int32,
    #[strum(serialize = "bigint")]
    Int64,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "string")]
    String,
    #[strum(serialize = "boolean")]
    Boolean,
}

impl ValueExpr {
    fn new(kind: ExprKind) -> ValueExpr {
        ValueExpr(Rc::new(ExprNode { id: ExprId::fresh(), kind }))
    }

    pub fn literal(lit: Literal) -> ValueExpr {
        ValueExpr::new(ExprKind::Literal(lit))
    }

    pub fn parameter(name: impl Into<String>) -> ValueExpr {
        ValueExpr::new(ExprKind::Parameter { name: name.into() })
    }

    pub fn column(table: Relation, field: impl Into<String>) -> ValueExpr {
        ValueExpr::new(ExprKind::TableColumn { table, field: field.into(), renamed_as: None })
    }

    pub fn column_renamed(table: Relation, field: impl Into<String>, renamed_as: impl Into<String>) -> ValueExpr {
        ValueExpr::new(ExprKind::TableColumn {
            table,
            field: field.into(),
            renamed_as: Some(renamed_as.into()),
        })
    }

    pub fn unary(op: UnaryOp, operand: ValueExpr) -> ValueExpr {
        ValueExpr::new(ExprKind::Unary(op, operand))
    }

    pub fn binary(op: BinaryOp, lhs: ValueExpr, rhs: ValueExpr) -> ValueExpr {
        ValueExpr::new(ExprKind::Binary(op, lhs, rhs))
    }

    pub fn cast(expr: ValueExpr, to: SqlType) -> ValueExpr {
        ValueExpr::new(ExprKind::Cast { expr, to })
    }

    pub fn id(&self) -> ExprId {
        self.0.id
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    pub fn equals(&self, other: &ValueExpr) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.kind.equals(&other.0.kind)
    }

    /// Whether a `SELECT` item built from this expression needs an
    /// explicit `AS` alias to be unambiguous: anything that is not a bare,
    /// unrenamed column reference.
    pub fn needs_name(&self) -> bool {
        !matches!(self.kind(), ExprKind::TableColumn { renamed_as: None, .. })
    }

    /// The name a `SELECT` item built from this expression should carry,
    /// if one can be derived without an explicit alias.
    pub fn display_name(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::TableColumn { field, renamed_as, .. } => {
                Some(renamed_as.as_deref().unwrap_or(field.as_str()))
            }
            _ => None,
        }
    }

    /// Whether this expression, given its IR shape, is known to produce a
    /// boolean result. Used by the `Filter`/`having` builders to validate
    /// predicates. Resolution is intentionally shallow: it only looks
    /// through casts, comparisons, boolean connectives and the physical
    /// column schema of a direct `Table`; it does not attempt a general
    /// type system (spec §1 excludes one).
    pub fn is_boolean(&self) -> bool {
        match self.kind() {
            ExprKind::Literal(Literal::Boolean(_)) => true,
            ExprKind::Literal(_) => false,
            ExprKind::Parameter { .. } => false,
            ExprKind::Cast { to, .. } => matches!(to, SqlType::Boolean),
            ExprKind::Unary(op, _) => matches!(op, UnaryOp::Not | UnaryOp::IsNull | UnaryOp::NotNull),
            ExprKind::Binary(op, ..) => matches!(
                op,
                BinaryOp::Equal
                    | BinaryOp::NotEqual
                    | BinaryOp::LessThan
                    | BinaryOp::LessThanOrEqual
                    | BinaryOp::GreaterThan
                    | BinaryOp::GreaterThanOrEqual
                    | BinaryOp::And
                    | BinaryOp::Or
                    | BinaryOp::Xor
                    | BinaryOp::Like
            ),
            ExprKind::TableColumn { table, field, .. } => {
                matches!(table.column_type(field), Some(SqlType::Boolean))
            }
        }
    }
}

impl ExprKind {
    fn equals(&self, other: &ExprKind) -> bool {
        use ExprKind::*;
        match (self, other) {
            (Literal(a), Literal(b)) => a == b,
            (Parameter { name: a }, Parameter { name: b }) => a == b,
            (
                TableColumn { table: t1, field: f1, renamed_as: r1 },
                TableColumn { table: t2, field: f2, renamed_as: r2 },
            ) => t1.equals(t2) && f1 == f2 && r1 == r2,
            (Unary(o1, e1), Unary(o2, e2)) => o1 == o2 && e1.equals(e2),
            (Binary(o1, l1, r1), Binary(o2, l2, r2)) => o1 == o2 && l1.equals(l2) && r1.equals(r2),
            (Cast { expr: e1, to: t1 }, Cast { expr: e2, to: t2 }) => t1 == t2 && e1.equals(e2),
            _ => false,
        }
    }
}
