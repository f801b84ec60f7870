//! The relational/scalar IR this compiler consumes.
//!
//! `spec.md` treats this IR as an external collaborator; this module gives
//! it a concrete, deliberately inert shape so the crate is self-contained
//! (see SPEC_FULL.md §1.1). No parser, type inference, or optimizer lives
//! here — only node construction, identity, and the handful of structural
//! helpers the rest of the crate calls into.

mod expr;
mod ids;
mod relation;

pub use expr::{BinaryOp, ExprKind, Literal, NumberLiteral, SqlType, UnaryOp, ValueExpr};
pub use ids::{ExprId, RelId};
pub(crate) use ids::NameGenerator;
pub use relation::{ColumnSchema, JoinKind, Relation, RelationKind, Sort};

/// What `limit` a `Relation` chain specifies, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    pub n: u64,
    pub offset: Option<u64>,
}

/// The modifiers shed from a chain of `Filter`/`Limit`/`SortBy` wrappers on
/// top of a base relation, plus that base relation itself.
#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    pub predicates: Vec<ValueExpr>,
    pub sort_keys: Vec<Sort>,
    pub limit: Option<LimitSpec>,
}

/// Walk outer-to-inner through `Filter`/`Limit`/`SortBy` wrappers, shedding
/// each one into `Modifiers`, and return the innermost non-modifier
/// relation underneath.
///
/// Predicates accumulate from every `Filter` layer encountered, outermost
/// first. `limit` and `sort_keys` do not: only the outermost occurrence of
/// each is kept, and any layer further in is discarded. This mirrors a
/// "last write wins at the call site" shape — the outermost wrapper is the
/// one the caller applied most recently — and is the deliberate resolution
/// of an Open Question the source left implicit (see DESIGN.md).
pub fn collect_modifiers(root: &Relation) -> (Relation, Modifiers) {
    let mut current = root.clone();
    let mut modifiers = Modifiers::default();

    loop {
        match current.kind() {
            RelationKind::Filter { table, predicates } => {
                modifiers.predicates.extend(predicates.iter().cloned());
                current = table.clone();
            }
            RelationKind::Limit { table, n, offset } => {
                if modifiers.limit.is_none() {
                    modifiers.limit = Some(LimitSpec { n: *n, offset: *offset });
                }
                current = table.clone();
            }
            RelationKind::SortBy { table, keys } => {
                if modifiers.sort_keys.is_empty() {
                    modifiers.sort_keys = keys.clone();
                }
                current = table.clone();
            }
            RelationKind::SelfRef(inner) => {
                current = inner.clone();
            }
            _ => break,
        }
    }

    (current, modifiers)
}

/// Rewrite a predicate's table references to point at a new parent
/// relation. The source compiler uses this to re-home predicates lifted out
/// of a join tree onto the `MaterializedJoin` they belong to; this crate's
/// `JoinFormatter` instead renders each side's own column references
/// directly against its own alias, so no rewriting is ever required and
/// this is the identity function. Kept as a named seam (rather than
/// inlined at call sites) so a future join-predicate rewrite has somewhere
/// to live without touching callers.
pub fn substitute_parents(expr: &ValueExpr, _new_parent: &Relation) -> ValueExpr {
    expr.clone()
}
