//! Stable small-integer node ids.
//!
//! The source compiler keys its alias map on object identity of the
//! underlying relation node. In an `Rc`-based IR we carry an explicit id
//! instead (REDESIGN FLAGS, spec §9): two `Relation`/`ValueExpr` handles
//! produced by `Clone` share an id; two independently-constructed nodes
//! never do, even if they happen to look identical.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REL_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_EXPR_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelId(u64);

impl RelId {
    pub(crate) fn fresh() -> Self {
        RelId(NEXT_REL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rel-{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u64);

impl ExprId {
    pub(crate) fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expr-{}", self.0)
    }
}

/// Generates `prefix0`, `prefix1`, ... names. Used by `QueryContext` for
/// alias names (`t0`, `t1`, ...).
#[derive(Debug, Clone)]
pub(crate) struct NameGenerator<T> {
    prefix: &'static str,
    next: usize,
    _marker: PhantomData<T>,
}

impl<T> NameGenerator<T> {
    pub(crate) fn new(prefix: &'static str) -> Self {
        NameGenerator { prefix, next: 0, _marker: PhantomData }
    }

    pub(crate) fn gen(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }

    pub(crate) fn count(&self) -> usize {
        self.next
    }
}
