//! Alias bookkeeping for a single query being rendered.
//!
//! Mirrors `prql-compiler`'s `sql::context::AnchorContext` in spirit (a
//! single mutable struct threaded explicitly through rendering, never
//! stashed behind a thread-local), but keyed on the stable [`RelId`] this
//! crate's IR carries rather than on a richer column-anchor model.

use std::collections::HashMap;

use crate::ir::{NameGenerator, RelId, Relation};

/// Per-query alias assignment, keyed by relation identity rather than
/// structural equality (spec §4.1, REDESIGN FLAGS spec §9): two distinct
/// `Table("orders", ..)` relations built separately get distinct aliases
/// even though they print identically.
#[derive(Debug)]
pub struct QueryContext {
    aliases: HashMap<RelId, String>,
    generator: NameGenerator<RelId>,
    /// Whether more than one table is in scope, so bare column references
    /// must be qualified by alias rather than left bare.
    need_aliases: bool,
}

impl Default for QueryContext {
    fn default() -> Self {
        QueryContext {
            aliases: HashMap::new(),
            generator: NameGenerator::new("t"),
            need_aliases: false,
        }
    }
}

impl QueryContext {
    pub fn new() -> QueryContext {
        QueryContext::default()
    }

    pub fn has_alias(&self, relation: &Relation) -> bool {
        self.aliases.contains_key(&relation.id())
    }

    pub fn get_alias(&self, relation: &Relation) -> Option<&str> {
        self.aliases.get(&relation.id()).map(String::as_str)
    }

    pub fn set_alias(&mut self, relation: &Relation, alias: impl Into<String>) {
        self.aliases.insert(relation.id(), alias.into());
    }

    /// Assign and return a fresh alias for `relation`, or return its
    /// existing alias if one was already set. Idempotent per relation id.
    pub fn make_alias(&mut self, relation: &Relation) -> &str {
        if !self.aliases.contains_key(&relation.id()) {
            let alias = self.generator.gen();
            log::trace!("assigning alias {alias} to {:?}", relation.id());
            self.aliases.insert(relation.id(), alias);
        }
        self.aliases.get(&relation.id()).map(String::as_str).unwrap()
    }

    pub fn need_aliases(&self) -> bool {
        self.need_aliases
    }

    pub fn set_need_aliases(&mut self, need: bool) {
        self.need_aliases = need;
    }
}
