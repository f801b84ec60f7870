//! The `Select` node: the one relation shape that actually knows how to
//! render itself as a SQL query. Every other `RelationKind` is lowered into
//! one of these by `QueryASTBuilder` before rendering.

use itertools::Itertools;

use crate::context::QueryContext;
use crate::error::{Error, Result};
use crate::ir::{LimitSpec, Relation, Sort, ValueExpr};
use crate::join::JoinFormatter;
use crate::translator::translate_expr;

/// A soft line-wrap width for the `SELECT` list. Chosen to match the
/// source compiler's own constant, not a stylistic default — keep it
/// fixed, since test snapshots and spec §8's determinism property depend
/// on the exact wrap points it produces.
const SELECT_LINE_WIDTH: usize = 70;

#[derive(Debug, Clone)]
pub struct Select {
    /// The `FROM`/`JOIN` source: a physical table, a `MaterializedJoin`, or
    /// a `SelfRef` wrapping either. Never a `Projection`/`Aggregation`/
    /// `Filter`/`Limit`/`SortBy` — those are shed before a `Select` exists.
    pub table_set: Relation,
    pub selections: Vec<ValueExpr>,
    pub where_: Vec<ValueExpr>,
    pub group_by: Vec<ValueExpr>,
    pub having: Vec<ValueExpr>,
    pub sort_by: Vec<Sort>,
    pub limit: Option<LimitSpec>,
}

impl Select {
    pub fn new(table_set: Relation) -> Select {
        Select {
            table_set,
            selections: Vec::new(),
            where_: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            sort_by: Vec::new(),
            limit: None,
        }
    }

    /// Structural equality, delegating to the IR's own node-identity-aware
    /// `equals`. Two `Select`s are equal when every clause matches
    /// elementwise, in order.
    pub fn equals(&self, other: &Select) -> bool {
        self.table_set.equals(&other.table_set)
            && exprs_equal(&self.selections, &other.selections)
            && exprs_equal(&self.where_, &other.where_)
            && exprs_equal(&self.group_by, &other.group_by)
            && exprs_equal(&self.having, &other.having)
            && self.limit == other.limit
            && self.sort_by.len() == other.sort_by.len()
            && self
                .sort_by
                .iter()
                .zip(&other.sort_by)
                .all(|(a, b)| a.ascending == b.ascending && a.expr.equals(&b.expr))
    }

    /// Walk every table this `Select` touches and make sure it has an
    /// alias assigned, toggling `need_aliases` on the context once more
    /// than one distinct table is involved. Must run before any clause is
    /// rendered (spec §4.1/§4.3).
    pub fn populate_context(&self, context: &mut QueryContext) {
        let roots = self.table_set.root_tables();
        context.set_need_aliases(roots.len() > 1);
        for table in &roots {
            context.make_alias(table);
        }
    }

    pub fn render(&self) -> Result<String> {
        // Invariant 2 (spec §3): every non-aggregate in `group_by` must
        // appear, in the same relative order, as a prefix of `selections`.
        // group_by entries are compared by structural equality, not
        // identity, since they may be separately-constructed handles onto
        // the same logical column.
        if !self.group_by.is_empty() {
            let prefix_ok = self.group_by.len() <= self.selections.len()
                && self
                    .group_by
                    .iter()
                    .zip(self.selections.iter())
                    .all(|(g, s)| g.equals(s));
            if !prefix_ok {
                return Err(Error::internal(
                    "group_by keys must be a prefix of selections, in the same order",
                ));
            }
        }

        // Invariant 3 (spec §3): `having` only makes sense alongside a
        // `group_by` to filter the resulting groups.
        if !self.having.is_empty() && self.group_by.is_empty() {
            return Err(Error::internal("having requires a non-empty group_by"));
        }

        let mut context = QueryContext::new();
        self.populate_context(&mut context);

        let mut parts = Vec::new();
        parts.push(self.format_select_set(&context)?);
        parts.push(self.format_table_set(&context)?);
        if let Some(where_clause) = self.format_where(&context)? {
            parts.push(where_clause);
        }
        if let Some(group_by_clause) = self.format_group_by(&context)? {
            parts.push(group_by_clause);
        }
        if let Some(having_clause) = self.format_having(&context)? {
            parts.push(having_clause);
        }
        if let Some(order_by_clause) = self.format_order_by(&context)? {
            parts.push(order_by_clause);
        }
        if let Some(limit_clause) = self.format_limit() {
            parts.push(limit_clause);
        }

        Ok(parts.join("\n"))
    }

    fn format_select_set(&self, context: &QueryContext) -> Result<String> {
        if self.selections.is_empty() {
            return Ok("SELECT *".to_string());
        }

        let rendered = self
            .selections
            .iter()
            .map(|e| translate_expr(e, Some(context), true))
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("SELECT\n  {}", pack_select_items(&rendered)))
    }

    fn format_table_set(&self, context: &QueryContext) -> Result<String> {
        JoinFormatter::new(&self.table_set).render(context)
    }

    fn format_where(&self, context: &QueryContext) -> Result<Option<String>> {
        format_predicate_clause("WHERE", &self.where_, context)
    }

    fn format_group_by(&self, context: &QueryContext) -> Result<Option<String>> {
        if self.group_by.is_empty() {
            return Ok(None);
        }
        // Rendered positionally (`GROUP BY 1, 2`), matching the select-set
        // prefix these keys are required to be: position in `selections`
        // is already the canonical reference.
        let positions = (1..=self.group_by.len()).join(", ");
        Ok(Some(format!("GROUP BY {positions}")))
    }

    fn format_having(&self, context: &QueryContext) -> Result<Option<String>> {
        format_predicate_clause("HAVING", &self.having, context)
    }

    fn format_order_by(&self, context: &QueryContext) -> Result<Option<String>> {
        if self.sort_by.is_empty() {
            return Ok(None);
        }
        let items = self
            .sort_by
            .iter()
            .map(|sort| {
                let body = translate_expr(&sort.expr, Some(context), false)?;
                Ok(if sort.ascending { body } else { format!("{body} DESC") })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(format!("ORDER BY {}", items.iter().join(", "))))
    }

    fn format_limit(&self) -> Option<String> {
        self.limit.map(|spec| match spec.offset {
            Some(offset) => format!("LIMIT {} OFFSET {}", spec.n, offset),
            None => format!("LIMIT {}", spec.n),
        })
    }
}

fn format_predicate_clause(
    keyword: &str,
    predicates: &[ValueExpr],
    context: &QueryContext,
) -> Result<Option<String>> {
    if predicates.is_empty() {
        return Ok(None);
    }
    let rendered = predicates
        .iter()
        .map(|e| translate_expr(e, Some(context), false))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(format!("{keyword} {}", rendered.iter().join(" AND\n      "))))
}

fn exprs_equal(a: &[ValueExpr], b: &[ValueExpr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

/// Pack comma-separated `SELECT` items onto lines no wider than
/// [`SELECT_LINE_WIDTH`], breaking at item boundaries only and indenting
/// every continuation line by two spaces. Ported from the source
/// compiler's own line-buffer algorithm: items are appended to the current
/// line until appending the next one (plus its separator) would overflow
/// the width, at which point the line is flushed and a new one started.
fn pack_select_items(items: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, item) in items.iter().enumerate() {
        let is_last = i == items.len() - 1;
        let piece = if is_last { item.clone() } else { format!("{item},") };

        if current.is_empty() {
            current = piece;
        } else if current.len() + 1 + piece.len() > SELECT_LINE_WIDTH {
            lines.push(std::mem::take(&mut current));
            current = piece;
        } else {
            current.push(' ');
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n  ")
}
