//! Compilation of a structured query into SQL text.
//!
//! Clauses are emitted in a fixed order:
//!
//! ```text
//! SELECT time column → metric column → value columns
//!   → FROM → WHERE → GROUP BY → ORDER BY
//! ```
//!
//! GROUP BY and ORDER BY refer to the time and metric columns by position
//! (`1` and `2`), so the SELECT list must always start with them.
//!
//! # Example
//!
//! ```
//! use sqlpanel::model::{Query, QueryPart, SelectColumn};
//!
//! let query = Query::structured("public", "cpu")
//!     .with_select(vec![SelectColumn::new("usage")
//!         .with_part(QueryPart::aggregate("avg"))
//!         .unwrap()])
//!     .with_group(vec![QueryPart::time("$__interval", None)]);
//!
//! assert_eq!(
//!     query.build_query(),
//!     "SELECT \n  $__timeGroup(time,$__interval),\n  avg(usage) \n FROM public.cpu\nGROUP BY 1 \n ORDER BY 1"
//! );
//! ```

use crate::model::{Query, QueryPart, SelectColumn};
use crate::sql::quote::quote_identifier;

const TIME_GROUP_MACRO: &str = "$__timeGroup";
const UNIX_EPOCH_GROUP_MACRO: &str = "$__unixEpochGroup";

/// Builds the SQL for one query. Borrowing, stateless and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'q> {
    query: &'q Query,
}

impl<'q> QueryBuilder<'q> {
    pub fn new(query: &'q Query) -> Self {
        Self { query }
    }

    /// Compile the whole statement.
    ///
    /// While schema or table is still a placeholder nothing is compiled and
    /// the current `raw_sql` is returned unchanged.
    pub fn build_query(&self) -> String {
        let q = self.query;
        if !q.has_target() {
            tracing::debug!(schema = %q.schema, table = %q.table, "no target selected, keeping raw SQL");
            return q.raw_sql.clone();
        }

        let mut sql = String::from("SELECT");
        sql.push_str(" \n  ");
        sql.push_str(&self.build_time_column(true));
        if q.has_metric_column() {
            sql.push_str(", \n  ");
            sql.push_str(&self.build_metric_column());
        }
        sql.push_str(&self.build_value_columns());
        sql.push_str(&format!(" \n FROM {}.{}", q.schema, q.table));
        sql.push_str(&self.build_where_clause());
        sql.push_str(&self.build_group_clause());
        sql.push_str(" \n ORDER BY 1");
        if q.has_metric_column() {
            sql.push_str(",2");
        }
        sql
    }

    /// The time column, or the time bucketing macro when grouped by time.
    ///
    /// `alias` adds `AS "time"` to a bare column; window ORDER BY clauses
    /// reuse this without it.
    pub fn build_time_column(&self, alias: bool) -> String {
        let q = self.query;
        match q.time_group_part() {
            Some(QueryPart::Time { interval, fill }) => {
                let args = match fill.as_deref() {
                    Some(fill) if fill != "none" => format!("{},{}", interval, fill),
                    _ => interval.clone(),
                };
                let macro_name = if q.has_unix_epoch_time_column() {
                    UNIX_EPOCH_GROUP_MACRO
                } else {
                    TIME_GROUP_MACRO
                };
                format!("{}({},{})", macro_name, q.time_column, args)
            }
            _ if alias => format!("{} AS \"time\"", q.time_column),
            _ => q.time_column.clone(),
        }
    }

    /// `<metric> AS metric`, or empty when no metric column is set.
    pub fn build_metric_column(&self) -> String {
        if self.query.has_metric_column() {
            format!("{} AS metric", self.query.metric_column)
        } else {
            String::new()
        }
    }

    /// All SELECT entries, each prefixed with `,\n  `.
    pub fn build_value_columns(&self) -> String {
        self.query
            .select
            .iter()
            .map(|column| format!(",\n  {}", self.build_value_column(column)))
            .collect()
    }

    /// One SELECT entry: column, then aggregate, then window, then alias.
    pub fn build_value_column(&self, column: &SelectColumn) -> String {
        let q = self.query;
        let mut expr = column.column().to_string();

        let aggregate = column.aggregate();
        match aggregate {
            Some(QueryPart::Aggregate { func }) if func == "first" || func == "last" => {
                expr = format!("{}({},{})", func, expr, q.time_column);
            }
            Some(QueryPart::Aggregate { func }) => {
                expr = format!("{}({})", func, expr);
            }
            Some(QueryPart::Percentile { func, fraction }) => {
                expr = format!("{}({}) WITHIN GROUP (ORDER BY {})", func, fraction, expr);
            }
            _ => {}
        }

        let has_alias = column.alias().is_some();
        if let Some(window) = column.window() {
            let over = self.window_spec();
            match window {
                QueryPart::Window { func } => {
                    expr = match func.as_str() {
                        "delta" => {
                            let prev = format!("lag({}) OVER ({})", expr, over);
                            format!("{} - {}", expr, prev)
                        }
                        "increase" => counter_delta(&expr, &over),
                        "rate" => {
                            let time = if aggregate.is_some() {
                                format!("min({})", q.time_column)
                            } else {
                                q.time_column.clone()
                            };
                            format!(
                                "{}/extract(epoch from {} - lag({}) OVER ({}))",
                                counter_delta(&expr, &over),
                                time,
                                time,
                                over
                            )
                        }
                        _ => format!("{}({}) OVER ({})", func, expr, over),
                    };
                    if !has_alias {
                        expr = format!("{} AS {}", expr, quote_identifier(func));
                    }
                }
                QueryPart::MovingWindow { func, rows } => {
                    expr = format!("{}({}) OVER ({} ROWS {} PRECEDING)", func, expr, over, rows);
                    if !has_alias {
                        expr = format!("{} AS {}", expr, quote_identifier("moving_window"));
                    }
                }
                _ => {}
            }
        }

        if let Some(alias) = column.alias() {
            expr = format!("{} AS {}", expr, quote_identifier(alias));
        }

        expr
    }

    /// `PARTITION BY <metric> ORDER BY <time>` for window functions.
    fn window_spec(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.query.has_metric_column() {
            parts.push(format!("PARTITION BY {}", self.query.metric_column));
        }
        parts.push(format!("ORDER BY {}", self.build_time_column(false)));
        parts.join(" ")
    }

    /// WHERE clause with conditions AND-ed in list order, or empty.
    pub fn build_where_clause(&self) -> String {
        let q = self.query;
        let conditions: Vec<String> = q
            .where_parts
            .iter()
            .filter_map(|part| match part {
                QueryPart::Macro { name } => Some(format!("{}({})", name, q.time_column)),
                QueryPart::Expression { left, op, right } => {
                    Some(format!("{} {} {}", left, op, right))
                }
                _ => None,
            })
            .collect();

        if conditions.is_empty() {
            String::new()
        } else {
            format!("\nWHERE\n  {}", conditions.join("\n  AND\n  "))
        }
    }

    /// GROUP BY clause, or empty when there is nothing to group by.
    ///
    /// The time group is referenced as `1`; an active metric column adds `,2`.
    pub fn build_group_clause(&self) -> String {
        let q = self.query;
        let terms: Vec<&str> = q
            .group
            .iter()
            .filter_map(|part| match part {
                QueryPart::Time { .. } => Some("1"),
                QueryPart::Column { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();

        if terms.is_empty() {
            return String::new();
        }
        let mut clause = format!("\nGROUP BY {}", terms.join(", "));
        if q.has_metric_column() {
            clause.push_str(",2");
        }
        clause
    }
}

/// Difference to the previous row that treats a drop as a counter reset.
fn counter_delta(curr: &str, over: &str) -> String {
    let prev = format!("lag({}) OVER ({})", curr, over);
    format!(
        "(CASE WHEN {curr} >= {prev} THEN {curr} - {prev} WHEN {prev} IS NULL THEN NULL ELSE {curr} END)",
        curr = curr,
        prev = prev
    )
}

impl Query {
    pub fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Compile the structured fields. See [`QueryBuilder::build_query`].
    pub fn build_query(&self) -> String {
        QueryBuilder::new(self).build_query()
    }

    /// The SQL to execute before template interpolation: the user text in
    /// raw mode, a fresh compilation otherwise.
    pub fn render_sql(&self) -> String {
        if self.raw_query {
            self.raw_sql.clone()
        } else {
            self.build_query()
        }
    }
}
