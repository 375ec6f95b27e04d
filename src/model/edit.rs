//! Editor operations on a query.
//!
//! Each operation keeps the query valid and, for structured queries,
//! regenerates `raw_sql`, so the caller never holds SQL that is out of
//! date with the structured fields.

use super::part::{PartError, PartResult, PartSlot, QueryPart};
use super::query::Query;
use super::select::SelectColumn;
use crate::config::EditorDefaults;

impl Query {
    /// Regenerate `raw_sql` from the structured fields (structured mode only).
    pub fn refresh_sql(&mut self) {
        if !self.raw_query {
            self.raw_sql = self.build_query();
        }
    }

    /// Switch between the raw and the structured editor.
    ///
    /// Going to raw snapshots the compiled SQL so the user starts from it.
    /// Going to structured leaves `raw_sql` alone until the next edit
    /// rebuilds it; the caller should warn that manual edits will be lost.
    pub fn set_raw_mode(&mut self, raw: bool) {
        if raw == self.raw_query {
            return;
        }
        if raw {
            self.raw_sql = self.build_query();
        }
        self.raw_query = raw;
        tracing::debug!(raw, "switched editor mode");
    }

    pub fn set_schema(&mut self, schema: &str) {
        self.schema = schema.trim().to_string();
        self.refresh_sql();
    }

    pub fn set_table(&mut self, table: &str) {
        self.table = table.trim().to_string();
        self.refresh_sql();
    }

    pub fn set_time_column(&mut self, column: &str) {
        self.time_column = column.trim().to_string();
        self.refresh_sql();
    }

    pub fn set_metric_column(&mut self, column: &str) {
        self.metric_column = column.trim().to_string();
        self.refresh_sql();
    }

    /// Append a new bare value column.
    pub fn add_select_column(&mut self, column: &str) {
        self.select.push(SelectColumn::new(column));
        self.refresh_sql();
    }

    /// Remove a value column. The last remaining one is kept.
    pub fn remove_select_column(&mut self, index: usize) -> bool {
        if self.select.len() <= 1 || index >= self.select.len() {
            return false;
        }
        self.select.remove(index);
        self.refresh_sql();
        true
    }

    /// Add or replace a part of the value column at `index`.
    pub fn set_select_part(&mut self, index: usize, part: QueryPart) -> PartResult<()> {
        let column = self
            .select
            .get_mut(index)
            .ok_or(PartError::NoSuchColumn(index))?;
        column.set_part(part)?;
        self.refresh_sql();
        Ok(())
    }

    /// Remove the part in `slot` from the value column at `index`.
    pub fn remove_select_part(&mut self, index: usize, slot: PartSlot) -> PartResult<bool> {
        let column = self
            .select
            .get_mut(index)
            .ok_or(PartError::NoSuchColumn(index))?;
        let removed = column.remove_part(slot)?;
        if removed {
            self.refresh_sql();
        }
        Ok(removed)
    }

    /// Add an alias to the value column at `index`, named after its column.
    pub fn add_default_alias(&mut self, index: usize) -> PartResult<()> {
        let name = self
            .select
            .get(index)
            .map(|c| c.column().to_string())
            .ok_or(PartError::NoSuchColumn(index))?;
        self.set_select_part(index, QueryPart::alias(&name))
    }

    /// Add a moving window with the configured defaults.
    pub fn add_default_moving_window(
        &mut self,
        index: usize,
        defaults: &EditorDefaults,
    ) -> PartResult<()> {
        let rows = defaults.moving_window.rows.to_string();
        self.set_select_part(
            index,
            QueryPart::moving_window(&defaults.moving_window.function, rows),
        )
    }

    /// Add a filter macro. Only one macro may be present.
    pub fn add_where_macro(&mut self, name: &str) -> bool {
        if self.where_parts.iter().any(|p| p.slot() == PartSlot::Macro) {
            return false;
        }
        self.where_parts.push(QueryPart::macro_call(name));
        self.refresh_sql();
        true
    }

    /// Add a `value = value` expression for the user to edit.
    pub fn add_where_expression(&mut self) {
        self.where_parts
            .push(QueryPart::expression("value", "=", "value"));
        self.refresh_sql();
    }

    /// Replace the expression at `index` with new operands.
    ///
    /// Macros have no editable params and are left untouched.
    pub fn update_where_expression(&mut self, index: usize, left: &str, op: &str, right: &str) -> bool {
        let Some(part) = self.where_parts.get_mut(index) else {
            return false;
        };
        if !matches!(part, QueryPart::Expression { .. }) {
            return false;
        }
        *part = QueryPart::expression(left, op, right);
        self.refresh_sql();
        true
    }

    pub fn remove_where(&mut self, index: usize) -> bool {
        if index >= self.where_parts.len() {
            return false;
        }
        self.where_parts.remove(index);
        self.refresh_sql();
        true
    }

    /// Bucket by time using the configured interval and fill. Only one time
    /// group may be present.
    pub fn add_time_group(&mut self, defaults: &EditorDefaults) -> bool {
        if self.time_group_part().is_some() {
            return false;
        }
        self.group.push(QueryPart::time(
            &defaults.time_group_interval,
            Some(&defaults.time_group_fill),
        ));
        self.sync_time_group();
        self.refresh_sql();
        true
    }

    /// Change interval and fill of the existing time group.
    pub fn update_time_group(&mut self, interval: &str, fill: Option<&str>) -> bool {
        match self.group.iter_mut().find(|p| p.slot() == PartSlot::Time) {
            Some(part) => {
                *part = QueryPart::time(interval, fill);
                self.sync_time_group();
                self.refresh_sql();
                true
            }
            None => false,
        }
    }

    pub fn add_group_column(&mut self, column: &str) {
        self.group.push(QueryPart::column(column));
        self.refresh_sql();
    }

    pub fn remove_group(&mut self, index: usize) -> bool {
        if index >= self.group.len() {
            return false;
        }
        self.group.remove(index);
        self.sync_time_group();
        self.refresh_sql();
        true
    }
}
