//! The panel query: aggregate root of the structured query state.

use serde::{Deserialize, Serialize};

use super::defaults::{NO_METRIC_COLUMN, SCHEMA_SENTINEL, TABLE_SENTINEL, UNIX_EPOCH_TIME_TYPES};
use super::part::{PartError, PartResult, PartSlot, QueryPart, RawQueryPart};
use super::select::SelectColumn;
use crate::config::EditorDefaults;

/// How the backend shapes the result. Has no effect on the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    #[default]
    TimeSeries,
    Table,
}

/// Which editor owns the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// `raw_sql` is user text and is executed as is.
    Raw,
    /// `raw_sql` is derived from the structured fields on every change.
    Structured,
}

/// A fully defaulted panel query.
///
/// Build one with [`normalize`] (or by deserializing, which normalizes with
/// the built-in defaults); after that every field holds a usable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QueryDocument")]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    pub schema: String,
    pub table: String,
    pub time_column: String,
    pub time_column_type: String,
    pub metric_column: String,
    pub select: Vec<SelectColumn>,
    #[serde(rename = "where")]
    pub where_parts: Vec<QueryPart>,
    pub group: Vec<QueryPart>,
    /// First `time` part of `group`, kept for the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_group: Option<QueryPart>,
    pub format: ResultFormat,
    pub raw_query: bool,
    pub raw_sql: String,
    pub hide: bool,
}

/// A query as persisted by the host: every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryDocument {
    pub ref_id: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub time_column: Option<String>,
    pub time_column_type: Option<String>,
    pub metric_column: Option<String>,
    pub select: Option<Vec<Vec<RawQueryPart>>>,
    #[serde(rename = "where")]
    pub where_parts: Option<Vec<RawQueryPart>>,
    pub group: Option<Vec<RawQueryPart>>,
    pub time_group: Option<RawQueryPart>,
    pub format: Option<ResultFormat>,
    pub raw_query: Option<bool>,
    pub raw_sql: Option<String>,
    pub hide: Option<bool>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parts_in(
    raw: Option<Vec<RawQueryPart>>,
    section: &'static str,
    allowed: &[PartSlot],
) -> PartResult<Vec<QueryPart>> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|raw| {
            let part = QueryPart::try_from(raw)?;
            if allowed.contains(&part.slot()) {
                Ok(part)
            } else {
                Err(PartError::Misplaced {
                    part_type: part.type_name(),
                    section,
                })
            }
        })
        .collect()
}

/// Apply defaults to a persisted query and validate its parts.
///
/// Pure: the document is consumed and a new value returned. The only
/// derived state is `time_group` and, for structured queries with no SQL
/// yet, `raw_sql`.
pub fn normalize(doc: QueryDocument, defaults: &EditorDefaults) -> PartResult<Query> {
    let select = match doc.select {
        Some(entries) => entries
            .into_iter()
            .map(|entry| {
                let parts = entry
                    .into_iter()
                    .map(QueryPart::try_from)
                    .collect::<PartResult<Vec<_>>>()?;
                SelectColumn::from_parts(parts)
            })
            .collect::<PartResult<Vec<_>>>()?,
        None => vec![SelectColumn::new(&defaults.value_column)],
    };
    let where_parts = parts_in(doc.where_parts, "where", &[PartSlot::Macro, PartSlot::Expression])?;
    let group = parts_in(doc.group, "group", &[PartSlot::Time, PartSlot::Column])?;

    let mut query = Query {
        ref_id: doc.ref_id,
        schema: or_default(doc.schema, SCHEMA_SENTINEL),
        table: or_default(doc.table, TABLE_SENTINEL),
        time_column: or_default(doc.time_column, &defaults.time_column),
        time_column_type: or_default(doc.time_column_type, &defaults.time_column_type),
        metric_column: or_default(doc.metric_column, &defaults.metric_column),
        select,
        where_parts,
        group,
        time_group: None,
        format: doc.format.unwrap_or(defaults.format),
        raw_query: doc.raw_query.unwrap_or(defaults.raw_query),
        raw_sql: doc.raw_sql.unwrap_or_default(),
        hide: doc.hide.unwrap_or(false),
    };
    query.sync_time_group();

    if query.raw_sql.is_empty() {
        query.raw_sql = if query.raw_query {
            defaults.raw_sql.clone()
        } else {
            query.build_query()
        };
    }

    Ok(query)
}

impl TryFrom<QueryDocument> for Query {
    type Error = PartError;

    fn try_from(doc: QueryDocument) -> PartResult<Self> {
        normalize(doc, &EditorDefaults::default())
    }
}

impl Default for Query {
    fn default() -> Self {
        let defaults = EditorDefaults::default();
        Query {
            ref_id: None,
            schema: SCHEMA_SENTINEL.to_string(),
            table: TABLE_SENTINEL.to_string(),
            time_column: defaults.time_column,
            time_column_type: defaults.time_column_type,
            metric_column: defaults.metric_column,
            select: vec![SelectColumn::new(&defaults.value_column)],
            where_parts: Vec::new(),
            group: Vec::new(),
            time_group: None,
            format: defaults.format,
            raw_query: defaults.raw_query,
            raw_sql: defaults.raw_sql,
            hide: false,
        }
    }
}

impl Query {
    /// A structured query against `schema.table` with default columns.
    pub fn structured(schema: &str, table: &str) -> Self {
        let mut query = Query {
            schema: schema.into(),
            table: table.into(),
            raw_query: false,
            raw_sql: String::new(),
            ..Query::default()
        };
        query.raw_sql = query.build_query();
        query
    }

    /// A raw query holding `sql`.
    pub fn raw(sql: &str) -> Self {
        Query {
            raw_query: true,
            raw_sql: sql.into(),
            ..Query::default()
        }
    }

    pub fn with_time_column(mut self, column: &str) -> Self {
        self.time_column = column.into();
        self
    }

    pub fn with_time_column_type(mut self, column_type: &str) -> Self {
        self.time_column_type = column_type.into();
        self
    }

    pub fn with_metric_column(mut self, column: &str) -> Self {
        self.metric_column = column.into();
        self
    }

    pub fn with_select(mut self, select: Vec<SelectColumn>) -> Self {
        self.select = select;
        self
    }

    pub fn with_where(mut self, parts: Vec<QueryPart>) -> Self {
        self.where_parts = parts;
        self
    }

    pub fn with_group(mut self, parts: Vec<QueryPart>) -> Self {
        self.group = parts;
        self.sync_time_group();
        self
    }

    pub fn with_format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }

    pub fn mode(&self) -> EditorMode {
        if self.raw_query {
            EditorMode::Raw
        } else {
            EditorMode::Structured
        }
    }

    /// Whether the query should be sent to the backend at all.
    ///
    /// A missing `hide` normalizes to `false`, so only an explicit
    /// `hide: true` keeps a query out of the request.
    pub fn is_executable(&self) -> bool {
        !self.hide
    }

    /// Whether schema and table have both been chosen.
    pub fn has_target(&self) -> bool {
        self.schema != SCHEMA_SENTINEL && self.table != TABLE_SENTINEL
    }

    /// The `time` part of `group`, if the query is bucketed by time.
    pub fn time_group_part(&self) -> Option<&QueryPart> {
        self.group.iter().find(|p| p.slot() == PartSlot::Time)
    }

    pub fn has_metric_column(&self) -> bool {
        self.metric_column != NO_METRIC_COLUMN
    }

    /// Whether the time column stores epoch seconds instead of timestamps.
    pub fn has_unix_epoch_time_column(&self) -> bool {
        UNIX_EPOCH_TIME_TYPES.contains(&self.time_column_type.as_str())
    }

    pub(crate) fn sync_time_group(&mut self) {
        self.time_group = self.time_group_part().cloned();
    }
}
