//! Introspection SQL for the schema, table and column pickers.

use std::fmt;
use std::str::FromStr;

use crate::config::CatalogSettings;
use crate::model::Query;
use crate::sql::quote::quote_ident_as_literal;

const TIME_TYPES: &str = " AND (data_type LIKE 'date%' OR data_type LIKE 'time%' \
OR data_type LIKE 'timestamp%' OR data_type LIKE 'timetz%' \
OR data_type LIKE 'timestamptz%' OR data_type LIKE 'interval%')";

const METRIC_TYPES: &str = " AND (data_type LIKE 'long varchar%' \
OR data_type LIKE 'varchar%' OR data_type LIKE 'char%')";

const VALUE_TYPES: &str = " AND (data_type LIKE 'double precision%' \
OR data_type LIKE 'float%' OR data_type LIKE 'real%' OR data_type LIKE 'int%' \
OR data_type LIKE 'bigint%' OR data_type LIKE 'smallint%' OR data_type LIKE 'tinyint%' \
OR data_type LIKE 'decimal%' OR data_type LIKE 'numeric%' OR data_type LIKE 'number%' \
OR data_type LIKE 'money%')";

/// Column type family used to narrow a column listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Time,
    Metric,
    Value,
}

impl ColumnCategory {
    fn type_predicate(&self) -> &'static str {
        match self {
            ColumnCategory::Time => TIME_TYPES,
            ColumnCategory::Metric => METRIC_TYPES,
            ColumnCategory::Value => VALUE_TYPES,
        }
    }
}

impl fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnCategory::Time => "time",
            ColumnCategory::Metric => "metric",
            ColumnCategory::Value => "value",
        };
        f.write_str(s)
    }
}

impl FromStr for ColumnCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(ColumnCategory::Time),
            "metric" => Ok(ColumnCategory::Metric),
            "value" => Ok(ColumnCategory::Value),
            other => Err(format!(
                "unknown column category '{}', expected time, metric or value",
                other
            )),
        }
    }
}

/// Builds catalog queries for one panel query.
#[derive(Debug, Clone, Copy)]
pub struct MetaQuery<'a> {
    query: &'a Query,
    catalog: &'a CatalogSettings,
}

impl<'a> MetaQuery<'a> {
    pub fn new(query: &'a Query, catalog: &'a CatalogSettings) -> Self {
        Self { query, catalog }
    }

    /// `table_schema = '..' AND table_name = '..'` for the target table.
    ///
    /// A schema-qualified table name (`schema.table`) wins over the
    /// separately configured schema.
    pub fn build_table_constraint(&self) -> String {
        let (schema, table) = match self.query.table.split_once('.') {
            Some((schema, rest)) => {
                let table = rest.split('.').next().unwrap_or(rest);
                (schema, table)
            }
            None => (self.query.schema.as_str(), self.query.table.as_str()),
        };

        format!(
            "table_schema = {} AND table_name = {}",
            quote_ident_as_literal(schema),
            quote_ident_as_literal(table)
        )
    }

    pub fn build_schema_query(&self) -> String {
        format!("SELECT distinct(table_schema) FROM {}", self.catalog.tables_view)
    }

    pub fn build_table_query(&self) -> String {
        format!(
            "SELECT table_name FROM {} WHERE table_schema = {}",
            self.catalog.tables_view,
            quote_ident_as_literal(&self.query.schema)
        )
    }

    /// Columns of the target table, optionally narrowed to a type family.
    ///
    /// Value columns never include the bound time column.
    pub fn build_column_query(&self, category: Option<ColumnCategory>) -> String {
        let mut sql = format!(
            "SELECT column_name FROM {} WHERE {}",
            self.catalog.columns_view,
            self.build_table_constraint()
        );

        if let Some(category) = category {
            sql.push_str(category.type_predicate());
            if category == ColumnCategory::Value {
                sql.push_str(" AND column_name <> ");
                sql.push_str(&quote_ident_as_literal(&self.query.time_column));
            }
        }

        sql.push_str(" ORDER BY column_name");
        sql
    }
}
