//! MetadataSource trait definition.
//!
//! The source executes introspection SQL against the backend. The plugin
//! never talks to the database itself; it only produces SQL and consumes
//! the returned rows.

use async_trait::async_trait;
use thiserror::Error;

use super::meta_query::{ColumnCategory, MetaQuery};
use super::types::MetricFindValue;
use crate::model::defaults::NO_METRIC_COLUMN;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while fetching picker options.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The backend rejected or failed to run the query.
    #[error("metadata query failed: {0}")]
    Source(String),

    /// The backend answered with a frame we cannot read.
    #[error("malformed metadata frame: {0}")]
    MalformedFrame(String),
}

impl MetadataError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }
}

/// Executes metadata SQL on behalf of the editor.
///
/// # Example
///
/// ```ignore
/// use sqlpanel::metadata::{MetadataSource, MetaQuery, PickerOptions};
///
/// async fn example(source: &impl MetadataSource, meta: &MetaQuery<'_>) -> MetadataResult<()> {
///     let schemas = source.schema_options(meta).await?;
///     let columns = source.value_column_options(meta).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Run `sql` and return one row per picker entry.
    async fn execute_metadata_query(&self, sql: &str) -> MetadataResult<Vec<MetricFindValue>>;
}

/// An entry of a picker list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub label: String,
    pub value: String,
}

impl PickerOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl From<MetricFindValue> for PickerOption {
    fn from(row: MetricFindValue) -> Self {
        let value = row.value_or_text().to_string();
        Self {
            label: row.text,
            value,
        }
    }
}

/// Option lists for the editor pickers, built on any [`MetadataSource`].
#[async_trait]
pub trait PickerOptions: MetadataSource {
    async fn options_for(&self, sql: String) -> MetadataResult<Vec<PickerOption>> {
        tracing::debug!(sql = %sql, "running metadata query");
        let rows = self.execute_metadata_query(&sql).await?;
        Ok(rows.into_iter().map(PickerOption::from).collect())
    }

    async fn schema_options(&self, meta: &MetaQuery<'_>) -> MetadataResult<Vec<PickerOption>> {
        self.options_for(meta.build_schema_query()).await
    }

    async fn table_options(&self, meta: &MetaQuery<'_>) -> MetadataResult<Vec<PickerOption>> {
        self.options_for(meta.build_table_query()).await
    }

    async fn time_column_options(&self, meta: &MetaQuery<'_>) -> MetadataResult<Vec<PickerOption>> {
        self.options_for(meta.build_column_query(Some(ColumnCategory::Time)))
            .await
    }

    /// Character columns, preceded by the `none` entry that disables the
    /// metric column.
    async fn metric_column_options(
        &self,
        meta: &MetaQuery<'_>,
    ) -> MetadataResult<Vec<PickerOption>> {
        let mut options = vec![PickerOption::new(NO_METRIC_COLUMN, NO_METRIC_COLUMN)];
        options.extend(
            self.options_for(meta.build_column_query(Some(ColumnCategory::Metric)))
                .await?,
        );
        Ok(options)
    }

    async fn value_column_options(
        &self,
        meta: &MetaQuery<'_>,
    ) -> MetadataResult<Vec<PickerOption>> {
        self.options_for(meta.build_column_query(Some(ColumnCategory::Value)))
            .await
    }

    /// Every column of the target table, for WHERE expressions.
    async fn column_options(&self, meta: &MetaQuery<'_>) -> MetadataResult<Vec<PickerOption>> {
        self.options_for(meta.build_column_query(None)).await
    }
}

impl<T: MetadataSource> PickerOptions for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogSettings;
    use crate::model::Query;
    use std::sync::Mutex;

    /// Answers every query with the same rows and remembers what it ran.
    struct RecordingSource {
        rows: Vec<MetricFindValue>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingSource {
        fn new(rows: Vec<MetricFindValue>) -> Self {
            Self {
                rows,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetadataSource for RecordingSource {
        async fn execute_metadata_query(&self, sql: &str) -> MetadataResult<Vec<MetricFindValue>> {
            self.seen.lock().unwrap().push(sql.to_string());
            Ok(self.rows.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        async fn execute_metadata_query(&self, _sql: &str) -> MetadataResult<Vec<MetricFindValue>> {
            Err(MetadataError::backend("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_schema_options() {
        let source = RecordingSource::new(vec![
            MetricFindValue::text("public"),
            MetricFindValue::with_value("Sales", "sales"),
        ]);
        let query = Query::structured("public", "intest");
        let catalog = CatalogSettings::default();
        let meta = MetaQuery::new(&query, &catalog);

        let options = source.schema_options(&meta).await.unwrap();
        assert_eq!(
            options,
            vec![
                PickerOption::new("public", "public"),
                PickerOption::new("Sales", "sales"),
            ]
        );
        assert_eq!(
            source.seen.lock().unwrap().as_slice(),
            ["SELECT distinct(table_schema) FROM tables"]
        );
    }

    #[tokio::test]
    async fn test_metric_options_start_with_none() {
        let source = RecordingSource::new(vec![MetricFindValue::text("host")]);
        let query = Query::structured("public", "intest");
        let catalog = CatalogSettings::default();
        let meta = MetaQuery::new(&query, &catalog);

        let options = source.metric_column_options(&meta).await.unwrap();
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["none", "host"]);
    }

    #[tokio::test]
    async fn test_value_options_query() {
        let source = RecordingSource::new(vec![]);
        let query = Query::structured("public", "intest");
        let catalog = CatalogSettings::default();
        let meta = MetaQuery::new(&query, &catalog);

        source.value_column_options(&meta).await.unwrap();
        let seen = source.seen.lock().unwrap();
        assert!(seen[0].contains("column_name <> 'time'"));
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let query = Query::structured("public", "intest");
        let catalog = CatalogSettings::default();
        let meta = MetaQuery::new(&query, &catalog);

        let err = FailingSource.table_options(&meta).await.unwrap_err();
        assert_eq!(err.to_string(), "metadata query failed: connection refused");
    }
}
