#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use insta::assert_snapshot;
    use serde_json::json;
    use sqlpanel::config::{CatalogSettings, Settings};
    use sqlpanel::metadata::{
        ColumnCategory, MetaQuery, MetadataResult, MetadataSource, MetricFindValue,
        PickerOption, PickerOptions, ResultFrame,
    };
    use sqlpanel::model::Query;
    use std::collections::HashMap;

    fn query(schema: &str, table: &str) -> Query {
        Query::structured(schema, table).with_time_column("created")
    }

    #[test]
    fn test_dotted_table_ignores_schema() {
        let catalog = CatalogSettings::default();
        let q = query("other", "public.intest");
        let sql = MetaQuery::new(&q, &catalog).build_column_query(None);

        assert_snapshot!(
            sql,
            @"SELECT column_name FROM columns WHERE table_schema = 'public' AND table_name = 'intest' ORDER BY column_name"
        );
    }

    #[test]
    fn test_value_column_query() {
        let catalog = CatalogSettings::default();
        let q = query("public", "intest");
        let sql = MetaQuery::new(&q, &catalog).build_column_query(Some(ColumnCategory::Value));

        assert_snapshot!(
            sql,
            @"SELECT column_name FROM columns WHERE table_schema = 'public' AND table_name = 'intest' AND (data_type LIKE 'double precision%' OR data_type LIKE 'float%' OR data_type LIKE 'real%' OR data_type LIKE 'int%' OR data_type LIKE 'bigint%' OR data_type LIKE 'smallint%' OR data_type LIKE 'tinyint%' OR data_type LIKE 'decimal%' OR data_type LIKE 'numeric%' OR data_type LIKE 'number%' OR data_type LIKE 'money%') AND column_name <> 'created' ORDER BY column_name"
        );
    }

    #[test]
    fn test_time_column_query() {
        let catalog = CatalogSettings::default();
        let q = query("public", "intest");
        let sql = MetaQuery::new(&q, &catalog).build_column_query(Some(ColumnCategory::Time));

        assert_snapshot!(
            sql,
            @"SELECT column_name FROM columns WHERE table_schema = 'public' AND table_name = 'intest' AND (data_type LIKE 'date%' OR data_type LIKE 'time%' OR data_type LIKE 'timestamp%' OR data_type LIKE 'timetz%' OR data_type LIKE 'timestamptz%' OR data_type LIKE 'interval%') ORDER BY column_name"
        );
    }

    #[test]
    fn test_catalog_views_from_settings() {
        let settings = Settings::from_toml(
            r#"
            [catalog]
            tables_view = "v_catalog.tables"
            columns_view = "v_catalog.columns"
            "#,
        )
        .unwrap();
        let q = query("public", "intest");
        let meta = MetaQuery::new(&q, &settings.catalog);

        assert_snapshot!(
            meta.build_table_query(),
            @"SELECT table_name FROM v_catalog.tables WHERE table_schema = 'public'"
        );
    }

    /// Serves canned frames keyed by the SQL it receives.
    struct FrameSource {
        frames: HashMap<String, ResultFrame>,
    }

    #[async_trait]
    impl MetadataSource for FrameSource {
        async fn execute_metadata_query(&self, sql: &str) -> MetadataResult<Vec<MetricFindValue>> {
            match self.frames.get(sql) {
                Some(frame) => MetricFindValue::from_frame(frame),
                None => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_picker_options_from_frames() {
        let catalog = CatalogSettings::default();
        let q = query("public", "intest");
        let meta = MetaQuery::new(&q, &catalog);

        let tables: ResultFrame = serde_json::from_value(json!({
            "fields": [
                {"name": "__text", "values": ["Input test", "Output test"]},
                {"name": "__value", "values": ["intest", "outtest"]}
            ]
        }))
        .unwrap();
        let columns: ResultFrame = serde_json::from_value(json!({
            "fields": [{"name": "column_name", "values": ["bytes", "errors"]}]
        }))
        .unwrap();

        let source = FrameSource {
            frames: HashMap::from([
                (meta.build_table_query(), tables),
                (meta.build_column_query(Some(ColumnCategory::Value)), columns),
            ]),
        };

        assert_eq!(
            source.table_options(&meta).await.unwrap(),
            vec![
                PickerOption::new("Input test", "intest"),
                PickerOption::new("Output test", "outtest"),
            ]
        );
        assert_eq!(
            source.value_column_options(&meta).await.unwrap(),
            vec![
                PickerOption::new("bytes", "bytes"),
                PickerOption::new("errors", "errors"),
            ]
        );
        assert!(source.schema_options(&meta).await.unwrap().is_empty());
    }
}
