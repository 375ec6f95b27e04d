#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlpanel::macros::{expand_macros, FillMode, MacroError, TimeRange};
    use sqlpanel::model::Query;

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 25, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_compiled_query_expands() {
        let query: Query = serde_json::from_value(json!({
            "schema": "public",
            "table": "cpu",
            "timeColumn": "created",
            "select": [[
                {"type": "column", "params": ["usage"]},
                {"type": "aggregate", "params": ["avg"]}
            ]],
            "where": [{"type": "macro", "name": "$__timeFilter", "params": []}],
            "group": [{"type": "time", "params": ["5m", "previous"]}],
            "rawQuery": false
        }))
        .unwrap();

        let expansion = expand_macros(&query.render_sql(), &range()).unwrap();
        assert_eq!(
            expansion.sql,
            "SELECT \n  floor(extract(epoch from created)/300)*300 as time,\n  avg(usage) \
             \n FROM public.cpu\nWHERE\n  created BETWEEN '2021-01-01T12:00:00Z' AND '2021-01-25T12:00:00Z'\
             \nGROUP BY 1 \n ORDER BY 1"
        );
        assert_eq!(expansion.fill_mode, FillMode::Previous);
    }

    #[test]
    fn test_unix_epoch_time_column_expands() {
        let query: Query = serde_json::from_value(json!({
            "schema": "public",
            "table": "events",
            "timeColumn": "ts",
            "timeColumnType": "int8",
            "select": [[
                {"type": "column", "params": ["hits"]},
                {"type": "aggregate", "params": ["sum"]}
            ]],
            "group": [{"type": "time", "params": ["1h", "none"]}],
            "rawQuery": false
        }))
        .unwrap();

        let expansion = expand_macros(&query.render_sql(), &range()).unwrap();
        assert!(expansion.sql.starts_with("SELECT \n  floor(ts/3600)*3600 AS time,"));
        assert_eq!(expansion.fill_mode, FillMode::Null);
    }

    #[test]
    fn test_starter_raw_sql_expands() {
        let query: Query = serde_json::from_value(json!({"refId": "A"})).unwrap();
        assert!(query.raw_query);

        let sql = expand_macros(&query.render_sql(), &range()).unwrap().sql;
        assert!(sql.contains("end_time AS time"));
        assert!(sql.contains("end_time BETWEEN '2021-01-01T12:00:00Z' AND '2021-01-25T12:00:00Z'"));
        assert!(!sql.contains("$__"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            expand_macros("select $__test(test_group)", &range()).unwrap_err(),
            MacroError::Undefined("__test".into())
        );
        assert_eq!(
            expand_macros("select $__timeGroup(test_time), avg(x)", &range())
                .unwrap_err()
                .to_string(),
            "macro $__timeGroup expects a time column, an interval and an optional fill"
        );
    }
}
