#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;
    use sqlpanel::model::{Query, QueryPart, SelectColumn};

    fn query_from(doc: serde_json::Value) -> Query {
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn test_basic_query() {
        let query = query_from(json!({
            "refId": "A",
            "schema": "public",
            "table": "intest",
            "timeColumn": "time",
            "metricColumn": "none",
            "select": [[{"type": "column", "params": ["value"]}]],
            "rawQuery": false
        }));

        assert_eq!(
            query.build_query(),
            "SELECT \n  time AS \"time\",\n  value \n FROM public.intest \n ORDER BY 1"
        );
        assert_eq!(query.raw_sql, query.build_query());
    }

    #[test]
    fn test_placeholder_table_keeps_raw_sql() {
        let query = query_from(json!({
            "schema": "schema2",
            "table": "select table",
            "rawQuery": false,
            "rawSql": "SELECT 1 AS previous"
        }));

        assert_eq!(query.build_query(), "SELECT 1 AS previous");
        assert_eq!(query.render_sql(), "SELECT 1 AS previous");
    }

    #[test]
    fn test_delta_window_with_metric() {
        let query = query_from(json!({
            "schema": "public",
            "table": "logins",
            "timeColumn": "time",
            "metricColumn": "user_name",
            "select": [[
                {"type": "column", "params": ["user_key"]},
                {"type": "aggregate", "params": ["count"]},
                {"type": "window", "params": ["delta"]}
            ]],
            "rawQuery": false
        }));

        let sql = query.build_query();
        assert!(sql.contains(
            "lag(count(user_key)) OVER (PARTITION BY user_name ORDER BY time)"
        ));
        assert_eq!(
            sql,
            "SELECT \n  time AS \"time\", \n  user_name AS metric,\n  \
             count(user_key) - lag(count(user_key)) OVER (PARTITION BY user_name ORDER BY time) AS \"delta\" \
             \n FROM public.logins \n ORDER BY 1,2"
        );
    }

    #[test]
    fn test_time_filter_macro() {
        let query = query_from(json!({
            "schema": "public",
            "table": "intest",
            "timeColumn": "created_at",
            "select": [[{"type": "column", "params": ["value"]}]],
            "where": [{"type": "macro", "name": "$__timeFilter", "params": []}],
            "rawQuery": false
        }));

        assert!(query
            .build_query()
            .contains("\nWHERE\n  $__timeFilter(created_at)"));
    }

    #[test]
    fn test_grouped_query_with_filters() {
        let query = Query::structured("public", "cpu")
            .with_time_column("created_at")
            .with_metric_column("host")
            .with_select(vec![SelectColumn::new("usage")
                .with_part(QueryPart::aggregate("avg"))
                .unwrap()])
            .with_where(vec![
                QueryPart::macro_call("$__timeFilter"),
                QueryPart::expression("region", "=", "'eu'"),
            ])
            .with_group(vec![QueryPart::time("$__interval", Some("NULL"))]);

        assert_eq!(
            query.build_query(),
            "SELECT \n  $__timeGroup(created_at,$__interval,NULL), \n  host AS metric,\n  avg(usage) \
             \n FROM public.cpu\nWHERE\n  $__timeFilter(created_at)\n  AND\n  region = 'eu'\
             \nGROUP BY 1,2 \n ORDER BY 1,2"
        );
    }

    #[test]
    fn test_recompiling_is_stable() {
        let query = query_from(json!({
            "schema": "public",
            "table": "intest",
            "timeColumn": "started",
            "metricColumn": "host",
            "select": [
                [{"type": "column", "params": ["bytes"]}, {"type": "aggregate", "params": ["sum"]}, {"type": "alias", "params": ["total"]}],
                [{"type": "column", "params": ["errors"]}, {"type": "moving_window", "params": ["avg", 5]}]
            ],
            "where": [{"type": "expression", "params": ["host", "<>", "'test'"]}],
            "group": [{"type": "column", "params": ["host"]}],
            "rawQuery": false
        }));

        let first = query.build_query();
        let persisted = serde_json::to_value(&query).unwrap();
        let reloaded: Query = serde_json::from_value(persisted).unwrap();
        assert_eq!(reloaded.build_query(), first);
        assert_eq!(reloaded, query);
    }

    #[test]
    fn test_compiled_sql_parses() {
        let query = Query::structured("public", "requests")
            .with_time_column("started")
            .with_select(vec![
                SelectColumn::new("latency")
                    .with_part(QueryPart::aggregate("max"))
                    .unwrap()
                    .with_part(QueryPart::alias("peak"))
                    .unwrap(),
                SelectColumn::new("bytes")
                    .with_part(QueryPart::aggregate("sum"))
                    .unwrap()
                    .with_part(QueryPart::window("rate"))
                    .unwrap(),
            ])
            .with_where(vec![QueryPart::expression("status", ">=", "500")])
            .with_group(vec![QueryPart::column("started")]);

        let sql = query.build_query();
        Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
    }
}
