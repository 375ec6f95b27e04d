#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlpanel::interpolate::{
        interpolate_query_str, interpolate_variable, Renderer, ScopedVars, TemplateSrv,
        TemplateVariable, TemplateVariables, VariableValue,
    };
    use sqlpanel::model::Query;

    /// Host stand-in that substitutes one fixed variable.
    struct FixedSrv {
        variable: TemplateVariable,
    }

    impl TemplateSrv for FixedSrv {
        fn replace(
            &self,
            target: &str,
            _scoped_vars: &ScopedVars,
            format: &dyn Fn(&VariableValue, &TemplateVariable) -> String,
        ) -> String {
            let needle = format!("${}", self.variable.name);
            target.replace(&needle, &format(&self.variable.current, &self.variable))
        }
    }

    fn filtered_query() -> Query {
        serde_json::from_value(json!({
            "schema": "public",
            "table": "cpu",
            "timeColumn": "created",
            "select": [[{"type": "column", "params": ["usage"]}]],
            "where": [
                {"type": "macro", "name": "$__timeFilter", "params": []},
                {"type": "expression", "params": ["host", "IN", "($host)"]}
            ],
            "rawQuery": false
        }))
        .unwrap()
    }

    #[test]
    fn test_custom_template_srv() {
        let srv = FixedSrv {
            variable: TemplateVariable::multi("host", vec!["db1", "db'2"]),
        };
        let sql = Renderer::new(&srv).render(&filtered_query(), true);
        assert!(sql.ends_with("\n  AND\n  host IN ('db1','db''2') \n ORDER BY 1"));
        assert!(sql.contains("$__timeFilter(created)"));
    }

    #[test]
    fn test_render_without_interpolation() {
        let vars = TemplateVariables::new().with(TemplateVariable::multi("host", vec!["db1"]));
        let sql = Renderer::new(&vars).render(&filtered_query(), false);
        assert!(sql.contains("host IN ($host)"));
    }

    #[test]
    fn test_scoped_vars_reach_the_query() {
        let vars = TemplateVariables::new();
        let mut scoped = ScopedVars::new();
        scoped.insert("host".into(), VariableValue::from("db1"));

        let sql = Renderer::new(&vars)
            .with_scoped_vars(scoped)
            .render(&filtered_query(), true);
        assert!(sql.contains("host IN (db1)"));
    }

    #[test]
    fn test_formatter_modes_differ_for_single_values() {
        let var = TemplateVariable::single("region", "o'hare");
        assert_eq!(interpolate_query_str(&var.current, &var), "o''hare");
        assert_eq!(interpolate_variable(&var.current, &var), "o'hare");

        let all = TemplateVariable::multi("region", vec!["eu"]).with_include_all();
        assert_eq!(interpolate_query_str(&all.current, &all), "'eu'");
        assert_eq!(interpolate_variable(&all.current, &all), "'eu'");
    }

    #[test]
    fn test_datasource_formatter_through_srv() {
        let vars = TemplateVariables::new()
            .with(TemplateVariable::single("limit", 10))
            .with(TemplateVariable::single("table", "cpu"));
        let sql = vars.replace(
            "SELECT * FROM $table LIMIT $limit",
            &ScopedVars::new(),
            &interpolate_variable,
        );
        assert_eq!(sql, "SELECT * FROM cpu LIMIT 10");
    }

    #[test]
    fn test_request_sql_for_visible_query() {
        let vars = TemplateVariables::new().with(TemplateVariable::single("host", "db1"));
        let renderer = Renderer::new(&vars);
        let query = filtered_query();

        assert!(query.is_executable());
        let sql = renderer.render_request(&query).unwrap();
        assert!(sql.contains("host IN (db1)"));
        assert!(sql.contains("$__timeFilter(created)"));
    }

    #[test]
    fn test_hidden_query_is_left_out_of_request() {
        let query: Query = serde_json::from_value(json!({
            "refId": "B",
            "rawQuery": true,
            "rawSql": "SELECT $host",
            "hide": true
        }))
        .unwrap();
        let vars = TemplateVariables::new().with(TemplateVariable::single("host", "db1"));

        assert!(!query.is_executable());
        assert_eq!(Renderer::new(&vars).render_request(&query), None);
    }
}
