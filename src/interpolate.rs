//! Template variable interpolation of rendered SQL.
//!
//! The host owns template variables and the substitution itself; it hands
//! every value to a formatting callback before inserting it. This module
//! provides the two callbacks the plugin uses and a small built-in
//! [`TemplateSrv`] for callers without a host.
//!
//! Quoting depends only on how the variable was declared, never on where it
//! appears in the SQL:
//!
//! | declared as | query editor ([`interpolate_query_str`]) | datasource ([`interpolate_variable`]) |
//! |---|---|---|
//! | single value | escaped, no quotes | as is |
//! | multi / include all | `'a','b'` | `'a','b'` |

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::Query;
use crate::sql::quote::{escape_literal, quote_literal};

/// Matches `$name`, `${name}`, `${name:format}` and `[[name]]`.
static VARIABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\w+)|\$\{(\w+)(?::[^}]*)?\}|\[\[(\w+)\]\]").unwrap()
});

/// Current value of a template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Text(s) => f.write_str(s),
            VariableValue::Number(n) => write!(f, "{}", n),
            VariableValue::List(values) => f.write_str(&values.join(",")),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

impl From<i64> for VariableValue {
    fn from(n: i64) -> Self {
        VariableValue::Number(n.into())
    }
}

impl From<Vec<&str>> for VariableValue {
    fn from(values: Vec<&str>) -> Self {
        VariableValue::List(values.into_iter().map(String::from).collect())
    }
}

/// A dashboard template variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateVariable {
    pub name: String,
    /// Several values may be selected at once.
    pub multi: bool,
    /// An "All" option is offered.
    pub include_all: bool,
    pub current: VariableValue,
}

impl TemplateVariable {
    pub fn single(name: &str, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            multi: false,
            include_all: false,
            current: value.into(),
        }
    }

    pub fn multi(name: &str, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            multi: true,
            include_all: false,
            current: value.into(),
        }
    }

    pub fn with_include_all(mut self) -> Self {
        self.include_all = true;
        self
    }
}

/// Per-request bindings that shadow dashboard variables.
pub type ScopedVars = HashMap<String, VariableValue>;

/// Formats one variable value for insertion into SQL.
pub type FormatFn<'a> = &'a dyn Fn(&VariableValue, &TemplateVariable) -> String;

/// The host's variable substitution.
pub trait TemplateSrv {
    /// Replace every variable reference in `target`, formatting each value
    /// with `format`.
    fn replace(&self, target: &str, scoped_vars: &ScopedVars, format: FormatFn<'_>) -> String;
}

/// Formatter used by the query editor.
///
/// A single-valued variable is only escaped, because it usually sits
/// inside a macro argument or a literal that already has quotes.
/// Multi-valued and include-all variables become a quoted list usable in
/// `IN (...)`.
pub fn interpolate_query_str(value: &VariableValue, variable: &TemplateVariable) -> String {
    if !variable.multi && !variable.include_all {
        return escape_literal(&value.to_string());
    }

    match value {
        VariableValue::Text(s) => quote_literal(s),
        VariableValue::Number(n) => n.to_string(),
        VariableValue::List(values) => quote_list(values),
    }
}

/// Formatter used by the datasource when sending queries to the backend.
///
/// Single-valued strings and numbers pass through untouched.
pub fn interpolate_variable(value: &VariableValue, variable: &TemplateVariable) -> String {
    match value {
        VariableValue::Text(s) if variable.multi || variable.include_all => quote_literal(s),
        VariableValue::Text(s) => s.clone(),
        VariableValue::Number(n) => n.to_string(),
        VariableValue::List(values) => quote_list(values),
    }
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(",")
}

/// In-process variable store implementing [`TemplateSrv`].
///
/// Unknown references are left as they are, which keeps `$__` macros
/// intact for the backend.
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    variables: HashMap<String, TemplateVariable>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: TemplateVariable) -> Self {
        self.insert(variable);
        self
    }

    pub fn insert(&mut self, variable: TemplateVariable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn get(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables.get(name)
    }
}

impl TemplateSrv for TemplateVariables {
    fn replace(&self, target: &str, scoped_vars: &ScopedVars, format: FormatFn<'_>) -> String {
        VARIABLE_PATTERN
            .replace_all(target, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();

                let declared = self.variables.get(name);
                match (scoped_vars.get(name), declared) {
                    (Some(value), Some(variable)) => format(value, variable),
                    (Some(value), None) => {
                        format(value, &TemplateVariable::single(name, value.clone()))
                    }
                    (None, Some(variable)) => format(&variable.current, variable),
                    (None, None) => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Renders queries, optionally substituting template variables.
pub struct Renderer<'a> {
    template_srv: &'a dyn TemplateSrv,
    scoped_vars: ScopedVars,
}

impl<'a> Renderer<'a> {
    pub fn new(template_srv: &'a dyn TemplateSrv) -> Self {
        Self {
            template_srv,
            scoped_vars: ScopedVars::new(),
        }
    }

    pub fn with_scoped_vars(mut self, scoped_vars: ScopedVars) -> Self {
        self.scoped_vars = scoped_vars;
        self
    }

    /// SQL for `query`: the raw text in raw mode, freshly compiled SQL in
    /// structured mode (stored `raw_sql` is never trusted there).
    pub fn render(&self, query: &Query, interpolate: bool) -> String {
        let sql = query.render_sql();
        if interpolate {
            self.template_srv
                .replace(&sql, &self.scoped_vars, &interpolate_query_str)
        } else {
            sql
        }
    }

    /// SQL as sent to the backend, substituted with [`interpolate_variable`].
    ///
    /// Returns `None` for hidden queries, which are left out of the request.
    pub fn render_request(&self, query: &Query) -> Option<String> {
        if !query.is_executable() {
            tracing::debug!(ref_id = ?query.ref_id, "skipping hidden query");
            return None;
        }

        let sql = query.render_sql();
        Some(
            self.template_srv
                .replace(&sql, &self.scoped_vars, &interpolate_variable),
        )
    }
}
