//! Query parts - the typed fragments a panel query is assembled from.
//!
//! The host persists each part as `{ "type", "name", "params" }` where the
//! meaning of a param depends on its position. [`RawQueryPart`] is that wire
//! shape; [`QueryPart`] is the closed union the compiler works with, one
//! variant per part type and named fields instead of positions.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Errors
// =============================================================================

/// A part (or a collection of parts) that does not have a valid shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartError {
    #[error("unknown query part type: {0}")]
    UnknownType(String),

    #[error("query part `{part_type}` is missing its `{param}` parameter")]
    MissingParam {
        part_type: &'static str,
        param: &'static str,
    },

    #[error("query part `{part_type}` is not allowed in {section}")]
    Misplaced {
        part_type: &'static str,
        section: &'static str,
    },

    #[error("a value column must contain exactly one column part, found {0}")]
    ColumnCount(usize),

    #[error("a value column already has a {0} part")]
    DuplicateSlot(PartSlot),

    #[error("the column part of a value column cannot be removed")]
    ColumnRemoval,

    #[error("no value column at index {0}")]
    NoSuchColumn(usize),
}

pub type PartResult<T> = Result<T, PartError>;

// =============================================================================
// Params
// =============================================================================

/// A positional parameter as persisted: either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Number(n) => write!(f, "{}", n),
            Param::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Number(n.into())
    }
}

/// A part exactly as the host stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueryPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl RawQueryPart {
    pub fn new(part_type: &str, name: Option<&str>, params: Vec<Param>) -> Self {
        Self {
            part_type: part_type.into(),
            name: name.map(Into::into),
            params,
        }
    }
}

// =============================================================================
// Typed parts
// =============================================================================

/// Slot a part occupies inside a value column or a clause.
///
/// `aggregate` and `percentile` share a slot, as do `window` and
/// `moving_window`: a value column holds at most one of each pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartSlot {
    Column,
    Aggregate,
    Window,
    Alias,
    Time,
    Macro,
    Expression,
}

impl fmt::Display for PartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartSlot::Column => "column",
            PartSlot::Aggregate => "aggregate",
            PartSlot::Window => "window",
            PartSlot::Alias => "alias",
            PartSlot::Time => "time",
            PartSlot::Macro => "macro",
            PartSlot::Expression => "expression",
        })
    }
}

/// A typed unit of query structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryPart", into = "RawQueryPart")]
pub enum QueryPart {
    /// A source column, by name.
    Column { name: String },
    /// Plain aggregate such as `avg`, `count`, or `first`/`last`.
    Aggregate { func: String },
    /// Ordered-set aggregate: `func(fraction) WITHIN GROUP (ORDER BY col)`.
    Percentile { func: String, fraction: Param },
    /// Output alias for a value column.
    Alias { name: String },
    /// Window function: `delta`, `increase`, `rate` or any window aggregate.
    Window { func: String },
    /// Window aggregate over the last `rows` rows.
    MovingWindow { func: String, rows: Param },
    /// Time bucketing for GROUP BY.
    Time {
        interval: String,
        fill: Option<String>,
    },
    /// Filter macro applied to the time column, e.g. `$__timeFilter`.
    Macro { name: String },
    /// Free-form `left op right` predicate.
    Expression {
        left: String,
        op: String,
        right: String,
    },
}

impl QueryPart {
    pub fn column(name: &str) -> Self {
        QueryPart::Column { name: name.into() }
    }

    pub fn aggregate(func: &str) -> Self {
        QueryPart::Aggregate { func: func.into() }
    }

    pub fn percentile(func: &str, fraction: impl Into<Param>) -> Self {
        QueryPart::Percentile {
            func: func.into(),
            fraction: fraction.into(),
        }
    }

    pub fn alias(name: &str) -> Self {
        QueryPart::Alias { name: name.into() }
    }

    pub fn window(func: &str) -> Self {
        QueryPart::Window { func: func.into() }
    }

    pub fn moving_window(func: &str, rows: impl Into<Param>) -> Self {
        QueryPart::MovingWindow {
            func: func.into(),
            rows: rows.into(),
        }
    }

    pub fn time(interval: &str, fill: Option<&str>) -> Self {
        QueryPart::Time {
            interval: interval.into(),
            fill: fill.map(Into::into),
        }
    }

    pub fn macro_call(name: &str) -> Self {
        QueryPart::Macro { name: name.into() }
    }

    pub fn expression(left: &str, op: &str, right: &str) -> Self {
        QueryPart::Expression {
            left: left.into(),
            op: op.into(),
            right: right.into(),
        }
    }

    /// The persisted `type` discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryPart::Column { .. } => "column",
            QueryPart::Aggregate { .. } => "aggregate",
            QueryPart::Percentile { .. } => "percentile",
            QueryPart::Alias { .. } => "alias",
            QueryPart::Window { .. } => "window",
            QueryPart::MovingWindow { .. } => "moving_window",
            QueryPart::Time { .. } => "time",
            QueryPart::Macro { .. } => "macro",
            QueryPart::Expression { .. } => "expression",
        }
    }

    /// Display label shown by the editor. Not used when compiling, except
    /// for macros whose label is the macro name.
    pub fn label(&self) -> &str {
        match self {
            QueryPart::Column { .. } => "Column",
            QueryPart::Aggregate { .. } => "Aggregate",
            QueryPart::Percentile { .. } => "Percentile",
            QueryPart::Alias { .. } => "Alias",
            QueryPart::Window { .. } => "Window",
            QueryPart::MovingWindow { .. } => "Moving Window",
            QueryPart::Time { .. } => "time",
            QueryPart::Macro { name } => name,
            QueryPart::Expression { .. } => "Expression",
        }
    }

    pub fn slot(&self) -> PartSlot {
        match self {
            QueryPart::Column { .. } => PartSlot::Column,
            QueryPart::Aggregate { .. } | QueryPart::Percentile { .. } => PartSlot::Aggregate,
            QueryPart::Window { .. } | QueryPart::MovingWindow { .. } => PartSlot::Window,
            QueryPart::Alias { .. } => PartSlot::Alias,
            QueryPart::Time { .. } => PartSlot::Time,
            QueryPart::Macro { .. } => PartSlot::Macro,
            QueryPart::Expression { .. } => PartSlot::Expression,
        }
    }

    /// Positional params in persisted order.
    pub fn params(&self) -> Vec<Param> {
        match self {
            QueryPart::Column { name } | QueryPart::Alias { name } => vec![name.as_str().into()],
            QueryPart::Aggregate { func } | QueryPart::Window { func } => {
                vec![func.as_str().into()]
            }
            QueryPart::Percentile { func, fraction } => {
                vec![func.as_str().into(), fraction.clone()]
            }
            QueryPart::MovingWindow { func, rows } => vec![func.as_str().into(), rows.clone()],
            QueryPart::Time { interval, fill } => {
                let mut params = vec![Param::from(interval.as_str())];
                if let Some(fill) = fill {
                    params.push(fill.as_str().into());
                }
                params
            }
            QueryPart::Macro { .. } => Vec::new(),
            QueryPart::Expression { left, op, right } => vec![
                left.as_str().into(),
                op.as_str().into(),
                right.as_str().into(),
            ],
        }
    }
}

fn required(
    params: &[Param],
    index: usize,
    part_type: &'static str,
    param: &'static str,
) -> PartResult<String> {
    params
        .get(index)
        .map(ToString::to_string)
        .ok_or(PartError::MissingParam { part_type, param })
}

fn required_param(
    params: &[Param],
    index: usize,
    part_type: &'static str,
    param: &'static str,
) -> PartResult<Param> {
    params
        .get(index)
        .cloned()
        .ok_or(PartError::MissingParam { part_type, param })
}

impl TryFrom<RawQueryPart> for QueryPart {
    type Error = PartError;

    fn try_from(raw: RawQueryPart) -> PartResult<Self> {
        let p = raw.params.as_slice();
        let part = match raw.part_type.as_str() {
            "column" => QueryPart::Column {
                name: required(p, 0, "column", "name")?,
            },
            "aggregate" => QueryPart::Aggregate {
                func: required(p, 0, "aggregate", "function")?,
            },
            "percentile" => QueryPart::Percentile {
                func: required(p, 0, "percentile", "function")?,
                fraction: required_param(p, 1, "percentile", "fraction")?,
            },
            "alias" => QueryPart::Alias {
                name: required(p, 0, "alias", "name")?,
            },
            "window" => QueryPart::Window {
                func: required(p, 0, "window", "function")?,
            },
            "moving_window" => QueryPart::MovingWindow {
                func: required(p, 0, "moving_window", "function")?,
                rows: required_param(p, 1, "moving_window", "rows")?,
            },
            "time" => QueryPart::Time {
                interval: required(p, 0, "time", "interval")?,
                fill: p.get(1).map(ToString::to_string),
            },
            "macro" => QueryPart::Macro {
                name: raw
                    .name
                    .filter(|n| !n.is_empty())
                    .ok_or(PartError::MissingParam {
                        part_type: "macro",
                        param: "name",
                    })?,
            },
            "expression" => QueryPart::Expression {
                left: required(p, 0, "expression", "left operand")?,
                op: required(p, 1, "expression", "operator")?,
                right: required(p, 2, "expression", "right operand")?,
            },
            other => return Err(PartError::UnknownType(other.to_string())),
        };
        Ok(part)
    }
}

impl From<QueryPart> for RawQueryPart {
    fn from(part: QueryPart) -> Self {
        RawQueryPart {
            part_type: part.type_name().to_string(),
            name: Some(part.label().to_string()),
            params: part.params(),
        }
    }
}
