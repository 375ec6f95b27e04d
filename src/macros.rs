//! Expansion of `$__` time macros in raw SQL.
//!
//! The editor leaves macros such as `$__timeFilter(col)` in the SQL it
//! produces. Before the statement reaches the database they are replaced
//! with plain SQL for the dashboard time range:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use sqlpanel::macros::{expand_macros, TimeRange};
//!
//! let range = TimeRange::new(
//!     Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2021, 1, 25, 12, 0, 0).unwrap(),
//! );
//! let expanded = expand_macros("WHERE $__unixEpochFilter(ts)", &range).unwrap();
//! assert_eq!(expanded.sql, "WHERE ts >= 1609502400 AND ts <= 1611576000");
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use thiserror::Error;

static MACRO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(__[_a-zA-Z0-9]+)").unwrap());

static INTERVAL_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h|d|w|y)").unwrap());

/// Errors raised while expanding macros.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("undefined macro: ${0}")]
    Undefined(String),

    #[error("macro ${name} expects {expected}")]
    Arity { name: String, expected: &'static str },

    #[error("invalid interval '{0}'")]
    InvalidInterval(String),

    #[error("unbalanced parentheses in arguments of macro ${0}")]
    Unbalanced(String),
}

pub type MacroResult<T> = Result<T, MacroError>;

/// Dashboard time range the macros are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }
}

/// How gaps between time buckets are filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillMode {
    #[default]
    Null,
    Previous,
    /// Gaps become zero.
    Value,
}

/// Expanded SQL plus the fill mode chosen by a `$__timeGroup` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub sql: String,
    pub fill_mode: FillMode,
}

/// Replace every `$__name(...)` macro in `sql`.
pub fn expand_macros(sql: &str, range: &TimeRange) -> MacroResult<Expansion> {
    let mut out = String::with_capacity(sql.len());
    let mut fill_mode = FillMode::default();
    let mut last = 0;

    for caps in MACRO_PATTERN.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // inside the arguments of a macro already consumed
        if whole.start() < last {
            continue;
        }

        let name = &name.as_str()[2..];
        let (args, end) = match read_arguments(sql, whole.end()) {
            Some(Ok((args, end))) => (Some(args), end),
            Some(Err(())) => return Err(MacroError::Unbalanced(format!("__{}", name))),
            None => (None, whole.end()),
        };

        let (replacement, fill) = evaluate(name, args.unwrap_or(""), range)?;
        if let Some(fill) = fill {
            fill_mode = fill;
        }
        tracing::debug!(macro_name = name, replacement = %replacement, "expanded macro");

        out.push_str(&sql[last..whole.start()]);
        out.push_str(&replacement);
        last = end;
    }

    out.push_str(&sql[last..]);
    Ok(Expansion {
        sql: out,
        fill_mode,
    })
}

/// Read a parenthesised argument list starting at `start`.
///
/// Returns the text between the parentheses and the index after the
/// closing one, `None` if no list follows, or an error if it never closes.
fn read_arguments(sql: &str, start: usize) -> Option<Result<(&str, usize), ()>> {
    let rest = &sql[start..];
    if !rest.starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in rest.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(Ok((&rest[1..i], start + i + 1)));
                }
            }
            _ => {}
        }
    }
    Some(Err(()))
}

/// Split on commas outside parentheses and quotes, trimming spaces.
fn split_arguments(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut begin = 0;
    for (i, c) in args.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(args[begin..i].trim());
                begin = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[begin..].trim());
    parts
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn arity(name: &str, expected: &'static str) -> MacroError {
    MacroError::Arity {
        name: format!("__{}", name),
        expected,
    }
}

fn evaluate(
    name: &str,
    args: &str,
    range: &TimeRange,
) -> MacroResult<(String, Option<FillMode>)> {
    let single = args.trim();

    let sql = match name {
        "time" => {
            if single.is_empty() {
                return Err(arity(name, "a time column"));
            }
            format!("{} AS time", single)
        }
        "timeFilter" => {
            if single.is_empty() {
                return Err(arity(name, "a time column"));
            }
            format!(
                "{} BETWEEN '{}' AND '{}'",
                single,
                rfc3339(&range.from),
                rfc3339(&range.to)
            )
        }
        "timeFrom" | "timeTo" => {
            if !single.is_empty() {
                return Err(arity(name, "no arguments"));
            }
            let t = if name == "timeFrom" { &range.from } else { &range.to };
            format!("'{}'", rfc3339(t))
        }
        "unixEpochFilter" => {
            if single.is_empty() {
                return Err(arity(name, "a time column"));
            }
            format!(
                "{} >= {} AND {} <= {}",
                single,
                range.from.timestamp(),
                single,
                range.to.timestamp()
            )
        }
        "expandMultiString" => {
            let values = split_arguments(args);
            if values.is_empty() {
                return Err(arity(name, "at least one value"));
            }
            values
                .iter()
                .map(|v| format!("'{}'", v.trim_matches(|c| matches!(c, '{' | '}' | '\''))))
                .collect::<Vec<_>>()
                .join(",")
        }
        "timeGroup" | "unixEpochGroup" => {
            let parts = split_arguments(args);
            if parts.len() < 2 || parts.len() > 3 {
                return Err(arity(name, "a time column, an interval and an optional fill"));
            }
            let secs = parse_interval(parts[1])?.as_secs_f64();
            let fill = parts.get(2).and_then(|f| parse_fill(f));
            if let Some(fill) = fill {
                tracing::debug!(?fill, "time group fill mode");
            }

            let sql = if name == "timeGroup" {
                format!("floor(extract(epoch from {})/{})*{} as time", parts[0], secs, secs)
            } else {
                format!("floor({}/{})*{} AS time", parts[0], secs, secs)
            };
            return Ok((sql, fill));
        }
        _ => return Err(MacroError::Undefined(format!("__{}", name))),
    };

    Ok((sql, None))
}

fn parse_fill(fill: &str) -> Option<FillMode> {
    match fill.trim_matches('\'') {
        "previous" => Some(FillMode::Previous),
        "NULL" => Some(FillMode::Null),
        "0" => Some(FillMode::Value),
        _ => None,
    }
}

/// Parse a Go style duration (`1m`, `1h30m`, `1.5s`) extended with days,
/// weeks and 365 day years. Surrounding single quotes are ignored.
pub fn parse_interval(interval: &str) -> MacroResult<Duration> {
    let text = interval.trim().trim_matches('\'');
    let invalid = || MacroError::InvalidInterval(interval.to_string());

    if text.is_empty() {
        return Err(invalid());
    }

    let mut rest = text;
    let mut nanos = 0f64;
    while !rest.is_empty() {
        let caps = INTERVAL_TERM.captures(rest).ok_or_else(invalid)?;
        let amount: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 6e10,
            "h" => 3.6e12,
            "d" => 8.64e13,
            "w" => 6.048e14,
            _ => 3.1536e16,
        };
        nanos += amount * unit;
        rest = &rest[caps[0].len()..];
    }

    if nanos < 1.0 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
