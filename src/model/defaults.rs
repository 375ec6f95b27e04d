//! Sentinels and built-in defaults for panel queries.

/// Schema placeholder meaning "not chosen yet".
pub const SCHEMA_SENTINEL: &str = "select schema";

/// Table placeholder meaning "not chosen yet".
pub const TABLE_SENTINEL: &str = "select table";

/// Metric column value meaning "no metric column".
pub const NO_METRIC_COLUMN: &str = "none";

pub const DEFAULT_TIME_COLUMN: &str = "time";

pub const DEFAULT_TIME_COLUMN_TYPE: &str = "timestamp";

pub const DEFAULT_VALUE_COLUMN: &str = "value";

/// Starter text for a raw query with no SQL yet.
pub const DEFAULT_RAW_SQL: &str = "SELECT \n  $__time(end_time), \n  average_cpu_usage_percent \n  FROM \n  v_monitor.cpu_usage \n  WHERE \n  $__timeFilter(end_time)";

/// Time column types holding seconds since the epoch rather than timestamps.
pub const UNIX_EPOCH_TIME_TYPES: &[&str] = &["int4", "int8", "float4", "float8", "numeric"];
