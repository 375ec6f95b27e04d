//! TOML-based configuration for sqlpanel.
//!
//! Example configuration:
//! ```toml
//! [editor]
//! time_column = "ts"
//! metric_column = "none"
//! value_column = "value"
//! format = "time_series"
//! raw_query = false
//! time_group_interval = "$__interval"
//! time_group_fill = "none"
//!
//! [editor.moving_window]
//! function = "avg"
//! rows = 5
//!
//! [catalog]
//! tables_view = "v_catalog.tables"
//! columns_view = "v_catalog.columns"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::defaults::{
    DEFAULT_RAW_SQL, DEFAULT_TIME_COLUMN, DEFAULT_TIME_COLUMN_TYPE, DEFAULT_VALUE_COLUMN,
    NO_METRIC_COLUMN,
};
use crate::model::ResultFormat;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults applied when normalizing queries and adding parts.
    pub editor: EditorDefaults,

    /// System catalog used by metadata queries.
    pub catalog: CatalogSettings,
}

/// Defaults for new or partially persisted queries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Time column used when none is stored.
    pub time_column: String,

    /// Type of the time column when none is stored.
    pub time_column_type: String,

    /// Metric column; "none" disables it.
    pub metric_column: String,

    /// Column of the initial SELECT entry and of new entries.
    pub value_column: String,

    /// Result shape.
    pub format: ResultFormat,

    /// Whether queries without a stored mode open in the raw editor.
    pub raw_query: bool,

    /// SQL shown for a raw query that has no text yet.
    pub raw_sql: String,

    /// Interval of a new time group.
    pub time_group_interval: String,

    /// Fill value of a new time group.
    pub time_group_fill: String,

    /// Defaults for a new moving window part.
    pub moving_window: MovingWindowDefaults,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            time_column_type: DEFAULT_TIME_COLUMN_TYPE.to_string(),
            metric_column: NO_METRIC_COLUMN.to_string(),
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            format: ResultFormat::TimeSeries,
            // queries saved before the builder existed only have raw SQL
            raw_query: true,
            raw_sql: DEFAULT_RAW_SQL.to_string(),
            time_group_interval: "$__interval".to_string(),
            time_group_fill: "none".to_string(),
            moving_window: MovingWindowDefaults::default(),
        }
    }
}

/// Moving window defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MovingWindowDefaults {
    /// Window aggregate.
    pub function: String,

    /// Number of preceding rows.
    pub rows: u32,
}

impl Default for MovingWindowDefaults {
    fn default() -> Self {
        Self {
            function: "avg".to_string(),
            rows: 5,
        }
    }
}

/// System catalog views queried for schemas, tables and columns.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// View listing tables (`table_schema`, `table_name`).
    pub tables_view: String,

    /// View listing columns (`table_schema`, `table_name`, `column_name`, `data_type`).
    pub columns_view: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            tables_view: "tables".to_string(),
            columns_view: "columns".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SQLPANEL_CONFIG`
    /// 2. `./sqlpanel.toml`
    /// 3. `~/.config/sqlpanel/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SQLPANEL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sqlpanel.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sqlpanel").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject settings that would produce broken SQL.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let required = [
            ("editor.time_column", &self.editor.time_column),
            ("editor.metric_column", &self.editor.metric_column),
            ("editor.value_column", &self.editor.value_column),
            ("editor.time_group_interval", &self.editor.time_group_interval),
            ("editor.moving_window.function", &self.editor.moving_window.function),
            ("catalog.tables_view", &self.catalog.tables_view),
            ("catalog.columns_view", &self.catalog.columns_view),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!("{} must not be empty", key)));
            }
        }
        if self.editor.moving_window.rows == 0 {
            return Err(SettingsError::InvalidConfig(
                "editor.moving_window.rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
