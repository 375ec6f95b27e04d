//! Catalog introspection for the editor pickers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  MetaQuery (sync, pure)                      │
//! │  - build_schema_query()                      │
//! │  - build_table_query()                       │
//! │  - build_column_query(category)              │
//! └──────────────────────────────────────────────┘
//!                      │ SQL text
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │  MetadataSource (async, host supplied)       │
//! │  - execute_metadata_query(sql)               │
//! └──────────────────────────────────────────────┘
//!                      │ MetricFindValue rows
//!                      ▼
//!              PickerOptions (label, value)
//! ```

mod meta_query;
mod provider;
mod types;

pub use meta_query::{ColumnCategory, MetaQuery};
pub use provider::{MetadataError, MetadataResult, MetadataSource, PickerOption, PickerOptions};
pub use types::{FrameField, MetricFindValue, ResultFrame};
