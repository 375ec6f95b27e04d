//! # sqlpanel
//!
//! Query model compiler for a dashboard SQL datasource.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Persisted panel query (JSON document)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model::normalize]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Query (typed parts, value columns, editor mode)       │
//! │   edited in place by model::edit                        │
//! └─────────────────────────────────────────────────────────┘
//!             │                                │
//!             ▼ [compile]                      ▼ [metadata]
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │  SQL with $__ macros      │   │  catalog SQL for pickers  │
//! └───────────────────────────┘   └───────────────────────────┘
//!             │
//!             ▼ [interpolate]    template variables
//!             ▼ [macros]         time range, on the backend
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SQL sent to the database                │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod interpolate;
pub mod macros;
pub mod metadata;
pub mod model;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::QueryBuilder;
    pub use crate::config::{EditorDefaults, Settings};
    pub use crate::interpolate::{
        interpolate_query_str, interpolate_variable, Renderer, ScopedVars, TemplateSrv,
        TemplateVariable, TemplateVariables, VariableValue,
    };
    pub use crate::macros::{expand_macros, Expansion, FillMode, TimeRange};
    pub use crate::metadata::{ColumnCategory, MetaQuery, MetadataSource, PickerOptions};
    pub use crate::model::{
        normalize, EditorMode, PartSlot, Query, QueryDocument, QueryPart, ResultFormat,
        SelectColumn,
    };
    pub use crate::sql::quote::{escape_literal, quote_identifier, quote_literal};
}

pub use compile::QueryBuilder;
pub use model::{Query, QueryPart, SelectColumn};
