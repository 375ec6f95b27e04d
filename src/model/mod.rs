//! Structured panel query model.
//!
//! - [`part`] - typed query parts and their persisted shape
//! - [`select`] - value columns (one SELECT entry each)
//! - [`query`] - the query itself, normalization and persistence
//! - [`edit`] - editor operations that keep the query consistent
//! - [`defaults`] - sentinels and built-in defaults

pub mod defaults;
pub mod edit;
pub mod part;
pub mod query;
pub mod select;

pub use part::{Param, PartError, PartResult, PartSlot, QueryPart, RawQueryPart};
pub use query::{normalize, EditorMode, Query, QueryDocument, ResultFormat};
pub use select::SelectColumn;
