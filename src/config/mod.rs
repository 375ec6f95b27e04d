//! Configuration module for sqlpanel.
//!
//! Handles editor defaults and the system catalog used for introspection.

mod settings;

pub use settings::{
    CatalogSettings, EditorDefaults, MovingWindowDefaults, Settings, SettingsError,
};
