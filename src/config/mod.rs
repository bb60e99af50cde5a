//! Configuration module for Trellis.
//!
//! Compiler settings are plain values with sensible defaults; a
//! `trellis.toml` can override them.

mod settings;

pub use settings::{CompilerSettings, SettingsError};
