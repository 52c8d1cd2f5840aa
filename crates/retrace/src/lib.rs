//! retrace library
//!
//! This module exports the configuration, document store and Markdown
//! rendering used by the `retrace` binary, for use in integration tests and
//! as a library.

pub mod config;
pub mod migrations;
pub mod render;
pub mod store;

pub use config::{Command, Config, ConfigError, DiffModeArg, SessionSource};
pub use render::{MarkdownRenderer, PathFormatter, format_duration, render_summary};
pub use store::{DocumentStore, JsonFileSource, SessionStore, StoreError, Table};
