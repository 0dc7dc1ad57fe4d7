//! # Scheme App Library
//!
//! Configuration and record loading shared by the `scheme` binary and its
//! tests.

pub mod config;
pub mod records;

pub use config::{AppConfig, LogFormat, RelationConfig, ScopeConfig};
pub use records::{JsonRecord, LoadSummary, load_schema};
