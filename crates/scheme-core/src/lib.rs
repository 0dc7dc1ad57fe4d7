//! # scheme-core
//!
//! Structural identity and graph composition for arbitrary records.
//!
//! Records are given a canonical, hierarchical, textual identity (a
//! [`Label`]), stored as deduplicated [`Node`]s inside scoped
//! [`Document`]s, linked with [`Relation`]s and grouped under a [`Schema`].
//!
//! ```text
//! Schema    (sch:[default])
//! Document  (sch:[default])/(doc:[products])
//! Node      (doc:[products])/(products:[7])
//! Relation  (doc:[products])/(rel:[<from key>-/<to key>])
//! ```
//!
//! ## Constraints
//!
//! - Pure in-memory index: no persistence, no I/O, no async
//! - Node and relation identity is a function of the label key only
//! - No operation panics; fallible operations return `SchemeError`
//! - A `Schema` has a single owner; use [`SharedSchema`] across threads

// =============================================================================
// MODULES
// =============================================================================

pub mod document;
pub mod label;
pub mod node;
pub mod primitives;
pub mod relation;
pub mod schema;
pub mod shared;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use document::Document;
pub use label::Label;
pub use node::Node;
pub use relation::{Relation, relation_label};
pub use schema::{Schema, build_schema_label};
pub use shared::SharedSchema;
pub use types::{Identifiable, Key, SchemeError, default_scope};
