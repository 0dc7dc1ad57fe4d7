//! # Reserved Names
//!
//! Fixed separators and scope names used by the canonical label format.
//!
//! A label renders as `(scope:[k1;k2])`. A label with a parent renders as
//! `(parent-scope:[..])/(scope:[..])`. A relation label carries both endpoint
//! keys joined by [`REL_SEPARATOR`] as its single key component.

/// Separator between key components inside one group.
pub const KEY_SEPARATOR: &str = ";";

/// Separator between a parent group and a child group.
pub const SCOPE_SEPARATOR: &str = "/";

/// Separator between the two endpoint keys of a relation label.
pub const REL_SEPARATOR: &str = "-/";

/// Scope of a schema label.
pub const SCHEMA_SCOPE: &str = "sch";

/// Scope of a document label.
pub const DOCUMENT_SCOPE: &str = "doc";

/// Scope of a node label when no record scope applies.
pub const NODE_SCOPE: &str = "nod";

/// Scope of a relation label.
pub const RELATION_SCOPE: &str = "rel";

/// Key of the default schema.
pub const DEFAULT_SCHEMA_KEY: &str = "default";

/// Key of the default document every schema starts with.
pub const DEFAULT_DOCUMENT_KEY: &str = "default";
