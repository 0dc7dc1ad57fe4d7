//! # Schema
//!
//! Top-level container of documents. A schema always holds its default
//! document, created at construction; documents are never removed.
//!
//! Document labels are children of the schema label:
//!
//! ```text
//! (sch:[default])/(doc:[default])
//! (sch:[default])/(doc:[unit_types])
//! ```

use crate::primitives::{DEFAULT_DOCUMENT_KEY, DEFAULT_SCHEMA_KEY, DOCUMENT_SCOPE, SCHEMA_SCOPE};
use crate::{Document, Identifiable, Key, Label, Relation, SchemeError};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// Build a schema label with the given keys.
#[must_use]
pub fn build_schema_label<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Label {
    Label::build(SCHEMA_SCOPE, keys)
}

/// A collection of documents sharing one payload type.
#[derive(Debug, Clone)]
pub struct Schema<T> {
    label: Arc<Label>,
    documents: BTreeMap<Key, Document<T>>,
    /// Schema-level edges. Documents keep their own relations.
    relations: BTreeMap<Key, Relation<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> Schema<T> {
    /// Create a schema under `label` (default `(sch:[default])`) holding its
    /// default document.
    #[must_use]
    pub fn new(label: Option<Label>) -> Self {
        let label = label.unwrap_or_else(|| build_schema_label([DEFAULT_SCHEMA_KEY]));
        let mut schema = Self {
            label: Arc::new(label),
            documents: BTreeMap::new(),
            relations: BTreeMap::new(),
        };
        tracing::debug!(label = %schema.label, "schema created");
        schema.add_new_document();
        schema
    }

    #[must_use]
    pub fn label(&self) -> &Arc<Label> {
        &self.label
    }

    // =========================================================================
    // DOCUMENT CONSTRUCTION
    // =========================================================================

    /// Label of a document with the given keys under this schema.
    #[must_use]
    pub fn build_document_label<K: Into<Key>>(&self, keys: impl IntoIterator<Item = K>) -> Label {
        self.label.append(DOCUMENT_SCOPE, keys)
    }

    /// Build the default document without inserting it.
    #[must_use]
    pub fn new_document(&self) -> Document<T> {
        self.new_document_with_keys([DEFAULT_DOCUMENT_KEY])
    }

    /// Build a document with the given keys. The first key becomes the scope
    /// of every node added to it.
    #[must_use]
    pub fn new_document_with_keys<K: Into<Key>>(&self, keys: impl IntoIterator<Item = K>) -> Document<T> {
        Document::new(self.build_document_label(keys))
    }

    /// Build a document keyed by the scope name of `R`.
    #[must_use]
    pub fn new_document_with_type<R: Identifiable>(&self) -> Document<T> {
        self.new_document_with_keys([R::scope_name()])
    }

    /// Build a document under `label`, or the default document if `None`.
    #[must_use]
    pub fn new_document_with_label(&self, label: Option<Label>) -> Document<T> {
        match label {
            Some(label) => Document::new(label),
            None => self.new_document(),
        }
    }

    /// Insert `doc`, or return the document already stored under its key.
    pub fn add_document(&mut self, doc: Document<T>) -> &mut Document<T> {
        match self.documents.entry(doc.key().clone()) {
            Entry::Occupied(existing) => existing.into_mut(),
            Entry::Vacant(slot) => {
                tracing::debug!(key = %slot.key(), "document created");
                slot.insert(doc)
            }
        }
    }

    pub fn add_new_document(&mut self) -> &mut Document<T> {
        let doc = self.new_document();
        self.add_document(doc)
    }

    pub fn add_new_document_with_keys<K: Into<Key>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> &mut Document<T> {
        let doc = self.new_document_with_keys(keys);
        self.add_document(doc)
    }

    pub fn add_new_document_with_type<R: Identifiable>(&mut self) -> &mut Document<T> {
        let doc = self.new_document_with_type::<R>();
        self.add_document(doc)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// The default document.
    #[must_use]
    pub fn document(&self) -> Option<&Document<T>> {
        self.document_by_label(&self.build_document_label([DEFAULT_DOCUMENT_KEY]))
    }

    pub fn document_mut(&mut self) -> Option<&mut Document<T>> {
        let label = self.build_document_label([DEFAULT_DOCUMENT_KEY]);
        self.document_by_label_mut(&label)
    }

    /// The document keyed by the scope name of `R`.
    #[must_use]
    pub fn document_by_type<R: Identifiable>(&self) -> Option<&Document<T>> {
        self.document_by_label(&self.build_document_label([R::scope_name()]))
    }

    pub fn document_by_type_mut<R: Identifiable>(&mut self) -> Option<&mut Document<T>> {
        let label = self.build_document_label([R::scope_name()]);
        self.document_by_label_mut(&label)
    }

    #[must_use]
    pub fn document_by_label(&self, label: &Label) -> Option<&Document<T>> {
        self.documents.get(label.key())
    }

    pub fn document_by_label_mut(&mut self, label: &Label) -> Option<&mut Document<T>> {
        self.documents.get_mut(label.key())
    }

    #[must_use]
    pub fn document_by_key(&self, key: &Key) -> Option<&Document<T>> {
        self.documents.get(key)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document<T>> {
        self.documents.values()
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation<T>> {
        self.relations.values()
    }

    // =========================================================================
    // PARSING
    // =========================================================================

    /// Parse a label key, binding the parsed parent to the live label of a
    /// matching document (or this schema) when one exists.
    ///
    /// # Errors
    ///
    /// `SchemeError::LabelParse` if the text holds no well-formed group.
    pub fn parse_label(&self, text: &str) -> Result<Label, SchemeError> {
        Label::parse_with(text, |parsed| {
            if parsed.segment() == self.label.segment() {
                return Some(Arc::clone(&self.label));
            }
            let candidate = self
                .label
                .append(parsed.scope().to_string(), parsed.keys().iter().cloned());
            let doc = self.documents.get(candidate.key())?;
            tracing::trace!(parent = %doc.key(), "parsed parent bound to live document");
            Some(Arc::clone(doc.label()))
        })
    }
}

impl<T: Serialize> Serialize for Schema<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Schema", 3)?;
        state.serialize_field("label", self.label.as_ref())?;
        state.serialize_field("documents", &self.documents)?;
        state.serialize_field("relations", &self.relations)?;
        state.end()
    }
}

// =============================================================================
// TESTS
// =============================================================================
