//! # Relation
//!
//! Directed edge between two nodes of the same document.
//!
//! The relation label is scoped under the document and carries the ordered
//! pair of endpoint keys, joined by `-/`, as its single key component:
//!
//! ```text
//! (doc:[default])/(rel:[(doc:[default])/(nod:[1])-/(doc:[default])/(nod:[2])])
//! ```
//!
//! Identity is order-sensitive: `(A, B)` and `(B, A)` are different edges.

use crate::primitives::{REL_SEPARATOR, RELATION_SCOPE};
use crate::{Key, Label, Node};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

/// An edge between two nodes. Endpoints are shared with the owning document.
#[derive(Debug, Clone)]
pub struct Relation<T> {
    label: Label,
    from: Arc<Node<T>>,
    to: Arc<Node<T>>,
    data: Option<Vec<serde_json::Value>>,
}

impl<T> Relation<T> {
    /// Build a relation under `parent`. An empty `values` list stores no payload.
    #[must_use]
    pub fn new(
        parent: &Arc<Label>,
        from: Arc<Node<T>>,
        to: Arc<Node<T>>,
        values: Vec<serde_json::Value>,
    ) -> Self {
        let label = relation_label(parent, from.label(), to.label());
        let data = (!values.is_empty()).then_some(values);
        Self {
            label,
            from,
            to,
            data,
        }
    }

    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn key(&self) -> &Key {
        self.label.key()
    }

    #[must_use]
    pub fn from(&self) -> &Arc<Node<T>> {
        &self.from
    }

    #[must_use]
    pub fn to(&self) -> &Arc<Node<T>> {
        &self.to
    }

    /// Values stored when the relation was first created.
    #[must_use]
    pub fn data(&self) -> Option<&[serde_json::Value]> {
        self.data.as_deref()
    }
}

/// Label of the edge `from -> to` scoped under `parent`.
#[must_use]
pub fn relation_label(parent: &Arc<Label>, from: &Label, to: &Label) -> Label {
    let joined = format!("{}{}{}", from.key(), REL_SEPARATOR, to.key());
    parent.append(RELATION_SCOPE, [joined])
}

impl<T> Serialize for Relation<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.data.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Relation", len)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("from", self.from.key())?;
        state.serialize_field("to", self.to.key())?;
        if let Some(data) = &self.data {
            state.serialize_field("data", data)?;
        }
        state.end()
    }
}
