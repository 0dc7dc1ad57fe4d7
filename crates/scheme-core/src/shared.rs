//! # Shared Schema
//!
//! Cloneable handle for using one schema from several threads.
//!
//! Dedup-on-insert is a check-then-act sequence. Every mutation through this
//! handle runs under the write lock, so two threads adding the same record
//! observe a single node.

use crate::{Identifiable, Label, Node, Schema, SchemeError};
use std::sync::{Arc, RwLock};

/// Thread-safe, reference-counted schema handle.
#[derive(Debug)]
pub struct SharedSchema<T> {
    inner: Arc<RwLock<Schema<T>>>,
}

impl<T> Clone for SharedSchema<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedSchema<T> {
    fn default() -> Self {
        Self::new(Schema::default())
    }
}

impl<T> SharedSchema<T> {
    #[must_use]
    pub fn new(schema: Schema<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(schema)),
        }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Schema<T>) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Schema<T>) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Parse a label against the current documents.
    pub fn parse_label(&self, text: &str) -> Result<Label, SchemeError> {
        self.read(|schema| schema.parse_label(text))
    }
}

impl<T: Identifiable> SharedSchema<T> {
    /// Resolve or create the node for `value` in the default document.
    pub fn add_node(&self, value: T) -> Result<Arc<Node<T>>, SchemeError> {
        self.write(|schema| schema.add_new_document().add_node(value))
    }

    /// Resolve or create the node for `value` in the document keyed by the
    /// scope name of `R`, creating that document if needed.
    pub fn add_typed_node<R: Identifiable>(&self, value: T) -> Result<Arc<Node<T>>, SchemeError> {
        self.write(|schema| schema.add_new_document_with_type::<R>().add_node(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;
    use std::thread;

    #[derive(Debug, Clone)]
    struct Order {
        id: u64,
    }

    impl Identifiable for Order {
        fn primary_key_values(&self) -> Vec<Key> {
            vec![Key::from(self.id)]
        }
    }

    #[test]
    fn concurrent_adds_of_same_record_yield_one_node() {
        let shared: SharedSchema<Order> = SharedSchema::default();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.add_typed_node::<Order>(Order { id: 42 }))
            })
            .collect();

        let nodes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread").expect("add"))
            .collect();

        assert!(nodes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        let count = shared.read(|s| s.document_by_type::<Order>().map(|d| d.node_count()));
        assert_eq!(count, Some(1));
    }

    #[test]
    fn add_node_targets_default_document() {
        let shared: SharedSchema<Order> = SharedSchema::default();
        let node = shared.add_node(Order { id: 1 }).expect("add");
        assert_eq!(node.key().as_str(), "(doc:[default])/(default:[1])");
        assert_eq!(shared.read(|s| s.document_count()), 1);
    }

    #[test]
    fn parse_label_sees_live_documents() {
        let shared: SharedSchema<Order> = SharedSchema::default();
        let label = shared.parse_label("(doc:[default])/(nod:[1])").expect("parse");
        let bound = shared.read(|s| {
            s.document()
                .is_some_and(|d| label.parent().is_some_and(|p| Arc::ptr_eq(p, d.label())))
        });
        assert!(bound);
    }
}
