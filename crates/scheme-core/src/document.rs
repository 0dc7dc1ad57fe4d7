//! # Document
//!
//! Scoped container of nodes and relations with dedup-on-insert.
//!
//! Node identity is a function of the derived label key only: adding two
//! records that derive the same label returns the node created by the first
//! call. Payloads of later duplicates are dropped.
//!
//! Maps are `BTreeMap` so iteration is deterministic, but callers must not
//! rely on any particular order.

use crate::relation::relation_label;
use crate::{Identifiable, Key, Label, Node, Relation, SchemeError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::{SerializeStruct, Serializer};
use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// A scoped collection of nodes and relations.
#[derive(Debug, Clone)]
pub struct Document<T> {
    label: Arc<Label>,
    /// Node storage: label key -> node
    nodes: BTreeMap<Key, Arc<Node<T>>>,
    /// Relation storage: label key -> relation
    relations: BTreeMap<Key, Relation<T>>,
}

impl<T> Document<T> {
    /// Create an empty document under `label`.
    #[must_use]
    pub fn new(label: Label) -> Self {
        Self {
            label: Arc::new(label),
            nodes: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &Arc<Label> {
        &self.label
    }

    pub fn key(&self) -> &Key {
        self.label.key()
    }

    /// Scope override declared by this document: the first key of its label.
    #[must_use]
    pub fn scope_override(&self) -> Option<&str> {
        self.label.first_key().map(Key::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node<T>>> {
        self.nodes.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation<T>> {
        self.relations.values()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Lookup a node by its canonical label key.
    #[must_use]
    pub fn node_by_key(&self, key: &Key) -> Option<&Arc<Node<T>>> {
        self.nodes.get(key)
    }

    /// Lookup a relation by its canonical label key.
    #[must_use]
    pub fn relation_by_key(&self, key: &Key) -> Option<&Relation<T>> {
        self.relations.get(key)
    }

    /// Insert a prepared node. If a node with the same key exists, that node
    /// is returned and `node` is dropped.
    pub fn insert_node(&mut self, node: Node<T>) -> Arc<Node<T>> {
        match self.nodes.entry(node.key().clone()) {
            Entry::Occupied(existing) => {
                tracing::trace!(key = %existing.key(), "node already present");
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => {
                tracing::debug!(key = %slot.key(), "node created");
                Arc::clone(slot.insert(Arc::new(node)))
            }
        }
    }

    /// Build the label of the edge `from -> to` in this document.
    #[must_use]
    pub fn build_relation_label(&self, from: &Node<T>, to: &Node<T>) -> Label {
        relation_label(&self.label, from.label(), to.label())
    }

    /// Build a relation without inserting it.
    #[must_use]
    pub fn new_relation(
        &self,
        from: &Arc<Node<T>>,
        to: &Arc<Node<T>>,
        values: Vec<serde_json::Value>,
    ) -> Relation<T> {
        Relation::new(&self.label, Arc::clone(from), Arc::clone(to), values)
    }

    /// Add the edge `from -> to`, or return the existing one with the same key.
    ///
    /// `values` are stored only when the relation is first created.
    pub fn add_relation(
        &mut self,
        from: &Arc<Node<T>>,
        to: &Arc<Node<T>>,
        values: Vec<serde_json::Value>,
    ) -> &Relation<T> {
        let relation = self.new_relation(from, to, values);
        match self.relations.entry(relation.key().clone()) {
            Entry::Occupied(existing) => existing.into_mut(),
            Entry::Vacant(slot) => {
                tracing::debug!(key = %slot.key(), "relation created");
                slot.insert(relation)
            }
        }
    }
}

impl<T: Identifiable> Document<T> {
    /// Derive the label `value` would have in this document.
    ///
    /// Scope is the document's override if it declares one, otherwise the
    /// record type's scope name. Keys are the record's primary-key values.
    ///
    /// # Errors
    ///
    /// `SchemeError::InvalidRecord` if the record has no primary-key values.
    pub fn build_node_label(&self, value: &T) -> Result<Label, SchemeError> {
        let scope = self
            .scope_override()
            .map_or_else(T::scope_name, str::to_string);

        let keys = value.primary_key_values();
        if keys.is_empty() {
            return Err(SchemeError::InvalidRecord { scope });
        }

        Ok(self.label.append(scope, keys))
    }

    /// Wrap `value` in a node labelled for this document, without inserting.
    pub fn new_node(&self, value: T) -> Result<Node<T>, SchemeError> {
        let label = self.build_node_label(&value)?;
        Ok(Node::new(label, value))
    }

    /// Resolve or create the node for `value`.
    pub fn add_node(&mut self, value: T) -> Result<Arc<Node<T>>, SchemeError> {
        let node = self.new_node(value)?;
        Ok(self.insert_node(node))
    }

    /// Resolve or create the node for `value`, then resolve or create a node
    /// for each related record and an edge from `value`'s node to it.
    ///
    /// Returns the primary node.
    pub fn add_node_with_relations(
        &mut self,
        value: T,
        related: impl IntoIterator<Item = T>,
    ) -> Result<Arc<Node<T>>, SchemeError> {
        let node = self.add_node(value)?;
        for other in related {
            let other = self.add_node(other)?;
            self.add_relation(&node, &other, Vec::new());
        }
        Ok(node)
    }

    /// Add every record in `values`.
    pub fn add_nodes(&mut self, values: impl IntoIterator<Item = T>) -> Result<&mut Self, SchemeError> {
        for value in values {
            self.add_node(value)?;
        }
        Ok(self)
    }

    /// Lookup the node `value` would resolve to, without creating it.
    pub fn get_node(&self, value: &T) -> Result<Option<&Arc<Node<T>>>, SchemeError> {
        let label = self.build_node_label(value)?;
        Ok(self.nodes.get(label.key()))
    }
}

impl<T: Clone + 'static> Document<T> {
    /// Append every node's payload to `dst`, which must be a `Vec<T>`.
    ///
    /// # Errors
    ///
    /// `SchemeError::TypeMismatch` if `dst` is any other type.
    pub fn get_data<D: Any>(&self, dst: &mut D) -> Result<(), SchemeError> {
        let Some(out) = (dst as &mut dyn Any).downcast_mut::<Vec<T>>() else {
            return Err(SchemeError::TypeMismatch {
                expected: type_name::<Vec<T>>().to_string(),
                found: type_name::<D>().to_string(),
            });
        };

        out.extend(self.nodes.values().map(|node| node.data().clone()));
        Ok(())
    }
}

impl<T: Serialize + Clone + 'static> Document<T> {
    /// Append every node's payload to `dst`, decoded as `U`.
    ///
    /// Nothing is appended unless every payload decodes.
    pub fn get_data_as<U: DeserializeOwned + 'static>(
        &self,
        dst: &mut Vec<U>,
    ) -> Result<(), SchemeError> {
        let decoded = self
            .nodes
            .values()
            .map(|node| node.data_as::<U>())
            .collect::<Result<Vec<_>, _>>()?;
        dst.extend(decoded);
        Ok(())
    }
}

impl<T: Serialize> Serialize for Document<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 3)?;
        state.serialize_field("label", self.label.as_ref())?;
        let nodes: BTreeMap<&Key, &Node<T>> =
            self.nodes.iter().map(|(k, n)| (k, n.as_ref())).collect();
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("relations", &self.relations)?;
        state.end()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct UnitType {
        id: u64,
        name: String,
    }

    impl Identifiable for UnitType {
        fn primary_key_values(&self) -> Vec<Key> {
            vec![Key::from(self.id)]
        }
    }

    #[derive(Debug, Clone)]
    struct Keyless;

    impl Identifiable for Keyless {
        fn primary_key_values(&self) -> Vec<Key> {
            Vec::new()
        }
    }

    fn unit(id: u64, name: &str) -> UnitType {
        UnitType {
            id,
            name: name.to_string(),
        }
    }

    fn typed_document<T>() -> Document<T> {
        let schema = Arc::new(Label::build("sch", ["default"]));
        Document::new(schema.append("doc", Vec::<Key>::new()))
    }

    fn scoped_document<T>(scope: &str) -> Document<T> {
        let schema = Arc::new(Label::build("sch", ["default"]));
        Document::new(schema.append("doc", [scope]))
    }

    #[test]
    fn node_label_uses_type_scope_without_override() {
        let doc = typed_document::<UnitType>();
        let label = doc.build_node_label(&unit(1, "kg")).expect("label");
        assert_eq!(label.key().as_str(), "(doc:[])/(unit_types:[1])");
    }

    #[test]
    fn node_label_uses_document_override() {
        let doc = scoped_document::<UnitType>("units");
        let label = doc.build_node_label(&unit(1, "kg")).expect("label");
        assert_eq!(label.key().as_str(), "(doc:[units])/(units:[1])");
        assert_eq!(label.parent().map(|p| p.key()), Some(doc.key()));
    }

    #[test]
    fn add_node_dedups_by_label() {
        let mut doc = scoped_document::<UnitType>("units");

        let first = doc.add_node(unit(1, "kg")).expect("add");
        let second = doc.add_node(unit(1, "kilogram")).expect("add");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(second.data().name, "kg");
    }

    #[test]
    fn distinct_keys_create_distinct_nodes() {
        let mut doc = scoped_document::<UnitType>("units");
        let a = doc.add_node(unit(1, "kg")).expect("add");
        let b = doc.add_node(unit(2, "kg")).expect("add");

        assert_ne!(a.key(), b.key());
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn keyless_record_is_rejected() {
        let mut doc = typed_document::<Keyless>();
        let result = doc.add_node(Keyless);
        assert!(matches!(
            result,
            Err(SchemeError::InvalidRecord { ref scope }) if scope == "keylesses"
        ));
        assert_eq!(doc.node_count(), 0);
        assert!(doc.get_node(&Keyless).is_err());
    }

    #[test]
    fn new_node_does_not_insert() {
        let doc = scoped_document::<UnitType>("units");
        let node = doc.new_node(unit(5, "g")).expect("node");
        assert_eq!(node.scope(), "units");
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn insert_node_keeps_meta_of_first_insert() {
        let mut doc = scoped_document::<UnitType>("units");
        let node = doc
            .new_node(unit(1, "kg"))
            .expect("node")
            .with_meta(serde_json::json!({"origin": "seed"}));

        let stored = doc.insert_node(node);
        let again = doc.add_node(unit(1, "kg")).expect("add");
        assert!(Arc::ptr_eq(&stored, &again));
        assert_eq!(again.meta(), Some(&serde_json::json!({"origin": "seed"})));
    }

    #[test]
    fn get_node_finds_without_creating() {
        let mut doc = scoped_document::<UnitType>("units");
        assert!(doc.get_node(&unit(1, "kg")).expect("lookup").is_none());
        assert_eq!(doc.node_count(), 0);

        let added = doc.add_node(unit(1, "kg")).expect("add");
        let found = doc.get_node(&unit(1, "other")).expect("lookup").expect("present");
        assert!(Arc::ptr_eq(&added, found));
    }

    #[test]
    fn add_nodes_adds_each_record() {
        let mut doc = scoped_document::<UnitType>("units");
        doc.add_nodes(vec![unit(1, "a"), unit(2, "b"), unit(1, "c")])
            .expect("add");
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn add_relation_dedups_and_keeps_first_values() {
        let mut doc = scoped_document::<UnitType>("units");
        let a = doc.add_node(unit(1, "a")).expect("add");
        let b = doc.add_node(unit(2, "b")).expect("add");

        let key = doc
            .add_relation(&a, &b, vec![serde_json::json!(1)])
            .key()
            .clone();
        let again = doc.add_relation(&a, &b, vec![serde_json::json!(2)]);

        assert_eq!(again.key(), &key);
        assert_eq!(again.data(), Some(&[serde_json::json!(1)][..]));
        assert_eq!(doc.relation_count(), 1);
    }

    #[test]
    fn add_relation_is_order_sensitive() {
        let mut doc = scoped_document::<UnitType>("units");
        let a = doc.add_node(unit(1, "a")).expect("add");
        let b = doc.add_node(unit(2, "b")).expect("add");

        let ab = doc.add_relation(&a, &b, Vec::new()).key().clone();
        let ba = doc.add_relation(&b, &a, Vec::new()).key().clone();

        assert_ne!(ab, ba);
        assert_eq!(doc.relation_count(), 2);
    }

    #[test]
    fn add_node_with_relations_links_related_records() {
        let mut doc = scoped_document::<UnitType>("units");
        let primary = doc
            .add_node_with_relations(unit(1, "kg"), vec![unit(2, "g"), unit(3, "mg")])
            .expect("add");

        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.relation_count(), 2);
        assert!(doc.relations().all(|r| Arc::ptr_eq(r.from(), &primary)));

        // Existing primary still gains new relations.
        doc.add_node_with_relations(unit(1, "kg"), vec![unit(4, "t")])
            .expect("add");
        assert_eq!(doc.node_count(), 4);
        assert_eq!(doc.relation_count(), 3);
    }

    #[test]
    fn get_data_collects_every_payload() {
        let mut doc = scoped_document::<UnitType>("units");
        doc.add_nodes(vec![unit(1, "x"), unit(2, "y"), unit(3, "z")])
            .expect("add");

        let mut out: Vec<UnitType> = Vec::new();
        doc.get_data(&mut out).expect("get data");

        let names: BTreeSet<String> = out.into_iter().map(|u| u.name).collect();
        let expected: BTreeSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn get_data_rejects_wrong_destination() {
        let mut doc = scoped_document::<UnitType>("units");
        doc.add_node(unit(1, "x")).expect("add");

        let mut wrong = String::new();
        assert!(matches!(
            doc.get_data(&mut wrong),
            Err(SchemeError::TypeMismatch { .. })
        ));

        let mut wrong_elem: Vec<String> = Vec::new();
        assert!(matches!(
            doc.get_data(&mut wrong_elem),
            Err(SchemeError::TypeMismatch { .. })
        ));
        assert!(wrong_elem.is_empty());
    }

    #[test]
    fn get_data_as_decodes_payloads() {
        #[derive(Debug, Deserialize)]
        struct NameOnly {
            name: String,
        }

        let mut doc = scoped_document::<UnitType>("units");
        doc.add_nodes(vec![unit(1, "x"), unit(2, "y")]).expect("add");

        let mut out: Vec<NameOnly> = Vec::new();
        doc.get_data_as(&mut out).expect("decode");
        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|n| n.name == "y"));

        let mut bad: Vec<u64> = Vec::new();
        assert!(doc.get_data_as(&mut bad).is_err());
        assert!(bad.is_empty());
    }

    #[test]
    fn serializes_nodes_and_relations_by_key() {
        let mut doc = scoped_document::<UnitType>("units");
        let a = doc.add_node(unit(1, "a")).expect("add");
        let b = doc.add_node(unit(2, "b")).expect("add");
        doc.add_relation(&a, &b, Vec::new());

        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["label"], "(sch:[default])/(doc:[units])");
        assert_eq!(json["nodes"]["(doc:[units])/(units:[1])"]["data"]["name"], "a");
        assert_eq!(json["relations"].as_object().map(|m| m.len()), Some(1));
    }
}
