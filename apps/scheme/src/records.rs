//! # Record Loading
//!
//! Turns a JSON input file into a [`Schema`]:
//!
//! ```json
//! {
//!   "employees": [
//!     { "id": 1, "name": "Ada" },
//!     { "id": 2, "name": "Lin", "manager_id": 1 }
//!   ]
//! }
//! ```
//!
//! Each top-level key is a scope. Its records go into the document keyed by
//! that scope, so their labels read `(doc:[employees])/(employees:[1])`.
//! Configured reference fields become relations once every scope is loaded,
//! so a reference may point into a scope listed later in the file. The
//! relation is stored in the referencing record's document.

use crate::config::{AppConfig, ScopeConfig};
use scheme_core::{
    Document, Identifiable, Key, Label, Node, Schema, SchemeError, build_schema_label,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// One JSON object plus the ordered names of its key fields.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonRecord {
    fields: Map<String, Value>,
    #[serde(skip)]
    key_fields: Arc<[String]>,
}

impl JsonRecord {
    #[must_use]
    pub fn new(fields: Map<String, Value>, key_fields: Arc<[String]>) -> Self {
        Self { fields, key_fields }
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// A field rendered as a key component. Strings are used verbatim;
    /// numbers and booleans use their JSON text. Null, arrays and objects
    /// are not valid key components.
    #[must_use]
    pub fn field_key(&self, field: &str) -> Option<Key> {
        self.fields.get(field).and_then(scalar_key)
    }

    /// Key components a reference field points at, for a target scope whose
    /// key fields are `target_keys`. A scalar addresses a single-key scope,
    /// an array lists the components in key order and an object names them.
    /// `None` if the value does not fit the target's key.
    #[must_use]
    pub fn reference_keys(&self, field: &str, target_keys: &[String]) -> Option<Vec<Key>> {
        let keys = match self.fields.get(field)? {
            Value::Array(items) => items.iter().map(scalar_key).collect::<Option<Vec<_>>>()?,
            Value::Object(named) => target_keys
                .iter()
                .map(|k| named.get(k).and_then(scalar_key))
                .collect::<Option<Vec<_>>>()?,
            scalar => vec![scalar_key(scalar)?],
        };
        (keys.len() == target_keys.len()).then_some(keys)
    }
}

fn scalar_key(value: &Value) -> Option<Key> {
    match value {
        Value::String(s) => Some(Key::new(s.as_str())),
        Value::Number(n) => Some(Key::new(n.to_string())),
        Value::Bool(b) => Some(Key::new(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl Identifiable for JsonRecord {
    /// All configured key fields, or nothing if any of them is unusable.
    fn primary_key_values(&self) -> Vec<Key> {
        self.key_fields
            .iter()
            .map(|field| self.field_key(field))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

/// Per-document counts after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub document: String,
    pub records: usize,
    pub nodes: usize,
    pub relations: usize,
    /// References whose target record was not found.
    pub dangling: usize,
}

/// Build a schema from an input object mapping scope names to record arrays.
///
/// # Errors
///
/// - `SchemeError::TypeMismatch` if the input is not an object of arrays of objects
/// - `SchemeError::InvalidRecord` if a record lacks a usable key field
pub fn load_schema(
    config: &AppConfig,
    input: &Value,
) -> Result<(Schema<JsonRecord>, Vec<LoadSummary>), SchemeError> {
    let scopes = input.as_object().ok_or_else(|| mismatch("object of scopes", input))?;

    let mut schema = Schema::new(Some(build_schema_label([config.schema_key.as_str()])));
    let mut loaded = Vec::with_capacity(scopes.len());

    for (name, records) in scopes {
        let records = records
            .as_array()
            .ok_or_else(|| mismatch("array of records", records))?;
        let rules = config.scope(name);
        let doc = schema.add_new_document_with_keys([name.as_str()]);
        let nodes = load_nodes(doc, &rules, records)?;
        loaded.push((rules, Arc::clone(doc.label()), nodes, records.len()));
    }

    let mut summaries = Vec::with_capacity(loaded.len());
    for (rules, doc_label, nodes, records) in loaded {
        let dangling = link_references(&mut schema, config, &rules, &doc_label, &nodes);
        let (node_count, relation_count) = schema
            .document_by_label(&doc_label)
            .map_or((0, 0), |doc| (doc.node_count(), doc.relation_count()));

        let summary = LoadSummary {
            document: doc_label.key().to_string(),
            records,
            nodes: node_count,
            relations: relation_count,
            dangling,
        };
        tracing::info!(
            "Loaded scope '{}': {} records, {} nodes, {} relations",
            rules.name,
            summary.records,
            summary.nodes,
            summary.relations
        );
        summaries.push(summary);
    }

    Ok((schema, summaries))
}

fn load_nodes(
    doc: &mut Document<JsonRecord>,
    rules: &ScopeConfig,
    records: &[Value],
) -> Result<Vec<Arc<Node<JsonRecord>>>, SchemeError> {
    let key_fields: Arc<[String]> = rules.keys.clone().into();

    let mut nodes = Vec::with_capacity(records.len());
    for raw in records {
        let fields = raw
            .as_object()
            .ok_or_else(|| mismatch("record object", raw))?
            .clone();
        nodes.push(doc.add_node(JsonRecord::new(fields, Arc::clone(&key_fields)))?);
    }
    Ok(nodes)
}

/// Turn the configured reference fields of `nodes` into relations of the
/// document under `doc_label`. Returns the number of references whose
/// target was not found. Absent and null fields are not references.
fn link_references(
    schema: &mut Schema<JsonRecord>,
    config: &AppConfig,
    rules: &ScopeConfig,
    doc_label: &Label,
    nodes: &[Arc<Node<JsonRecord>>],
) -> usize {
    let mut dangling = 0;

    for relation in &rules.relations {
        let target_scope = relation.target_scope(&rules.name);
        let target_keys = config.scope(target_scope).keys;

        for node in nodes {
            let record = node.data();
            if record.fields().get(&relation.field).is_none_or(Value::is_null) {
                continue;
            }

            let target = record
                .reference_keys(&relation.field, &target_keys)
                .and_then(|keys| find_node(schema, target_scope, keys));
            match target {
                Some(target) => {
                    if let Some(doc) = schema.document_by_label_mut(doc_label) {
                        doc.add_relation(node, &target, vec![Value::String(relation.field.clone())]);
                    }
                }
                None => {
                    tracing::warn!(
                        "Dangling reference {}.{} into scope '{}'",
                        node.key(),
                        relation.field,
                        target_scope
                    );
                    dangling += 1;
                }
            }
        }
    }

    dangling
}

fn find_node(
    schema: &Schema<JsonRecord>,
    scope: &str,
    keys: Vec<Key>,
) -> Option<Arc<Node<JsonRecord>>> {
    let doc = schema.document_by_label(&schema.build_document_label([scope]))?;
    let label = doc.label().append(scope, keys);
    doc.node_by_key(label.key()).cloned()
}

fn mismatch(expected: &str, found: &Value) -> SchemeError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SchemeError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
