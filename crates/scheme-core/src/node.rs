//! # Node
//!
//! Indexed wrapper around one record. The label is derived once, when the
//! node is created by its document, and never changes afterwards.

use crate::{Key, Label, SchemeError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, type_name};

/// A record together with its structural identity.
#[derive(Debug, Clone, Serialize)]
pub struct Node<T> {
    label: Label,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<serde_json::Value>,
}

impl<T> Node<T> {
    /// Wrap `data` under `label`.
    #[must_use]
    pub fn new(label: Label, data: T) -> Self {
        Self {
            label,
            data,
            meta: None,
        }
    }

    /// Attach free-form metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Canonical key of this node's label.
    pub fn key(&self) -> &Key {
        self.label.key()
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        self.label.scope()
    }

    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[must_use]
    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }
}

impl<T: Serialize + Clone + 'static> Node<T> {
    /// The payload as `U`.
    ///
    /// When `U` is the payload type the payload is cloned as is. Otherwise it
    /// is re-encoded through JSON into `U`.
    ///
    /// # Errors
    ///
    /// `SchemeError::TypeMismatch` if the payload does not decode as `U`.
    pub fn data_as<U: DeserializeOwned + 'static>(&self) -> Result<U, SchemeError> {
        let boxed: Box<dyn Any> = Box::new(self.data.clone());
        match boxed.downcast::<U>() {
            Ok(same) => Ok(*same),
            Err(_) => {
                let value = serde_json::to_value(&self.data)?;
                serde_json::from_value(value).map_err(|e| SchemeError::TypeMismatch {
                    expected: type_name::<U>().to_string(),
                    found: format!("{} ({e})", type_name::<T>()),
                })
            }
        }
    }
}
