//! # Configuration
//!
//! The CLI reads `scheme.toml` (or the file given with `--config`):
//!
//! ```toml
//! schema_key = "default"
//! log_format = "text"
//!
//! [[scopes]]
//! name = "employees"
//! keys = ["id"]
//! relations = [{ field = "manager_id" }]
//!
//! [[scopes]]
//! name = "order_lines"
//! keys = ["order_id", "line"]
//! relations = [
//!     { field = "product_id", scope = "products" },
//!     { field = "parent_line" },
//! ]
//! ```
//!
//! A relation without `scope` points into its own scope. Unknown fields are
//! rejected.
//!
//! Environment overrides:
//! - `SCHEME_LOG_FORMAT`: `text` or `json`; any other value is an error

use scheme_core::SchemeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "scheme.toml";

/// Key fields assumed for scopes missing from the config.
pub const DEFAULT_KEY_FIELD: &str = "id";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// A reference from one record to another record.
///
/// The field holds the target's key: a scalar for a single-key scope, an
/// array of components in key order, or an object naming each key field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationConfig {
    /// Field holding the referenced record's key.
    pub field: String,
    /// Scope of the referenced record. Defaults to the referencing scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl RelationConfig {
    /// Scope the reference resolves in, given the scope it is declared on.
    #[must_use]
    pub fn target_scope<'a>(&'a self, declared_on: &'a str) -> &'a str {
        self.scope.as_deref().unwrap_or(declared_on)
    }
}

/// Identity rules for one scope of input records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    /// Scope name, also the key of the scope's document.
    pub name: String,
    /// Ordered primary-key field names.
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,
    /// Fields that reference other records.
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
}

fn default_keys() -> Vec<String> {
    vec![DEFAULT_KEY_FIELD.to_string()]
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Key of the root schema label.
    pub schema_key: String,
    pub log_format: LogFormat,
    pub scopes: Vec<ScopeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_key: scheme_core::primitives::DEFAULT_SCHEMA_KEY.to_string(),
            log_format: LogFormat::Text,
            scopes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `scheme.toml` in the
    /// working directory is used if present, defaults otherwise.
    ///
    /// # Errors
    ///
    /// `SchemeError::Config` if the file cannot be read, does not parse, or
    /// `SCHEME_LOG_FORMAT` names an unknown format.
    pub fn load(path: Option<&Path>) -> Result<Self, SchemeError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(value) = std::env::var("SCHEME_LOG_FORMAT") {
            config.apply_log_format_override(&value)?;
        }

        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, SchemeError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SchemeError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SchemeError> {
        let config: Self =
            toml::from_str(text).map_err(|e| SchemeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SchemeError> {
        for scope in &self.scopes {
            if scope.name.is_empty() {
                return Err(SchemeError::Config("scope name must not be empty".to_string()));
            }
            if scope.keys.is_empty() {
                return Err(SchemeError::Config(format!(
                    "scope '{}' declares no key fields",
                    scope.name
                )));
            }
            for relation in &scope.relations {
                if relation.field.is_empty() || relation.scope.as_deref() == Some("") {
                    return Err(SchemeError::Config(format!(
                        "scope '{}' declares a relation with an empty field or scope",
                        scope.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_log_format_override(&mut self, value: &str) -> Result<(), SchemeError> {
        self.log_format = LogFormat::from_env_value(value).ok_or_else(|| {
            SchemeError::Config(format!(
                "Unknown SCHEME_LOG_FORMAT '{value}' (expected 'text' or 'json')"
            ))
        })?;
        Ok(())
    }

    /// Rules for `name`, falling back to a single `id` key field.
    #[must_use]
    pub fn scope(&self, name: &str) -> ScopeConfig {
        self.scopes
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .unwrap_or_else(|| ScopeConfig {
                name: name.to_string(),
                keys: default_keys(),
                relations: Vec::new(),
            })
    }
}
