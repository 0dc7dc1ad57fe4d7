//! Record identity capability.
//!
//! A record type declares its primary-key values and the scope it is grouped
//! under. The default scope is the pluralized snake-case name of the type,
//! so `UnitType` lands in `unit_types`.

use super::Key;

/// A record that can be placed in a [`Document`](crate::Document).
///
/// # Example
///
/// ```
/// use scheme_core::{Identifiable, Key};
///
/// struct Product {
///     id: u64,
///     name: String,
/// }
///
/// impl Identifiable for Product {
///     fn primary_key_values(&self) -> Vec<Key> {
///         vec![Key::from(self.id)]
///     }
/// }
///
/// assert_eq!(Product::scope_name(), "products");
/// ```
pub trait Identifiable {
    /// Ordered primary-key values. Composite keys return several components.
    ///
    /// An empty list means the record has no derivable identity; the model
    /// rejects such records with `SchemeError::InvalidRecord`.
    fn primary_key_values(&self) -> Vec<Key>;

    /// Scope used when the enclosing document declares no override.
    fn scope_name() -> String
    where
        Self: Sized,
    {
        default_scope::<Self>()
    }
}

/// Default scope for a type: its bare name, snake-cased and pluralized.
#[must_use]
pub fn default_scope<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);
    pluralize(&snake_case(name))
}

/// Convert `CamelCase` to `snake_case`. Acronyms stay together: `HTTPServer`
/// becomes `http_server`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// English plural of a snake-case word (last segment only).
#[must_use]
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return format!("{word}es");
    }

    format!("{word}s")
}
