//! # Label
//!
//! Canonical structural identity of a record, document, schema or edge.
//!
//! A label is a scope, an ordered list of key components and an optional
//! parent. Its canonical key renders as:
//!
//! ```text
//! (scope:[k1;k2])                      no parent
//! (parent-scope:[p1])/(scope:[k1;k2])  with parent
//! ```
//!
//! Only the immediate parent's own group is embedded; deeper ancestry lives
//! in the in-memory parent chain and is not written into the text. Parsing
//! therefore reconstructs at most two levels: the last group becomes the
//! label and the one before it becomes its parent.

use crate::primitives::{KEY_SEPARATOR, REL_SEPARATOR, SCOPE_SEPARATOR};
use crate::{Key, SchemeError};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, OnceLock};

/// One `(scope:[keys])` group, anchored.
static GROUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\((?P<scope>[^:()\[\]]+):\[(?P<keys>.*)\]\)$")
        .expect("label group pattern must compile")
});

// =============================================================================
// LABEL
// =============================================================================

/// Canonical identity: scope + ordered keys + optional shared parent.
///
/// Parents are shared through `Arc`; a label never mutates its parent, so
/// many children may point at the same one. The rendered key is computed on
/// first access and cached. Constructors that change the scope, keys or
/// parent start from an empty cache.
///
/// Equality and hashing use the canonical key only.
#[derive(Debug, Clone)]
pub struct Label {
    scope: String,
    keys: Vec<Key>,
    parent: Option<Arc<Label>>,
    raw_key: OnceLock<Key>,
}

impl Label {
    /// Build a label without a parent. The key is computed immediately.
    #[must_use]
    pub fn build<K: Into<Key>>(scope: impl Into<String>, keys: impl IntoIterator<Item = K>) -> Self {
        let label = Self {
            scope: scope.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            parent: None,
            raw_key: OnceLock::new(),
        };
        label.key();
        label
    }

    /// Build a child label whose parent is `self`.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use scheme_core::Label;
    ///
    /// let doc = Arc::new(Label::build("doc", ["default"]));
    /// let node = doc.append("nod", ["1"]);
    /// assert_eq!(node.key().as_str(), "(doc:[default])/(nod:[1])");
    /// ```
    #[must_use]
    pub fn append<K: Into<Key>>(
        self: &Arc<Self>,
        scope: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
    ) -> Self {
        Self::build(scope, keys).with_parent(Some(Arc::clone(self)))
    }

    /// Replace the parent. The cached key is discarded and recomputed.
    #[must_use]
    pub fn with_parent(mut self, parent: Option<Arc<Label>>) -> Self {
        self.parent = parent;
        self.raw_key = OnceLock::new();
        self.key();
        self
    }

    /// Scope (category) of this label.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Ordered key components.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// First key component, used by documents as a scope override.
    #[must_use]
    pub fn first_key(&self) -> Option<&Key> {
        self.keys.first()
    }

    /// Enclosing label, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Label>> {
        self.parent.as_ref()
    }

    /// Canonical key, computed on first access.
    pub fn key(&self) -> &Key {
        self.raw_key.get_or_init(|| self.make_key())
    }

    /// This label's own group, `(scope:[k1;k2])`, without any parent.
    #[must_use]
    pub fn segment(&self) -> String {
        let keys: Vec<&str> = self.keys.iter().map(Key::as_str).collect();
        format!("({}:[{}])", self.scope, keys.join(KEY_SEPARATOR))
    }

    fn make_key(&self) -> Key {
        let segment = self.segment();
        match &self.parent {
            Some(parent) => Key(format!("{}{}{}", parent.segment(), SCOPE_SEPARATOR, segment)),
            None => Key(segment),
        }
    }

    // =========================================================================
    // PARSING
    // =========================================================================

    /// Parse a canonical key back into a label.
    ///
    /// The last group becomes the label, the second-to-last (if any) its
    /// parent. Earlier groups are ignored. Key components may hold any
    /// character; a component containing the key separator comes back split
    /// at it, so only the rendered key is guaranteed to survive.
    ///
    /// # Errors
    ///
    /// `SchemeError::LabelParse` if the text holds no well-formed group.
    pub fn parse(text: &str) -> Result<Self, SchemeError> {
        Self::parse_with(text, |_| None)
    }

    /// Parse like [`Label::parse`], letting `resolve` substitute a live label
    /// for the parsed parent. Returning `None` keeps the detached copy.
    pub fn parse_with<F>(text: &str, resolve: F) -> Result<Self, SchemeError>
    where
        F: FnOnce(&Label) -> Option<Arc<Label>>,
    {
        let (parsed_parent, current) = locate_groups(text)?;
        let parent = parsed_parent.map(|parsed| resolve(&parsed).unwrap_or_else(|| Arc::new(parsed)));

        Ok(current.with_parent(parent))
    }

    /// Parse a relation label key into its `(from, to)` endpoint labels.
    ///
    /// # Errors
    ///
    /// `SchemeError::LabelParse` if the label is malformed or its key does not
    /// hold exactly two endpoints joined by the relation separator.
    pub fn parse_relation(text: &str) -> Result<(Self, Self), SchemeError> {
        let label = Self::parse(text)?;
        let joined = label
            .keys
            .iter()
            .map(Key::as_str)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);

        let parts = split_top_level(&joined, REL_SEPARATOR);
        match parts.as_slice() {
            [from, to] => Ok((Self::parse(from)?, Self::parse(to)?)),
            _ => Err(SchemeError::LabelParse(format!(
                "'{text}' is not a relation label"
            ))),
        }
    }
}

/// Split `text` into its parsed parent group (if any) and its last group.
///
/// Cleanly nested groups are used when they tile the text with the scope
/// separator between them. Keys holding stray parentheses or brackets
/// defeat that, so the text is then cut at the rightmost `])/(` boundary
/// whose two halves are both well-formed groups, or read as one group.
fn locate_groups(text: &str) -> Result<(Option<Label>, Label), SchemeError> {
    if let Some(found) = balanced_groups(text) {
        return Ok(found);
    }

    let boundary = format!("]){SCOPE_SEPARATOR}(");
    for (i, _) in text.rmatch_indices(boundary.as_str()) {
        let split = i + 2;
        let parent = &text[..split];
        let current = &text[split + SCOPE_SEPARATOR.len()..];
        if let (Ok(parent), Ok(current)) = (parse_group(parent), parse_group(current)) {
            return Ok((Some(parent), current));
        }
    }

    if !text.contains('(') {
        return Err(SchemeError::LabelParse(format!(
            "no (scope:[keys]) group in '{text}'"
        )));
    }
    parse_group(text).map(|current| (None, current))
}

fn balanced_groups(text: &str) -> Option<(Option<Label>, Label)> {
    let groups = top_level_groups(text)?;
    let ((last_start, last), rest) = groups.split_last()?;
    if last_start + last.len() != text.len() {
        return None;
    }
    let tiled = groups
        .windows(2)
        .all(|w| &text[w[0].0 + w[0].1.len()..w[1].0] == SCOPE_SEPARATOR);
    if !tiled {
        return None;
    }

    let current = parse_group(last).ok()?;
    let parent = match rest.last() {
        Some((_, group)) => Some(parse_group(group).ok()?),
        None => None,
    };
    Some((parent, current))
}

/// Complete top-level `( ... )` groups in order, with their byte offsets.
/// Nested groups inside a group (relation endpoints) stay part of it.
///
/// `None` if parentheses and brackets do not nest cleanly, which happens
/// when a key component holds one of them.
fn top_level_groups(text: &str) -> Option<Vec<(usize, &str)>> {
    let mut groups = Vec::new();
    let mut open = Vec::new();
    let mut start = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => {
                if open.is_empty() {
                    start = i;
                }
                open.push(c);
            }
            ')' | ']' => {
                let expected = if c == ')' { '(' } else { '[' };
                if open.pop() != Some(expected) {
                    return None;
                }
                if c == ')' && open.is_empty() {
                    groups.push((start, &text[start..=i]));
                }
            }
            _ => {}
        }
    }

    open.is_empty().then_some(groups)
}

/// Split on `sep` where it occurs outside any parentheses or brackets.
fn split_top_level<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && i >= start && text[i..].starts_with(sep) => {
                parts.push(&text[start..i]);
                start = i + sep.len();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
}

fn parse_group(group: &str) -> Result<Label, SchemeError> {
    let caps = GROUP_REGEX
        .captures(group)
        .ok_or_else(|| SchemeError::LabelParse(format!("malformed group '{group}'")))?;

    let scope = caps.name("scope").map_or("", |m| m.as_str());
    let keys = caps.name("keys").map_or("", |m| m.as_str());
    let keys: Vec<Key> = if keys.is_empty() {
        Vec::new()
    } else {
        split_top_level(keys, KEY_SEPARATOR)
            .into_iter()
            .map(Key::from)
            .collect()
    };

    Ok(Label::build(scope, keys))
}

// =============================================================================
// TRAIT IMPLEMENTATIONS
// =============================================================================

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key().as_str())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_renders_scope_and_keys() {
        let label = Label::build("nod", ["1", "2", "123"]);
        assert_eq!(label.key().as_str(), "(nod:[1;2;123])");
        assert!(label.parent().is_none());
    }

    #[test]
    fn build_without_keys_renders_empty_brackets() {
        let label = Label::build("sch", Vec::<Key>::new());
        assert_eq!(label.key().as_str(), "(sch:[])");
    }

    #[test]
    fn append_embeds_immediate_parent_only() {
        let schema = Arc::new(Label::build("sch", ["default"]));
        let doc = Arc::new(schema.append("doc", ["default"]));
        let node = doc.append("nod", ["1"]);

        assert_eq!(doc.key().as_str(), "(sch:[default])/(doc:[default])");
        assert_eq!(node.key().as_str(), "(doc:[default])/(nod:[1])");
        // The full chain is still reachable in memory.
        let grandparent = node.parent().and_then(|p| p.parent());
        assert_eq!(grandparent.map(|g| g.scope()), Some("sch"));
    }

    #[test]
    fn with_parent_recomputes_cached_key() {
        let label = Label::build("nod", ["1"]);
        assert_eq!(label.key().as_str(), "(nod:[1])");

        let parent = Arc::new(Label::build("doc", ["a"]));
        let moved = label.with_parent(Some(parent));
        assert_eq!(moved.key().as_str(), "(doc:[a])/(nod:[1])");

        let detached = moved.with_parent(None);
        assert_eq!(detached.key().as_str(), "(nod:[1])");
    }

    #[test]
    fn parse_single_group() {
        let label = Label::parse("(nod:[1])").expect("parse");
        assert_eq!(label.scope(), "nod");
        assert_eq!(label.keys(), &[Key::new("1")]);
        assert!(label.parent().is_none());
    }

    #[test]
    fn parse_with_parent_and_multiple_keys() {
        let text = "(doc:[default])/(nod:[1;2;123])";
        let label = Label::parse(text).expect("parse");

        assert_eq!(label.key().as_str(), text);
        assert_eq!(label.keys().len(), 3);
        let parent = label.parent().expect("parent");
        assert_eq!(parent.scope(), "doc");
        assert_eq!(parent.keys(), &[Key::new("default")]);
    }

    #[test]
    fn parse_keeps_only_last_two_groups() {
        let label = Label::parse("(sch:[default])/(doc:[default])/(nod:[7])").expect("parse");
        assert_eq!(label.key().as_str(), "(doc:[default])/(nod:[7])");
        assert!(label.parent().and_then(|p| p.parent()).is_none());
    }

    #[test]
    fn parse_empty_keys() {
        let label = Label::parse("(sch:[])").expect("parse");
        assert!(label.keys().is_empty());
        assert_eq!(label.key().as_str(), "(sch:[])");
    }

    #[test]
    fn parse_rejects_text_without_groups() {
        assert!(matches!(Label::parse(""), Err(SchemeError::LabelParse(_))));
        assert!(matches!(Label::parse("nod:[1]"), Err(SchemeError::LabelParse(_))));
        assert!(matches!(Label::parse("(nod:[1]"), Err(SchemeError::LabelParse(_))));
        assert!(matches!(Label::parse("(nod)"), Err(SchemeError::LabelParse(_))));
    }

    #[test]
    fn parse_keys_with_unbalanced_brackets() {
        for key in ["a)", "(", ")(", "x])(y:[z", "]", "a:b", "[q"] {
            let label = Label::build("nod", [key]);
            let parsed = Label::parse(label.key().as_str()).expect("parse");
            assert_eq!(parsed.key(), label.key(), "key {key:?}");
            assert_eq!(parsed.keys(), &[Key::new(key)]);
            assert!(parsed.parent().is_none());
        }
    }

    #[test]
    fn parse_unbalanced_parent_and_child_keys() {
        let parent = Arc::new(Label::build("doc", ["x("]));
        let child = parent.append("nod", ["y)"]);
        assert_eq!(child.key().as_str(), "(doc:[x(])/(nod:[y)])");

        let parsed = Label::parse(child.key().as_str()).expect("parse");
        assert_eq!(parsed.key(), child.key());
        assert_eq!(parsed.keys(), &[Key::new("y)")]);
        let parsed_parent = parsed.parent().expect("parent");
        assert_eq!(parsed_parent.keys(), &[Key::new("x(")]);
    }

    #[test]
    fn parse_with_substitutes_live_parent() {
        let live = Arc::new(Arc::new(Label::build("sch", ["default"])).append("doc", ["default"]));
        let label = Label::parse_with("(doc:[default])/(nod:[1])", |parsed| {
            (parsed.segment() == live.segment()).then(|| Arc::clone(&live))
        })
        .expect("parse");

        let parent = label.parent().expect("parent");
        assert!(Arc::ptr_eq(parent, &live));
        assert_eq!(label.key().as_str(), "(doc:[default])/(nod:[1])");
    }

    #[test]
    fn parse_relation_label_keeps_nested_groups() {
        let doc = Arc::new(Label::build("doc", ["default"]));
        let from = doc.append("nod", ["1;2"]);
        let to = doc.append("nod", ["3"]);
        let rel = doc.append(
            "rel",
            [format!("{}{}{}", from.key(), REL_SEPARATOR, to.key())],
        );

        let parsed = Label::parse(rel.key().as_str()).expect("parse");
        assert_eq!(parsed.scope(), "rel");
        assert_eq!(parsed.key(), rel.key());

        let (a, b) = Label::parse_relation(rel.key().as_str()).expect("relation");
        assert_eq!(a.key(), from.key());
        assert_eq!(b.key(), to.key());
    }

    #[test]
    fn parse_relation_rejects_plain_labels() {
        assert!(Label::parse_relation("(doc:[default])/(nod:[1])").is_err());
    }

    #[test]
    fn equality_and_display_follow_key() {
        let a = Label::build("nod", ["1"]);
        let b = Label::parse("(nod:[1])").expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "(nod:[1])");
        assert_ne!(a, Label::build("nod", ["2"]));
    }

    #[test]
    fn serde_uses_canonical_key() {
        let label = Arc::new(Label::build("doc", ["default"])).append("nod", ["9"]);
        let json = serde_json::to_string(&label).expect("serialize");
        assert_eq!(json, "\"(doc:[default])/(nod:[9])\"");

        let back: Label = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, label);

        let bad: Result<Label, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
