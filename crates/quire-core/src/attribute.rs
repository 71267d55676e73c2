//! Document attributes.
//!
//! Attributes are named settings that drive substitution and rendering.
//! Values are a small closed set of kinds ([`AttributeValue`]) and are read
//! through typed, fallible accessors. [`Attributes`] is the insertion-ordered
//! set used both for caller overrides and for the effective, resolved set
//! attached to a [`Document`](crate::document::Document).

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by typed attribute accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("expected {expected} attribute value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// The value of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Explicitly unset (`:name!:`, or `null` in front matter).
    Absent,
    /// Boolean flag, typically from front matter or configuration.
    Flag(bool),
    /// Plain text value. An empty string is a set attribute with no value.
    Text(String),
    /// Structured list, from front-matter sequences or configuration arrays.
    List(Vec<String>),
}

impl AttributeValue {
    /// Short name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeValue::Absent => "absent",
            AttributeValue::Flag(_) => "flag",
            AttributeValue::Text(_) => "text",
            AttributeValue::List(_) => "list",
        }
    }

    /// Returns `true` if the attribute is explicitly unset.
    pub fn is_absent(&self) -> bool {
        matches!(self, AttributeValue::Absent)
    }

    /// Borrow the value as text.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] for any kind other than text.
    pub fn as_text(&self) -> Result<&str, AttributeError> {
        match self {
            AttributeValue::Text(text) => Ok(text),
            other => Err(other.mismatch("text")),
        }
    }

    /// Read the value as a boolean flag.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] for any kind other than a flag.
    pub fn as_flag(&self) -> Result<bool, AttributeError> {
        match self {
            AttributeValue::Flag(flag) => Ok(*flag),
            other => Err(other.mismatch("flag")),
        }
    }

    /// Borrow the value as a list of strings.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::TypeMismatch`] for any kind other than a list.
    pub fn as_list(&self) -> Result<&[String], AttributeError> {
        match self {
            AttributeValue::List(items) => Ok(items),
            other => Err(other.mismatch("list")),
        }
    }

    /// The text spliced into the document when the attribute is referenced.
    ///
    /// Returns `None` for absent attributes, which behave as undefined.
    pub fn to_substitution(&self) -> Option<String> {
        match self {
            AttributeValue::Absent => None,
            AttributeValue::Flag(flag) => Some(flag.to_string()),
            AttributeValue::Text(text) => Some(text.clone()),
            AttributeValue::List(items) => Some(items.join(", ")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> AttributeError {
        AttributeError::TypeMismatch {
            expected,
            found: self.kind_name(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_substitution() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "<absent>"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::List(value)
    }
}

/// An insertion-ordered set of named attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: IndexMap<String, AttributeValue>,
}

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes, including absent ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no attribute is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    /// Returns `true` if the attribute is present, even when absent-valued.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns `true` if the attribute is present and not explicitly unset.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_absent())
    }

    /// Text value of the attribute, if it is present and text-valued.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_text().ok())
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.entries.insert(name.into(), value.into())
    }

    /// Insert an attribute only if it is not already present.
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert_if_absent(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, value.into());
        true
    }

    /// Add every attribute of `other` that is not already present.
    pub fn extend_missing(&mut self, other: &Attributes) {
        for (name, value) in other.iter() {
            self.insert_if_absent(name, value.clone());
        }
    }

    /// Iterate over attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let text = AttributeValue::from("hello");
        assert_eq!(text.as_text(), Ok("hello"));
        assert_eq!(
            text.as_flag(),
            Err(AttributeError::TypeMismatch {
                expected: "flag",
                found: "text"
            })
        );

        let flag = AttributeValue::from(true);
        assert_eq!(flag.as_flag(), Ok(true));
        assert!(flag.as_list().is_err());

        let list = AttributeValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(list.as_list().map(|items| items.len()), Ok(2));
    }

    #[test]
    fn test_to_substitution() {
        assert_eq!(AttributeValue::Absent.to_substitution(), None);
        assert_eq!(
            AttributeValue::Flag(false).to_substitution().as_deref(),
            Some("false")
        );
        assert_eq!(
            AttributeValue::List(vec!["a".into(), "b".into()])
                .to_substitution()
                .as_deref(),
            Some("a, b")
        );
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let mut attrs = Attributes::new();
        assert!(attrs.insert_if_absent("foo", "first"));
        assert!(!attrs.insert_if_absent("foo", "second"));
        assert_eq!(attrs.text("foo"), Some("first"));
    }

    #[test]
    fn test_is_set_ignores_absent() {
        let mut attrs = Attributes::new();
        attrs.insert("gone", AttributeValue::Absent);
        attrs.insert("here", "");
        assert!(attrs.contains("gone"));
        assert!(!attrs.is_set("gone"));
        assert!(attrs.is_set("here"));
        assert!(!attrs.is_set("missing"));
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let attrs: Attributes = [("b", "1"), ("a", "2"), ("c", "3")].into_iter().collect();
        let names: Vec<_> = attrs.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_extend_missing() {
        let mut attrs: Attributes = [("a", "keep")].into_iter().collect();
        let other: Attributes = [("a", "drop"), ("b", "add")].into_iter().collect();
        attrs.extend_missing(&other);
        assert_eq!(attrs.text("a"), Some("keep"));
        assert_eq!(attrs.text("b"), Some("add"));
    }
}
