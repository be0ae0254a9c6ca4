//! Placeholder tokens and the token → value map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Markers that surround a field name to form a placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Opening marker, e.g. `<<`
    pub open: String,

    /// Closing marker, e.g. `>>`
    pub close: String,
}

impl Delimiters {
    /// Create delimiters from opening and closing markers.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Turn a field name into its token. Names that are already wrapped
    /// are returned unchanged.
    pub fn wrap(&self, name: &str) -> String {
        if self.is_wrapped(name) {
            name.to_string()
        } else {
            format!("{}{}{}", self.open, name, self.close)
        }
    }

    fn is_wrapped(&self, s: &str) -> bool {
        s.len() > self.open.len() + self.close.len()
            && s.starts_with(&self.open)
            && s.ends_with(&self.close)
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("<<", ">>")
    }
}

/// Mapping from placeholder token to its replacement text.
///
/// Values are already display strings; see [`crate::values`] for turning
/// numbers and dates into text. Empty tokens are ignored since they would
/// match everywhere, including when the map is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct PlaceholderMap {
    entries: BTreeMap<String, String>,
}

impl PlaceholderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from field names, wrapping each with `delimiters`.
    pub fn with_delimiters<K, V>(
        fields: impl IntoIterator<Item = (K, V)>,
        delimiters: &Delimiters,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        fields
            .into_iter()
            .map(|(name, value)| (delimiters.wrap(name.as_ref()), value.into()))
            .collect()
    }

    /// Insert a token and its replacement. Returns the previous value.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let token = token.into();
        if token.is_empty() {
            return None;
        }
        self.entries.insert(token, value.into())
    }

    /// Get the replacement for a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Check whether a token is mapped.
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Number of mapped tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(token, value)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over the mapped tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Check whether any mapped token occurs in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.entries.keys().any(|token| text.contains(token.as_str()))
    }
}

impl From<BTreeMap<String, String>> for PlaceholderMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<PlaceholderMap> for BTreeMap<String, String> {
    fn from(map: PlaceholderMap) -> Self {
        map.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PlaceholderMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (token, value) in iter {
            self.insert(token, value);
        }
    }
}
