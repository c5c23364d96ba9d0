//! Short names the term normalizer expands to fully-qualified identifiers.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Built-in shorthands, consulted after the caller's own entries.
static WELL_KNOWN: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("type", "rdf:type"),
        ("label", "rdfs:label"),
        ("comment", "rdfs:comment"),
        ("range", "rdfs:range"),
        ("domain", "rdfs:domain"),
        ("subClassOf", "rdfs:subClassOf"),
        ("Class", "owl:Class"),
        ("DatatypeProperty", "owl:DatatypeProperty"),
        ("ObjectProperty", "owl:ObjectProperty"),
        ("string", "xsd:string"),
        ("integer", "xsd:integer"),
        ("decimal", "xsd:decimal"),
        ("boolean", "xsd:boolean"),
        ("dateTime", "xsd:dateTime"),
        ("date", "xsd:date"),
    ])
});

const DEFAULT_PREFIX: &str = "@schema";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// Caller-overridable vocabulary.
///
/// ```rust
/// use woql::Vocabulary;
///
/// let vocab = Vocabulary::new().with_entries([("friend", "scm:friend_of")]);
///
/// assert_eq!(vocab.expand("friend"), Some("scm:friend_of"));
/// assert_eq!(vocab.expand("label"), Some("rdfs:label"));
/// assert_eq!(vocab.expand("name"), None);
/// assert_eq!(vocab.prefixed("name"), "@schema:name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    #[serde(default = "default_prefix")]
    default_prefix: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            default_prefix: default_prefix(),
        }
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = prefix.into();
        self
    }

    /// Caller entries, without the well-known table.
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Replaces the caller entries as a whole.
    pub fn set_entries(&mut self, entries: BTreeMap<String, String>) {
        self.entries = entries;
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    pub fn expand(&self, short: &str) -> Option<&str> {
        self.entries
            .get(short)
            .map(String::as_str)
            .or_else(|| WELL_KNOWN.get(short).copied())
    }

    pub fn contains(&self, short: &str) -> bool {
        self.expand(short).is_some()
    }

    /// `name` qualified with the default prefix.
    pub fn prefixed(&self, name: &str) -> String {
        format!("{}:{}", self.default_prefix, name)
    }

    pub fn well_known() -> impl Iterator<Item = (&'static str, &'static str)> {
        WELL_KNOWN.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Vocabulary;

    #[test]
    fn test_expand() {
        let vocab = Vocabulary::new().with_entries([("label", "scm:title"), ("knows", "scm:knows")]);

        let test_cases = vec![
            ("label", Some("scm:title")),
            ("knows", Some("scm:knows")),
            ("type", Some("rdf:type")),
            ("string", Some("xsd:string")),
            ("unknown", None),
        ];

        for (short, expected) in test_cases {
            assert_eq!(vocab.expand(short), expected, "expanding `{}`", short);
        }
    }

    #[test]
    fn test_deserialize() {
        let vocab: Vocabulary = serde_json::from_value(json!({
            "entries": {"knows": "scm:knows"}
        }))
        .unwrap();

        assert_eq!(vocab.default_prefix(), "@schema");
        assert_eq!(vocab.expand("knows"), Some("scm:knows"));

        let vocab: Vocabulary = serde_json::from_value(json!({"default_prefix": "scm"})).unwrap();
        assert_eq!(vocab.prefixed("name"), "scm:name");
        assert!(vocab.entries().is_empty());
    }

    #[test]
    fn test_well_known_is_frozen() {
        let mut vocab = Vocabulary::new();
        vocab.set_entries([("type".to_string(), "scm:kind".to_string())].into());

        assert_eq!(vocab.expand("type"), Some("scm:kind"));
        assert!(Vocabulary::well_known().any(|(k, v)| k == "type" && v == "rdf:type"));
    }
}
