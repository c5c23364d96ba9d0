//! Cursor-based query builder.
//!
//! Every operator fills the node under the cursor. Operators that wrap a
//! sub-query either take it by value or leave an empty child behind and move
//! the cursor into it, so the next call fills the child:
//!
//! ```rust
//! use woql::WoqlQuery;
//! use serde_json::json;
//!
//! let query = WoqlQuery::new().limit(10, None).triple("v:S", "label", "v:L");
//!
//! assert_eq!(query.json()["@type"], json!("Limit"));
//! assert_eq!(query.json()["query"]["@type"], json!("Triple"));
//! ```

mod ops;

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::error::ParameterError;
use crate::printer::Printer;
use crate::term::{normalize, Position, RawTerm};
use crate::vocab::Vocabulary;

pub use ops::{Order, OrderTemplate};

/// Operators that write to the database.
pub const UPDATE_OPERATORS: [&str; 7] = [
    "AddTriple",
    "DeleteTriple",
    "AddQuad",
    "DeleteQuad",
    "InsertDocument",
    "UpdateDocument",
    "DeleteDocument",
];

/// One step from a node to a child node.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Field(&'static str),
    Element(&'static str, usize),
}

fn resolve<'a>(root: &'a Map<String, Value>, path: &[Slot]) -> Option<&'a Map<String, Value>> {
    let mut node = root;
    for slot in path {
        let child = match slot {
            Slot::Field(field) => node.get(*field)?,
            Slot::Element(field, index) => node.get(*field)?.get(*index)?,
        };
        node = child.as_object()?;
    }
    Some(node)
}

fn resolve_mut<'a>(
    root: &'a mut Map<String, Value>,
    path: &[Slot],
) -> Option<&'a mut Map<String, Value>> {
    let mut node = root;
    for slot in path {
        let child = match slot {
            Slot::Field(field) => node.get_mut(*field)?,
            Slot::Element(field, index) => node.get_mut(*field)?.get_mut(*index)?,
        };
        node = child.as_object_mut()?;
    }
    Some(node)
}

/// Whether any node of `json` is a write operator.
///
/// ```rust
/// use serde_json::json;
///
/// assert!(woql::contains_update(&json!({"@type": "Not", "query": {"@type": "AddTriple"}})));
/// assert!(!woql::contains_update(&json!({"@type": "Triple"})));
/// ```
pub fn contains_update(json: &Value) -> bool {
    match json {
        Value::Object(object) => {
            matches!(object.get("@type").and_then(Value::as_str), Some(t) if UPDATE_OPERATORS.contains(&t))
                || object.values().any(contains_update)
        }
        Value::Array(items) => items.iter().any(contains_update),
        _ => false,
    }
}

/// Splices nested `op` nodes into `out`; empty nodes are dropped.
fn splice(op: &str, field: &str, node: Value, out: &mut Vec<Value>) {
    match node {
        Value::Object(mut object) if object.get("@type").and_then(Value::as_str) == Some(op) => {
            if let Some(Value::Array(children)) = object.remove(field) {
                for child in children {
                    splice(op, field, child, out);
                }
            }
        }
        Value::Object(object) if object.is_empty() => {}
        other => out.push(other),
    }
}

/// Query under construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WoqlQuery {
    root: Map<String, Value>,
    cursor: Vec<Slot>,
    errors: Vec<ParameterError>,
    contains_update: bool,
    vocab: Vocabulary,
}

impl WoqlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocabulary(vocab: Vocabulary) -> Self {
        Self {
            vocab,
            ..Self::default()
        }
    }

    /// Adopts an existing tree with the cursor at its root.
    ///
    /// ```rust
    /// use woql::WoqlQuery;
    /// use serde_json::json;
    ///
    /// let query = WoqlQuery::from_json(json!({"@type": "DeleteDocument", "identifier": {"@type": "NodeValue", "node": "doc:x"}}));
    /// assert!(query.contains_update());
    /// assert!(!query.has_errors());
    /// ```
    pub fn from_json(json: Value) -> Self {
        let mut query = Self::new();
        query.contains_update = contains_update(&json);
        match json {
            Value::Object(root) => query.root = root,
            other => query.record("Query", format!("query must be a JSON object, got `{}`", other)),
        }
        query
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn set_vocabulary(&mut self, vocab: Vocabulary) {
        self.vocab = vocab;
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn json(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.root)
    }

    pub fn errors(&self) -> &[ParameterError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn contains_update(&self) -> bool {
        self.contains_update
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Cursor location as a JSON pointer, `""` at the root.
    pub fn cursor_pointer(&self) -> String {
        self.cursor
            .iter()
            .map(|slot| match slot {
                Slot::Field(field) => format!("/{}", field),
                Slot::Element(field, index) => format!("/{}/{}", field, index),
            })
            .collect()
    }

    /// Renders the query as chained source text.
    pub fn render(&self) -> Result<String, crate::error::Error> {
        Printer::new(&self.vocab).render(&self.json())
    }

    fn cursor_type(&self) -> Option<&str> {
        resolve(&self.root, &self.cursor)?
            .get("@type")
            .and_then(Value::as_str)
    }

    /// Runs `f` on the node under the cursor.
    fn with_cursor<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Map<String, Value>) -> R,
    {
        match resolve_mut(&mut self.root, &self.cursor) {
            Some(node) => f(node),
            None => {
                warn!(cursor = %self.cursor_pointer(), "cursor no longer resolves, resetting to root");
                self.cursor.clear();
                f(&mut self.root)
            }
        }
    }

    fn record(&mut self, kind: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(kind, %message, "parameter error");
        self.errors.push(ParameterError {
            kind: kind.to_string(),
            message,
        });
    }

    /// Takes over errors and the update flag of a sub-builder.
    fn absorb(&mut self, query: &WoqlQuery) {
        self.errors.extend(query.errors.iter().cloned());
        self.contains_update |= query.contains_update;
    }

    fn adopt(&mut self, query: WoqlQuery) -> Value {
        self.absorb(&query);
        query.into_json()
    }

    fn clean(&mut self, kind: &str, raw: RawTerm, position: Position) -> Value {
        if let RawTerm::Query(query) = &raw {
            self.absorb(query);
        }
        match normalize(&raw, position, &self.vocab) {
            Ok(value) => value,
            Err(err) => {
                self.record(kind, err.message);
                err.fallback
            }
        }
    }

    /// Moves the cursor to a fresh conjunct next to the filled node under it.
    fn wrap_cursor_with_and(&mut self) {
        if let Some(Slot::Element("and", _)) = self.cursor.last() {
            self.cursor.pop();
        }
        if self.cursor_type() == Some("And") {
            let index = self.with_cursor(|node| {
                let mut children = match node.remove("and") {
                    Some(Value::Array(children)) => children,
                    _ => Vec::new(),
                };
                children.push(Value::Object(Map::new()));
                let index = children.len() - 1;
                node.insert("and".to_string(), Value::Array(children));
                index
            });
            self.cursor.push(Slot::Element("and", index));
        } else {
            self.with_cursor(|node| {
                let previous = std::mem::take(node);
                node.insert("@type".to_string(), Value::from("And"));
                node.insert(
                    "and".to_string(),
                    Value::Array(vec![Value::Object(previous), Value::Object(Map::new())]),
                );
            });
            self.cursor.push(Slot::Element("and", 1));
        }
        trace!(cursor = %self.cursor_pointer(), "cursor moved to new conjunct");
    }

    /// Writes `op` and its fields into the cursor, conjoining with whatever is already there.
    fn emit(&mut self, op: &str, fields: Vec<(&'static str, Value)>) {
        if self.cursor_type().is_some() {
            self.wrap_cursor_with_and();
        }
        if UPDATE_OPERATORS.contains(&op) {
            self.contains_update = true;
        }
        self.with_cursor(|node| {
            node.insert("@type".to_string(), Value::from(op));
            for (field, value) in fields {
                node.insert(field.to_string(), value);
            }
        });
    }

    /// Attaches `query` under `field`, or an empty child the cursor moves into.
    fn add_sub_query(&mut self, field: &'static str, query: Option<WoqlQuery>) {
        match query {
            Some(query) => {
                let child = self.adopt(query);
                self.with_cursor(|node| node.insert(field.to_string(), child));
            }
            None => {
                self.with_cursor(|node| node.insert(field.to_string(), Value::Object(Map::new())));
                self.cursor.push(Slot::Field(field));
                trace!(cursor = %self.cursor_pointer(), "cursor moved into sub-query");
            }
        }
    }

    /// Shared body of `and` and `or`.
    fn combine(&mut self, op: &'static str, field: &'static str, queries: Vec<WoqlQuery>) {
        let mut children = Vec::new();
        for query in queries {
            let child = self.adopt(query);
            splice(op, field, child, &mut children);
        }

        if op == "And" && self.cursor_type().is_some() {
            if let Some(Slot::Element("and", _)) = self.cursor.last() {
                self.cursor.pop();
            }
        }

        let current = self.cursor_type().map(str::to_string);
        match current.as_deref() {
            None => self.with_cursor(|node| {
                node.insert("@type".to_string(), Value::from(op));
                node.insert(field.to_string(), Value::Array(children));
            }),
            Some(current) if current == op => self.with_cursor(|node| {
                let mut existing = match node.remove(field) {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::new(),
                };
                existing.extend(children);
                node.insert(field.to_string(), Value::Array(existing));
            }),
            Some(_) if op == "And" => self.with_cursor(|node| {
                let previous = Value::Object(std::mem::take(node));
                let mut conjuncts = vec![previous];
                conjuncts.extend(children);
                node.insert("@type".to_string(), Value::from(op));
                node.insert(field.to_string(), Value::Array(conjuncts));
            }),
            Some(_) => self.emit(op, vec![(field, Value::Array(children))]),
        }
    }
}

impl Serialize for WoqlQuery {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root.serialize(serializer)
    }
}

impl fmt::Display for WoqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::WoqlQuery;
    use crate::error::ParameterError;

    #[test]
    fn test_cursor_relocation() {
        let query = WoqlQuery::new().and(vec![]).triple("a", "b", "c");

        assert_eq!(
            query.json(),
            json!({
                "@type": "And",
                "and": [{
                    "@type": "Triple",
                    "subject": {"@type": "NodeValue", "node": "a"},
                    "predicate": {"@type": "NodeValue", "node": "@schema:b"},
                    "object": {"@type": "Value", "data": {"@type": "xsd:string", "@value": "c"}},
                }],
            })
        );
        assert_eq!(query.cursor_pointer(), "/and/0");
    }

    #[test]
    fn test_chained_calls_conjoin() {
        let query = WoqlQuery::new()
            .triple("v:A", "b", "v:C")
            .triple("v:C", "d", "v:E")
            .triple("v:E", "f", "v:G");

        let json = query.json();
        assert_eq!(json["@type"], json!("And"));
        let conjuncts = json["and"].as_array().unwrap();
        assert_eq!(conjuncts.len(), 3);
        assert!(conjuncts.iter().all(|c| c["@type"] == json!("Triple")));
        assert_eq!(conjuncts[2]["subject"], json!({"@type": "NodeValue", "variable": "E"}));
    }

    #[test]
    fn test_sub_query_cursor() {
        let query = WoqlQuery::new()
            .select(["v:X"], None)
            .opt(None)
            .triple("v:X", "label", "v:L")
            .triple("v:X", "comment", "v:C");

        let json = query.json();
        assert_eq!(json["@type"], json!("Select"));
        assert_eq!(json["variables"], json!(["X"]));
        assert_eq!(json["query"]["@type"], json!("Optional"));
        let inner = &json["query"]["query"];
        assert_eq!(inner["@type"], json!("And"));
        assert_eq!(inner["and"][0]["predicate"]["node"], json!("rdfs:label"));
        assert_eq!(inner["and"][1]["predicate"]["node"], json!("rdfs:comment"));
        assert_eq!(query.cursor_pointer(), "/query/query/and/1");
    }

    #[test]
    fn test_flattening() {
        let a = || WoqlQuery::new().triple("v:A", "p", "v:B");
        let b = || WoqlQuery::new().triple("v:B", "p", "v:C");
        let c = || WoqlQuery::new().triple("v:C", "p", "v:D");

        let nested = WoqlQuery::new().and(vec![WoqlQuery::new().and(vec![a(), b()]), c()]);
        let flat = WoqlQuery::new().and(vec![a(), b(), c()]);
        assert_eq!(nested.json(), flat.json());
        assert_eq!(flat.json()["and"].as_array().unwrap().len(), 3);

        let deep = WoqlQuery::new().and(vec![
            WoqlQuery::new().and(vec![WoqlQuery::new().and(vec![a(), b()])]),
            c(),
        ]);
        assert_eq!(deep.json(), flat.json());

        let raw = WoqlQuery::from_json(json!({"@type": "Or", "or": [
            {"@type": "Or", "or": [{"@type": "Or", "or": [a().json()]}, b().json()]},
        ]}));
        let flat_or = WoqlQuery::new().or(vec![raw, c()]);
        assert_eq!(flat_or.json()["or"], json!([a().json(), b().json(), c().json()]));
    }

    #[test]
    fn test_and_absorbs_current_node() {
        let query = WoqlQuery::new()
            .triple("v:A", "p", "v:B")
            .and(vec![WoqlQuery::new().triple("v:B", "p", "v:C")]);

        let json = query.json();
        assert_eq!(json["@type"], json!("And"));
        assert_eq!(json["and"][0]["subject"]["variable"], json!("A"));
        assert_eq!(json["and"][1]["subject"]["variable"], json!("B"));
    }

    #[test]
    fn test_update_propagation() {
        let test_cases = vec![
            (WoqlQuery::new().triple("v:A", "p", "v:B"), false),
            (WoqlQuery::new().add_triple("doc:a", "p", "v:B"), true),
            (
                WoqlQuery::new().and(vec![
                    WoqlQuery::new().triple("v:A", "p", "v:B"),
                    WoqlQuery::new().opt(Some(WoqlQuery::new().select(
                        ["v:A"],
                        Some(WoqlQuery::new().delete_quad("v:A", "p", "v:B", "instance")),
                    ))),
                ]),
                true,
            ),
            (
                WoqlQuery::new()
                    .when(WoqlQuery::new().triple("v:A", "p", "v:B"), None)
                    .insert_document(json!({"@type": "Person"}), None),
                true,
            ),
            (
                WoqlQuery::new().select(["v:A"], None).not(None).triple("v:A", "p", "v:B"),
                false,
            ),
            (
                WoqlQuery::from_json(json!({"@type": "And", "and": [{"@type": "Or", "or": [
                    {"@type": "UpdateDocument"}
                ]}]})),
                true,
            ),
        ];

        for (query, expected) in test_cases {
            assert_eq!(query.contains_update(), expected, "{}", query.json());
            assert_eq!(super::contains_update(&query.json()), expected);
        }
    }

    #[test]
    fn test_errors_are_recorded() {
        let query = WoqlQuery::new()
            .triple(1, "p", "v:B")
            .select(Vec::<&str>::new(), None)
            .path("v:A", "(a,b", "v:B", None);

        assert!(query.has_errors());
        let kinds: Vec<&str> = query.errors().iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Triple", "Select", "Path"]);

        let json = query.json();
        assert_eq!(json["and"][0]["subject"], json!({"@type": "NodeValue", "node": "1"}));
        assert!(json["and"][1]["query"].get("pattern").is_none());
    }

    #[test]
    fn test_sub_builder_errors_merge() {
        let inner = WoqlQuery::new().triple(true, "p", "v:B");
        let query = WoqlQuery::new().not(Some(inner));

        assert_eq!(
            query.errors(),
            &[ParameterError {
                kind: "Triple".to_string(),
                message: "boolean `true` is not allowed as NodeValue".to_string(),
            }]
        );
    }

    #[test]
    fn test_from_json_non_object() {
        let query = WoqlQuery::from_json(json!([1, 2]));
        assert!(query.has_errors());
        assert!(query.is_empty());
    }

    #[test]
    fn test_serialize() {
        let query = WoqlQuery::new().true_();
        assert_eq!(serde_json::to_string(&query).unwrap(), r#"{"@type":"True"}"#);
    }
}
