//! Term normalization: raw arguments to tagged value wrappers.
//!
//! | input | Subject/Node | Predicate/Class | Object | Data/Arithmetic |
//! |-------|--------------|-----------------|--------|-----------------|
//! | `"v:X"` | variable | variable | variable | variable |
//! | `"scm:x"` | node | node | node | data |
//! | vocabulary key | node (expanded) | node (expanded) | node (expanded) | data |
//! | `"plain"` | node | node `@schema:plain` | data | data |
//! | number, bool | error | error | data | data |

use std::fmt;

use serde_json::{json, Map, Number, Value};
use thiserror::Error;

use crate::query::WoqlQuery;
use crate::vocab::Vocabulary;

pub const VARIABLE_MARKER: &str = "v:";

pub const XSD_STRING: &str = "xsd:string";
pub const XSD_DECIMAL: &str = "xsd:decimal";
pub const XSD_BOOLEAN: &str = "xsd:boolean";
pub const SYS_JSON: &str = "sys:JSON";

/// Nodes allowed as-is in arithmetic position.
pub const ARITHMETIC_OPERATORS: [&str; 7] = ["Plus", "Minus", "Times", "Divide", "Div", "Exp", "Floor"];

/// Wrapper flavour, stored as the wrapper's `@type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    NodeValue,
    Value,
    DataValue,
    ArithmeticValue,
}

impl TermKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermKind::NodeValue => "NodeValue",
            TermKind::Value => "Value",
            TermKind::DataValue => "DataValue",
            TermKind::ArithmeticValue => "ArithmeticValue",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "NodeValue" => Some(TermKind::NodeValue),
            "Value" => Some(TermKind::Value),
            "DataValue" => Some(TermKind::DataValue),
            "ArithmeticValue" => Some(TermKind::ArithmeticValue),
            _ => None,
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed literal, `{"@type": datatype, "@value": value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub datatype: String,
    pub value: Value,
}

impl Literal {
    pub fn new(datatype: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            datatype: datatype.into(),
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(XSD_STRING, value.into())
    }

    fn to_json(&self) -> Value {
        json!({"@type": self.datatype, "@value": self.value})
    }

    fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let datatype = object.get("@type")?.as_str()?;
        let value = object.get("@value")?;
        if TermKind::parse(datatype).is_some() {
            return None;
        }
        Some(Self::new(datatype, value.clone()))
    }
}

/// The one payload a wrapper carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Node(String),
    Variable(String),
    Data(Literal),
    List(Vec<Value>),
}

/// Value wrapper: a kind plus exactly one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub payload: Payload,
}

pub const PAYLOAD_KEYS: [&str; 4] = ["node", "variable", "data", "list"];

impl Term {
    pub fn new(kind: TermKind, payload: Payload) -> Self {
        Self { kind, payload }
    }

    /// Reads a wrapper back; `None` unless it has a wrapper `@type` and exactly one payload.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let kind = TermKind::parse(object.get("@type")?.as_str()?)?;
        let mut present = PAYLOAD_KEYS.iter().filter(|key| object.contains_key(**key));
        let key = present.next()?;
        if present.next().is_some() {
            return None;
        }
        let payload = match (*key, &object[*key]) {
            ("node", Value::String(node)) => Payload::Node(node.clone()),
            ("variable", Value::String(var)) => Payload::Variable(var.clone()),
            ("data", data) => Payload::Data(Literal::from_json(data)?),
            ("list", Value::Array(items)) => Payload::List(items.clone()),
            _ => return None,
        };
        Some(Self { kind, payload })
    }
}

impl From<Term> for Value {
    fn from(term: Term) -> Self {
        let mut object = Map::new();
        object.insert("@type".to_string(), Value::from(term.kind.as_str()));
        let (key, value) = match term.payload {
            Payload::Node(node) => ("node", Value::String(node)),
            Payload::Variable(var) => ("variable", Value::String(var)),
            Payload::Data(literal) => ("data", literal.to_json()),
            Payload::List(items) => ("list", Value::Array(items)),
        };
        object.insert(key.to_string(), value);
        Value::Object(object)
    }
}

/// Argument slot a raw term is normalized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Predicate,
    Object,
    Node,
    Class,
    Data,
    Arithmetic,
}

impl Position {
    pub fn kind(&self) -> TermKind {
        match self {
            Position::Subject | Position::Predicate | Position::Node | Position::Class => {
                TermKind::NodeValue
            }
            Position::Object => TermKind::Value,
            Position::Data => TermKind::DataValue,
            Position::Arithmetic => TermKind::ArithmeticValue,
        }
    }

    pub fn admits_node(&self) -> bool {
        !matches!(self, Position::Data | Position::Arithmetic)
    }

    pub fn admits_literal(&self) -> bool {
        matches!(self, Position::Object | Position::Data | Position::Arithmetic)
    }

    pub fn admits_list(&self) -> bool {
        matches!(self, Position::Object | Position::Data)
    }

    /// Plain names get the default prefix here.
    pub fn expands_prefix(&self) -> bool {
        matches!(self, Position::Predicate | Position::Class)
    }
}

/// Operator argument before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTerm {
    Str(String),
    Num(Number),
    Bool(bool),
    /// Explicit IRI, never read as a variable or literal.
    Node(String),
    List(Vec<RawTerm>),
    /// JSON document, stored as a `sys:JSON` literal.
    Document(Value),
    /// Already-tagged JSON.
    Wrapped(Value),
    Query(Box<WoqlQuery>),
}

impl From<&str> for RawTerm {
    fn from(s: &str) -> Self {
        RawTerm::Str(s.to_string())
    }
}

impl From<String> for RawTerm {
    fn from(s: String) -> Self {
        RawTerm::Str(s)
    }
}

impl From<&String> for RawTerm {
    fn from(s: &String) -> Self {
        RawTerm::Str(s.clone())
    }
}

impl From<bool> for RawTerm {
    fn from(b: bool) -> Self {
        RawTerm::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawTerm {
                fn from(n: $t) -> Self {
                    RawTerm::Num(Number::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<f64> for RawTerm {
    fn from(n: f64) -> Self {
        match Number::from_f64(n) {
            Some(n) => RawTerm::Num(n),
            None => RawTerm::Wrapped(Value::Null),
        }
    }
}

impl From<Value> for RawTerm {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawTerm::Str(s),
            Value::Number(n) => RawTerm::Num(n),
            Value::Bool(b) => RawTerm::Bool(b),
            Value::Array(items) => RawTerm::List(items.into_iter().map(RawTerm::from).collect()),
            other => RawTerm::Wrapped(other),
        }
    }
}

impl From<Term> for RawTerm {
    fn from(term: Term) -> Self {
        RawTerm::Wrapped(term.into())
    }
}

impl From<WoqlQuery> for RawTerm {
    fn from(query: WoqlQuery) -> Self {
        RawTerm::Query(Box::new(query))
    }
}

/// Plain JSON for a raw term, helpers and queries included.
impl From<&RawTerm> for Value {
    fn from(raw: &RawTerm) -> Self {
        match raw {
            RawTerm::Str(s) | RawTerm::Node(s) => Value::String(s.clone()),
            RawTerm::Num(n) => Value::Number(n.clone()),
            RawTerm::Bool(b) => Value::Bool(*b),
            RawTerm::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            RawTerm::Document(value) | RawTerm::Wrapped(value) => value.clone(),
            RawTerm::Query(query) => query.json(),
        }
    }
}

impl<T: Into<RawTerm>> From<Vec<T>> for RawTerm {
    fn from(items: Vec<T>) -> Self {
        RawTerm::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RawTerm>, const N: usize> From<[T; N]> for RawTerm {
    fn from(items: [T; N]) -> Self {
        RawTerm::List(items.into_iter().map(Into::into).collect())
    }
}

/// Explicit IRI.
pub fn iri(name: impl Into<String>) -> RawTerm {
    RawTerm::Node(name.into())
}

/// Typed literal.
///
/// ```rust
/// use woql::term::{literal, normalize, Position};
/// use woql::Vocabulary;
/// use serde_json::json;
///
/// let term = normalize(&literal("2021-01-01", "xsd:date"), Position::Object, &Vocabulary::new());
/// assert_eq!(term, Ok(json!({"@type": "Value", "data": {"@type": "xsd:date", "@value": "2021-01-01"}})));
/// ```
pub fn literal(value: impl Into<Value>, datatype: &str) -> RawTerm {
    RawTerm::Wrapped(Literal::new(datatype, value).to_json())
}

/// JSON document argument.
pub fn doc(document: Value) -> RawTerm {
    RawTerm::Document(document)
}

/// Normalization failure with the best-effort wrapper used in its place.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TermError {
    pub message: String,
    pub fallback: Value,
}

impl TermError {
    fn coerced(message: String, text: String, position: Position) -> Self {
        let payload = if position.admits_node() {
            Payload::Node(text)
        } else {
            Payload::Data(Literal::string(text))
        };
        Self {
            message,
            fallback: Term::new(position.kind(), payload).into(),
        }
    }
}

fn is_wrapper(object: &Map<String, Value>) -> bool {
    matches!(object.get("@type").and_then(Value::as_str), Some(t) if TermKind::parse(t).is_some())
}

fn is_arithmetic(object: &Map<String, Value>) -> bool {
    matches!(object.get("@type").and_then(Value::as_str), Some(t) if ARITHMETIC_OPERATORS.contains(&t))
}

fn normalize_str(s: &str, position: Position, vocab: &Vocabulary) -> Payload {
    if let Some(var) = s.strip_prefix(VARIABLE_MARKER) {
        return Payload::Variable(var.to_string());
    }
    if position.admits_node() {
        if s.contains(':') {
            return Payload::Node(s.to_string());
        }
        if let Some(expanded) = vocab.expand(s) {
            return Payload::Node(expanded.to_string());
        }
    }
    if position.admits_literal() {
        return Payload::Data(Literal::string(s));
    }
    if position.expands_prefix() {
        return Payload::Node(vocab.prefixed(s));
    }
    Payload::Node(s.to_string())
}

fn normalize_wrapped(value: &Value, position: Position) -> Result<Value, TermError> {
    if let Value::Object(object) = value {
        if is_wrapper(object) && Term::from_json(value).is_some() {
            return Ok(value.clone());
        }
        if position == Position::Arithmetic && is_arithmetic(object) {
            return Ok(value.clone());
        }
        if position.admits_literal() {
            if let Some(literal) = Literal::from_json(value) {
                return Ok(Term::new(position.kind(), Payload::Data(literal)).into());
            }
        }
    }
    Err(TermError::coerced(
        format!("unrecognized term `{}` as {}", value, position.kind()),
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        position,
    ))
}

/// Wraps `raw` for `position`.
///
/// Already-wrapped input comes back unchanged.
///
/// ```rust
/// use woql::term::{normalize, Position};
/// use woql::Vocabulary;
/// use serde_json::json;
///
/// let vocab = Vocabulary::new();
///
/// assert_eq!(normalize(&"v:S".into(), Position::Subject, &vocab), Ok(json!({"@type": "NodeValue", "variable": "S"})));
/// assert_eq!(normalize(&"label".into(), Position::Predicate, &vocab), Ok(json!({"@type": "NodeValue", "node": "rdfs:label"})));
/// assert_eq!(normalize(&"name".into(), Position::Predicate, &vocab), Ok(json!({"@type": "NodeValue", "node": "@schema:name"})));
/// assert_eq!(normalize(&42.into(), Position::Data, &vocab), Ok(json!({"@type": "DataValue", "data": {"@type": "xsd:decimal", "@value": 42}})));
/// assert!(normalize(&42.into(), Position::Subject, &vocab).is_err());
/// ```
pub fn normalize(raw: &RawTerm, position: Position, vocab: &Vocabulary) -> Result<Value, TermError> {
    let kind = position.kind();
    let payload = match raw {
        RawTerm::Str(s) => normalize_str(s, position, vocab),
        RawTerm::Num(n) if position.admits_literal() => {
            Payload::Data(Literal::new(XSD_DECIMAL, Value::Number(n.clone())))
        }
        RawTerm::Bool(b) if position.admits_literal() => Payload::Data(Literal::new(XSD_BOOLEAN, *b)),
        RawTerm::Num(n) => {
            return Err(TermError::coerced(
                format!("number `{}` is not allowed as {}", n, kind),
                n.to_string(),
                position,
            ))
        }
        RawTerm::Bool(b) => {
            return Err(TermError::coerced(
                format!("boolean `{}` is not allowed as {}", b, kind),
                b.to_string(),
                position,
            ))
        }
        RawTerm::Node(node) => Payload::Node(node.clone()),
        RawTerm::List(items) if position.admits_list() => {
            let mut list = Vec::with_capacity(items.len());
            let mut failure = None;
            for item in items {
                match normalize(item, position, vocab) {
                    Ok(value) => list.push(value),
                    Err(err) => {
                        list.push(err.fallback);
                        failure.get_or_insert(err.message);
                    }
                }
            }
            if let Some(message) = failure {
                return Err(TermError {
                    message,
                    fallback: Term::new(kind, Payload::List(list)).into(),
                });
            }
            Payload::List(list)
        }
        RawTerm::List(_) => {
            return Err(TermError::coerced(
                format!("list is not allowed as {}", kind),
                Value::from(raw).to_string(),
                position,
            ))
        }
        RawTerm::Document(document) if position.admits_list() => {
            Payload::Data(Literal::new(SYS_JSON, document.clone()))
        }
        RawTerm::Document(document) => {
            return Err(TermError::coerced(
                format!("document is not allowed as {}", kind),
                document.to_string(),
                position,
            ))
        }
        RawTerm::Wrapped(value) => return normalize_wrapped(value, position),
        RawTerm::Query(query) => return normalize_wrapped(&query.json(), position),
    };
    Ok(Term::new(kind, payload).into())
}

pub fn clean_subject(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Subject, vocab)
}

pub fn clean_predicate(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Predicate, vocab)
}

pub fn clean_object(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Object, vocab)
}

pub fn clean_node_value(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Node, vocab)
}

pub fn clean_class(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Class, vocab)
}

pub fn clean_data_value(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Data, vocab)
}

pub fn clean_arithmetic_value(raw: &RawTerm, vocab: &Vocabulary) -> Result<Value, TermError> {
    normalize(raw, Position::Arithmetic, vocab)
}

/// Graph identifiers are raw strings.
pub fn clean_graph(raw: &RawTerm) -> Result<String, TermError> {
    match raw {
        RawTerm::Str(s) | RawTerm::Node(s) => Ok(s.clone()),
        other => Err(TermError {
            message: format!("graph must be a string, got {:?}", other),
            fallback: Value::String(String::new()),
        }),
    }
}

/// Variable name without the `v:` marker.
pub fn raw_var(raw: &RawTerm) -> Result<String, TermError> {
    match raw {
        RawTerm::Str(s) => Ok(s.strip_prefix(VARIABLE_MARKER).unwrap_or(s).to_string()),
        RawTerm::Wrapped(value) => match Term::from_json(value) {
            Some(Term {
                payload: Payload::Variable(var),
                ..
            }) => Ok(var),
            _ => Err(TermError {
                message: format!("expected a variable, got `{}`", value),
                fallback: Value::String(value.to_string()),
            }),
        },
        other => Err(TermError {
            message: format!("expected a variable, got {:?}", other),
            fallback: Value::String(String::new()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{
        clean_graph, doc, iri, literal, normalize, raw_var, Position, RawTerm, Term, PAYLOAD_KEYS,
    };
    use crate::query::WoqlQuery;
    use crate::vocab::Vocabulary;

    fn payload_count(value: &Value) -> usize {
        PAYLOAD_KEYS
            .iter()
            .filter(|key| value.get(**key).is_some())
            .count()
    }

    #[test]
    fn test_normalize() {
        let vocab = Vocabulary::new().with_entries([("knows", "scm:knows")]);

        let test_cases: Vec<(RawTerm, Position, Value)> = vec![
            (
                "v:S".into(),
                Position::Subject,
                json!({"@type": "NodeValue", "variable": "S"}),
            ),
            (
                "v:X".into(),
                Position::Arithmetic,
                json!({"@type": "ArithmeticValue", "variable": "X"}),
            ),
            (
                "doc:Jane".into(),
                Position::Subject,
                json!({"@type": "NodeValue", "node": "doc:Jane"}),
            ),
            (
                "Jane".into(),
                Position::Subject,
                json!({"@type": "NodeValue", "node": "Jane"}),
            ),
            (
                "knows".into(),
                Position::Predicate,
                json!({"@type": "NodeValue", "node": "scm:knows"}),
            ),
            (
                "name".into(),
                Position::Predicate,
                json!({"@type": "NodeValue", "node": "@schema:name"}),
            ),
            (
                "Person".into(),
                Position::Class,
                json!({"@type": "NodeValue", "node": "@schema:Person"}),
            ),
            (
                "hello".into(),
                Position::Object,
                json!({"@type": "Value", "data": {"@type": "xsd:string", "@value": "hello"}}),
            ),
            (
                "scm:Person".into(),
                Position::Object,
                json!({"@type": "Value", "node": "scm:Person"}),
            ),
            (
                "a:b".into(),
                Position::Data,
                json!({"@type": "DataValue", "data": {"@type": "xsd:string", "@value": "a:b"}}),
            ),
            (
                2.5.into(),
                Position::Arithmetic,
                json!({"@type": "ArithmeticValue", "data": {"@type": "xsd:decimal", "@value": 2.5}}),
            ),
            (
                true.into(),
                Position::Object,
                json!({"@type": "Value", "data": {"@type": "xsd:boolean", "@value": true}}),
            ),
            (
                iri("Jane"),
                Position::Object,
                json!({"@type": "Value", "node": "Jane"}),
            ),
            (
                literal("2021", "xsd:gYear"),
                Position::Data,
                json!({"@type": "DataValue", "data": {"@type": "xsd:gYear", "@value": "2021"}}),
            ),
            (
                doc(json!({"name": "Jane"})),
                Position::Object,
                json!({"@type": "Value", "data": {"@type": "sys:JSON", "@value": {"name": "Jane"}}}),
            ),
            (
                vec!["v:A", "b"].into(),
                Position::Data,
                json!({"@type": "DataValue", "list": [
                    {"@type": "DataValue", "variable": "A"},
                    {"@type": "DataValue", "data": {"@type": "xsd:string", "@value": "b"}},
                ]}),
            ),
            (
                json!({"@type": "Plus", "left": 1, "right": 2}).into(),
                Position::Arithmetic,
                json!({"@type": "Plus", "left": 1, "right": 2}),
            ),
        ];

        for (raw, position, expected) in test_cases {
            let actual = normalize(&raw, position, &vocab);
            assert_eq!(actual, Ok(expected), "normalizing {:?} as {:?}", raw, position);
        }
    }

    #[test]
    fn test_normalize_errors() {
        let vocab = Vocabulary::new();

        let test_cases: Vec<(RawTerm, Position, Value)> = vec![
            (
                1.into(),
                Position::Subject,
                json!({"@type": "NodeValue", "node": "1"}),
            ),
            (
                vec!["a"].into(),
                Position::Predicate,
                json!({"@type": "NodeValue", "node": "[\"a\"]"}),
            ),
            (
                vec![RawTerm::from(1), iri("b"), vec![true].into()].into(),
                Position::Class,
                json!({"@type": "NodeValue", "node": "[1,\"b\",[true]]"}),
            ),
            (
                Vec::<RawTerm>::new().into(),
                Position::Arithmetic,
                json!({"@type": "ArithmeticValue", "data": {"@type": "xsd:string", "@value": "[]"}}),
            ),
            (
                json!({"name": "x"}).into(),
                Position::Data,
                json!({"@type": "DataValue", "data": {"@type": "xsd:string", "@value": "{\"name\":\"x\"}"}}),
            ),
            (
                json!(null).into(),
                Position::Object,
                json!({"@type": "Value", "node": "null"}),
            ),
        ];

        for (raw, position, fallback) in test_cases {
            let err = normalize(&raw, position, &vocab).unwrap_err();
            assert_eq!(err.fallback, fallback, "fallback for {:?}", raw);
            assert!(!err.message.is_empty());
        }
    }

    #[test]
    fn test_idempotent() {
        let vocab = Vocabulary::new();
        let positions = [
            Position::Subject,
            Position::Predicate,
            Position::Object,
            Position::Node,
            Position::Class,
            Position::Data,
            Position::Arithmetic,
        ];
        let inputs: Vec<RawTerm> = vec![
            "v:X".into(),
            "scm:x".into(),
            "label".into(),
            "plain".into(),
            7.into(),
            false.into(),
            vec!["a", "v:b"].into(),
            doc(json!({"a": 1})),
        ];

        for position in positions {
            for input in &inputs {
                let Ok(wrapped) = normalize(input, position, &vocab) else {
                    continue;
                };
                assert_eq!(payload_count(&wrapped), 1, "{}", wrapped);
                assert!(Term::from_json(&wrapped).is_some());
                let again = normalize(&RawTerm::Wrapped(wrapped.clone()), position, &vocab);
                assert_eq!(again, Ok(wrapped));
            }
        }
    }

    #[test]
    fn test_does_not_mutate_argument() {
        let raw = RawTerm::from(json!({"@type": "Value", "variable": "X"}));
        let before = raw.clone();
        let _ = normalize(&raw, Position::Object, &Vocabulary::new());
        assert_eq!(raw, before);
    }

    #[test]
    fn test_query_argument() {
        let sum = WoqlQuery::new().plus("v:A", 1);
        let wrapped = normalize(&sum.clone().into(), Position::Arithmetic, &Vocabulary::new());
        assert_eq!(wrapped, Ok(sum.json()));
    }

    #[test]
    fn test_raw_helpers() {
        assert_eq!(clean_graph(&"instance/main".into()), Ok("instance/main".to_string()));
        assert!(clean_graph(&1.into()).is_err());
        assert_eq!(raw_var(&"v:X".into()), Ok("X".to_string()));
        assert_eq!(raw_var(&"X".into()), Ok("X".to_string()));
        assert_eq!(
            raw_var(&json!({"@type": "Value", "variable": "Y"}).into()),
            Ok("Y".to_string())
        );
        assert!(raw_var(&2.into()).is_err());
    }
}
