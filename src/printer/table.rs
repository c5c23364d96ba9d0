//! Operator layouts: call name and argument order for every `@type`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::term::Position;

/// How one argument is taken from the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    /// Value wrapper normalized for the position.
    Term(&'static str, Position),
    /// Raw JSON scalar: limits, graphs, resources.
    Scalar(&'static str),
    /// Variable names, one argument each.
    Vars(&'static str),
    /// Variable names; a single name is written without brackets.
    VarList(&'static str),
    /// `xsd:string` literal written as its string.
    Comment(&'static str),
    /// Path pattern, decompiled.
    Pattern(&'static str),
    /// Order templates, one argument each.
    Ordering(&'static str),
    /// Sub-query written inline.
    Query(&'static str),
    /// Sub-queries, one argument each.
    Queries(&'static str),
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Term(name, _)
            | Field::Scalar(name)
            | Field::Vars(name)
            | Field::VarList(name)
            | Field::Comment(name)
            | Field::Pattern(name)
            | Field::Ordering(name)
            | Field::Query(name)
            | Field::Queries(name) => *name,
        }
    }

    /// Variadic fields never need a placeholder.
    pub fn is_variadic(&self) -> bool {
        matches!(self, Field::Vars(_) | Field::Ordering(_) | Field::Queries(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub args: Vec<Field>,
    /// Sub-query written as a `.call()` continuation.
    pub chain: Option<&'static str>,
    /// One argument per line when there is more than one.
    pub block: bool,
}

impl Layout {
    fn call(args: Vec<Field>) -> Self {
        Self {
            args,
            chain: None,
            block: false,
        }
    }

    fn chained(args: Vec<Field>, chain: &'static str) -> Self {
        Self {
            args,
            chain: Some(chain),
            block: false,
        }
    }

    fn block(args: Vec<Field>) -> Self {
        Self {
            args,
            chain: None,
            block: true,
        }
    }
}

fn data(names: &[&'static str]) -> Vec<Field> {
    names.iter().map(|name| Field::Term(*name, Position::Data)).collect()
}

fn arithmetic(names: &[&'static str]) -> Vec<Field> {
    names
        .iter()
        .map(|name| Field::Term(*name, Position::Arithmetic))
        .collect()
}

fn triple() -> Layout {
    Layout::call(vec![
        Field::Term("subject", Position::Subject),
        Field::Term("predicate", Position::Predicate),
        Field::Term("object", Position::Object),
        Field::Scalar("graph"),
    ])
}

pub static LAYOUTS: Lazy<HashMap<&'static str, Layout>> = Lazy::new(|| {
    use Field::*;
    use Position::*;

    HashMap::from([
        ("And", Layout::block(vec![Queries("and")])),
        ("Or", Layout::block(vec![Queries("or")])),
        ("Not", Layout::chained(vec![], "query")),
        ("Optional", Layout::chained(vec![], "query")),
        ("Select", Layout::chained(vec![Vars("variables")], "query")),
        ("Distinct", Layout::chained(vec![Vars("variables")], "query")),
        ("Limit", Layout::chained(vec![Scalar("limit")], "query")),
        ("Start", Layout::chained(vec![Scalar("start")], "query")),
        ("From", Layout::chained(vec![Scalar("graph")], "query")),
        ("Into", Layout::chained(vec![Scalar("graph")], "query")),
        ("Using", Layout::chained(vec![Scalar("collection")], "query")),
        ("Comment", Layout::chained(vec![Comment("comment")], "query")),
        ("When", Layout::chained(vec![Query("query")], "consequent")),
        ("Immediately", Layout::chained(vec![], "query")),
        ("Once", Layout::chained(vec![], "query")),
        ("Count", Layout::chained(vec![Term("count", Data)], "query")),
        ("OrderBy", Layout::chained(vec![Ordering("ordering")], "query")),
        (
            "GroupBy",
            Layout::chained(
                vec![VarList("group_by"), VarList("template"), Term("grouped", Object)],
                "query",
            ),
        ),
        ("Triple", triple()),
        ("AddedTriple", triple()),
        ("DeletedTriple", triple()),
        ("AddTriple", triple()),
        ("DeleteTriple", triple()),
        (
            "Subsumption",
            Layout::call(vec![Term("parent", Class), Term("child", Class)]),
        ),
        (
            "IsA",
            Layout::call(vec![Term("element", Subject), Term("type", Class)]),
        ),
        (
            "Equals",
            Layout::call(vec![Term("left", Object), Term("right", Object)]),
        ),
        ("Less", Layout::call(data(&["left", "right"]))),
        ("Greater", Layout::call(data(&["left", "right"]))),
        ("Like", Layout::call(data(&["left", "right", "similarity"]))),
        (
            "TypeOf",
            Layout::call(vec![Term("value", Object), Term("type", Class)]),
        ),
        (
            "Typecast",
            Layout::call(vec![
                Term("value", Object),
                Term("type", Class),
                Term("result", Object),
            ]),
        ),
        ("Concatenate", Layout::call(data(&["list", "result"]))),
        ("Join", Layout::call(data(&["list", "separator", "result"]))),
        ("Split", Layout::call(data(&["string", "pattern", "list"]))),
        ("Trim", Layout::call(data(&["untrimmed", "trimmed"]))),
        ("Upper", Layout::call(data(&["left", "right"]))),
        ("Lower", Layout::call(data(&["left", "right"]))),
        ("Pad", Layout::call(data(&["string", "char", "times", "result"]))),
        (
            "Substring",
            Layout::call(data(&["string", "before", "length", "after", "substring"])),
        ),
        ("Regexp", Layout::call(data(&["pattern", "string", "result"]))),
        ("Sum", Layout::call(data(&["list", "result"]))),
        ("Length", Layout::call(data(&["list", "length"]))),
        ("Member", Layout::call(data(&["member", "list"]))),
        ("Dot", Layout::call(data(&["document", "field", "value"]))),
        ("Eval", Layout::call(arithmetic(&["expression", "result"]))),
        ("Plus", Layout::call(arithmetic(&["left", "right"]))),
        ("Minus", Layout::call(arithmetic(&["left", "right"]))),
        ("Times", Layout::call(arithmetic(&["left", "right"]))),
        ("Divide", Layout::call(arithmetic(&["left", "right"]))),
        ("Div", Layout::call(arithmetic(&["left", "right"]))),
        ("Exp", Layout::call(arithmetic(&["left", "right"]))),
        ("Floor", Layout::call(arithmetic(&["argument"]))),
        (
            "Path",
            Layout::call(vec![
                Term("subject", Object),
                Pattern("pattern"),
                Term("object", Object),
                Term("path", Object),
            ]),
        ),
        (
            "TripleCount",
            Layout::call(vec![Scalar("resource"), Term("count", Data)]),
        ),
        (
            "Size",
            Layout::call(vec![Scalar("resource"), Term("size", Data)]),
        ),
        (
            "ReadDocument",
            Layout::call(vec![Term("identifier", Node), Term("document", Object)]),
        ),
        (
            "InsertDocument",
            Layout::call(vec![Term("document", Object), Term("identifier", Node)]),
        ),
        (
            "UpdateDocument",
            Layout::call(vec![Term("document", Object), Term("identifier", Node)]),
        ),
        (
            "DeleteDocument",
            Layout::call(vec![Term("identifier", Node)]),
        ),
        ("True", Layout::call(vec![])),
        (
            "LexicalKey",
            Layout::call(vec![
                Term("base", Data),
                Term("key_list", Data),
                Term("uri", Node),
            ]),
        ),
        (
            "HashKey",
            Layout::call(vec![
                Term("base", Data),
                Term("key_list", Data),
                Term("uri", Node),
            ]),
        ),
        (
            "RandomKey",
            Layout::call(vec![Term("base", Data), Term("uri", Node)]),
        ),
    ])
});

/// Call names that are not the snake case of the `@type`.
static CALL_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("IsA", "isa"),
        ("Substring", "substr"),
        ("Optional", "opt"),
        ("Subsumption", "sub"),
        ("Equals", "eq"),
        ("Concatenate", "concat"),
        ("Regexp", "re"),
        ("LexicalKey", "idgen"),
        ("HashKey", "unique"),
        ("RandomKey", "random_idgen"),
        ("DeletedTriple", "removed_triple"),
    ])
});

/// Triple-shaped operators carrying a `graph` are quads.
static QUAD_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Triple", "quad"),
        ("AddedTriple", "added_quad"),
        ("DeletedTriple", "removed_quad"),
        ("AddTriple", "add_quad"),
        ("DeleteTriple", "delete_quad"),
    ])
});

/// `PascalCase` to `snake_case`.
///
/// ```rust
/// use woql::printer::snake_case;
///
/// assert_eq!(snake_case("TripleCount"), "triple_count");
/// assert_eq!(snake_case("Not"), "not");
/// ```
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Call name for `node` of type `op`.
pub fn call_name(op: &str, node: &Value) -> String {
    if node.get("graph").is_some() {
        if let Some(name) = QUAD_NAMES.get(op) {
            return name.to_string();
        }
    }
    match CALL_NAMES.get(op) {
        Some(name) => name.to_string(),
        None => snake_case(op),
    }
}
