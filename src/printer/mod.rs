//! Renders query trees back into chained builder calls.
//!
//! ```rust
//! use woql::WoqlQuery;
//!
//! let query = WoqlQuery::new()
//!     .select(["v:S"], None)
//!     .triple("v:S", "label", "hello")
//!     .path("v:S", "(<hop,hop>)+", "v:T", None);
//!
//! assert_eq!(
//!     query.render().unwrap(),
//!     "select(\"v:S\").and(\n  triple(\"v:S\", \"rdfs:label\", \"hello\"),\n  path(\"v:S\", \"(<hop,hop)+\", \"v:T\")\n)"
//! );
//! ```

mod table;
mod writer;

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, RenderError};
use crate::path::{decompile, PathPattern};
use crate::term::{Literal, Payload, Position, Term, TermKind, SYS_JSON, XSD_BOOLEAN, XSD_DECIMAL, XSD_STRING};
use crate::vocab::Vocabulary;

pub use table::{call_name, snake_case, Field, Layout, LAYOUTS};
pub use writer::{ArgWriter, Source, Writer};

fn default_indent() -> usize {
    2
}

/// Rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderOptions {
    /// Spaces per block level.
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

pub struct Printer<'v> {
    vocab: &'v Vocabulary,
    options: RenderOptions,
    diagnostics: Vec<RenderError>,
}

impl<'v> Printer<'v> {
    pub fn new(vocab: &'v Vocabulary) -> Self {
        Self {
            vocab,
            options: RenderOptions::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Problems met by the last renders.
    pub fn diagnostics(&self) -> &[RenderError] {
        &self.diagnostics
    }

    pub fn render(&mut self, node: &Value) -> Result<String, Error> {
        let mut out = String::new();
        let mut w = Writer::new(&mut out, self.options.indent);
        if !is_empty(node) {
            self.write_query(&mut w, node)?;
        }
        Ok(out)
    }

    fn unknown(&mut self, w: &mut Writer, op: &str) -> fmt::Result {
        self.placeholder(w, op, op)
    }

    /// Writes a comment naming `label` and reports `detail`.
    fn placeholder(&mut self, w: &mut Writer, label: &str, detail: &str) -> fmt::Result {
        warn!(op = detail, "unknown operator");
        self.diagnostics
            .push(RenderError::UnknownOperator(detail.to_string()));
        // keep the comment closed whatever the label holds
        w.raw(&format!("/* unknown operator {} */", label.replace("*/", "* /")))
    }

    fn write_query(&mut self, w: &mut Writer, node: &Value) -> fmt::Result {
        let Some(op) = node.get("@type").and_then(Value::as_str) else {
            if is_empty(node) {
                return w.raw("{}");
            }
            return self.placeholder(w, "<untyped>", &node.to_string());
        };
        let Some(layout) = LAYOUTS.get(op) else {
            return self.unknown(w, op);
        };

        // trailing absent fields are left out, earlier ones become `null`
        let present = layout
            .args
            .iter()
            .rposition(|field| node.get(field.name()).is_some())
            .map_or(0, |last| last + 1);
        let fields = &layout.args[..present];
        let block = layout.block
            && fields
                .iter()
                .filter_map(|field| node.get(field.name()).and_then(Value::as_array))
                .any(|children| children.len() > 1);

        w.call(&call_name(op, node), block, |args| {
            for field in fields {
                self.write_field(args, node, field)?;
            }
            Ok(())
        })?;

        if let Some(chain) = layout.chain {
            if let Some(child) = node.get(chain).filter(|child| !is_empty(child)) {
                w.raw(".")?;
                self.write_query(w, child)?;
            }
        }
        Ok(())
    }

    fn write_field(&mut self, args: &mut ArgWriter, node: &Value, field: &Field) -> fmt::Result {
        let Some(value) = node.get(field.name()) else {
            if field.is_variadic() {
                return Ok(());
            }
            return args.arg(&Value::Null);
        };
        match field {
            Field::Term(_, position) => args.with(|w| self.write_term(w, value, *position)),
            Field::Scalar(_) => args.arg(value),
            Field::Vars(_) => {
                for var in value.as_array().into_iter().flatten() {
                    args.with(|w| write_var(w, var))?;
                }
                Ok(())
            }
            Field::VarList(_) => match value.as_array() {
                Some(vars) if vars.len() == 1 => args.with(|w| write_var(w, &vars[0])),
                Some(vars) => args.with(|w| {
                    w.list(|items| {
                        for var in vars {
                            items.with(|w| write_var(w, var))?;
                        }
                        Ok(())
                    })
                }),
                None => args.arg(value),
            },
            Field::Comment(_) => match value.get("@value").and_then(Value::as_str) {
                Some(text) => args.arg(text),
                None => args.arg(value),
            },
            Field::Pattern(_) => match serde_json::from_value::<PathPattern>(value.clone()) {
                Ok(pattern) => args.arg(decompile(&pattern).as_str()),
                Err(err) => {
                    self.diagnostics.push(RenderError::Pattern(err.to_string()));
                    args.arg(value)
                }
            },
            Field::Ordering(_) => {
                for template in value.as_array().into_iter().flatten() {
                    args.with(|w| write_ordering(w, template))?;
                }
                Ok(())
            }
            Field::Query(_) => args.with(|w| self.write_query(w, value)),
            Field::Queries(_) => {
                for child in value.as_array().into_iter().flatten() {
                    args.with(|w| self.write_query(w, child))?;
                }
                Ok(())
            }
        }
    }

    /// Whether `text` would be read back as something other than a string in `position`.
    fn ambiguous(&self, text: &str, position: Position) -> bool {
        text.starts_with("v:")
            || (position.admits_node() && (text.contains(':') || self.vocab.contains(text)))
    }

    fn write_term(&mut self, w: &mut Writer, value: &Value, position: Position) -> fmt::Result {
        let Some(term) = Term::from_json(value) else {
            return match value.get("@type").and_then(Value::as_str) {
                Some(op) if LAYOUTS.contains_key(op) => self.write_query(w, value),
                Some(op) if TermKind::parse(op).is_none() => self.unknown(w, op),
                Some(_) => {
                    warn!(term = %value, "malformed term");
                    self.diagnostics
                        .push(RenderError::MalformedTerm(value.to_string()));
                    w.value(value)
                }
                None => w.value(value),
            };
        };
        match term.payload {
            Payload::Variable(var) => w.value(format!("v:{}", var).as_str()),
            Payload::Node(node) => {
                if position.admits_node() && node.contains(':') && !node.starts_with("v:") {
                    w.value(node.as_str())
                } else {
                    w.call("iri", false, |args| args.arg(node.as_str()))
                }
            }
            Payload::Data(literal) => self.write_literal(w, &literal, position),
            Payload::List(items) => w.list(|args| {
                for item in &items {
                    args.with(|w| self.write_term(w, item, position))?;
                }
                Ok(())
            }),
        }
    }

    fn write_literal(&mut self, w: &mut Writer, literal: &Literal, position: Position) -> fmt::Result {
        let plain = position.admits_literal();
        match (literal.datatype.as_str(), &literal.value) {
            (XSD_STRING, Value::String(text)) if plain && !self.ambiguous(text, position) => {
                w.value(text.as_str())
            }
            (XSD_DECIMAL, Value::Number(n)) if plain => w.value(n),
            (XSD_BOOLEAN, Value::Bool(b)) if plain => w.value(*b),
            (SYS_JSON, document) if position.admits_list() => {
                w.call("doc", false, |args| args.arg(document))
            }
            (datatype, value) => w.call("literal", false, |args| {
                args.arg(value)?;
                args.arg(datatype)
            }),
        }
    }
}

fn is_empty(node: &Value) -> bool {
    matches!(node, Value::Object(object) if object.is_empty())
}

fn write_var(w: &mut Writer, var: &Value) -> fmt::Result {
    match var.as_str() {
        Some(name) => w.value(format!("v:{}", name).as_str()),
        None => w.value(var),
    }
}

/// Ascending order is the default and needs no brackets.
fn write_ordering(w: &mut Writer, template: &Value) -> fmt::Result {
    let variable = template.get("variable").and_then(Value::as_str).unwrap_or_default();
    match template.get("order").and_then(Value::as_str) {
        Some("desc") => w.list(|items| {
            items.arg(format!("v:{}", variable).as_str())?;
            items.arg("desc")
        }),
        _ => w.value(format!("v:{}", variable).as_str()),
    }
}

/// Renders `json` with the default vocabulary.
pub fn render(json: &Value) -> Result<String, Error> {
    Printer::new(&Vocabulary::default()).render(json)
}

/// Renders `json`, also returning what could not be rendered faithfully.
pub fn render_with_diagnostics(json: &Value) -> Result<(String, Vec<RenderError>), Error> {
    let vocab = Vocabulary::default();
    let mut printer = Printer::new(&vocab);
    let text = printer.render(json)?;
    Ok((text, printer.diagnostics))
}
