use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::path;
use crate::query::WoqlQuery;
use crate::term::{clean_graph, raw_var, Position, RawTerm, TermKind, XSD_STRING};

/// Sort direction of an `order_by` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(Order::Asc),
            "desc" => Some(Order::Desc),
            _ => None,
        }
    }
}

/// `{"@type": "OrderTemplate", "variable": .., "order": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename = "OrderTemplate")]
pub struct OrderTemplate {
    pub variable: String,
    pub order: Order,
}

impl OrderTemplate {
    pub fn new(variable: &str, order: Order) -> Self {
        Self {
            variable: variable.strip_prefix("v:").unwrap_or(variable).to_string(),
            order,
        }
    }
}

impl From<&str> for OrderTemplate {
    fn from(variable: &str) -> Self {
        Self::new(variable, Order::Asc)
    }
}

impl From<(&str, Order)> for OrderTemplate {
    fn from((variable, order): (&str, Order)) -> Self {
        Self::new(variable, order)
    }
}

impl From<OrderTemplate> for Value {
    fn from(template: OrderTemplate) -> Self {
        json!({"@type": "OrderTemplate", "variable": template.variable, "order": template.order.as_str()})
    }
}

/// Objects that are neither wrappers nor typed literals are documents.
fn as_document(raw: RawTerm) -> RawTerm {
    match raw {
        RawTerm::Wrapped(Value::Object(object))
            if !object.contains_key("@value")
                && !matches!(
                    object.get("@type").and_then(Value::as_str),
                    Some(t) if TermKind::parse(t).is_some()
                ) =>
        {
            RawTerm::Document(Value::Object(object))
        }
        other => other,
    }
}

impl WoqlQuery {
    /// Normalizes a batch of arguments of one operator.
    fn terms<const N: usize>(&mut self, kind: &str, args: [(RawTerm, Position); N]) -> [Value; N] {
        args.map(|(raw, position)| self.clean(kind, raw, position))
    }

    fn graph(&mut self, kind: &str, raw: RawTerm) -> Value {
        match clean_graph(&raw) {
            Ok(graph) => Value::String(graph),
            Err(err) => {
                self.record(kind, err.message);
                err.fallback
            }
        }
    }

    fn vars<I, T>(&mut self, kind: &str, vars: I) -> Vec<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<RawTerm>,
    {
        let mut out = Vec::new();
        for raw in vars {
            match raw_var(&raw.into()) {
                Ok(var) => out.push(Value::String(var)),
                Err(err) => self.record(kind, err.message),
            }
        }
        out
    }

    /// One variable name or a list of them.
    fn var_list(&mut self, kind: &str, raw: RawTerm) -> Vec<Value> {
        match raw {
            RawTerm::List(items) => self.vars(kind, items),
            single => self.vars(kind, [single]),
        }
    }

    // Combinators and sub-query wrappers

    /// Conjunction. Nested conjunctions are spliced in, and a node already under
    /// the cursor becomes the first conjunct.
    pub fn and(mut self, queries: Vec<WoqlQuery>) -> Self {
        self.combine("And", "and", queries);
        self
    }

    /// Disjunction, flattened like [`WoqlQuery::and`].
    pub fn or(mut self, queries: Vec<WoqlQuery>) -> Self {
        self.combine("Or", "or", queries);
        self
    }

    pub fn not(mut self, query: Option<WoqlQuery>) -> Self {
        self.emit("Not", vec![]);
        self.add_sub_query("query", query);
        self
    }

    pub fn opt(mut self, query: Option<WoqlQuery>) -> Self {
        self.emit("Optional", vec![]);
        self.add_sub_query("query", query);
        self
    }

    pub fn select<I, T>(mut self, vars: I, query: Option<WoqlQuery>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawTerm>,
    {
        let variables = self.vars("Select", vars);
        if variables.is_empty() {
            self.record("Select", "select needs at least one variable");
        }
        self.emit("Select", vec![("variables", Value::Array(variables))]);
        self.add_sub_query("query", query);
        self
    }

    pub fn distinct<I, T>(mut self, vars: I, query: Option<WoqlQuery>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawTerm>,
    {
        let variables = self.vars("Distinct", vars);
        if variables.is_empty() {
            self.record("Distinct", "distinct needs at least one variable");
        }
        self.emit("Distinct", vec![("variables", Value::Array(variables))]);
        self.add_sub_query("query", query);
        self
    }

    pub fn limit(mut self, limit: u64, query: Option<WoqlQuery>) -> Self {
        self.emit("Limit", vec![("limit", Value::from(limit))]);
        self.add_sub_query("query", query);
        self
    }

    pub fn start(mut self, start: u64, query: Option<WoqlQuery>) -> Self {
        self.emit("Start", vec![("start", Value::from(start))]);
        self.add_sub_query("query", query);
        self
    }

    /// `from`: evaluate the sub-query against `graph`.
    pub fn from_graph(mut self, graph: impl Into<RawTerm>, query: Option<WoqlQuery>) -> Self {
        let graph = self.graph("From", graph.into());
        self.emit("From", vec![("graph", graph)]);
        self.add_sub_query("query", query);
        self
    }

    /// `into`: write the sub-query's updates to `graph`.
    pub fn into_graph(mut self, graph: impl Into<RawTerm>, query: Option<WoqlQuery>) -> Self {
        let graph = self.graph("Into", graph.into());
        self.emit("Into", vec![("graph", graph)]);
        self.add_sub_query("query", query);
        self
    }

    pub fn using(mut self, collection: impl Into<RawTerm>, query: Option<WoqlQuery>) -> Self {
        let collection = self.graph("Using", collection.into());
        self.emit("Using", vec![("collection", collection)]);
        self.add_sub_query("query", query);
        self
    }

    pub fn comment(mut self, text: &str, query: Option<WoqlQuery>) -> Self {
        let comment = json!({"@type": XSD_STRING, "@value": text});
        self.emit("Comment", vec![("comment", comment)]);
        self.add_sub_query("query", query);
        self
    }

    /// `consequent` runs for each solution of `condition`.
    pub fn when(mut self, condition: WoqlQuery, consequent: Option<WoqlQuery>) -> Self {
        self.emit("When", vec![]);
        self.add_sub_query("query", Some(condition));
        self.add_sub_query("consequent", consequent);
        self
    }

    pub fn immediately(mut self, query: Option<WoqlQuery>) -> Self {
        self.emit("Immediately", vec![]);
        self.add_sub_query("query", query);
        self
    }

    pub fn once(mut self, query: Option<WoqlQuery>) -> Self {
        self.emit("Once", vec![]);
        self.add_sub_query("query", query);
        self
    }

    pub fn count(mut self, count: impl Into<RawTerm>, query: Option<WoqlQuery>) -> Self {
        let [count] = self.terms("Count", [(count.into(), Position::Data)]);
        self.emit("Count", vec![("count", count)]);
        self.add_sub_query("query", query);
        self
    }

    pub fn order_by<I, T>(mut self, orderings: I, query: Option<WoqlQuery>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTemplate>,
    {
        let ordering: Vec<Value> = orderings
            .into_iter()
            .map(|o| Value::from(Into::<OrderTemplate>::into(o)))
            .collect();
        if ordering.is_empty() {
            self.record("OrderBy", "order_by needs at least one variable");
        }
        self.emit("OrderBy", vec![("ordering", Value::Array(ordering))]);
        self.add_sub_query("query", query);
        self
    }

    /// Groups solutions of the sub-query by `group`, collecting `template` into `grouped`.
    pub fn group_by(
        mut self,
        group: impl Into<RawTerm>,
        template: impl Into<RawTerm>,
        grouped: impl Into<RawTerm>,
        query: Option<WoqlQuery>,
    ) -> Self {
        let group = self.var_list("GroupBy", group.into());
        let template = self.var_list("GroupBy", template.into());
        let [grouped] = self.terms("GroupBy", [(grouped.into(), Position::Object)]);
        self.emit(
            "GroupBy",
            vec![
                ("group_by", Value::Array(group)),
                ("template", Value::Array(template)),
                ("grouped", grouped),
            ],
        );
        self.add_sub_query("query", query);
        self
    }

    // Triple patterns

    fn triple_like(
        &mut self,
        op: &'static str,
        subject: RawTerm,
        predicate: RawTerm,
        object: RawTerm,
        graph: Option<RawTerm>,
    ) {
        let [subject, predicate, object] = self.terms(
            op,
            [
                (subject, Position::Subject),
                (predicate, Position::Predicate),
                (object, Position::Object),
            ],
        );
        let mut fields = vec![
            ("subject", subject),
            ("predicate", predicate),
            ("object", object),
        ];
        if let Some(graph) = graph {
            fields.push(("graph", self.graph(op, graph)));
        }
        self.emit(op, fields);
    }

    pub fn triple(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
    ) -> Self {
        self.triple_like("Triple", subject.into(), predicate.into(), object.into(), None);
        self
    }

    pub fn quad(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
        graph: impl Into<RawTerm>,
    ) -> Self {
        let graph = Some(graph.into());
        self.triple_like("Triple", subject.into(), predicate.into(), object.into(), graph);
        self
    }

    /// Triple added by the commit under inspection.
    pub fn added_triple(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
    ) -> Self {
        self.triple_like("AddedTriple", subject.into(), predicate.into(), object.into(), None);
        self
    }

    pub fn added_quad(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
        graph: impl Into<RawTerm>,
    ) -> Self {
        let graph = Some(graph.into());
        self.triple_like("AddedTriple", subject.into(), predicate.into(), object.into(), graph);
        self
    }

    /// Triple deleted by the commit under inspection.
    pub fn removed_triple(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
    ) -> Self {
        self.triple_like("DeletedTriple", subject.into(), predicate.into(), object.into(), None);
        self
    }

    pub fn removed_quad(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
        graph: impl Into<RawTerm>,
    ) -> Self {
        let graph = Some(graph.into());
        self.triple_like("DeletedTriple", subject.into(), predicate.into(), object.into(), graph);
        self
    }

    pub fn add_triple(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
    ) -> Self {
        self.triple_like("AddTriple", subject.into(), predicate.into(), object.into(), None);
        self
    }

    pub fn add_quad(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
        graph: impl Into<RawTerm>,
    ) -> Self {
        let graph = Some(graph.into());
        self.triple_like("AddTriple", subject.into(), predicate.into(), object.into(), graph);
        self
    }

    pub fn delete_triple(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
    ) -> Self {
        self.triple_like("DeleteTriple", subject.into(), predicate.into(), object.into(), None);
        self
    }

    pub fn delete_quad(
        mut self,
        subject: impl Into<RawTerm>,
        predicate: impl Into<RawTerm>,
        object: impl Into<RawTerm>,
        graph: impl Into<RawTerm>,
    ) -> Self {
        let graph = Some(graph.into());
        self.triple_like("DeleteTriple", subject.into(), predicate.into(), object.into(), graph);
        self
    }

    /// Every triple, bound to `v:Subject`, `v:Predicate` and `v:Object`.
    pub fn star(self) -> Self {
        self.triple("v:Subject", "v:Predicate", "v:Object")
    }

    // Comparison and typing

    pub fn sub(mut self, parent: impl Into<RawTerm>, child: impl Into<RawTerm>) -> Self {
        let [parent, child] = self.terms(
            "Subsumption",
            [(parent.into(), Position::Class), (child.into(), Position::Class)],
        );
        self.emit("Subsumption", vec![("parent", parent), ("child", child)]);
        self
    }

    pub fn isa(mut self, element: impl Into<RawTerm>, of_type: impl Into<RawTerm>) -> Self {
        let [element, of_type] = self.terms(
            "IsA",
            [(element.into(), Position::Subject), (of_type.into(), Position::Class)],
        );
        self.emit("IsA", vec![("element", element), ("type", of_type)]);
        self
    }

    pub fn eq(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        let [left, right] = self.terms(
            "Equals",
            [(left.into(), Position::Object), (right.into(), Position::Object)],
        );
        self.emit("Equals", vec![("left", left), ("right", right)]);
        self
    }

    fn binary_data(&mut self, op: &'static str, fields: [&'static str; 2], args: [RawTerm; 2]) {
        let [a, b] = args;
        let [a, b] = self.terms(op, [(a, Position::Data), (b, Position::Data)]);
        self.emit(op, vec![(fields[0], a), (fields[1], b)]);
    }

    fn ternary_data(&mut self, op: &'static str, fields: [&'static str; 3], args: [RawTerm; 3]) {
        let [a, b, c] = args;
        let [a, b, c] = self.terms(
            op,
            [(a, Position::Data), (b, Position::Data), (c, Position::Data)],
        );
        self.emit(op, vec![(fields[0], a), (fields[1], b), (fields[2], c)]);
    }

    pub fn less(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.binary_data("Less", ["left", "right"], [left.into(), right.into()]);
        self
    }

    pub fn greater(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.binary_data("Greater", ["left", "right"], [left.into(), right.into()]);
        self
    }

    /// String similarity of `left` and `right`, bound to `similarity`.
    pub fn like(
        mut self,
        left: impl Into<RawTerm>,
        right: impl Into<RawTerm>,
        similarity: impl Into<RawTerm>,
    ) -> Self {
        self.ternary_data(
            "Like",
            ["left", "right", "similarity"],
            [left.into(), right.into(), similarity.into()],
        );
        self
    }

    pub fn type_of(mut self, value: impl Into<RawTerm>, of_type: impl Into<RawTerm>) -> Self {
        let [value, of_type] = self.terms(
            "TypeOf",
            [(value.into(), Position::Object), (of_type.into(), Position::Class)],
        );
        self.emit("TypeOf", vec![("value", value), ("type", of_type)]);
        self
    }

    pub fn typecast(
        mut self,
        value: impl Into<RawTerm>,
        of_type: impl Into<RawTerm>,
        result: impl Into<RawTerm>,
    ) -> Self {
        let [value, of_type, result] = self.terms(
            "Typecast",
            [
                (value.into(), Position::Object),
                (of_type.into(), Position::Class),
                (result.into(), Position::Object),
            ],
        );
        self.emit(
            "Typecast",
            vec![("value", value), ("type", of_type), ("result", result)],
        );
        self
    }

    // Strings

    pub fn concat(mut self, list: impl Into<RawTerm>, result: impl Into<RawTerm>) -> Self {
        self.binary_data("Concatenate", ["list", "result"], [list.into(), result.into()]);
        self
    }

    pub fn join(
        mut self,
        list: impl Into<RawTerm>,
        separator: impl Into<RawTerm>,
        result: impl Into<RawTerm>,
    ) -> Self {
        self.ternary_data(
            "Join",
            ["list", "separator", "result"],
            [list.into(), separator.into(), result.into()],
        );
        self
    }

    pub fn split(
        mut self,
        string: impl Into<RawTerm>,
        pattern: impl Into<RawTerm>,
        list: impl Into<RawTerm>,
    ) -> Self {
        self.ternary_data(
            "Split",
            ["string", "pattern", "list"],
            [string.into(), pattern.into(), list.into()],
        );
        self
    }

    pub fn trim(mut self, untrimmed: impl Into<RawTerm>, trimmed: impl Into<RawTerm>) -> Self {
        self.binary_data("Trim", ["untrimmed", "trimmed"], [untrimmed.into(), trimmed.into()]);
        self
    }

    pub fn upper(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.binary_data("Upper", ["left", "right"], [left.into(), right.into()]);
        self
    }

    pub fn lower(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.binary_data("Lower", ["left", "right"], [left.into(), right.into()]);
        self
    }

    /// Pads `string` with `times` copies of `char`.
    pub fn pad(
        mut self,
        string: impl Into<RawTerm>,
        char: impl Into<RawTerm>,
        times: impl Into<RawTerm>,
        result: impl Into<RawTerm>,
    ) -> Self {
        let [string, char, times, result] = self.terms(
            "Pad",
            [
                (string.into(), Position::Data),
                (char.into(), Position::Data),
                (times.into(), Position::Data),
                (result.into(), Position::Data),
            ],
        );
        self.emit(
            "Pad",
            vec![
                ("string", string),
                ("char", char),
                ("times", times),
                ("result", result),
            ],
        );
        self
    }

    pub fn substr(
        mut self,
        string: impl Into<RawTerm>,
        before: impl Into<RawTerm>,
        length: impl Into<RawTerm>,
        after: impl Into<RawTerm>,
        substring: impl Into<RawTerm>,
    ) -> Self {
        let [string, before, length, after, substring] = self.terms(
            "Substring",
            [
                (string.into(), Position::Data),
                (before.into(), Position::Data),
                (length.into(), Position::Data),
                (after.into(), Position::Data),
                (substring.into(), Position::Data),
            ],
        );
        self.emit(
            "Substring",
            vec![
                ("string", string),
                ("before", before),
                ("length", length),
                ("after", after),
                ("substring", substring),
            ],
        );
        self
    }

    /// Regular expression match; `result` binds the capture groups.
    pub fn re(
        mut self,
        pattern: impl Into<RawTerm>,
        string: impl Into<RawTerm>,
        result: impl Into<RawTerm>,
    ) -> Self {
        self.ternary_data(
            "Regexp",
            ["pattern", "string", "result"],
            [pattern.into(), string.into(), result.into()],
        );
        self
    }

    // Lists and documents

    pub fn sum(mut self, list: impl Into<RawTerm>, result: impl Into<RawTerm>) -> Self {
        self.binary_data("Sum", ["list", "result"], [list.into(), result.into()]);
        self
    }

    pub fn length(mut self, list: impl Into<RawTerm>, length: impl Into<RawTerm>) -> Self {
        self.binary_data("Length", ["list", "length"], [list.into(), length.into()]);
        self
    }

    pub fn member(mut self, member: impl Into<RawTerm>, list: impl Into<RawTerm>) -> Self {
        self.binary_data("Member", ["member", "list"], [member.into(), list.into()]);
        self
    }

    pub fn dot(
        mut self,
        document: impl Into<RawTerm>,
        field: impl Into<RawTerm>,
        value: impl Into<RawTerm>,
    ) -> Self {
        self.ternary_data(
            "Dot",
            ["document", "field", "value"],
            [document.into(), field.into(), value.into()],
        );
        self
    }

    // Arithmetic

    /// Evaluates an arithmetic `expression` into `result`.
    ///
    /// ```rust
    /// use woql::WoqlQuery;
    /// use serde_json::json;
    ///
    /// let query = WoqlQuery::new().eval(WoqlQuery::new().times("v:X", 2), "v:Y");
    /// assert_eq!(query.json()["expression"]["@type"], json!("Times"));
    /// assert_eq!(query.json()["result"], json!({"@type": "ArithmeticValue", "variable": "Y"}));
    /// ```
    pub fn eval(mut self, expression: impl Into<RawTerm>, result: impl Into<RawTerm>) -> Self {
        let [expression, result] = self.terms(
            "Eval",
            [
                (expression.into(), Position::Arithmetic),
                (result.into(), Position::Arithmetic),
            ],
        );
        self.emit("Eval", vec![("expression", expression), ("result", result)]);
        self
    }

    fn arithmetic(&mut self, op: &'static str, left: RawTerm, right: RawTerm) {
        let [left, right] = self.terms(
            op,
            [(left, Position::Arithmetic), (right, Position::Arithmetic)],
        );
        self.emit(op, vec![("left", left), ("right", right)]);
    }

    pub fn plus(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Plus", left.into(), right.into());
        self
    }

    pub fn minus(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Minus", left.into(), right.into());
        self
    }

    pub fn times(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Times", left.into(), right.into());
        self
    }

    pub fn divide(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Divide", left.into(), right.into());
        self
    }

    /// Integer division.
    pub fn div(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Div", left.into(), right.into());
        self
    }

    pub fn exp(mut self, left: impl Into<RawTerm>, right: impl Into<RawTerm>) -> Self {
        self.arithmetic("Exp", left.into(), right.into());
        self
    }

    pub fn floor(mut self, argument: impl Into<RawTerm>) -> Self {
        let [argument] = self.terms("Floor", [(argument.into(), Position::Arithmetic)]);
        self.emit("Floor", vec![("argument", argument)]);
        self
    }

    // Paths and counts

    /// Path query; `pattern` is compiled, the cursor stays where it is.
    ///
    /// ```rust
    /// use woql::WoqlQuery;
    /// use serde_json::json;
    ///
    /// let query = WoqlQuery::new().path("v:A", "knows+", "v:B", None);
    /// assert_eq!(
    ///     query.json()["pattern"],
    ///     json!({"@type": "PathPlus", "plus": {"@type": "PathPredicate", "predicate": "knows"}})
    /// );
    /// ```
    pub fn path(
        mut self,
        subject: impl Into<RawTerm>,
        pattern: &str,
        object: impl Into<RawTerm>,
        path: Option<RawTerm>,
    ) -> Self {
        let [subject, object] = self.terms(
            "Path",
            [(subject.into(), Position::Object), (object.into(), Position::Object)],
        );
        let mut fields = vec![("subject", subject)];
        match path::compile(pattern) {
            Ok(compiled) => match serde_json::to_value(&compiled) {
                Ok(compiled) => fields.push(("pattern", compiled)),
                Err(err) => self.record("Path", err.to_string()),
            },
            Err(err) => {
                debug!(pattern, error = %err, "path pattern does not compile");
                self.record("Path", err.to_string());
            }
        }
        fields.push(("object", object));
        if let Some(path) = path {
            let [path] = self.terms("Path", [(path, Position::Object)]);
            fields.push(("path", path));
        }
        self.emit("Path", fields);
        self
    }

    pub fn triple_count(mut self, resource: impl Into<RawTerm>, count: impl Into<RawTerm>) -> Self {
        let resource = self.graph("TripleCount", resource.into());
        let [count] = self.terms("TripleCount", [(count.into(), Position::Data)]);
        self.emit("TripleCount", vec![("resource", resource), ("count", count)]);
        self
    }

    pub fn size(mut self, resource: impl Into<RawTerm>, size: impl Into<RawTerm>) -> Self {
        let resource = self.graph("Size", resource.into());
        let [size] = self.terms("Size", [(size.into(), Position::Data)]);
        self.emit("Size", vec![("resource", resource), ("size", size)]);
        self
    }

    // Documents

    pub fn read_document(
        mut self,
        identifier: impl Into<RawTerm>,
        document: impl Into<RawTerm>,
    ) -> Self {
        let [identifier, document] = self.terms(
            "ReadDocument",
            [
                (identifier.into(), Position::Node),
                (document.into(), Position::Object),
            ],
        );
        self.emit(
            "ReadDocument",
            vec![("identifier", identifier), ("document", document)],
        );
        self
    }

    fn write_document(&mut self, op: &'static str, document: RawTerm, identifier: Option<RawTerm>) {
        let [document] = self.terms(op, [(as_document(document), Position::Object)]);
        let mut fields = vec![("document", document)];
        if let Some(identifier) = identifier {
            let [identifier] = self.terms(op, [(identifier, Position::Node)]);
            fields.push(("identifier", identifier));
        }
        self.emit(op, fields);
    }

    pub fn insert_document(
        mut self,
        document: impl Into<RawTerm>,
        identifier: Option<RawTerm>,
    ) -> Self {
        self.write_document("InsertDocument", document.into(), identifier);
        self
    }

    pub fn update_document(
        mut self,
        document: impl Into<RawTerm>,
        identifier: Option<RawTerm>,
    ) -> Self {
        self.write_document("UpdateDocument", document.into(), identifier);
        self
    }

    pub fn delete_document(mut self, identifier: impl Into<RawTerm>) -> Self {
        let [identifier] = self.terms("DeleteDocument", [(identifier.into(), Position::Node)]);
        self.emit("DeleteDocument", vec![("identifier", identifier)]);
        self
    }

    // Misc

    /// Always succeeds.
    pub fn true_(mut self) -> Self {
        self.emit("True", vec![]);
        self
    }

    fn key_gen(
        &mut self,
        op: &'static str,
        base: RawTerm,
        key_list: Option<RawTerm>,
        uri: RawTerm,
    ) {
        let [base, uri] = self.terms(op, [(base, Position::Data), (uri, Position::Node)]);
        let mut fields = vec![("base", base)];
        if let Some(key_list) = key_list {
            let key_list = match key_list {
                list @ RawTerm::List(_) => list,
                single => RawTerm::List(vec![single]),
            };
            let [key_list] = self.terms(op, [(key_list, Position::Data)]);
            fields.push(("key_list", key_list));
        }
        fields.push(("uri", uri));
        self.emit(op, fields);
    }

    /// Readable identifier built from `base` and the keys.
    pub fn idgen(
        mut self,
        base: impl Into<RawTerm>,
        key_list: impl Into<RawTerm>,
        uri: impl Into<RawTerm>,
    ) -> Self {
        self.key_gen("LexicalKey", base.into(), Some(key_list.into()), uri.into());
        self
    }

    /// Identifier built from `base` and a hash of the keys.
    pub fn unique(
        mut self,
        base: impl Into<RawTerm>,
        key_list: impl Into<RawTerm>,
        uri: impl Into<RawTerm>,
    ) -> Self {
        self.key_gen("HashKey", base.into(), Some(key_list.into()), uri.into());
        self
    }

    pub fn random_idgen(mut self, base: impl Into<RawTerm>, uri: impl Into<RawTerm>) -> Self {
        self.key_gen("RandomKey", base.into(), None, uri.into());
        self
    }
}
