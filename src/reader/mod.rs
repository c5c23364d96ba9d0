//! Reads rendered source text back into a query.
//!
//! Every call is replayed against a builder using the same names the printer
//! writes, so `read(&render(tree)?)?` rebuilds `tree`. Nested calls in argument
//! position are replayed on a fresh builder, except for the `iri`, `literal`
//! and `doc` term helpers.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::query::{Order, OrderTemplate, WoqlQuery};
use crate::syntax;
use crate::term::{literal, RawTerm};
use crate::vocab::Vocabulary;

pub mod parse;

use parse::{Call, Expr};

/// Deepest bracket nesting the reader accepts.
pub const MAX_NESTING: usize = 64;

/// Reads source text with the default vocabulary.
///
/// ```rust
/// use woql::reader::read;
/// use woql::WoqlQuery;
///
/// let query = read(r#"limit(10).triple("v:S", "label", "v:O")"#).unwrap();
/// let built = WoqlQuery::new().limit(10, None).triple("v:S", "label", "v:O");
/// assert_eq!(query.json(), built.json());
/// ```
pub fn read(text: &str) -> Result<WoqlQuery, Error> {
    read_with(text, Vocabulary::new())
}

/// Reads source text, normalizing terms against `vocab`.
pub fn read_with(text: &str, vocab: Vocabulary) -> Result<WoqlQuery, Error> {
    if parse::nesting(text) > MAX_NESTING {
        return Err(Error::TooDeep(MAX_NESTING));
    }
    let expr = match parse::source(text) {
        Ok((_, expr)) => expr,
        Err(cause) => return Err(syntax::Error { input: text, cause }.into()),
    };
    Replay { vocab: &vocab }.query(expr)
}

struct Replay<'v> {
    vocab: &'v Vocabulary,
}

impl<'v> Replay<'v> {
    fn fresh(&self) -> WoqlQuery {
        WoqlQuery::with_vocabulary(self.vocab.clone())
    }

    fn query(&self, expr: Expr) -> Result<WoqlQuery, Error> {
        match expr {
            Expr::Chain(calls) => calls
                .into_iter()
                .try_fold(self.fresh(), |query, call| self.apply(query, call)),
            Expr::Object(json) => {
                let mut query = WoqlQuery::from_json(json);
                query.set_vocabulary(self.vocab.clone());
                Ok(query)
            }
            other => Err(Error::Call {
                call: "query".to_string(),
                message: format!("expected a query, got {:?}", other),
            }),
        }
    }

    fn raw(&self, expr: Expr) -> Result<RawTerm, Error> {
        let raw = match expr {
            Expr::Str(s) => RawTerm::Str(s),
            Expr::Num(n) => RawTerm::Num(n),
            Expr::Bool(b) => RawTerm::Bool(b),
            Expr::Null => RawTerm::Wrapped(Value::Null),
            Expr::List(items) => RawTerm::List(
                items
                    .into_iter()
                    .map(|item| self.raw(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Object(json) => RawTerm::Wrapped(json),
            Expr::Chain(mut calls)
                if calls.len() == 1 && matches!(calls[0].name.as_str(), "iri" | "literal" | "doc") =>
            {
                self.helper(calls.remove(0))?
            }
            chain => RawTerm::Query(Box::new(self.query(chain)?)),
        };
        Ok(raw)
    }

    fn helper(&self, call: Call) -> Result<RawTerm, Error> {
        let Call { name, args } = call;
        let mut args = Args::new(self, &name, args);
        let raw = match name.as_str() {
            "iri" => RawTerm::Node(args.string()?),
            "literal" => {
                let value = args.json()?;
                literal(value, &args.string()?)
            }
            _ => RawTerm::Document(args.json()?),
        };
        args.finish()?;
        Ok(raw)
    }

    fn apply(&self, query: WoqlQuery, call: Call) -> Result<WoqlQuery, Error> {
        let Call { name, args } = call;
        debug!(call = %name, args = args.len(), "replaying call");
        let mut args = Args::new(self, &name, args);

        let query = match name.as_str() {
            "and" => query.and(args.queries()?),
            "or" => query.or(args.queries()?),
            "not" => query.not(args.sub()?),
            "opt" => query.opt(args.sub()?),
            "select" => {
                let sub = args.trailing_query()?;
                query.select(args.strings()?, sub)
            }
            "distinct" => {
                let sub = args.trailing_query()?;
                query.distinct(args.strings()?, sub)
            }
            "limit" => query.limit(args.count()?, args.sub()?),
            "start" => query.start(args.count()?, args.sub()?),
            "from" => query.from_graph(args.term()?, args.sub()?),
            "into" => query.into_graph(args.term()?, args.sub()?),
            "using" => query.using(args.term()?, args.sub()?),
            "comment" => {
                let text = args.string()?;
                query.comment(&text, args.sub()?)
            }
            "when" => query.when(args.query()?, args.sub()?),
            "immediately" => query.immediately(args.sub()?),
            "once" => query.once(args.sub()?),
            "count" => query.count(args.term()?, args.sub()?),
            "order_by" => {
                let sub = args.trailing_query()?;
                query.order_by(args.orderings()?, sub)
            }
            "group_by" => query.group_by(args.term()?, args.term()?, args.term()?, args.sub()?),

            "triple" => query.triple(args.term()?, args.term()?, args.term()?),
            "quad" => query.quad(args.term()?, args.term()?, args.term()?, args.term()?),
            "added_triple" => query.added_triple(args.term()?, args.term()?, args.term()?),
            "added_quad" => {
                query.added_quad(args.term()?, args.term()?, args.term()?, args.term()?)
            }
            "removed_triple" => query.removed_triple(args.term()?, args.term()?, args.term()?),
            "removed_quad" => {
                query.removed_quad(args.term()?, args.term()?, args.term()?, args.term()?)
            }
            "add_triple" => query.add_triple(args.term()?, args.term()?, args.term()?),
            "add_quad" => query.add_quad(args.term()?, args.term()?, args.term()?, args.term()?),
            "delete_triple" => query.delete_triple(args.term()?, args.term()?, args.term()?),
            "delete_quad" => {
                query.delete_quad(args.term()?, args.term()?, args.term()?, args.term()?)
            }
            "star" => query.star(),

            "sub" => query.sub(args.term()?, args.term()?),
            "isa" => query.isa(args.term()?, args.term()?),
            "eq" => query.eq(args.term()?, args.term()?),
            "less" => query.less(args.term()?, args.term()?),
            "greater" => query.greater(args.term()?, args.term()?),
            "like" => query.like(args.term()?, args.term()?, args.term()?),
            "type_of" => query.type_of(args.term()?, args.term()?),
            "typecast" => query.typecast(args.term()?, args.term()?, args.term()?),

            "concat" => query.concat(args.term()?, args.term()?),
            "join" => query.join(args.term()?, args.term()?, args.term()?),
            "split" => query.split(args.term()?, args.term()?, args.term()?),
            "trim" => query.trim(args.term()?, args.term()?),
            "upper" => query.upper(args.term()?, args.term()?),
            "lower" => query.lower(args.term()?, args.term()?),
            "pad" => query.pad(args.term()?, args.term()?, args.term()?, args.term()?),
            "substr" => query.substr(
                args.term()?,
                args.term()?,
                args.term()?,
                args.term()?,
                args.term()?,
            ),
            "re" => query.re(args.term()?, args.term()?, args.term()?),

            "sum" => query.sum(args.term()?, args.term()?),
            "length" => query.length(args.term()?, args.term()?),
            "member" => query.member(args.term()?, args.term()?),
            "dot" => query.dot(args.term()?, args.term()?, args.term()?),

            "eval" => query.eval(args.term()?, args.term()?),
            "plus" => query.plus(args.term()?, args.term()?),
            "minus" => query.minus(args.term()?, args.term()?),
            "times" => query.times(args.term()?, args.term()?),
            "divide" => query.divide(args.term()?, args.term()?),
            "div" => query.div(args.term()?, args.term()?),
            "exp" => query.exp(args.term()?, args.term()?),
            "floor" => query.floor(args.term()?),

            "path" => {
                let subject = args.term()?;
                let pattern = args.string()?;
                query.path(subject, &pattern, args.term()?, args.opt_term()?)
            }
            "triple_count" => query.triple_count(args.term()?, args.term()?),
            "size" => query.size(args.term()?, args.term()?),

            "read_document" => query.read_document(args.term()?, args.term()?),
            "insert_document" => query.insert_document(args.term()?, args.opt_term()?),
            "update_document" => query.update_document(args.term()?, args.opt_term()?),
            "delete_document" => query.delete_document(args.term()?),

            "true" => query.true_(),
            "idgen" => query.idgen(args.term()?, args.term()?, args.term()?),
            "unique" => query.unique(args.term()?, args.term()?, args.term()?),
            "random_idgen" => query.random_idgen(args.term()?, args.term()?),

            _ => return Err(Error::UnknownCall(name.clone())),
        };

        args.finish()?;
        Ok(query)
    }
}

/// Positional arguments of one call, consumed front to back.
struct Args<'r, 'v> {
    replay: &'r Replay<'v>,
    call: String,
    items: VecDeque<Expr>,
}

impl<'r, 'v> Args<'r, 'v> {
    fn new(replay: &'r Replay<'v>, call: &str, items: Vec<Expr>) -> Self {
        Self {
            replay,
            call: call.to_string(),
            items: items.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Call {
            call: self.call.clone(),
            message: message.into(),
        }
    }

    fn next(&mut self, what: &str) -> Result<Expr, Error> {
        match self.items.pop_front() {
            Some(expr) => Ok(expr),
            None => Err(self.error(format!("missing {} argument", what))),
        }
    }

    /// Next argument, `None` when absent or `null`.
    fn next_present(&mut self) -> Option<Expr> {
        match self.items.pop_front() {
            None | Some(Expr::Null) => None,
            Some(expr) => Some(expr),
        }
    }

    fn term(&mut self) -> Result<RawTerm, Error> {
        let expr = self.next("term")?;
        self.replay.raw(expr)
    }

    fn opt_term(&mut self) -> Result<Option<RawTerm>, Error> {
        self.next_present().map(|expr| self.replay.raw(expr)).transpose()
    }

    fn string(&mut self) -> Result<String, Error> {
        match self.next("string")? {
            Expr::Str(s) => Ok(s),
            other => Err(self.error(format!("expected a string, got {:?}", other))),
        }
    }

    fn strings(&mut self) -> Result<Vec<String>, Error> {
        let mut out = Vec::with_capacity(self.items.len());
        while !self.items.is_empty() {
            out.push(self.string()?);
        }
        Ok(out)
    }

    fn count(&mut self) -> Result<u64, Error> {
        match self.next("count")? {
            Expr::Num(n) => match n.as_u64() {
                Some(n) => Ok(n),
                None => Err(self.error(format!("expected a non-negative integer, got {}", n))),
            },
            other => Err(self.error(format!("expected a number, got {:?}", other))),
        }
    }

    /// Scalar argument as plain JSON.
    fn json(&mut self) -> Result<Value, Error> {
        let expr = self.next("value")?;
        to_json(expr).map_err(|message| self.error(message))
    }

    fn query(&mut self) -> Result<WoqlQuery, Error> {
        let expr = self.next("query")?;
        self.replay.query(expr)
    }

    /// Optional sub-query; when absent the chain fills it.
    fn sub(&mut self) -> Result<Option<WoqlQuery>, Error> {
        self.next_present()
            .map(|expr| self.replay.query(expr))
            .transpose()
    }

    fn queries(&mut self) -> Result<Vec<WoqlQuery>, Error> {
        let mut out = Vec::with_capacity(self.items.len());
        while !self.items.is_empty() {
            out.push(self.query()?);
        }
        Ok(out)
    }

    /// Sub-query written after a variadic argument list.
    fn trailing_query(&mut self) -> Result<Option<WoqlQuery>, Error> {
        match self.items.back() {
            Some(Expr::Chain(_) | Expr::Object(_)) => {}
            _ => return Ok(None),
        }
        match self.items.pop_back() {
            Some(expr) => self.replay.query(expr).map(Some),
            None => Ok(None),
        }
    }

    fn orderings(&mut self) -> Result<Vec<OrderTemplate>, Error> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Some(expr) = self.items.pop_front() {
            let template = match &expr {
                Expr::Str(variable) => OrderTemplate::from(variable.as_str()),
                Expr::List(pair) => match pair.as_slice() {
                    [Expr::Str(variable), Expr::Str(order)] => match Order::parse(order) {
                        Some(order) => OrderTemplate::new(variable, order),
                        None => return Err(self.error(format!("unknown order `{}`", order))),
                    },
                    _ => return Err(self.error(format!("malformed ordering {:?}", expr))),
                },
                _ => return Err(self.error(format!("malformed ordering {:?}", expr))),
            };
            out.push(template);
        }
        Ok(out)
    }

    fn finish(self) -> Result<(), Error> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(self.error(format!("{} unexpected argument(s)", self.items.len())))
        }
    }
}

fn to_json(expr: Expr) -> Result<Value, String> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s)),
        Expr::Num(n) => Ok(Value::Number(n)),
        Expr::Bool(b) => Ok(Value::Bool(b)),
        Expr::Null => Ok(Value::Null),
        Expr::List(items) => items
            .into_iter()
            .map(to_json)
            .collect::<Result<_, _>>()
            .map(Value::Array),
        Expr::Object(json) => Ok(json),
        Expr::Chain(calls) => Err(format!(
            "expected a plain value, got a call to `{}`",
            calls.first().map(|c| c.name.as_str()).unwrap_or_default()
        )),
    }
}
