use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, anychar, char, none_of},
    combinator::{all_consuming, cut, map, map_res, not, opt, peek, recognize, value},
    error::{context, ContextError, ErrorKind, ParseError, VerboseError},
    multi::{many0, separated_list0, separated_list1},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
};
use serde_json::{Number, Value};

use crate::syntax::{ws, IResult};

/// Rendered source expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Num(Number),
    Bool(bool),
    Null,
    List(Vec<Expr>),
    /// JSON object literal, taken as-is.
    Object(Value),
    /// `a(..).b(..)`
    Chain(Vec<Call>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
}

impl Call {
    pub fn new(name: &str, args: Vec<Expr>) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }
}

/// Call name
///
/// ```rust
/// use woql::reader::parse::ident;
///
/// assert_eq!(ident("random_idgen("), Ok(("(", "random_idgen")));
/// assert!(ident("1st").is_err());
/// ```
pub fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Double-quoted string with JSON escapes
///
/// ```rust
/// use woql::reader::parse::string;
///
/// assert_eq!(string(r#""v:X","#), Ok((",", "v:X".to_string())));
/// assert_eq!(string(r#""say \"hi\"\n")"#), Ok((")", "say \"hi\"\n".to_string())));
/// assert_eq!(string(r#""""#), Ok(("", String::new())));
/// ```
pub fn string(input: &str) -> IResult<&str, String> {
    context(
        "string",
        map_res(
            recognize(delimited(
                char('"'),
                many0(alt((preceded(char('\\'), anychar), none_of("\\\"")))),
                char('"'),
            )),
            serde_json::from_str::<String>,
        ),
    )(input)
}

/// Number, kept exactly as JSON would read it
///
/// ```rust
/// use woql::reader::parse::number;
/// use serde_json::Number;
///
/// assert_eq!(number("42)"), Ok((")", Number::from(42))));
/// assert_eq!(number("-2.5,"), Ok((",", Number::from_f64(-2.5).unwrap())));
/// ```
pub fn number(input: &str) -> IResult<&str, Number> {
    context(
        "number",
        map_res(recognize_float, serde_json::from_str::<Number>),
    )(input)
}

/// JSON object literal, `{..}`
///
/// ```rust
/// use woql::reader::parse::object;
/// use serde_json::json;
///
/// assert_eq!(object(r#"{"a": [1, "}"]})"#), Ok((")", json!({"a": [1, "}"]}))));
/// ```
pub fn object(input: &str) -> IResult<&str, Value> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::Char,
        )));
    }
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok((&input[stream.byte_offset()..], value)),
        _ => Err(nom::Err::Failure(VerboseError::add_context(
            input,
            "json object",
            VerboseError::from_error_kind(input, ErrorKind::Verify),
        ))),
    }
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(peek(alt((alphanumeric1, tag("_"))))))
}

fn list(input: &str) -> IResult<&str, Vec<Expr>> {
    context(
        "list",
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), expr),
            cut(ws(char(']'))),
        ),
    )(input)
}

/// `name(args..)`
///
/// ```rust
/// use woql::reader::parse::{call, Call, Expr};
///
/// assert_eq!(
///     call(r#"limit(10);"#),
///     Ok((";", Call::new("limit", vec![Expr::Num(10.into())])))
/// );
/// ```
pub fn call(input: &str) -> IResult<&str, Call> {
    map(
        pair(
            ident,
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), expr),
                context("closing paren", cut(ws(char(')')))),
            ),
        ),
        |(name, args)| Call::new(name, args),
    )(input)
}

/// `a().b().c()`
pub fn chain(input: &str) -> IResult<&str, Vec<Call>> {
    separated_list1(ws(char('.')), call)(input)
}

pub fn expr(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        map(string, Expr::Str),
        map(object, Expr::Object),
        map(list, Expr::List),
        map(number, Expr::Num),
        map(chain, Expr::Chain),
        value(Expr::Bool(true), keyword("true")),
        value(Expr::Bool(false), keyword("false")),
        value(Expr::Null, keyword("null")),
    )))(input)
}

/// Deepest nesting of `(`, `[` and `{` outside string literals.
///
/// ```rust
/// use woql::reader::parse::nesting;
///
/// assert_eq!(nesting(r#"and(triple("v:A", "(", ["x"]))"#), 2);
/// assert_eq!(nesting(r#""\"((""#), 0);
/// ```
pub fn nesting(input: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in input.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Whole source text; empty text is an empty chain.
///
/// ```rust
/// use woql::reader::parse::{source, Call, Expr};
///
/// assert_eq!(
///     source(" not().true() "),
///     Ok(("", Expr::Chain(vec![Call::new("not", vec![]), Call::new("true", vec![])])))
/// );
/// assert_eq!(source("  "), Ok(("", Expr::Chain(vec![]))));
/// ```
pub fn source(input: &str) -> IResult<&str, Expr> {
    context(
        "query source",
        all_consuming(map(ws(opt(expr)), |e| {
            e.unwrap_or(Expr::Chain(Vec::new()))
        })),
    )(input)
}
