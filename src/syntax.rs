//! Parser plumbing shared by the path pattern compiler and the source reader.

use nom::{
    character::complete::multispace0,
    error::{convert_error, ParseError, VerboseError, VerboseErrorKind},
    sequence::delimited,
    Parser,
};

use std::ops::Deref;

pub type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;

/// A combinator that takes a parser `inner` and produces a parser that also consumes both
/// leading and trailing whitespace, returning the output of `inner`.
///
/// ```rust
/// use woql::syntax::{ws, IResult};
/// use nom::bytes::complete::tag;
///
/// fn hop(input: &str) -> IResult<&str, &str> {
///     ws(tag("hop"))(input)
/// }
///
/// assert_eq!(hop(" hop;"), Ok((";", "hop")));
/// assert_eq!(hop("hop  ;"), Ok((";", "hop")));
/// ```
pub fn ws<'a, O, E: ParseError<&'a str>, F>(
    inner: F,
) -> impl FnMut(&'a str) -> nom::IResult<&'a str, O, E>
where
    F: Parser<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

/// Input-aware error.
#[derive(Debug, Clone, PartialEq)]
pub struct Error<I> {
    pub input: I,
    pub cause: nom::Err<VerboseError<I>>,
}

/// To convert input aware error into printable stack trace.
impl<I> From<Error<I>> for String
where
    I: Deref<Target = str>,
{
    fn from(e: Error<I>) -> Self {
        match e.cause {
            nom::Err::Error(err) | nom::Err::Failure(err) => convert_error(e.input, err),
            nom::Err::Incomplete(needed) => {
                format!("incomplete, needed: {:?}", needed)
            }
        }
    }
}

impl<I> Error<I>
where
    I: Deref<Target = str>,
{
    pub fn into_stack_trace(self) -> String {
        String::from(self)
    }

    /// Whether any frame of the error stack was pushed by `context(name, ..)`.
    pub fn has_context(&self, name: &str) -> bool {
        match &self.cause {
            nom::Err::Error(err) | nom::Err::Failure(err) => err
                .errors
                .iter()
                .any(|(_, kind)| matches!(kind, VerboseErrorKind::Context(c) if *c == name)),
            nom::Err::Incomplete(_) => false,
        }
    }
}
