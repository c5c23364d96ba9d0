use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Parse(String),

    #[error("failed to write query: `{0}`")]
    Format(#[from] std::fmt::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("unknown call `{0}`")]
    UnknownCall(String),

    #[error("source nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("`{call}`: {message}")]
    Call { call: String, message: String },
}

impl<'a> From<crate::syntax::Error<&'a str>> for Error {
    fn from(e: crate::syntax::Error<&'a str>) -> Self {
        Self::Parse(e.into_stack_trace())
    }
}

/// Non-fatal problem with an operator argument, recorded by the builder.
///
/// `kind` is the `@type` of the operator that was being built.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct ParameterError {
    pub kind: String,
    pub message: String,
}

/// Path pattern grammar errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("empty path pattern")]
    Empty,

    #[error("unbalanced parentheses in path pattern `{0}`")]
    Unbalanced(String),

    #[error("malformed repetition bound in path pattern `{0}`")]
    Bound(String),

    #[error("path pattern nests groups deeper than {0} levels")]
    TooDeep(usize),

    #[error("path pattern has more than {0} operators")]
    TooLong(usize),

    #[error("{0}")]
    Syntax(String),
}

/// Problems met while rendering a query as source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("malformed path pattern: {0}")]
    Pattern(String),

    #[error("malformed term: {0}")]
    MalformedTerm(String),
}
