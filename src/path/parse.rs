use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{all_consuming, cut, map, map_res, value},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
};

use crate::error::CompileError;
use crate::path::syn::PathPattern;
use crate::syntax::{ws, Error, IResult};

const BOUND: &str = "repetition bound";

/// Deepest group nesting `compile` accepts.
pub const MAX_DEPTH: usize = 64;

/// Most operators `compile` accepts in one pattern.
pub const MAX_STEPS: usize = 256;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || "_-:@#".contains(c)
}

/// Predicate name
///
/// ```rust
/// use woql::path::parse::name;
///
/// assert_eq!(name("hop,"), Ok((",", "hop")));
/// assert_eq!(name("scm:friend_of>"), Ok((">", "scm:friend_of")));
/// ```
pub fn name(input: &str) -> IResult<&str, &str> {
    context("predicate name", take_while1(is_name_char))(input)
}

/// Single step: `name`, `name>`, `<name`, `<name>` or `.`
///
/// ```rust
/// use woql::path::parse::atom;
/// use woql::path::PathPattern;
///
/// assert_eq!(atom("hop;"), Ok((";", PathPattern::predicate("hop"))));
/// assert_eq!(atom("hop>;"), Ok((";", PathPattern::predicate("hop"))));
/// assert_eq!(atom("<hop;"), Ok((";", PathPattern::inverse("hop"))));
/// assert_eq!(atom("<hop>;"), Ok((";", PathPattern::either("hop"))));
/// assert_eq!(atom(".;"), Ok((";", PathPattern::any())));
/// ```
pub fn atom(input: &str) -> IResult<&str, PathPattern> {
    context(
        "path step",
        alt((
            map(delimited(char('<'), name, char('>')), PathPattern::either),
            map(preceded(char('<'), name), PathPattern::inverse),
            map(terminated(name, char('>')), PathPattern::predicate),
            map(name, PathPattern::predicate),
            value(PathPattern::any(), char('.')),
        )),
    )(input)
}

fn group(input: &str) -> IResult<&str, PathPattern> {
    context(
        "group",
        delimited(
            ws(char('(')),
            alternation,
            context("closing paren", ws(char(')'))),
        ),
    )(input)
}

fn primary(input: &str) -> IResult<&str, PathPattern> {
    ws(alt((group, atom)))(input)
}

/// Repetition bound `{m,n}` with `m <= n`
///
/// ```rust
/// use woql::path::parse::bound;
///
/// assert_eq!(bound("{1,3};"), Ok((";", (1, 3))));
/// assert_eq!(bound("{ 2 , 2 };"), Ok((";", (2, 2))));
/// assert!(bound("{3,1}").is_err());
/// assert!(bound("{1}").is_err());
/// ```
pub fn bound(input: &str) -> IResult<&str, (u64, u64)> {
    context(
        BOUND,
        preceded(
            char('{'),
            cut(map_res(
                terminated(separated_pair(ws(digit1), char(','), ws(digit1)), char('}')),
                |(from, to): (&str, &str)| -> Result<(u64, u64), &'static str> {
                    let from = from.parse::<u64>().map_err(|_| "lower bound out of range")?;
                    let to = to.parse::<u64>().map_err(|_| "upper bound out of range")?;
                    if from > to {
                        return Err("lower bound exceeds upper bound");
                    }
                    Ok((from, to))
                },
            )),
        ),
    )(input)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Suffix {
    Plus,
    Star,
    Times(u64, u64),
}

fn suffix(input: &str) -> IResult<&str, Suffix> {
    ws(alt((
        value(Suffix::Plus, char('+')),
        value(Suffix::Star, char('*')),
        map(bound, |(from, to)| Suffix::Times(from, to)),
    )))(input)
}

/// Step followed by any number of postfix operators, applied left to right.
///
/// ```rust
/// use woql::path::parse::postfix;
/// use woql::path::PathPattern;
///
/// assert_eq!(postfix("hop+*;"), Ok((";", PathPattern::star(PathPattern::plus(PathPattern::predicate("hop"))))));
/// ```
pub fn postfix(input: &str) -> IResult<&str, PathPattern> {
    map(pair(primary, many0(suffix)), |(operand, suffixes)| {
        suffixes
            .into_iter()
            .fold(operand, |operand, suffix| match suffix {
                Suffix::Plus => PathPattern::plus(operand),
                Suffix::Star => PathPattern::star(operand),
                Suffix::Times(from, to) => PathPattern::times(operand, from, to),
            })
    })(input)
}

/// Joins `first` and `rest` so that `a,b,c` nests as `a,(b,c)`.
fn fold_right(
    first: PathPattern,
    rest: Vec<PathPattern>,
    join: fn(PathPattern, PathPattern) -> PathPattern,
) -> PathPattern {
    let mut operands = rest.into_iter().rev();
    match operands.next() {
        Some(last) => join(first, operands.fold(last, |tail, item| join(item, tail))),
        None => first,
    }
}

/// `a,b,c` is `a,(b,c)`
pub fn sequence(input: &str) -> IResult<&str, PathPattern> {
    map(
        pair(postfix, many0(preceded(char(','), cut(postfix)))),
        |(first, rest)| fold_right(first, rest, PathPattern::sequence),
    )(input)
}

/// `a|b|c` is `a|(b|c)`
pub fn alternation(input: &str) -> IResult<&str, PathPattern> {
    map(
        pair(sequence, many0(preceded(char('|'), cut(sequence)))),
        |(first, rest)| fold_right(first, rest, PathPattern::or),
    )(input)
}

/// Whole pattern, surrounding whitespace allowed.
///
/// ```rust
/// use woql::path::parse::pattern;
/// use woql::path::PathPattern;
///
/// assert_eq!(pattern(" a | b , c "), Ok(("", PathPattern::or(
///     PathPattern::predicate("a"),
///     PathPattern::sequence(PathPattern::predicate("b"), PathPattern::predicate("c")),
/// ))));
/// ```
pub fn pattern(input: &str) -> IResult<&str, PathPattern> {
    context("path pattern", all_consuming(ws(alternation)))(input)
}

/// Deepest group nesting, `None` when parentheses do not balance.
fn nesting(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut deepest = 0;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    (depth == 0).then_some(deepest)
}

/// Operators in the text; bounds the depth of the compiled tree.
fn steps(input: &str) -> usize {
    input.chars().filter(|c| ",|+*{".contains(*c)).count()
}

/// Compiles path pattern text.
pub fn compile(input: &str) -> Result<PathPattern, CompileError> {
    if input.trim().is_empty() {
        return Err(CompileError::Empty);
    }
    match nesting(input) {
        None => return Err(CompileError::Unbalanced(input.to_string())),
        Some(depth) if depth > MAX_DEPTH => return Err(CompileError::TooDeep(MAX_DEPTH)),
        Some(_) => {}
    }
    if steps(input) > MAX_STEPS {
        return Err(CompileError::TooLong(MAX_STEPS));
    }
    match pattern(input) {
        Ok((_, compiled)) => Ok(compiled),
        Err(cause) => {
            let err = Error { input, cause };
            if err.has_context(BOUND) {
                Err(CompileError::Bound(input.to_string()))
            } else {
                Err(CompileError::Syntax(err.into_stack_trace()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::path::parse::{compile, MAX_DEPTH, MAX_STEPS};
    use crate::path::syn::PathPattern;

    fn p(name: &str) -> PathPattern {
        PathPattern::predicate(name)
    }

    #[test]
    fn test_compile() {
        let test_cases = vec![
            ("hop", p("hop")),
            (".", PathPattern::any()),
            ("<hop", PathPattern::inverse("hop")),
            ("hop>", p("hop")),
            ("<hop>", PathPattern::either("hop")),
            ("a,b", PathPattern::sequence(p("a"), p("b"))),
            (
                "a,b,c",
                PathPattern::sequence(p("a"), PathPattern::sequence(p("b"), p("c"))),
            ),
            (
                "a|b,c",
                PathPattern::or(p("a"), PathPattern::sequence(p("b"), p("c"))),
            ),
            (
                "(a|b),c",
                PathPattern::sequence(PathPattern::or(p("a"), p("b")), p("c")),
            ),
            ("a+", PathPattern::plus(p("a"))),
            ("a*", PathPattern::star(p("a"))),
            ("a{2,5}", PathPattern::times(p("a"), 2, 5)),
            (
                "a,b+",
                PathPattern::sequence(p("a"), PathPattern::plus(p("b"))),
            ),
            (
                "(<hop,hop>)+",
                PathPattern::plus(PathPattern::sequence(
                    PathPattern::inverse("hop"),
                    p("hop"),
                )),
            ),
            ("((a))", p("a")),
            (
                " scm:parent , <scm:child ",
                PathPattern::sequence(p("scm:parent"), PathPattern::inverse("scm:child")),
            ),
        ];

        for (text, expected) in test_cases {
            assert_eq!(compile(text), Ok(expected), "compiling `{}`", text);
        }
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(compile(""), Err(CompileError::Empty));
        assert_eq!(compile("   "), Err(CompileError::Empty));
        assert_eq!(
            compile("(a,b"),
            Err(CompileError::Unbalanced("(a,b".to_string()))
        );
        assert_eq!(
            compile("a,b)"),
            Err(CompileError::Unbalanced("a,b)".to_string()))
        );
        assert_eq!(
            compile("a{3,1}"),
            Err(CompileError::Bound("a{3,1}".to_string()))
        );
        assert_eq!(
            compile("a{x,2}"),
            Err(CompileError::Bound("a{x,2}".to_string()))
        );
        assert_eq!(
            compile("a{2}"),
            Err(CompileError::Bound("a{2}".to_string()))
        );
        assert!(matches!(compile("a,"), Err(CompileError::Syntax(_))));
        assert!(matches!(compile("a b"), Err(CompileError::Syntax(_))));
        assert!(matches!(compile("|a"), Err(CompileError::Syntax(_))));
    }

    #[test]
    fn test_compile_limits() {
        let deep = |n: usize| format!("{}a{}", "(".repeat(n), ")".repeat(n));
        let long = |n: usize| vec!["a"; n + 1].join(",");

        let test_cases = vec![
            (deep(MAX_DEPTH), true),
            (deep(MAX_DEPTH + 1), false),
            (deep(10_000), false),
            (long(MAX_STEPS), true),
            (long(MAX_STEPS + 1), false),
            (format!("a{}", "+".repeat(10_000)), false),
            (vec!["a"; 10_000].join("|"), false),
        ];

        for (text, ok) in test_cases {
            assert_eq!(compile(&text).is_ok(), ok, "compiling {} chars", text.len());
        }
        assert_eq!(compile(&deep(10_000)), Err(CompileError::TooDeep(MAX_DEPTH)));
        assert_eq!(compile(&long(10_000)), Err(CompileError::TooLong(MAX_STEPS)));
    }
}
