use std::fmt::{self, Write};

use serde_json::{Number, Value};

/// Anything the source writer can emit as a single token.
pub trait Source {
    fn write(&self, w: &mut dyn Write) -> fmt::Result;
}

/// Strings are quoted with JSON escapes so the reader can take them back verbatim.
impl Source for &str {
    fn write(&self, w: &mut dyn Write) -> fmt::Result {
        let quoted = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        w.write_str(&quoted)
    }
}

impl Source for &Number {
    fn write(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", self)
    }
}

impl Source for u64 {
    fn write(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", self)
    }
}

impl Source for bool {
    fn write(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", self)
    }
}

/// Compact JSON.
impl Source for &Value {
    fn write(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", self)
    }
}

/// Source text writer.
///
/// Keeps track of parentheses, separators and block indentation:
///
/// ```rust
/// use woql::printer::Writer;
///
/// let mut s = String::new();
/// let mut w = Writer::new(&mut s, 2);
///
/// let _ = w.call("and", true, |args| {
///     args.with(|w| w.call("true", false, |_| Ok(())))?;
///     args.with(|w| {
///         w.call("limit", false, |args| args.arg(10))?;
///         w.raw(".")?;
///         w.call("star", false, |_| Ok(()))
///     })
/// });
///
/// assert_eq!(s, "and(\n  true(),\n  limit(10).star()\n)");
/// ```
pub struct Writer<'a> {
    out: &'a mut dyn Write,
    level: usize,
    step: usize,
}

impl<'a> Writer<'a> {
    pub fn new(out: &'a mut dyn Write, step: usize) -> Self {
        Self { out, level: 0, step }
    }

    pub fn value<V>(&mut self, value: V) -> fmt::Result
    where
        V: Source,
    {
        value.write(self.out)
    }

    pub fn raw(&mut self, text: &str) -> fmt::Result {
        self.out.write_str(text)
    }

    /// `name(args..)`; in `block` mode one argument per line.
    pub fn call<F>(&mut self, name: &str, block: bool, f: F) -> fmt::Result
    where
        F: FnOnce(&mut ArgWriter) -> fmt::Result,
    {
        write!(self.out, "{}(", name)?;
        let mut args = ArgWriter {
            out: self.out,
            empty: true,
            block,
            level: self.level,
            step: self.step,
        };
        f(&mut args)?;
        if block && !args.empty {
            self.out.write_char('\n')?;
            self.indent(self.level)?;
        }
        self.out.write_char(')')
    }

    /// `[items..]`
    pub fn list<F>(&mut self, f: F) -> fmt::Result
    where
        F: FnOnce(&mut ArgWriter) -> fmt::Result,
    {
        self.out.write_char('[')?;
        let mut items = ArgWriter {
            out: self.out,
            empty: true,
            block: false,
            level: self.level,
            step: self.step,
        };
        f(&mut items)?;
        self.out.write_char(']')
    }

    fn indent(&mut self, level: usize) -> fmt::Result {
        write!(self.out, "{:width$}", "", width = level * self.step)
    }
}

/// Comma-separated arguments of a call or items of a list.
pub struct ArgWriter<'a> {
    out: &'a mut dyn Write,
    empty: bool,
    block: bool,
    level: usize,
    step: usize,
}

impl<'a> ArgWriter<'a> {
    fn write_sep(&mut self) -> fmt::Result {
        if !self.empty {
            self.out.write_char(',')?;
            if !self.block {
                self.out.write_char(' ')?;
            }
        }
        if self.block {
            self.out.write_char('\n')?;
            write!(self.out, "{:width$}", "", width = (self.level + 1) * self.step)?;
        }
        self.empty = false;
        Ok(())
    }

    pub fn arg<V>(&mut self, value: V) -> fmt::Result
    where
        V: Source,
    {
        self.write_sep()?;
        value.write(self.out)
    }

    /// Nested argument written through a full writer.
    pub fn with<F>(&mut self, f: F) -> fmt::Result
    where
        F: FnOnce(&mut Writer) -> fmt::Result,
    {
        self.write_sep()?;
        let level = if self.block { self.level + 1 } else { self.level };
        let mut w = Writer {
            out: self.out,
            level,
            step: self.step,
        };
        f(&mut w)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Writer;

    #[test]
    fn test_call_writer() {
        let mut s = String::new();
        let mut w = Writer::new(&mut s, 4);
        let doc = json!({"a": [1, "x"]});

        let _ = w.call("insert_document", false, |args| {
            args.with(|w| w.call("doc", false, |args| args.arg(&doc)))?;
            args.with(|w| {
                w.list(|items| {
                    items.arg("v:A")?;
                    items.arg("say \"hi\"")?;
                    items.arg(true)
                })
            })
        });

        assert_eq!(
            s,
            r#"insert_document(doc({"a":[1,"x"]}), ["v:A", "say \"hi\"", true])"#
        );
    }

    #[test]
    fn test_nested_blocks() {
        let mut s = String::new();
        let mut w = Writer::new(&mut s, 2);

        let _ = w.call("or", true, |args| {
            args.with(|w| {
                w.call("and", true, |args| {
                    args.arg("a")?;
                    args.arg("b")
                })
            })?;
            args.arg(1u64)
        });

        assert_eq!(s, "or(\n  and(\n    \"a\",\n    \"b\"\n  ),\n  1\n)");
    }

    #[test]
    fn test_empty_block() {
        let mut s = String::new();
        let mut w = Writer::new(&mut s, 2);
        let _ = w.call("and", true, |_| Ok(()));
        assert_eq!(s, "and()");
    }
}
