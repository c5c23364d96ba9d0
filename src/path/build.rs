use std::fmt::{self, Write};

use crate::path::{
    syn::{PathPattern, Precedence},
    visit::{visit, Visit},
};

/// Where an operand sits relative to its parent operator.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
    Operand,
}

struct Decompile<'a> {
    out: &'a mut dyn Write,
}

impl<'a> Decompile<'a> {
    /// Writes `node`, parenthesised only when the parent would otherwise bind it differently.
    /// Sequence and alternation are right-associative, so a left operand of the same
    /// strength needs parens while a right one does not.
    fn operand(&mut self, node: &PathPattern, parent: Precedence, side: Side) -> fmt::Result {
        let wrap = match side {
            Side::Left => node.precedence() <= parent,
            Side::Right | Side::Operand => node.precedence() < parent,
        };
        if wrap {
            self.out.write_char('(')?;
            visit(node, self)?;
            self.out.write_char(')')
        } else {
            visit(node, self)
        }
    }
}

impl<'ast> Visit<'ast> for Decompile<'_> {
    type Result = fmt::Result;

    fn visit_predicate(&mut self, name: Option<&'ast str>) -> Self::Result {
        match name {
            Some(name) => self.out.write_str(name),
            None => self.out.write_char('.'),
        }
    }

    fn visit_inverse(&mut self, name: &'ast str) -> Self::Result {
        write!(self.out, "<{}", name)
    }

    fn visit_sequence(&mut self, first: &'ast PathPattern, second: &'ast PathPattern) -> Self::Result {
        self.operand(first, Precedence::Sequence, Side::Left)?;
        self.out.write_char(',')?;
        self.operand(second, Precedence::Sequence, Side::Right)
    }

    fn visit_or(&mut self, left: &'ast PathPattern, right: &'ast PathPattern) -> Self::Result {
        if let Some(name) = left.either_name_with(right) {
            return write!(self.out, "<{}>", name);
        }
        self.operand(left, Precedence::Alternative, Side::Left)?;
        self.out.write_char('|')?;
        self.operand(right, Precedence::Alternative, Side::Right)
    }

    fn visit_plus(&mut self, inner: &'ast PathPattern) -> Self::Result {
        self.operand(inner, Precedence::Postfix, Side::Operand)?;
        self.out.write_char('+')
    }

    fn visit_star(&mut self, inner: &'ast PathPattern) -> Self::Result {
        self.operand(inner, Precedence::Postfix, Side::Operand)?;
        self.out.write_char('*')
    }

    fn visit_times(&mut self, inner: &'ast PathPattern, from: u64, to: u64) -> Self::Result {
        self.operand(inner, Precedence::Postfix, Side::Operand)?;
        write!(self.out, "{{{},{}}}", from, to)
    }
}

/// Decompiles into pattern text; `compile(&p.to_string())` gives back `p`.
impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decompile = Decompile { out: f };
        visit(self, &mut decompile)
    }
}

/// Build pattern text.
pub fn decompile(pattern: &PathPattern) -> String {
    pattern.to_string()
}
