use crate::path::syn::PathPattern;

pub trait Visit<'ast> {
    type Result;

    fn visit_predicate(&mut self, _name: Option<&'ast str>) -> Self::Result;
    fn visit_inverse(&mut self, _name: &'ast str) -> Self::Result;
    fn visit_sequence(
        &mut self,
        _first: &'ast PathPattern,
        _second: &'ast PathPattern,
    ) -> Self::Result;
    fn visit_or(&mut self, _left: &'ast PathPattern, _right: &'ast PathPattern) -> Self::Result;
    fn visit_plus(&mut self, _inner: &'ast PathPattern) -> Self::Result;
    fn visit_star(&mut self, _inner: &'ast PathPattern) -> Self::Result;
    fn visit_times(&mut self, _inner: &'ast PathPattern, _from: u64, _to: u64) -> Self::Result;
}

pub fn visit<'ast, V: Visit<'ast>>(node: &'ast PathPattern, visit: &mut V) -> V::Result {
    match node {
        PathPattern::Predicate { predicate } => visit.visit_predicate(predicate.as_deref()),
        PathPattern::Inverse { predicate } => visit.visit_inverse(predicate),
        PathPattern::Sequence { sequence } => visit.visit_sequence(&sequence.0, &sequence.1),
        PathPattern::Or { or } => visit.visit_or(&or.0, &or.1),
        PathPattern::Plus { plus } => visit.visit_plus(plus),
        PathPattern::Star { star } => visit.visit_star(star),
        PathPattern::Times { times, from, to } => visit.visit_times(times, *from, *to),
    }
}

/// Collects predicate names in left-to-right order, duplicates included.
struct Predicates<'ast> {
    names: Vec<&'ast str>,
}

impl<'ast> Visit<'ast> for Predicates<'ast> {
    type Result = ();

    fn visit_predicate(&mut self, name: Option<&'ast str>) {
        if let Some(name) = name {
            self.names.push(name);
        }
    }

    fn visit_inverse(&mut self, name: &'ast str) {
        self.names.push(name);
    }

    fn visit_sequence(&mut self, first: &'ast PathPattern, second: &'ast PathPattern) {
        visit(first, self);
        visit(second, self);
    }

    fn visit_or(&mut self, left: &'ast PathPattern, right: &'ast PathPattern) {
        visit(left, self);
        visit(right, self);
    }

    fn visit_plus(&mut self, inner: &'ast PathPattern) {
        visit(inner, self);
    }

    fn visit_star(&mut self, inner: &'ast PathPattern) {
        visit(inner, self);
    }

    fn visit_times(&mut self, inner: &'ast PathPattern, _from: u64, _to: u64) {
        visit(inner, self);
    }
}

impl PathPattern {
    /// Predicate names mentioned by the pattern.
    pub fn predicates(&self) -> Vec<&str> {
        let mut collect = Predicates { names: Vec::new() };
        visit(self, &mut collect);
        collect.names
    }
}

#[cfg(test)]
mod tests {
    use crate::path::compile;

    #[test]
    fn test_predicates() {
        let pattern = compile("(<parent,child>)+|sibling{1,2}|.").unwrap();
        assert_eq!(pattern.predicates(), vec!["parent", "child", "sibling"]);
    }
}
