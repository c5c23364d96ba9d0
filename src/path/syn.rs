use serde::{Deserialize, Serialize};

/// Path pattern syntax tree.
///
/// Serializes to the tagged JSON shape the server expects as the `pattern`
/// field of a `Path` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum PathPattern {
    /// `hop`, `hop>`, or `.` when `predicate` is `None`
    #[serde(rename = "PathPredicate")]
    Predicate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicate: Option<String>,
    },
    /// `<hop`
    #[serde(rename = "InversePathPredicate")]
    Inverse { predicate: String },
    /// `a,b`
    #[serde(rename = "PathSequence")]
    Sequence {
        sequence: (Box<PathPattern>, Box<PathPattern>),
    },
    /// `a|b`
    #[serde(rename = "PathOr")]
    Or { or: (Box<PathPattern>, Box<PathPattern>) },
    /// `a+`
    #[serde(rename = "PathPlus")]
    Plus { plus: Box<PathPattern> },
    /// `a*`
    #[serde(rename = "PathStar")]
    Star { star: Box<PathPattern> },
    /// `a{m,n}`
    #[serde(rename = "PathTimes")]
    Times {
        times: Box<PathPattern>,
        from: u64,
        to: u64,
    },
}

/// Binding strength of path operators, loosest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Alternative, // |
    Sequence,    // ,
    Postfix,     // + * {m,n}
    Atom,        // names, `.`, `<name>`, groups
}

impl PathPattern {
    pub fn predicate(name: &str) -> Self {
        Self::Predicate {
            predicate: Some(name.to_string()),
        }
    }

    pub fn any() -> Self {
        Self::Predicate { predicate: None }
    }

    pub fn inverse(name: &str) -> Self {
        Self::Inverse {
            predicate: name.to_string(),
        }
    }

    /// `<name>`: the predicate followed in either direction.
    pub fn either(name: &str) -> Self {
        Self::or(Self::predicate(name), Self::inverse(name))
    }

    pub fn sequence(first: PathPattern, second: PathPattern) -> Self {
        Self::Sequence {
            sequence: (Box::new(first), Box::new(second)),
        }
    }

    pub fn or(left: PathPattern, right: PathPattern) -> Self {
        Self::Or {
            or: (Box::new(left), Box::new(right)),
        }
    }

    pub fn plus(inner: PathPattern) -> Self {
        Self::Plus {
            plus: Box::new(inner),
        }
    }

    pub fn star(inner: PathPattern) -> Self {
        Self::Star {
            star: Box::new(inner),
        }
    }

    pub fn times(inner: PathPattern, from: u64, to: u64) -> Self {
        Self::Times {
            times: Box::new(inner),
            from,
            to,
        }
    }

    /// Name of the predicate when `self` is the `<name>` shorthand.
    pub fn either_name(&self) -> Option<&str> {
        match self {
            Self::Or { or: (left, right) } => left.either_name_with(right),
            _ => None,
        }
    }

    /// Shared predicate name when `self | other` is the `<name>` shorthand.
    pub(crate) fn either_name_with<'a>(&'a self, other: &PathPattern) -> Option<&'a str> {
        match (self, other) {
            (
                Self::Predicate {
                    predicate: Some(forward),
                },
                Self::Inverse { predicate: inverse },
            ) if forward == inverse => Some(forward),
            _ => None,
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Or { .. } if self.either_name().is_some() => Precedence::Atom,
            Self::Or { .. } => Precedence::Alternative,
            Self::Sequence { .. } => Precedence::Sequence,
            Self::Plus { .. } | Self::Star { .. } | Self::Times { .. } => Precedence::Postfix,
            Self::Predicate { .. } | Self::Inverse { .. } => Precedence::Atom,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PathPattern;

    #[test]
    fn test_json_shape() {
        let pattern = PathPattern::times(
            PathPattern::sequence(PathPattern::inverse("hop"), PathPattern::any()),
            1,
            3,
        );

        let expected = json!({
            "@type": "PathTimes",
            "times": {
                "@type": "PathSequence",
                "sequence": [
                    {"@type": "InversePathPredicate", "predicate": "hop"},
                    {"@type": "PathPredicate"},
                ],
            },
            "from": 1,
            "to": 3,
        });

        assert_eq!(serde_json::to_value(&pattern).unwrap(), expected);
        assert_eq!(
            serde_json::from_value::<PathPattern>(expected).unwrap(),
            pattern
        );
    }

    #[test]
    fn test_either_name() {
        assert_eq!(PathPattern::either("knows").either_name(), Some("knows"));
        assert_eq!(
            PathPattern::or(PathPattern::predicate("a"), PathPattern::inverse("b")).either_name(),
            None
        );
    }
}
