//! Path pattern mini-language.
//!
//! | text | node |
//! |------|------|
//! | `hop`, `hop>` | `PathPredicate` |
//! | `<hop` | `InversePathPredicate` |
//! | `<hop>` | `PathOr(PathPredicate, InversePathPredicate)` |
//! | `.` | `PathPredicate` without predicate |
//! | `a,b` | `PathSequence` |
//! | `a\|b` | `PathOr` |
//! | `a+`, `a*`, `a{m,n}` | `PathPlus`, `PathStar`, `PathTimes` |
//!
//! Alternation binds loosest, then sequence, then postfix operators.

mod build;
pub mod parse;
pub mod syn;
pub mod visit;

pub use build::decompile;
pub use parse::compile;
pub use syn::{PathPattern, Precedence};
