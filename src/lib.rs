//! Builds WOQL queries as JSON-LD trees and renders them back as source text.
//!
//! Queries are assembled through chained calls on [`WoqlQuery`]. A few examples
//! of calls and the trees they produce:
//!
//! - `triple("v:S", "label", "hello")` -> `{"@type":"Triple","subject":{"@type":"NodeValue","variable":"S"},..}`
//! - `limit(10, None).star()` -> `{"@type":"Limit","limit":10,"query":{"@type":"Triple",..}}`
//! - `path("v:A", "(<hop,hop>)+", "v:B", None)` -> `{"@type":"Path","pattern":{"@type":"PathPlus",..},..}`
//! - `and(vec![and(vec![a, b]), c])` -> `{"@type":"And","and":[a,b,c]}`
//!
//! Trees render to the chained call syntax with [`render`] and read back with [`read`].

pub mod error;
pub mod path;
pub mod printer;
pub mod query;
pub mod reader;
pub mod syntax;
pub mod term;
pub mod vocab;

pub use printer::render;
pub use query::{contains_update, WoqlQuery};
pub use reader::read;
pub use vocab::Vocabulary;

/// Compile path pattern text to its JSON tree
///
/// ```rust
/// use woql::compile_path;
/// use serde_json::json;
///
/// assert_eq!(
///     compile_path("hop{1,3}"),
///     Ok(json!({"@type": "PathTimes", "from": 1, "to": 3, "times": {"@type": "PathPredicate", "predicate": "hop"}}))
/// );
/// assert!(compile_path("(hop").is_err());
/// assert!(compile_path(&format!("{}hop{}", "(".repeat(10_000), ")".repeat(10_000))).is_err());
/// ```
pub fn compile_path(pattern: &str) -> Result<serde_json::Value, error::Error> {
    let compiled = path::compile(pattern)?;
    serde_json::to_value(&compiled).map_err(|e| error::Error::Parse(e.to_string()))
}

/// Decompile a path pattern JSON tree back to text
///
/// ```rust
/// use woql::{compile_path, decompile_path};
///
/// let tree = compile_path("(<hop,hop>)+").unwrap();
/// assert_eq!(decompile_path(&tree), Ok("(<hop,hop)+".to_string()));
/// ```
pub fn decompile_path(tree: &serde_json::Value) -> Result<String, error::Error> {
    // walk a typed pattern rather than raw JSON
    let pattern: path::PathPattern =
        serde_json::from_value(tree.clone()).map_err(|e| error::Error::Parse(e.to_string()))?;
    Ok(path::decompile(&pattern))
}
