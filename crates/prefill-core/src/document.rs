//! Path evaluator contract
//!
//! The document tree and its path-query language live outside the engine.
//! Everything the engine needs from a document goes through [`PathEvaluator`].

use std::collections::HashMap;
use std::fmt::Debug;

/// Named values substituted into a path expression (`$name` references)
pub type Bindings = HashMap<String, String>;

/// Read-only access to a hierarchical document.
///
/// `Node` is a cheap handle into the document owned by the evaluator.
/// Every method answers "nothing" instead of failing: a path that does not
/// resolve is data absence, never an error.
pub trait PathEvaluator {
    type Node: Copy + Debug;

    /// The top-level element of the document
    fn root(&self) -> Option<Self::Node>;

    /// First node selected by `path` relative to `node`
    fn locate(&self, node: Self::Node, path: &str, bindings: &Bindings) -> Option<Self::Node>;

    /// Every node selected by `path` relative to `node`, in document order
    fn locate_all(&self, node: Self::Node, path: &str) -> Vec<Self::Node> {
        self.locate_all_bound(node, path, &Bindings::new())
    }

    /// [`locate_all`](Self::locate_all) with `$name` references resolved
    /// from `bindings`
    fn locate_all_bound(&self, node: Self::Node, path: &str, bindings: &Bindings) -> Vec<Self::Node>;

    fn read_attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Text directly under `node`, ignoring text of nested elements
    fn read_first_level_text(&self, node: Self::Node) -> Option<String>;

    /// Direct child elements named `name`
    fn read_first_level_children_by_name(&self, node: Self::Node, name: &str) -> Vec<Self::Node>;
}
