//! Offline analysis: reconstructing a log as a tree and filtering it.
//!
//! The [`Analyzer`] reads a `.log`/`.fmt` pair and materializes one
//! contiguous node array (the log root, one node per stream, and one
//! per region and message) with parent and first-child edges stored as
//! indices. A [`Tree`] is a flag vector parallel to that array, carrying
//! Enabled/Disabled marks that filters, morphological expand/reduce and
//! boolean combination operate on; the node array itself never changes
//! shape.

mod analyzer;
mod graph;
mod node;
mod tree;

pub use analyzer::{Analyzer, FormatInfo};
pub use node::{Node, NodeKind};
pub use tree::{Action, Flag, Tree};
