//! Nodes of the reconstructed log tree.

use crate::types::MessageKey;

/// What a tree node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The single root of the tree.
    Log,
    /// One per-producer stream; child of the root.
    Stream,
    /// A region delimited by start/end markers.
    Region,
    /// A single logged message.
    Message,
}

/// One node of the reconstructed tree.
///
/// All edges are indices into the analyzer's node array; children of a
/// node occupy the contiguous range starting at `first_child`. Payload
/// references are byte offsets into the analyzer's raw log buffer.
#[derive(Debug)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Descriptor key of messages and named regions.
    pub format: Option<MessageKey>,
    /// Global ordering index; meaningful for messages of ordered logs.
    pub order_index: u64,
    /// Parent node index; `None` only for the root.
    pub parent: Option<usize>,
    /// Index of the first child; `None` when the node has no children.
    pub first_child: Option<usize>,
    /// Number of children.
    pub child_count: usize,
    /// Byte offset of the parameter payload in the raw log buffer.
    pub payload: Option<usize>,
}

impl Node {
    /// Whether this node can parent others in sibling windows
    /// (streams and regions).
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Stream | NodeKind::Region)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self {
            kind: NodeKind::Log,
            format: None,
            order_index: 0,
            parent: None,
            first_child: None,
            child_count: 0,
            payload: None,
        }
    }
}
