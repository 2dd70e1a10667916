//! Two-pass reconstruction of the log tree.

use super::node::{Node, NodeKind};
use super::tree::Tree;
use crate::codec::{self, Cursor, Descriptor};
use crate::error::{BraidError, Result};
use crate::schema::{hash_str, Parameter};
use crate::types::{MessageKey, ParameterKey};
use std::collections::HashMap;
use std::path::Path;

/// A descriptor enriched with the byte sizes the analyzer derived from
/// its parameter catalog.
#[derive(Debug)]
pub struct FormatInfo {
    /// The descriptor as read from the `.fmt` file.
    pub descriptor: Descriptor,
    /// Hash of the template text, used by message queries.
    pub message_hash: u32,
    /// Byte size of each parameter, in descriptor order.
    pub parameter_sizes: Vec<usize>,
    /// Sum of all parameter sizes.
    pub payload_size: usize,
}

/// Per-region bookkeeping of the sizing pass. The first `stream_count`
/// entries stand for the stream roots; one entry is appended per region
/// in discovery order, which the populate pass replays.
struct GroupScan {
    parent: usize,
    group_children: usize,
    message_children: usize,
}

impl GroupScan {
    fn new(parent: usize) -> Self {
        Self {
            parent,
            group_children: 0,
            message_children: 0,
        }
    }

    fn child_count(&self) -> usize {
        self.group_children + self.message_children
    }
}

/// Reads a `.log`/`.fmt` pair and owns the reconstructed node tree.
///
/// The standard integer and floating-point parameter types are
/// pre-registered; call [`Analyzer::register_parameter`] before
/// [`Analyzer::read`] for custom ones. All read errors are terminal:
/// the analyzer does not attempt partial recovery.
pub struct Analyzer {
    parameters: HashMap<ParameterKey, usize>,
    formats: HashMap<MessageKey, FormatInfo>,
    stream_count: usize,
    ordered: bool,
    data: Vec<u8>,
    nodes: Vec<Node>,
}

impl Analyzer {
    /// Create an analyzer with the default parameter catalog.
    #[must_use]
    pub fn new() -> Self {
        fn put<T: Parameter>(catalog: &mut HashMap<ParameterKey, usize>) {
            catalog.insert(T::KEY, T::SIZE);
        }

        let mut parameters = HashMap::new();
        put::<i8>(&mut parameters);
        put::<u8>(&mut parameters);
        put::<i16>(&mut parameters);
        put::<u16>(&mut parameters);
        put::<i32>(&mut parameters);
        put::<u32>(&mut parameters);
        put::<i64>(&mut parameters);
        put::<u64>(&mut parameters);
        put::<f32>(&mut parameters);
        put::<f64>(&mut parameters);

        Self {
            parameters,
            formats: HashMap::new(),
            stream_count: 0,
            ordered: false,
            data: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Register an additional parameter type.
    pub fn register_parameter<T: Parameter>(&mut self) -> Result<()> {
        if T::KEY.is_wildcard() {
            return Err(BraidError::WildcardParameter);
        }
        if self.parameters.insert(T::KEY, T::SIZE).is_some() {
            return Err(BraidError::DuplicateParameter { key: T::KEY });
        }
        Ok(())
    }

    /// The reconstructed node array; index 0 is the log root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of streams in the log.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.stream_count
    }

    /// Whether messages carry ordering indices.
    #[must_use]
    pub fn message_order(&self) -> bool {
        self.ordered
    }

    /// Look up the format info behind a message key.
    #[must_use]
    pub fn format(&self, key: MessageKey) -> Option<&FormatInfo> {
        self.formats.get(&key)
    }

    /// Borrow the parameter payload of a message node.
    #[must_use]
    pub fn payload_of(&self, node: &Node) -> Option<&[u8]> {
        let offset = node.payload?;
        let info = self.formats.get(&node.format?)?;
        Some(&self.data[offset..offset + info.payload_size])
    }

    /// Emit the tree as a DOT digraph, optionally pruned by a tree's
    /// flag vector (disabled subtrees render as red leaves).
    pub fn write_graph(&self, path: &Path, tree: Option<&Tree<'_>>) -> Result<()> {
        super::graph::write_graph(self, path, tree)
    }

    /// Read a log file (and its sibling `.fmt`) and build the node tree,
    /// replacing any previously read contents.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.load_formats(&codec::fmt_path(path))?;

        self.data = std::fs::read(path).map_err(|e| BraidError::LogOpen {
            path: path.to_owned(),
            cause: e.to_string(),
        })?;

        let (groups, region_count, message_count) = self.size_pass()?;
        self.populate_pass(&groups, region_count, message_count)
    }

    fn load_formats(&mut self, fmt_path: &Path) -> Result<()> {
        let fmt = codec::read_fmt(fmt_path)?;
        self.stream_count = fmt.stream_count;
        self.ordered = fmt.ordered;

        self.formats = HashMap::with_capacity(fmt.descriptors.len());
        for (key, descriptor) in fmt.descriptors {
            let mut parameter_sizes = Vec::with_capacity(descriptor.parameters.len());
            for &param in &descriptor.parameters {
                let size = self
                    .parameters
                    .get(&param)
                    .copied()
                    .ok_or(BraidError::UnknownParameter {
                        key: param,
                        descriptor: key,
                    })?;
                parameter_sizes.push(size);
            }
            let payload_size = parameter_sizes.iter().sum();
            let message_hash = hash_str(&descriptor.message);
            self.formats.insert(
                key,
                FormatInfo {
                    descriptor,
                    message_hash,
                    parameter_sizes,
                    payload_size,
                },
            );
        }
        Ok(())
    }

    /// Pass 1: count regions, messages and per-parent children so that
    /// pass 2 can place every node into a pre-sized array.
    fn size_pass(&self) -> Result<(Vec<GroupScan>, usize, usize)> {
        let mut groups: Vec<GroupScan> = (0..self.stream_count).map(GroupScan::new).collect();
        let mut active: Vec<usize> = (0..self.stream_count).collect();
        let mut region_count = 0usize;
        let mut message_count = 0usize;

        let mut cursor = Cursor::new(&self.data);
        while !cursor.is_empty() {
            let stream = cursor.read_u64()? as usize;
            if stream >= self.stream_count {
                return Err(BraidError::UnknownStream {
                    stream,
                    stream_count: self.stream_count,
                });
            }
            let payload_size = cursor.read_u64()? as usize;
            let block_end = cursor.pos() + payload_size;
            if block_end > self.data.len() {
                return Err(BraidError::BlockBounds {
                    stream,
                    offset: cursor.pos(),
                });
            }

            while cursor.pos() < block_end {
                let event_offset = cursor.pos();
                let key = MessageKey::new(cursor.read_u32()?);
                if key == MessageKey::ANONYMOUS_REGION_START || key == MessageKey::NAMED_REGION_START
                {
                    if key == MessageKey::NAMED_REGION_START {
                        let named = MessageKey::new(cursor.read_u32()?);
                        if !self.formats.contains_key(&named) {
                            return Err(BraidError::UnknownMessageKey {
                                key: named,
                                offset: event_offset,
                            });
                        }
                    }
                    groups[active[stream]].group_children += 1;
                    let parent = active[stream];
                    groups.push(GroupScan::new(parent));
                    active[stream] = groups.len() - 1;
                    region_count += 1;
                } else if key == MessageKey::REGION_END {
                    if active[stream] < self.stream_count {
                        return Err(BraidError::UnbalancedRegion { stream });
                    }
                    active[stream] = groups[active[stream]].parent;
                } else {
                    let info = self
                        .formats
                        .get(&key)
                        .ok_or(BraidError::UnknownMessageKey {
                            key,
                            offset: event_offset,
                        })?;
                    if self.ordered {
                        cursor.skip(8)?;
                    }
                    cursor.skip(info.payload_size)?;
                    groups[active[stream]].message_children += 1;
                    message_count += 1;
                }
                if cursor.pos() > block_end {
                    return Err(BraidError::BlockBounds {
                        stream,
                        offset: event_offset,
                    });
                }
            }
        }

        // Every region must have been closed.
        for (stream, &parent) in active.iter().enumerate() {
            if parent != stream {
                return Err(BraidError::UnbalancedRegion { stream });
            }
        }

        Ok((groups, region_count, message_count))
    }

    /// Pass 2: place region and message nodes into the exact-size array,
    /// assigning each parent its contiguous child range.
    fn populate_pass(
        &mut self,
        groups: &[GroupScan],
        region_count: usize,
        message_count: usize,
    ) -> Result<()> {
        let total = 1 + self.stream_count + region_count + message_count;
        let mut nodes: Vec<Node> = Vec::with_capacity(total);
        nodes.resize_with(total, Node::default);

        nodes[0].kind = NodeKind::Log;
        nodes[0].child_count = self.stream_count;
        if self.stream_count > 0 {
            nodes[0].first_child = Some(1);
        }

        // Regions were appended to `groups` in discovery order, so a
        // single increasing index pairs each region-start event with its
        // scan entry.
        let mut next_group = self.stream_count;
        // First free slot of the node array; advanced by whole child
        // ranges as parents claim them.
        let mut next_index = 1 + self.stream_count;

        for i in 0..self.stream_count {
            nodes[1 + i].kind = NodeKind::Stream;
            nodes[1 + i].parent = Some(0);
            let children = groups[i].child_count();
            if children > 0 {
                nodes[1 + i].first_child = Some(next_index);
                next_index += children;
            }
        }

        let mismatch = |expected: usize, actual: usize| BraidError::NodeCountMismatch {
            expected,
            actual,
        };

        let mut active: Vec<usize> = (1..=self.stream_count).collect();
        let mut cursor = Cursor::new(&self.data);
        while !cursor.is_empty() {
            let stream = cursor.read_u64()? as usize;
            let payload_size = cursor.read_u64()? as usize;
            let block_end = cursor.pos() + payload_size;

            while cursor.pos() < block_end {
                let key = MessageKey::new(cursor.read_u32()?);
                if key == MessageKey::ANONYMOUS_REGION_START || key == MessageKey::NAMED_REGION_START
                {
                    let format = if key == MessageKey::NAMED_REGION_START {
                        Some(MessageKey::new(cursor.read_u32()?))
                    } else {
                        None
                    };

                    let parent = active[stream];
                    let first = nodes[parent]
                        .first_child
                        .ok_or_else(|| mismatch(total, next_index))?;
                    let slot = first + nodes[parent].child_count;
                    nodes[parent].child_count += 1;

                    nodes[slot].kind = NodeKind::Region;
                    nodes[slot].format = format;
                    nodes[slot].parent = Some(parent);

                    let children = groups[next_group].child_count();
                    next_group += 1;
                    if children > 0 {
                        nodes[slot].first_child = Some(next_index);
                        next_index += children;
                    }

                    active[stream] = slot;
                } else if key == MessageKey::REGION_END {
                    active[stream] = nodes[active[stream]]
                        .parent
                        .ok_or_else(|| mismatch(total, next_index))?;
                } else {
                    let info = self
                        .formats
                        .get(&key)
                        .ok_or(BraidError::UnknownMessageKey {
                            key,
                            offset: cursor.pos(),
                        })?;

                    let parent = active[stream];
                    let first = nodes[parent]
                        .first_child
                        .ok_or_else(|| mismatch(total, next_index))?;
                    let slot = first + nodes[parent].child_count;
                    nodes[parent].child_count += 1;

                    nodes[slot].kind = NodeKind::Message;
                    nodes[slot].format = Some(key);
                    nodes[slot].parent = Some(parent);
                    if self.ordered {
                        nodes[slot].order_index = cursor.read_u64()?;
                    }
                    if info.payload_size > 0 {
                        nodes[slot].payload = Some(cursor.pos());
                        cursor.skip(info.payload_size)?;
                    }
                }
            }
        }

        if next_index != total || next_group != groups.len() {
            return Err(mismatch(total, next_index));
        }

        self.nodes = nodes;
        Ok(())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
