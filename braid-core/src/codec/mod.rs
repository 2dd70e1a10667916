//! On-disk layout of the `.log` and `.fmt` files.
//!
//! Both files use machine-native endianness; a log is read on the
//! architecture that produced it.
//!
//! # `.log`
//!
//! A headerless concatenation of blocks:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────┐
//! │ stream_index │ payload_size │ payload              │
//! │ (u64)        │ (u64)        │ (payload_size bytes) │
//! └──────────────┴──────────────┴──────────────────────┘
//! ```
//!
//! A payload is a sequence of events, each starting with a `u32` message
//! key: the reserved keys mark region boundaries (a named start is
//! followed by a second `u32` descriptor key), any other key is followed
//! by an optional `u64` ordering index and the parameter bytes declared
//! by the key's descriptor.
//!
//! # `.fmt`
//!
//! ```text
//! stream_count : u64
//! order_flag   : u8
//! descriptors  : repeated until EOF (see [`Descriptor`])
//! ```

mod cursor;
mod descriptor;

pub use descriptor::{fmt_path, Descriptor};

pub(crate) use cursor::Cursor;
pub(crate) use descriptor::{read_fmt, write_fmt};

/// Size of a block header: stream index plus payload size.
pub(crate) const BLOCK_HEADER_SIZE: usize = 16;

/// Size of an event key on disk.
pub(crate) const KEY_SIZE: usize = 4;

/// Size of a message ordering index on disk.
pub(crate) const ORDER_INDEX_SIZE: usize = 8;
