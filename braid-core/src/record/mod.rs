//! The write pipeline: producers to disk.
//!
//! ```text
//! producer ──> Stream front buffer ──(flush: swap)──> Stream back buffer
//!                                                          │ queued
//!                                                          v
//!                        processor thread ──> global front buffer
//!                                                          │ swap
//!                                                          v
//!                        writer thread <── global back buffer ──> .log
//! ```
//!
//! Each stream is single-writer and owns a double buffer; flushing swaps
//! the pair and hands the back buffer to the processor thread, gated by a
//! one-permit availability semaphore. The processor multiplexes queued
//! back buffers into the global front buffer as framed blocks; the
//! writer thread flushes the global back buffer to disk. Producers only
//! ever block on their own stream's availability permit, never on disk.
//!
//! On shutdown the log drains, in order: the residual global front
//! buffer, queued stream back buffers, then unflushed stream front
//! buffers (earlier contents land on disk first), and finally writes
//! the `.fmt` descriptor table.

mod buffer;
mod log;
mod region;
mod stream;
mod sync;

pub use log::{Log, LogConfig, OrderedLog};
pub use region::Region;
pub use stream::{OrderedStream, Stream};
