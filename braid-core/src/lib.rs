//! Braid Core Library
//!
//! Structured binary logging with per-producer streams, paired with an
//! offline analyzer.
//!
//! # Overview
//!
//! Producers write typed, parameterized messages and nested regions into
//! per-producer streams. A shared background pipeline consolidates the
//! streams into one binary `.log` file plus a `.fmt` descriptor file.
//! The analyzer later reads both files, materializes a tree of
//! log/stream/region/message nodes, and exposes a tree algebra
//! (filters, morphological expand/reduce, boolean combination) for
//! post-hoc inspection. A text formatter renders the same pair into
//! per-stream text files.
//!
//! # Key Components
//!
//! - **[`record`]**: the write pipeline: [`Log`](record::Log),
//!   [`Stream`](record::Stream), scoped [`Region`](record::Region)
//!   guards, and the processor/writer threads behind them
//! - **[`schema`]**: message templates, parameter types and build-time
//!   category filters
//! - **[`analyze`]**: the two-pass [`Analyzer`](analyze::Analyzer) and
//!   the [`Tree`](analyze::Tree) flag algebra
//! - **[`format`]**: the human-readable [`Formatter`](format::Formatter)
//! - **[`codec`]**: the on-disk layout shared by all of the above
//!
//! # Example
//!
//! ```no_run
//! use braid_core::prelude::*;
//!
//! braid_core::template! {
//!     struct FrameTime("frame {} took {} ms", category = 2);
//! }
//!
//! // Produce.
//! let log: Log = Log::create("run.log", LogConfig::default())?;
//! let stream = log.create_stream();
//! {
//!     let _frame = stream.region();
//!     stream.message::<FrameTime, _>((1u32, 16u64));
//! }
//! log.close()?;
//!
//! // Analyze.
//! let mut analyzer = Analyzer::new();
//! analyzer.read("run.log")?;
//! let mut tree = Tree::new(&analyzer);
//! tree.filter_category(|flag, category| {
//!     if category >= 2 { flag } else { Flag::Disabled }
//! });
//! # Ok::<(), braid_core::BraidError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyze;
pub mod codec;
pub mod error;
pub mod format;
pub mod prelude;
pub mod record;
pub mod schema;
pub mod types;

// Re-export key types at crate root for convenience
pub use analyze::{Action, Analyzer, Flag, Node, NodeKind, Tree};
pub use codec::{fmt_path, Descriptor};
pub use error::{BraidError, Result};
pub use format::Formatter;
pub use record::{Log, LogConfig, OrderedLog, Region, Stream};
pub use schema::{CategoryFilter, FilterAll, FilterNone, SeverityFilter, Template};
pub use types::{MessageKey, ParameterKey};
