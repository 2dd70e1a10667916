//! Prelude for convenient imports.
//!
//! ```
//! use braid_core::prelude::*;
//! ```

// Keys
pub use crate::types::{MessageKey, ParameterKey};

// Error handling
pub use crate::error::{BraidError, Result};

// Write pipeline
pub use crate::record::{Log, LogConfig, OrderedLog, OrderedStream, Region, Stream};

// Schema
pub use crate::schema::{
    Any, CategoryFilter, FilterAll, FilterNone, ParamMatch, ParamPack, ParamQuery, Parameter,
    SeverityFilter, Template,
};

// Analysis
pub use crate::analyze::{Action, Analyzer, Flag, FormatInfo, Node, NodeKind, Tree};

// Formatting
pub use crate::format::{FormatOptions, Formatter};

// Codec
pub use crate::codec::{fmt_path, Descriptor};
