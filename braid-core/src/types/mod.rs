//! Strongly-typed identifiers for braid entities.
//!
//! This module provides the key types shared by the write pipeline, the
//! on-disk codec and the analyzer:
//! - [`MessageKey`]: identity of a message template (or a region control marker)
//! - [`ParameterKey`]: identity of a parameter type

mod keys;

pub use keys::{MessageKey, ParameterKey};
