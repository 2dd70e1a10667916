//! Error types for braid.
//!
//! Errors are grouped by code class: `E0xx` for file access, `E1xx` for
//! codec failures (truncated or inconsistent input), `E2xx` for contract
//! violations by the caller. All read-side errors are terminal for the
//! current read; the write pipeline never surfaces errors to producers.

use crate::types::{MessageKey, ParameterKey};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for braid operations.
#[derive(Error, Debug)]
pub enum BraidError {
    // =========================================================================
    // File access (E001-E099)
    // =========================================================================
    /// Failed to open or create a binary log file.
    #[error("E001: Failed to open log file {path}: {cause}")]
    LogOpen {
        /// The log file path.
        path: PathBuf,
        /// Reason for the failure.
        cause: String,
    },

    /// Failed to open or create a format descriptor file.
    #[error("E002: Failed to open format file {path}: {cause}")]
    FormatOpen {
        /// The format file path.
        path: PathBuf,
        /// Reason for the failure.
        cause: String,
    },

    /// I/O failure while writing an output file.
    #[error("E003: I/O error at {path}: {cause}")]
    Io {
        /// The path where the I/O error occurred.
        path: PathBuf,
        /// Description of the I/O error.
        cause: String,
    },

    // =========================================================================
    // Codec (E101-E199)
    // =========================================================================
    /// Input ended in the middle of a block or event.
    #[error("E101: Truncated input at offset {offset}: expected {expected} more bytes")]
    Truncated {
        /// Byte offset where the read was attempted.
        offset: usize,
        /// Number of bytes that were expected.
        expected: usize,
    },

    /// Events inside a block did not line up with the declared block size.
    #[error("E102: Block of stream {stream} is inconsistent at offset {offset}")]
    BlockBounds {
        /// The stream the block belongs to.
        stream: usize,
        /// Byte offset where the inconsistency was detected.
        offset: usize,
    },

    /// A block references a stream index outside the declared stream count.
    #[error("E103: Unknown stream index {stream} (log declares {stream_count} streams)")]
    UnknownStream {
        /// The stream index found in the block header.
        stream: usize,
        /// Number of streams declared by the format file.
        stream_count: usize,
    },

    /// An event references a message key with no descriptor.
    #[error("E104: Unknown message key {key} at offset {offset}")]
    UnknownMessageKey {
        /// The unresolved message key.
        key: MessageKey,
        /// Byte offset of the event.
        offset: usize,
    },

    /// A descriptor references a parameter type not present in the catalog.
    #[error("E105: Unknown parameter key {key} in descriptor {descriptor}")]
    UnknownParameter {
        /// The unresolved parameter key.
        key: ParameterKey,
        /// The descriptor that referenced it.
        descriptor: MessageKey,
    },

    /// Two divergent descriptors claim the same message key.
    #[error("E106: Duplicate descriptor for message key {key}")]
    DuplicateDescriptor {
        /// The contested message key.
        key: MessageKey,
    },

    /// Region markers of a stream do not nest.
    #[error("E107: Unbalanced region markers in stream {stream}")]
    UnbalancedRegion {
        /// The stream with mismatched markers.
        stream: usize,
    },

    /// The sizing pass and the populate pass disagree.
    #[error("E108: Node count mismatch: sized {expected} nodes, populated {actual}")]
    NodeCountMismatch {
        /// Node count computed by the sizing pass.
        expected: usize,
        /// Node count produced by the populate pass.
        actual: usize,
    },

    /// A descriptor message is not valid UTF-8 or lacks its terminator.
    #[error("E109: Malformed descriptor message for key {key}: {cause}")]
    MalformedDescriptor {
        /// The descriptor's message key.
        key: MessageKey,
        /// Description of the defect.
        cause: String,
    },

    // =========================================================================
    // Contract violations (E201-E299)
    // =========================================================================
    /// The wildcard parameter key was registered as a concrete type.
    #[error("E201: The wildcard parameter key is reserved for queries")]
    WildcardParameter,

    /// A parameter type was registered twice.
    #[error("E202: Parameter {key} was already registered")]
    DuplicateParameter {
        /// The parameter key registered twice.
        key: ParameterKey,
    },

    /// Trees derived from different analyzers were combined.
    #[error("E203: Cannot combine trees of different analyzers")]
    ForeignTree,
}

impl BraidError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::LogOpen { .. } => "E001",
            Self::FormatOpen { .. } => "E002",
            Self::Io { .. } => "E003",
            Self::Truncated { .. } => "E101",
            Self::BlockBounds { .. } => "E102",
            Self::UnknownStream { .. } => "E103",
            Self::UnknownMessageKey { .. } => "E104",
            Self::UnknownParameter { .. } => "E105",
            Self::DuplicateDescriptor { .. } => "E106",
            Self::UnbalancedRegion { .. } => "E107",
            Self::NodeCountMismatch { .. } => "E108",
            Self::MalformedDescriptor { .. } => "E109",
            Self::WildcardParameter => "E201",
            Self::DuplicateParameter { .. } => "E202",
            Self::ForeignTree => "E203",
        }
    }

    /// Check if this error indicates malformed or inconsistent input.
    #[must_use]
    pub fn is_codec_error(&self) -> bool {
        self.code().starts_with("E1")
    }

    /// Check if this error indicates an API contract violation.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        self.code().starts_with("E2")
    }
}

/// Result type alias using [`BraidError`].
pub type Result<T> = std::result::Result<T, BraidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        let err = BraidError::Truncated {
            offset: 12,
            expected: 4,
        };
        assert_eq!(err.code(), "E101");
        assert!(err.is_codec_error());
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn error_display_includes_code_and_context() {
        let err = BraidError::UnknownStream {
            stream: 7,
            stream_count: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("E103"));
        assert!(msg.contains('7'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn contract_violations_are_classified() {
        assert!(BraidError::ForeignTree.is_contract_violation());
        assert!(!BraidError::ForeignTree.is_codec_error());
    }
}
