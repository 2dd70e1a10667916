//! Key newtypes used throughout the log format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a message template inside one log.
///
/// Derived from the template text, its category and the ordered list of
/// parameter-type keys, so equal templates produce equal keys. The three
/// lowest values are reserved for region control markers and never
/// identify a user template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MessageKey(u32);

impl MessageKey {
    /// Marker opening an anonymous region.
    pub const ANONYMOUS_REGION_START: MessageKey = MessageKey(0);
    /// Marker opening a named region; followed by the region's descriptor key.
    pub const NAMED_REGION_START: MessageKey = MessageKey(1);
    /// Marker closing the innermost open region.
    pub const REGION_END: MessageKey = MessageKey(2);

    /// Create a key from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw key value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this key is one of the reserved region control markers.
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.0 <= Self::REGION_END.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Identity of a parameter type.
///
/// The zero key is the wildcard: it matches any parameter type in
/// analyzer queries and may never be carried by a producer-side type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ParameterKey(u32);

impl ParameterKey {
    /// Wildcard key; only meaningful in analyzer queries.
    pub const WILDCARD: ParameterKey = ParameterKey(0);

    /// Create a key from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw key value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the wildcard key.
    #[must_use]
    pub const fn is_wildcard(self) -> bool {
        self.0 == Self::WILDCARD.0
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
