//! Build-time category filtering.
//!
//! A category filter is a type parameter of [`Log`](crate::record::Log):
//! the per-message predicate is answered from template constants, so a
//! rejected `message` call compiles down to nothing.

use super::template::Template;

/// Build-time predicate set deciding what a log records.
pub trait CategoryFilter {
    /// Whether region markers are recorded.
    const REGIONS: bool;
    /// Whether source locations are recorded.
    const SOURCES: bool;

    /// Whether messages of template `T` are recorded.
    #[must_use]
    fn message_enabled<T: Template>() -> bool;
}

/// Filters nothing: every message, region and source location is recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterNone;

impl CategoryFilter for FilterNone {
    const REGIONS: bool = true;
    const SOURCES: bool = true;

    #[inline]
    fn message_enabled<T: Template>() -> bool {
        true
    }
}

/// Filters everything, disabling the log at build time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterAll;

impl CategoryFilter for FilterAll {
    const REGIONS: bool = false;
    const SOURCES: bool = false;

    #[inline]
    fn message_enabled<T: Template>() -> bool {
        false
    }
}

/// Records messages whose category is at least `MIN`; regions and source
/// locations are always recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityFilter<const MIN: u32>;

impl<const MIN: u32> CategoryFilter for SeverityFilter<MIN> {
    const REGIONS: bool = true;
    const SOURCES: bool = true;

    #[inline]
    fn message_enabled<T: Template>() -> bool {
        T::CATEGORY >= MIN
    }
}
