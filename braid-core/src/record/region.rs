//! Scoped region guards.

use super::stream::Stream;
use crate::schema::CategoryFilter;

/// Guard of an open region; appends the end marker when dropped.
///
/// Guards are plain movable values: transferring one moves the
/// responsibility to close the region along with it, and the end marker
/// is written exactly once, wherever the final owner goes out of scope.
///
/// When regions are disabled by the category filter the guard is inert.
#[must_use = "dropping the guard immediately closes the region"]
pub struct Region<'a, C: CategoryFilter, const ORDERED: bool> {
    stream: Option<&'a Stream<C, ORDERED>>,
}

impl<'a, C: CategoryFilter, const ORDERED: bool> Region<'a, C, ORDERED> {
    pub(crate) fn enabled(stream: &'a Stream<C, ORDERED>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub(crate) fn disabled() -> Self {
        Self { stream: None }
    }

    /// End the region now instead of at end of scope.
    pub fn close(self) {}
}

impl<C: CategoryFilter, const ORDERED: bool> Drop for Region<'_, C, ORDERED> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.write_region_end();
        }
    }
}
