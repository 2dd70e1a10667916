//! Human-readable text rendering of a `.log`/`.fmt` pair.
//!
//! The [`Formatter`] walks the binary log and writes one text file per
//! stream. Region nesting becomes indentation, message templates are
//! filled from the recorded parameter bytes, and every rendering detail
//! (output filenames, category/index prefixes, region banners) can be
//! replaced through callbacks.

mod formatter;
mod renderer;
mod state;

pub use formatter::{FormatOptions, Formatter};
