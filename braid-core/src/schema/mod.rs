//! Message schema: templates, parameter types and category filters.
//!
//! A message template pairs a text with `{}` placeholders and a numeric
//! category. Its identity, the [`MessageKey`](crate::types::MessageKey)
//! stored on disk, is computed at compile time from the text, the
//! category and the parameter-type keys of the values logged with it, so
//! producer and analyzer agree on identity without coordination.
//!
//! Parameter types carry an explicit, build-stable key derived from a
//! type tag string rather than any compiler-generated type name.

mod category;
mod hash;
mod params;
mod template;

pub use category::{CategoryFilter, FilterAll, FilterNone, SeverityFilter};
pub use hash::{count_placeholders, hash_str, message_key, mix_u32};
pub use params::{Any, ParamMatch, ParamPack, ParamQuery, Parameter};
pub use template::{MessageMeta, Template};
