//! Message templates and their compile-time identity.

use super::hash::{count_placeholders, message_key};
use super::params::ParamPack;
use crate::types::MessageKey;
use std::marker::PhantomData;

/// A message template: fixed text with `{}` placeholders plus a category.
///
/// Declared once per call-site family, usually with the [`template!`]
/// macro:
///
/// ```
/// braid_core::template! {
///     /// Per-frame timing sample.
///     pub struct FrameTime("frame {} took {} ms", category = 2);
/// }
/// ```
pub trait Template {
    /// Template text; each `{}` is one parameter slot.
    const MESSAGE: &'static str;
    /// Numeric category, the unit of coarse filtering.
    const CATEGORY: u32;
}

/// Compile-time metadata of a template combined with a parameter pack.
///
/// Evaluating [`MessageMeta::KEY`] is also the arity check: a pack whose
/// length differs from the template's placeholder count fails to compile.
pub struct MessageMeta<T, P>(PhantomData<fn(T, P)>);

impl<T: Template, P: ParamPack> MessageMeta<T, P> {
    /// The message key written to the log for this (template, pack) pair.
    pub const KEY: MessageKey = {
        assert!(
            P::COUNT == count_placeholders(T::MESSAGE),
            "parameter count does not match template placeholders"
        );
        message_key(T::MESSAGE, T::CATEGORY, P::KEYS)
    };

    /// Total parameter payload size in bytes.
    pub const PAYLOAD_SIZE: usize = P::SIZE;
}

/// Declare unit structs implementing [`Template`].
///
/// ```
/// braid_core::template! {
///     pub struct Connected("peer {} connected", category = 1);
///     struct Tick("tick", category = 0);
/// }
/// ```
#[macro_export]
macro_rules! template {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident($message:literal, category = $category:expr);)+) => {$(
        $(#[$attr])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::schema::Template for $name {
            const MESSAGE: &'static str = $message;
            const CATEGORY: u32 = $category;
        }
    )+};
}
