//! Message and parameter rendering.

use crate::codec::{Cursor, Descriptor};
use crate::error::{BraidError, Result};
use crate::types::ParameterKey;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Renders one parameter type from its raw bytes.
pub(crate) struct ParameterRenderer {
    pub(crate) size: usize,
    pub(crate) render: Box<dyn Fn(&mut dyn io::Write, &[u8]) -> io::Result<()>>,
}

pub(crate) type ParameterRenderers = HashMap<ParameterKey, ParameterRenderer>;

/// A descriptor prepared for rendering: the template text split at its
/// placeholders, with one parameter key per gap.
#[derive(Debug)]
pub(crate) struct MessageRenderer {
    message: String,
    category: u32,
    /// Byte ranges of the text between placeholders; always one more
    /// entry than `parameters`.
    segments: Vec<(usize, usize)>,
    parameters: Vec<ParameterKey>,
}

/// Byte offsets of all `{}` placeholders in a template text.
fn placeholder_offsets(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut offsets = Vec::new();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i - 1] == b'{' && bytes[i] == b'}' {
            offsets.push(i - 1);
            i += 1;
        }
        i += 1;
    }
    offsets
}

impl MessageRenderer {
    /// Prepare a descriptor for rendering; every parameter key must be
    /// present in the renderer catalog.
    pub(crate) fn new(descriptor: &Descriptor, renderers: &ParameterRenderers) -> Result<Self> {
        for &key in &descriptor.parameters {
            if !renderers.contains_key(&key) {
                return Err(BraidError::UnknownParameter {
                    key,
                    descriptor: descriptor.key,
                });
            }
        }

        let offsets = placeholder_offsets(&descriptor.message);
        let mut segments = Vec::with_capacity(offsets.len() + 1);
        for i in 0..=offsets.len() {
            let start = if i == 0 { 0 } else { offsets[i - 1] + 2 };
            let end = if i == offsets.len() {
                descriptor.message.len()
            } else {
                offsets[i]
            };
            segments.push((start, end));
        }

        Ok(Self {
            message: descriptor.message.clone(),
            category: descriptor.category,
            segments,
            parameters: descriptor.parameters.clone(),
        })
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn category(&self) -> u32 {
        self.category
    }

    /// Read this message's parameter bytes from the cursor and write the
    /// filled-in text.
    pub(crate) fn render(
        &self,
        cursor: &mut Cursor<'_>,
        out: &mut dyn io::Write,
        renderers: &ParameterRenderers,
        out_path: &Path,
    ) -> Result<()> {
        let io_err = |e: io::Error| BraidError::Io {
            path: out_path.to_owned(),
            cause: e.to_string(),
        };

        for (i, &(start, end)) in self.segments.iter().enumerate() {
            out.write_all(self.message[start..end].as_bytes())
                .map_err(io_err)?;
            if let Some(&key) = self.parameters.get(i) {
                let renderer = &renderers[&key];
                let bytes = cursor.take(renderer.size)?;
                (renderer.render)(out, bytes).map_err(io_err)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamMatch, Parameter};
    use crate::types::MessageKey;

    fn test_renderers() -> ParameterRenderers {
        let mut renderers = ParameterRenderers::new();
        renderers.insert(
            <u32 as ParamMatch>::KEY,
            ParameterRenderer {
                size: <u32 as Parameter>::SIZE,
                render: Box::new(|out, bytes| write!(out, "{}", u32::get(bytes))),
            },
        );
        renderers
    }

    fn descriptor(message: &str, parameters: Vec<ParameterKey>) -> Descriptor {
        Descriptor {
            key: MessageKey::new(77),
            message: message.to_owned(),
            category: 1,
            parameters,
        }
    }

    #[test]
    fn placeholder_offsets_scan() {
        assert_eq!(placeholder_offsets("no params"), Vec::<usize>::new());
        assert_eq!(placeholder_offsets("{}"), vec![0]);
        assert_eq!(placeholder_offsets("a {} b {} c"), vec![2, 7]);
        assert_eq!(placeholder_offsets("{}{}"), vec![0, 2]);
    }

    #[test]
    fn renders_text_around_parameters() {
        let renderers = test_renderers();
        let descriptor = descriptor("x = {}!", vec![<u32 as ParamMatch>::KEY]);
        let renderer = MessageRenderer::new(&descriptor, &renderers).unwrap();

        let data = 42u32.to_ne_bytes();
        let mut cursor = Cursor::new(&data);
        let mut out = Vec::new();
        renderer
            .render(&mut cursor, &mut out, &renderers, Path::new("out.txt"))
            .unwrap();
        assert_eq!(out, b"x = 42!");
    }

    #[test]
    fn unknown_parameter_is_fatal() {
        let renderers = test_renderers();
        let descriptor = descriptor("y = {}", vec![ParameterKey::new(0xdead)]);
        let err = MessageRenderer::new(&descriptor, &renderers).unwrap_err();
        assert_eq!(err.code(), "E105");
    }
}
