//! The text formatter.

use super::renderer::{MessageRenderer, ParameterRenderer, ParameterRenderers};
use super::state::FormatState;
use crate::codec::{self, Cursor};
use crate::error::{BraidError, Result};
use crate::schema::Parameter;
use crate::types::MessageKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Rendering knobs used by the built-in callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Width the message index is padded to.
    pub index_padding_width: usize,
    /// Character the message index is padded with.
    pub index_padding_char: char,
    /// Indentation added per region depth.
    pub region_indent: usize,
    /// Indentation character.
    pub region_indent_char: char,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            index_padding_width: 8,
            index_padding_char: '0',
            region_indent: 2,
            region_indent_char: ' ',
        }
    }
}

type FilenameFormatter = Box<dyn Fn(&Path, usize) -> PathBuf>;
type CategoryFormatter = Box<dyn Fn(&mut dyn io::Write, u32) -> io::Result<()>>;
type IndexFormatter = Box<dyn Fn(&mut dyn io::Write, u64) -> io::Result<()>>;
type AnonymousRegionFormatter = Box<dyn Fn(&mut dyn io::Write, bool) -> io::Result<()>>;
type NamedRegionFormatter = Box<dyn Fn(&mut dyn io::Write, bool, &str) -> io::Result<()>>;

/// Renders a `.log`/`.fmt` pair into one text file per stream.
///
/// The default parameter catalog covers the standard integer and
/// floating-point types; register more with
/// [`Formatter::register_parameter`]. Output is deterministic given
/// fixed callbacks.
///
/// # Example
///
/// ```no_run
/// use braid_core::format::Formatter;
///
/// let formatter = Formatter::new();
/// let written = formatter.format("run.log")?;
/// println!("wrote {} stream files", written.len());
/// # Ok::<(), braid_core::BraidError>(())
/// ```
pub struct Formatter {
    options: FormatOptions,
    parameters: ParameterRenderers,
    filename: Option<FilenameFormatter>,
    category: Option<CategoryFormatter>,
    index: Option<IndexFormatter>,
    anonymous_region: Option<AnonymousRegionFormatter>,
    named_region: Option<NamedRegionFormatter>,
}

impl Formatter {
    /// Create a formatter with the default parameter catalog and
    /// built-in rendering callbacks.
    #[must_use]
    pub fn new() -> Self {
        let mut formatter = Self {
            options: FormatOptions::default(),
            parameters: ParameterRenderers::new(),
            filename: None,
            category: None,
            index: None,
            anonymous_region: None,
            named_region: None,
        };

        fn display<T: Parameter + std::fmt::Display>(formatter: &mut Formatter) {
            formatter.put_parameter::<T>(|out, value| write!(out, "{value}"));
        }
        display::<i8>(&mut formatter);
        display::<u8>(&mut formatter);
        display::<i16>(&mut formatter);
        display::<u16>(&mut formatter);
        display::<i32>(&mut formatter);
        display::<u32>(&mut formatter);
        display::<i64>(&mut formatter);
        display::<u64>(&mut formatter);
        display::<f32>(&mut formatter);
        display::<f64>(&mut formatter);

        formatter
    }

    fn put_parameter<T: Parameter>(
        &mut self,
        render: impl Fn(&mut dyn io::Write, T) -> io::Result<()> + 'static,
    ) {
        self.parameters.insert(
            T::KEY,
            ParameterRenderer {
                size: T::SIZE,
                render: Box::new(move |out, bytes| render(out, T::get(bytes))),
            },
        );
    }

    /// Register a renderer for an additional parameter type.
    pub fn register_parameter<T: Parameter>(
        &mut self,
        render: impl Fn(&mut dyn io::Write, T) -> io::Result<()> + 'static,
    ) -> Result<()> {
        if T::KEY.is_wildcard() {
            return Err(BraidError::WildcardParameter);
        }
        if self.parameters.contains_key(&T::KEY) {
            return Err(BraidError::DuplicateParameter { key: T::KEY });
        }
        self.put_parameter::<T>(render);
        Ok(())
    }

    /// Replace the rendering options of the built-in callbacks.
    #[must_use]
    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the output filename callback (log path, stream index).
    ///
    /// The default writes `<stem>_<index>.txt` next to the log file.
    #[must_use]
    pub fn with_filename_formatter(
        mut self,
        f: impl Fn(&Path, usize) -> PathBuf + 'static,
    ) -> Self {
        self.filename = Some(Box::new(f));
        self
    }

    /// Replace the category prefix callback. The default writes
    /// `<category> | `.
    #[must_use]
    pub fn with_category_formatter(
        mut self,
        f: impl Fn(&mut dyn io::Write, u32) -> io::Result<()> + 'static,
    ) -> Self {
        self.category = Some(Box::new(f));
        self
    }

    /// Replace the ordering index callback. The default pads the index
    /// and writes `<index> | `.
    #[must_use]
    pub fn with_index_formatter(
        mut self,
        f: impl Fn(&mut dyn io::Write, u64) -> io::Result<()> + 'static,
    ) -> Self {
        self.index = Some(Box::new(f));
        self
    }

    /// Replace the anonymous region banner callback; the flag is `true`
    /// at region start.
    #[must_use]
    pub fn with_anonymous_region_formatter(
        mut self,
        f: impl Fn(&mut dyn io::Write, bool) -> io::Result<()> + 'static,
    ) -> Self {
        self.anonymous_region = Some(Box::new(f));
        self
    }

    /// Replace the named region banner callback; the flag is `true` at
    /// region start.
    #[must_use]
    pub fn with_named_region_formatter(
        mut self,
        f: impl Fn(&mut dyn io::Write, bool, &str) -> io::Result<()> + 'static,
    ) -> Self {
        self.named_region = Some(Box::new(f));
        self
    }

    /// Render the log at `path` (with its sibling `.fmt`) and return the
    /// written text files, ordered by stream index.
    pub fn format(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = path.as_ref();
        let fmt = codec::read_fmt(&codec::fmt_path(path))?;

        let mut renderers: HashMap<MessageKey, MessageRenderer> =
            HashMap::with_capacity(fmt.descriptors.len());
        for (key, descriptor) in &fmt.descriptors {
            renderers.insert(*key, MessageRenderer::new(descriptor, &self.parameters)?);
        }

        let data = std::fs::read(path).map_err(|e| BraidError::LogOpen {
            path: path.to_owned(),
            cause: e.to_string(),
        })?;

        struct StreamOutput {
            out: BufWriter<File>,
            state: FormatState,
            path: PathBuf,
        }
        let mut outputs: HashMap<usize, StreamOutput> = HashMap::new();

        let mut cursor = Cursor::new(&data);
        while !cursor.is_empty() {
            let stream = cursor.read_u64()? as usize;
            if stream >= fmt.stream_count {
                return Err(BraidError::UnknownStream {
                    stream,
                    stream_count: fmt.stream_count,
                });
            }
            let payload_size = cursor.read_u64()? as usize;
            let block_end = cursor.pos() + payload_size;
            if block_end > data.len() {
                return Err(BraidError::BlockBounds {
                    stream,
                    offset: cursor.pos(),
                });
            }

            let output = match outputs.entry(stream) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let out_path = self.output_path(path, stream);
                    let file = File::create(&out_path).map_err(|e| BraidError::Io {
                        path: out_path.clone(),
                        cause: e.to_string(),
                    })?;
                    entry.insert(StreamOutput {
                        out: BufWriter::new(file),
                        state: FormatState::new(
                            self.options.region_indent,
                            self.options.region_indent_char,
                        ),
                        path: out_path,
                    })
                }
            };

            while cursor.pos() < block_end {
                let event_offset = cursor.pos();
                let key = MessageKey::new(cursor.read_u32()?);

                let io_err = |e: io::Error| BraidError::Io {
                    path: output.path.clone(),
                    cause: e.to_string(),
                };

                if key == MessageKey::ANONYMOUS_REGION_START {
                    let out: &mut dyn io::Write = &mut output.out;
                    out.write_all(output.state.prefix().as_bytes())
                        .map_err(io_err)?;
                    self.write_anonymous_region(out, true).map_err(io_err)?;
                    out.write_all(b"\n").map_err(io_err)?;
                    output.state.push_region(String::new());
                } else if key == MessageKey::NAMED_REGION_START {
                    let named = MessageKey::new(cursor.read_u32()?);
                    let renderer =
                        renderers
                            .get(&named)
                            .ok_or(BraidError::UnknownMessageKey {
                                key: named,
                                offset: event_offset,
                            })?;
                    let out: &mut dyn io::Write = &mut output.out;
                    out.write_all(output.state.prefix().as_bytes())
                        .map_err(io_err)?;
                    self.write_named_region(out, true, renderer.message())
                        .map_err(io_err)?;
                    out.write_all(b"\n").map_err(io_err)?;
                    output.state.push_region(renderer.message().to_owned());
                } else if key == MessageKey::REGION_END {
                    let name = output.state.pop_region(stream)?;
                    let out: &mut dyn io::Write = &mut output.out;
                    out.write_all(output.state.prefix().as_bytes())
                        .map_err(io_err)?;
                    if name.is_empty() {
                        self.write_anonymous_region(out, false).map_err(io_err)?;
                    } else {
                        self.write_named_region(out, false, &name).map_err(io_err)?;
                    }
                    out.write_all(b"\n").map_err(io_err)?;
                } else {
                    let renderer =
                        renderers
                            .get(&key)
                            .ok_or(BraidError::UnknownMessageKey {
                                key,
                                offset: event_offset,
                            })?;
                    let out: &mut dyn io::Write = &mut output.out;
                    out.write_all(output.state.prefix().as_bytes())
                        .map_err(io_err)?;
                    if fmt.ordered {
                        let index = cursor.read_u64()?;
                        self.write_index(out, index).map_err(io_err)?;
                    }
                    self.write_category(out, renderer.category())
                        .map_err(io_err)?;
                    renderer.render(&mut cursor, out, &self.parameters, &output.path)?;
                    out.write_all(b"\n").map_err(io_err)?;
                }

                if cursor.pos() > block_end {
                    return Err(BraidError::BlockBounds {
                        stream,
                        offset: event_offset,
                    });
                }
            }
        }

        let mut written: Vec<(usize, StreamOutput)> = outputs.into_iter().collect();
        written.sort_by_key(|(stream, _)| *stream);

        let mut paths = Vec::with_capacity(written.len());
        for (_, mut output) in written {
            output.out.flush().map_err(|e| BraidError::Io {
                path: output.path.clone(),
                cause: e.to_string(),
            })?;
            paths.push(output.path);
        }
        Ok(paths)
    }

    fn output_path(&self, log_path: &Path, stream: usize) -> PathBuf {
        if let Some(filename) = &self.filename {
            return filename(log_path, stream);
        }
        let stem = log_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_owned());
        let name = format!("{stem}_{stream}.txt");
        match log_path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    fn write_category(&self, out: &mut dyn io::Write, category: u32) -> io::Result<()> {
        if let Some(f) = &self.category {
            return f(out, category);
        }
        write!(out, "{category} | ")
    }

    fn write_index(&self, out: &mut dyn io::Write, index: u64) -> io::Result<()> {
        if let Some(f) = &self.index {
            return f(out, index);
        }
        let digits = index.to_string();
        for _ in digits.len()..self.options.index_padding_width {
            write!(out, "{}", self.options.index_padding_char)?;
        }
        write!(out, "{digits} | ")
    }

    fn write_anonymous_region(&self, out: &mut dyn io::Write, start: bool) -> io::Result<()> {
        if let Some(f) = &self.anonymous_region {
            return f(out, start);
        }
        if start {
            write!(out, "-- REGION START: ANONYMOUS --")
        } else {
            write!(out, "-- REGION END: ANONYMOUS --")
        }
    }

    fn write_named_region(
        &self,
        out: &mut dyn io::Write,
        start: bool,
        name: &str,
    ) -> io::Result<()> {
        if let Some(f) = &self.named_region {
            return f(out, start, name);
        }
        if start {
            write!(out, "-- REGION START: {name} --")
        } else {
            write!(out, "-- REGION END: {name} --")
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_sits_next_to_log() {
        let formatter = Formatter::new();
        assert_eq!(
            formatter.output_path(Path::new("/tmp/runs/app.log"), 2),
            PathBuf::from("/tmp/runs/app_2.txt")
        );
    }

    #[test]
    fn custom_filename_formatter_wins() {
        let formatter = Formatter::new()
            .with_filename_formatter(|_, stream| PathBuf::from(format!("s{stream}.out")));
        assert_eq!(
            formatter.output_path(Path::new("app.log"), 1),
            PathBuf::from("s1.out")
        );
    }

    #[test]
    fn index_padding_respects_options() {
        let formatter = Formatter::new().with_options(FormatOptions {
            index_padding_width: 4,
            index_padding_char: '0',
            ..FormatOptions::default()
        });
        let mut out = Vec::new();
        formatter.write_index(&mut out, 37).unwrap();
        assert_eq!(out, b"0037 | ");
    }

    #[test]
    fn duplicate_parameter_rejected() {
        let mut formatter = Formatter::new();
        let err = formatter
            .register_parameter::<u32>(|out, value| write!(out, "{value}"))
            .unwrap_err();
        assert_eq!(err.code(), "E202");
    }
}
