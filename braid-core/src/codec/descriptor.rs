//! Format descriptor records and the `.fmt` file.

use super::cursor::Cursor;
use crate::error::{BraidError, Result};
use crate::schema::count_placeholders;
use crate::types::{MessageKey, ParameterKey};
use byteorder::{NativeEndian, WriteBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One record of the `.fmt` file: the semantic identity behind a message
/// key.
///
/// On disk:
///
/// ```text
/// key        : u32
/// msg_len    : u64                       (includes trailing NUL)
/// msg_bytes  : msg_len bytes             (NUL-terminated UTF-8)
/// category   : u32
/// param_keys : u32 × count of `{}` in the message
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// The message key this descriptor defines.
    pub key: MessageKey,
    /// Template text with `{}` placeholders.
    pub message: String,
    /// Message category.
    pub category: u32,
    /// Parameter-type keys, one per placeholder.
    pub parameters: Vec<ParameterKey>,
}

impl Descriptor {
    pub(crate) fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<NativeEndian>(self.key.get())?;
        out.write_u64::<NativeEndian>(self.message.len() as u64 + 1)?;
        out.write_all(self.message.as_bytes())?;
        out.write_u8(0)?;
        out.write_u32::<NativeEndian>(self.category)?;
        for key in &self.parameters {
            out.write_u32::<NativeEndian>(key.get())?;
        }
        Ok(())
    }

    fn read_from(cursor: &mut Cursor<'_>) -> Result<Self> {
        let key = MessageKey::new(cursor.read_u32()?);

        let msg_len = cursor.read_u64()? as usize;
        let raw = cursor.take(msg_len)?;
        let text = match raw.split_last() {
            Some((&0, text)) => text,
            _ => {
                return Err(BraidError::MalformedDescriptor {
                    key,
                    cause: "missing NUL terminator".to_owned(),
                })
            }
        };
        let message =
            String::from_utf8(text.to_vec()).map_err(|e| BraidError::MalformedDescriptor {
                key,
                cause: e.to_string(),
            })?;

        let category = cursor.read_u32()?;

        let count = count_placeholders(&message);
        let mut parameters = Vec::with_capacity(count);
        for _ in 0..count {
            parameters.push(ParameterKey::new(cursor.read_u32()?));
        }

        Ok(Self {
            key,
            message,
            category,
            parameters,
        })
    }
}

/// Parsed contents of a `.fmt` file.
#[derive(Debug)]
pub(crate) struct FmtFile {
    pub stream_count: usize,
    pub ordered: bool,
    pub descriptors: HashMap<MessageKey, Descriptor>,
}

/// Path of the descriptor file belonging to a log file: the log path
/// with `.fmt` appended (`app.log` → `app.log.fmt`).
#[must_use]
pub fn fmt_path(log_path: &Path) -> PathBuf {
    let mut path = log_path.as_os_str().to_owned();
    path.push(".fmt");
    PathBuf::from(path)
}

/// Read and validate a `.fmt` file.
///
/// Registration is idempotent, so a byte-identical duplicate descriptor
/// is tolerated; a divergent duplicate fails the read.
pub(crate) fn read_fmt(path: &Path) -> Result<FmtFile> {
    let data = std::fs::read(path).map_err(|e| BraidError::FormatOpen {
        path: path.to_owned(),
        cause: e.to_string(),
    })?;

    let mut cursor = Cursor::new(&data);
    let stream_count = cursor.read_u64()? as usize;
    let ordered = cursor.read_u8()? != 0;

    let mut descriptors = HashMap::new();
    while !cursor.is_empty() {
        let descriptor = Descriptor::read_from(&mut cursor)?;
        if let Some(existing) = descriptors.get(&descriptor.key) {
            if *existing != descriptor {
                return Err(BraidError::DuplicateDescriptor {
                    key: descriptor.key,
                });
            }
            continue;
        }
        descriptors.insert(descriptor.key, descriptor);
    }

    Ok(FmtFile {
        stream_count,
        ordered,
        descriptors,
    })
}

/// Write a `.fmt` file for the given descriptor table.
pub(crate) fn write_fmt<'a>(
    path: &Path,
    stream_count: usize,
    ordered: bool,
    descriptors: impl Iterator<Item = &'a Descriptor>,
) -> Result<()> {
    let file = File::create(path).map_err(|e| BraidError::FormatOpen {
        path: path.to_owned(),
        cause: e.to_string(),
    })?;
    let mut out = BufWriter::new(file);

    let io_err = |e: io::Error| BraidError::Io {
        path: path.to_owned(),
        cause: e.to_string(),
    };

    out.write_u64::<NativeEndian>(stream_count as u64)
        .map_err(io_err)?;
    out.write_u8(u8::from(ordered)).map_err(io_err)?;
    for descriptor in descriptors {
        descriptor.write_to(&mut out).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(key: u32, message: &str) -> Descriptor {
        Descriptor {
            key: MessageKey::new(key),
            message: message.to_owned(),
            category: 7,
            parameters: std::iter::repeat(ParameterKey::new(0xfeed))
                .take(count_placeholders(message))
                .collect(),
        }
    }

    #[test]
    fn fmt_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log.fmt");

        let descriptors = [sample(10, "x = {}"), sample(11, "done")];
        write_fmt(&path, 3, true, descriptors.iter()).unwrap();

        let fmt = read_fmt(&path).unwrap();
        assert_eq!(fmt.stream_count, 3);
        assert!(fmt.ordered);
        assert_eq!(fmt.descriptors.len(), 2);
        assert_eq!(fmt.descriptors[&MessageKey::new(10)], descriptors[0]);
        assert_eq!(fmt.descriptors[&MessageKey::new(11)], descriptors[1]);
    }

    #[test]
    fn divergent_duplicate_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log.fmt");

        let a = sample(10, "x = {}");
        let mut b = sample(10, "x = {}");
        b.category = 9;
        write_fmt(&path, 1, false, [&a, &b].into_iter()).unwrap();

        let err = read_fmt(&path).unwrap_err();
        assert_eq!(err.code(), "E106");
    }

    #[test]
    fn identical_duplicate_is_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log.fmt");

        let a = sample(10, "x = {}");
        write_fmt(&path, 1, false, [&a, &a].into_iter()).unwrap();

        let fmt = read_fmt(&path).unwrap();
        assert_eq!(fmt.descriptors.len(), 1);
    }

    #[test]
    fn fmt_path_appends_extension() {
        assert_eq!(
            fmt_path(Path::new("/tmp/app.log")),
            PathBuf::from("/tmp/app.log.fmt")
        );
    }
}
