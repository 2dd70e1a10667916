//! The log: stream registry, descriptor table and the background pipeline.

use super::buffer::EncodeBuffer;
use super::stream::Stream;
use super::sync::Semaphore;
use crate::codec::{self, Descriptor, BLOCK_HEADER_SIZE};
use crate::error::{BraidError, Result};
use crate::schema::{CategoryFilter, FilterNone, ParamPack, Template};
use crate::types::MessageKey;
use byteorder::{NativeEndian, WriteBytesExt};
use fs2::FileExt;
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Configuration for log creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Size of each of the two global buffers in bytes.
    pub global_buffer_size: usize,
    /// Default stream buffer size used by [`Log::create_stream`].
    pub stream_buffer_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_buffer_size: 1024 * 1024,
            stream_buffer_size: 64 * 1024,
        }
    }
}

impl LogConfig {
    /// Set the global buffer size.
    #[must_use]
    pub fn with_global_buffer_size(mut self, size: usize) -> Self {
        self.global_buffer_size = size;
        self
    }

    /// Set the default stream buffer size.
    #[must_use]
    pub fn with_stream_buffer_size(mut self, size: usize) -> Self {
        self.stream_buffer_size = size;
        self
    }
}

/// State shared between one stream handle, the log and the pipeline.
///
/// The producer writes the front buffer; the pipeline borrows the back
/// buffer between "queued for flush" and the release of `available`.
pub(crate) struct StreamShared {
    pub(crate) index: usize,
    pub(crate) front: Mutex<EncodeBuffer>,
    pub(crate) back: Mutex<EncodeBuffer>,
    /// One-permit availability signal; held while a flush is in flight.
    pub(crate) available: Semaphore,
}

/// Runtime state of a log, shared by stream handles and both threads.
pub(crate) struct LogCore {
    path: PathBuf,
    file: Mutex<File>,
    io_failed: AtomicBool,
    ordered: bool,
    stream_buffer_size: usize,

    /// Descriptor table; first write wins per key.
    formats: RwLock<HashMap<MessageKey, Descriptor>>,
    /// Ordering index counter, the only cross-producer atomic on the hot path.
    next_order_index: AtomicU64,

    streams: Mutex<Vec<Arc<StreamShared>>>,
    /// Streams whose back buffer awaits the processor, FIFO.
    queue: Mutex<Vec<Arc<StreamShared>>>,

    wake: Condvar,
    notified: Mutex<bool>,
    /// Stop requests are separate: the writer must outlive the
    /// processor's last global swap.
    stop_processor: AtomicBool,
    stop_writer: AtomicBool,

    /// Global front buffer: owned by the processor.
    front: Mutex<EncodeBuffer>,
    /// Global back buffer: owned by the writer between the semaphores.
    back: Mutex<EncodeBuffer>,
    /// processor → writer: back buffer holds data.
    writer_ready: Semaphore,
    /// writer → processor: back buffer was flushed to disk.
    writer_done: Semaphore,
}

impl LogCore {
    /// Draw the next global message ordering index.
    pub(crate) fn next_order_index(&self) -> u64 {
        self.next_order_index.fetch_add(1, Ordering::Relaxed)
    }

    /// Register the descriptor of a (template, parameter pack) pair.
    /// Idempotent; concurrent first emissions collapse to one insertion.
    pub(crate) fn register_template<T: Template, P: ParamPack>(&self, key: MessageKey) {
        if self.formats.read().contains_key(&key) {
            return;
        }
        let mut formats = self.formats.write();
        formats.entry(key).or_insert_with(|| Descriptor {
            key,
            message: T::MESSAGE.to_owned(),
            category: T::CATEGORY,
            parameters: P::KEYS.to_vec(),
        });
    }

    /// Register the synthetic descriptor of a source location.
    pub(crate) fn register_source(&self, key: MessageKey, location: &Location<'_>) {
        if self.formats.read().contains_key(&key) {
            return;
        }
        let mut formats = self.formats.write();
        formats.entry(key).or_insert_with(|| Descriptor {
            key,
            message: format!(
                "{}({},{})",
                location.file(),
                location.line(),
                location.column()
            ),
            category: 0,
            parameters: Vec::new(),
        });
    }

    /// Queue a stream's back buffer for the processor and wake it.
    pub(crate) fn enqueue(&self, stream: Arc<StreamShared>) {
        self.queue.lock().push(stream);
        {
            let mut notified = self.notified.lock();
            *notified = true;
        }
        self.wake.notify_one();
    }

    /// Copy one stream's back buffer into the global front buffer as a
    /// framed block, swapping globals whenever the front buffer fills.
    /// The block header never straddles a swap; payload bytes may.
    fn copy_block(&self, stream: &StreamShared) {
        let back = stream.back.lock();
        let payload = back.bytes();

        let mut front = self.front.lock();
        if front.remaining() < BLOCK_HEADER_SIZE {
            front = self.swap_global(front);
        }
        front.put_u64(stream.index as u64);
        front.put_u64(payload.len() as u64);
        if front.remaining() == 0 {
            front = self.swap_global(front);
        }

        let mut copied = 0;
        while copied < payload.len() {
            let chunk = (payload.len() - copied).min(front.remaining());
            front.put(&payload[copied..copied + chunk]);
            copied += chunk;
            if front.remaining() == 0 {
                front = self.swap_global(front);
            }
        }
        tracing::trace!(stream = stream.index, bytes = payload.len(), "block copied");
    }

    /// Exchange the global buffers: wait until the writer consumed the
    /// back buffer, swap, then signal the writer.
    fn swap_global<'a>(&'a self, front: MutexGuard<'a, EncodeBuffer>) -> MutexGuard<'a, EncodeBuffer> {
        let mut front = front;
        self.writer_done.acquire();
        {
            let mut back = self.back.lock();
            std::mem::swap(&mut *front, &mut *back);
        }
        self.writer_ready.release();
        front
    }

    /// Write bytes that neither thread will process anymore. The order is
    /// load-bearing: earlier contents must precede later ones on disk.
    fn drain(&self) -> Result<()> {
        let io_err = |e: std::io::Error| BraidError::Io {
            path: self.path.clone(),
            cause: e.to_string(),
        };
        let mut file = self.file.lock();

        // Residual global front buffer.
        {
            let front = self.front.lock();
            if !front.bytes().is_empty() {
                file.write_all(front.bytes()).map_err(io_err)?;
            }
        }

        // Back buffers still queued for the processor.
        for stream in self.queue.lock().drain(..) {
            let back = stream.back.lock();
            if !back.bytes().is_empty() {
                file.write_u64::<NativeEndian>(stream.index as u64)
                    .map_err(io_err)?;
                file.write_u64::<NativeEndian>(back.len() as u64)
                    .map_err(io_err)?;
                file.write_all(back.bytes()).map_err(io_err)?;
            }
        }

        // Unflushed stream front buffers.
        for stream in self.streams.lock().iter() {
            let front = stream.front.lock();
            if !front.bytes().is_empty() {
                file.write_u64::<NativeEndian>(stream.index as u64)
                    .map_err(io_err)?;
                file.write_u64::<NativeEndian>(front.len() as u64)
                    .map_err(io_err)?;
                file.write_all(front.bytes()).map_err(io_err)?;
            }
        }

        file.flush().map_err(io_err)
    }

    fn write_formats(&self) -> Result<()> {
        let formats = self.formats.read();
        codec::write_fmt(
            &codec::fmt_path(&self.path),
            self.streams.lock().len(),
            self.ordered,
            formats.values(),
        )
    }
}

/// Loop of the processor thread: wait for queued streams, multiplex
/// their back buffers into the global front buffer, release each
/// stream's availability permit once its bytes are copied out.
fn processor_loop(core: &LogCore) {
    loop {
        {
            let mut notified = core.notified.lock();
            while !*notified && !core.stop_processor.load(Ordering::Acquire) {
                core.wake.wait(&mut notified);
            }
            *notified = false;
        }

        let batch = std::mem::take(&mut *core.queue.lock());
        for stream in &batch {
            core.copy_block(stream);
            stream.available.release();
        }

        if core.stop_processor.load(Ordering::Acquire) {
            break;
        }
    }
}

/// Loop of the writer thread: flush the global back buffer to disk.
fn writer_loop(core: &LogCore) {
    loop {
        core.writer_ready.acquire();
        {
            let mut back = core.back.lock();
            if !back.bytes().is_empty() {
                let mut file = core.file.lock();
                if let Err(e) = file.write_all(back.bytes()) {
                    core.io_failed.store(true, Ordering::Release);
                    tracing::error!(error = %e, "log writer failed");
                }
            }
            back.clear();
        }
        core.writer_done.release();

        if core.stop_writer.load(Ordering::Acquire) {
            break;
        }
    }
}

/// A structured binary log.
///
/// Owns the log file, the descriptor table and the two background
/// threads. Streams created from a log write typed messages that the
/// pipeline consolidates into a single `.log` file; the `.fmt`
/// descriptor file is written at shutdown.
///
/// `C` filters messages at build time; `ORDERED` stamps every user
/// message with a globally monotonic `u64` index.
///
/// # Example
///
/// ```no_run
/// use braid_core::record::{Log, LogConfig};
///
/// braid_core::template! {
///     struct Started("worker {} started", category = 1);
/// }
///
/// let log: Log = Log::create("run.log", LogConfig::default())?;
/// let stream = log.create_stream();
/// stream.message::<Started, _>((7u32,));
/// log.close()?;
/// # Ok::<(), braid_core::BraidError>(())
/// ```
pub struct Log<C: CategoryFilter = FilterNone, const ORDERED: bool = false> {
    core: Arc<LogCore>,
    processor: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    _filter: PhantomData<fn(C)>,
}

/// A log whose user messages carry ordering indices.
pub type OrderedLog<C = FilterNone> = Log<C, true>;

impl<C: CategoryFilter, const ORDERED: bool> Log<C, ORDERED> {
    /// Create a log writing to `path`; the descriptor file is written to
    /// `path` + `.fmt` at shutdown.
    ///
    /// The file is locked exclusively for the lifetime of the log.
    pub fn create(path: impl Into<PathBuf>, config: LogConfig) -> Result<Self> {
        assert!(
            config.global_buffer_size >= BLOCK_HEADER_SIZE,
            "global buffer must hold at least one block header"
        );
        let path = path.into();

        let open_err = |e: std::io::Error| BraidError::LogOpen {
            path: path.clone(),
            cause: e.to_string(),
        };
        let file = File::create(&path).map_err(open_err)?;
        file.try_lock_exclusive().map_err(open_err)?;

        let core = Arc::new(LogCore {
            path: path.clone(),
            file: Mutex::new(file),
            io_failed: AtomicBool::new(false),
            ordered: ORDERED,
            stream_buffer_size: config.stream_buffer_size,
            formats: RwLock::new(HashMap::new()),
            next_order_index: AtomicU64::new(0),
            streams: Mutex::new(Vec::new()),
            queue: Mutex::new(Vec::new()),
            wake: Condvar::new(),
            notified: Mutex::new(false),
            stop_processor: AtomicBool::new(false),
            stop_writer: AtomicBool::new(false),
            front: Mutex::new(EncodeBuffer::new(config.global_buffer_size)),
            back: Mutex::new(EncodeBuffer::new(config.global_buffer_size)),
            writer_ready: Semaphore::new(0),
            writer_done: Semaphore::new(1),
        });

        let spawn_err = |e: std::io::Error| BraidError::Io {
            path: path.clone(),
            cause: format!("failed to spawn pipeline thread: {e}"),
        };
        let processor = {
            let core = Arc::clone(&core);
            std::thread::Builder::new()
                .name("braid-processor".to_owned())
                .spawn(move || processor_loop(&core))
                .map_err(spawn_err)?
        };
        let writer = {
            let core = Arc::clone(&core);
            std::thread::Builder::new()
                .name("braid-writer".to_owned())
                .spawn(move || writer_loop(&core))
                .map_err(spawn_err)?
        };

        Ok(Self {
            core,
            processor: Some(processor),
            writer: Some(writer),
            _filter: PhantomData,
        })
    }

    /// Create a stream with the configured default buffer size.
    pub fn create_stream(&self) -> Stream<C, ORDERED> {
        self.create_stream_with(self.core.stream_buffer_size)
    }

    /// Create a stream with an explicit buffer size.
    ///
    /// The size bounds the largest single message and must not exceed
    /// the global buffer size.
    pub fn create_stream_with(&self, buffer_size: usize) -> Stream<C, ORDERED> {
        assert!(buffer_size > 0, "stream buffer must be non-empty");
        {
            let front = self.core.front.lock();
            assert!(
                buffer_size <= front.capacity(),
                "stream buffer must not exceed the global buffer"
            );
        }

        let mut streams = self.core.streams.lock();
        let shared = Arc::new(StreamShared {
            index: streams.len(),
            front: Mutex::new(EncodeBuffer::new(buffer_size)),
            back: Mutex::new(EncodeBuffer::new(buffer_size)),
            available: Semaphore::new(1),
        });
        streams.push(Arc::clone(&shared));
        Stream::new(Arc::clone(&self.core), shared)
    }

    /// Whether the background writer hit a disk error.
    pub fn has_failed(&self) -> bool {
        self.core.io_failed.load(Ordering::Acquire)
    }

    /// Stop the pipeline, drain residual buffers and write the `.fmt`
    /// file. Producers must have stopped emitting.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let (Some(processor), Some(writer)) = (self.processor.take(), self.writer.take()) else {
            return Ok(());
        };

        self.core.stop_processor.store(true, Ordering::Release);
        {
            let mut notified = self.core.notified.lock();
            *notified = true;
        }
        self.core.wake.notify_one();
        let _ = processor.join();

        self.core.stop_writer.store(true, Ordering::Release);
        self.core.writer_ready.release();
        let _ = writer.join();

        self.core.drain()?;
        self.core.write_formats()?;
        let _ = FileExt::unlock(&*self.core.file.lock());

        if self.core.io_failed.load(Ordering::Acquire) {
            return Err(BraidError::Io {
                path: self.core.path.clone(),
                cause: "background writer failed".to_owned(),
            });
        }
        Ok(())
    }
}

impl<C: CategoryFilter, const ORDERED: bool> Drop for Log<C, ORDERED> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, path = %self.core.path.display(), "log shutdown failed");
        }
    }
}
