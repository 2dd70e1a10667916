//! Per-producer streams.

use super::buffer::EncodeBuffer;
use super::log::{LogCore, StreamShared};
use super::region::Region;
use crate::codec::{KEY_SIZE, ORDER_INDEX_SIZE};
use crate::schema::{hash_str, mix_u32, CategoryFilter, FilterNone, MessageMeta, ParamPack, Template};
use crate::types::MessageKey;
use parking_lot::MutexGuard;
use std::marker::PhantomData;
use std::sync::Arc;

/// A single-producer channel into a log.
///
/// A stream owns a double buffer: messages append to the front buffer,
/// and when a message would overflow it, the buffers are swapped and the
/// back buffer is handed to the pipeline. The only blocking a producer
/// observes is the stream's own availability permit while a previous
/// flush is still in flight.
///
/// Streams must be written by one thread at a time; create one stream
/// per producer.
pub struct Stream<C: CategoryFilter = FilterNone, const ORDERED: bool = false> {
    core: Arc<LogCore>,
    shared: Arc<StreamShared>,
    _filter: PhantomData<fn(C)>,
}

/// A stream of an [`OrderedLog`](super::OrderedLog).
pub type OrderedStream<C = FilterNone> = Stream<C, true>;

impl<C: CategoryFilter, const ORDERED: bool> Stream<C, ORDERED> {
    pub(crate) fn new(core: Arc<LogCore>, shared: Arc<StreamShared>) -> Self {
        Self {
            core,
            shared,
            _filter: PhantomData,
        }
    }

    /// Index of this stream within its log.
    #[must_use]
    pub fn index(&self) -> usize {
        self.shared.index
    }

    /// Write a typed message.
    ///
    /// Does nothing when the category filter rejects `T` at build time.
    /// The parameter tuple must match the `{}` placeholders of the
    /// template; a mismatch fails compilation.
    ///
    /// # Panics
    ///
    /// Panics if the encoded message exceeds the stream buffer size;
    /// that is a programming error, not a runtime condition.
    pub fn message<T: Template, P: ParamPack>(&self, params: P) {
        if !C::message_enabled::<T>() {
            return;
        }

        let key = MessageMeta::<T, P>::KEY;
        self.core.register_template::<T, P>(key);

        let size = KEY_SIZE + P::SIZE + if ORDERED { ORDER_INDEX_SIZE } else { 0 };
        let mut front = self.reserve(size);
        front.put_u32(key.get());
        if ORDERED {
            front.put_u64(self.core.next_order_index());
        }
        params.put_all(front.slot(P::SIZE));
    }

    /// Open an anonymous region; the returned guard closes it on drop.
    pub fn region(&self) -> Region<'_, C, ORDERED> {
        if !C::REGIONS {
            return Region::disabled();
        }
        let mut front = self.reserve(KEY_SIZE);
        front.put_u32(MessageKey::ANONYMOUS_REGION_START.get());
        drop(front);
        Region::enabled(self)
    }

    /// Open a region named by a template.
    ///
    /// The template must have no placeholders; it is registered like a
    /// message descriptor and identifies the region in the analyzer and
    /// the text formatter.
    pub fn named_region<T: Template>(&self) -> Region<'_, C, ORDERED> {
        if !C::REGIONS {
            return Region::disabled();
        }
        let key = MessageMeta::<T, ()>::KEY;
        self.core.register_template::<T, ()>(key);

        let mut front = self.reserve(KEY_SIZE * 2);
        front.put_u32(MessageKey::NAMED_REGION_START.get());
        front.put_u32(key.get());
        drop(front);
        Region::enabled(self)
    }

    /// Open an anonymous region whose guard is meant to travel.
    ///
    /// Region guards are movable values either way; a moved guard closes
    /// the region exactly once, wherever it ends up being dropped.
    pub fn movable_region(&self) -> Region<'_, C, ORDERED> {
        self.region()
    }

    /// Record the calling source location as a keyed event.
    #[track_caller]
    pub fn source_info(&self) {
        if !C::SOURCES {
            return;
        }
        let location = std::panic::Location::caller();
        let key = MessageKey::new(
            hash_str(location.file()) ^ mix_u32(location.line()) ^ mix_u32(location.column()),
        );
        self.core.register_source(key, location);

        let size = KEY_SIZE + if ORDERED { ORDER_INDEX_SIZE } else { 0 };
        let mut front = self.reserve(size);
        front.put_u32(key.get());
        if ORDERED {
            front.put_u64(self.core.next_order_index());
        }
    }

    pub(crate) fn write_region_end(&self) {
        let mut front = self.reserve(KEY_SIZE);
        front.put_u32(MessageKey::REGION_END.get());
    }

    /// Lock the front buffer with room for `size` more bytes, flushing
    /// first if the pending message would overflow it.
    fn reserve(&self, size: usize) -> MutexGuard<'_, EncodeBuffer> {
        let mut front = self.shared.front.lock();
        assert!(
            size <= front.capacity(),
            "message exceeds stream buffer capacity"
        );
        if front.len() + size > front.capacity() {
            drop(front);
            self.flush();
            front = self.shared.front.lock();
        }
        front
    }

    /// Swap the buffers and hand the back buffer to the pipeline.
    ///
    /// Blocks on the availability permit while a previous flush of this
    /// stream is still being copied out by the processor.
    fn flush(&self) {
        self.shared.available.acquire();
        {
            let mut front = self.shared.front.lock();
            let mut back = self.shared.back.lock();
            std::mem::swap(&mut *front, &mut *back);
            front.clear();
        }
        tracing::trace!(stream = self.shared.index, "stream flushed");
        self.core.enqueue(Arc::clone(&self.shared));
    }
}
