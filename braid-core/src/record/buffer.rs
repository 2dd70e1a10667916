//! Fixed-capacity encode buffers, aligned to a cache line.

use byteorder::{ByteOrder, NativeEndian};
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

/// Alignment of every buffer; keeps adjacent control state off the same
/// cache line as buffer payload.
const CACHE_LINE: usize = 64;

/// Raw cache-line-aligned heap allocation.
struct AlignedAlloc {
    ptr: NonNull<u8>,
    size: usize,
}

impl AlignedAlloc {
    fn new(size: usize) -> Self {
        assert!(size > 0, "buffer size must be non-zero");
        let layout = Layout::from_size_align(size, CACHE_LINE).expect("valid buffer layout");
        // SAFETY: the layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| handle_alloc_error(layout));
        Self { ptr, size }
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: the allocation is live and `size` bytes long.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: the allocation is live, `size` bytes long and uniquely borrowed.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

impl Drop for AlignedAlloc {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.size, CACHE_LINE).expect("valid buffer layout");
        // SAFETY: allocated with the identical layout in `new`.
        unsafe { dealloc(self.ptr.as_ptr(), layout) };
    }
}

// SAFETY: the allocation is owned; no aliasing beyond the borrow rules above.
unsafe impl Send for AlignedAlloc {}

/// A fixed-capacity byte buffer with a write offset.
///
/// Serves both halves of a double buffer: `len` is the write offset of a
/// front buffer and the used byte count of a back buffer. Swapping the
/// halves is a plain `mem::swap` of the two `EncodeBuffer` values.
pub(crate) struct EncodeBuffer {
    data: AlignedAlloc,
    len: usize,
}

impl EncodeBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: AlignedAlloc::new(capacity),
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.data.size
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn remaining(&self) -> usize {
        self.capacity() - self.len
    }

    /// Valid bytes written so far.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data.as_slice()[..self.len]
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn put(&mut self, bytes: &[u8]) {
        let start = self.len;
        self.data.as_mut_slice()[start..start + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        let start = self.len;
        NativeEndian::write_u32(&mut self.data.as_mut_slice()[start..start + 4], value);
        self.len += 4;
    }

    pub(crate) fn put_u64(&mut self, value: u64) {
        let start = self.len;
        NativeEndian::write_u64(&mut self.data.as_mut_slice()[start..start + 8], value);
        self.len += 8;
    }

    /// Reserve the next `len` bytes and return them for in-place writes.
    pub(crate) fn slot(&mut self, len: usize) -> &mut [u8] {
        let start = self.len;
        self.len += len;
        &mut self.data.as_mut_slice()[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_cache_aligned() {
        for size in [1, 64, 100, 4096] {
            let buf = EncodeBuffer::new(size);
            assert_eq!(buf.data.as_slice().as_ptr() as usize % CACHE_LINE, 0);
            assert_eq!(buf.capacity(), size);
        }
    }

    #[test]
    fn put_tracks_offset() {
        let mut buf = EncodeBuffer::new(32);
        buf.put_u32(0xaabbccdd);
        buf.put_u64(42);
        buf.put(&[1, 2, 3]);
        assert_eq!(buf.len(), 15);
        assert_eq!(buf.remaining(), 17);

        let mut expected = Vec::new();
        expected.extend_from_slice(&0xaabbccdd_u32.to_ne_bytes());
        expected.extend_from_slice(&42u64.to_ne_bytes());
        expected.extend_from_slice(&[1, 2, 3]);
        assert_eq!(buf.bytes(), expected.as_slice());
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = EncodeBuffer::new(16);
        let mut b = EncodeBuffer::new(16);
        a.put_u32(7);
        std::mem::swap(&mut a, &mut b);
        assert_eq!(a.len(), 0);
        assert_eq!(b.bytes(), 7u32.to_ne_bytes());
    }

    #[test]
    fn slot_reserves_in_place() {
        let mut buf = EncodeBuffer::new(8);
        buf.slot(4).copy_from_slice(&9u32.to_ne_bytes());
        assert_eq!(buf.bytes(), 9u32.to_ne_bytes());
    }
}
