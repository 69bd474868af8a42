//! Backing stores for a [`Buffer`](crate::Buffer).
//!
//! - [`Resource`]: the capability set every backing store implements.
//! - [`GrowableResource`]: a growable, heap-allocated byte area.
//! - [`NativeResource`]: a raw memory region, either owned or borrowed.
//! - [`StreamResource`]: any seekable `std::io` stream.

use std::io::{Read, Seek};

use binbuf_common::Result;

use crate::packed::PackedBytes;

pub mod growable;
pub mod native;
pub mod stream;

pub use growable::GrowableResource;
pub use native::{NativeOwnership, NativeResource};
pub use stream::StreamResource;

/// A readable, seekable view over the contents of a resource.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// A backing store holding a cursor (`position`), a logical `size` (the high-water mark
/// of written bytes) and a physical `capacity`.
///
/// Every write transfers its bytes at `position`, advances `position` by the amount
/// transferred and raises `size` to the new `position` if it is greater. `size` only
/// decreases through [`clear`](Resource::clear).
///
/// Every read requires `position + count <= size`. Reads that would cross `size` fail
/// with an end-of-data error and leave `position` unchanged; the only exception is
/// [`read_bytes`](Resource::read_bytes), which transfers what is available.
///
/// Once [`dispose`](Resource::dispose) has been called, every operation other than the
/// plain accessors fails with a disposed error.
pub trait Resource {
    /// Returns the cursor position.
    fn position(&self) -> usize;

    /// Moves the cursor. `size` is not affected.
    fn set_position(&mut self, position: usize) -> Result<()>;

    /// Returns the logical size in bytes.
    fn size(&self) -> usize;

    /// Returns the physical capacity in bytes.
    fn capacity(&self) -> usize;

    /// Returns `true` if nothing has been written since creation or the last clear.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the number of bytes between the cursor and the logical end.
    fn bytes_left(&self) -> usize {
        self.size().saturating_sub(self.position())
    }

    /// Resets `position` and `size` to zero. When `wipe` is set, the bytes in
    /// `[0, size)` are zeroed first. Storage is never released.
    fn clear(&mut self, wipe: bool) -> Result<()>;

    /// Writes the first `len` bytes of a packed overlay. `len` must not exceed 16.
    fn write_packed(&mut self, bytes: &PackedBytes, len: usize) -> Result<()>;

    /// Writes a single byte.
    fn write_byte(&mut self, value: u8) -> Result<()>;

    /// Writes a run of bytes.
    fn write_bytes(&mut self, src: &[u8]) -> Result<()>;

    /// Writes `len` bytes copied from a raw memory region.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads of `len` bytes, and the region must not overlap
    /// the resource's own storage.
    unsafe fn write_raw(&mut self, src: *const u8, len: usize) -> Result<()> {
        let src = unsafe { std::slice::from_raw_parts(src, len) };
        self.write_bytes(src)
    }

    /// Reads `len` bytes into a packed overlay (remaining bytes are zero). `len` must
    /// not exceed 16.
    fn read_packed(&mut self, len: usize) -> Result<PackedBytes>;

    /// Reads a single byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Reads up to `dest.len()` bytes, clamped to the bytes left, and returns the
    /// number of bytes transferred.
    fn read_bytes(&mut self, dest: &mut [u8]) -> Result<usize>;

    /// Exposes the contents as a readable stream.
    fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>>;

    /// Exposes the logical contents `[0, size)` without copying.
    fn as_bytes(&self) -> Result<&[u8]>;

    /// Releases owned storage. Calling it again has no effect.
    fn dispose(&mut self);

    /// Returns `true` once [`dispose`](Resource::dispose) has been called.
    fn is_disposed(&self) -> bool;
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn position(&self) -> usize {
        (**self).position()
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        (**self).set_position(position)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn bytes_left(&self) -> usize {
        (**self).bytes_left()
    }

    fn clear(&mut self, wipe: bool) -> Result<()> {
        (**self).clear(wipe)
    }

    fn write_packed(&mut self, bytes: &PackedBytes, len: usize) -> Result<()> {
        (**self).write_packed(bytes, len)
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        (**self).write_byte(value)
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        (**self).write_bytes(src)
    }

    unsafe fn write_raw(&mut self, src: *const u8, len: usize) -> Result<()> {
        unsafe { (**self).write_raw(src, len) }
    }

    fn read_packed(&mut self, len: usize) -> Result<PackedBytes> {
        (**self).read_packed(len)
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn read_bytes(&mut self, dest: &mut [u8]) -> Result<usize> {
        (**self).read_bytes(dest)
    }

    fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>> {
        (**self).as_stream()
    }

    fn as_bytes(&self) -> Result<&[u8]> {
        (**self).as_bytes()
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

/// Computes the end offset of a transfer of `len` bytes starting at `position`.
#[inline]
pub(crate) fn transfer_end(position: usize, len: usize) -> Result<usize> {
    position
        .checked_add(len)
        .ok_or_else(|| binbuf_common::Error::invalid_arg("len", "position + len overflows"))
}

/// Checks that a read of `len` bytes at `position` stays within `size`, returning the
/// end offset of the read.
#[inline]
pub(crate) fn check_read(position: usize, len: usize, size: usize) -> Result<usize> {
    match position.checked_add(len) {
        Some(end) if end <= size => Ok(end),
        _ => Err(binbuf_common::Error::end_of_data(position, len, size)),
    }
}

#[inline]
pub(crate) fn check_packed_len(len: usize) -> Result<()> {
    binbuf_common::verify_arg!(len, len <= crate::packed::PACKED_SIZE);
    Ok(())
}
