//! The [`Buffer`] facade: typed reads and writes over any [`Resource`].

use std::io::{Read, Seek, Write};
use std::mem::size_of;
use std::ops::Range;

use binbuf_common::{Error, Result, verify_arg};
use bytemuck::{AnyBitPattern, NoUninit};

use crate::decimal::Decimal128;
use crate::packed::{PACKED_SIZE, PackedBytes, PackedView};
use crate::resource::{GrowableResource, NativeResource, ReadSeek, Resource, StreamResource};

mod shapes;
mod text;
mod vlq;

pub use text::TextEncoding;
pub use vlq::{MAX_VLQ_U32_LEN, MAX_VLQ_U64_LEN, vlq_big_len, vlq_len};

/// A cursor-based binary reader/writer over a backing [`Resource`].
///
/// Fixed-width values are stored in host byte order with no framing. Every read checks
/// that the requested bytes lie below the logical size and fails with an end-of-data
/// error otherwise, leaving the cursor where it was.
///
/// ```
/// use binbuf::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.write_u32(7).unwrap();
/// buf.write_string("seven").unwrap();
///
/// buf.set_position(0).unwrap();
/// assert_eq!(buf.read_u32().unwrap(), 7);
/// assert_eq!(buf.read_string().unwrap(), "seven");
/// assert!(buf.is_filled());
/// ```
#[derive(Debug)]
pub struct Buffer<R: Resource = GrowableResource> {
    resource: R,
}

impl Buffer<GrowableResource> {
    /// Creates a buffer over a fresh growable resource with the default capacity.
    pub fn new() -> Buffer {
        Buffer::from_resource(GrowableResource::new())
    }

    pub fn with_capacity(capacity: usize) -> Buffer {
        Buffer::from_resource(GrowableResource::with_capacity(capacity))
    }

    /// Creates a buffer holding a copy of `data`. With `start_at_end` the cursor is
    /// placed after the copied bytes, ready for appending.
    pub fn from_slice(data: &[u8], start_at_end: bool) -> Buffer {
        Buffer::from_resource(GrowableResource::from_slice(data, start_at_end))
    }

    /// Creates a buffer that takes over `data` without copying it.
    pub fn from_vec(data: Vec<u8>, start_at_end: bool) -> Buffer {
        Buffer::from_resource(GrowableResource::from_vec(data, start_at_end))
    }

    /// Consumes the buffer and returns its logical contents.
    pub fn into_vec(self) -> Vec<u8> {
        self.resource.into_vec()
    }
}

impl Default for Buffer<GrowableResource> {
    fn default() -> Self {
        Buffer::new()
    }
}

impl<S: Read + Write + Seek> Buffer<StreamResource<S>> {
    /// Creates a buffer over an external stream, starting at the stream's current
    /// position.
    pub fn from_stream(stream: S) -> Result<Buffer<StreamResource<S>>> {
        Ok(Buffer::from_resource(StreamResource::new(stream)?))
    }
}

impl<'a> Buffer<NativeResource<'a>> {
    pub fn from_native(resource: NativeResource<'a>) -> Buffer<NativeResource<'a>> {
        Buffer::from_resource(resource)
    }
}

impl<R: Resource> Buffer<R> {
    pub fn from_resource(resource: R) -> Buffer<R> {
        Buffer { resource }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    /// Hands the backing resource back to the caller.
    pub fn into_resource(self) -> R {
        self.resource
    }

    /// Disposes the backing resource.
    pub fn dispose(mut self) {
        self.resource.dispose();
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.resource.position()
    }

    #[inline]
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        self.resource.set_position(position)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.resource.size()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.resource.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resource.is_empty()
    }

    #[inline]
    pub fn bytes_left(&self) -> usize {
        self.resource.bytes_left()
    }

    /// Returns `true` when the cursor sits at (or past) the logical end.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.position() >= self.size()
    }

    pub fn clear(&mut self, wipe: bool) -> Result<()> {
        self.resource.clear(wipe)
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.resource.as_bytes()
    }

    pub fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>> {
        self.resource.as_stream()
    }

    #[inline]
    fn write_scalar<T: NoUninit>(&mut self, value: T) -> Result<()> {
        let view = PackedView::pack(value);
        self.resource.write_packed(view.as_bytes(), size_of::<T>())
    }

    #[inline]
    fn read_scalar<T: AnyBitPattern>(&mut self) -> Result<T> {
        let bytes = self.resource.read_packed(size_of::<T>())?;
        Ok(PackedView::from_bytes(bytes).unpack())
    }

    /// Writes the first `len` bytes of `view` as one transfer.
    #[inline]
    fn write_view(&mut self, view: &PackedView, len: usize) -> Result<()> {
        self.resource.write_packed(view.as_bytes(), len)
    }

    #[inline]
    fn read_view(&mut self, len: usize) -> Result<PackedView> {
        Ok(PackedView::from_bytes(self.resource.read_packed(len)?))
    }

    /// Runs `f`, moving the cursor back to where it was if `f` fails.
    fn rewind_on_error<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.position();
        let result = f(self);
        if result.is_err() && self.position() != start {
            // Report the failure from `f`, not from the rewind.
            let _ = self.resource.set_position(start);
        }
        result
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.resource.write_byte(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.resource.write_byte(value as u8)
    }

    /// Writes `value` as a single byte, `1` or `0`.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.resource.write_byte(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_scalar(value)
    }

    pub fn write_decimal(&mut self, value: Decimal128) -> Result<()> {
        self.write_scalar(value)
    }

    /// Writes a UTF-16 code unit.
    pub fn write_char16(&mut self, unit: u16) -> Result<()> {
        self.write_scalar(unit)
    }

    /// Writes a character as one ASCII byte; non-ASCII characters become `?`.
    pub fn write_ascii_char(&mut self, c: char) -> Result<()> {
        self.resource.write_byte(text::ascii_byte(c))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.resource.read_byte()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.resource.read_byte()? as i8)
    }

    /// Reads a single byte; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.resource.read_byte()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_scalar()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_scalar()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_scalar()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_scalar()
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_scalar()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_scalar()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_scalar()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_scalar()
    }

    pub fn read_decimal(&mut self) -> Result<Decimal128> {
        self.read_scalar()
    }

    pub fn read_char16(&mut self) -> Result<u16> {
        self.read_scalar()
    }

    /// Reads one ASCII byte; bytes above `0x7F` become `?`.
    pub fn read_ascii_char(&mut self) -> Result<char> {
        Ok(text::ascii_char(self.resource.read_byte()?))
    }

    /// Writes `data` as raw bytes, without a length prefix.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.resource.write_bytes(data)
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let available = self.bytes_left();
        if count > available {
            return Err(Error::end_of_data(self.position(), count, self.size()));
        }
        let start = self.position();
        let mut data = vec![0u8; count];
        let read = self.resource.read_bytes(&mut data)?;
        if read < count {
            let _ = self.resource.set_position(start);
            return Err(Error::end_of_data(start, count, start + read));
        }
        Ok(data)
    }

    /// Reads up to `dest.len()` bytes and returns how many were transferred.
    pub fn read_into(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.resource.read_bytes(dest)
    }

    /// Reads everything between the cursor and the logical end.
    pub fn read_bytes_left(&mut self) -> Result<Vec<u8>> {
        self.read_bytes(self.bytes_left())
    }

    /// Writes the in-memory representation of `value`.
    pub fn write_struct<T: NoUninit>(&mut self, value: &T) -> Result<()> {
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() <= PACKED_SIZE {
            let mut packed: PackedBytes = [0; PACKED_SIZE];
            packed[..bytes.len()].copy_from_slice(bytes);
            self.resource.write_packed(&packed, bytes.len())
        } else {
            // SAFETY: `bytes` borrows `value`, which cannot alias storage behind `&mut self`.
            unsafe { self.resource.write_raw(bytes.as_ptr(), bytes.len()) }
        }
    }

    /// Reads a value of type `T` from its in-memory representation.
    pub fn read_struct<T: AnyBitPattern>(&mut self) -> Result<T> {
        let len = size_of::<T>();
        if len <= PACKED_SIZE {
            let packed = self.resource.read_packed(len)?;
            Ok(bytemuck::pod_read_unaligned(&packed[..len]))
        } else {
            let bytes = self.read_bytes(len)?;
            Ok(bytemuck::pod_read_unaligned(&bytes))
        }
    }

    /// Appends the whole logical contents of `src`. The cursor of `src` is preserved.
    pub fn write_buffer<S: Resource>(&mut self, src: &mut Buffer<S>) -> Result<()> {
        let size = src.size();
        self.write_buffer_range(src, 0..size)
    }

    /// Appends bytes `range` of `src`. The cursor of `src` is restored afterwards, also
    /// when the copy fails.
    pub fn write_buffer_range<S: Resource>(
        &mut self,
        src: &mut Buffer<S>,
        range: Range<usize>,
    ) -> Result<()> {
        verify_arg!(range, range.start <= range.end);
        let saved = src.position();
        let copied = src
            .set_position(range.start)
            .and_then(|_| src.read_bytes(range.len()))
            .and_then(|bytes| self.write_bytes(&bytes));
        let restored = src.set_position(saved);
        copied.and(restored)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binbuf_common::ErrorKind;

    use super::*;

    #[test]
    fn test_scalars_native_order() {
        let mut buf = Buffer::with_capacity(0);
        buf.write_u16(0x0102).unwrap();
        buf.write_i32(-2).unwrap();
        buf.write_f64(1.5).unwrap();
        buf.write_bool(true).unwrap();
        buf.write_i8(-1).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&0x0102u16.to_ne_bytes());
        expected.extend_from_slice(&(-2i32).to_ne_bytes());
        expected.extend_from_slice(&1.5f64.to_ne_bytes());
        expected.extend_from_slice(&[1, 0xFF]);
        assert_eq!(buf.as_bytes().unwrap(), &expected[..]);

        buf.set_position(0).unwrap();
        assert_eq!(buf.read_u16().unwrap(), 0x0102);
        assert_eq!(buf.read_i32().unwrap(), -2);
        assert_eq!(buf.read_f64().unwrap(), 1.5);
        assert!(buf.read_bool().unwrap());
        assert_eq!(buf.read_i8().unwrap(), -1);
        assert!(buf.is_filled());
    }

    #[test]
    fn test_read_past_end_keeps_position() {
        let mut buf = Buffer::from_slice(&[1, 2, 3], false);
        buf.set_position(1).unwrap();
        let err = buf.read_u32().unwrap_err();
        assert!(err.is_end_of_data());
        assert_eq!(buf.position(), 1);
        assert!(buf.read_bytes(3).unwrap_err().is_end_of_data());
        assert_eq!(buf.position(), 1);
        assert_eq!(buf.read_u16().unwrap(), u16::from_ne_bytes([2, 3]));
    }

    #[test]
    fn test_bytes_helpers() {
        let mut buf = Buffer::from_slice(b"hello world", false);
        assert_eq!(buf.read_bytes(5).unwrap(), b"hello");
        let mut dest = [0u8; 16];
        assert_eq!(buf.read_into(&mut dest).unwrap(), 6);
        assert_eq!(&dest[..6], b" world");
        assert_eq!(buf.read_into(&mut dest).unwrap(), 0);

        buf.set_position(6).unwrap();
        assert_eq!(buf.read_bytes_left().unwrap(), b"world");
        assert_eq!(buf.read_bytes_left().unwrap(), b"");
    }

    #[test]
    fn test_ascii_char() {
        let mut buf = Buffer::new();
        buf.write_ascii_char('A').unwrap();
        buf.write_ascii_char('é').unwrap();
        buf.write_u8(0xC8).unwrap();
        buf.write_char16(0x263A).unwrap();
        buf.set_position(0).unwrap();
        assert_eq!(buf.read_ascii_char().unwrap(), 'A');
        assert_eq!(buf.read_ascii_char().unwrap(), '?');
        assert_eq!(buf.read_ascii_char().unwrap(), '?');
        assert_eq!(buf.read_char16().unwrap(), 0x263A);
    }

    #[test]
    fn test_decimal() {
        let d = Decimal128::new(31415926535, true, 10).unwrap();
        let mut buf = Buffer::new();
        buf.write_decimal(d).unwrap();
        assert_eq!(buf.size(), 16);
        buf.set_position(0).unwrap();
        let back = buf.read_decimal().unwrap();
        assert_eq!(back, d);
        assert_eq!(back.to_string(), "-3.1415926535");
    }

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Header {
        magic: u32,
        version: u16,
        flags: u16,
    }

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Record {
        id: u64,
        weights: [f32; 4],
        origin: [i32; 3],
        tag: u32,
    }

    #[test]
    fn test_struct_blit() {
        let header = Header {
            magic: 0x4642_4942,
            version: 3,
            flags: 0x8001,
        };
        let record = Record {
            id: u64::MAX - 7,
            weights: [0.25, -1.0, 3.5, f32::MIN_POSITIVE],
            origin: [-1, 0, 1],
            tag: 42,
        };
        let mut buf = Buffer::with_capacity(4);
        buf.write_struct(&header).unwrap();
        buf.write_struct(&record).unwrap();
        assert_eq!(buf.size(), size_of::<Header>() + size_of::<Record>());

        buf.set_position(0).unwrap();
        assert_eq!(buf.read_struct::<Header>().unwrap(), header);
        assert_eq!(buf.read_struct::<Record>().unwrap(), record);

        buf.set_position(1).unwrap();
        let _ = buf.read_struct::<Header>().unwrap();
        assert!(buf.read_struct::<Record>().unwrap_err().is_end_of_data());
        assert_eq!(buf.position(), 1 + size_of::<Header>());
    }

    #[test]
    fn test_write_buffer_restores_source_cursor() {
        let mut src = Buffer::from_slice(b"0123456789", false);
        src.set_position(7).unwrap();

        let mut dst = Buffer::new();
        dst.write_buffer(&mut src).unwrap();
        assert_eq!(src.position(), 7);
        dst.write_buffer_range(&mut src, 2..5).unwrap();
        assert_eq!(src.position(), 7);
        assert_eq!(dst.as_bytes().unwrap(), b"0123456789234");

        let err = dst.write_buffer_range(&mut src, 8..12).unwrap_err();
        assert!(err.is_end_of_data());
        assert_eq!(src.position(), 7);
        assert_eq!(dst.size(), 13);

        #[allow(clippy::reversed_empty_ranges)]
        let err = dst.write_buffer_range(&mut src, 5..2).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_write_buffer_across_resources() {
        let mut region = [0u8; 8];
        let mut native = Buffer::from_native(NativeResource::from_slice(&mut region));
        native.write_u32(0xA1B2_C3D4).unwrap();

        let mut growable = Buffer::new();
        growable.write_buffer_range(&mut native, 0..4).unwrap();
        assert_eq!(growable.as_bytes().unwrap(), &0xA1B2_C3D4u32.to_ne_bytes());
        assert_eq!(native.position(), 4);
    }

    #[test]
    fn test_native_max_violation() {
        let mut region = [0u8; 6];
        let mut buf = Buffer::from_native(NativeResource::from_slice(&mut region));
        buf.clear(false).unwrap();
        buf.write_u32(1).unwrap();
        let err = buf.write_u32(2).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::CapacityViolation { end: 8, max: 6 }
        ));
        assert_eq!(buf.position(), 4);
        assert!(matches!(
            buf.as_bytes().unwrap_err().kind(),
            ErrorKind::Unsupported { .. }
        ));
    }

    #[test]
    fn test_from_vec_into_vec() {
        let mut buf = Buffer::from_vec(vec![9, 9], true);
        buf.write_u8(10).unwrap();
        assert_eq!(buf.into_vec(), vec![9, 9, 10]);
    }

    #[test]
    fn test_stream_buffer() {
        let mut buf = Buffer::from_stream(Cursor::new(Vec::new())).unwrap();
        buf.write_i64(-5).unwrap();
        buf.write_f32(0.5).unwrap();
        buf.set_position(0).unwrap();
        assert_eq!(buf.read_i64().unwrap(), -5);
        assert_eq!(buf.read_f32().unwrap(), 0.5);
        assert!(buf.read_u8().unwrap_err().is_end_of_data());

        let mut contents = Vec::new();
        buf.as_stream().unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents.len(), 12);
        assert_eq!(buf.position(), 12);

        let inner = buf.into_resource().into_inner().unwrap();
        assert_eq!(inner.into_inner(), contents);
    }

    #[test]
    fn test_dispose_resource() {
        let mut buf = Buffer::new();
        buf.write_u8(1).unwrap();
        buf.resource_mut().dispose();
        assert!(matches!(
            buf.write_u8(2).unwrap_err().kind(),
            ErrorKind::Disposed
        ));
        buf.dispose();
    }
}
