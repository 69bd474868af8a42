use std::io::Cursor;

use binbuf_bytes::AlignedStorage;
use binbuf_common::{Error, Result};

use super::{ReadSeek, Resource, check_packed_len, check_read, transfer_end};
use crate::packed::{PACKED_SIZE, PackedBytes};

/// A resource backed by a contiguous heap allocation that grows on demand.
///
/// The physical capacity is the length of the zero-initialized storage. When a write
/// (or a seek) needs more room, the storage is reallocated to the smallest power of two
/// that fits and the existing bytes are carried over.
#[derive(Debug, Clone)]
pub struct GrowableResource {
    storage: AlignedStorage,
    position: usize,
    size: usize,
    disposed: bool,
}

impl GrowableResource {
    /// Capacity of a resource created by [`GrowableResource::new`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Alignment of storage allocated by the resource.
    pub const ALIGNMENT: usize = 16;

    /// Creates an empty resource with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY) bytes
    /// of storage.
    pub fn new() -> GrowableResource {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty resource with `capacity` bytes of zeroed storage.
    pub fn with_capacity(capacity: usize) -> GrowableResource {
        GrowableResource {
            storage: AlignedStorage::zeroed_with_alignment(capacity, Self::ALIGNMENT),
            position: 0,
            size: 0,
            disposed: false,
        }
    }

    /// Creates a resource holding a copy of `data`. The cursor starts at the end of the
    /// data when `start_at_end` is set (append mode), at zero otherwise.
    pub fn from_slice(data: &[u8], start_at_end: bool) -> GrowableResource {
        let storage = AlignedStorage::copy_from_slice_with_alignment(data, Self::ALIGNMENT);
        Self::from_storage(storage, start_at_end)
    }

    /// Creates a resource that adopts `data` as its storage, without copying.
    pub fn from_vec(data: Vec<u8>, start_at_end: bool) -> GrowableResource {
        Self::from_storage(AlignedStorage::from_vec(data), start_at_end)
    }

    /// Consumes the resource and returns its logical contents `[0, size)`.
    pub fn into_vec(self) -> Vec<u8> {
        let size = self.size;
        let mut v = self.storage.into_vec();
        v.truncate(size);
        v
    }

    fn from_storage(storage: AlignedStorage, start_at_end: bool) -> GrowableResource {
        let size = storage.len();
        GrowableResource {
            storage,
            position: if start_at_end { size } else { 0 },
            size,
            disposed: false,
        }
    }

    /// Makes sure the storage covers `required` bytes.
    fn ensure_capacity(&mut self, required: usize) {
        let capacity = self.storage.len();
        if required <= capacity {
            return;
        }
        let new_capacity = self.storage.grow(required);
        log::trace!("growable resource: capacity {capacity} -> {new_capacity}");
    }

    fn check_open(&self) -> Result<()> {
        if self.disposed {
            Err(Error::disposed())
        } else {
            Ok(())
        }
    }

    /// Prepares a write of `len` bytes at the cursor and returns its end offset.
    fn begin_write(&mut self, len: usize) -> Result<usize> {
        self.check_open()?;
        let end = transfer_end(self.position, len)?;
        self.ensure_capacity(end);
        Ok(end)
    }

    fn end_write(&mut self, end: usize) {
        self.position = end;
        self.size = self.size.max(end);
    }

    fn begin_read(&self, len: usize) -> Result<usize> {
        self.check_open()?;
        check_read(self.position, len, self.size)
    }
}

impl Default for GrowableResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for GrowableResource {
    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.check_open()?;
        self.ensure_capacity(position);
        self.position = position;
        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.storage.len()
    }

    fn clear(&mut self, wipe: bool) -> Result<()> {
        self.check_open()?;
        if wipe {
            self.storage[..self.size].fill(0);
        }
        self.position = 0;
        self.size = 0;
        Ok(())
    }

    fn write_packed(&mut self, bytes: &PackedBytes, len: usize) -> Result<()> {
        check_packed_len(len)?;
        let end = self.begin_write(len)?;
        self.storage[self.position..end].copy_from_slice(&bytes[..len]);
        self.end_write(end);
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        let end = self.begin_write(1)?;
        self.storage[self.position] = value;
        self.end_write(end);
        Ok(())
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        let end = self.begin_write(src.len())?;
        self.storage[self.position..end].copy_from_slice(src);
        self.end_write(end);
        Ok(())
    }

    fn read_packed(&mut self, len: usize) -> Result<PackedBytes> {
        check_packed_len(len)?;
        let end = self.begin_read(len)?;
        let mut bytes = [0u8; PACKED_SIZE];
        bytes[..len].copy_from_slice(&self.storage[self.position..end]);
        self.position = end;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let end = self.begin_read(1)?;
        let value = self.storage[self.position];
        self.position = end;
        Ok(value)
    }

    fn read_bytes(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let count = dest.len().min(self.bytes_left());
        let end = self.position + count;
        dest[..count].copy_from_slice(&self.storage[self.position..end]);
        self.position = end;
        Ok(count)
    }

    fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>> {
        self.check_open()?;
        Ok(Box::new(Cursor::new(&self.storage[..self.size])))
    }

    fn as_bytes(&self) -> Result<&[u8]> {
        self.check_open()?;
        Ok(&self.storage[..self.size])
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::debug!(
            "disposing growable resource: size {}, capacity {}",
            self.size,
            self.storage.len()
        );
        self.storage = AlignedStorage::empty();
        self.position = 0;
        self.size = 0;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
