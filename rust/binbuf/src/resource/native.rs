use std::{
    alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error},
    marker::PhantomData,
    ptr::NonNull,
};

use binbuf_common::{Error, Result};

use super::{ReadSeek, Resource, check_packed_len, check_read, transfer_end};
use crate::packed::{PACKED_SIZE, PackedBytes};

/// Describes who owns the memory behind a [`NativeResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeOwnership {
    /// The region was allocated by the resource and is freed when it is disposed.
    Owned { capacity: usize },
    /// The region belongs to the caller and is never freed by the resource. With a
    /// declared `max`, writes past it are rejected; without one the caller vouches
    /// for every write.
    Borrowed { max: Option<usize> },
}

/// A resource over a raw memory region that never reallocates.
///
/// The lifetime `'a` ties a borrowed region to the resource; regions passed in as raw
/// pointers carry the same requirement as a safety contract.
///
/// Foreign memory cannot be surfaced as a managed stream or slice, so
/// [`as_stream`](Resource::as_stream) and [`as_bytes`](Resource::as_bytes) are
/// unsupported.
pub struct NativeResource<'a> {
    ptr: NonNull<u8>,
    ownership: NativeOwnership,
    position: usize,
    size: usize,
    /// Largest logical size observed, reported as capacity when no maximum is declared.
    high_water: usize,
    disposed: bool,
    _region: PhantomData<&'a mut [u8]>,
}

impl NativeResource<'static> {
    /// Alignment of regions allocated by [`NativeResource::allocate`].
    pub const ALIGNMENT: usize = 16;

    /// Allocates a zero-filled region of `capacity` bytes owned by the resource.
    pub fn allocate(capacity: usize) -> Result<NativeResource<'static>> {
        let ptr = if capacity == 0 {
            NonNull::dangling()
        } else {
            let layout = owned_layout(capacity)?;
            let ptr = unsafe { alloc_zeroed(layout) };
            match NonNull::new(ptr) {
                Some(ptr) => ptr,
                None => handle_alloc_error(layout),
            }
        };
        log::debug!("native resource: allocated {capacity} bytes");
        Ok(NativeResource::make(
            ptr,
            NativeOwnership::Owned { capacity },
            0,
        ))
    }
}

fn owned_layout(capacity: usize) -> Result<Layout> {
    Layout::from_size_align(capacity, NativeResource::ALIGNMENT)
        .map_err(|_| Error::invalid_arg("capacity", "capacity exceeds the address space"))
}

impl<'a> NativeResource<'a> {
    /// Wraps a caller-owned slice. The declared maximum is the slice length and the
    /// existing contents are readable (the logical size starts at the slice length).
    pub fn from_slice(region: &'a mut [u8]) -> NativeResource<'a> {
        let len = region.len();
        let ptr = NonNull::from(region).cast::<u8>();
        NativeResource::make(ptr, NativeOwnership::Borrowed { max: Some(len) }, len)
    }

    /// Wraps an empty caller-owned region at `ptr`, optionally bounded by `max`.
    ///
    /// # Safety
    ///
    /// `ptr` must stay valid for reads and writes for the lifetime of the resource:
    /// for `max` bytes when a maximum is given, or for every offset the caller later
    /// writes to or reads from when it is not.
    pub unsafe fn from_raw(ptr: *mut u8, max: Option<usize>) -> Result<NativeResource<'a>> {
        let ptr = NonNull::new(ptr).ok_or_else(|| Error::invalid_arg("ptr", "ptr is null"))?;
        Ok(NativeResource::make(
            ptr,
            NativeOwnership::Borrowed { max },
            0,
        ))
    }

    /// Wraps `len` initialized caller-owned bytes at `ptr`; the declared maximum and the
    /// logical size are both `len`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for the lifetime of the
    /// resource, and the bytes must be initialized.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Result<NativeResource<'a>> {
        let ptr = NonNull::new(ptr).ok_or_else(|| Error::invalid_arg("ptr", "ptr is null"))?;
        Ok(NativeResource::make(
            ptr,
            NativeOwnership::Borrowed { max: Some(len) },
            len,
        ))
    }

    /// Returns the ownership of the underlying region.
    pub fn ownership(&self) -> NativeOwnership {
        self.ownership
    }

    /// Returns the declared maximum size, if any.
    pub fn max_size(&self) -> Option<usize> {
        match self.ownership {
            NativeOwnership::Owned { capacity } => Some(capacity),
            NativeOwnership::Borrowed { max } => max,
        }
    }

    /// Returns the start address of the region.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    fn make(ptr: NonNull<u8>, ownership: NativeOwnership, size: usize) -> NativeResource<'a> {
        NativeResource {
            ptr,
            ownership,
            position: 0,
            size,
            high_water: size,
            disposed: false,
            _region: PhantomData,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.disposed {
            Err(Error::disposed())
        } else {
            Ok(())
        }
    }

    fn begin_write(&self, len: usize) -> Result<usize> {
        self.check_open()?;
        let end = transfer_end(self.position, len)?;
        match self.max_size() {
            Some(max) if end > max => Err(Error::capacity_violation(end, max)),
            _ => Ok(end),
        }
    }

    fn end_write(&mut self, end: usize) {
        self.position = end;
        if end > self.size {
            self.size = end;
            self.high_water = self.high_water.max(end);
        }
    }

    fn begin_read(&self, len: usize) -> Result<usize> {
        self.check_open()?;
        check_read(self.position, len, self.size)
    }

    /// Copies `src` to the cursor.
    ///
    /// # Safety
    ///
    /// The range `[position, position + src.len())` must have been validated by
    /// `begin_write`.
    unsafe fn copy_in(&mut self, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.as_ptr(),
                self.ptr.as_ptr().add(self.position),
                src.len(),
            );
        }
    }

    /// Copies bytes from the cursor into `dest`.
    ///
    /// # Safety
    ///
    /// The range `[position, position + dest.len())` must lie within the logical size.
    unsafe fn copy_out(&self, dest: &mut [u8]) {
        if dest.is_empty() {
            return;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.ptr.as_ptr().add(self.position),
                dest.as_mut_ptr(),
                dest.len(),
            );
        }
    }
}

impl Resource for NativeResource<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.check_open()?;
        self.position = position;
        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.max_size()
            .unwrap_or_else(|| self.high_water.max(self.size))
    }

    fn clear(&mut self, wipe: bool) -> Result<()> {
        self.check_open()?;
        if wipe && self.size != 0 {
            unsafe { self.ptr.as_ptr().write_bytes(0, self.size) };
        }
        self.high_water = self.high_water.max(self.size);
        self.position = 0;
        self.size = 0;
        Ok(())
    }

    fn write_packed(&mut self, bytes: &PackedBytes, len: usize) -> Result<()> {
        check_packed_len(len)?;
        let end = self.begin_write(len)?;
        unsafe { self.copy_in(&bytes[..len]) };
        self.end_write(end);
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        let end = self.begin_write(1)?;
        unsafe { self.ptr.as_ptr().add(self.position).write(value) };
        self.end_write(end);
        Ok(())
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        let end = self.begin_write(src.len())?;
        unsafe { self.copy_in(src) };
        self.end_write(end);
        Ok(())
    }

    fn read_packed(&mut self, len: usize) -> Result<PackedBytes> {
        check_packed_len(len)?;
        let end = self.begin_read(len)?;
        let mut bytes = [0u8; PACKED_SIZE];
        unsafe { self.copy_out(&mut bytes[..len]) };
        self.position = end;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let end = self.begin_read(1)?;
        let value = unsafe { self.ptr.as_ptr().add(self.position).read() };
        self.position = end;
        Ok(value)
    }

    fn read_bytes(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let count = dest.len().min(self.bytes_left());
        if count == 0 {
            return Ok(0);
        }
        unsafe { self.copy_out(&mut dest[..count]) };
        self.position += count;
        Ok(count)
    }

    fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>> {
        Err(Error::unsupported("as_stream on native memory"))
    }

    fn as_bytes(&self) -> Result<&[u8]> {
        Err(Error::unsupported("as_bytes on native memory"))
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let NativeOwnership::Owned { capacity } = self.ownership {
            if capacity != 0 {
                if let Ok(layout) = owned_layout(capacity) {
                    unsafe { dealloc(self.ptr.as_ptr(), layout) };
                }
            }
            log::debug!("native resource: released {capacity} bytes");
        }
        self.position = 0;
        self.size = 0;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for NativeResource<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for NativeResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeResource")
            .field("ptr", &self.ptr)
            .field("ownership", &self.ownership)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("disposed", &self.disposed)
            .finish()
    }
}
