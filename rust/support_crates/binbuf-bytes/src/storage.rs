use crate::align::{align_up, is_aligned_ptr, pow2_capacity};

/// Fixed-length, zero-initialized byte storage with an aligned data start.
///
/// The length of the storage is the amount of addressable memory; there is no separate
/// "used" prefix. [`grow`](AlignedStorage::grow) extends it to the next power of two,
/// zero-filling the new tail and carrying the existing bytes over when a reallocation
/// is needed.
///
/// Storage adopted from a plain `Vec<u8>` (see [`AlignedStorage::from_vec`]) keeps the
/// original allocation and only promises byte alignment.
pub struct AlignedStorage {
    /// Backing allocation; the first `start` bytes are alignment padding.
    inner: Vec<u8>,
    start: u32,
    alignment: u32,
}

impl AlignedStorage {
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Storage of length zero. Does not allocate.
    pub fn empty() -> AlignedStorage {
        AlignedStorage {
            inner: Vec::new(),
            start: 0,
            alignment: Self::DEFAULT_ALIGNMENT as u32,
        }
    }

    pub fn zeroed(len: usize) -> AlignedStorage {
        Self::zeroed_with_alignment(len, Self::DEFAULT_ALIGNMENT)
    }

    /// Allocates `len` zeroed bytes whose first byte is aligned to `alignment`.
    pub fn zeroed_with_alignment(len: usize, alignment: usize) -> AlignedStorage {
        let alignment = alignment.max(1);
        assert!(alignment.is_power_of_two());
        if len == 0 {
            return AlignedStorage {
                inner: Vec::new(),
                start: 0,
                alignment: alignment as u32,
            };
        }

        let padded = len.checked_add(alignment - 1).expect("storage length overflow");
        let mut inner = Vec::<u8>::with_capacity(padded);
        let p = inner.as_ptr() as usize;
        let start = align_up(p, alignment) - p;
        inner.resize(start + len, 0);
        AlignedStorage {
            inner,
            start: start as u32,
            alignment: alignment as u32,
        }
    }

    /// Allocates aligned storage holding a copy of `data`.
    pub fn copy_from_slice_with_alignment(data: &[u8], alignment: usize) -> AlignedStorage {
        let mut storage = Self::zeroed_with_alignment(data.len(), alignment);
        storage.copy_from_slice(data);
        storage
    }

    /// Adopts `data` as storage without copying it.
    pub fn from_vec(data: Vec<u8>) -> AlignedStorage {
        AlignedStorage {
            inner: data,
            start: 0,
            alignment: 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.start as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment as usize
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start as usize..]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let start = self.start as usize;
        &mut self.inner[start..]
    }

    pub fn is_aligned(&self, alignment: usize) -> bool {
        is_aligned_ptr(self.as_ptr(), alignment)
    }

    /// Extends the storage to hold at least `required` bytes, rounding the new length
    /// up to a power of two. Returns the new length. Storage that already holds
    /// `required` bytes is left untouched.
    pub fn grow(&mut self, required: usize) -> usize {
        let len = self.len();
        if required <= len {
            return len;
        }
        let new_len = pow2_capacity(required);
        let start = self.start as usize;
        if start + new_len <= self.inner.capacity() {
            self.inner.resize(start + new_len, 0);
        } else {
            log::trace!("reallocating aligned storage: {len} -> {new_len} bytes");
            let mut grown = Self::zeroed_with_alignment(new_len, self.alignment());
            grown.as_mut_slice()[..len].copy_from_slice(self.as_slice());
            *self = grown;
        }
        new_len
    }

    /// Returns the contents as a plain vector, dropping the alignment padding.
    pub fn into_vec(mut self) -> Vec<u8> {
        let start = self.start as usize;
        if start != 0 {
            self.inner.drain(..start);
        }
        self.inner
    }
}

impl std::ops::Deref for AlignedStorage {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::ops::DerefMut for AlignedStorage {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Clone for AlignedStorage {
    fn clone(&self) -> AlignedStorage {
        Self::copy_from_slice_with_alignment(self.as_slice(), self.alignment())
    }
}

impl Default for AlignedStorage {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for AlignedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedStorage")
            .field("len", &self.len())
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}
