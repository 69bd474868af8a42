/// Aligns a number up to the next multiple of the specified alignment.
///
/// # Arguments
///
/// * `n` - The number to align up
/// * `alignment` - The alignment boundary (must be a power of 2 and non-zero)
///
/// # Examples
///
/// ```
/// use binbuf_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// ```
/// use binbuf_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if a pointer is aligned to the specified alignment boundary.
#[inline]
pub fn is_aligned_ptr(ptr: *const u8, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

/// Returns the capacity a growing buffer should move to in order to hold `required`
/// bytes: the smallest power of two that is greater than or equal to `required`.
///
/// A zero requirement maps to zero (nothing needs to be allocated). If the next power
/// of two does not fit in `usize`, `required` itself is returned and the allocation
/// is left to fail on its own terms.
///
/// ```
/// use binbuf_bytes::align::pow2_capacity;
///
/// assert_eq!(pow2_capacity(0), 0);
/// assert_eq!(pow2_capacity(1), 1);
/// assert_eq!(pow2_capacity(3), 4);
/// assert_eq!(pow2_capacity(1024), 1024);
/// assert_eq!(pow2_capacity(1025), 2048);
/// ```
#[inline]
pub fn pow2_capacity(required: usize) -> usize {
    if required == 0 {
        return 0;
    }
    required.checked_next_power_of_two().unwrap_or(required)
}
