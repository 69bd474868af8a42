//! Fixed 16-byte overlay used to move scalars between typed values and storage.

use bytemuck::{AnyBitPattern, NoUninit};

/// Width of the packed overlay in bytes.
pub const PACKED_SIZE: usize = 16;

/// Raw contents of a packed overlay, as exchanged with a
/// [`Resource`](crate::resource::Resource).
pub type PackedBytes = [u8; PACKED_SIZE];

/// Sixteen bytes addressable as byte, short, int, long, float, double or decimal
/// lanes, all aliasing the same storage in host byte order.
///
/// Lane `i` of a type `T` covers bytes `i * size_of::<T>()..(i + 1) * size_of::<T>()`.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(C, align(16))]
pub(crate) struct PackedView {
    bytes: PackedBytes,
}

impl PackedView {
    #[inline]
    pub fn from_bytes(bytes: PackedBytes) -> PackedView {
        PackedView { bytes }
    }

    /// Packs `value` into the leading bytes of a zeroed view.
    #[inline]
    pub fn pack<T: NoUninit>(value: T) -> PackedView {
        const { assert!(std::mem::size_of::<T>() <= PACKED_SIZE) };
        let mut view = PackedView::default();
        view.set_lane(0, value);
        view
    }

    /// Reads a `T` from the leading bytes of the view.
    #[inline]
    pub fn unpack<T: AnyBitPattern>(&self) -> T {
        const { assert!(std::mem::size_of::<T>() <= PACKED_SIZE) };
        self.lane(0)
    }

    #[inline]
    pub fn as_bytes(&self) -> &PackedBytes {
        &self.bytes
    }

    #[inline]
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    #[inline]
    pub fn set_byte(&mut self, index: usize, value: u8) {
        self.bytes[index] = value;
    }

    /// Reads lane `index` of type `T`.
    ///
    /// Panics if the lane does not fit within the 16 bytes.
    #[inline]
    pub fn lane<T: AnyBitPattern>(&self, index: usize) -> T {
        let width = std::mem::size_of::<T>();
        let start = index * width;
        bytemuck::pod_read_unaligned(&self.bytes[start..start + width])
    }

    /// Overwrites lane `index` of type `T`, leaving every other byte untouched.
    ///
    /// Panics if the lane does not fit within the 16 bytes.
    #[inline]
    pub fn set_lane<T: NoUninit>(&mut self, index: usize, value: T) {
        let width = std::mem::size_of::<T>();
        let start = index * width;
        self.bytes[start..start + width].copy_from_slice(bytemuck::bytes_of(&value));
    }
}

impl std::fmt::Debug for PackedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PackedView").field(&self.bytes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decimal128;

    #[test]
    fn test_lanes_alias_native_order() {
        let mut view = PackedView::default();
        view.set_lane::<u32>(1, 0x0403_0201);
        assert_eq!(&view.as_bytes()[4..8], &0x0403_0201u32.to_ne_bytes());
        assert_eq!(view.byte(0), 0);
        assert_eq!(view.lane::<u32>(0), 0);

        view.set_byte(4, 0xFF);
        let expected = u32::from_ne_bytes([0xFF, view.byte(5), view.byte(6), view.byte(7)]);
        assert_eq!(view.lane::<u32>(1), expected);
    }

    #[test]
    fn test_pack_unpack() {
        let view = PackedView::pack(-2.5f64);
        assert_eq!(view.unpack::<f64>(), -2.5);
        assert_eq!(&view.as_bytes()[..8], &(-2.5f64).to_ne_bytes());
        assert!(view.as_bytes()[8..].iter().all(|&b| b == 0));

        let view = PackedView::pack(u64::MAX);
        assert_eq!(view.lane::<u16>(3), u16::MAX);
        assert_eq!(view.lane::<u16>(4), 0);
    }

    #[test]
    fn test_full_width_lanes() {
        let mut view = PackedView::default();
        view.set_lane::<f64>(0, 1.0);
        view.set_lane::<f64>(1, -1.0);
        assert_eq!(view.lane::<f64>(0), 1.0);
        assert_eq!(view.lane::<f64>(1), -1.0);

        let d = Decimal128::from(-12345i64);
        let view = PackedView::pack(d);
        assert_eq!(view.unpack::<Decimal128>(), d);
        assert_eq!(PackedView::from_bytes(*view.as_bytes()), view);
    }

    #[test]
    #[should_panic]
    fn test_lane_out_of_range() {
        let view = PackedView::default();
        let _ = view.lane::<u64>(2);
    }
}
