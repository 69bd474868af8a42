//! Small fixed-layout values with dedicated buffer encoders.
//!
//! Every shape is a plain `#[repr(C)]` aggregate without padding, so its wire form is
//! its fields back to back in native order.

use bytemuck::{Pod, Zeroable};

/// A 24-bit integer stored in three bytes, least significant byte first.
///
/// The signed view uses sign-magnitude: bit 23 carries the sign and bits 0..23 the
/// magnitude.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Int24 {
    bytes: [u8; 3],
}

impl Int24 {
    pub const MAX: i32 = 0x007F_FFFF;
    pub const MIN: i32 = -Self::MAX;

    const SIGN_BIT: u32 = 0x0080_0000;
    const MAGNITUDE_MASK: u32 = 0x007F_FFFF;

    pub const fn from_bytes(bytes: [u8; 3]) -> Int24 {
        Int24 { bytes }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        self.bytes
    }

    /// Keeps the low 24 bits of `value`.
    pub const fn from_u32(value: u32) -> Int24 {
        Int24 {
            bytes: [value as u8, (value >> 8) as u8, (value >> 16) as u8],
        }
    }

    pub const fn to_u32(self) -> u32 {
        self.bytes[0] as u32 | (self.bytes[1] as u32) << 8 | (self.bytes[2] as u32) << 16
    }

    /// Encodes the sign and the low 23 bits of the magnitude of `value`.
    pub const fn from_i32(value: i32) -> Int24 {
        let magnitude = value.unsigned_abs() & Self::MAGNITUDE_MASK;
        let sign = if value < 0 { Self::SIGN_BIT } else { 0 };
        Self::from_u32(magnitude | sign)
    }

    pub const fn to_i32(self) -> i32 {
        let raw = self.to_u32();
        let magnitude = (raw & Self::MAGNITUDE_MASK) as i32;
        if raw & Self::SIGN_BIT != 0 {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl From<i32> for Int24 {
    fn from(value: i32) -> Self {
        Int24::from_i32(value)
    }
}

impl From<Int24> for i32 {
    fn from(value: Int24) -> Self {
        value.to_i32()
    }
}

impl std::fmt::Debug for Int24 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Int24({})", self.to_i32())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> PointF {
        PointF { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Point16 {
    pub x: u16,
    pub y: u16,
}

impl Point16 {
    pub const fn new(x: u16, y: u16) -> Point16 {
        Point16 { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Rectangle {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rectangle16 {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle16 {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Rectangle16 {
        Rectangle16 {
            x,
            y,
            width,
            height,
        }
    }
}

/// An ARGB colour, one byte per channel in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Colour {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Colour {
        Colour { a, r, g, b }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Colour {
        Colour { a: 0xFF, r, g, b }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Complex {
        Complex { re, im }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int24_sign_magnitude() {
        assert_eq!(Int24::from_i32(5).to_bytes(), [5, 0, 0]);
        assert_eq!(Int24::from_i32(-5).to_bytes(), [5, 0, 0x80]);
        assert_eq!(Int24::from_i32(-5).to_i32(), -5);
        assert_eq!(Int24::from_i32(Int24::MAX).to_i32(), Int24::MAX);
        assert_eq!(Int24::from_i32(Int24::MIN).to_i32(), Int24::MIN);
        assert_eq!(Int24::from_u32(0x0012_3456).to_bytes(), [0x56, 0x34, 0x12]);
        assert_eq!(Int24::from_u32(0xFF12_3456).to_u32(), 0x0012_3456);
        assert_eq!(i32::from(Int24::from(-1)), -1);
    }

    #[test]
    fn test_shape_sizes() {
        use std::mem::size_of;
        assert_eq!(size_of::<Int24>(), 3);
        assert_eq!(size_of::<Point>(), 8);
        assert_eq!(size_of::<PointF>(), 8);
        assert_eq!(size_of::<Point16>(), 4);
        assert_eq!(size_of::<Rectangle>(), 16);
        assert_eq!(size_of::<Rectangle16>(), 8);
        assert_eq!(size_of::<Colour>(), 4);
        assert_eq!(size_of::<Complex>(), 16);
    }

    #[test]
    fn test_colour_byte_order() {
        let c = Colour::opaque(1, 2, 3);
        assert_eq!(bytemuck::bytes_of(&c), &[0xFF, 1, 2, 3]);
    }
}
