//! A 128-bit decimal value in the classic four-word layout.

use binbuf_common::{Result, verify_arg};
use bytemuck::{Pod, Zeroable};

/// A decimal number `(-1)^sign * mantissa / 10^scale` with a 96-bit mantissa and a
/// scale in `0..=28`, stored as four native-order 32-bit words:
///
/// | offset | word    | contents                                   |
/// |--------|---------|--------------------------------------------|
/// | 0      | `flags` | scale in bits 16..24, sign in bit 31       |
/// | 4      | `hi`    | mantissa bits 64..96                       |
/// | 8      | `lo`    | mantissa bits 0..32                        |
/// | 12     | `mid`   | mantissa bits 32..64                       |
///
/// Equality compares representations: `1.0` and `1.00` are different values.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Decimal128 {
    flags: u32,
    hi: u32,
    lo: u32,
    mid: u32,
}

impl Decimal128 {
    pub const MAX_SCALE: u8 = 28;
    pub const MAX_MANTISSA: u128 = (1u128 << 96) - 1;
    pub const ZERO: Decimal128 = Decimal128 {
        flags: 0,
        hi: 0,
        lo: 0,
        mid: 0,
    };

    const SIGN_MASK: u32 = 0x8000_0000;
    const SCALE_SHIFT: u32 = 16;

    /// Creates a decimal from its mantissa, sign and scale.
    pub fn new(mantissa: u128, negative: bool, scale: u8) -> Result<Decimal128> {
        verify_arg!(mantissa, mantissa <= Decimal128::MAX_MANTISSA);
        verify_arg!(scale, scale <= Decimal128::MAX_SCALE);
        let mut flags = (scale as u32) << Self::SCALE_SHIFT;
        if negative {
            flags |= Self::SIGN_MASK;
        }
        Ok(Decimal128 {
            flags,
            hi: (mantissa >> 64) as u32,
            lo: mantissa as u32,
            mid: (mantissa >> 32) as u32,
        })
    }

    /// Creates a decimal from the three 32-bit mantissa words, low to high.
    pub fn from_parts(lo: u32, mid: u32, hi: u32, negative: bool, scale: u8) -> Result<Decimal128> {
        let mantissa = ((hi as u128) << 64) | ((mid as u128) << 32) | lo as u128;
        Self::new(mantissa, negative, scale)
    }

    pub fn mantissa(&self) -> u128 {
        ((self.hi as u128) << 64) | ((self.mid as u128) << 32) | self.lo as u128
    }

    pub fn scale(&self) -> u8 {
        (self.flags >> Self::SCALE_SHIFT) as u8
    }

    pub fn is_negative(&self) -> bool {
        self.flags & Self::SIGN_MASK != 0
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa() == 0
    }
}

impl From<i64> for Decimal128 {
    fn from(value: i64) -> Self {
        let magnitude = value.unsigned_abs() as u128;
        Decimal128 {
            flags: if value < 0 { Self::SIGN_MASK } else { 0 },
            hi: 0,
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
        }
    }
}

impl From<u64> for Decimal128 {
    fn from(value: u64) -> Self {
        Decimal128 {
            flags: 0,
            hi: 0,
            lo: value as u32,
            mid: (value >> 32) as u32,
        }
    }
}

impl std::fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.mantissa().to_string();
        let scale = self.scale() as usize;
        if self.is_negative() && !self.is_zero() {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() <= scale {
            write!(f, "0.{digits:0>scale$}")
        } else {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        }
    }
}

impl std::fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decimal128({self})")
    }
}
