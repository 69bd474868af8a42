//! Little-endian base-128 variable-length integers.
//!
//! Each byte carries seven bits of the value, least significant group first. The high
//! bit (`0x80`) is set on every byte except the last.

use binbuf_common::{Error, Result};
use num_bigint::BigUint;
use num_traits::Zero;

use super::Buffer;
use crate::packed::PackedView;
use crate::resource::Resource;

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;

/// Longest encoding of a `u32`.
pub const MAX_VLQ_U32_LEN: usize = 5;

/// Longest encoding of a `u64`.
pub const MAX_VLQ_U64_LEN: usize = 10;

impl<R: Resource> Buffer<R> {
    pub fn write_vlq_u32(&mut self, value: u32) -> Result<()> {
        self.write_vlq_u64(value as u64)
    }

    /// Writes `value` in 1 to 10 bytes.
    pub fn write_vlq_u64(&mut self, mut value: u64) -> Result<()> {
        let mut view = PackedView::default();
        let mut len = 0;
        loop {
            let mut byte = value as u8 & GROUP_MASK;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUATION;
            }
            view.set_byte(len, byte);
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.write_view(&view, len)
    }

    /// Writes an unbounded unsigned integer, one byte per started group of seven bits.
    pub fn write_vlq_big(&mut self, value: &BigUint) -> Result<()> {
        let mut groups = value.to_radix_le(128);
        if groups.is_empty() {
            groups.push(0);
        }
        let last = groups.len() - 1;
        for group in &mut groups[..last] {
            *group |= CONTINUATION;
        }
        self.write_bytes(&groups)
    }

    /// Reads a `u32`. Encodings longer than five bytes, or whose value does not fit,
    /// are rejected and the cursor is left unchanged.
    pub fn read_vlq_u32(&mut self) -> Result<u32> {
        let value = self.read_vlq(MAX_VLQ_U32_LEN, u32::BITS)?;
        Ok(value as u32)
    }

    /// Reads a `u64`. Encodings longer than ten bytes, or whose value does not fit,
    /// are rejected and the cursor is left unchanged.
    pub fn read_vlq_u64(&mut self) -> Result<u64> {
        self.read_vlq(MAX_VLQ_U64_LEN, u64::BITS)
    }

    /// Reads an unbounded unsigned integer.
    pub fn read_vlq_big(&mut self) -> Result<BigUint> {
        self.rewind_on_error(|buf| {
            let mut groups = Vec::new();
            loop {
                let byte = buf.read_u8()?;
                groups.push(byte & GROUP_MASK);
                if byte & CONTINUATION == 0 {
                    break;
                }
            }
            let value = BigUint::from_radix_le(&groups, 128)
                .ok_or_else(|| Error::invalid_format("vlq", "invalid 7-bit group"))?;
            Ok(value)
        })
    }

    fn read_vlq(&mut self, max_len: usize, bits: u32) -> Result<u64> {
        self.rewind_on_error(|buf| {
            let mut value = 0u64;
            for index in 0..max_len {
                let byte = buf.read_u8()?;
                let group = (byte & GROUP_MASK) as u64;
                let shift = 7 * index as u32;
                if shift + 7 > bits && group >> (bits - shift) != 0 {
                    return Err(Error::invalid_format(
                        "vlq",
                        format!("value does not fit in {bits} bits"),
                    ));
                }
                value |= group << shift;
                if byte & CONTINUATION == 0 {
                    return Ok(value);
                }
            }
            Err(Error::invalid_format(
                "vlq",
                format!("encoding longer than {max_len} bytes"),
            ))
        })
    }
}

/// Returns the number of bytes `value` occupies when VLQ-encoded.
pub fn vlq_len(value: u64) -> usize {
    let bits = u64::BITS - value.leading_zeros();
    (bits as usize).div_ceil(7).max(1)
}

/// Returns the number of bytes an unbounded `value` occupies when VLQ-encoded.
pub fn vlq_big_len(value: &BigUint) -> usize {
    if value.is_zero() {
        1
    } else {
        (value.bits() as usize).div_ceil(7)
    }
}
