//! Length-prefixed payloads: byte arrays, text and signed big integers.
//!
//! Every payload is preceded by its byte length as a native-order `i32`.

use binbuf_common::{Error, Result, verify_data};
use num_bigint::BigInt;

use super::Buffer;
use crate::resource::Resource;

/// Character encoding applied to length-prefixed strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Seven-bit ASCII. Characters outside the range are replaced with `?`.
    Ascii,
    /// UTF-16 code units in host byte order.
    Utf16,
}

impl TextEncoding {
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii => text.chars().map(ascii_byte).collect(),
            TextEncoding::Utf16 => text.encode_utf16().flat_map(u16::to_ne_bytes).collect(),
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes)
                .map_err(|e| Error::invalid_format("utf8 text", e.to_string())),
            TextEncoding::Ascii => Ok(bytes.into_iter().map(ascii_char).collect()),
            TextEncoding::Utf16 => {
                verify_data!(utf16_text, bytes.len() % 2 == 0);
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                    .collect::<Vec<_>>();
                String::from_utf16(&units)
                    .map_err(|e| Error::invalid_format("utf16 text", e.to_string()))
            }
        }
    }
}

#[inline]
pub(super) fn ascii_byte(c: char) -> u8 {
    if c.is_ascii() { c as u8 } else { b'?' }
}

#[inline]
pub(super) fn ascii_char(b: u8) -> char {
    if b.is_ascii() { b as char } else { '?' }
}

impl<R: Resource> Buffer<R> {
    /// Writes `data` preceded by its length.
    pub fn write_byte_array(&mut self, data: &[u8]) -> Result<()> {
        let len = i32::try_from(data.len())
            .map_err(|_| Error::invalid_arg("data", "length exceeds i32::MAX"))?;
        self.rewind_on_error(|buf| {
            buf.write_i32(len)?;
            buf.write_bytes(data)
        })
    }

    /// Reads a length-prefixed byte array. A negative length is rejected, and on any
    /// failure the cursor is left before the prefix.
    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        self.rewind_on_error(|buf| {
            let len = buf.read_i32()?;
            verify_data!(length_prefix, len >= 0);
            buf.read_bytes(len as usize)
        })
    }

    /// Writes `text` as UTF-8.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        self.write_byte_array(text.as_bytes())
    }

    pub fn write_string_with(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        self.write_byte_array(&encoding.encode(text))
    }

    pub fn write_ascii_string(&mut self, text: &str) -> Result<()> {
        self.write_string_with(text, TextEncoding::Ascii)
    }

    /// Reads a UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_string_with(TextEncoding::Utf8)
    }

    pub fn read_string_with(&mut self, encoding: TextEncoding) -> Result<String> {
        self.rewind_on_error(|buf| encoding.decode(buf.read_byte_array()?))
    }

    pub fn read_ascii_string(&mut self) -> Result<String> {
        self.read_string_with(TextEncoding::Ascii)
    }

    /// Writes `value` as minimal two's-complement bytes, least significant first.
    pub fn write_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.write_byte_array(&value.to_signed_bytes_le())
    }

    pub fn read_big_int(&mut self) -> Result<BigInt> {
        let bytes = self.read_byte_array()?;
        Ok(BigInt::from_signed_bytes_le(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use binbuf_common::ErrorKind;
    use num_bigint::BigInt;
    use num_traits::{One, Zero};

    use super::*;

    #[test]
    fn test_string_wire_format() {
        let mut buf = Buffer::new();
        buf.write_string("héllo").unwrap();
        let bytes = buf.as_bytes().unwrap();
        assert_eq!(&bytes[..4], &6i32.to_ne_bytes());
        assert_eq!(&bytes[4..], "héllo".as_bytes());
    }

    #[test]
    fn test_encodings_roundtrip() {
        let text = "Grüße, 世界 🦀";
        let mut buf = Buffer::new();
        buf.write_string(text).unwrap();
        buf.write_string_with(text, TextEncoding::Utf16).unwrap();
        buf.write_ascii_string(text).unwrap();
        buf.write_string("").unwrap();

        buf.set_position(0).unwrap();
        assert_eq!(buf.read_string().unwrap(), text);
        assert_eq!(buf.read_string_with(TextEncoding::Utf16).unwrap(), text);
        assert_eq!(buf.read_ascii_string().unwrap(), "Gr??e, ?? ?");
        assert_eq!(buf.read_string().unwrap(), "");
        assert!(buf.is_filled());
    }

    #[test]
    fn test_utf16_units_native_order() {
        let bytes = TextEncoding::Utf16.encode("A");
        assert_eq!(bytes, 0x41u16.to_ne_bytes());
        assert!(TextEncoding::Utf16.decode(vec![0x41]).is_err());
    }

    #[test]
    fn test_ascii_decode_replaces_high_bytes() {
        assert_eq!(
            TextEncoding::Ascii.decode(vec![b'o', b'k', 0xFF]).unwrap(),
            "ok?"
        );
    }

    #[test]
    fn test_invalid_utf8_restores_position() {
        let mut buf = Buffer::new();
        buf.write_u8(7).unwrap();
        buf.write_byte_array(&[0xC3, 0x28]).unwrap();
        buf.set_position(1).unwrap();
        let err = buf.read_string().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
        assert_eq!(buf.position(), 1);
        assert_eq!(buf.read_byte_array().unwrap(), [0xC3, 0x28]);
    }

    #[test]
    fn test_negative_length_prefix() {
        let mut buf = Buffer::new();
        buf.write_i32(-1).unwrap();
        buf.write_bytes(b"abcd").unwrap();
        buf.set_position(0).unwrap();
        let err = buf.read_byte_array().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = Buffer::new();
        buf.write_i32(10).unwrap();
        buf.write_bytes(b"abc").unwrap();
        buf.set_position(0).unwrap();
        assert!(buf.read_byte_array().unwrap_err().is_end_of_data());
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_big_int_wire_format() {
        let cases: [(BigInt, &[u8]); 5] = [
            (BigInt::zero(), &[0x00]),
            (BigInt::one(), &[0x01]),
            (BigInt::from(-1), &[0xFF]),
            (BigInt::from(128), &[0x80, 0x00]),
            (BigInt::from(-129), &[0x7F, 0xFF]),
        ];
        for (value, expected) in cases {
            let mut buf = Buffer::new();
            buf.write_big_int(&value).unwrap();
            let bytes = buf.as_bytes().unwrap();
            assert_eq!(&bytes[..4], &(expected.len() as i32).to_ne_bytes());
            assert_eq!(&bytes[4..], expected);

            buf.set_position(0).unwrap();
            assert_eq!(buf.read_big_int().unwrap(), value);
        }
    }

    #[test]
    fn test_big_int_large() {
        let value: BigInt = BigInt::from(-3).pow(200u32);
        let mut buf = Buffer::new();
        buf.write_big_int(&value).unwrap();
        buf.set_position(0).unwrap();
        assert_eq!(buf.read_big_int().unwrap(), value);
    }
}
