//! Bounds-checked XDR cursor for the field header

use bytes::Buf;

use crate::{Result, XtractError};

/// XDR items are padded to this boundary
const XDR_UNIT: usize = 4;

/// Sequential big-endian decoder over a borrowed byte slice
///
/// Every read checks the remaining length first; running off the end is a
/// `CorruptHeader` error naming the item and the byte position.
pub struct XdrDecoder<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> XdrDecoder<'a> {
    /// Start decoding at the beginning of `buf`
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Bytes not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    fn need(&self, len: usize, what: &str) -> Result<()> {
        if self.remaining() < len {
            return Err(XtractError::CorruptHeader(format!(
                "{what} at byte {} needs {len} bytes, only {} remain",
                self.position,
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Unsigned 32-bit integer
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 4 bytes remain
    pub fn unpack_u32(&mut self, what: &str) -> Result<u32> {
        self.need(4, what)?;
        self.position += 4;
        Ok(self.buf.get_u32())
    }

    /// Double-precision float
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 8 bytes remain
    pub fn unpack_f64(&mut self, what: &str) -> Result<f64> {
        self.need(8, what)?;
        self.position += 8;
        Ok(self.buf.get_f64())
    }

    /// Length-prefixed UTF-8 string padded with zeros to a 4-byte boundary
    ///
    /// # Errors
    ///
    /// Returns error if the length runs past the buffer, the padding is
    /// missing or non-zero, or the bytes are not UTF-8
    pub fn unpack_string(&mut self, what: &str) -> Result<String> {
        let len = self.unpack_u32(what)? as usize;
        let padding = (XDR_UNIT - len % XDR_UNIT) % XDR_UNIT;
        let padded = len.checked_add(padding).ok_or_else(|| {
            XtractError::CorruptHeader(format!("{what} length {len} overflows"))
        })?;
        self.need(padded, what)?;

        let buf: &'a [u8] = self.buf;
        let (text, pad) = buf[..padded].split_at(len);
        if pad.iter().any(|&b| b != 0) {
            return Err(XtractError::CorruptHeader(format!(
                "{what} at byte {} has non-zero padding",
                self.position
            )));
        }

        let value = std::str::from_utf8(text)
            .map_err(|e| {
                XtractError::CorruptHeader(format!(
                    "{what} at byte {} is not UTF-8: {e}",
                    self.position
                ))
            })?
            .to_string();

        self.buf.advance(padded);
        self.position += padded;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_unpack_sequence() {
        let mut bytes = Vec::new();
        bytes.put_u32(7);
        bytes.put_f64(-1.25);

        let mut decoder = XdrDecoder::new(&bytes);
        assert_eq!(decoder.unpack_u32("count").unwrap(), 7);
        assert_eq!(decoder.unpack_f64("offset").unwrap(), -1.25);
        assert_eq!(decoder.remaining(), 0);
        assert_eq!(decoder.position(), 12);
    }

    #[test]
    fn test_unpack_padded_string() {
        let mut bytes = Vec::new();
        bytes.put_u32(5);
        bytes.put_slice(b"shear\0\0\0");
        bytes.put_u32(4);
        bytes.put_slice(b"wall");

        let mut decoder = XdrDecoder::new(&bytes);
        assert_eq!(decoder.unpack_string("name").unwrap(), "shear");
        assert_eq!(decoder.position(), 12);
        assert_eq!(decoder.unpack_string("name").unwrap(), "wall");
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_string_runs_past_end() {
        let mut bytes = Vec::new();
        bytes.put_u32(64);
        bytes.put_slice(b"short");

        let mut decoder = XdrDecoder::new(&bytes);
        assert!(matches!(
            decoder.unpack_string("name"),
            Err(XtractError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_missing_padding() {
        let mut bytes = Vec::new();
        bytes.put_u32(3);
        bytes.put_slice(b"abc");

        let mut decoder = XdrDecoder::new(&bytes);
        assert!(decoder.unpack_string("name").is_err());
    }

    #[test]
    fn test_nonzero_padding() {
        let mut bytes = Vec::new();
        bytes.put_u32(3);
        bytes.put_slice(b"abcX");

        let mut decoder = XdrDecoder::new(&bytes);
        assert!(decoder.unpack_string("name").is_err());
    }

    #[test]
    fn test_invalid_utf8_name() {
        let mut bytes = Vec::new();
        bytes.put_u32(2);
        bytes.put_slice(&[0xff, 0xfe, 0, 0]);

        let mut decoder = XdrDecoder::new(&bytes);
        assert!(matches!(
            decoder.unpack_string("name"),
            Err(XtractError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_short_integer() {
        let mut decoder = XdrDecoder::new(&[0, 0, 1]);
        assert!(matches!(
            decoder.unpack_u32("length"),
            Err(XtractError::CorruptHeader(_))
        ));
    }
}
