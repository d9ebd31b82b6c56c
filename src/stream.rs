//! Fixed byte-order primitive I/O for codebook files.
//!
//! Codebooks are exchanged with other implementations, so the byte order is
//! always chosen explicitly and never follows the host.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

/// Upper bound on capacity reserved from a length field before any data is read.
pub(crate) const MAX_PREALLOC: usize = 4096;

/// Byte order of multi-byte values in a codebook stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Writes booleans, `i32`, `f64` and `f64` arrays in a fixed byte order.
pub struct EndianWriter<W> {
    inner: W,
    order: ByteOrder,
}

impl<W: Write> EndianWriter<W> {
    pub fn new(inner: W, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// One byte, `1` for true and `0` for false.
    pub fn write_bool(&mut self, value: bool) -> io::Result<()> {
        self.inner.write_all(&[u8::from(value)])
    }

    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        let bytes = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.inner.write_all(&bytes)
    }

    /// Write a length field. Lengths beyond `i32::MAX` cannot be encoded.
    pub fn write_len(&mut self, len: usize) -> io::Result<()> {
        let len = i32::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("length {len} does not fit in an int32 field"),
            )
        })?;
        self.write_i32(len)
    }

    pub fn write_f64(&mut self, value: f64) -> io::Result<()> {
        let bytes = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.inner.write_all(&bytes)
    }

    /// Write the values only; the caller writes any length prefix.
    pub fn write_f64_slice(&mut self, values: &[f64]) -> io::Result<()> {
        for &v in values {
            self.write_f64(v)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads the primitives written by [`EndianWriter`].
pub struct EndianReader<R> {
    inner: R,
    order: ByteOrder,
}

impl<R: Read> EndianReader<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Any non-zero byte reads as true.
    pub fn read_bool(&mut self) -> io::Result<bool> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(buf),
            ByteOrder::Little => i32::from_le_bytes(buf),
        })
    }

    pub fn read_f64(&mut self) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf)?;
        Ok(match self.order {
            ByteOrder::Big => f64::from_be_bytes(buf),
            ByteOrder::Little => f64::from_le_bytes(buf),
        })
    }

    /// Read `len` values. A length larger than the stream fails with
    /// `UnexpectedEof` once the data runs out.
    pub fn read_f64_vec(&mut self, len: usize) -> io::Result<Vec<f64>> {
        let mut values = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            values.push(self.read_f64()?);
        }
        Ok(values)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_endian_layout() {
        let mut w = EndianWriter::new(Vec::new(), ByteOrder::Big);
        w.write_bool(true).unwrap();
        w.write_i32(258).unwrap();
        w.write_f64(1.0).unwrap();
        let bytes = w.into_inner();

        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[0, 0, 1, 2]);
        assert_eq!(&bytes[5..13], &[0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut w = EndianWriter::new(Vec::new(), ByteOrder::Little);
        w.write_i32(258).unwrap();
        assert_eq!(w.into_inner(), vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_read_back_preserves_bits() {
        let values = [f64::MIN_POSITIVE, -0.0, 1.0 / 3.0, f64::MAX];
        let mut w = EndianWriter::new(Vec::new(), ByteOrder::Big);
        w.write_f64_slice(&values).unwrap();

        let mut r = EndianReader::new(Cursor::new(w.into_inner()), ByteOrder::Big);
        let back = r.read_f64_vec(values.len()).unwrap();
        for (a, b) in values.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_oversized_length_is_eof() {
        let mut r = EndianReader::new(Cursor::new(vec![0u8; 16]), ByteOrder::Big);
        let err = r.read_f64_vec(i32::MAX as usize).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_nonzero_byte_is_true() {
        let mut r = EndianReader::new(Cursor::new(vec![7u8, 0u8]), ByteOrder::Big);
        assert!(r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());
    }

    #[test]
    fn test_truncated_input_is_io_error() {
        let mut r = EndianReader::new(Cursor::new(vec![0u8, 1u8]), ByteOrder::Big);
        let err = r.read_i32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
