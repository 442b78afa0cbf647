//! Well-known binary encodings.
//!
//! Every encoded value starts with an endian marker byte (1 for little
//! endian, 0 for big endian) followed by its type tag. Hex-WKB is the
//! uppercase hexadecimal form of the same bytes.

mod codec;

use crate::error::{ChronotopeError, ReportExt, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::ops::BitOr;

/// Output variant flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WkbVariant(u8);

impl WkbVariant {
    /// Little endian
    pub const NDR: Self = Self(0x08);
    /// Big endian
    pub const XDR: Self = Self(0x10);
    /// Emit the SRID of spatial values
    pub const EXTENDED: Self = Self(0x04);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn little_endian(self) -> bool {
        !self.contains(Self::XDR)
    }
}

impl Default for WkbVariant {
    fn default() -> Self {
        Self::NDR
    }
}

impl BitOr for WkbVariant {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Byte sink honoring the selected endianness.
pub struct WkbWriter {
    buf: BytesMut,
    little: bool,
    extended: bool,
}

impl WkbWriter {
    pub fn new(variant: WkbVariant) -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
            little: variant.little_endian(),
            extended: variant.contains(WkbVariant::EXTENDED),
        }
    }

    /// Whether spatial values should carry their SRID.
    pub fn extended(&self) -> bool {
        self.extended
    }

    pub fn put_endian(&mut self) {
        self.buf.put_u8(u8::from(self.little));
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        if self.little {
            self.buf.put_u16_le(v)
        } else {
            self.buf.put_u16(v)
        }
    }

    pub fn put_u32(&mut self, v: u32) {
        if self.little {
            self.buf.put_u32_le(v)
        } else {
            self.buf.put_u32(v)
        }
    }

    pub fn put_u64(&mut self, v: u64) {
        if self.little {
            self.buf.put_u64_le(v)
        } else {
            self.buf.put_u64(v)
        }
    }

    pub fn put_i32(&mut self, v: i32) {
        if self.little {
            self.buf.put_i32_le(v)
        } else {
            self.buf.put_i32(v)
        }
    }

    pub fn put_i64(&mut self, v: i64) {
        if self.little {
            self.buf.put_i64_le(v)
        } else {
            self.buf.put_i64(v)
        }
    }

    pub fn put_f64(&mut self, v: f64) {
        if self.little {
            self.buf.put_f64_le(v)
        } else {
            self.buf.put_f64(v)
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Element count, which must fit in 32 bits.
    pub fn put_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count)
            .map_err(|_| ChronotopeError::WkbOutput(format!("Too many elements: {}", count)))?;
        self.put_u32(count);
        Ok(())
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Bounds-checked byte source.
pub struct WkbReader<'a> {
    buf: &'a [u8],
    little: bool,
}

impl<'a> WkbReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            buf: bytes,
            little: true,
        }
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(ChronotopeError::WkbInput(format!(
                "Unexpected end of input: need {} bytes, {} left",
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    /// Read the endian marker and switch byte order accordingly.
    pub fn read_endian(&mut self) -> Result<()> {
        self.little = match self.get_u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(ChronotopeError::WkbInput(format!(
                    "Invalid endian flag {}",
                    other
                )));
            }
        };
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(if self.little {
            self.buf.get_u16_le()
        } else {
            self.buf.get_u16()
        })
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(if self.little {
            self.buf.get_u32_le()
        } else {
            self.buf.get_u32()
        })
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(if self.little {
            self.buf.get_u64_le()
        } else {
            self.buf.get_u64()
        })
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(if self.little {
            self.buf.get_i32_le()
        } else {
            self.buf.get_i32()
        })
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(if self.little {
            self.buf.get_i64_le()
        } else {
            self.buf.get_i64()
        })
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(if self.little {
            self.buf.get_f64_le()
        } else {
            self.buf.get_f64()
        })
    }

    pub fn get_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Element count; rejects counts that cannot fit in the remaining input.
    pub fn get_count(&mut self, min_elem_size: usize) -> Result<usize> {
        let count = self.get_u32()? as usize;
        if count == 0 {
            return Err(ChronotopeError::WkbInput("Empty collection".to_string()));
        }
        self.need(count.saturating_mul(min_elem_size))?;
        Ok(count)
    }

    /// Fail if input is left over.
    pub fn finish(&self) -> Result<()> {
        if self.buf.has_remaining() {
            return Err(ChronotopeError::WkbInput(format!(
                "{} trailing bytes after value",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}

/// Values with a binary encoding.
pub trait WkbEncode {
    /// Write the full encoding, endian marker included.
    fn write_wkb(&self, w: &mut WkbWriter) -> Result<()>;

    fn as_wkb(&self, variant: WkbVariant) -> Result<Bytes> {
        let mut w = WkbWriter::new(variant);
        self.write_wkb(&mut w).reported()?;
        Ok(w.finish())
    }

    fn as_hexwkb(&self, variant: WkbVariant) -> Result<String> {
        Ok(hex::encode_upper(self.as_wkb(variant)?))
    }
}

/// Values decodable from their binary encoding.
pub trait WkbDecode: Sized {
    /// Read the full encoding, endian marker included.
    fn read_wkb(r: &mut WkbReader<'_>) -> Result<Self>;

    fn from_wkb(bytes: &[u8]) -> Result<Self> {
        let decode = || -> Result<Self> {
            let mut r = WkbReader::new(bytes);
            let value = Self::read_wkb(&mut r)?;
            r.finish()?;
            Ok(value)
        };
        decode().reported()
    }

    fn from_hexwkb(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex.trim())
            .map_err(|e| ChronotopeError::WkbInput(format!("Invalid hex string: {}", e)))
            .reported()?;
        Self::from_wkb(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_endianness() {
        let mut le = WkbWriter::new(WkbVariant::NDR);
        le.put_endian();
        le.put_u16(0x0102);
        assert_eq!(le.finish().as_ref(), &[1, 0x02, 0x01]);

        let mut be = WkbWriter::new(WkbVariant::XDR);
        be.put_endian();
        be.put_u16(0x0102);
        assert_eq!(be.finish().as_ref(), &[0, 0x01, 0x02]);
    }

    #[test]
    fn test_reader_checks_length() {
        let bytes = [1u8, 0x02];
        let mut r = WkbReader::new(&bytes);
        r.read_endian().unwrap();
        assert!(r.get_u16().is_err());

        let mut bad = WkbReader::new(&[7u8]);
        assert!(bad.read_endian().is_err());
    }

    #[test]
    fn test_reader_roundtrip_big_endian() {
        let mut w = WkbWriter::new(WkbVariant::XDR);
        w.put_endian();
        w.put_i64(-42);
        w.put_f64(1.5);
        let bytes = w.finish();

        let mut r = WkbReader::new(&bytes);
        r.read_endian().unwrap();
        assert_eq!(r.get_i64().unwrap(), -42);
        assert_eq!(r.get_f64().unwrap(), 1.5);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_variant_flags() {
        let v = WkbVariant::XDR | WkbVariant::EXTENDED;
        assert!(v.contains(WkbVariant::EXTENDED));
        assert!(!v.little_endian());
        assert!(WkbVariant::default().little_endian());
    }
}
