//! Bounds-checked little-endian cursor over an in-memory model.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Cursor over the model bytes.
///
/// Every read names the field being decoded so that running out of input
/// surfaces as [`FormatError::Truncated`] with useful context.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume `prefix` if the input starts with it.
    pub fn eat_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.buf[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Fail unless at least `n` bytes remain.
    pub fn require(&self, n: usize, what: &'static str) -> Result<(), FormatError> {
        if self.remaining() < n {
            Err(FormatError::Truncated { what })
        } else {
            Ok(())
        }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], FormatError> {
        self.require(n, what)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize, what: &'static str) -> Result<(), FormatError> {
        self.take(n, what).map(|_| ())
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.take(4, what)?))
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        Ok(LittleEndian::read_i32(self.take(4, what)?))
    }

    pub fn read_i64(&mut self, what: &'static str) -> Result<i64, FormatError> {
        Ok(LittleEndian::read_i64(self.take(8, what)?))
    }

    pub fn read_u64(&mut self, what: &'static str) -> Result<u64, FormatError> {
        Ok(LittleEndian::read_u64(self.take(8, what)?))
    }

    pub fn read_f32(&mut self, what: &'static str) -> Result<f32, FormatError> {
        Ok(LittleEndian::read_f32(self.take(4, what)?))
    }

    /// Read a `u64` element count, checked against the bytes left.
    fn read_len(&mut self, elem_size: usize, what: &'static str) -> Result<usize, FormatError> {
        let len = self.read_u64(what)?;
        let fits = usize::try_from(len)
            .ok()
            .and_then(|n| n.checked_mul(elem_size))
            .is_some_and(|bytes| bytes <= self.remaining());
        if !fits {
            return Err(FormatError::Truncated { what });
        }
        Ok(len as usize)
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_string(&mut self, what: &'static str) -> Result<String, FormatError> {
        let len = self.read_u64(what)?;
        if len > self.remaining() as u64 {
            return Err(FormatError::InvalidString {
                what,
                reason: format!("length {len} exceeds remaining {} bytes", self.remaining()),
            });
        }
        let bytes = self.take(len as usize, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FormatError::InvalidString {
            what,
            reason: e.to_string(),
        })
    }

    /// Length-prefixed vector of `f32`.
    pub fn read_f32_vec(&mut self, what: &'static str) -> Result<Vec<f32>, FormatError> {
        let len = self.read_len(4, what)?;
        let bytes = self.take(len * 4, what)?;
        let mut values = vec![0.0; len];
        LittleEndian::read_f32_into(bytes, &mut values);
        Ok(values)
    }

    /// Length-prefixed vector of strings.
    pub fn read_string_vec(&mut self, what: &'static str) -> Result<Vec<String>, FormatError> {
        // each element carries at least its 8-byte length
        let len = self.read_len(8, what)?;
        (0..len).map(|_| self.read_string(what)).collect()
    }

    /// Length-prefixed vector of string pairs.
    pub fn read_string_pairs(
        &mut self,
        what: &'static str,
    ) -> Result<Vec<(String, String)>, FormatError> {
        let len = self.read_len(16, what)?;
        (0..len)
            .map(|_| Ok((self.read_string(what)?, self.read_string(what)?)))
            .collect()
    }
}
