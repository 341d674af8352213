//! Bit-granular cursors over DNS wire data.
//!
//! Header fields such as the opcode and rcode are narrower than a byte, so
//! both cursors track a bit position. Byte-sized reads and writes take a fast
//! path when the cursor is aligned and fall back to shift/mask arithmetic
//! otherwise. Fields are always most-significant-bit first.

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Returns a mask with the low `width` bits set.
#[inline]
const fn low_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// A read cursor over a DNS message.
///
/// The reader always keeps the whole message in view so that compression
/// pointers can be followed, but it may be [`limited`](Self::limited) to a
/// window (an RDATA section) past which reads fail.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    /// The complete message.
    data: &'a [u8],
    /// Current position in bits.
    bit_pos: usize,
    /// Byte offset reads may not cross.
    limit: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_pos: 0,
            limit: data.len(),
        }
    }

    /// Creates a reader positioned at byte `offset` of `data`.
    #[inline]
    pub const fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            bit_pos: offset * 8,
            limit: data.len(),
        }
    }

    /// Returns a reader over the next `len` bytes.
    ///
    /// The returned reader shares the full message (for compression
    /// pointers) but cannot read past `position() + len`.
    pub fn limited(&self, len: usize) -> Result<Self> {
        let start = self.position();
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.limit)
            .ok_or_else(|| Error::unexpected_eof(start + len))?;
        Ok(Self {
            data: self.data,
            bit_pos: self.bit_pos,
            limit: end,
        })
    }

    /// Returns the complete underlying message.
    #[inline]
    pub const fn message(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the current byte position (rounded down).
    #[inline]
    pub const fn position(&self) -> usize {
        self.bit_pos / 8
    }

    /// Returns the current position in bits.
    #[inline]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns true if the cursor sits on a byte boundary.
    #[inline]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Returns the number of whole bytes left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.bit_pos.div_ceil(8))
    }

    /// Returns true if no bits are left before the limit.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bit_pos >= self.limit * 8
    }

    /// Moves the cursor to byte `offset`.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.limit {
            return Err(Error::unexpected_eof(offset));
        }
        self.bit_pos = offset * 8;
        Ok(())
    }

    /// Reads the next `width` bits (at most 64) as an unsigned integer.
    pub fn read_bits(&mut self, width: u8) -> Result<u64> {
        debug_assert!(width <= 64);
        let end = self.bit_pos + usize::from(width);
        if end > self.limit * 8 {
            return Err(Error::unexpected_eof(end.div_ceil(8)));
        }

        let mut value = 0u64;
        let mut left = width;
        while left > 0 {
            let byte = self.data[self.bit_pos / 8];
            let offset = (self.bit_pos % 8) as u8;
            let available = 8 - offset;
            let take = available.min(left);
            let shift = available - take;
            let chunk = (u64::from(byte) >> shift) & low_mask(take);
            value = (value << take) | chunk;
            self.bit_pos += usize::from(take);
            left -= take;
        }
        Ok(value)
    }

    /// Reads a single bit as a bool.
    #[inline]
    pub fn read_flag(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads a byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.is_aligned() {
            let pos = self.position();
            if pos >= self.limit {
                return Err(Error::unexpected_eof(pos));
            }
            self.bit_pos += 8;
            Ok(self.data[pos])
        } else {
            Ok(self.read_bits(8)? as u8)
        }
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        if self.is_aligned() {
            let bytes = self.read_bytes(2)?;
            Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
        } else {
            Ok(self.read_bits(16)? as u16)
        }
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        if self.is_aligned() {
            let bytes = self.read_bytes(4)?;
            Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        } else {
            Ok(self.read_bits(32)? as u32)
        }
    }

    /// Reads `len` bytes. The cursor must be byte-aligned.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if !self.is_aligned() {
            return Err(Error::invalid_data(
                self.position(),
                "byte read from an unaligned bit position",
            ));
        }
        let start = self.position();
        let end = start + len;
        if end > self.limit {
            return Err(Error::unexpected_eof(end));
        }
        self.bit_pos = end * 8;
        Ok(&self.data[start..end])
    }

    /// Reads everything left before the limit.
    pub fn read_rest(&mut self) -> Result<&'a [u8]> {
        let len = self.remaining();
        self.read_bytes(len)
    }

    /// Peeks at the next byte without advancing.
    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.clone().read_u8()
    }
}

/// A write cursor producing DNS wire data.
///
/// Bits are packed most-significant first; a partially filled final byte is
/// zero-padded when the buffer is frozen.
#[derive(Debug, Default)]
pub struct WireWriter {
    /// The bytes written so far, including a partially filled last byte.
    buf: BytesMut,
    /// Number of bits already used in the last byte (0 when aligned).
    bit_offset: u8,
}

impl WireWriter {
    /// Creates a writer with the given byte capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            bit_offset: 0,
        }
    }

    /// Returns the number of bytes touched so far (a partial byte counts).
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns true if the cursor sits on a byte boundary.
    #[inline]
    pub const fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Appends the low `width` bits of `value`, most significant bit first.
    ///
    /// Fails if `value` does not fit in `width` bits rather than silently
    /// truncating it.
    pub fn write_bits(&mut self, value: u64, width: u8) -> Result<()> {
        debug_assert!(width <= 64);
        if value & !low_mask(width) != 0 {
            return Err(Error::FieldOverflow { value, width });
        }

        let mut left = width;
        while left > 0 {
            if self.bit_offset == 0 {
                self.buf.put_u8(0);
            }
            let free = 8 - self.bit_offset;
            let take = free.min(left);
            let chunk = ((value >> (left - take)) & low_mask(take)) as u8;
            let last = self.buf.len() - 1;
            self.buf[last] |= chunk << (free - take);
            self.bit_offset = (self.bit_offset + take) % 8;
            left -= take;
        }
        Ok(())
    }

    /// Appends a single bit.
    #[inline]
    pub fn write_flag(&mut self, flag: bool) {
        // A single bit always fits.
        let _ = self.write_bits(u64::from(flag), 1);
    }

    /// Writes a byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        if self.is_aligned() {
            self.buf.put_u8(value);
        } else {
            let _ = self.write_bits(u64::from(value), 8);
        }
    }

    /// Writes a big-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        if self.is_aligned() {
            self.buf.put_u16(value);
        } else {
            let _ = self.write_bits(u64::from(value), 16);
        }
    }

    /// Writes a big-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        if self.is_aligned() {
            self.buf.put_u32(value);
        } else {
            let _ = self.write_bits(u64::from(value), 32);
        }
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.is_aligned() {
            self.buf.put_slice(bytes);
        } else {
            for byte in bytes {
                let _ = self.write_bits(u64::from(*byte), 8);
            }
        }
    }

    /// Overwrites a big-endian u16 at an earlier byte offset.
    ///
    /// Used to back-fill length fields once the payload size is known.
    pub fn patch_u16(&mut self, at: usize, value: u16) -> Result<()> {
        if at + 2 > self.buf.len() {
            return Err(Error::buffer_too_short(at + 2, self.buf.len()));
        }
        self.buf[at..at + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Returns the bytes written so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the packed bytes.
    #[inline]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Consumes the writer, returning the packed bytes as a vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Consumes the writer, returning the mutable buffer.
    #[inline]
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}
