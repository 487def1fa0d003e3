//! # View Cursors
//!
//! Little-endian read/write positions over packet bytes.
//!
//! ## Design
//!
//! - One cursor per packet encode or decode; nested writers share it
//! - Writers can reserve a slot, fill it in later and rewind to drop output
//! - Every overrun is a [`NetworkError::OutOfBounds`], never a short value

use bytemuck::Pod;

use crate::error::{NetworkError, NetworkResult};

/// Append-only writer with a hard size limit.
///
/// The buffer is kept across packets to avoid reallocating each tick.
#[derive(Debug, Clone)]
pub struct WriteCursor {
    buffer: Vec<u8>,
    limit: usize,
}

#[allow(clippy::missing_errors_doc)]
impl WriteCursor {
    /// Creates a cursor that refuses to grow past `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Clears the cursor for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Current write offset.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Discards everything written after `position`.
    #[inline]
    pub fn rewind(&mut self, position: usize) {
        self.buffer.truncate(position);
    }

    #[inline]
    fn put(&mut self, bytes: &[u8]) -> NetworkResult<()> {
        let remaining = self.limit.saturating_sub(self.buffer.len());
        if bytes.len() > remaining {
            return Err(NetworkError::OutOfBounds {
                needed: bytes.len(),
                remaining,
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a single byte.
    ///
    /// # Errors
    ///
    /// [`NetworkError::OutOfBounds`] past the limit. The same holds for every
    /// other write.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> NetworkResult<()> {
        self.put(&[value])
    }

    /// Little-endian `u32`.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> NetworkResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes a u64 in little-endian format.
    #[inline]
    pub fn write_u64(&mut self, value: u64) -> NetworkResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Little-endian `f32`.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> NetworkResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes a f64 in little-endian format.
    #[inline]
    pub fn write_f64(&mut self, value: f64) -> NetworkResult<()> {
        self.put(&value.to_le_bytes())
    }

    /// Writes a plain-old-data value byte-for-byte.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) -> NetworkResult<()> {
        self.put(bytemuck::bytes_of(value))
    }

    /// Reserves one byte to be filled by [`WriteCursor::backfill_u8`].
    /// Returns its offset.
    #[inline]
    pub fn reserve_u8(&mut self) -> NetworkResult<usize> {
        let at = self.position();
        self.write_u8(0)?;
        Ok(at)
    }

    /// Reserves four bytes to be filled by [`WriteCursor::backfill_u32`].
    #[inline]
    pub fn reserve_u32(&mut self) -> NetworkResult<usize> {
        let at = self.position();
        self.write_u32(0)?;
        Ok(at)
    }

    /// Overwrites a reserved byte.
    ///
    /// # Errors
    ///
    /// [`NetworkError::OutOfBounds`] if `at` was never written.
    #[inline]
    pub fn backfill_u8(&mut self, at: usize, value: u8) -> NetworkResult<()> {
        self.backfill(at, &[value])
    }

    /// Overwrites four reserved bytes.
    #[inline]
    pub fn backfill_u32(&mut self, at: usize, value: u32) -> NetworkResult<()> {
        self.backfill(at, &value.to_le_bytes())
    }

    fn backfill(&mut self, at: usize, bytes: &[u8]) -> NetworkResult<()> {
        let len = self.buffer.len();
        let slot = self
            .buffer
            .get_mut(at..at + bytes.len())
            .ok_or(NetworkError::OutOfBounds {
                needed: bytes.len(),
                remaining: len.saturating_sub(at),
            })?;
        slot.copy_from_slice(bytes);
        Ok(())
    }
}

/// Reader over a received packet.
#[derive(Debug, Clone, Copy)]
pub struct ReadCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

#[allow(clippy::missing_errors_doc)]
impl<'a> ReadCursor<'a> {
    /// Creates a new cursor at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Current read offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Unread bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Whether every byte has been consumed.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> NetworkResult<[u8; N]> {
        let bytes = self
            .buffer
            .get(self.position..self.position + N)
            .ok_or(NetworkError::OutOfBounds {
                needed: N,
                remaining: self.remaining(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position += N;
        Ok(out)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// [`NetworkError::OutOfBounds`] when the packet is too short. The same
    /// holds for every other read.
    #[inline]
    pub fn read_u8(&mut self) -> NetworkResult<u8> {
        self.take::<1>().map(|[byte]| byte)
    }

    /// Little-endian `u32`.
    #[inline]
    pub fn read_u32(&mut self) -> NetworkResult<u32> {
        self.take().map(u32::from_le_bytes)
    }

    /// Reads a u64 in little-endian format.
    #[inline]
    pub fn read_u64(&mut self) -> NetworkResult<u64> {
        self.take().map(u64::from_le_bytes)
    }

    /// Little-endian `f32`.
    #[inline]
    pub fn read_f32(&mut self) -> NetworkResult<f32> {
        self.take().map(f32::from_le_bytes)
    }

    /// Reads a f64 in little-endian format.
    #[inline]
    pub fn read_f64(&mut self) -> NetworkResult<f64> {
        self.take().map(f64::from_le_bytes)
    }

    /// Reads a plain-old-data value byte-for-byte.
    #[inline]
    pub fn read_pod<T: Pod>(&mut self) -> NetworkResult<T> {
        let size = std::mem::size_of::<T>();
        let slice = self
            .buffer
            .get(self.position..self.position + size)
            .ok_or(NetworkError::OutOfBounds {
                needed: size,
                remaining: self.remaining(),
            })?;
        let value = bytemuck::pod_read_unaligned(slice);
        self.position += size;
        Ok(value)
    }
}
