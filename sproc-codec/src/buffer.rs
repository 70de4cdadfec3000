//! Write-side sink and read-side cursor used by the value codec.

use crate::error::CodecError;
use bytes::{BufMut, Bytes, BytesMut};

/// Initial capacity of a fresh sink.
pub const INITIAL_CAPACITY: usize = 1024;

/// Extra headroom added whenever the sink has to grow.
pub const GROWTH_SLACK: usize = 2048;

/// Append-only growable byte buffer.
///
/// The sink is consumed by [`ByteSink::finish`], so its storage cannot be
/// touched again once the bytes are handed out.
#[derive(Debug)]
pub struct ByteSink {
    buf: BytesMut,
}

impl ByteSink {
    /// Creates a sink with [`INITIAL_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a sink with the given starting capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends a single byte.
    pub fn append_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.buf.put_u8(byte);
    }

    /// Appends a slice verbatim.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buf.put_slice(bytes);
    }

    /// Appends `value` as a little-endian base-128 varint.
    ///
    /// Each byte carries the next 7 low-order bits; the top bit is set when
    /// more bytes follow. Zero is a single `0x00`.
    pub fn append_varint(&mut self, mut value: u64) {
        loop {
            let low = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.append_byte(low);
                return;
            }
            self.append_byte(low | 0x80);
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current capacity of the backing storage.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Consumes the sink, returning exactly the bytes written.
    ///
    /// A mostly empty buffer is copied out so the spare capacity is released.
    pub fn finish(self) -> Bytes {
        if self.buf.capacity() > self.buf.len() * 2 {
            Bytes::copy_from_slice(&self.buf)
        } else {
            self.buf.freeze()
        }
    }

    fn reserve(&mut self, additional: usize) {
        let len = self.buf.len();
        if self.buf.capacity() - len >= additional {
            return;
        }
        let target = (self.buf.capacity() * 2).max(len + additional + GROWTH_SLACK);
        self.buf.reserve(target - len);
    }
}

impl Default for ByteSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential read cursor over a borrowed byte sequence.
#[derive(Debug, Clone)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads the next byte.
    pub fn next_byte(&mut self) -> Result<u8, CodecError> {
        match self.data.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(CodecError::BufferUnderflow {
                position: self.pos,
                needed: 1,
            }),
        }
    }

    /// Reads the next `n` bytes as a borrowed slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(CodecError::BufferUnderflow {
                position: self.pos,
                needed: n - remaining,
            });
        }
        let data: &'a [u8] = self.data;
        let slice = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a little-endian base-128 varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let byte = self.next_byte()?;
            let low = u64::from(byte & 0x7f);
            if shift >= 64 || (shift == 63 && low > 1) {
                return Err(CodecError::VarintOverflow { position: start });
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Reads a varint and converts it to an in-memory length.
    pub fn read_length(&mut self) -> Result<usize, CodecError> {
        let position = self.pos;
        let length = self.read_varint()?;
        usize::try_from(length).map_err(|_| CodecError::LengthOverflow { length, position })
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: u64) -> Vec<u8> {
        let mut sink = ByteSink::new();
        sink.append_varint(value);
        sink.finish().to_vec()
    }

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(1), vec![0x01]);
        assert_eq!(varint(127), vec![0x7f]);
        assert_eq!(varint(128), vec![0x80, 0x01]);
        assert_eq!(varint(300), vec![0xAC, 0x02]);
        assert_eq!(varint(u64::MAX).len(), 10);
    }

    #[test]
    fn test_varint_decode() {
        let mut source = ByteSource::new(&[0xAC, 0x02, 0x00]);
        assert_eq!(source.read_varint().unwrap(), 300);
        assert_eq!(source.read_varint().unwrap(), 0);
        assert!(source.is_empty());
    }

    #[test]
    fn test_varint_u64_max() {
        let bytes = varint(u64::MAX);
        let mut source = ByteSource::new(&bytes);
        assert_eq!(source.read_varint().unwrap(), u64::MAX);
    }

    #[test]
    fn test_varint_overflow() {
        // 2^64 needs a 10th byte carrying 2
        let mut bytes = vec![0x80; 9];
        bytes.push(0x02);
        let mut source = ByteSource::new(&bytes);
        assert_eq!(
            source.read_varint(),
            Err(CodecError::VarintOverflow { position: 0 })
        );

        let bytes = [0xFF; 11];
        let mut source = ByteSource::new(&bytes);
        assert!(matches!(
            source.read_varint(),
            Err(CodecError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn test_varint_truncated() {
        let mut source = ByteSource::new(&[0x80, 0x80]);
        assert_eq!(
            source.read_varint(),
            Err(CodecError::BufferUnderflow {
                position: 2,
                needed: 1
            })
        );
    }

    #[test]
    fn test_next_byte_underflow() {
        let mut source = ByteSource::new(&[]);
        assert_eq!(
            source.next_byte(),
            Err(CodecError::BufferUnderflow {
                position: 0,
                needed: 1
            })
        );
    }

    #[test]
    fn test_read_bytes() {
        let data = [1, 2, 3, 4, 5];
        let mut source = ByteSource::new(&data);
        assert_eq!(source.read_bytes(2).unwrap(), &[1, 2]);
        assert_eq!(source.position(), 2);
        assert_eq!(source.remaining(), 3);

        let err = source.read_bytes(5).unwrap_err();
        assert_eq!(
            err,
            CodecError::BufferUnderflow {
                position: 2,
                needed: 2
            }
        );
        // Failed reads do not advance
        assert_eq!(source.position(), 2);
        assert_eq!(source.read_bytes(3).unwrap(), &[3, 4, 5]);
    }

    #[test]
    fn test_sink_finish_is_exact() {
        let mut sink = ByteSink::new();
        sink.append_byte(7);
        sink.append_bytes(b"abc");
        assert_eq!(sink.len(), 4);

        let bytes = sink.finish();
        assert_eq!(bytes.len(), 4);
        assert_eq!(&bytes[..], &[7, b'a', b'b', b'c']);
    }

    #[test]
    fn test_sink_finish_releases_spare_capacity() {
        let mut sink = ByteSink::new();
        sink.append_bytes(b"xy");
        let backing = sink.buf.as_ptr();
        let bytes = sink.finish();
        assert_eq!(&bytes[..], b"xy");
        assert_ne!(bytes.as_ptr(), backing);

        let mut sink = ByteSink::with_capacity(4);
        sink.append_bytes(&[1, 2, 3, 4]);
        assert_eq!(&sink.finish()[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_sink_growth() {
        let mut sink = ByteSink::with_capacity(4);
        assert!(sink.is_empty());
        sink.append_bytes(&[0; 4]);
        sink.append_byte(1);
        assert!(sink.capacity() >= 5 + GROWTH_SLACK);

        let mut sink = ByteSink::new();
        assert!(sink.capacity() >= INITIAL_CAPACITY);
        for i in 0..10_000u32 {
            sink.append_byte(i as u8);
        }
        assert_eq!(sink.len(), 10_000);
        assert_eq!(sink.finish().len(), 10_000);
    }

    #[test]
    fn test_read_length() {
        let mut source = ByteSource::new(&[0x05]);
        assert_eq!(source.read_length().unwrap(), 5);
    }
}
