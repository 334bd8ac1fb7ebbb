// Code generated by binapi-gen. DO NOT EDIT.
//
// Runtime support shared by the generated binary API modules: message
// metadata, error types and big-endian buffer cursors.

use std::fmt;

/// Role of a message in the request/reply/event convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Request,
    Reply,
    Event,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall { required: usize, available: usize },
    /// An array holds more elements than its count field can express.
    CountOverflow { field: &'static str, count: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::BufferTooSmall { required, available } => write!(
                f,
                "buffer too small: need {} bytes, have {}",
                required, available
            ),
            EncodeError::CountOverflow { field, count } => {
                write!(f, "count field {} cannot hold {} elements", field, count)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    ShortBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::ShortBuffer {
                offset,
                needed,
                available,
            } => write!(
                f,
                "short buffer at offset {}: need {} bytes, have {}",
                offset, needed, available
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Size, encode and decode contract implemented by every generated message.
pub trait Message: Sized {
    const NAME: &'static str;
    const CRC: &'static str;

    fn message_type(&self) -> MessageType;

    /// Exact number of bytes `marshal` produces.
    fn size(&self) -> usize;

    /// Encode into `buf`, which must hold at least `size()` bytes.
    fn marshal_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError>;

    fn marshal(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; self.size()];
        self.marshal_into(&mut buf)?;
        Ok(buf)
    }

    fn unmarshal(buf: &[u8]) -> Result<Self, DecodeError>;

    fn reset(&mut self)
    where
        Self: Default,
    {
        *self = Self::default();
    }
}

/// Big-endian writer over a buffer already checked against `Message::size`.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Writer { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn put_u8(&mut self, v: u8) {
        self.put_bytes(&[v]);
    }

    pub fn put_i8(&mut self, v: i8) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_u16(&mut self, v: u16) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_i16(&mut self, v: i16) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.put_bytes(&v.to_be_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u8(v as u8);
    }

    /// Copy at most `len` bytes and zero-fill the rest of the window.
    pub fn put_fixed_string(&mut self, s: &str, len: usize) {
        let bytes = s.as_bytes();
        let n = bytes.len().min(len);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.buf[self.pos + n..self.pos + len].fill(0);
        self.pos += len;
    }

    /// u32 length prefix followed by the bytes.
    pub fn put_string(&mut self, s: &str) {
        self.put_u32(s.len() as u32);
        self.put_bytes(s.as_bytes());
    }
}

/// Bounds-checked big-endian reader.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if n > available {
            return Err(DecodeError::ShortBuffer {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_into(&mut self, out: &mut [u8]) -> Result<(), DecodeError> {
        out.copy_from_slice(self.take(out.len())?);
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_be_bytes(self.array()?))
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn get_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn get_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    pub fn get_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.get_u8()? != 0)
    }

    /// Bytes before the first NUL of a `len`-byte window, or all of them.
    pub fn get_fixed_string(&mut self, len: usize) -> Result<String, DecodeError> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn get_string(&mut self) -> Result<String, DecodeError> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
