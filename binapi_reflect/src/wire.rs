/* Big-endian cursors over byte buffers; every access is bounds-checked */

use crate::errors::{CodecError, CodecResult};

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

    fn window(&mut self, n: usize) -> CodecResult<&mut [u8]> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(CodecError::BufferTooSmall {
                required: self.pos + n,
                available: self.buf.len(),
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.buf[start..start + n])
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.window(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> CodecResult<()> {
        self.put_bytes(&[v])
    }

    pub fn put_u16(&mut self, v: u16) -> CodecResult<()> {
        self.put_bytes(&v.to_be_bytes())
    }

    pub fn put_u32(&mut self, v: u32) -> CodecResult<()> {
        self.put_bytes(&v.to_be_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> CodecResult<()> {
        self.put_bytes(&v.to_be_bytes())
    }

    pub fn put_f64(&mut self, v: f64) -> CodecResult<()> {
        self.put_bytes(&v.to_be_bytes())
    }

    /* Copy at most `len` bytes and zero-fill the rest of the window */
    pub fn put_fixed_string(&mut self, s: &str, len: usize) -> CodecResult<()> {
        let bytes = s.as_bytes();
        let n = bytes.len().min(len);
        let window = self.window(len)?;
        window[..n].copy_from_slice(&bytes[..n]);
        window[n..].fill(0);
        Ok(())
    }

    pub fn put_string(&mut self, s: &str) -> CodecResult<()> {
        self.put_u32(s.len() as u32)?;
        self.put_bytes(s.as_bytes())
    }
}

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

    pub fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(CodecError::ShortBuffer {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn get_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn get_u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub fn get_f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    /* Bytes before the first NUL of the window, or the whole window */
    pub fn get_fixed_string(&mut self, len: usize) -> CodecResult<String> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn get_string(&mut self) -> CodecResult<String> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
