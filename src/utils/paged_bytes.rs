//! Append-only paged byte arena.
//!
//! Bytes are appended into fixed-size pages while building, then frozen into
//! an immutable store that any number of readers can decode concurrently.
//! Values may straddle page boundaries.

use crate::error::{Error, Result};
use crate::utils::{encode_vint, encode_vlong};

const MAX_PAGE_BITS: u32 = 18;
const MIN_PAGE_BITS: u32 = 4;

/// Choose a page size for roughly `estimated_size` bytes of content.
pub fn estimate_page_bits(estimated_size: u64) -> u32 {
    let bits = 64 - estimated_size.leading_zeros();
    bits.clamp(MIN_PAGE_BITS, MAX_PAGE_BITS)
}

/// Builder side of the arena.
#[derive(Debug)]
pub struct PagedBytesWriter {
    page_bits: u32,
    page_size: usize,
    pages: Vec<Box<[u8]>>,
    current: Vec<u8>,
    scratch: Vec<u8>,
}

impl PagedBytesWriter {
    pub fn new(page_bits: u32) -> Self {
        let page_bits = page_bits.clamp(MIN_PAGE_BITS, MAX_PAGE_BITS);
        let page_size = 1usize << page_bits;
        Self {
            page_bits,
            page_size,
            pages: Vec::new(),
            current: Vec::with_capacity(page_size),
            scratch: Vec::with_capacity(10),
        }
    }

    /// Absolute offset of the next byte to be written.
    pub fn position(&self) -> u64 {
        (self.pages.len() * self.page_size + self.current.len()) as u64
    }

    pub fn write_byte(&mut self, b: u8) {
        if self.current.len() == self.page_size {
            self.finish_page();
        }
        self.current.push(b);
    }

    pub fn write_bytes(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.current.len() == self.page_size {
                self.finish_page();
            }
            let room = self.page_size - self.current.len();
            let n = room.min(bytes.len());
            self.current.extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
        }
    }

    pub fn write_vint(&mut self, value: i32) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        encode_vint(value, &mut scratch);
        self.write_bytes(&scratch);
        self.scratch = scratch;
    }

    pub fn write_vlong(&mut self, value: i64) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        encode_vlong(value, &mut scratch);
        self.write_bytes(&scratch);
        self.scratch = scratch;
    }

    fn finish_page(&mut self) {
        let full = std::mem::replace(&mut self.current, Vec::with_capacity(self.page_size));
        self.pages.push(full.into_boxed_slice());
    }

    /// Stop writing. The last page is trimmed to its content.
    pub fn freeze(mut self) -> PagedBytes {
        let len = self.position();
        if !self.current.is_empty() {
            let last = std::mem::take(&mut self.current);
            self.pages.push(last.into_boxed_slice());
        }
        PagedBytes {
            page_bits: self.page_bits,
            page_mask: (1u64 << self.page_bits) - 1,
            pages: self.pages,
            len,
        }
    }
}

/// Frozen, read-only arena.
#[derive(Debug)]
pub struct PagedBytes {
    page_bits: u32,
    page_mask: u64,
    pages: Vec<Box<[u8]>>,
    len: u64,
}

impl PagedBytes {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.pages.iter().map(|p| p.len()).sum::<usize>()
            + self.pages.len() * std::mem::size_of::<Box<[u8]>>()
    }

    /// A cursor positioned at `pos`.
    pub fn reader_at(&self, pos: u64) -> PagedBytesReader<'_> {
        PagedBytesReader { bytes: self, pos }
    }
}

/// Decoding cursor over a [`PagedBytes`].
#[derive(Debug, Clone)]
pub struct PagedBytesReader<'a> {
    bytes: &'a PagedBytes,
    pos: u64,
}

impl PagedBytesReader<'_> {
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn set_position(&mut self, pos: u64) {
        self.pos = pos;
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.bytes.len {
            return Err(Error::eof("paged bytes"));
        }
        let page = (self.pos >> self.bytes.page_bits) as usize;
        let offset = (self.pos & self.bytes.page_mask) as usize;
        self.pos += 1;
        Ok(self.bytes.pages[page][offset])
    }

    /// Replace the content of `out` with the next `len` bytes.
    pub fn read_bytes_into(&mut self, len: usize, out: &mut Vec<u8>) -> Result<()> {
        if self.pos + len as u64 > self.bytes.len {
            return Err(Error::eof("paged bytes"));
        }
        out.clear();
        out.reserve(len);
        let mut remaining = len;
        while remaining > 0 {
            let page = (self.pos >> self.bytes.page_bits) as usize;
            let offset = (self.pos & self.bytes.page_mask) as usize;
            let src = &self.bytes.pages[page][offset..];
            let n = src.len().min(remaining);
            out.extend_from_slice(&src[..n]);
            self.pos += n as u64;
            remaining -= n;
        }
        Ok(())
    }

    pub fn read_vint(&mut self) -> Result<i32> {
        let mut result: u32 = 0;
        let mut shift = 0;
        loop {
            if shift >= 32 {
                return Err(Error::corrupt("paged bytes", "invalid vInt"));
            }
            let b = self.read_byte()?;
            result |= ((b & 0x7F) as u32) << shift;
            if b & 0x80 == 0 {
                return Ok(result as i32);
            }
            shift += 7;
        }
    }

    pub fn read_vlong(&mut self) -> Result<i64> {
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            if shift >= 64 {
                return Err(Error::corrupt("paged bytes", "invalid vLong"));
            }
            let b = self.read_byte()?;
            result |= ((b & 0x7F) as u64) << shift;
            if b & 0x80 == 0 {
                return Ok(result as i64);
            }
            shift += 7;
        }
    }
}
