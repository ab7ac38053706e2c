// sink.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Append-only output buffer
use std::io::{self, Write};

/// Default page size, in bytes
const PAGE_SZ: usize = 4096;

/// Append-only byte buffer, allocated in fixed-size pages
///
/// Writing never moves previously written bytes.
#[derive(Clone, Debug)]
pub struct OutputBuffer {
    /// Filled pages
    pages: Vec<Vec<u8>>,
    /// Page being filled
    page: Vec<u8>,
    /// Bytes per page
    page_sz: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_page_size(PAGE_SZ)
    }
}

impl OutputBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with a page size
    pub fn with_page_size(page_sz: usize) -> Self {
        let page_sz = page_sz.max(1);
        OutputBuffer {
            pages: Vec::new(),
            page: Vec::with_capacity(page_sz),
            page_sz,
        }
    }

    /// Append one byte
    pub fn write_byte(&mut self, b: u8) {
        if self.page.len() == self.page_sz {
            let full = std::mem::replace(
                &mut self.page,
                Vec::with_capacity(self.page_sz),
            );
            self.pages.push(full);
        }
        self.page.push(b);
    }

    /// Append a slice of bytes
    pub fn write_bytes(&mut self, buf: &[u8]) {
        let mut buf = buf;
        while !buf.is_empty() {
            if self.page.len() == self.page_sz {
                self.write_byte(buf[0]);
                buf = &buf[1..];
                continue;
            }
            let n = (self.page_sz - self.page.len()).min(buf.len());
            self.page.extend_from_slice(&buf[..n]);
            buf = &buf[n..];
        }
    }

    /// Get total number of bytes written
    pub fn len(&self) -> usize {
        self.pages.len() * self.page_sz + self.page.len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all written bytes as one contiguous vec
    pub fn data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.len());
        for page in &self.pages {
            data.extend_from_slice(page);
        }
        data.extend_from_slice(&self.page);
        data
    }

    /// Convert into contiguous bytes
    pub fn into_vec(self) -> Vec<u8> {
        if self.pages.is_empty() {
            return self.page;
        }
        self.data()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pages() {
        let mut buf = OutputBuffer::with_page_size(4);
        assert!(buf.is_empty());
        buf.write_byte(1);
        buf.write_bytes(&[2, 3, 4, 5, 6]);
        buf.write_bytes(&[]);
        buf.write_byte(7);
        buf.write_bytes(&[8, 9]);
        assert_eq!(buf.len(), 9);
        assert_eq!(buf.pages.len(), 2);
        assert_eq!(buf.data(), [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(buf.into_vec(), [1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn io_write() {
        let mut buf = OutputBuffer::new();
        write!(buf, "GIF89a").unwrap();
        buf.write_all(&[0x3B]).unwrap();
        assert_eq!(buf.into_vec(), b"GIF89a;");
    }
}
