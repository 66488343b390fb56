//! Positioned little-endian reads.
//!
//! Every read seeks to an absolute offset first, so no caller depends on
//! the current stream position. Reads past end of file surface as
//! [`BtsError::Truncated`].

use crate::error::{BtsError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Random-access reader over a seekable byte source.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read + Seek> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Total length of the underlying source in bytes.
    pub fn len(&mut self) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read a little-endian 32-bit signed integer at `offset`.
    pub fn read_i32_at(&mut self, offset: u64) -> Result<i32> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| map_eof(e, offset, 4))
    }

    /// Read a little-endian 32-bit IEEE float at `offset`.
    pub fn read_f32_at(&mut self, offset: u64) -> Result<f32> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner
            .read_f32::<LittleEndian>()
            .map_err(|e| map_eof(e, offset, 4))
    }

    /// Read a single byte at `offset`.
    pub fn read_u8_at(&mut self, offset: u64) -> Result<u8> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_u8().map_err(|e| map_eof(e, offset, 1))
    }

    /// Read `len` raw bytes at `offset`.
    pub fn read_bytes_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| map_eof(e, offset, len))?;
        Ok(buf)
    }

    /// Read a fixed-length single-byte string at `offset`, trimmed of
    /// trailing spaces and nulls (and leading spaces).
    pub fn read_string_at(&mut self, offset: u64, len: usize) -> Result<String> {
        let bytes = self.read_bytes_at(offset, len)?;
        Ok(decode_fixed_string(&bytes))
    }
}

/// Each byte is one character; no multi-byte decoding.
pub fn decode_fixed_string(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    text.trim_end_matches(|c: char| c == ' ' || c == '\0')
        .trim_start()
        .to_string()
}

fn map_eof(e: std::io::Error, offset: u64, wanted: usize) -> BtsError {
    if e.kind() == ErrorKind::UnexpectedEof {
        BtsError::Truncated { offset, wanted }
    } else {
        BtsError::Io(e)
    }
}
