//! Little-endian binary primitives for the cache format.
//!
//! The trailer of a cache file stores absolute byte offsets, so every layer
//! of the writer needs to know where the bytes it emits begin. This module
//! provides a byte sink that tracks the running stream position while
//! writing fixed-width little-endian values via [`byteorder`].

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

/// A forward-only byte sink that tracks the absolute stream position.
///
/// Wraps any [`Write`] implementation. The position starts at zero and
/// advances with every successful write; the underlying stream is never
/// rewound.
#[derive(Debug)]
pub struct PositionWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> PositionWriter<W> {
    /// Wrap a byte sink, starting the position counter at zero.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// The absolute offset of the next byte to be written.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Unwrap and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        WriteBytesExt::write_u8(self, value)
    }

    /// Write a 16-bit signed integer, little-endian.
    pub fn write_i16(&mut self, value: i16) -> io::Result<()> {
        WriteBytesExt::write_i16::<LittleEndian>(self, value)
    }

    /// Write a 16-bit unsigned integer, little-endian.
    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        WriteBytesExt::write_u16::<LittleEndian>(self, value)
    }

    /// Write a 32-bit signed integer, little-endian.
    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        WriteBytesExt::write_i32::<LittleEndian>(self, value)
    }

    /// Write a 64-bit signed integer, little-endian.
    pub fn write_i64(&mut self, value: i64) -> io::Result<()> {
        WriteBytesExt::write_i64::<LittleEndian>(self, value)
    }

    /// Write a 32-bit float, little-endian.
    pub fn write_f32(&mut self, value: f32) -> io::Result<()> {
        WriteBytesExt::write_f32::<LittleEndian>(self, value)
    }

    /// Write a 64-bit float, little-endian.
    pub fn write_f64(&mut self, value: f64) -> io::Result<()> {
        WriteBytesExt::write_f64::<LittleEndian>(self, value)
    }
}

impl<W: Write> Write for PositionWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
