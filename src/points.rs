//! The group point accumulator and block codec.
//!
//! A [`GroupPoints`] buffer collects per-scan samples for one chromatogram
//! group across all its transitions, then serializes them into one packed
//! byte block. The block layout is, in order and all little-endian:
//!
//! 1. One f32 per retention time, in scan order.
//! 2. For each transition, one f32 per scan's intensity (transition-major).
//! 3. If the group requests mass errors: for each transition, one i16 per
//!    scan, the relative mass error in fixed point at 1e7 scale.
//! 4. If the scans carried identifiers: one i32 per scan.
//!
//! The block is zlib-compressed at best level; raw bytes are kept when
//! compression does not strictly shrink them. The on-disk format carries no
//! discriminator: a reader recomputes the expected raw size from the group
//! header and compares it against the stored size (equal means raw).

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::extract::ExtractedPoint;

/// Fixed-point scale applied to relative mass errors before they are stored
/// as 16-bit integers.
pub const MASS_ERROR_SCALE: f64 = 1e7;

/// Errors raised while accumulating or packing group point data.
#[derive(Debug, thiserror::Error)]
pub enum PointsError {
    /// A scan produced a different number of samples than the group has
    /// transitions.
    #[error("expected {expected} samples for scan, got {actual}")]
    SampleCountMismatch {
        /// Number of transitions in the group.
        expected: usize,
        /// Number of samples the scan produced.
        actual: usize,
    },

    /// Some accepted scans carried a scan identifier and some did not.
    #[error("scan id presence is inconsistent within a chromatogram group")]
    InconsistentScanIds,

    /// A relative mass error does not fit the 16-bit fixed-point encoding.
    #[error("relative mass error {value} exceeds the 16-bit fixed-point range")]
    MassErrorOverflow {
        /// The offending relative mass error.
        value: f64,
    },

    /// I/O error while packing the block.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A packed point block ready for the cache body.
///
/// Internally the raw/compressed choice is explicit; on disk only the bytes
/// and their stored length survive, and readers recover the choice by
/// comparing the stored length against the expected raw length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointBlock {
    /// Serialized bytes stored as-is.
    Raw(Vec<u8>),
    /// zlib-compressed bytes, strictly smaller than the raw serialization.
    Compressed {
        /// The compressed bytes as stored in the file.
        bytes: Vec<u8>,
        /// Length of the raw serialization, for size accounting.
        raw_len: usize,
    },
}

impl PointBlock {
    /// The bytes as they are stored in the cache body.
    pub fn bytes(&self) -> &[u8] {
        match self {
            PointBlock::Raw(bytes) => bytes,
            PointBlock::Compressed { bytes, .. } => bytes,
        }
    }

    /// The stored length, recorded as `compressed_size` in the group header.
    pub fn stored_len(&self) -> usize {
        self.bytes().len()
    }
}

/// Expected raw (uncompressed) block size for a group's point data.
///
/// This is the size a reader must recompute to decide whether stored bytes
/// are raw or compressed.
pub fn expected_raw_len(
    point_count: usize,
    transition_count: usize,
    has_mass_errors: bool,
    has_scan_ids: bool,
) -> usize {
    let mut len = point_count * 4 + transition_count * point_count * 4;
    if has_mass_errors {
        len += transition_count * point_count * 2;
    }
    if has_scan_ids {
        len += point_count * 4;
    }
    len
}

/// Accumulates per-scan samples for one chromatogram group.
///
/// Created empty when a group begins processing, mutated once per accepted
/// scan via [`GroupPoints::push_scan`], consumed exactly once by
/// [`GroupPoints::pack`]. Every per-transition list stays parallel to the
/// retention-time list, and scan-id presence must be uniform across all
/// accepted scans.
#[derive(Debug, Clone)]
pub struct GroupPoints {
    times: Vec<f32>,
    scan_ids: Vec<i32>,
    intensities: Vec<Vec<f32>>,
    /// Relative mass errors at full precision; fixed-point conversion
    /// happens at serialization time.
    mass_errors: Option<Vec<Vec<f64>>>,
}

impl GroupPoints {
    /// Create an empty buffer for a group with `transition_count`
    /// transitions, optionally collecting mass errors.
    pub fn new(transition_count: usize, with_mass_errors: bool) -> Self {
        Self {
            times: Vec::new(),
            scan_ids: Vec::new(),
            intensities: vec![Vec::new(); transition_count],
            mass_errors: with_mass_errors.then(|| vec![Vec::new(); transition_count]),
        }
    }

    /// Number of accepted scans buffered so far.
    pub fn point_count(&self) -> usize {
        self.times.len()
    }

    /// Number of transitions this buffer was created for.
    pub fn transition_count(&self) -> usize {
        self.intensities.len()
    }

    /// Whether this buffer collects relative mass errors.
    pub fn has_mass_errors(&self) -> bool {
        self.mass_errors.is_some()
    }

    /// Whether the accepted scans carried scan identifiers.
    pub fn has_scan_ids(&self) -> bool {
        !self.scan_ids.is_empty()
    }

    /// Append one accepted scan's samples.
    ///
    /// `samples` must hold exactly one entry per transition, in transition
    /// order. Scan-id presence must match every previously pushed scan.
    pub fn push_scan(
        &mut self,
        retention_time: f64,
        scan_id: Option<i32>,
        samples: &[ExtractedPoint],
    ) -> Result<(), PointsError> {
        if samples.len() != self.transition_count() {
            return Err(PointsError::SampleCountMismatch {
                expected: self.transition_count(),
                actual: samples.len(),
            });
        }
        if self.point_count() > 0 && scan_id.is_some() != self.has_scan_ids() {
            return Err(PointsError::InconsistentScanIds);
        }

        self.times.push(retention_time as f32);
        if let Some(id) = scan_id {
            self.scan_ids.push(id);
        }
        for (trace, sample) in self.intensities.iter_mut().zip(samples) {
            trace.push(sample.intensity as f32);
        }
        if let Some(mass_errors) = &mut self.mass_errors {
            for (trace, sample) in mass_errors.iter_mut().zip(samples) {
                trace.push(sample.mass_error);
            }
        }
        Ok(())
    }

    /// The raw serialized size of this buffer, in bytes.
    pub fn raw_len(&self) -> usize {
        expected_raw_len(
            self.point_count(),
            self.transition_count(),
            self.has_mass_errors(),
            self.has_scan_ids(),
        )
    }

    /// Serialize the buffer into the packed little-endian block layout.
    ///
    /// An empty buffer serializes to zero bytes. A relative mass error whose
    /// fixed-point form does not fit `i16` is an error, not a wrap or a
    /// saturation.
    pub fn serialize(&self) -> Result<Vec<u8>, PointsError> {
        let mut buf = Vec::with_capacity(self.raw_len());
        if self.times.is_empty() {
            return Ok(buf);
        }

        for &time in &self.times {
            buf.write_f32::<LittleEndian>(time)?;
        }
        for trace in &self.intensities {
            for &intensity in trace {
                buf.write_f32::<LittleEndian>(intensity)?;
            }
        }
        if let Some(mass_errors) = &self.mass_errors {
            for trace in mass_errors {
                for &mass_error in trace {
                    let scaled = (mass_error * MASS_ERROR_SCALE).round();
                    if scaled < f64::from(i16::MIN) || scaled > f64::from(i16::MAX) {
                        return Err(PointsError::MassErrorOverflow { value: mass_error });
                    }
                    buf.write_i16::<LittleEndian>(scaled as i16)?;
                }
            }
        }
        for &scan_id in &self.scan_ids {
            buf.write_i32::<LittleEndian>(scan_id)?;
        }
        Ok(buf)
    }

    /// Serialize and compress the buffer, consuming it.
    ///
    /// Compression is zlib at best level, mirroring the upstream deflater
    /// settings. The compressed form is kept only when strictly smaller
    /// than the raw serialization.
    pub fn pack(self) -> Result<PointBlock, PointsError> {
        let raw = self.serialize()?;
        if raw.is_empty() {
            return Ok(PointBlock::Raw(raw));
        }
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len()), Compression::best());
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;
        if compressed.len() < raw.len() {
            Ok(PointBlock::Compressed {
                bytes: compressed,
                raw_len: raw.len(),
            })
        } else {
            Ok(PointBlock::Raw(raw))
        }
    }
}
