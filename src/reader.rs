//! Verification reader for completed cache files.
//!
//! Opens a finished cache file, parses the fixed trailer from end-of-file,
//! loads the transition and group-header tables plus the label blob, and
//! reconstructs per-group point data. Point blocks carry no raw/compressed
//! marker: the reader recomputes the expected raw size from the group
//! header and treats the stored bytes as raw exactly when the sizes match.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::points::{expected_raw_len, MASS_ERROR_SCALE};
use crate::writer::{
    FLAG_EXTRACTED_BASE_PEAK, FLAG_HAS_FRAG_SCAN_IDS, FLAG_HAS_MASS_ERRORS,
    FLAG_HAS_MS1_SCAN_IDS, FLAG_HAS_SIM_SCAN_IDS, FORMAT_VERSION_CACHE,
};

/// Byte length of the fixed trailer, from the score-type count through the
/// file-table offset. The version field sits 52 bytes before end-of-file;
/// 28 bytes of score and label fields precede it.
const TRAILER_LEN: u64 = 80;

/// Errors that can occur while reading a cache file.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// I/O error on the underlying source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is too short to hold a cache trailer.
    #[error("file too short to hold a cache trailer")]
    Truncated,

    /// The trailer reports a format version this reader does not support.
    #[error("unsupported cache format version {0}")]
    UnsupportedVersion(i32),

    /// A group header references label bytes outside the label blob.
    #[error("label reference (index {index}, len {len}) outside the label blob")]
    LabelOutOfRange {
        /// Byte index into the label blob.
        index: i32,
        /// Byte length of the reference.
        len: u16,
    },

    /// A group index past the end of the group-header table.
    #[error("group index {0} out of range")]
    GroupIndexOutOfRange(usize),

    /// A group header references transitions outside the transition table.
    #[error("transition range {start}..{end} outside the transition table")]
    TransitionRangeOutOfBounds {
        /// First transition index referenced.
        start: usize,
        /// One past the last transition index referenced.
        end: usize,
    },

    /// A point block did not inflate to the size implied by its header.
    #[error("point block size mismatch: expected {expected} bytes, got {actual}")]
    BlockSizeMismatch {
        /// Raw size implied by the group header.
        expected: usize,
        /// Actual size after inflation.
        actual: usize,
    },
}

/// One decoded transition record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEntry {
    /// Target product m/z.
    pub product_mz: f64,
    /// Extraction window width.
    pub extraction_width: f32,
    /// Drift-time center, zero when absent.
    pub ion_mobility_value: f32,
    /// Drift-time window width, zero when absent.
    pub ion_mobility_extraction_width: f32,
    /// The 2-bit source-scope code (MS1=1, MS2=2, SIM=3).
    pub source_flags: u16,
}

/// One decoded group header.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// Resolved label, when the group has one.
    pub label: Option<String>,
    /// Index of the group's first transition in the transition table.
    pub start_transition_index: usize,
    /// Number of points in the group's block.
    pub num_points: usize,
    /// Stored byte length of the point block.
    pub compressed_size: usize,
    /// Flag bitmask as stored.
    pub flags: u16,
    /// Number of transitions in the group.
    pub num_transitions: usize,
    /// Precursor m/z.
    pub precursor_mz: f64,
    /// Absolute byte offset of the point block.
    pub location_points: u64,
}

impl GroupEntry {
    /// Whether the point block carries mass errors.
    pub fn has_mass_errors(&self) -> bool {
        self.flags & FLAG_HAS_MASS_ERRORS != 0
    }

    /// Whether the point block carries scan ids of any flavor.
    pub fn has_scan_ids(&self) -> bool {
        self.flags & (FLAG_HAS_MS1_SCAN_IDS | FLAG_HAS_SIM_SCAN_IDS | FLAG_HAS_FRAG_SCAN_IDS) != 0
    }

    /// Whether intensities were extracted via base peak.
    pub fn extracted_base_peak(&self) -> bool {
        self.flags & FLAG_EXTRACTED_BASE_PEAK != 0
    }
}

/// Reconstructed point data for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupData {
    /// Retention times, one per point.
    pub times: Vec<f32>,
    /// Intensities, one trace per transition, each parallel to `times`.
    pub intensities: Vec<Vec<f32>>,
    /// Relative mass errors decoded from fixed point, when present.
    pub mass_errors: Option<Vec<Vec<f64>>>,
    /// Scan identifiers, when present.
    pub scan_ids: Option<Vec<i32>>,
}

/// Random-access reader over a completed cache file.
#[derive(Debug)]
pub struct CacheReader<R: Read + Seek> {
    source: R,
    transitions: Vec<TransitionEntry>,
    groups: Vec<GroupEntry>,
}

impl<R: Read + Seek> CacheReader<R> {
    /// Open a completed cache file: parse the trailer, the index tables and
    /// the label blob.
    pub fn open(mut source: R) -> Result<Self, ReaderError> {
        let file_len = source.seek(SeekFrom::End(0))?;
        if file_len < TRAILER_LEN {
            return Err(ReaderError::Truncated);
        }
        source.seek(SeekFrom::Start(file_len - TRAILER_LEN))?;

        let _score_type_count = source.read_i32::<LittleEndian>()?;
        let _score_count = source.read_i32::<LittleEndian>()?;
        let _scores_location = source.read_i64::<LittleEndian>()?;
        let labels_len = source.read_i32::<LittleEndian>()?;
        let labels_location = source.read_i64::<LittleEndian>()?;
        let version = source.read_i32::<LittleEndian>()?;
        if version != FORMAT_VERSION_CACHE {
            return Err(ReaderError::UnsupportedVersion(version));
        }
        let _peak_count = source.read_i32::<LittleEndian>()?;
        let _peaks_location = source.read_i64::<LittleEndian>()?;
        let transition_count = source.read_i32::<LittleEndian>()?;
        let transition_location = source.read_i64::<LittleEndian>()?;
        let group_count = source.read_i32::<LittleEndian>()?;
        let group_headers_location = source.read_i64::<LittleEndian>()?;
        let _file_count = source.read_i32::<LittleEndian>()?;
        let _files_location = source.read_i64::<LittleEndian>()?;

        source.seek(SeekFrom::Start(transition_location as u64))?;
        let mut transitions = Vec::with_capacity(transition_count as usize);
        for _ in 0..transition_count {
            let product_mz = source.read_f64::<LittleEndian>()?;
            let extraction_width = source.read_f32::<LittleEndian>()?;
            let ion_mobility_value = source.read_f32::<LittleEndian>()?;
            let ion_mobility_extraction_width = source.read_f32::<LittleEndian>()?;
            let source_flags = source.read_u16::<LittleEndian>()?;
            let _reserved = source.read_u16::<LittleEndian>()?;
            transitions.push(TransitionEntry {
                product_mz,
                extraction_width,
                ion_mobility_value,
                ion_mobility_extraction_width,
                source_flags,
            });
        }

        source.seek(SeekFrom::Start(group_headers_location as u64))?;
        let mut raw_groups = Vec::with_capacity(group_count as usize);
        for _ in 0..group_count {
            let label_index = source.read_i32::<LittleEndian>()?;
            let start_transition_index = source.read_i32::<LittleEndian>()?;
            let _start_peak_index = source.read_i32::<LittleEndian>()?;
            let _start_score_index = source.read_i32::<LittleEndian>()?;
            let num_points = source.read_i32::<LittleEndian>()?;
            let compressed_size = source.read_i32::<LittleEndian>()?;
            let flags = source.read_u16::<LittleEndian>()?;
            let _file_index = source.read_u16::<LittleEndian>()?;
            let label_len = source.read_u16::<LittleEndian>()?;
            let num_transitions = source.read_u16::<LittleEndian>()?;
            let _num_peaks = source.read_u8()?;
            let _max_peak_index = source.read_u8()?;
            let _reserved = source.read_u16::<LittleEndian>()?;
            let _status_id = source.read_u16::<LittleEndian>()?;
            let _status_rank = source.read_u16::<LittleEndian>()?;
            let precursor_mz = source.read_f64::<LittleEndian>()?;
            let location_points = source.read_i64::<LittleEndian>()?;
            raw_groups.push((
                label_index,
                label_len,
                GroupEntry {
                    label: None,
                    start_transition_index: start_transition_index as usize,
                    num_points: num_points as usize,
                    compressed_size: compressed_size as usize,
                    flags,
                    num_transitions: num_transitions as usize,
                    precursor_mz,
                    location_points: location_points as u64,
                },
            ));
        }

        source.seek(SeekFrom::Start(labels_location as u64))?;
        let mut label_blob = vec![0u8; labels_len as usize];
        source.read_exact(&mut label_blob)?;

        let mut groups = Vec::with_capacity(raw_groups.len());
        for (label_index, label_len, mut entry) in raw_groups {
            if label_index >= 0 {
                let start = label_index as usize;
                let end = start + label_len as usize;
                let bytes = label_blob.get(start..end).ok_or(ReaderError::LabelOutOfRange {
                    index: label_index,
                    len: label_len,
                })?;
                entry.label = Some(String::from_utf8_lossy(bytes).into_owned());
            }
            groups.push(entry);
        }

        Ok(Self {
            source,
            transitions,
            groups,
        })
    }

    /// The decoded transition table.
    pub fn transitions(&self) -> &[TransitionEntry] {
        &self.transitions
    }

    /// The decoded group headers, in file order.
    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    /// Number of chromatogram groups in the file.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The transition entries belonging to one group.
    pub fn group_transitions(&self, index: usize) -> Result<&[TransitionEntry], ReaderError> {
        let entry = self
            .groups
            .get(index)
            .ok_or(ReaderError::GroupIndexOutOfRange(index))?;
        let start = entry.start_transition_index;
        let end = start + entry.num_transitions;
        self.transitions
            .get(start..end)
            .ok_or(ReaderError::TransitionRangeOutOfBounds { start, end })
    }

    /// Read and decode one group's point block.
    pub fn read_group_points(&mut self, index: usize) -> Result<GroupData, ReaderError> {
        let entry = self
            .groups
            .get(index)
            .cloned()
            .ok_or(ReaderError::GroupIndexOutOfRange(index))?;

        let expected = expected_raw_len(
            entry.num_points,
            entry.num_transitions,
            entry.has_mass_errors(),
            entry.has_scan_ids(),
        );

        self.source.seek(SeekFrom::Start(entry.location_points))?;
        let mut stored = vec![0u8; entry.compressed_size];
        self.source.read_exact(&mut stored)?;

        // Equal sizes mean the block was stored raw; anything smaller must
        // inflate to exactly the expected size.
        let raw = if stored.len() == expected {
            stored
        } else {
            let mut inflated = Vec::with_capacity(expected);
            ZlibDecoder::new(&stored[..]).read_to_end(&mut inflated)?;
            inflated
        };
        if raw.len() != expected {
            return Err(ReaderError::BlockSizeMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let mut cursor = Cursor::new(raw);
        let mut times = Vec::with_capacity(entry.num_points);
        for _ in 0..entry.num_points {
            times.push(cursor.read_f32::<LittleEndian>()?);
        }
        let mut intensities = Vec::with_capacity(entry.num_transitions);
        for _ in 0..entry.num_transitions {
            let mut trace = Vec::with_capacity(entry.num_points);
            for _ in 0..entry.num_points {
                trace.push(cursor.read_f32::<LittleEndian>()?);
            }
            intensities.push(trace);
        }
        let mass_errors = if entry.has_mass_errors() {
            let mut traces = Vec::with_capacity(entry.num_transitions);
            for _ in 0..entry.num_transitions {
                let mut trace = Vec::with_capacity(entry.num_points);
                for _ in 0..entry.num_points {
                    let fixed = cursor.read_i16::<LittleEndian>()?;
                    trace.push(f64::from(fixed) / MASS_ERROR_SCALE);
                }
                traces.push(trace);
            }
            Some(traces)
        } else {
            None
        };
        let scan_ids = if entry.has_scan_ids() {
            let mut ids = Vec::with_capacity(entry.num_points);
            for _ in 0..entry.num_points {
                ids.push(cursor.read_i32::<LittleEndian>()?);
            }
            Some(ids)
        } else {
            None
        };

        Ok(GroupData {
            times,
            intensities,
            mass_errors,
            scan_ids,
        })
    }
}
