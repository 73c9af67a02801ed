use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::binary::PositionWriter;
use crate::points::GroupPoints;
use crate::request::{ChromExtractor, ChromSource, ChromatogramGroup};
use crate::writer::error::CacheWriteError;
use crate::writer::records::{
    GroupHeaderRecord, TransitionRecord, FLAG_EXTRACTED_BASE_PEAK, FLAG_HAS_CALCULATED_MZS,
    FLAG_HAS_FRAG_SCAN_IDS, FLAG_HAS_MASS_ERRORS, FLAG_HAS_MS1_SCAN_IDS, FLAG_HAS_SIM_SCAN_IDS,
};
use crate::writer::stats::CacheWriterStats;

/// Cache format version. Every cache file stores it exactly 52 bytes before
/// end-of-file; every trailer field after it is fixed-width.
pub const FORMAT_VERSION_CACHE: i32 = 8;

/// Streaming writer for the binary chromatogram cache format.
///
/// Point blocks are written as groups arrive, strictly append-only; the
/// transition table, group-header table, label blob, file table and trailer
/// are written by [`CacheWriter::finish`]. The writer is single-use and
/// single-threaded: one instance owns its output exclusively, and `finish`
/// consumes it, so no write can follow the trailer.
pub struct CacheWriter<W: Write> {
    sink: PositionWriter<W>,
    transitions: Vec<TransitionRecord>,
    group_headers: Vec<GroupHeaderRecord>,
    label_bytes: Vec<u8>,
    label_indexes: HashMap<String, i32>,
    points_written: usize,
}

impl<W: Write> CacheWriter<W> {
    /// Create a writer over any byte sink. The sink must be positioned at
    /// the start of the (empty) output.
    pub fn new(inner: W) -> Self {
        Self {
            sink: PositionWriter::new(inner),
            transitions: Vec::new(),
            group_headers: Vec::new(),
            label_bytes: Vec::new(),
            label_indexes: HashMap::new(),
            points_written: 0,
        }
    }

    /// Write one group's point block and record its index entries.
    ///
    /// The block's byte offset is captured before writing; the group's
    /// transition records and header go into in-memory tables that
    /// [`CacheWriter::finish`] emits.
    pub fn write_group(
        &mut self,
        group: &ChromatogramGroup,
        points: GroupPoints,
    ) -> Result<(), CacheWriteError> {
        let (label_index, label_len) = self.intern_label(group.label.as_deref());
        let location_points = self.sink.position();
        let num_points = points.point_count();

        let mut flags = FLAG_HAS_CALCULATED_MZS;
        if points.has_mass_errors() {
            flags |= FLAG_HAS_MASS_ERRORS;
        }
        if group.extractor == ChromExtractor::BasePeak {
            flags |= FLAG_EXTRACTED_BASE_PEAK;
        }
        if points.has_scan_ids() {
            flags |= match group.source {
                ChromSource::Ms1 => FLAG_HAS_MS1_SCAN_IDS,
                ChromSource::Sim => FLAG_HAS_SIM_SCAN_IDS,
                ChromSource::Ms2 => FLAG_HAS_FRAG_SCAN_IDS,
            };
        }

        let block = points.pack()?;
        let header = GroupHeaderRecord {
            label_index,
            start_transition_index: self.transitions.len() as i32,
            num_points: num_points as i32,
            compressed_size: block.stored_len() as i32,
            flags,
            label_len,
            num_transitions: group.transitions.len() as u16,
            precursor_mz: group.precursor_mz,
            location_points,
        };

        for transition in &group.transitions {
            self.transitions.push(TransitionRecord {
                product_mz: transition.product_mz,
                extraction_width: transition.mz_window as f32,
                ion_mobility_value: group.drift_time.map(|v| v as f32).unwrap_or(0.0),
                ion_mobility_extraction_width: group
                    .drift_time_window
                    .map(|v| v as f32)
                    .unwrap_or(0.0),
                source: group.source,
            });
        }

        self.sink.write_all(block.bytes())?;
        self.group_headers.push(header);
        self.points_written += num_points;
        debug!(
            "wrote group at precursor {:.4}: {} points, {} stored bytes at offset {}",
            group.precursor_mz,
            num_points,
            block.stored_len(),
            location_points
        );
        Ok(())
    }

    /// Write the index tables and the fixed trailer, completing the file.
    ///
    /// Consuming the writer makes this callable exactly once.
    pub fn finish(self) -> Result<CacheWriterStats, CacheWriteError> {
        let (stats, _) = self.finalize()?;
        Ok(stats)
    }

    /// Like [`CacheWriter::finish`], but returns the underlying sink (for
    /// buffer extraction).
    pub fn finish_into_inner(self) -> Result<W, CacheWriteError> {
        let (_, inner) = self.finalize()?;
        Ok(inner)
    }

    fn finalize(mut self) -> Result<(CacheWriterStats, W), CacheWriteError> {
        let transition_location = self.sink.position();
        for transition in &self.transitions {
            transition.write(&mut self.sink)?;
        }
        let group_headers_location = self.sink.position();
        for header in &self.group_headers {
            header.write(&mut self.sink)?;
        }
        let labels_location = self.sink.position();
        self.sink.write_all(&self.label_bytes)?;

        // The single cached-file entry. Modified time, run start time, file
        // name, instrument info and the per-file extremes are all
        // placeholders in this writer.
        let files_location = self.sink.position();
        self.sink.write_i64(0)?; // modified time
        self.sink.write_i32(0)?; // file name length
        self.sink.write_i64(0)?; // run start time
        self.sink.write_i32(0)?; // instrument info length
        self.sink.write_i32(0)?; // flags
        self.sink.write_i32(0)?; // max retention time
        self.sink.write_i32(0)?; // max intensity

        // Fixed trailer. Readers locate it from end-of-file: the version
        // field below starts exactly 52 bytes before EOF.
        self.sink.write_i32(0)?; // score type count
        self.sink.write_i32(0)?; // score count
        self.sink.write_i64(0)?; // scores location
        self.sink.write_i32(self.label_bytes.len() as i32)?;
        self.sink.write_i64(labels_location as i64)?;
        self.sink.write_i32(FORMAT_VERSION_CACHE)?;
        self.sink.write_i32(0)?; // peak count
        self.sink.write_i64(0)?; // peaks location
        self.sink.write_i32(self.transitions.len() as i32)?;
        self.sink.write_i64(transition_location as i64)?;
        self.sink.write_i32(self.group_headers.len() as i32)?;
        self.sink.write_i64(group_headers_location as i64)?;
        self.sink.write_i32(1)?; // file count
        self.sink.write_i64(files_location as i64)?;
        self.sink.flush()?;

        let stats = CacheWriterStats {
            groups_written: self.group_headers.len(),
            transitions_written: self.transitions.len(),
            points_written: self.points_written,
            labels_stored: self.label_indexes.len(),
            file_size_bytes: self.sink.position(),
        };
        info!("{}", stats);
        Ok((stats, self.sink.into_inner()))
    }

    /// Look up or append a label in the writer-local dictionary, returning
    /// its (byte index, byte length) reference. Unlabeled groups get index
    /// -1 and length 0.
    fn intern_label(&mut self, label: Option<&str>) -> (i32, u16) {
        match label {
            None => (-1, 0),
            Some(label) => {
                let len = label.len() as u16;
                if let Some(&index) = self.label_indexes.get(label) {
                    (index, len)
                } else {
                    let index = self.label_bytes.len() as i32;
                    self.label_bytes.extend_from_slice(label.as_bytes());
                    self.label_indexes.insert(label.to_owned(), index);
                    (index, len)
                }
            }
        }
    }
}

/// Write one complete cache file from pre-extracted group point buffers.
///
/// Groups are written in iteration order; the trailer is emitted when the
/// iterator is exhausted.
pub fn write_cache_file<'a, W, I>(groups: I, out: W) -> Result<CacheWriterStats, CacheWriteError>
where
    W: Write,
    I: IntoIterator<Item = (&'a ChromatogramGroup, GroupPoints)>,
{
    let mut writer = CacheWriter::new(out);
    for (group, points) in groups {
        writer.write_group(group, points)?;
    }
    writer.finish()
}
