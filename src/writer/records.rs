//! Fixed-size on-disk index records.
//!
//! Transition records and group headers are buffered in memory while point
//! blocks stream out, then written as flat arrays ahead of the trailer.

use std::io::{self, Write};

use crate::binary::PositionWriter;
use crate::request::ChromSource;

/// On-disk size of one transition record, in bytes.
pub const TRANSITION_RECORD_SIZE: u64 = 24;

/// On-disk size of one group header record, in bytes.
pub const GROUP_HEADER_SIZE: u64 = 56;

/// Group header flag: the point block carries mass errors.
pub const FLAG_HAS_MASS_ERRORS: u16 = 0x01;
/// Group header flag: product m/z values are calculated. Always set by this
/// writer.
pub const FLAG_HAS_CALCULATED_MZS: u16 = 0x02;
/// Group header flag: intensities were extracted via base peak.
pub const FLAG_EXTRACTED_BASE_PEAK: u16 = 0x04;
/// Group header flag: the point block carries MS1 scan ids.
pub const FLAG_HAS_MS1_SCAN_IDS: u16 = 0x08;
/// Group header flag: the point block carries SIM scan ids.
pub const FLAG_HAS_SIM_SCAN_IDS: u16 = 0x10;
/// Group header flag: the point block carries MS2 (fragment) scan ids.
pub const FLAG_HAS_FRAG_SCAN_IDS: u16 = 0x20;

/// One transition's index entry: 24 bytes on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    /// Target product m/z.
    pub product_mz: f64,
    /// Extraction window width.
    pub extraction_width: f32,
    /// Drift-time center, zero when the group has none.
    pub ion_mobility_value: f32,
    /// Drift-time window width, zero when the group has none.
    pub ion_mobility_extraction_width: f32,
    /// Which scans the transition draws from.
    pub source: ChromSource,
}

impl TransitionRecord {
    /// Write the fixed 24-byte layout.
    pub fn write<W: Write>(&self, sink: &mut PositionWriter<W>) -> io::Result<()> {
        sink.write_f64(self.product_mz)?;
        sink.write_f32(self.extraction_width)?;
        sink.write_f32(self.ion_mobility_value)?;
        sink.write_f32(self.ion_mobility_extraction_width)?;
        sink.write_u16(self.source.flag_bits())?;
        sink.write_u16(0)?; // reserved
        Ok(())
    }
}

/// One chromatogram group's index entry: 56 bytes on disk.
///
/// Peak and score fields are structurally present for format compatibility
/// but always zero; this writer produces no peaks or scores.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHeaderRecord {
    /// Byte index of the group's label in the label blob, or -1 when the
    /// group has no label.
    pub label_index: i32,
    /// Index of the group's first transition in the transition table.
    pub start_transition_index: i32,
    /// Number of points (accepted scans) in the group's block.
    pub num_points: i32,
    /// Stored byte length of the point block (compressed or raw).
    pub compressed_size: i32,
    /// Flag bitmask, see the `FLAG_*` constants.
    pub flags: u16,
    /// Byte length of the group's label, zero when unlabeled.
    pub label_len: u16,
    /// Number of transitions in the group.
    pub num_transitions: u16,
    /// Precursor m/z.
    pub precursor_mz: f64,
    /// Absolute byte offset of the group's point block.
    pub location_points: u64,
}

impl GroupHeaderRecord {
    /// Write the fixed 56-byte layout.
    pub fn write<W: Write>(&self, sink: &mut PositionWriter<W>) -> io::Result<()> {
        sink.write_i32(self.label_index)?;
        sink.write_i32(self.start_transition_index)?;
        sink.write_i32(0)?; // start peak index
        sink.write_i32(0)?; // start score index
        sink.write_i32(self.num_points)?;
        sink.write_i32(self.compressed_size)?;
        sink.write_u16(self.flags)?;
        sink.write_u16(0)?; // file index
        sink.write_u16(self.label_len)?;
        sink.write_u16(self.num_transitions)?;
        sink.write_u8(0)?; // peak count
        sink.write_u8(0)?; // max peak index
        sink.write_u16(0)?; // reserved
        sink.write_u16(0)?; // status id
        sink.write_u16(0)?; // status rank
        sink.write_f64(self.precursor_mz)?;
        sink.write_i64(self.location_points as i64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_record_size() {
        let mut sink = PositionWriter::new(Vec::new());
        TransitionRecord {
            product_mz: 421.75,
            extraction_width: 0.05,
            ion_mobility_value: 0.0,
            ion_mobility_extraction_width: 0.0,
            source: ChromSource::Ms2,
        }
        .write(&mut sink)
        .unwrap();
        assert_eq!(sink.position(), TRANSITION_RECORD_SIZE);

        let bytes = sink.into_inner();
        assert_eq!(&bytes[0..8], &421.75f64.to_le_bytes());
        // Source flag sits at offset 20.
        assert_eq!(&bytes[20..22], &0x0002u16.to_le_bytes());
        assert_eq!(&bytes[22..24], &[0, 0]);
    }

    #[test]
    fn test_group_header_size_and_layout() {
        let mut sink = PositionWriter::new(Vec::new());
        GroupHeaderRecord {
            label_index: 16,
            start_transition_index: 3,
            num_points: 12,
            compressed_size: 99,
            flags: FLAG_HAS_CALCULATED_MZS | FLAG_HAS_MASS_ERRORS,
            label_len: 8,
            num_transitions: 2,
            precursor_mz: 712.25,
            location_points: 4096,
        }
        .write(&mut sink)
        .unwrap();
        assert_eq!(sink.position(), GROUP_HEADER_SIZE);

        let bytes = sink.into_inner();
        assert_eq!(&bytes[0..4], &16i32.to_le_bytes());
        // Peak and score indexes are always zero.
        assert_eq!(&bytes[8..16], &[0u8; 8]);
        assert_eq!(&bytes[16..20], &12i32.to_le_bytes());
        assert_eq!(&bytes[24..26], &0x0003u16.to_le_bytes());
        assert_eq!(&bytes[40..48], &712.25f64.to_le_bytes());
        assert_eq!(&bytes[48..56], &4096i64.to_le_bytes());
    }
}
