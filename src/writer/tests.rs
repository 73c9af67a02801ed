use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian};

use crate::extract::ExtractedPoint;
use crate::points::GroupPoints;
use crate::request::{ChromExtractor, ChromSource, ChromatogramGroup};
use crate::writer::{write_cache_file, CacheWriter, FORMAT_VERSION_CACHE};

fn version_at_minus_52(bytes: &[u8]) -> i32 {
    let at = bytes.len() - 52;
    LittleEndian::read_i32(&bytes[at..at + 4])
}

fn filled_points(group: &ChromatogramGroup, scans: usize, with_ids: bool) -> GroupPoints {
    let mut points = GroupPoints::new(group.transitions.len(), group.mass_errors);
    for i in 0..scans {
        let samples: Vec<ExtractedPoint> = group
            .transitions
            .iter()
            .enumerate()
            .map(|(t, _)| ExtractedPoint {
                intensity: (t + 1) as f64 * 100.0 + i as f64,
                mass_error: 1e-6 * (i as f64 - 1.0),
            })
            .collect();
        points
            .push_scan(i as f64 * 0.5, with_ids.then(|| i as i32), &samples)
            .unwrap();
    }
    points
}

#[test]
fn test_empty_file_layout() {
    let writer = CacheWriter::new(Cursor::new(Vec::new()));
    let bytes = writer.finish_into_inner().unwrap().into_inner();

    // One 36-byte file entry plus the 80-byte trailer.
    assert_eq!(bytes.len(), 116);
    assert_eq!(version_at_minus_52(&bytes), FORMAT_VERSION_CACHE);

    // Transition and group counts are zero, file count is one.
    let tail = &bytes[bytes.len() - 48..];
    assert_eq!(LittleEndian::read_i32(&tail[0..4]), 0); // peak count
    assert_eq!(LittleEndian::read_i64(&tail[4..12]), 0); // peaks location
    assert_eq!(LittleEndian::read_i32(&tail[12..16]), 0); // transitions
    assert_eq!(LittleEndian::read_i32(&tail[24..28]), 0); // group headers
    assert_eq!(LittleEndian::read_i32(&tail[36..40]), 1); // file count
}

#[test]
fn test_version_marker_position() {
    let group = ChromatogramGroup::new(500.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_label("ELVISK")
        .with_mass_errors(true)
        .with_transition(250.0, 0.1)
        .with_transition(300.0, 0.1);
    let points = filled_points(&group, 3, true);

    let mut writer = CacheWriter::new(Cursor::new(Vec::new()));
    writer.write_group(&group, points).unwrap();
    let bytes = writer.finish_into_inner().unwrap().into_inner();

    assert_eq!(version_at_minus_52(&bytes), FORMAT_VERSION_CACHE);
}

#[test]
fn test_block_offsets_and_table_locations() {
    let group = ChromatogramGroup::new(500.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_transition(250.0, 0.1);
    let points = filled_points(&group, 2, false);
    let block_len = points.raw_len(); // raw: 2*4 + 2*4 = 16

    let mut writer = CacheWriter::new(Cursor::new(Vec::new()));
    writer.write_group(&group, points).unwrap();
    let bytes = writer.finish_into_inner().unwrap().into_inner();

    let tail = &bytes[bytes.len() - 80..];
    let transition_location = LittleEndian::read_i64(&tail[48..56]);
    let group_headers_location = LittleEndian::read_i64(&tail[60..68]);
    let files_location = LittleEndian::read_i64(&tail[72..80]);

    // A 16-byte block cannot shrink under zlib, so it is stored raw and the
    // transition table starts right after it.
    assert_eq!(transition_location as usize, block_len);
    assert_eq!(group_headers_location, transition_location + 24);
    assert_eq!(files_location, group_headers_location + 56);
}

#[test]
fn test_label_deduplication() {
    let group_a = ChromatogramGroup::new(500.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_label("PEPTIDEK")
        .with_transition(250.0, 0.1);
    let group_b = ChromatogramGroup::new(600.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_label("PEPTIDEK")
        .with_transition(350.0, 0.1);
    let group_c = ChromatogramGroup::new(700.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_transition(450.0, 0.1);

    let mut writer = CacheWriter::new(Cursor::new(Vec::new()));
    for group in [&group_a, &group_b, &group_c] {
        let points = filled_points(group, 1, false);
        writer.write_group(group, points).unwrap();
    }
    let stats = writer.finish().unwrap();

    assert_eq!(stats.groups_written, 3);
    assert_eq!(stats.labels_stored, 1);
}

#[test]
fn test_write_cache_file_counts() {
    let group = ChromatogramGroup::new(500.0, ChromExtractor::BasePeak, ChromSource::Ms1)
        .with_transition(500.0, 0.05)
        .with_transition(501.0, 0.05);
    let points = filled_points(&group, 4, true);

    let stats = write_cache_file([(&group, points)], Cursor::new(Vec::new())).unwrap();
    assert_eq!(stats.groups_written, 1);
    assert_eq!(stats.transitions_written, 2);
    assert_eq!(stats.points_written, 4);
}

#[test]
fn test_empty_group_block() {
    // A group with no accepted scans still gets a header; its block is
    // zero bytes.
    let group = ChromatogramGroup::new(500.0, ChromExtractor::Summed, ChromSource::Ms2)
        .with_transition(250.0, 0.1);
    let points = GroupPoints::new(1, false);

    let mut writer = CacheWriter::new(Cursor::new(Vec::new()));
    writer.write_group(&group, points).unwrap();
    let stats = writer.finish().unwrap();
    assert_eq!(stats.groups_written, 1);
    assert_eq!(stats.points_written, 0);
}
