//! End-to-end extraction pipeline: scans in, cache file out.
//!
//! Each group is fully processed (filtered, extracted, packed, compressed,
//! written) before the next begins; the pipeline is single-threaded and
//! synchronous, and any failure aborts the whole write.

use std::io::Write;

use log::info;

use crate::group::process_group;
use crate::request::ChromatogramGroup;
use crate::scan::Scan;
use crate::writer::{CacheWriteError, CacheWriter, CacheWriterStats};

/// Extract every group from the scan set and write one complete cache file.
///
/// Groups are processed and written in request order. Scans rejected by a
/// group's filters are skipped silently; a contract violation (sample-count
/// mismatch, mixed scan-id presence) or any I/O failure aborts the write,
/// leaving the output truncated and invalid.
pub fn generate_cache<W: Write>(
    groups: &[ChromatogramGroup],
    scans: &[Scan],
    out: W,
) -> Result<CacheWriterStats, CacheWriteError> {
    info!(
        "extracting {} chromatogram groups from {} scans",
        groups.len(),
        scans.len()
    );
    let mut writer = CacheWriter::new(out);
    for group in groups {
        let points = process_group(group, scans)?;
        writer.write_group(group, points)?;
    }
    writer.finish()
}
