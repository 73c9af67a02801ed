use std::fmt;

/// Statistics from a completed cache write operation.
#[derive(Debug, Clone)]
pub struct CacheWriterStats {
    /// Number of chromatogram groups written.
    pub groups_written: usize,
    /// Total number of transition records written.
    pub transitions_written: usize,
    /// Total number of points across all groups.
    pub points_written: usize,
    /// Number of distinct labels stored in the label blob.
    pub labels_stored: usize,
    /// Final file size in bytes.
    pub file_size_bytes: u64,
}

impl fmt::Display for CacheWriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} groups ({} transitions, {} points) in {} bytes",
            self.groups_written, self.transitions_written, self.points_written, self.file_size_bytes
        )
    }
}
