use crate::points::PointsError;

/// Errors that can occur while writing a cache file.
///
/// Nothing here is retryable: any failure aborts the whole single-pass
/// write, and the partially written output must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum CacheWriteError {
    /// I/O error on the underlying byte sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Contract violation or packing failure in the group point data.
    #[error("point data error: {0}")]
    Points(#[from] PointsError),
}
