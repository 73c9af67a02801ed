//! # Cache Writer Module
//!
//! Streaming writer for the binary chromatogram cache format.
//!
//! ## Design Principles
//!
//! 1. **Append-only streaming**: point blocks go out as groups are
//!    processed; once a block's byte range is written it is never
//!    rewritten. Only forward writes and position queries are used, so the
//!    output needs no seek support.
//!
//! 2. **Index-at-the-end**: transition records, group headers and the label
//!    blob accumulate in memory and are emitted by `finish()`, followed by
//!    a fixed-width trailer holding their absolute offsets. Readers find
//!    everything by seeking from end-of-file.
//!
//! 3. **Single-use writer**: `finish()` consumes the writer, so a completed
//!    file can never be appended to.

mod error;
mod records;
mod stats;
mod writer_impl;

#[cfg(test)]
mod tests;

pub use error::CacheWriteError;
pub use records::{
    GroupHeaderRecord, TransitionRecord, FLAG_EXTRACTED_BASE_PEAK, FLAG_HAS_CALCULATED_MZS,
    FLAG_HAS_FRAG_SCAN_IDS, FLAG_HAS_MASS_ERRORS, FLAG_HAS_MS1_SCAN_IDS, FLAG_HAS_SIM_SCAN_IDS,
    GROUP_HEADER_SIZE, TRANSITION_RECORD_SIZE,
};
pub use stats::CacheWriterStats;
pub use writer_impl::{write_cache_file, CacheWriter, FORMAT_VERSION_CACHE};
