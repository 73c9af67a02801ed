//! # chromcache - Chromatogram Extraction and Binary Cache Format
//!
//! `chromcache` extracts chromatogram intensity traces from mass-spectrometry
//! scan data and persists them into a compact, random-access binary cache
//! file (format version 8).
//!
//! ## Key Features
//!
//! - **Windowed point extraction**: turns a raw scan (ascending m/z array +
//!   parallel intensity array) into one intensity/mass-error sample per
//!   transition, either summed over the extraction window or reduced to the
//!   base peak, with an online intensity-weighted mass-error estimate that
//!   needs only a single pass over the window.
//!
//! - **Streaming cache writer**: point blocks are written as they are
//!   produced, strictly append-only; per-group and per-transition index
//!   records accumulate in memory and land in a fixed-layout trailer at the
//!   end of the file, so readers can seek from end-of-file.
//!
//! - **Transparent compression**: each point block is zlib-compressed at
//!   best level, but raw bytes are kept whenever compression does not
//!   strictly shrink the block. The format carries no per-block marker;
//!   readers compare the stored size against the size implied by the group
//!   header.
//!
//! - **Deduplicated labels**: peptide/molecule labels are stored once in a
//!   shared byte blob and referenced by (index, length) pairs.
//!
//! ## Quick Start
//!
//! ```rust
//! use chromcache::prelude::*;
//! use std::io::Cursor;
//!
//! // Describe what to extract: one MS2 group with two transitions.
//! let group = ChromatogramGroup::new(500.5, ChromExtractor::Summed, ChromSource::Ms2)
//!     .with_label("PEPTIDER")
//!     .with_mass_errors(true)
//!     .with_transition(250.25, 0.1)
//!     .with_transition(350.35, 0.1);
//!
//! // A scan as produced by any upstream spectrum source.
//! let scan = Scan {
//!     retention_time: Some(12.5),
//!     drift_time: None,
//!     ms_level: 2,
//!     scan_id: Some(42),
//!     mzs: vec![250.24, 250.26, 350.33],
//!     intensities: vec![1200.0, 800.0, 450.0],
//! };
//!
//! // Filter, extract, pack, compress and write in one pass.
//! let stats = generate_cache(&[group], &[scan], Cursor::new(Vec::new()))?;
//! assert_eq!(stats.groups_written, 1);
//! # Ok::<(), chromcache::writer::CacheWriteError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`binary`]: position-tracking little-endian byte sink
//! - [`request`]: the chromatogram-group request model
//! - [`scan`]: the upstream scan shape consumed by the pipeline
//! - [`extract`]: windowed per-transition point extraction
//! - [`group`]: scan filtering and per-group extraction
//! - [`points`]: the group point accumulator and block codec
//! - [`writer`]: the streaming cache writer and trailer layout
//! - [`reader`]: a verification reader for completed cache files
//! - [`pipeline`]: end-to-end driver tying the above together
//!
//! ## Format Invariants
//!
//! - All integers and floats are little-endian.
//! - Transition records are 24 bytes, group headers 56 bytes.
//! - The 4-byte format-version field (constant 8) starts exactly 52 bytes
//!   before end-of-file; every trailer field after it is fixed-width.
//! - This writer never produces peak or score data; those counts and
//!   offsets are always zero.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod binary;
pub mod extract;
pub mod group;
pub mod pipeline;
pub mod points;
pub mod reader;
pub mod request;
pub mod scan;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::extract::{extract_point, ExtractedPoint, MeanErrorAccumulator};
    pub use crate::group::{process_group, scan_matches_group};
    pub use crate::pipeline::generate_cache;
    pub use crate::points::{GroupPoints, PointBlock, PointsError, MASS_ERROR_SCALE};
    pub use crate::reader::{CacheReader, GroupData, ReaderError};
    pub use crate::request::{ChromExtractor, ChromSource, ChromatogramGroup, TransitionRequest};
    pub use crate::scan::Scan;
    pub use crate::writer::{
        write_cache_file, CacheWriteError, CacheWriter, CacheWriterStats, FORMAT_VERSION_CACHE,
    };
}
