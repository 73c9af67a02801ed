//! The upstream scan shape consumed by the extraction pipeline.
//!
//! This crate does not parse any spectral data format; any source that can
//! produce this shape (an mzML reader, a vendor API, synthetic data in
//! tests) can feed the pipeline.

/// One scan from an external spectrum source.
///
/// `mzs` must be ascending and `intensities` must have the same length;
/// both are required by the windowed extraction in [`crate::extract`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    /// Retention time, in the unit the requests use. Scans without one are
    /// skipped by every group.
    pub retention_time: Option<f64>,
    /// Drift time, when the instrument reports ion mobility.
    pub drift_time: Option<f64>,
    /// MS level (1 for survey scans, 2 for fragment scans).
    pub ms_level: i32,
    /// Native scan identifier. Within one group, either every accepted scan
    /// carries one or none does.
    pub scan_id: Option<i32>,
    /// m/z values, ascending.
    pub mzs: Vec<f64>,
    /// Intensity values, parallel to `mzs`.
    pub intensities: Vec<f64>,
}

impl Scan {
    /// Create a scan from its m/z and intensity arrays.
    pub fn new(ms_level: i32, mzs: Vec<f64>, intensities: Vec<f64>) -> Self {
        debug_assert_eq!(mzs.len(), intensities.len());
        Self {
            ms_level,
            mzs,
            intensities,
            ..Self::default()
        }
    }

    /// Set the retention time.
    pub fn with_retention_time(mut self, retention_time: f64) -> Self {
        self.retention_time = Some(retention_time);
        self
    }

    /// Set the drift time.
    pub fn with_drift_time(mut self, drift_time: f64) -> Self {
        self.drift_time = Some(drift_time);
        self
    }

    /// Set the native scan identifier.
    pub fn with_scan_id(mut self, scan_id: i32) -> Self {
        self.scan_id = Some(scan_id);
        self
    }
}
