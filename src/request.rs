//! The chromatogram-group request model.
//!
//! Requests arrive from a host application as already-parsed documents (the
//! upstream schema is XML-bound, but this crate only requires the shape).
//! A [`ChromatogramGroup`] names a precursor, its extraction constraints and
//! an ordered list of transitions; it is immutable for the lifetime of one
//! cache-write operation.

use serde::{Deserialize, Serialize};

/// How intensity is reduced over an extraction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromExtractor {
    /// Integrate intensity over the window.
    #[default]
    Summed,
    /// Report the single highest intensity in the window.
    BasePeak,
}

/// Which scans a chromatogram group draws its signal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromSource {
    /// MS1 survey scans.
    Ms1,
    /// MS2 fragment scans.
    Ms2,
    /// Selected ion monitoring scans.
    ///
    /// Note: the scan dispatch in [`crate::group`] has no case that maps an
    /// MS level to `Sim`, so groups with this source never match any scan.
    /// This mirrors the upstream implementation and is kept for file
    /// compatibility; see DESIGN.md.
    Sim,
}

impl ChromSource {
    /// The 2-bit source code stored in transition records.
    pub fn flag_bits(self) -> u16 {
        match self {
            ChromSource::Ms1 => 0x01,
            ChromSource::Ms2 => 0x02,
            ChromSource::Sim => 0x03,
        }
    }
}

/// One transition: a target product m/z and its extraction window width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Target product m/z. A value of zero extracts the whole spectrum.
    pub product_mz: f64,
    /// Full width of the extraction window, centered on `product_mz`.
    pub mz_window: f64,
}

/// A set of transitions sharing a precursor and extraction constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromatogramGroup {
    /// Precursor m/z, recorded in the group header.
    pub precursor_mz: f64,
    /// Optional peptide/molecule label, stored deduplicated in the cache.
    pub label: Option<String>,
    /// Extraction mode applied to every transition in the group.
    pub extractor: ChromExtractor,
    /// Which scans this group draws from.
    pub source: ChromSource,
    /// Lower retention-time bound; open when unset.
    pub min_time: Option<f64>,
    /// Upper retention-time bound; open when unset.
    pub max_time: Option<f64>,
    /// Drift-time center. Filtering applies only when both this and
    /// `drift_time_window` are set and the scan reports a drift time.
    pub drift_time: Option<f64>,
    /// Full width of the drift-time window, centered on `drift_time`.
    pub drift_time_window: Option<f64>,
    /// Whether extracted points carry relative mass errors.
    pub mass_errors: bool,
    /// Ordered list of transitions to extract.
    pub transitions: Vec<TransitionRequest>,
}

impl ChromatogramGroup {
    /// Create a group with no label, no time or drift constraints, no mass
    /// errors and no transitions.
    pub fn new(precursor_mz: f64, extractor: ChromExtractor, source: ChromSource) -> Self {
        Self {
            precursor_mz,
            label: None,
            extractor,
            source,
            min_time: None,
            max_time: None,
            drift_time: None,
            drift_time_window: None,
            mass_errors: false,
            transitions: Vec::new(),
        }
    }

    /// Set the peptide/molecule label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the retention-time bounds. Either side may stay open.
    pub fn with_time_range(mut self, min_time: Option<f64>, max_time: Option<f64>) -> Self {
        self.min_time = min_time;
        self.max_time = max_time;
        self
    }

    /// Set the drift-time center and full window width.
    pub fn with_drift_time(mut self, center: f64, window: f64) -> Self {
        self.drift_time = Some(center);
        self.drift_time_window = Some(window);
        self
    }

    /// Enable or disable mass-error reporting for this group.
    pub fn with_mass_errors(mut self, mass_errors: bool) -> Self {
        self.mass_errors = mass_errors;
        self
    }

    /// Append one transition.
    pub fn with_transition(mut self, product_mz: f64, mz_window: f64) -> Self {
        self.transitions.push(TransitionRequest {
            product_mz,
            mz_window,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let group = ChromatogramGroup::new(623.3, ChromExtractor::BasePeak, ChromSource::Ms1)
            .with_label("LVNELTEFAK")
            .with_time_range(Some(10.0), None)
            .with_drift_time(4.2, 0.5)
            .with_mass_errors(true)
            .with_transition(623.3, 0.05)
            .with_transition(624.3, 0.05);

        assert_eq!(group.label.as_deref(), Some("LVNELTEFAK"));
        assert_eq!(group.min_time, Some(10.0));
        assert_eq!(group.max_time, None);
        assert_eq!(group.drift_time, Some(4.2));
        assert!(group.mass_errors);
        assert_eq!(group.transitions.len(), 2);
    }

    #[test]
    fn test_source_flag_bits() {
        assert_eq!(ChromSource::Ms1.flag_bits(), 0x01);
        assert_eq!(ChromSource::Ms2.flag_bits(), 0x02);
        assert_eq!(ChromSource::Sim.flag_bits(), 0x03);
    }
}
