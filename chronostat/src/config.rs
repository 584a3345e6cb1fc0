//! Configuration for frame alignment and report construction.
//!
//! The frame alignment unit and the histogram binning parameters are policy,
//! not algebra: recordings happen to be organized into 64-second frame files
//! and calibration channels happen to sample at 16384 offsets per cycle, but
//! none of the aggregation logic depends on those particular values. They are
//! therefore carried in explicit configuration structs rather than hard-coded
//! constants.

use serde::{Deserialize, Serialize};

/// Default number of within-cycle sample offsets tracked per report.
pub const DEFAULT_BITRATE: usize = 16384;

/// Alignment policy for the frame files underlying raw recordings.
///
/// Frame files always start at times that are integer multiples of the unit,
/// so interval sets that describe loadable data must have endpoints on these
/// boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Size of one frame file in time units.
    pub unit: f64,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self { unit: 64.0 }
    }
}

impl FrameSpec {
    /// Sets the frame file size in time units.
    pub fn with_unit(mut self, unit: f64) -> Self {
        self.unit = unit;
        self
    }
}

/// Binning configuration for [`crate::aggregates::Histogram`].
///
/// The range and bin count are fixed at construction time and act as the
/// compatibility key for union: histograms with different bin edges cannot
/// be merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    /// Inclusive lower and upper bounds of the binned value range.
    pub range: (f64, f64),
    /// Number of equal-width bins between the range bounds.
    pub num_bins: usize,
}

impl Default for HistogramSpec {
    fn default() -> Self {
        Self {
            range: (-1e3, 1e3),
            num_bins: 256,
        }
    }
}

impl HistogramSpec {
    /// Sets the binned value range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }

    /// Sets the number of bins.
    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }
}

/// Full configuration for building reports from raw sample blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of within-cycle sample offsets per report.
    pub bitrate: usize,
    /// Histogram binning parameters.
    pub histogram: HistogramSpec,
    /// Frame alignment policy.
    pub frame: FrameSpec,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            histogram: HistogramSpec::default(),
            frame: FrameSpec::default(),
        }
    }
}

impl ReportConfig {
    /// Sets the bitrate.
    pub fn with_bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Sets the histogram binning parameters.
    pub fn with_histogram(mut self, histogram: HistogramSpec) -> Self {
        self.histogram = histogram;
        self
    }

    /// Sets the frame alignment policy.
    pub fn with_frame(mut self, frame: FrameSpec) -> Self {
        self.frame = frame;
        self
    }
}
