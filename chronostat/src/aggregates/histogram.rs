//! Per-offset histogram of calibration samples.

use serde_json::{json, Value};
use tracing::instrument;

use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
use crate::aggregates::dict;
use crate::config::HistogramSpec;
use crate::errors::{ChronostatError, Result};
use crate::samples::SampleBlock;
use crate::SCHEMA_VERSION;

/// A bin-count matrix over many cycles of a (quasi) periodic signal.
///
/// Each within-cycle offset gets its own 1-D histogram over a fixed value
/// range, so comparing columns shows how much the signal varies at each
/// offset across the whole timespan considered. The range, bin count, and
/// bitrate are immutable after construction and form the compatibility key
/// for union.
///
/// A histogram carries no time information; coverage bookkeeping belongs to
/// the containing [`crate::report::Report`].
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    range: (f64, f64),
    num_bins: usize,
    bitrate: usize,
    /// Row-major `num_bins x bitrate` counts.
    counts: Vec<i64>,
    version: String,
}

impl Histogram {
    /// Creates an empty histogram with all-zero counts.
    pub fn new(spec: &HistogramSpec, bitrate: usize) -> Result<Self> {
        if spec.range.0 >= spec.range.1 {
            return Err(ChronostatError::invalid_data(
                "histogram range min must be less than max",
            ));
        }
        if spec.num_bins == 0 || bitrate == 0 {
            return Err(ChronostatError::invalid_data(
                "histogram needs at least one bin and one offset",
            ));
        }
        Ok(Self {
            range: spec.range,
            num_bins: spec.num_bins,
            bitrate,
            counts: vec![0; spec.num_bins * bitrate],
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Bins every sample of a block into its offset's histogram.
    ///
    /// The block's column count must equal `bitrate`. Samples outside the
    /// configured range are dropped; a sample exactly on the upper bound
    /// lands in the last bin.
    #[instrument(skip(block), fields(rows = block.rows(), bitrate))]
    pub fn from_samples(block: &SampleBlock, spec: &HistogramSpec, bitrate: usize) -> Result<Self> {
        if block.cols() != bitrate {
            return Err(ChronostatError::invalid_data(format!(
                "sample block width {} does not match bitrate {bitrate}",
                block.cols()
            )));
        }
        let mut hist = Self::new(spec, bitrate)?;
        let (min, max) = hist.range;
        let width = max - min;
        for row in block.iter_rows() {
            for (offset, &value) in row.iter().enumerate() {
                if !(min..=max).contains(&value) {
                    continue;
                }
                let mut bin = ((value - min) / width * hist.num_bins as f64) as usize;
                if bin == hist.num_bins {
                    bin = hist.num_bins - 1;
                }
                hist.counts[bin * bitrate + offset] += 1;
            }
        }
        Ok(hist)
    }

    /// The binned value range.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Number of bins per offset.
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Number of within-cycle offsets.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// Schema version carried by this histogram.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the count for one bin at one offset.
    pub fn count(&self, bin: usize, offset: usize) -> i64 {
        self.counts[bin * self.bitrate + offset]
    }

    /// Total number of binned samples.
    pub fn total_count(&self) -> i64 {
        self.counts.iter().sum()
    }

    /// The binning configuration of this histogram.
    pub fn spec(&self) -> HistogramSpec {
        HistogramSpec {
            range: self.range,
            num_bins: self.num_bins,
        }
    }
}

impl SelfConsistent for Histogram {
    fn self_consistent(&self) -> Result<()> {
        if self.range.0 >= self.range.1 {
            return Err(ChronostatError::inconsistent(
                "histogram range min must be less than max",
            ));
        }
        if self.counts.len() != self.num_bins * self.bitrate {
            return Err(ChronostatError::inconsistent(format!(
                "histogram count matrix has {} entries, expected {}x{}",
                self.counts.len(),
                self.num_bins,
                self.bitrate
            )));
        }
        if self.counts.iter().any(|&c| c < 0) {
            return Err(ChronostatError::inconsistent(
                "histogram contains a negative bin count",
            ));
        }
        if self.version != SCHEMA_VERSION {
            return Err(ChronostatError::version_mismatch(
                SCHEMA_VERSION,
                &self.version,
            ));
        }
        Ok(())
    }
}

impl Unionable for Histogram {
    fn compatible_with(&self, other: &Self) -> Result<()> {
        if self.range != other.range || self.num_bins != other.num_bins {
            return Err(ChronostatError::incompatible(
                "histograms have different bin edges",
            ));
        }
        if self.bitrate != other.bitrate {
            return Err(ChronostatError::incompatible(
                "histograms have different bitrates",
            ));
        }
        if self.version != other.version {
            return Err(ChronostatError::version_mismatch(
                &self.version,
                &other.version,
            ));
        }
        Ok(())
    }

    fn combine(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        for (ours, theirs) in merged.counts.iter_mut().zip(&other.counts) {
            *ours += theirs;
        }
        Ok(merged)
    }
}

impl DictSerializable for Histogram {
    const CLASS_TAG: &'static str = "Histogram";

    fn to_dict(&self) -> Value {
        json!({
            "class": Self::CLASS_TAG,
            "version": self.version,
            "range": [self.range.0, self.range.1],
            "num_bins": self.num_bins as i64,
            "bitrate": self.bitrate as i64,
            "counts": dict::i64_array(&self.counts),
        })
    }

    fn from_dict(d: &Value) -> Result<Self> {
        dict::expect_class_tag(d, Self::CLASS_TAG)?;
        dict::expect_current_version(d)?;
        let range = dict::get_f64_array(d, "range")?;
        if range.len() != 2 {
            return Err(ChronostatError::serialization(
                "histogram range must have exactly two entries",
            ));
        }
        let num_bins = dict::get_i64(d, "num_bins")?;
        let bitrate = dict::get_i64(d, "bitrate")?;
        if num_bins <= 0 || bitrate <= 0 {
            return Err(ChronostatError::serialization(
                "histogram num_bins and bitrate must be positive",
            ));
        }
        let spec = HistogramSpec {
            range: (range[0], range[1]),
            num_bins: num_bins as usize,
        };
        let mut hist = Self::new(&spec, bitrate as usize)?;
        let counts = dict::get_i64_array(d, "counts")?;
        if counts.len() != hist.counts.len() {
            return Err(ChronostatError::serialization(
                "histogram count matrix has the wrong shape",
            ));
        }
        hist.counts = counts;
        hist.self_consistent()?;
        Ok(hist)
    }
}
