//! Per-offset running statistics of calibration samples.

use serde_json::{json, Value};
use tracing::instrument;

use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
use crate::aggregates::dict;
use crate::errors::{ChronostatError, Result};
use crate::samples::SampleBlock;
use crate::SCHEMA_VERSION;

/// Sum, sum-of-squares, and extrema accumulators per within-cycle offset.
///
/// The accumulators let mean and variance be computed over an arbitrary union
/// of recording windows without keeping raw samples. An empty instance uses
/// neutral elements (zero sums and counts, `f64::MIN`/`f64::MAX` extrema
/// seeds) so that unioning it into anything is a no-op.
///
/// Statistics carry no time information; coverage bookkeeping belongs to the
/// containing [`crate::report::Report`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    bitrate: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    max: Vec<f64>,
    min: Vec<f64>,
    count: i64,
    version: String,
}

impl Statistics {
    /// Creates an empty statistics block.
    pub fn new(bitrate: usize) -> Result<Self> {
        if bitrate == 0 {
            return Err(ChronostatError::invalid_data(
                "statistics need at least one offset",
            ));
        }
        Ok(Self {
            bitrate,
            sum: vec![0.0; bitrate],
            sum_sq: vec![0.0; bitrate],
            max: vec![f64::MIN; bitrate],
            min: vec![f64::MAX; bitrate],
            count: 0,
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Reduces a sample block column-wise into fresh accumulators.
    ///
    /// The block's column count must equal `bitrate`.
    #[instrument(skip(block), fields(rows = block.rows(), bitrate))]
    pub fn from_samples(block: &SampleBlock, bitrate: usize) -> Result<Self> {
        if block.cols() != bitrate {
            return Err(ChronostatError::invalid_data(format!(
                "sample block width {} does not match bitrate {bitrate}",
                block.cols()
            )));
        }
        let mut stats = Self::new(bitrate)?;
        for row in block.iter_rows() {
            for (offset, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ChronostatError::invalid_data(format!(
                        "sample at offset {offset} is not finite"
                    )));
                }
                stats.sum[offset] += value;
                stats.sum_sq[offset] += value * value;
                stats.max[offset] = stats.max[offset].max(value);
                stats.min[offset] = stats.min[offset].min(value);
            }
        }
        stats.count = block.rows() as i64;
        Ok(stats)
    }

    /// Number of within-cycle offsets.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// Schema version carried by this block.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Per-offset running sums.
    pub fn sum(&self) -> &[f64] {
        &self.sum
    }

    /// Per-offset running sums of squares.
    pub fn sum_sq(&self) -> &[f64] {
        &self.sum_sq
    }

    /// Per-offset running maxima.
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Per-offset running minima.
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Number of cycles accumulated so far.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Per-offset mean, or `None` while no cycles have been accumulated.
    pub fn mean(&self, offset: usize) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum[offset] / self.count as f64)
        }
    }
}

impl SelfConsistent for Statistics {
    fn self_consistent(&self) -> Result<()> {
        for (name, field) in [
            ("sum", &self.sum),
            ("sum_sq", &self.sum_sq),
            ("max", &self.max),
            ("min", &self.min),
        ] {
            if field.len() != self.bitrate {
                return Err(ChronostatError::inconsistent(format!(
                    "statistics field `{name}` has length {}, expected bitrate {}",
                    field.len(),
                    self.bitrate
                )));
            }
        }
        if self.count < 0 {
            return Err(ChronostatError::inconsistent(
                "statistics cycle count is negative",
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

impl Unionable for Statistics {
    fn compatible_with(&self, other: &Self) -> Result<()> {
        if self.bitrate != other.bitrate {
            return Err(ChronostatError::incompatible(
                "statistics have different bitrates",
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

    /// Sums, sums of squares, and counts add; extrema merge by element-wise
    /// selection (max of maxes, min of mins), never by addition.
    fn combine(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        for offset in 0..merged.bitrate {
            merged.sum[offset] += other.sum[offset];
            merged.sum_sq[offset] += other.sum_sq[offset];
            merged.max[offset] = merged.max[offset].max(other.max[offset]);
            merged.min[offset] = merged.min[offset].min(other.min[offset]);
        }
        merged.count += other.count;
        Ok(merged)
    }
}

impl DictSerializable for Statistics {
    const CLASS_TAG: &'static str = "Statistics";

    fn to_dict(&self) -> Value {
        json!({
            "class": Self::CLASS_TAG,
            "version": self.version,
            "bitrate": self.bitrate as i64,
            "sum": self.sum,
            "sum_sq": self.sum_sq,
            "max": self.max,
            "min": self.min,
            "count": self.count,
        })
    }

    fn from_dict(d: &Value) -> Result<Self> {
        dict::expect_class_tag(d, Self::CLASS_TAG)?;
        dict::expect_current_version(d)?;
        let bitrate = dict::get_i64(d, "bitrate")?;
        if bitrate <= 0 {
            return Err(ChronostatError::serialization(
                "statistics bitrate must be positive",
            ));
        }
        let mut stats = Self::new(bitrate as usize)?;
        stats.sum = dict::get_f64_array(d, "sum")?;
        stats.sum_sq = dict::get_f64_array(d, "sum_sq")?;
        stats.max = dict::get_f64_array(d, "max")?;
        stats.min = dict::get_f64_array(d, "min")?;
        stats.count = dict::get_i64(d, "count")?;
        stats.self_consistent()?;
        Ok(stats)
    }
}
