//! Named bundles of aggregate primitives with coverage bookkeeping.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
use crate::aggregates::dict;
use crate::aggregates::{Histogram, Statistics};
use crate::config::ReportConfig;
use crate::errors::{ChronostatError, Result};
use crate::intervals::IntervalSet;
use crate::samples::SampleBlock;
use crate::SCHEMA_VERSION;

/// The family of timing-calibration channel a report describes.
///
/// The kind fixes the primitive set of the report. Both kinds currently
/// bundle a histogram and a statistics block; they exist as distinct tags so
/// that reports from different channel families can never be unioned into
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// IRIG-B timecode channels.
    IrigB,
    /// Duotone calibration channels.
    DuoTone,
}

impl ReportKind {
    /// Stable string form used in dictionaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::IrigB => "irig_b",
            ReportKind::DuoTone => "duo_tone",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ChronostatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "irig_b" => Ok(ReportKind::IrigB),
            "duo_tone" => Ok(ReportKind::DuoTone),
            other => Err(ChronostatError::serialization(format!(
                "unknown report kind `{other}`"
            ))),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A histogram and a statistics block plus the time they cover.
///
/// Every primitive shares the report's bitrate and version, and the primitive
/// set is fixed by the report [`ReportKind`]. Reports merge through `union`,
/// which enforces disjoint time coverage so no sample block is ever counted
/// twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    kind: ReportKind,
    bitrate: usize,
    time_intervals: IntervalSet,
    histogram: Histogram,
    statistics: Statistics,
    version: String,
}

impl Report {
    /// Creates an empty report with no coverage.
    pub fn empty(kind: ReportKind, config: &ReportConfig) -> Result<Self> {
        Ok(Self {
            kind,
            bitrate: config.bitrate,
            time_intervals: IntervalSet::empty(),
            histogram: Histogram::new(&config.histogram, config.bitrate)?,
            statistics: Statistics::new(config.bitrate)?,
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Builds a report from one sample block covering `covered`.
    #[instrument(skip(block, config), fields(kind = %kind, rows = block.rows()))]
    pub fn from_samples(
        kind: ReportKind,
        block: &SampleBlock,
        covered: &IntervalSet,
        config: &ReportConfig,
    ) -> Result<Self> {
        let report = Self {
            kind,
            bitrate: config.bitrate,
            time_intervals: covered.checked_clone()?,
            histogram: Histogram::from_samples(block, &config.histogram, config.bitrate)?,
            statistics: Statistics::from_samples(block, config.bitrate)?,
            version: SCHEMA_VERSION.to_string(),
        };
        report.self_consistent()?;
        debug!(coverage = %report.time_intervals, "built report from samples");
        Ok(report)
    }

    /// Returns a new report with `block` folded into this one.
    ///
    /// `covered` must be disjoint from the current coverage.
    pub fn fold_in(&self, block: &SampleBlock, covered: &IntervalSet) -> Result<Self> {
        let config = ReportConfig {
            bitrate: self.bitrate,
            histogram: self.histogram.spec(),
            frame: Default::default(),
        };
        self.union(&Self::from_samples(self.kind, block, covered, &config)?)
    }

    /// The channel family of this report.
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Number of within-cycle offsets per primitive.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// Schema version carried by this report.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The time this report's data covers.
    pub fn time_intervals(&self) -> &IntervalSet {
        &self.time_intervals
    }

    /// The histogram primitive.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// The statistics primitive.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Names of the primitives bundled by this report kind, in dictionary
    /// order. Map-like iteration over an otherwise strongly-typed struct.
    pub fn primitive_names(&self) -> &'static [&'static str] {
        &["histogram", "statistics"]
    }
}

impl SelfConsistent for Report {
    fn self_consistent(&self) -> Result<()> {
        self.histogram.self_consistent()?;
        self.statistics.self_consistent()?;
        self.time_intervals.self_consistent()?;
        if self.histogram.bitrate() != self.bitrate || self.statistics.bitrate() != self.bitrate {
            return Err(ChronostatError::inconsistent(
                "report constituents have different bitrates",
            ));
        }
        if self.histogram.version() != self.version
            || self.statistics.version() != self.version
            || self.time_intervals.version() != self.version
        {
            return Err(ChronostatError::inconsistent(
                "report constituents have different versions",
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

impl Unionable for Report {
    fn compatible_with(&self, other: &Self) -> Result<()> {
        if self.kind != other.kind {
            return Err(ChronostatError::incompatible(format!(
                "cannot union a {} report with a {} report",
                self.kind, other.kind
            )));
        }
        if self.bitrate != other.bitrate {
            return Err(ChronostatError::incompatible(
                "reports have different bitrates",
            ));
        }
        if self.version != other.version {
            return Err(ChronostatError::version_mismatch(
                &self.version,
                &other.version,
            ));
        }
        let overlap = self.time_intervals.intersection(&other.time_intervals)?;
        if !overlap.is_empty() {
            return Err(ChronostatError::overlapping(format!(
                "reports both cover {overlap}"
            )));
        }
        Ok(())
    }

    fn combine(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            kind: self.kind,
            bitrate: self.bitrate,
            time_intervals: self.time_intervals.combine(&other.time_intervals)?,
            histogram: self.histogram.combine(&other.histogram)?,
            statistics: self.statistics.combine(&other.statistics)?,
            version: self.version.clone(),
        })
    }
}

impl DictSerializable for Report {
    const CLASS_TAG: &'static str = "Report";

    fn to_dict(&self) -> Value {
        json!({
            "class": Self::CLASS_TAG,
            "version": self.version,
            "kind": self.kind.as_str(),
            "bitrate": self.bitrate as i64,
            "time_intervals": self.time_intervals.to_dict(),
            "data": {
                "histogram": self.histogram.to_dict(),
                "statistics": self.statistics.to_dict(),
            },
        })
    }

    fn from_dict(d: &Value) -> Result<Self> {
        dict::expect_class_tag(d, Self::CLASS_TAG)?;
        let version = dict::expect_current_version(d)?;
        let kind: ReportKind = dict::get_str(d, "kind")?.parse()?;
        let bitrate = dict::get_i64(d, "bitrate")?;
        if bitrate <= 0 {
            return Err(ChronostatError::serialization(
                "report bitrate must be positive",
            ));
        }
        let data = dict::get_object(d, "data")?;
        let report = Self {
            kind,
            bitrate: bitrate as usize,
            time_intervals: IntervalSet::from_dict(dict::get_object(d, "time_intervals")?)?,
            histogram: Histogram::from_dict(dict::get_object(data, "histogram")?)?,
            statistics: Statistics::from_dict(dict::get_object(data, "statistics")?)?,
            version,
        };
        report.self_consistent()?;
        Ok(report)
    }
}
