//! Anomaly-partitioned report collections for a single channel.

use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
use crate::aggregates::dict;
use crate::config::ReportConfig;
use crate::errors::{ChronostatError, Result};
use crate::frames::{AnomalyPredicate, FrameStore};
use crate::intervals::IntervalSet;
use crate::report::{Report, ReportKind};
use crate::SCHEMA_VERSION;

/// Three views over the same channel's data: everything, anomalous windows
/// only, and nominal windows only, plus bookkeeping of windows with missing
/// data.
///
/// Invariants, checked by `self_consistent`:
/// - the whole report is the disjoint union of its two partitions,
///   `report == report_anomalies_only U report_sans_anomalies`;
/// - `missing_times` is a subset of `time_intervals` and disjoint from the
///   report's coverage;
/// - the total time considered is accounted for exactly once,
///   `time_intervals == report.time_intervals U missing_times`.
///
/// When nothing is missing the last invariant reduces to
/// `time_intervals == report.time_intervals`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSet {
    channel: String,
    kind: ReportKind,
    bitrate: usize,
    time_intervals: IntervalSet,
    missing_times: IntervalSet,
    report: Report,
    report_anomalies_only: Report,
    report_sans_anomalies: Report,
    version: String,
}

impl ReportSet {
    /// Creates an empty report set for a channel.
    pub fn empty(
        kind: ReportKind,
        channel: impl Into<String>,
        config: &ReportConfig,
    ) -> Result<Self> {
        Ok(Self {
            channel: channel.into(),
            kind,
            bitrate: config.bitrate,
            time_intervals: IntervalSet::empty(),
            missing_times: IntervalSet::empty(),
            report: Report::empty(kind, config)?,
            report_anomalies_only: Report::empty(kind, config)?,
            report_sans_anomalies: Report::empty(kind, config)?,
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Creates a report set from explicit parts.
    ///
    /// Either all three reports are supplied together or none at all; with
    /// none, the reports default to empty and `time_intervals` must consist
    /// entirely of missing time. Partial report initialization cannot
    /// represent a consistent partition and is rejected by the consistency
    /// check that runs before the value is returned.
    pub fn new(
        kind: ReportKind,
        channel: impl Into<String>,
        time_intervals: IntervalSet,
        missing_times: IntervalSet,
        reports: Option<(Report, Report, Report)>,
        config: &ReportConfig,
    ) -> Result<Self> {
        let (report, report_anomalies_only, report_sans_anomalies) = match reports {
            Some(triple) => triple,
            None => (
                Report::empty(kind, config)?,
                Report::empty(kind, config)?,
                Report::empty(kind, config)?,
            ),
        };
        let set = Self {
            channel: channel.into(),
            kind,
            bitrate: config.bitrate,
            time_intervals,
            missing_times,
            report,
            report_anomalies_only,
            report_sans_anomalies,
            version: SCHEMA_VERSION.to_string(),
        };
        set.self_consistent()?;
        Ok(set)
    }

    /// Builds a report set for one frame-aligned window of one channel.
    ///
    /// On a successful load the whole window's report is placed into exactly
    /// one partition, selected by the anomaly predicate, while the other
    /// partition stays empty. A [`ChronostatError::MissingData`] failure from
    /// the frame store is recoverable: the window is recorded into
    /// `missing_times` and all three reports stay empty. Precondition
    /// violations (misaligned windows) and other collaborator failures
    /// propagate unchanged.
    #[instrument(skip(store, predicate, config), fields(kind = %kind, channel))]
    pub fn from_channel_and_window(
        kind: ReportKind,
        channel: &str,
        window: &IntervalSet,
        store: &dyn FrameStore,
        predicate: &dyn AnomalyPredicate,
        config: &ReportConfig,
    ) -> Result<Self> {
        let loaded = store
            .locate(channel, window)
            .and_then(|location| store.load(channel, &location, window));
        let block = match loaded {
            Ok(block) => block,
            Err(ChronostatError::MissingData(reason)) => {
                warn!(window = %window, %reason, "window has no data, recording as missing");
                let mut set = Self::empty(kind, channel, config)?;
                set.time_intervals = window.checked_clone()?;
                set.missing_times = window.checked_clone()?;
                set.self_consistent()?;
                return Ok(set);
            }
            Err(other) => return Err(other),
        };

        let report = Report::from_samples(kind, &block, window, config)?;
        let empty = Report::empty(kind, config)?;
        let anomalous = predicate.is_anomalous(&block);
        debug!(window = %window, anomalous, predicate = predicate.name(), "classified window");
        let (report_anomalies_only, report_sans_anomalies) = if anomalous {
            (report.clone(), empty)
        } else {
            (empty, report.clone())
        };

        let set = Self {
            channel: channel.to_string(),
            kind,
            bitrate: config.bitrate,
            time_intervals: window.checked_clone()?,
            missing_times: IntervalSet::empty(),
            report,
            report_anomalies_only,
            report_sans_anomalies,
            version: SCHEMA_VERSION.to_string(),
        };
        set.self_consistent()?;
        Ok(set)
    }

    /// The channel this set describes.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The channel family of the bundled reports.
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// Number of within-cycle offsets per report.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// Schema version carried by this set.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Total time considered, including missing windows.
    pub fn time_intervals(&self) -> &IntervalSet {
        &self.time_intervals
    }

    /// Time ranges that were considered but had no data.
    pub fn missing_times(&self) -> &IntervalSet {
        &self.missing_times
    }

    /// Report over all loaded data.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Report over anomalous windows only.
    pub fn report_anomalies_only(&self) -> &Report {
        &self.report_anomalies_only
    }

    /// Report over nominal windows only.
    pub fn report_sans_anomalies(&self) -> &Report {
        &self.report_sans_anomalies
    }
}

impl SelfConsistent for ReportSet {
    fn self_consistent(&self) -> Result<()> {
        for report in [
            &self.report,
            &self.report_anomalies_only,
            &self.report_sans_anomalies,
        ] {
            report.self_consistent()?;
            if report.kind() != self.kind {
                return Err(ChronostatError::inconsistent(
                    "bundled report has a different kind than this set",
                ));
            }
            if report.bitrate() != self.bitrate {
                return Err(ChronostatError::inconsistent(
                    "bundled report has a different bitrate than this set",
                ));
            }
            if report.version() != self.version {
                return Err(ChronostatError::inconsistent(
                    "bundled report has a different version than this set",
                ));
            }
        }
        self.time_intervals.self_consistent()?;
        self.missing_times.self_consistent()?;
        if self.version != SCHEMA_VERSION {
            return Err(ChronostatError::version_mismatch(
                SCHEMA_VERSION,
                &self.version,
            ));
        }

        if self.missing_times.union(&self.time_intervals)? != self.time_intervals {
            return Err(ChronostatError::inconsistent(
                "missing times must be a subset of the total time considered",
            ));
        }
        let covered = self.report.time_intervals();
        if !covered.intersection(&self.missing_times)?.is_empty() {
            return Err(ChronostatError::inconsistent(
                "report coverage and missing times overlap",
            ));
        }
        if covered.union(&self.missing_times)? != self.time_intervals {
            return Err(ChronostatError::inconsistent(
                "report coverage plus missing times must equal the total time considered",
            ));
        }
        let recombined = self
            .report_anomalies_only
            .union(&self.report_sans_anomalies)
            .map_err(|e| {
                ChronostatError::inconsistent(format!(
                    "anomalous and nominal partitions do not form a valid union: {e}"
                ))
            })?;
        if recombined != self.report {
            return Err(ChronostatError::inconsistent(
                "whole report must equal the union of its anomalous and nominal parts",
            ));
        }
        Ok(())
    }
}

impl Unionable for ReportSet {
    fn compatible_with(&self, other: &Self) -> Result<()> {
        if self.channel != other.channel {
            return Err(ChronostatError::incompatible(format!(
                "report sets describe different channels: {} vs {}",
                self.channel, other.channel
            )));
        }
        if self.kind != other.kind {
            return Err(ChronostatError::incompatible(
                "report sets have different report kinds",
            ));
        }
        if self.bitrate != other.bitrate {
            return Err(ChronostatError::incompatible(
                "report sets have different bitrates",
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
                "report sets both cover {overlap}"
            )));
        }
        Ok(())
    }

    fn combine(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            channel: self.channel.clone(),
            kind: self.kind,
            bitrate: self.bitrate,
            time_intervals: self.time_intervals.combine(&other.time_intervals)?,
            missing_times: self.missing_times.combine(&other.missing_times)?,
            report: self.report.combine(&other.report)?,
            report_anomalies_only: self
                .report_anomalies_only
                .combine(&other.report_anomalies_only)?,
            report_sans_anomalies: self
                .report_sans_anomalies
                .combine(&other.report_sans_anomalies)?,
            version: self.version.clone(),
        })
    }
}

impl DictSerializable for ReportSet {
    const CLASS_TAG: &'static str = "ReportSet";

    fn to_dict(&self) -> Value {
        json!({
            "class": Self::CLASS_TAG,
            "version": self.version,
            "kind": self.kind.as_str(),
            "channel": self.channel,
            "bitrate": self.bitrate as i64,
            "time_intervals": self.time_intervals.to_dict(),
            "missing_times": self.missing_times.to_dict(),
            "report": self.report.to_dict(),
            "report_anomalies_only": self.report_anomalies_only.to_dict(),
            "report_sans_anomalies": self.report_sans_anomalies.to_dict(),
        })
    }

    fn from_dict(d: &Value) -> Result<Self> {
        dict::expect_class_tag(d, Self::CLASS_TAG)?;
        let version = dict::expect_current_version(d)?;
        let kind: ReportKind = dict::get_str(d, "kind")?.parse()?;
        let bitrate = dict::get_i64(d, "bitrate")?;
        if bitrate <= 0 {
            return Err(ChronostatError::serialization(
                "report set bitrate must be positive",
            ));
        }
        let set = Self {
            channel: dict::get_str(d, "channel")?.to_string(),
            kind,
            bitrate: bitrate as usize,
            time_intervals: IntervalSet::from_dict(dict::get_object(d, "time_intervals")?)?,
            missing_times: IntervalSet::from_dict(dict::get_object(d, "missing_times")?)?,
            report: Report::from_dict(dict::get_object(d, "report")?)?,
            report_anomalies_only: Report::from_dict(dict::get_object(
                d,
                "report_anomalies_only",
            )?)?,
            report_sans_anomalies: Report::from_dict(dict::get_object(
                d,
                "report_sans_anomalies",
            )?)?,
            version,
        };
        set.self_consistent()?;
        Ok(set)
    }
}
