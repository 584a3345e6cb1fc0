//! Tag-dispatched decoding of persisted aggregates.
//!
//! Every encoded dictionary carries its producing type's tag under the
//! `class` key. Readers that do not know the concrete type up front, such as
//! the persistence layer loading an arbitrary saved file, dispatch through
//! the table here instead of guessing.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::aggregates::contract::DictSerializable;
use crate::aggregates::dict;
use crate::aggregates::{Histogram, Statistics};
use crate::errors::{ChronostatError, Result};
use crate::intervals::IntervalSet;
use crate::report::Report;
use crate::report_set::ReportSet;

/// A decoded aggregate of any registered type.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    /// A half-open time interval set.
    IntervalSet(IntervalSet),
    /// A per-offset histogram.
    Histogram(Histogram),
    /// A per-offset statistics block.
    Statistics(Statistics),
    /// A report bundling primitives with coverage.
    Report(Report),
    /// An anomaly-partitioned report collection.
    ReportSet(ReportSet),
}

impl AggregateValue {
    /// The type tag this value encodes under.
    pub fn class_tag(&self) -> &'static str {
        match self {
            AggregateValue::IntervalSet(_) => IntervalSet::CLASS_TAG,
            AggregateValue::Histogram(_) => Histogram::CLASS_TAG,
            AggregateValue::Statistics(_) => Statistics::CLASS_TAG,
            AggregateValue::Report(_) => Report::CLASS_TAG,
            AggregateValue::ReportSet(_) => ReportSet::CLASS_TAG,
        }
    }

    /// Encodes the wrapped value as a tagged dictionary tree.
    pub fn to_dict(&self) -> Value {
        match self {
            AggregateValue::IntervalSet(v) => v.to_dict(),
            AggregateValue::Histogram(v) => v.to_dict(),
            AggregateValue::Statistics(v) => v.to_dict(),
            AggregateValue::Report(v) => v.to_dict(),
            AggregateValue::ReportSet(v) => v.to_dict(),
        }
    }
}

type DecodeFn = fn(&Value) -> Result<AggregateValue>;

static DECODERS: Lazy<HashMap<&'static str, DecodeFn>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, DecodeFn> = HashMap::new();
    table.insert(IntervalSet::CLASS_TAG, |d| {
        Ok(AggregateValue::IntervalSet(IntervalSet::from_dict(d)?))
    });
    table.insert(Histogram::CLASS_TAG, |d| {
        Ok(AggregateValue::Histogram(Histogram::from_dict(d)?))
    });
    table.insert(Statistics::CLASS_TAG, |d| {
        Ok(AggregateValue::Statistics(Statistics::from_dict(d)?))
    });
    table.insert(Report::CLASS_TAG, |d| {
        Ok(AggregateValue::Report(Report::from_dict(d)?))
    });
    table.insert(ReportSet::CLASS_TAG, |d| {
        Ok(AggregateValue::ReportSet(ReportSet::from_dict(d)?))
    });
    table
});

/// Decodes an encoded dictionary by its `class` tag.
///
/// Returns [`ChronostatError::UnknownTypeTag`] when the tag names no
/// registered type, which is the usual symptom of reading a file written by a
/// newer release.
pub fn decode(d: &Value) -> Result<AggregateValue> {
    let tag = dict::class_tag(d)?;
    let decoder = DECODERS
        .get(tag)
        .ok_or_else(|| ChronostatError::UnknownTypeTag(tag.to_string()))?;
    decoder(d)
}

/// The tags this release can decode, in arbitrary order.
pub fn registered_tags() -> Vec<&'static str> {
    DECODERS.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_by_tag() {
        let set = IntervalSet::from_range(0.0, 64.0).unwrap();
        let decoded = decode(&set.to_dict()).unwrap();
        assert_eq!(decoded, AggregateValue::IntervalSet(set));
        assert_eq!(decoded.class_tag(), "IntervalSet");
    }

    #[test]
    fn rejects_unknown_tags() {
        let d = serde_json::json!({ "class": "Spectrogram", "version": "0.0.1" });
        let err = decode(&d).unwrap_err();
        assert!(matches!(err, ChronostatError::UnknownTypeTag(tag) if tag == "Spectrogram"));
    }

    #[test]
    fn every_tag_is_registered_once() {
        let mut tags = registered_tags();
        tags.sort_unstable();
        assert_eq!(
            tags,
            vec![
                "Histogram",
                "IntervalSet",
                "Report",
                "ReportSet",
                "Statistics"
            ]
        );
    }
}
