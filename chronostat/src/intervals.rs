//! Disjoint unions of half-open time intervals.
//!
//! An [`IntervalSet`] stores a set of the form `[s1,e1) U [s2,e2) U ...` as a
//! flat, strictly sorted endpoint sequence of even length. All set algebra is
//! pure: operations return new instances and never mutate their operands,
//! which makes interval bookkeeping safe to share across incremental workers.

use std::fmt;

use serde_json::{json, Value};
use tracing::trace;

use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
use crate::aggregates::dict;
use crate::config::FrameSpec;
use crate::errors::{ChronostatError, Result};
use crate::timeconv::TimeConverter;
use crate::SCHEMA_VERSION;

/// A disjoint, sorted union of half-open time intervals.
///
/// Invariants: the endpoint sequence is sorted ascending, has even length,
/// and contains no degenerate or touching pairs (those are collapsed on
/// construction and after every merge). Endpoints are finite `f64` values.
#[derive(Debug, Clone)]
pub struct IntervalSet {
    data: Vec<f64>,
    version: String,
}

impl IntervalSet {
    /// Creates an empty interval set.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Creates an interval set from a flat endpoint list.
    ///
    /// The list `[s1, e1, s2, e2, ...]` is interpreted as the union
    /// `[s1,e1) U [s2,e2) U ...`. It must be sorted ascending, have even
    /// length, and contain only finite values; degenerate pairs (equal
    /// adjacent endpoints) are collapsed.
    pub fn new(endpoints: impl Into<Vec<f64>>) -> Result<Self> {
        let endpoints = endpoints.into();
        if endpoints.len() % 2 != 0 {
            return Err(ChronostatError::invalid_intervals(
                "endpoint list must have even length (equal starts and ends)",
            ));
        }
        if endpoints.iter().any(|x| !x.is_finite()) {
            return Err(ChronostatError::invalid_intervals(
                "endpoints must be finite",
            ));
        }
        if endpoints.windows(2).any(|w| w[0] > w[1]) {
            return Err(ChronostatError::invalid_intervals(
                "endpoint list must be sorted ascending",
            ));
        }
        let mut set = Self {
            data: endpoints,
            version: SCHEMA_VERSION.to_string(),
        };
        set.collapse_degenerate();
        set.self_consistent()?;
        Ok(set)
    }

    /// Creates an interval set covering the single interval `[start, end)`.
    ///
    /// `start == end` yields the empty set.
    pub fn from_range(start: f64, end: f64) -> Result<Self> {
        if start == end {
            return Ok(Self::empty());
        }
        if start > end {
            return Err(ChronostatError::invalid_intervals(format!(
                "interval start {start} is after end {end}"
            )));
        }
        Self::new(vec![start, end])
    }

    /// Returns the flat endpoint sequence.
    pub fn endpoints(&self) -> &[f64] {
        &self.data
    }

    /// Number of endpoints in the set (twice the number of intervals).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the set contains no intervals.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Schema version carried by this set.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Iterates the contained intervals as `(start, end)` pairs.
    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.data.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Sum of `end - start` over all contained intervals.
    pub fn combined_length(&self) -> f64 {
        self.intervals().map(|(start, end)| end - start).sum()
    }

    /// Binary-searches the endpoint sequence for the splice bounds of the
    /// interval `[a, b)`.
    ///
    /// Returns `(l, r)` where `l` is the index of the leftmost endpoint
    /// greater than or equal to `a`, and `r` the index of the rightmost
    /// endpoint less than or equal to `b` (`-1` when every endpoint exceeds
    /// `b`). The parity of each index encodes whether the boundary point
    /// falls inside the set (odd) or in a gap (even); the four parity
    /// combinations select the splice rule for union, intersection, and
    /// complement.
    pub fn bounds_for(&self, a: f64, b: f64) -> Result<(usize, isize)> {
        if self.data.is_empty() {
            return Err(ChronostatError::EmptySet);
        }
        let l = self.data.partition_point(|&x| x < a);
        let r = self.data.partition_point(|&x| x <= b) as isize - 1;
        Ok((l, r))
    }

    /// Returns the union of this set with `other` as a new set.
    pub fn union(&self, other: &IntervalSet) -> Result<IntervalSet> {
        self.self_consistent()?;
        other.self_consistent()?;
        self.compatible_with(other)?;
        self.combine(other)
    }

    fn splice_union(&self, other: &IntervalSet) -> Result<IntervalSet> {
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        // Iteratively union every interval of the other set into this one.
        let mut result = self.clone();
        for (start, end) in other.intervals() {
            let (l, r) = result.bounds_for(start, end)?;
            let suffix_at = (r + 1) as usize;
            let mut data = Vec::with_capacity(result.data.len() + 2);
            data.extend_from_slice(&result.data[..l]);
            match (l % 2, r.rem_euclid(2)) {
                // gap -> gap: the new interval sticks out on both sides
                (0, 1) => data.extend_from_slice(&[start, end]),
                // gap -> covered: only the new start survives
                (0, 0) => data.push(start),
                // covered -> gap: only the new end survives
                (1, 1) => data.push(end),
                // covered -> covered: the span between collapses entirely
                _ => {}
            }
            data.extend_from_slice(&result.data[suffix_at..]);
            result.data = data;
            result.collapse_degenerate();
        }
        trace!(endpoints = result.len(), "spliced union");
        Ok(result)
    }

    /// Returns the intersection of this set with `other` as a new set.
    pub fn intersection(&self, other: &IntervalSet) -> Result<IntervalSet> {
        self.self_consistent()?;
        other.self_consistent()?;
        if self.is_empty() || other.is_empty() {
            return Ok(IntervalSet::empty());
        }
        let mut acc: Vec<f64> = Vec::new();
        for (start, end) in other.intervals() {
            let (l, r) = self.bounds_for(start, end)?;
            let inner = &self.data[l..(r + 1) as usize];
            match (l % 2, r.rem_euclid(2)) {
                (0, 1) => acc.extend_from_slice(inner),
                (0, 0) => {
                    acc.extend_from_slice(inner);
                    acc.push(end);
                }
                (1, 1) => {
                    acc.push(start);
                    acc.extend_from_slice(inner);
                }
                _ => {
                    acc.push(start);
                    acc.extend_from_slice(inner);
                    acc.push(end);
                }
            }
        }
        let mut result = IntervalSet {
            data: acc,
            version: self.version.clone(),
        };
        result.collapse_degenerate();
        result.self_consistent()?;
        Ok(result)
    }

    /// Returns the complement of this set with respect to a superset.
    ///
    /// `other` must satisfy `self U other == other`; anything else fails
    /// with [`ChronostatError::NotASuperset`].
    pub fn complement_with_respect_to(&self, other: &IntervalSet) -> Result<IntervalSet> {
        self.self_consistent()?;
        other.self_consistent()?;
        if &self.union(other)? != other {
            return Err(ChronostatError::NotASuperset(format!(
                "{other} does not contain {self}"
            )));
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        let mut acc: Vec<f64> = Vec::new();
        for (start, end) in other.intervals() {
            let (l, r) = self.bounds_for(start, end)?;
            let inner = &self.data[l..(r + 1) as usize];
            match (l % 2, r.rem_euclid(2)) {
                (0, 1) => {
                    acc.push(start);
                    acc.extend_from_slice(inner);
                    acc.push(end);
                }
                (0, 0) => {
                    acc.push(start);
                    acc.extend_from_slice(inner);
                }
                (1, 1) => {
                    acc.extend_from_slice(inner);
                    acc.push(end);
                }
                _ => acc.extend_from_slice(inner),
            }
        }
        let mut result = IntervalSet {
            data: acc,
            version: self.version.clone(),
        };
        result.collapse_degenerate();
        result.self_consistent()?;
        Ok(result)
    }

    /// Widens every interval outward to the nearest frame boundaries.
    ///
    /// Starts are rounded down and ends rounded up to multiples of the frame
    /// unit, then the rounded pieces are unioned. The result is always a
    /// superset of the input and the operation is idempotent.
    pub fn round_to_frame_times(&self, frame: &FrameSpec) -> Result<IntervalSet> {
        let unit = frame.unit;
        if !unit.is_finite() || unit <= 0.0 {
            return Err(ChronostatError::invalid_data(format!(
                "frame unit must be positive and finite, got {unit}"
            )));
        }
        let mut rounded = IntervalSet::empty();
        for (start, end) in self.intervals() {
            let frame_start = (start / unit).floor() * unit;
            let frame_end = (end / unit).ceil() * unit;
            rounded = rounded.union(&IntervalSet::from_range(frame_start, frame_end)?)?;
        }
        Ok(rounded)
    }

    /// Splits a frame-aligned set into one set per frame-unit-sized chunk.
    ///
    /// The receiver must already equal its own frame rounding, otherwise the
    /// call fails with [`ChronostatError::NotFrameAligned`]. Chunks are
    /// emitted in ascending order.
    pub fn split_into_frame_file_intervals(&self, frame: &FrameSpec) -> Result<Vec<IntervalSet>> {
        if &self.round_to_frame_times(frame)? != self {
            return Err(ChronostatError::NotFrameAligned(format!(
                "{self} does not lie on multiples of {}",
                frame.unit
            )));
        }
        if frame.unit.fract() != 0.0 {
            return Err(ChronostatError::invalid_data(
                "cannot split on a non-integral frame unit",
            ));
        }
        let unit = frame.unit as i64;
        let mut chunks = Vec::new();
        for (start, end) in self.intervals() {
            if start.fract() != 0.0 || end.fract() != 0.0 {
                return Err(ChronostatError::inconsistent(
                    "frame-aligned endpoint is not integral; out of float precision",
                ));
            }
            let mut t = start as i64;
            let end = end as i64;
            while t < end {
                chunks.push(IntervalSet::from_range(t as f64, (t + unit) as f64)?);
                t += unit;
            }
        }
        Ok(chunks)
    }

    /// Renders the set with endpoints converted to human-readable timestamps.
    ///
    /// Used only for reporting; interval math always stays numeric.
    pub fn human_readable(&self, converter: &dyn TimeConverter) -> Result<String> {
        self.self_consistent()?;
        if self.is_empty() {
            return Ok("{}".to_string());
        }
        let mut parts = Vec::new();
        for (start, end) in self.intervals() {
            parts.push(format!(
                "[{}, {})",
                converter.to_text(start)?,
                converter.to_text(end)?
            ));
        }
        Ok(parts.join(" U "))
    }

    /// Builds a set from an even-length list of human-readable timestamps.
    pub fn from_readable_endpoints<S: AsRef<str>>(
        endpoints: &[S],
        converter: &dyn TimeConverter,
    ) -> Result<IntervalSet> {
        let mut times = Vec::with_capacity(endpoints.len());
        for text in endpoints {
            times.push(converter.to_numeric(text.as_ref())?);
        }
        IntervalSet::new(times)
    }

    /// Removes degenerate pairs: `[a,b) U [b,c)` becomes `[a,c)`, and the
    /// empty interval `[b,b)` disappears.
    fn collapse_degenerate(&mut self) {
        let mut i = 0;
        while i + 1 < self.data.len() {
            if self.data[i] == self.data[i + 1] {
                self.data.drain(i..i + 2);
            } else {
                i += 1;
            }
        }
    }
}

impl SelfConsistent for IntervalSet {
    fn self_consistent(&self) -> Result<()> {
        if self.data.len() % 2 != 0 {
            return Err(ChronostatError::inconsistent(
                "interval set corrupted: odd number of endpoints",
            ));
        }
        if self.data.iter().any(|x| !x.is_finite()) {
            return Err(ChronostatError::inconsistent(
                "interval set corrupted: non-finite endpoint",
            ));
        }
        if self.data.windows(2).any(|w| w[0] > w[1]) {
            return Err(ChronostatError::inconsistent(
                "interval set corrupted: endpoints not sorted",
            ));
        }
        Ok(())
    }
}

impl Unionable for IntervalSet {
    fn compatible_with(&self, other: &Self) -> Result<()> {
        if self.version != other.version {
            return Err(ChronostatError::version_mismatch(
                &self.version,
                &other.version,
            ));
        }
        Ok(())
    }

    fn combine(&self, other: &Self) -> Result<Self> {
        self.splice_union(other)
    }
}

impl DictSerializable for IntervalSet {
    const CLASS_TAG: &'static str = "IntervalSet";

    fn to_dict(&self) -> Value {
        json!({
            "class": Self::CLASS_TAG,
            "version": self.version,
            "data": self.data,
        })
    }

    fn from_dict(d: &Value) -> Result<Self> {
        dict::expect_class_tag(d, Self::CLASS_TAG)?;
        dict::expect_current_version(d)?;
        IntervalSet::new(dict::get_f64_array(d, "data")?)
    }
}

/// Equality is structural on the endpoint sequence, conditioned on matching
/// version. Sets from different schema versions compare unequal rather than
/// failing.
impl PartialEq for IntervalSet {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.data == other.data
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}");
        }
        let mut first = true;
        for (start, end) in self.intervals() {
            if !first {
                write!(f, " U ")?;
            }
            write!(f, "[{start}, {end})")?;
            first = false;
        }
        Ok(())
    }
}
