//! Frame locator/loader collaborator and the anomaly predicate.
//!
//! Raw recordings live in frame files outside this crate. The core consumes
//! them through the narrow [`FrameStore`] interface: locate a frame for a
//! window, then load it as a whole [`SampleBlock`]. Loading is atomic and
//! all-or-nothing; an absent channel surfaces as
//! [`crate::errors::ChronostatError::MissingData`], never as a partial block.

use std::collections::HashMap;

use tracing::debug;

use crate::config::FrameSpec;
use crate::errors::{ChronostatError, Result};
use crate::intervals::IntervalSet;
use crate::samples::SampleBlock;

/// Opaque handle to a located frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLocation {
    uri: String,
}

impl FrameLocation {
    /// Creates a location from an implementation-defined URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// The implementation-defined URI of the frame.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Access to raw sample blocks organized into frame files.
///
/// `window` arguments must already satisfy the store's alignment
/// requirement: a single interval, frame aligned, exactly one frame unit
/// long. Mismatched alignment is a caller error, not a data error.
pub trait FrameStore: Send + Sync {
    /// Finds the frame holding data for `window` on `channel`.
    fn locate(&self, channel: &str, window: &IntervalSet) -> Result<FrameLocation>;

    /// Loads the sample block for `window` from a located frame.
    fn load(
        &self,
        channel: &str,
        location: &FrameLocation,
        window: &IntervalSet,
    ) -> Result<SampleBlock>;
}

/// Checks the native alignment precondition shared by all frame stores.
pub fn check_frame_window(window: &IntervalSet, frame: &FrameSpec) -> Result<()> {
    if window.len() != 2 {
        return Err(ChronostatError::invalid_data(
            "frame window must be one continuous interval",
        ));
    }
    if &window.round_to_frame_times(frame)? != window {
        return Err(ChronostatError::NotFrameAligned(format!(
            "frame window {window} does not lie on multiples of {}",
            frame.unit
        )));
    }
    if window.combined_length() != frame.unit {
        return Err(ChronostatError::invalid_data(format!(
            "frame window {window} must span exactly one frame of {} time units",
            frame.unit
        )));
    }
    Ok(())
}

/// Frame store backed by a map of pre-registered blocks.
///
/// Used in tests and small batch runs where frames are already in memory;
/// production deployments implement [`FrameStore`] over their own frame
/// catalogs.
#[derive(Debug, Default)]
pub struct InMemoryFrameStore {
    frame: FrameSpec,
    blocks: HashMap<(String, i64), SampleBlock>,
}

impl InMemoryFrameStore {
    /// Creates an empty store with the given frame alignment policy.
    pub fn new(frame: FrameSpec) -> Self {
        Self {
            frame,
            blocks: HashMap::new(),
        }
    }

    /// Registers the block for the frame starting at `frame_start`.
    pub fn insert(&mut self, channel: impl Into<String>, frame_start: i64, block: SampleBlock) {
        self.blocks.insert((channel.into(), frame_start), block);
    }

    fn key(&self, channel: &str, window: &IntervalSet) -> Result<(String, i64)> {
        check_frame_window(window, &self.frame)?;
        let start = window.endpoints()[0];
        Ok((channel.to_string(), start as i64))
    }
}

impl FrameStore for InMemoryFrameStore {
    fn locate(&self, channel: &str, window: &IntervalSet) -> Result<FrameLocation> {
        let key = self.key(channel, window)?;
        if self.blocks.contains_key(&key) {
            Ok(FrameLocation::new(format!("mem://{channel}/{}", key.1)))
        } else {
            debug!(channel, window = %window, "no frame registered for window");
            Err(ChronostatError::missing_data(format!(
                "channel {channel} has no data for {window}"
            )))
        }
    }

    fn load(
        &self,
        channel: &str,
        _location: &FrameLocation,
        window: &IntervalSet,
    ) -> Result<SampleBlock> {
        let key = self.key(channel, window)?;
        self.blocks.get(&key).cloned().ok_or_else(|| {
            ChronostatError::missing_data(format!("channel {channel} has no data for {window}"))
        })
    }
}

/// Externally supplied classifier splitting sample blocks into anomalous and
/// nominal populations.
///
/// What counts as anomalous is policy, not core algebra; callers plug in
/// whatever heuristic suits their channels.
pub trait AnomalyPredicate: Send + Sync {
    /// Classifies a whole sample block.
    fn is_anomalous(&self, block: &SampleBlock) -> bool;

    /// Name of this predicate, for logging and reporting.
    fn name(&self) -> &str;
}

/// Predicate that classifies every block as nominal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAnomalous;

impl AnomalyPredicate for NeverAnomalous {
    fn is_anomalous(&self, _block: &SampleBlock) -> bool {
        false
    }

    fn name(&self) -> &str {
        "never_anomalous"
    }
}

/// Predicate flagging any block containing a sample beyond a magnitude limit.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPredicate {
    /// Largest tolerated absolute sample value.
    pub max_abs: f64,
}

impl ThresholdPredicate {
    /// Creates a predicate with the given magnitude limit.
    pub fn new(max_abs: f64) -> Self {
        Self { max_abs }
    }
}

impl AnomalyPredicate for ThresholdPredicate {
    fn is_anomalous(&self, block: &SampleBlock) -> bool {
        block
            .iter_rows()
            .any(|row| row.iter().any(|v| v.abs() > self.max_abs))
    }

    fn name(&self) -> &str {
        "threshold"
    }
}
