//! # Chronostat - Incremental Timing Diagnostics for Rust
//!
//! Chronostat builds incremental statistical reports over long-running
//! timing-calibration telemetry. Raw recordings arrive as fixed-length frame
//! files; chronostat reduces each frame into compact mergeable aggregates
//! (histograms and running statistics per within-cycle offset) and tracks
//! exactly which time every aggregate covers, so months of data can be
//! summarized one frame at a time and partial runs combined later without
//! double counting.
//!
//! ## Overview
//!
//! Two ideas carry the whole crate:
//!
//! - **Half-open time interval sets** ([`intervals::IntervalSet`]): an exact
//!   algebra of union, intersection, and complement over sorted interval
//!   endpoints. Every aggregate records its coverage as one of these, and
//!   merging two aggregates demands disjoint coverage.
//! - **The versioned aggregate contract** ([`aggregates::contract`]): every
//!   aggregate validates itself, merges only with compatible peers, and round
//!   trips through a restricted dictionary representation tagged with its
//!   type and schema version.
//!
//! ## Quick Start
//!
//! ```rust
//! use chronostat::prelude::*;
//!
//! # fn example() -> chronostat::errors::Result<()> {
//! let config = ReportConfig::default()
//!     .with_bitrate(4)
//!     .with_histogram(HistogramSpec { range: (-2.0, 2.0), num_bins: 8 });
//!
//! // One frame of samples: rows are cycles, columns are within-cycle offsets.
//! let block = SampleBlock::from_rows(vec![
//!     vec![0.1, 0.2, -0.1, 0.0],
//!     vec![0.1, 0.3, -0.2, 0.1],
//! ])?;
//! let window = IntervalSet::from_range(0.0, 64.0)?;
//!
//! let first = Report::from_samples(ReportKind::IrigB, &block, &window, &config)?;
//!
//! // Later frames fold in; coverage must stay disjoint.
//! let next_window = IntervalSet::from_range(64.0, 128.0)?;
//! let combined = first.fold_in(&block, &next_window)?;
//! assert_eq!(combined.time_intervals().combined_length(), 128.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`intervals`**: the half-open interval-set algebra and frame rounding
//! - **`samples`**: the rectangular sample block handed in by frame loaders
//! - **`aggregates`**: the capability contracts, dictionary shape, decoder
//!   registry, and the histogram/statistics primitives
//! - **`report`** / **`report_set`**: primitives bundled with coverage, and
//!   the anomaly-partitioned collections built per channel
//! - **`frames`**: the frame locate/load collaborator and anomaly predicates
//! - **`store`**: persistence of encoded aggregates
//! - **`timeconv`**: numeric/text timestamp conversion at the edges
//! - **`config`** / **`logging`** / **`errors`**: the ambient plumbing

pub mod aggregates;
pub mod config;
pub mod errors;
pub mod frames;
pub mod intervals;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod report_set;
pub mod samples;
pub mod store;
pub mod timeconv;

/// Schema version stamped into every aggregate and checked on every decode.
///
/// Tied to the crate version: data written by one release is readable only by
/// the same release. Cross-version migration is an explicit external step,
/// never an implicit decode-time upgrade.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");
