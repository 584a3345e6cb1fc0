//! Convenience re-exports for common chronostat usage.
//!
//! ```rust
//! use chronostat::prelude::*;
//! ```

pub use crate::aggregates::contract::{DictSerializable, SelfConsistent, Unionable};
pub use crate::aggregates::registry::AggregateValue;
pub use crate::aggregates::{Histogram, Statistics};
pub use crate::config::{FrameSpec, HistogramSpec, ReportConfig, DEFAULT_BITRATE};
pub use crate::errors::{ChronostatError, Result};
pub use crate::frames::{
    AnomalyPredicate, FrameLocation, FrameStore, InMemoryFrameStore, NeverAnomalous,
    ThresholdPredicate,
};
pub use crate::intervals::IntervalSet;
pub use crate::report::{Report, ReportKind};
pub use crate::report_set::ReportSet;
pub use crate::samples::SampleBlock;
pub use crate::store::{FileSystemReportStore, ReportStore};
pub use crate::timeconv::{TimeConverter, UtcTimeConverter};
pub use crate::SCHEMA_VERSION;
