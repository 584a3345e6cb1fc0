//! Mergeable aggregate primitives and their shared contracts.
//!
//! The aggregates here are the mergeable building blocks of a report: each
//! one can be built from a sample block, unioned with a compatible peer, and
//! round-tripped through the restricted dictionary shape in [`dict`].

pub mod contract;
pub mod dict;
pub mod histogram;
pub mod registry;
pub mod statistics;

pub use histogram::Histogram;
pub use statistics::Statistics;

#[cfg(test)]
mod tests;
