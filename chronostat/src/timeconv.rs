//! Time-conversion collaborator.
//!
//! Converts between human-readable timestamps and the numeric time values
//! used throughout the interval algebra. Conversion is used only for
//! reporting and for constructing interval sets from readable input; the
//! core never does interval math on text.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::{ChronostatError, Result};

/// Converts between readable timestamp text and numeric time values.
pub trait TimeConverter: Send + Sync {
    /// Parses readable timestamp text into a numeric time value.
    fn to_numeric(&self, text: &str) -> Result<f64>;

    /// Formats a numeric time value as readable timestamp text.
    fn to_text(&self, time: f64) -> Result<String>;
}

/// Converter treating numeric times as seconds since the Unix epoch,
/// rendered in UTC.
///
/// The default format carries an optional sub-second fraction (`%.f`), so
/// fractional interval endpoints render and parse back without loss of the
/// representable digits.
#[derive(Debug, Clone)]
pub struct UtcTimeConverter {
    format: String,
}

impl Default for UtcTimeConverter {
    fn default() -> Self {
        Self {
            format: "%Y-%m-%d %H:%M:%S%.f UTC".to_string(),
        }
    }
}

impl UtcTimeConverter {
    /// Sets a custom strftime-style format string.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl TimeConverter for UtcTimeConverter {
    fn to_numeric(&self, text: &str) -> Result<f64> {
        let stamp = NaiveDateTime::parse_from_str(text.trim(), &self.format)?.and_utc();
        Ok(stamp.timestamp() as f64 + f64::from(stamp.timestamp_subsec_nanos()) / 1e9)
    }

    fn to_text(&self, time: f64) -> Result<String> {
        if !time.is_finite() {
            return Err(ChronostatError::TimeConversion(format!(
                "cannot format a non-finite time value: {time}"
            )));
        }
        let secs = time.floor();
        let mut whole = secs as i64;
        let mut nanos = ((time - secs) * 1e9).round() as u32;
        if nanos >= 1_000_000_000 {
            whole += 1;
            nanos = 0;
        }
        let stamp: DateTime<Utc> = DateTime::from_timestamp(whole, nanos).ok_or_else(|| {
            ChronostatError::TimeConversion(format!("time value {time} is out of range"))
        })?;
        Ok(stamp.format(&self.format).to_string())
    }
}
