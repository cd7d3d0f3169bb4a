//! Core types for the EVA analyzer library
//!
//! This module defines the data every other module passes around: sample
//! series retrieved from a recording, the location of a channel inside a
//! recording, and the crate-wide error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute timestamp type (recording start, report generation)
pub type Timestamp = DateTime<Utc>;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while loading recordings or configuration
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Failed to load recording: {0}")]
    RecordingLoadError(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Unsupported recording format: {0}")]
    UnsupportedFormat(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Channel '{name}' is ambiguous ({count} occurrences)")]
    AmbiguousChannel { name: String, count: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),
}

/// Position of one channel occurrence inside a recording
///
/// A recording may carry the same channel name in several groups; the
/// (group, index) pair identifies exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelLocation {
    /// Channel group number
    pub group: usize,
    /// Channel index within the group
    pub index: usize,
}

impl ChannelLocation {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

impl fmt::Display for ChannelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}, index {}", self.group, self.index)
    }
}

/// A single sample value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    /// Physical numeric value
    Numeric(f64),
    /// Textual value (VIN strings, enumeration labels)
    Text(String),
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Numeric(v) => write!(f, "{:.3}", v),
            SampleValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl SampleValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Numeric(v) => Some(*v),
            SampleValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Textual view of the value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SampleValue::Text(s) => Some(s),
            SampleValue::Numeric(_) => None,
        }
    }
}

/// The value column of a sample series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValues {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl SampleValues {
    pub fn len(&self) -> usize {
        match self {
            SampleValues::Numeric(v) => v.len(),
            SampleValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the sample at `i` differs from the one at `i - 1`
    fn changed_at(&self, i: usize) -> bool {
        match self {
            SampleValues::Numeric(v) => {
                let (prev, cur) = (v[i - 1], v[i]);
                // NaN -> NaN is not a change of state
                prev != cur && !(prev.is_nan() && cur.is_nan())
            }
            SampleValues::Text(v) => v[i] != v[i - 1],
        }
    }
}

/// Min / max / mean of a numeric series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Timestamps (seconds) paired with sample values. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    timestamps: Vec<f64>,
    values: SampleValues,
}

impl SampleSeries {
    /// Build a series, rejecting mismatched column lengths
    pub fn new(timestamps: Vec<f64>, values: SampleValues) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnalyzerError::InvalidData(format!(
                "{} timestamps but {} samples",
                timestamps.len(),
                values.len()
            )));
        }
        Ok(Self { timestamps, values })
    }

    /// Convenience constructor for numeric series
    pub fn numeric(timestamps: Vec<f64>, samples: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, SampleValues::Numeric(samples))
    }

    /// Convenience constructor for textual series
    pub fn text(timestamps: Vec<f64>, samples: Vec<String>) -> Result<Self> {
        Self::new(timestamps, SampleValues::Text(samples))
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn values(&self) -> &SampleValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample at position `i`
    pub fn value_at(&self, i: usize) -> Option<SampleValue> {
        match &self.values {
            SampleValues::Numeric(v) => v.get(i).copied().map(SampleValue::Numeric),
            SampleValues::Text(v) => v.get(i).cloned().map(SampleValue::Text),
        }
    }

    /// Timestamps of every index where the value differs from the previous sample
    pub fn transition_times(&self) -> Vec<f64> {
        (1..self.len())
            .filter(|&i| self.values.changed_at(i))
            .map(|i| self.timestamps[i])
            .collect()
    }

    /// Min / max / mean over the finite numeric samples
    ///
    /// Returns `None` for textual series and for series without a finite sample.
    pub fn summary(&self) -> Option<SeriesSummary> {
        let SampleValues::Numeric(values) = &self.values else {
            return None;
        };

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values.iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return None;
        }

        Some(SeriesSummary {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_length_mismatch() {
        let result = SampleSeries::numeric(vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(result, Err(AnalyzerError::InvalidData(_))));
    }

    #[test]
    fn test_transition_times() {
        let series = SampleSeries::numeric(
            vec![0.0, 1.0, 2.0, 2.5, 3.0, 4.0],
            vec![0.0, 1.0, 1.0, 2.0, 2.0, 0.0],
        )
        .unwrap();
        assert_eq!(series.transition_times(), vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_text_transitions() {
        let series = SampleSeries::text(
            vec![0.0, 1.0, 2.0],
            vec!["OFF".into(), "OFF".into(), "ON".into()],
        )
        .unwrap();
        assert_eq!(series.transition_times(), vec![2.0]);
        assert!(series.summary().is_none());
    }

    #[test]
    fn test_nan_is_not_a_transition() {
        let series =
            SampleSeries::numeric(vec![0.0, 1.0, 2.0], vec![f64::NAN, f64::NAN, 1.0]).unwrap();
        assert_eq!(series.transition_times(), vec![2.0]);
    }

    #[test]
    fn test_summary() {
        let series =
            SampleSeries::numeric(vec![0.0, 1.0, 2.0, 3.0], vec![2.0, 4.0, f64::NAN, 6.0]).unwrap();
        let summary = series.summary().unwrap();
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 6.0);
        assert_eq!(summary.mean, 4.0);
    }

    #[test]
    fn test_sample_value_display() {
        assert_eq!(format!("{}", SampleValue::Numeric(3.14159)), "3.142");
        assert_eq!(format!("{}", SampleValue::Text("VF1".into())), "VF1");
        assert_eq!(SampleValue::Text(" 12.5 ".into()).as_f64(), Some(12.5));
    }
}
