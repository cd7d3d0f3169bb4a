//! JSON channel dumps
//!
//! A dump is a measurement exported channel by channel:
//!
//! ```json
//! {
//!   "header_comment": "VIN: VF1AG000123456789",
//!   "start_time": "2025-03-14T08:30:00Z",
//!   "groups": [
//!     { "channels": [
//!         { "name": "VehicleSpeed", "timestamps": [0.0, 0.1], "samples": [0.0, 1.5] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! `samples` holds either numbers or strings.

use super::{MemoryRecording, MemoryRecordingBuilder};
use crate::types::{AnalyzerError, Result, SampleSeries, SampleValues, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelDump {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default)]
    pub groups: Vec<GroupDump>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupDump {
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    pub timestamps: Vec<f64>,
    pub samples: SampleValues,
}

impl ChannelDump {
    pub fn into_recording(self) -> Result<MemoryRecording> {
        let mut builder = MemoryRecordingBuilder::default();
        if let Some(comment) = self.header_comment {
            builder = builder.with_header_comment(comment);
        }
        if let Some(start) = self.start_time {
            builder = builder.with_start_time(start);
        }

        for group in self.groups {
            builder.push_group();
            for channel in group.channels {
                let series = SampleSeries::new(channel.timestamps, channel.samples).map_err(|e| {
                    AnalyzerError::RecordingLoadError(format!("Channel '{}': {}", channel.name, e))
                })?;
                builder.push_channel(channel.name, series);
            }
        }

        Ok(builder.build())
    }
}

/// Load a JSON channel dump from disk
pub fn load_dump(path: &Path) -> Result<MemoryRecording> {
    let content = std::fs::read_to_string(path)?;
    let dump: ChannelDump = serde_json::from_str(&content).map_err(|e| {
        AnalyzerError::RecordingLoadError(format!("Failed to parse dump {:?}: {}", path, e))
    })?;
    dump.into_recording()
}
