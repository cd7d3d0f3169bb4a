//! In-memory recording
//!
//! Channels are organised in groups like a measurement file: a name may
//! appear in several groups, each (group, index) pair holding its own series.

use super::Recording;
use crate::types::{AnalyzerError, ChannelLocation, Result, SampleSeries, Timestamp};
use std::collections::HashMap;

/// A recording held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRecording {
    groups: Vec<Vec<(String, SampleSeries)>>,
    /// Unique channel names in first-seen order
    names: Vec<String>,
    /// Key: channel name, Value: every location carrying it
    lookup: HashMap<String, Vec<ChannelLocation>>,
    header_comment: Option<String>,
    start_time: Option<Timestamp>,
}

impl MemoryRecording {
    pub fn builder() -> MemoryRecordingBuilder {
        MemoryRecordingBuilder::default()
    }

    /// Number of channel groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Recording for MemoryRecording {
    fn channel_names(&self) -> &[String] {
        &self.names
    }

    fn locations(&self, name: &str) -> Vec<ChannelLocation> {
        self.lookup.get(name).cloned().unwrap_or_default()
    }

    fn series_at(&self, name: &str, location: ChannelLocation) -> Result<SampleSeries> {
        self.groups
            .get(location.group)
            .and_then(|group| group.get(location.index))
            .filter(|(channel, _)| channel == name)
            .map(|(_, series)| series.clone())
            .ok_or_else(|| AnalyzerError::ChannelNotFound(format!("{} ({})", name, location)))
    }

    fn header_comment(&self) -> Option<&str> {
        self.header_comment.as_deref()
    }

    fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }
}

/// Builder for [`MemoryRecording`]
///
/// Channels are appended to the current group; [`new_group`](Self::new_group)
/// starts another one.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordingBuilder {
    groups: Vec<Vec<(String, SampleSeries)>>,
    header_comment: Option<String>,
    start_time: Option<Timestamp>,
}

impl MemoryRecordingBuilder {
    /// Builder method: start a new channel group
    pub fn new_group(mut self) -> Self {
        self.groups.push(Vec::new());
        self
    }

    /// Builder method: add a channel to the current group
    pub fn channel(mut self, name: impl Into<String>, series: SampleSeries) -> Self {
        self.push_channel(name, series);
        self
    }

    /// Add a channel to the current group
    pub fn push_channel(&mut self, name: impl Into<String>, series: SampleSeries) {
        if self.groups.is_empty() {
            self.groups.push(Vec::new());
        }
        if let Some(group) = self.groups.last_mut() {
            group.push((name.into(), series));
        }
    }

    /// Start a new channel group
    pub fn push_group(&mut self) {
        self.groups.push(Vec::new());
    }

    /// Builder method: set the header comment
    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comment = Some(comment.into());
        self
    }

    /// Builder method: set the measurement start time
    pub fn with_start_time(mut self, start_time: Timestamp) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn build(self) -> MemoryRecording {
        let mut names = Vec::new();
        let mut lookup: HashMap<String, Vec<ChannelLocation>> = HashMap::new();

        for (group_idx, group) in self.groups.iter().enumerate() {
            for (channel_idx, (name, _)) in group.iter().enumerate() {
                let locations = lookup.entry(name.clone()).or_default();
                if locations.is_empty() {
                    names.push(name.clone());
                }
                locations.push(ChannelLocation::new(group_idx, channel_idx));
            }
        }

        MemoryRecording {
            groups: self.groups,
            names,
            lookup,
            header_comment: self.header_comment,
            start_time: self.start_time,
        }
    }
}
