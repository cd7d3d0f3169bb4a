//! Analysis session
//!
//! One session per recording. It owns the recording, the resolver state and
//! the signal data cache; dropping the session releases all of them. Loading
//! a new recording means building a new session.

use crate::config::{Catalog, ScenarioDefinition};
use crate::occurrence::{self, Occurrence};
use crate::presence::{compute_presence, PresenceMap};
use crate::recording::{Recording, RecordingLoader};
use crate::report::{self, AnalysisReport};
use crate::resolve::{ChannelIndex, ChannelResolver, Resolution};
use crate::scenario::{compute_detectability, Detectability};
use crate::types::{Result, SampleSeries, SeriesSummary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A fetched series with its summary statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SignalData {
    /// Channel the series was read from
    pub channel: String,
    pub series: SampleSeries,
    pub summary: Option<SeriesSummary>,
}

/// Result of a series lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Rc<SignalData>),
    /// No channel matches the signal name
    Unresolved,
    /// The channel exists but holds no samples
    Empty { channel: String },
    /// The channel could not be read
    Failed { channel: String, reason: String },
}

impl FetchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }

    pub fn data(&self) -> Option<&SignalData> {
        match self {
            FetchOutcome::Found(data) => Some(data),
            _ => None,
        }
    }
}

pub struct AnalysisSession<'c> {
    catalog: &'c Catalog,
    recording: Box<dyn Recording>,
    source: PathBuf,
    index: ChannelIndex,
    resolver: ChannelResolver,
    presence: PresenceMap,
    detectability: Detectability,
    /// Key: signal name as requested, Value: fetched data. Misses are not stored.
    cache: HashMap<String, Rc<SignalData>>,
}

impl<'c> AnalysisSession<'c> {
    /// Load a recording and start a session on it
    ///
    /// A load failure is the only error a session reports.
    pub fn open(catalog: &'c Catalog, loader: &dyn RecordingLoader, path: &Path) -> Result<Self> {
        let recording = loader.load(path)?;
        Ok(Self::new(catalog, recording, path))
    }

    /// Start a session on an already loaded recording
    pub fn new(catalog: &'c Catalog, recording: Box<dyn Recording>, source: impl Into<PathBuf>) -> Self {
        let index = ChannelIndex::new(recording.channel_names().iter().cloned());
        log::info!("Session started: {} channels", index.len());

        let resolver = ChannelResolver::new(&catalog.resolver);
        let presence = compute_presence(&catalog.signals, &index, &resolver);
        let detectability = compute_detectability(&catalog.scenarios, &presence, &catalog.signals);

        Self {
            catalog,
            recording,
            source: source.into(),
            index,
            resolver,
            presence,
            detectability,
            cache: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn recording(&self) -> &dyn Recording {
        self.recording.as_ref()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the recording, used for filename heuristics
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn channel_index(&self) -> &ChannelIndex {
        &self.index
    }

    pub fn presence(&self) -> &PresenceMap {
        &self.presence
    }

    pub fn detectability(&self) -> &Detectability {
        &self.detectability
    }

    /// Resolve a signal name against this recording's channels
    pub fn resolve(&self, signal_name: &str) -> Option<Resolution> {
        self.resolver.resolve(signal_name, &self.index)
    }

    /// Fetch the series behind a signal name, through the cache
    pub fn get_series(&mut self, signal_name: &str) -> FetchOutcome {
        if let Some(data) = self.cache.get(signal_name) {
            return FetchOutcome::Found(Rc::clone(data));
        }

        let Some(resolution) = self.resolve(signal_name) else {
            return FetchOutcome::Unresolved;
        };
        let channel = resolution.channel;

        let series = match self.fetch_channel(&channel) {
            Ok(series) => series,
            Err(e) => {
                log::warn!("Failed to read channel '{}': {}", channel, e);
                return FetchOutcome::Failed {
                    channel,
                    reason: e.to_string(),
                };
            }
        };

        if series.is_empty() {
            log::debug!("Channel '{}' has no samples", channel);
            return FetchOutcome::Empty { channel };
        }

        let data = Rc::new(SignalData {
            summary: series.summary(),
            channel,
            series,
        });
        self.cache.insert(signal_name.to_string(), Rc::clone(&data));
        FetchOutcome::Found(data)
    }

    /// Read a channel by its exact name
    ///
    /// When the plain lookup fails (the name occurs in several groups, for
    /// instance) the first occurrence is read instead.
    pub fn fetch_channel(&self, channel: &str) -> Result<SampleSeries> {
        match self.recording.series(channel) {
            Ok(series) => Ok(series),
            Err(e) => {
                let Some(first) = self.recording.locations(channel).first().copied() else {
                    return Err(e);
                };
                log::debug!("'{}': {}; using {}", channel, e, first);
                self.recording.series_at(channel, first)
            }
        }
    }

    /// Occurrences of one scenario in this recording
    pub fn extract_occurrences(&mut self, scenario: &ScenarioDefinition) -> Vec<Occurrence> {
        let detectable = self.detectability.is_detectable(&scenario.name);
        let filename = self.file_name();
        occurrence::extract_occurrences(scenario, detectable, self, &filename)
    }

    /// Run the complete analysis
    pub fn run(&mut self) -> AnalysisReport {
        report::build_report(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::MemoryRecording;
    use crate::config::{CanonicalSignal, SignalRegistry};

    fn catalog() -> Catalog {
        Catalog::new(
            SignalRegistry::new(vec![CanonicalSignal::new("A1", "VehicleSpeed")]),
            vec![ScenarioDefinition::new("Driving", ["VehicleSpeed"])],
        )
    }

    fn numeric(samples: &[f64]) -> SampleSeries {
        let timestamps = (0..samples.len()).map(|i| i as f64).collect();
        SampleSeries::numeric(timestamps, samples.to_vec()).unwrap()
    }

    #[test]
    fn test_fetch_resolves_and_summarises() {
        let catalog = catalog();
        let recording = MemoryRecording::builder()
            .channel("ESP_VehicleSpeed", numeric(&[0.0, 10.0, 20.0]))
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "drive.json");

        let outcome = session.get_series("VehicleSpeed");
        let data = outcome.data().unwrap();
        assert_eq!(data.channel, "ESP_VehicleSpeed");
        assert_eq!(data.summary.unwrap().mean, 10.0);
        assert!(session.detectability().is_detectable("Driving"));
    }

    #[test]
    fn test_cache_returns_same_data() {
        let catalog = catalog();
        let recording = MemoryRecording::builder()
            .channel("VehicleSpeed", numeric(&[1.0, 2.0]))
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "drive.json");

        let (FetchOutcome::Found(first), FetchOutcome::Found(second)) =
            (session.get_series("VehicleSpeed"), session.get_series("VehicleSpeed"))
        else {
            panic!("expected cached data");
        };
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_ambiguous_channel_uses_first_occurrence() {
        let catalog = catalog();
        let recording = MemoryRecording::builder()
            .channel("VehicleSpeed", numeric(&[1.0]))
            .new_group()
            .channel("VehicleSpeed", numeric(&[2.0, 3.0]))
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "drive.json");

        let outcome = session.get_series("VehicleSpeed");
        assert_eq!(outcome.data().unwrap().series.len(), 1);
    }

    #[test]
    fn test_empty_and_unresolved() {
        let catalog = catalog();
        let recording = MemoryRecording::builder()
            .channel("VehicleSpeed", numeric(&[]))
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "drive.json");

        assert_eq!(
            session.get_series("VehicleSpeed"),
            FetchOutcome::Empty {
                channel: "VehicleSpeed".to_string()
            }
        );
        assert_eq!(session.get_series("Nonexistent_Signal_XYZ"), FetchOutcome::Unresolved);
        assert_eq!(session.get_series(""), FetchOutcome::Unresolved);
    }
}
