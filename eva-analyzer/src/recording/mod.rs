//! Measurement recordings
//!
//! A [`Recording`] exposes the channel names of a measurement file and the
//! sample series behind each channel occurrence. Loaders turn files into
//! recordings; the analysis never looks at file bytes itself.
//!
//! Supported inputs:
//! - `.json` channel dumps (see [`dump`])
//! - `.blf` CAN traces decoded with DBC signal definitions (see [`can_log`])

use crate::types::{AnalyzerError, ChannelLocation, Result, SampleSeries, Timestamp};
use std::path::{Path, PathBuf};

pub mod blf;
pub mod can_log;
pub mod dump;
mod memory;

pub use memory::{MemoryRecording, MemoryRecordingBuilder};

/// A loaded measurement file
pub trait Recording {
    /// Channel names in the order the file lists them, each name once
    fn channel_names(&self) -> &[String];

    /// Every occurrence of a channel name
    fn locations(&self, name: &str) -> Vec<ChannelLocation>;

    /// Fetch one specific occurrence of a channel
    fn series_at(&self, name: &str, location: ChannelLocation) -> Result<SampleSeries>;

    /// Fetch a channel by name alone
    ///
    /// Fails with [`AnalyzerError::AmbiguousChannel`] when the name occurs
    /// more than once; callers pick a location themselves in that case.
    fn series(&self, name: &str) -> Result<SampleSeries> {
        match self.locations(name).as_slice() {
            [] => Err(AnalyzerError::ChannelNotFound(name.to_string())),
            [location] => self.series_at(name, *location),
            many => Err(AnalyzerError::AmbiguousChannel {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Free-text file header comment, if the format has one
    fn header_comment(&self) -> Option<&str> {
        None
    }

    /// Absolute measurement start, if known
    fn start_time(&self) -> Option<Timestamp> {
        None
    }
}

/// Opens measurement files
pub trait RecordingLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Recording>>;
}

/// Loader dispatching on the file extension
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    /// DBC files used to decode CAN traces
    dbc_files: Vec<PathBuf>,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a DBC file for CAN trace decoding
    pub fn with_dbc(mut self, path: impl Into<PathBuf>) -> Self {
        self.dbc_files.push(path.into());
        self
    }

    /// Builder method: add several DBC files
    pub fn with_dbc_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dbc_files.extend(paths.into_iter().map(Into::into));
        self
    }
}

impl RecordingLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Recording>> {
        log::info!("Loading recording: {:?}", path);

        if !path.exists() {
            return Err(AnalyzerError::RecordingLoadError(format!(
                "Recording not found: {:?}",
                path
            )));
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        let recording = match extension.as_deref() {
            Some("json") => {
                log::debug!("Detected channel dump format");
                dump::load_dump(path)?
            }
            Some("blf") => {
                log::debug!("Detected BLF file format");
                let mut decoder = can_log::CanLogDecoder::new();
                for dbc in &self.dbc_files {
                    decoder.add_dbc(dbc)?;
                }
                decoder.decode_file(path)?
            }
            _ => {
                return Err(AnalyzerError::UnsupportedFormat(format!(
                    "{:?} (extension {:?})",
                    path, extension
                )))
            }
        };

        log::info!(
            "Recording loaded: {} channels in {} groups",
            recording.channel_names().len(),
            recording.group_count()
        );
        Ok(Box::new(recording))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.mf4");
        std::fs::write(&path, b"MDF     4.10").unwrap();

        let result = FileLoader::new().load(&path);
        assert!(matches!(result, Err(AnalyzerError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = FileLoader::new().load(Path::new("nonexistent.json"));
        assert!(matches!(result, Err(AnalyzerError::RecordingLoadError(_))));
    }

    #[test]
    fn test_series_ambiguity() {
        let series = SampleSeries::numeric(vec![0.0], vec![1.0]).unwrap();
        let recording = MemoryRecording::builder()
            .channel("Speed", series.clone())
            .new_group()
            .channel("Speed", series.clone())
            .channel("Torque", series)
            .build();

        assert!(matches!(
            recording.series("Speed"),
            Err(AnalyzerError::AmbiguousChannel { count: 2, .. })
        ));
        assert!(recording.series("Torque").is_ok());
        assert!(matches!(
            recording.series("Missing"),
            Err(AnalyzerError::ChannelNotFound(_))
        ));
    }
}
