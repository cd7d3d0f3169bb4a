//! CAN trace to recording conversion
//!
//! Decodes the frames of a CAN trace with DBC definitions and lays the
//! result out like a measurement file: one channel group per observed
//! message (ordered by CAN id), one channel per DBC signal of that message.
//! Timestamps stay relative to the measurement start.

use super::blf::{self, CanFrame};
use super::{MemoryRecording, MemoryRecordingBuilder};
use crate::message_decoder::MessageDecoder;
use crate::signals::{dbc, MessageDefinition, SignalDatabase};
use crate::types::{Result, SampleSeries};
use std::collections::BTreeMap;
use std::path::Path;

/// Decodes CAN traces into recordings
#[derive(Debug, Default)]
pub struct CanLogDecoder {
    database: SignalDatabase,
}

/// Samples collected for one signal
#[derive(Debug, Default)]
struct SignalSamples {
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl CanLogDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a DBC file into the signal database
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        for message in dbc::parse_dbc_file(path)? {
            self.database.add_message(message);
        }
        let stats = self.database.stats();
        log::debug!(
            "Signal database: {} messages, {} signals",
            stats.num_messages,
            stats.num_signals
        );
        Ok(())
    }

    /// Add message definitions directly
    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = MessageDefinition>) {
        for message in messages {
            self.database.add_message(message);
        }
    }

    /// Decode a BLF trace
    pub fn decode_file(&self, path: &Path) -> Result<MemoryRecording> {
        if self.database.is_empty() {
            log::warn!("No DBC loaded; {:?} will decode to an empty recording", path);
        }
        let frames = blf::read_frames(path)?;
        Ok(self.decode_frames(frames))
    }

    /// Decode a stream of frames
    ///
    /// Frames without a DBC definition and remote frames are skipped.
    pub fn decode_frames(&self, frames: impl IntoIterator<Item = CanFrame>) -> MemoryRecording {
        // Key: CAN id, Value: (message, samples per signal)
        let mut observed: BTreeMap<u32, (&MessageDefinition, Vec<SignalSamples>)> = BTreeMap::new();
        let mut total_frames = 0usize;
        let mut unknown_frames = 0usize;

        for frame in frames {
            total_frames += 1;
            if frame.is_remote_frame {
                continue;
            }
            let Some(message) = self.database.get_message(frame.can_id) else {
                unknown_frames += 1;
                continue;
            };

            let (_, samples) = observed.entry(frame.can_id).or_insert_with(|| {
                let samples = message.signals.iter().map(|_| SignalSamples::default()).collect();
                (message, samples)
            });

            let time = frame.time_s();
            for (signal_idx, value) in MessageDecoder::decode(&frame.data, message) {
                if let Some(signal) = samples.get_mut(signal_idx) {
                    signal.timestamps.push(time);
                    signal.values.push(value);
                }
            }
        }

        log::info!(
            "Decoded {} frames ({} without definition) into {} messages",
            total_frames,
            unknown_frames,
            observed.len()
        );

        let mut builder = MemoryRecordingBuilder::default();
        for (message, samples) in observed.into_values() {
            builder.push_group();
            for (signal, collected) in message.signals.iter().zip(samples) {
                match SampleSeries::numeric(collected.timestamps, collected.values) {
                    Ok(series) => builder.push_channel(signal.name.clone(), series),
                    Err(e) => log::warn!("Dropping signal '{}': {}", signal.name, e),
                }
            }
        }
        builder.build()
    }
}
