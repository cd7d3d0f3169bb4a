//! BLF (Binary Log Format) frame reader
//!
//! Reads Vector BLF traces with the `ablf` crate. Only CAN frames (object
//! type 86) are extracted; log containers are unpacked by `ablf` and every
//! other object type is skipped.

use crate::types::{AnalyzerError, Result};
use ablf::{BlfFile, ObjectTypes};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A raw CAN frame read from a trace
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Nanoseconds since the start of the measurement
    pub timestamp_ns: u64,
    pub channel: u16,
    /// Arbitration id as stored in the trace (extended ids keep bit 31 set)
    pub can_id: u32,
    pub data: Vec<u8>,
    pub is_remote_frame: bool,
}

impl CanFrame {
    /// Timestamp in seconds since the start of the measurement
    pub fn time_s(&self) -> f64 {
        self.timestamp_ns as f64 / 1e9
    }
}

/// Open a BLF file and iterate over its CAN frames
pub fn read_frames(path: &Path) -> Result<BlfFrameIterator> {
    log::info!("Parsing BLF file: {:?}", path);

    let file = File::open(path).map_err(|e| {
        AnalyzerError::RecordingLoadError(format!("Failed to open BLF file {:?}: {}", path, e))
    })?;

    let blf = BlfFile::from_reader(BufReader::new(file)).map_err(|(e, _)| {
        AnalyzerError::RecordingLoadError(format!("Failed to parse BLF file {:?}: {}", path, e))
    })?;

    if !blf.is_valid() {
        return Err(AnalyzerError::RecordingLoadError(format!(
            "Invalid BLF file format: {:?}",
            path
        )));
    }

    Ok(BlfFrameIterator {
        objects: blf.into_iter(),
        skipped_types: HashSet::new(),
    })
}

/// Iterator over the CAN frames of a BLF file
pub struct BlfFrameIterator {
    objects: ablf::ObjectIterator<BufReader<File>>,
    skipped_types: HashSet<u32>,
}

impl Iterator for BlfFrameIterator {
    type Item = CanFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let obj = self.objects.next()?;
            match obj.data {
                ObjectTypes::CanMessage86(msg) => {
                    return Some(CanFrame {
                        timestamp_ns: msg.header.timestamp_ns,
                        channel: msg.channel,
                        can_id: msg.id,
                        data: msg.data,
                        is_remote_frame: (msg.flags & 0x04) != 0,
                    });
                }
                _ => {
                    if self.skipped_types.insert(obj.object_type) {
                        log::debug!("Skipping BLF object type {}", obj.object_type);
                    }
                    continue;
                }
            }
        }
    }
}
