//! Vehicle metadata: VIN, test vehicle ("mulet") number and test date

use crate::types::{Result, SampleValue, Timestamp};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;

/// Metadata shown in the report header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleInfo {
    pub vin: Option<String>,
    pub mulet: Option<String>,
    pub test_date: NaiveDate,
}

/// Compiled patterns for metadata extraction
pub struct MetadataExtractor {
    comment_vin: Regex,
    bare_vin: Regex,
    mulet_patterns: Vec<Regex>,
    any_number: Regex,
}

impl MetadataExtractor {
    pub fn new() -> Result<Self> {
        let mulet_patterns = [
            r"[Mm]ulet[_\s-]*(\d+)",
            r"[Mm](\d{3,})",
            r"[Vv]ehicule[_\s-]*(\d+)",
            r"[Pp]rototype[_\s-]*(\d+)",
            r"_(\d{3,})_",
            r"^(\d{3,})_",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            comment_vin: Regex::new(r"(?i)VIN[:\s]*([A-HJ-NPR-Z0-9]{17})")?,
            bare_vin: Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$")?,
            mulet_patterns,
            any_number: Regex::new(r"\d{3,}")?,
        })
    }

    /// VIN announced in a free-text comment (`VIN: ...`)
    pub fn vin_from_comment(&self, comment: &str) -> Option<String> {
        self.comment_vin
            .captures(comment)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// A complete 17-character VIN, nothing else
    pub fn is_vin(&self, value: &str) -> bool {
        self.bare_vin.is_match(value)
    }

    /// VIN from the first sample of a channel, if that sample is one
    pub fn vin_from_sample(&self, sample: &SampleValue) -> Option<String> {
        sample
            .as_text()
            .map(str::trim)
            .filter(|s| self.is_vin(s))
            .map(String::from)
    }

    /// Test vehicle number from a file name, formatted `M<digits>`
    pub fn mulet_from_filename(&self, filename: &str) -> Option<String> {
        let basename = std::path::Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        self.mulet_patterns
            .iter()
            .find_map(|re| re.captures(&basename).and_then(|c| c.get(1)))
            .or_else(|| self.any_number.find(&basename))
            .map(|m| format!("M{}", m.as_str()))
    }
}

/// Recording start date, else today
pub fn test_date(start_time: Option<Timestamp>) -> NaiveDate {
    start_time.unwrap_or_else(Utc::now).date_naive()
}
