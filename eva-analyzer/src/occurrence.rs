//! Scenario occurrence extraction
//!
//! The time window of a scenario comes from the value transitions of one
//! representative signal: first transition to last transition. When no
//! recorded signal gives a window, filename rules supply placeholder
//! windows marked [`OccurrenceStatus::Partial`].

use crate::config::{FallbackRule, FallbackWindow, ScenarioDefinition};
use crate::scenario::find_present;
use crate::session::{AnalysisSession, FetchOutcome};
use crate::types::SampleSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OccurrenceStatus {
    /// Window derived from recorded transitions
    Detectable,
    /// Placeholder window from filename rules
    Partial,
    Unavailable,
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceStatus::Detectable => write!(f, "DETECTABLE"),
            OccurrenceStatus::Partial => write!(f, "PARTIAL"),
            OccurrenceStatus::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}

/// One time-bounded instance of a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub scenario: String,
    /// Position among the scenario's occurrences, from 0
    pub index: usize,
    /// Seconds from the start of the recording
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub duration: Option<f64>,
    pub status: OccurrenceStatus,
    /// Channel the window was derived from
    pub channel: Option<String>,
    pub note: String,
}

impl Occurrence {
    fn window(scenario: &str, index: usize, start: f64, end: f64, status: OccurrenceStatus) -> Self {
        Self {
            scenario: scenario.to_string(),
            index,
            start: Some(start),
            end: Some(end),
            duration: Some(end - start),
            status,
            channel: None,
            note: String::new(),
        }
    }

    fn unavailable(scenario: &str, note: impl Into<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            index: 0,
            start: None,
            end: None,
            duration: None,
            status: OccurrenceStatus::Unavailable,
            channel: None,
            note: note.into(),
        }
    }
}

/// Start and end of the value changes in a series
///
/// With a single transition the end is `start + single_transition_offset`.
/// `None` when the value never changes.
pub fn transition_window(series: &SampleSeries, single_transition_offset: f64) -> Option<(f64, f64)> {
    let transitions = series.transition_times();
    let (&start, &last) = (transitions.first()?, transitions.last()?);
    if transitions.len() == 1 {
        Some((start, start + single_transition_offset))
    } else {
        Some((start, last))
    }
}

/// Placeholder windows the filename rules give for a scenario
///
/// The first rule whose scenario keyword appears in the scenario name and
/// one of whose filename keywords appears in the file name applies.
/// Comparisons ignore case.
pub fn fallback_windows<'r>(
    scenario_name: &str,
    filename: &str,
    rules: &'r [FallbackRule],
) -> Vec<&'r FallbackWindow> {
    let scenario = scenario_name.to_lowercase();
    let file = filename.to_lowercase();
    let in_file = |keywords: &[String]| keywords.iter().any(|k| file.contains(&k.to_lowercase()));

    rules
        .iter()
        .find(|rule| {
            scenario.contains(&rule.scenario_keyword.to_lowercase())
                && in_file(rule.filename_keywords.as_slice())
        })
        .map(|rule| {
            rule.windows
                .iter()
                .filter(|w| w.requires_filename.is_empty() || in_file(w.requires_filename.as_slice()))
                .collect()
        })
        .unwrap_or_default()
}

/// Signal name whose transitions delimit the scenario
fn representative_signal(scenario: &ScenarioDefinition, session: &AnalysisSession<'_>) -> Option<String> {
    if let Some(name) = &scenario.representative {
        return Some(name.clone());
    }
    let catalog = session.catalog();
    scenario
        .required_signals
        .iter()
        .find_map(|token| find_present(token, session.presence(), &catalog.signals))
        .map(|presence| presence.canonical_name.clone())
}

/// Occurrences of a scenario in the session's recording
///
/// Always returns at least one occurrence; with neither a transition window
/// nor a fallback window it is a single `Unavailable` entry.
pub fn extract_occurrences(
    scenario: &ScenarioDefinition,
    detectable: bool,
    session: &mut AnalysisSession<'_>,
    filename_hint: &str,
) -> Vec<Occurrence> {
    let config = &session.catalog().occurrences;
    let mut reason = if detectable {
        "no representative signal".to_string()
    } else {
        "scenario not detectable".to_string()
    };

    if detectable {
        if let Some(signal) = representative_signal(scenario, session) {
            match session.get_series(&signal) {
                FetchOutcome::Found(data) => {
                    match transition_window(&data.series, config.single_transition_offset_s) {
                        Some((start, end)) => {
                            log::debug!(
                                "'{}': window {:.3}s - {:.3}s from '{}'",
                                scenario.name,
                                start,
                                end,
                                data.channel
                            );
                            let mut occurrence =
                                Occurrence::window(&scenario.name, 0, start, end, OccurrenceStatus::Detectable);
                            occurrence.channel = Some(data.channel.clone());
                            return vec![occurrence];
                        }
                        None => reason = format!("no transition on '{}'", data.channel),
                    }
                }
                FetchOutcome::Unresolved => reason = format!("'{}' not resolved", signal),
                FetchOutcome::Empty { channel } => reason = format!("'{}' has no samples", channel),
                FetchOutcome::Failed { channel, reason: why } => {
                    reason = format!("'{}' unreadable: {}", channel, why)
                }
            }
        }
    }

    let windows = fallback_windows(&scenario.name, filename_hint, &config.fallback_rules);
    if windows.is_empty() {
        log::debug!("'{}': no occurrence ({})", scenario.name, reason);
        return vec![Occurrence::unavailable(&scenario.name, reason)];
    }

    log::debug!(
        "'{}': {} placeholder window(s) from file name ({})",
        scenario.name,
        windows.len(),
        reason
    );
    windows
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let mut occurrence =
                Occurrence::window(&scenario.name, i, w.start_s, w.end_s, OccurrenceStatus::Partial);
            occurrence.note = w.note.clone();
            occurrence
        })
        .collect()
}

/// Format seconds as `HH:MM:SS.mmm`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--:--.---".to_string();
    }
    let total_ms = (seconds * 1000.0).round() as u64;
    let (hours, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    let (secs, ms) = (rem / 1000, rem % 1000);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Catalog, CanonicalSignal, SignalRegistry};
    use crate::recording::MemoryRecording;

    fn series(timestamps: &[f64], samples: &[f64]) -> SampleSeries {
        SampleSeries::numeric(timestamps.to_vec(), samples.to_vec()).unwrap()
    }

    fn catalog(scenario: ScenarioDefinition) -> Catalog {
        Catalog::new(
            SignalRegistry::new(vec![
                CanonicalSignal::new("A1", "HEVC_WakeUpSleepCommand"),
                CanonicalSignal::new("A2", "VehicleSpeed"),
            ]),
            vec![scenario],
        )
    }

    #[test]
    fn test_transition_window() {
        let s = series(&[0.0, 1.0, 2.0, 2.5, 3.0, 4.0], &[0.0, 1.0, 1.0, 2.0, 2.0, 0.0]);
        assert_eq!(transition_window(&s, 60.0), Some((1.0, 4.0)));

        let single = series(&[0.0, 5.0, 6.0], &[0.0, 1.0, 1.0]);
        assert_eq!(transition_window(&single, 60.0), Some((5.0, 65.0)));

        let flat = series(&[0.0, 1.0], &[3.0, 3.0]);
        assert_eq!(transition_window(&flat, 60.0), None);
    }

    #[test]
    fn test_detected_occurrence() {
        let scenario = ScenarioDefinition::new("UC 1.1 - Endo-Réveil", ["HEVC_WakeUpSleepCommand"]);
        let catalog = catalog(scenario.clone());
        let recording = MemoryRecording::builder()
            .channel(
                "HEVC_WakeUpSleepCommand",
                series(&[0.0, 1.0, 2.5, 4.0], &[0.0, 1.0, 2.0, 0.0]),
            )
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "Reveil_01.json");

        let occurrences = session.extract_occurrences(&scenario);
        assert_eq!(occurrences.len(), 1);
        let occ = &occurrences[0];
        assert_eq!(occ.status, OccurrenceStatus::Detectable);
        assert_eq!(occ.start, Some(1.0));
        assert_eq!(occ.end, Some(4.0));
        assert_eq!(occ.duration, Some(3.0));
        assert_eq!(occ.channel.as_deref(), Some("HEVC_WakeUpSleepCommand"));
    }

    #[test]
    fn test_filename_fallback_when_undetectable() {
        let scenario = ScenarioDefinition::new("UC 1.2 - Traction - Roulage", ["VehicleSpeed"]);
        let catalog = catalog(scenario.clone());
        let recording = MemoryRecording::builder().build();
        let mut session =
            AnalysisSession::new(&catalog, Box::new(recording), "M123_roulage_ChargeDC.json");

        let occurrences = session.extract_occurrences(&scenario);
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|o| o.status == OccurrenceStatus::Partial));
        assert_eq!(occurrences[0].start, Some(130.0));
        assert_eq!(occurrences[1].index, 1);
        assert_eq!(occurrences[1].start, Some(1125.2));
    }

    #[test]
    fn test_second_traction_window_needs_charge_dc() {
        let rules = crate::config::OccurrenceConfig::default().fallback_rules;
        let windows = fallback_windows("UC 1.2 - Traction - Roulage", "traction_run.mf4", &rules);
        assert_eq!(windows.len(), 1);
        assert!(fallback_windows("UC 1.2 - Traction - Roulage", "bench.json", &rules).is_empty());
    }

    #[test]
    fn test_flat_signal_falls_back() {
        let scenario = ScenarioDefinition::new("UC 1.3 - CHG AC", ["VehicleSpeed"]);
        let catalog = catalog(scenario.clone());
        let recording = MemoryRecording::builder()
            .channel("VehicleSpeed", series(&[0.0, 1.0], &[0.0, 0.0]))
            .build();

        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "chg_ac.json");
        let occurrences = session.extract_occurrences(&scenario);
        assert_eq!(occurrences[0].status, OccurrenceStatus::Partial);
        assert_eq!(occurrences[0].start, Some(1800.0));

        let recording = MemoryRecording::builder()
            .channel("VehicleSpeed", series(&[0.0, 1.0], &[0.0, 0.0]))
            .build();
        let mut session = AnalysisSession::new(&catalog, Box::new(recording), "bench.json");
        let occurrences = session.extract_occurrences(&scenario);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].status, OccurrenceStatus::Unavailable);
        assert_eq!(occurrences[0].start, None);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00:00.000");
        assert_eq!(format_time(3725.5), "01:02:05.500");
        assert_eq!(format_time(931.7), "00:15:31.700");
        assert_eq!(format_time(f64::NAN), "--:--:--.---");
    }
}
