//! Analysis report model
//!
//! Plain data handed to the renderers. Nothing here knows about output
//! formats.

use crate::occurrence::{Occurrence, OccurrenceStatus};
use crate::presence::SignalPresence;
use crate::requirements::{
    evaluate_equivalences, evaluate_requirements, EquivalenceRow, EquivalenceStatus,
    RequirementVerdict, Verdict,
};
use crate::scenario::ScenarioDetection;
use crate::session::{AnalysisSession, FetchOutcome};
use crate::types::{SampleValue, SeriesSummary, Timestamp};
use crate::vehicle::{self, MetadataExtractor, VehicleInfo};
use chrono::Utc;
use serde::Serialize;

/// Requirement verdicts for one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioVerdicts {
    pub scenario: String,
    pub detectable: bool,
    pub verdicts: Vec<RequirementVerdict>,
}

/// One document signal row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSignalRow {
    pub primary: String,
    pub secondary: String,
    pub found: bool,
    /// Name that produced the data (primary or secondary)
    pub used_name: Option<String>,
    pub channel: Option<String>,
    pub samples: usize,
    pub summary: Option<SeriesSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub signals_total: usize,
    pub signals_present: usize,
    pub scenarios_total: usize,
    pub scenarios_detectable: usize,
    pub occurrences_detected: usize,
    pub requirements_ok: usize,
    pub requirements_partial: usize,
    pub requirements_nok: usize,
    pub equivalences_ok: usize,
    pub document_rows_found: usize,
}

/// Everything one analysis session produced
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub source_file: String,
    pub generated_at: Timestamp,
    pub vehicle: VehicleInfo,
    pub channel_count: usize,
    pub signals: Vec<SignalPresence>,
    pub scenarios: Vec<ScenarioDetection>,
    pub occurrences: Vec<Occurrence>,
    pub requirements: Vec<ScenarioVerdicts>,
    pub equivalences: Vec<EquivalenceRow>,
    pub document_signals: Vec<DocumentSignalRow>,
    pub summary: ReportSummary,
}

/// VIN from the header comment, else from a VIN-like channel
fn find_vin(session: &AnalysisSession<'_>, extractor: &MetadataExtractor) -> Option<String> {
    let recording = session.recording();
    if let Some(vin) = recording.header_comment().and_then(|c| extractor.vin_from_comment(c)) {
        return Some(vin);
    }

    for vin_name in &session.catalog().vehicle.vin_signals {
        let vin_name = vin_name.to_lowercase();
        for channel in recording.channel_names() {
            if !channel.to_lowercase().contains(&vin_name) {
                continue;
            }
            let first = session
                .fetch_channel(channel)
                .ok()
                .and_then(|series| series.value_at(0));
            if let Some(vin) = first.as_ref().and_then(|s: &SampleValue| extractor.vin_from_sample(s)) {
                log::debug!("VIN read from channel '{}'", channel);
                return Some(vin);
            }
        }
    }
    None
}

fn vehicle_info(session: &AnalysisSession<'_>) -> VehicleInfo {
    let start_time = session.recording().start_time();
    match MetadataExtractor::new() {
        Ok(extractor) => VehicleInfo {
            vin: find_vin(session, &extractor),
            mulet: extractor.mulet_from_filename(&session.file_name()),
            test_date: vehicle::test_date(start_time),
        },
        Err(e) => {
            log::warn!("Vehicle metadata unavailable: {}", e);
            VehicleInfo {
                vin: None,
                mulet: None,
                test_date: vehicle::test_date(start_time),
            }
        }
    }
}

fn document_row(session: &mut AnalysisSession<'_>, primary: &str, secondary: &str) -> DocumentSignalRow {
    let mut row = DocumentSignalRow {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        found: false,
        used_name: None,
        channel: None,
        samples: 0,
        summary: None,
    };

    for name in [primary, secondary] {
        if let FetchOutcome::Found(data) = session.get_series(name) {
            row.found = true;
            row.used_name = Some(name.to_string());
            row.channel = Some(data.channel.clone());
            row.samples = data.series.len();
            row.summary = data.summary;
            break;
        }
    }
    row
}

/// Run every analysis step on a session
pub fn build_report(session: &mut AnalysisSession<'_>) -> AnalysisReport {
    let catalog = session.catalog();
    log::info!("Analysing {:?}", session.source());

    let vehicle = vehicle_info(session);

    let mut occurrences = Vec::new();
    for scenario in &catalog.scenarios {
        occurrences.extend(session.extract_occurrences(scenario));
    }

    let requirements: Vec<ScenarioVerdicts> = session
        .detectability()
        .iter()
        .map(|detection| ScenarioVerdicts {
            scenario: detection.scenario.clone(),
            detectable: detection.detectable,
            verdicts: evaluate_requirements(
                &catalog.requirements,
                &detection.scenario,
                detection.detectable,
            ),
        })
        .collect();

    let equivalences = evaluate_equivalences(&catalog.equivalences, session.channel_index());

    let document_signals: Vec<DocumentSignalRow> = catalog
        .document_signals
        .iter()
        .map(|pair| document_row(session, &pair.primary, &pair.secondary))
        .collect();

    let count_verdicts = |verdict: Verdict| {
        requirements
            .iter()
            .flat_map(|s| s.verdicts.iter())
            .filter(|v| v.verdict == verdict)
            .count()
    };

    let summary = ReportSummary {
        signals_total: session.presence().len(),
        signals_present: session.presence().present_count(),
        scenarios_total: session.detectability().len(),
        scenarios_detectable: session.detectability().detectable_count(),
        occurrences_detected: occurrences
            .iter()
            .filter(|o| o.status == OccurrenceStatus::Detectable)
            .count(),
        requirements_ok: count_verdicts(Verdict::Ok),
        requirements_partial: count_verdicts(Verdict::Partial),
        requirements_nok: count_verdicts(Verdict::Nok),
        equivalences_ok: equivalences
            .iter()
            .filter(|e| e.status == EquivalenceStatus::Ok)
            .count(),
        document_rows_found: document_signals.iter().filter(|r| r.found).count(),
    };

    log::info!(
        "Analysis complete: {}/{} signals, {}/{} scenarios detectable",
        summary.signals_present,
        summary.signals_total,
        summary.scenarios_detectable,
        summary.scenarios_total
    );

    AnalysisReport {
        source_file: session.file_name(),
        generated_at: Utc::now(),
        vehicle,
        channel_count: session.channel_index().len(),
        signals: session.presence().iter().cloned().collect(),
        scenarios: session.detectability().iter().cloned().collect(),
        occurrences,
        requirements,
        equivalences,
        document_signals,
        summary,
    }
}
