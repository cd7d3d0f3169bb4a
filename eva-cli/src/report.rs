//! Report writers
//!
//! Renders an [`AnalysisReport`] as plain text (ASCII tables) or pretty JSON.

use crate::config::OutputFormat;
use anyhow::{Context, Result};
use eva_analyzer::report::AnalysisReport;
use eva_analyzer::format_time;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn time_or_dash(value: Option<f64>) -> String {
    value.map(format_time).unwrap_or_else(|| "-".to_string())
}

/// Plain text rendering
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_text(&mut out, report);
    out
}

fn write_text(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  EVA Analysis Report - {}", report.source_file)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Generated:  {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "VIN:        {}", or_dash(report.vehicle.vin.as_deref()))?;
    writeln!(out, "Mulet:      {}", or_dash(report.vehicle.mulet.as_deref()))?;
    writeln!(out, "Test date:  {}", report.vehicle.test_date.format("%d/%m/%Y"))?;
    writeln!(out, "Channels:   {}", report.channel_count)?;

    let s = &report.summary;
    writeln!(out, "\nSummary")?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "  Signals present:       {}/{}", s.signals_present, s.signals_total)?;
    writeln!(out, "  Scenarios detectable:  {}/{}", s.scenarios_detectable, s.scenarios_total)?;
    writeln!(out, "  Occurrences detected:  {}", s.occurrences_detected)?;
    writeln!(
        out,
        "  Requirements:          {} OK / {} PARTIAL / {} NOK",
        s.requirements_ok, s.requirements_partial, s.requirements_nok
    )?;
    writeln!(out, "  Equivalences OK:       {}", s.equivalences_ok)?;
    writeln!(out, "  Document signals:      {}/{}", s.document_rows_found, report.document_signals.len())?;

    writeln!(out, "\nScenarios")?;
    writeln!(out, "{}", THIN_RULE)?;
    for scenario in &report.scenarios {
        let mark = if scenario.detectable { "✓" } else { "✗" };
        match &scenario.missing_signal {
            Some(missing) => writeln!(out, "  {} {} (missing: {})", mark, scenario.scenario, missing)?,
            None => writeln!(out, "  {} {}", mark, scenario.scenario)?,
        }
    }

    writeln!(out, "\nOccurrences")?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(
        out,
        "  {:<32} {:>3} {:>13} {:>13} {:>10}  {}",
        "Scenario", "#", "Start", "End", "Duration", "Status"
    )?;
    for occ in &report.occurrences {
        writeln!(
            out,
            "  {:<32} {:>3} {:>13} {:>13} {:>10}  {}{}",
            occ.scenario,
            occ.index + 1,
            time_or_dash(occ.start),
            time_or_dash(occ.end),
            occ.duration.map(|d| format!("{:.1}s", d)).unwrap_or_else(|| "-".to_string()),
            occ.status,
            if occ.note.is_empty() { String::new() } else { format!(" ({})", occ.note) }
        )?;
    }

    writeln!(out, "\nSignals")?;
    writeln!(out, "{}", THIN_RULE)?;
    for signal in &report.signals {
        let tier = signal.tier.map(|t| t.to_string()).unwrap_or_default();
        writeln!(
            out,
            "  {:<5} {:<36} {:<36} {}",
            signal.id,
            signal.canonical_name,
            or_dash(signal.channel.as_deref()),
            tier
        )?;
    }

    writeln!(out, "\nDocument signals")?;
    writeln!(out, "{}", THIN_RULE)?;
    for row in &report.document_signals {
        let stats = row
            .summary
            .map(|s| format!("min {:.3}  max {:.3}  mean {:.3}", s.min, s.max, s.mean))
            .unwrap_or_default();
        writeln!(
            out,
            "  {:<36} {:<36} {}",
            row.primary,
            or_dash(row.channel.as_deref()),
            stats
        )?;
    }

    writeln!(out, "\nSignal equivalences")?;
    writeln!(out, "{}", THIN_RULE)?;
    for row in &report.equivalences {
        writeln!(out, "  {:<36} {:<36} {:?}", row.signal, row.equivalent, row.status)?;
    }

    writeln!(out, "\nRequirements")?;
    writeln!(out, "{}", THIN_RULE)?;
    for scenario in &report.requirements {
        writeln!(out, "  {}", scenario.scenario)?;
        for verdict in &scenario.verdicts {
            writeln!(
                out,
                "    {:<36} {:<8} {}",
                verdict.requirement,
                format!("{:?}", verdict.priority),
                verdict.verdict
            )?;
        }
    }

    Ok(())
}

/// Pretty JSON rendering
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
    }
}

/// Report file path for a recording: `<stem>_eva_report.<ext>`
pub fn report_path(output_dir: &Path, recording: &Path, format: OutputFormat) -> PathBuf {
    let stem = recording
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    output_dir.join(format!("{}_eva_report.{}", stem, format.extension()))
}

/// Write a report into `output_dir`, returning the file written
pub fn write_report(
    report: &AnalysisReport,
    recording: &Path,
    format: OutputFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let path = report_path(output_dir, recording, format);
    let content = render(report, format)?;
    fs::write(&path, content).with_context(|| format!("Failed to write report: {:?}", path))?;
    log::info!("Report written: {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eva_analyzer::types::SampleSeries;
    use eva_analyzer::{AnalysisSession, Catalog, MemoryRecording};

    fn report() -> AnalysisReport {
        let catalog = Catalog::builtin();
        let recording = MemoryRecording::builder()
            .channel(
                "BMS_HVNetworkVoltage_BLMS",
                SampleSeries::numeric(vec![0.0, 1.0], vec![380.0, 400.0]).unwrap(),
            )
            .build();
        AnalysisSession::new(&catalog, Box::new(recording), "M42_Reveil.json").run()
    }

    #[test]
    fn test_text_report_sections() {
        let text = render_text(&report());
        assert!(text.contains("EVA Analysis Report - M42_Reveil.json"));
        assert!(text.contains("Mulet:      M42"));
        assert!(text.contains("UC 1.1 - Endo-Réveil"));
        assert!(text.contains("00:00:15.500"));
        assert!(text.contains("BMS_HVNetworkVoltage_BLMS"));
    }

    #[test]
    fn test_json_report_parses_back() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source_file"], "M42_Reveil.json");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let path = write_report(&report(), Path::new("/data/M42_Reveil.json"), OutputFormat::Json, &out).unwrap();

        assert_eq!(path, out.join("M42_Reveil_eva_report.json"));
        assert!(path.exists());
    }
}
