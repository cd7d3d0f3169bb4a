// End-to-end analysis over in-memory and on-disk recordings
use eva_analyzer::config::{CanonicalSignal, SignalRegistry};
use eva_analyzer::types::ChannelLocation;
use eva_analyzer::{
    AnalysisSession, AnalyzerError, Catalog, FetchOutcome, FileLoader, MatchTier,
    MemoryRecording, OccurrenceStatus, Recording, RecordingLoader, SampleSeries,
    ScenarioDefinition,
};
use std::io::Write;
use std::path::Path;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn series(samples: &[f64]) -> SampleSeries {
    let timestamps = (0..samples.len()).map(|i| i as f64 * 0.5).collect();
    SampleSeries::numeric(timestamps, samples.to_vec()).unwrap()
}

fn voltage_catalog() -> Catalog {
    Catalog::new(
        SignalRegistry::new(vec![
            CanonicalSignal::new("A1", "BMS_HVNetworkVoltage_BLMS"),
            CanonicalSignal::new("A2", "VehicleSpeed"),
        ]),
        vec![
            ScenarioDefinition::new("Voltage", ["BMS_HVNetworkVoltage_BLMS"]),
            ScenarioDefinition::new("Voltage and speed", ["BMS_HVNetworkVoltage_BLMS", "VehicleSpeed"]),
        ],
    )
}

#[test]
fn voltage_and_time_channels() {
    init_logging();
    let catalog = voltage_catalog();
    let recording = MemoryRecording::builder()
        .channel("BMS_HVNetworkVoltage_BLMS", series(&[380.0, 380.0, 395.0, 410.0]))
        .channel("t", series(&[0.0, 0.5, 1.0, 1.5]))
        .build();
    let session = AnalysisSession::new(&catalog, Box::new(recording), "bench.json");

    let voltage = session.presence().get("A1").unwrap();
    assert!(voltage.present);
    assert_eq!(voltage.tier, Some(MatchTier::Exact));
    assert!(!session.presence().is_present("A2"));

    assert!(session.detectability().is_detectable("Voltage"));
    assert!(!session.detectability().is_detectable("Voltage and speed"));
}

#[test]
fn empty_recording_degrades_gracefully() {
    init_logging();
    let catalog = Catalog::builtin();
    let mut session = AnalysisSession::new(&catalog, Box::new(MemoryRecording::default()), "empty.json");

    assert!(session.presence().iter().all(|p| !p.present));
    assert!(session.detectability().iter().all(|d| !d.detectable));

    let report = session.run();
    assert_eq!(report.summary.signals_present, 0);
    assert_eq!(report.summary.scenarios_detectable, 0);
    assert_eq!(report.occurrences.len(), catalog.scenarios.len());
    assert!(report
        .occurrences
        .iter()
        .all(|o| o.status == OccurrenceStatus::Unavailable));
    assert!(report.document_signals.iter().all(|r| !r.found));
}

/// A recording whose every read fails
struct BrokenRecording {
    names: Vec<String>,
}

impl Recording for BrokenRecording {
    fn channel_names(&self) -> &[String] {
        &self.names
    }

    fn locations(&self, _name: &str) -> Vec<ChannelLocation> {
        vec![ChannelLocation::new(0, 0)]
    }

    fn series_at(&self, name: &str, _location: ChannelLocation) -> eva_analyzer::Result<SampleSeries> {
        Err(AnalyzerError::InvalidData(format!("corrupt block in '{}'", name)))
    }
}

#[test]
fn fetch_failures_never_abort_the_run() {
    init_logging();
    let catalog = voltage_catalog();
    let recording = BrokenRecording {
        names: vec!["BMS_HVNetworkVoltage_BLMS".to_string()],
    };
    let mut session = AnalysisSession::new(&catalog, Box::new(recording), "M555_Reveil.json");

    // Presence only needs the name, not the data
    assert!(session.detectability().is_detectable("Voltage"));
    assert!(matches!(
        session.get_series("BMS_HVNetworkVoltage_BLMS"),
        FetchOutcome::Failed { .. }
    ));

    let report = session.run();
    let voltage: Vec<_> = report
        .occurrences
        .iter()
        .filter(|o| o.scenario == "Voltage")
        .collect();
    assert_eq!(voltage.len(), 1);
    assert_eq!(voltage[0].status, OccurrenceStatus::Unavailable);
    assert!(voltage[0].note.contains("unreadable"));
}

#[test]
fn transitions_give_the_occurrence_window() {
    init_logging();
    let catalog = voltage_catalog();
    let recording = MemoryRecording::builder()
        .channel(
            "BMS_HVNetworkVoltage_BLMS",
            SampleSeries::numeric(
                vec![0.0, 1.0, 2.0, 2.5, 3.0, 4.0],
                vec![0.0, 1.0, 1.0, 2.0, 2.0, 0.0],
            )
            .unwrap(),
        )
        .build();
    let mut session = AnalysisSession::new(&catalog, Box::new(recording), "bench.json");

    let scenario = catalog.scenarios[0].clone();
    let occurrences = session.extract_occurrences(&scenario);
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].start, Some(1.0));
    assert_eq!(occurrences[0].end, Some(4.0));
    assert_eq!(occurrences[0].status, OccurrenceStatus::Detectable);
}

#[test]
fn json_dump_through_file_loader() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Mulet_77_Traction.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"{{
            "header_comment": "VIN: VF1AG000123456789",
            "start_time": "2025-03-14T08:30:00Z",
            "groups": [
                {{ "channels": [
                    {{ "name": "t", "timestamps": [0.0, 1.0, 2.0], "samples": [0.0, 1.0, 2.0] }},
                    {{ "name": "VehicleSpeed_CAN", "timestamps": [0.0, 1.0, 2.0], "samples": [0.0, 20.0, 35.0] }}
                ] }}
            ]
        }}"#
    )
    .unwrap();

    let catalog = voltage_catalog();
    let mut session = AnalysisSession::open(&catalog, &FileLoader::new(), &path).unwrap();
    assert_eq!(session.presence().get("A2").unwrap().tier, Some(MatchTier::Affix));

    let report = session.run();
    assert_eq!(report.vehicle.vin.as_deref(), Some("VF1AG000123456789"));
    assert_eq!(report.vehicle.mulet.as_deref(), Some("M77"));
    assert_eq!(report.vehicle.test_date.to_string(), "2025-03-14");
}

#[test]
fn load_failure_is_fatal() {
    let catalog = Catalog::builtin();
    let result = AnalysisSession::open(&catalog, &FileLoader::new(), Path::new("does/not/exist.json"));
    assert!(result.is_err());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.mf4");
    std::fs::write(&path, b"MDF").unwrap();
    assert!(matches!(
        FileLoader::new().load(&path),
        Err(AnalyzerError::UnsupportedFormat(_))
    ));
}

#[test]
fn catalog_file_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[signals]]
id = "S1"
canonical_name = "VehicleSpeed"

[[scenarios]]
name = "Driving"
required_signals = ["VehicleSpeed"]

[resolver]
suffixes = ["_ESP"]
prefixes = []
"#,
    )
    .unwrap();

    let catalog = Catalog::from_file(&path).unwrap();
    let recording = MemoryRecording::builder()
        .channel("VehicleSpeed_ESP", series(&[0.0, 1.0]))
        .build();
    let session = AnalysisSession::new(&catalog, Box::new(recording), "drive.json");

    assert_eq!(session.presence().get("S1").unwrap().tier, Some(MatchTier::Affix));
    assert!(session.detectability().is_detectable("Driving"));
}
