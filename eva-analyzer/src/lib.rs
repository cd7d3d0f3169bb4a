//! EVA Analyzer Library
//!
//! Correlates the logical signals of a compliance catalog with the channels
//! of a vehicle measurement recording, and works out which operational
//! scenarios ("use cases") the recording covers.
//!
//! # Architecture
//!
//! - [`resolve`]: name normalisation and tiered channel resolution
//! - [`session`]: one analysis per recording, owning the signal data cache
//! - [`presence`] / [`scenario`]: per-signal presence, per-scenario detectability
//! - [`occurrence`]: scenario time windows from signal transitions
//! - [`requirements`], [`vehicle`], [`report`]: the report content
//! - [`recording`]: the recording abstraction and file loaders (JSON dumps,
//!   BLF traces decoded with DBC files)
//!
//! The library does NOT render reports; it hands an [`AnalysisReport`] to
//! the application layer (eva-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use eva_analyzer::{AnalysisSession, Catalog, FileLoader};
//! use std::path::Path;
//!
//! let catalog = Catalog::builtin();
//! let loader = FileLoader::new().with_dbc("powertrain.dbc");
//!
//! let mut session = AnalysisSession::open(&catalog, &loader, Path::new("M123_Reveil.blf")).unwrap();
//! let report = session.run();
//!
//! for scenario in &report.scenarios {
//!     println!("{}: {}", scenario.scenario, scenario.detectable);
//! }
//! ```

pub mod config;
pub mod occurrence;
pub mod presence;
pub mod recording;
pub mod report;
pub mod requirements;
pub mod resolve;
pub mod scenario;
pub mod session;
pub mod types;
pub mod vehicle;

pub use config::{Catalog, CanonicalSignal, ScenarioDefinition, SignalRegistry};
pub use occurrence::{format_time, Occurrence, OccurrenceStatus};
pub use presence::{compute_presence, PresenceMap, SignalPresence};
pub use recording::{FileLoader, MemoryRecording, Recording, RecordingLoader};
pub use report::AnalysisReport;
pub use requirements::Verdict;
pub use resolve::{normalize, resolve, ChannelIndex, ChannelResolver, MatchTier, Resolution};
pub use scenario::{compute_detectability, Detectability};
pub use session::{AnalysisSession, FetchOutcome, SignalData};
pub use types::{AnalyzerError, Result, SampleSeries, SampleValue, Timestamp};

// Internal modules (not exposed in public API)
mod message_decoder;
mod signals;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
