//! Catalog configuration
//!
//! The catalog is everything the analysis needs besides the recording itself:
//! the signal registry, scenario definitions, resolver affixes, occurrence
//! extraction parameters, the requirement catalog, the signal equivalence
//! table and the document signal pairs. It is loaded once (from TOML, JSON
//! or the built-in set) and read-only afterwards.

use crate::requirements::Verdict;
use crate::types::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod builtin;

/// A logical signal and the names it is known under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSignal {
    /// Internal identifier (e.g. "A12")
    pub id: String,
    /// Canonical signal name
    pub canonical_name: String,
    /// Domain-specific synonyms, reported when the canonical name is missing
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CanonicalSignal {
    pub fn new(id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
        }
    }

    /// Builder method: add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Ordered registry of canonical signals, keyed by internal identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalRegistry {
    entries: Vec<CanonicalSignal>,
}

impl SignalRegistry {
    pub fn new(entries: Vec<CanonicalSignal>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalSignal> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalSignal> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CanonicalSignal> for SignalRegistry {
    fn from_iter<I: IntoIterator<Item = CanonicalSignal>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A named operational scenario ("use case")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Scenario name (e.g. "UC 1.3 - CHG AC")
    pub name: String,
    /// Required signal tokens, matched against registry canonical names
    pub required_signals: Vec<String>,
    /// Signal whose transitions bound the occurrence window.
    /// Defaults to the first present required signal.
    #[serde(default)]
    pub representative: Option<String>,
}

impl ScenarioDefinition {
    pub fn new<I, S>(name: impl Into<String>, required_signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            required_signals: required_signals.into_iter().map(Into::into).collect(),
            representative: None,
        }
    }

    /// Builder method: pin the representative signal
    pub fn with_representative(mut self, signal: impl Into<String>) -> Self {
        self.representative = Some(signal.into());
        self
    }
}

/// Affix tables and thresholds for the channel resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Equipment/subsystem tags appended to the canonical name
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
    /// Equipment/subsystem tags prepended to the canonical name
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    /// Shortest string (in characters) allowed to match by containment
    #[serde(default = "default_min_partial_len")]
    pub min_partial_len: usize,
}

fn default_suffixes() -> Vec<String> {
    ["_BLMS", "_HEVC", "_CAN", "_BMS", "_HV"].map(String::from).to_vec()
}

fn default_prefixes() -> Vec<String> {
    ["BMS_", "HEVC_", "CAN_", "HV_"].map(String::from).to_vec()
}

fn default_min_partial_len() -> usize {
    3
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            prefixes: default_prefixes(),
            min_partial_len: default_min_partial_len(),
        }
    }
}

/// Placeholder window used when no recorded signal can bound an occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackWindow {
    /// Window start in seconds
    pub start_s: f64,
    /// Window end in seconds
    pub end_s: f64,
    /// Free-text note carried into the report
    #[serde(default)]
    pub note: String,
    /// Extra filename keywords gating this window (empty = always)
    #[serde(default)]
    pub requires_filename: Vec<String>,
}

/// Filename heuristic for one scenario category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRule {
    /// Fragment of the scenario name this rule applies to
    pub scenario_keyword: String,
    /// Any of these in the file name triggers the rule
    pub filename_keywords: Vec<String>,
    /// Windows to emit, in occurrence order
    pub windows: Vec<FallbackWindow>,
}

/// Occurrence extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceConfig {
    /// End offset applied when a series has exactly one transition
    #[serde(default = "default_single_transition_offset")]
    pub single_transition_offset_s: f64,
    /// Filename heuristics, first matching rule wins
    #[serde(default = "builtin::fallback_rules")]
    pub fallback_rules: Vec<FallbackRule>,
}

fn default_single_transition_offset() -> f64 {
    60.0
}

impl Default for OccurrenceConfig {
    fn default() -> Self {
        Self {
            single_transition_offset_s: default_single_transition_offset(),
            fallback_rules: builtin::fallback_rules(),
        }
    }
}

/// Requirement priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// One entry of the requirement catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Explicit priority; derived from the identifier when absent
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl RequirementDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            priority: None,
        }
    }

    /// Communication requirements are high priority unless stated otherwise
    pub fn priority(&self) -> Priority {
        self.priority.unwrap_or(if self.id.contains("Comm") {
            Priority::High
        } else {
            Priority::Medium
        })
    }
}

/// Maps (requirement family, scenario) to a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRule {
    pub requirement_contains: String,
    pub scenario_contains: String,
    pub verdict: Verdict,
}

/// Requirement identifiers plus the rules that grade them per scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementCatalog {
    #[serde(default)]
    pub entries: Vec<RequirementDefinition>,
    #[serde(default)]
    pub rules: Vec<VerdictRule>,
}

/// Reference signal with its expected recorded equivalent and CAN fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceEntry {
    pub signal: String,
    #[serde(default)]
    pub equivalent: String,
    #[serde(default)]
    pub can_fallback: String,
}

/// A report row naming a signal under two naming conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPair {
    pub primary: String,
    pub secondary: String,
}

impl SignalPair {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

/// Vehicle metadata lookup parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Channel name fragments that may carry the VIN
    #[serde(default = "builtin::vin_signals")]
    pub vin_signals: Vec<String>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            vin_signals: builtin::vin_signals(),
        }
    }
}

/// The complete analysis catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub signals: SignalRegistry,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub occurrences: OccurrenceConfig,
    #[serde(default)]
    pub requirements: RequirementCatalog,
    #[serde(default)]
    pub equivalences: Vec<EquivalenceEntry>,
    #[serde(default)]
    pub document_signals: Vec<SignalPair>,
    #[serde(default)]
    pub vehicle: VehicleConfig,
}

impl Catalog {
    /// The built-in default catalog
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    /// Create a catalog from a registry and scenario list, other sections defaulted
    pub fn new(signals: SignalRegistry, scenarios: Vec<ScenarioDefinition>) -> Self {
        Self {
            signals,
            scenarios,
            ..Self::default()
        }
    }

    /// Load a catalog from a TOML or JSON file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading catalog: {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        let catalog = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(AnalyzerError::ConfigError(format!(
                    "Unsupported catalog format: {:?}",
                    path
                )))
            }
        };

        log::info!(
            "Catalog loaded: {} signals, {} scenarios, {} requirements",
            catalog.signals.len(),
            catalog.scenarios.len(),
            catalog.requirements.entries.len()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to parse TOML catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(content)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to parse JSON catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject duplicate identifiers, empty names and windows that would
    /// end before they start
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for signal in self.signals.iter() {
            if signal.canonical_name.is_empty() {
                return Err(AnalyzerError::ConfigError(format!(
                    "Signal '{}' has an empty canonical name",
                    signal.id
                )));
            }
            if !ids.insert(signal.id.as_str()) {
                return Err(AnalyzerError::ConfigError(format!(
                    "Duplicate signal id '{}'",
                    signal.id
                )));
            }
        }

        let mut names = HashSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(AnalyzerError::ConfigError(format!(
                    "Duplicate scenario '{}'",
                    scenario.name
                )));
            }
        }

        self.occurrences.validate()
    }
}

impl OccurrenceConfig {
    pub fn validate(&self) -> Result<()> {
        let offset = self.single_transition_offset_s;
        if !offset.is_finite() || offset < 0.0 {
            return Err(AnalyzerError::ConfigError(format!(
                "single_transition_offset_s must be a non-negative number, got {}",
                offset
            )));
        }

        for rule in &self.fallback_rules {
            for window in &rule.windows {
                let valid = window.start_s.is_finite()
                    && window.end_s.is_finite()
                    && window.start_s >= 0.0
                    && window.end_s >= window.start_s;
                if !valid {
                    return Err(AnalyzerError::ConfigError(format!(
                        "Fallback window {}..{} for '{}' ends before it starts",
                        window.start_s, window.end_s, rule.scenario_keyword
                    )));
                }
            }
        }
        Ok(())
    }
}
