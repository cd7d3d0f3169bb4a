//! Scenario detectability
//!
//! A scenario is detectable when every one of its required signals has a
//! present registry entry. Timing plays no part here.

use crate::config::{CanonicalSignal, ScenarioDefinition, SignalRegistry};
use crate::presence::{PresenceMap, SignalPresence};
use crate::resolve::normalize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDetection {
    pub scenario: String,
    pub detectable: bool,
    /// First required signal found missing
    pub missing_signal: Option<String>,
}

/// Detectability of every scenario, in definition order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Detectability {
    entries: Vec<ScenarioDetection>,
}

impl Detectability {
    pub fn get(&self, scenario: &str) -> Option<&ScenarioDetection> {
        self.entries.iter().find(|e| e.scenario == scenario)
    }

    /// False for unknown scenarios
    pub fn is_detectable(&self, scenario: &str) -> bool {
        self.get(scenario).map_or(false, |e| e.detectable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDetection> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn detectable_count(&self) -> usize {
        self.entries.iter().filter(|e| e.detectable).count()
    }
}

/// Whether a registry entry stands for a required-signal token
fn covers(signal: &CanonicalSignal, token: &str) -> bool {
    if signal.canonical_name.contains(token) {
        return true;
    }
    let key = normalize(token);
    !key.is_empty() && normalize(&signal.canonical_name).contains(&key)
}

/// First present registry entry standing for a required-signal token
///
/// An empty token never matches.
pub fn find_present<'p>(
    token: &str,
    presence: &'p PresenceMap,
    registry: &SignalRegistry,
) -> Option<&'p SignalPresence> {
    if token.is_empty() {
        return None;
    }
    registry
        .iter()
        .filter(|signal| covers(signal, token))
        .find_map(|signal| presence.get(&signal.id).filter(|p| p.present))
}

/// Detectability of every scenario
pub fn compute_detectability(
    scenarios: &[ScenarioDefinition],
    presence: &PresenceMap,
    registry: &SignalRegistry,
) -> Detectability {
    let entries = scenarios
        .iter()
        .map(|scenario| {
            let missing_signal = scenario
                .required_signals
                .iter()
                .find(|token| find_present(token, presence, registry).is_none())
                .cloned();

            let detectable = missing_signal.is_none();
            match &missing_signal {
                None => log::info!("Scenario '{}' detectable", scenario.name),
                Some(token) => log::info!(
                    "Scenario '{}' not detectable: '{}' missing",
                    scenario.name,
                    token
                ),
            }

            ScenarioDetection {
                scenario: scenario.name.clone(),
                detectable,
                missing_signal,
            }
        })
        .collect();

    Detectability { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::compute_presence;
    use crate::resolve::{ChannelIndex, ChannelResolver};

    fn registry() -> SignalRegistry {
        SignalRegistry::new(vec![
            CanonicalSignal::new("A1", "BMS_HVNetworkVoltage_BLMS"),
            CanonicalSignal::new("A2", "PowerRelayState_BLMS"),
            CanonicalSignal::new("A3", "VehicleSpeed"),
        ])
    }

    fn detect(channels: &[&str], scenarios: &[ScenarioDefinition]) -> Detectability {
        let index = ChannelIndex::new(channels.iter().copied());
        let presence = compute_presence(&registry(), &index, &ChannelResolver::default());
        compute_detectability(scenarios, &presence, &registry())
    }

    #[test]
    fn test_all_required_signals_present() {
        let scenarios = vec![
            ScenarioDefinition::new("Voltage only", ["BMS_HVNetworkVoltage_BLMS"]),
            ScenarioDefinition::new("Voltage and speed", ["BMS_HVNetworkVoltage_BLMS", "VehicleSpeed"]),
        ];
        let result = detect(&["BMS_HVNetworkVoltage_BLMS", "t"], &scenarios);

        assert!(result.is_detectable("Voltage only"));
        let both = result.get("Voltage and speed").unwrap();
        assert!(!both.detectable);
        assert_eq!(both.missing_signal.as_deref(), Some("VehicleSpeed"));
    }

    #[test]
    fn test_flipping_either_signal() {
        let scenarios = vec![ScenarioDefinition::new(
            "Pair",
            ["BMS_HVNetworkVoltage_BLMS", "VehicleSpeed"],
        )];
        assert!(detect(&["BMS_HVNetworkVoltage_BLMS", "VehicleSpeed"], &scenarios).is_detectable("Pair"));
        assert!(!detect(&["VehicleSpeed"], &scenarios).is_detectable("Pair"));
        assert!(!detect(&["BMS_HVNetworkVoltage_BLMS"], &scenarios).is_detectable("Pair"));
    }

    #[test]
    fn test_token_matches_by_containment() {
        // "PowerRelayState" is covered by the "PowerRelayState_BLMS" entry
        let scenarios = vec![ScenarioDefinition::new("Relay", ["PowerRelayState"])];
        assert!(detect(&["PowerRelayState_BLMS"], &scenarios).is_detectable("Relay"));

        let scenarios = vec![ScenarioDefinition::new("Relay", ["power relay state"])];
        assert!(detect(&["PowerRelayState_BLMS"], &scenarios).is_detectable("Relay"));
    }

    #[test]
    fn test_empty_token_is_missing() {
        let scenarios = vec![ScenarioDefinition::new("Broken", [""])];
        let result = detect(&["BMS_HVNetworkVoltage_BLMS"], &scenarios);
        assert!(!result.is_detectable("Broken"));
    }

    #[test]
    fn test_scenario_without_requirements_is_detectable() {
        let scenarios = vec![ScenarioDefinition::new("Empty", Vec::<String>::new())];
        assert!(detect(&[], &scenarios).is_detectable("Empty"));
    }
}
