//! Requirement verdicts and signal equivalence checks

use crate::config::{EquivalenceEntry, Priority, RequirementCatalog};
use crate::resolve::ChannelIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compliance verdict for one requirement in one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Ok,
    Partial,
    Nok,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "OK"),
            Verdict::Partial => write!(f, "PARTIAL"),
            Verdict::Nok => write!(f, "NOK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementVerdict {
    pub requirement: String,
    pub priority: Priority,
    pub verdict: Verdict,
}

/// Grade every catalog requirement for one scenario
///
/// The first rule whose fragments appear in both the requirement id and the
/// scenario name decides the verdict. Unmatched requirements are `Nok`, and
/// nothing is better than `Nok` when the scenario is not detectable.
pub fn evaluate_requirements(
    catalog: &RequirementCatalog,
    scenario_name: &str,
    detectable: bool,
) -> Vec<RequirementVerdict> {
    catalog
        .entries
        .iter()
        .map(|requirement| {
            let verdict = catalog
                .rules
                .iter()
                .find(|rule| {
                    requirement.id.contains(&rule.requirement_contains)
                        && scenario_name.contains(&rule.scenario_contains)
                })
                .map(|rule| rule.verdict)
                .filter(|_| detectable)
                .unwrap_or(Verdict::Nok);

            RequirementVerdict {
                requirement: requirement.id.clone(),
                priority: requirement.priority(),
                verdict,
            }
        })
        .collect()
}

/// Availability of a reference signal's recorded equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EquivalenceStatus {
    /// The expected equivalent is recorded
    Ok,
    /// Only the CAN fallback is recorded
    Fallback,
    Nok,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceRow {
    pub signal: String,
    pub equivalent: String,
    pub can_fallback: String,
    pub status: EquivalenceStatus,
}

/// Check every equivalence entry against the recorded channel names.
/// Only exact names count.
pub fn evaluate_equivalences(entries: &[EquivalenceEntry], index: &ChannelIndex) -> Vec<EquivalenceRow> {
    entries
        .iter()
        .map(|entry| {
            let recorded = |name: &str| !name.is_empty() && index.contains(name);
            let status = if recorded(&entry.equivalent) {
                EquivalenceStatus::Ok
            } else if recorded(&entry.can_fallback) {
                EquivalenceStatus::Fallback
            } else {
                EquivalenceStatus::Nok
            };

            EquivalenceRow {
                signal: entry.signal.clone(),
                equivalent: entry.equivalent.clone(),
                can_fallback: entry.can_fallback.clone(),
                status,
            }
        })
        .collect()
}
