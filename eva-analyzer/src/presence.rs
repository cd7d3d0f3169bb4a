//! Signal presence evaluation
//!
//! Resolves every registry entry against one recording's channels. The
//! result is computed once per recording and never updated.

use crate::config::SignalRegistry;
use crate::resolve::{ChannelIndex, ChannelResolver, MatchTier};
use serde::Serialize;

/// Presence of one registry entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalPresence {
    pub id: String,
    pub canonical_name: String,
    pub present: bool,
    /// Channel the entry resolved to
    pub channel: Option<String>,
    pub tier: Option<MatchTier>,
    /// First alias that resolves when the canonical name does not.
    /// Informational only: it never makes the entry present.
    pub alias: Option<String>,
    pub alias_channel: Option<String>,
}

/// Presence of every registry entry, in registry order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PresenceMap {
    entries: Vec<SignalPresence>,
}

impl PresenceMap {
    pub fn get(&self, id: &str) -> Option<&SignalPresence> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// False for unknown ids
    pub fn is_present(&self, id: &str) -> bool {
        self.get(id).map_or(false, |e| e.present)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalPresence> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.present).count()
    }
}

/// Resolve every registry entry against the indexed channels
///
/// Only the canonical name decides presence, so an entry is present iff
/// the resolver finds a channel for its canonical name.
pub fn compute_presence(
    registry: &SignalRegistry,
    index: &ChannelIndex,
    resolver: &ChannelResolver,
) -> PresenceMap {
    let entries = registry
        .iter()
        .map(|signal| match resolver.resolve(&signal.canonical_name, index) {
            Some(resolution) => {
                log::debug!(
                    "{} '{}' -> '{}' ({})",
                    signal.id,
                    signal.canonical_name,
                    resolution.channel,
                    resolution.tier
                );
                SignalPresence {
                    id: signal.id.clone(),
                    canonical_name: signal.canonical_name.clone(),
                    present: true,
                    channel: Some(resolution.channel),
                    tier: Some(resolution.tier),
                    alias: None,
                    alias_channel: None,
                }
            }
            None => {
                let alias_hit = signal
                    .aliases
                    .iter()
                    .find_map(|alias| resolver.resolve(alias, index).map(|r| (alias, r)));
                match &alias_hit {
                    Some((alias, r)) => log::debug!(
                        "{} '{}' not found (alias '{}' -> '{}')",
                        signal.id,
                        signal.canonical_name,
                        alias,
                        r.channel
                    ),
                    None => log::debug!("{} '{}' not found", signal.id, signal.canonical_name),
                }
                let (alias, alias_channel) = match alias_hit {
                    Some((alias, r)) => (Some(alias.clone()), Some(r.channel)),
                    None => (None, None),
                };
                SignalPresence {
                    id: signal.id.clone(),
                    canonical_name: signal.canonical_name.clone(),
                    present: false,
                    channel: None,
                    tier: None,
                    alias,
                    alias_channel,
                }
            }
        })
        .collect::<Vec<_>>();

    let map = PresenceMap { entries };
    log::info!("Signals present: {}/{}", map.present_count(), map.len());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanonicalSignal;

    fn registry() -> SignalRegistry {
        SignalRegistry::new(vec![
            CanonicalSignal::new("A1", "BMS_HVNetworkVoltage_BLMS"),
            CanonicalSignal::new("A2", "AllowedBatteryPower_BLMS").with_alias("AvailablePower_v5"),
            CanonicalSignal::new("A3", "VehicleSpeed"),
        ])
    }

    #[test]
    fn test_presence_matches_resolver() {
        let index = ChannelIndex::new(["BMS_HVNetworkVoltage_BLMS", "t"]);
        let resolver = ChannelResolver::default();
        let presence = compute_presence(&registry(), &index, &resolver);

        for signal in registry().iter() {
            assert_eq!(
                presence.is_present(&signal.id),
                resolver.resolve(&signal.canonical_name, &index).is_some()
            );
        }
        assert_eq!(presence.get("A1").unwrap().tier, Some(MatchTier::Exact));
        assert_eq!(presence.present_count(), 1);
    }

    #[test]
    fn test_alias_hit_does_not_make_entry_present() {
        let index = ChannelIndex::new(["AvailablePower_v5"]);
        let resolver = ChannelResolver::default();
        let presence = compute_presence(&registry(), &index, &resolver);

        let power = presence.get("A2").unwrap();
        assert!(!power.present);
        assert!(resolver.resolve("AllowedBatteryPower_BLMS", &index).is_none());
        assert_eq!(power.channel, None);
        assert_eq!(power.alias.as_deref(), Some("AvailablePower_v5"));
        assert_eq!(power.alias_channel.as_deref(), Some("AvailablePower_v5"));

        for signal in registry().iter() {
            assert_eq!(
                presence.is_present(&signal.id),
                resolver.resolve(&signal.canonical_name, &index).is_some()
            );
        }
    }

    #[test]
    fn test_no_channels() {
        let presence = compute_presence(&registry(), &ChannelIndex::default(), &ChannelResolver::default());
        assert_eq!(presence.len(), 3);
        assert!(presence.iter().all(|e| !e.present));
        assert!(!presence.is_present("unknown"));
    }
}
