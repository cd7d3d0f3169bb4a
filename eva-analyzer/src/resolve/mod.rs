//! Channel resolution
//!
//! Maps a canonical signal name onto one of the channel names a recording
//! reports. Tiers are tried from most to least confident and the first hit
//! wins:
//!
//! 1. exact name
//! 2. normalized name (see [`normalize`])
//! 3. canonical name plus a known suffix or prefix, exact then normalized
//! 4. partial match: containment of normalized names in either direction,
//!    then the coarse "first half of one name inside the other" check
//!
//! Tier 4 takes the first channel in the order the recording listed them.
//! With several plausible channels the pick therefore depends on that
//! order; treat [`MatchTier::Partial`] results as best-effort.

use crate::config::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod normalize;

pub use normalize::normalize;

/// Which resolution tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    Normalized,
    Affix,
    Partial,
}

impl MatchTier {
    /// Tiers 1-3 are trusted; tier 4 may be a false positive
    pub fn is_confident(self) -> bool {
        self != MatchTier::Partial
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::Normalized => write!(f, "normalized"),
            MatchTier::Affix => write!(f, "affix"),
            MatchTier::Partial => write!(f, "partial"),
        }
    }
}

/// A resolved channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Channel name exactly as the recording reports it
    pub channel: String,
    pub tier: MatchTier,
}

/// Channel names of one recording with their precomputed comparison keys
#[derive(Debug, Clone, Default)]
pub struct ChannelIndex {
    names: Vec<String>,
    lowered: Vec<String>,
    normalized: Vec<String>,
    /// Key: channel name, Value: position in `names`
    exact: HashMap<String, usize>,
    /// Key: normalized name, Value: position of the first channel with that key
    by_normalized: HashMap<String, usize>,
}

impl ChannelIndex {
    /// Index channel names, keeping their enumeration order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for name in names {
            let name: String = name.into();
            if index.exact.contains_key(&name) {
                continue;
            }
            let position = index.names.len();
            let key = normalize(&name);
            index.exact.insert(name.clone(), position);
            index.by_normalized.entry(key.clone()).or_insert(position);
            index.lowered.push(name.to_lowercase());
            index.normalized.push(key);
            index.names.push(name);
        }
        index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exact.contains_key(name)
    }

    fn find_exact(&self, name: &str) -> Option<&str> {
        self.exact.get(name).map(|&i| self.names[i].as_str())
    }

    fn find_normalized(&self, key: &str) -> Option<&str> {
        if key.is_empty() {
            return None;
        }
        self.by_normalized.get(key).map(|&i| self.names[i].as_str())
    }
}

/// Tiered canonical-name to channel resolver
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    suffixes: Vec<String>,
    prefixes: Vec<String>,
    min_partial_len: usize,
}

impl Default for ChannelResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl ChannelResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            suffixes: config.suffixes.clone(),
            prefixes: config.prefixes.clone(),
            min_partial_len: config.min_partial_len,
        }
    }

    /// Resolve a canonical name against the indexed channels
    ///
    /// An empty name resolves to `None` without looking at any channel.
    pub fn resolve(&self, canonical_name: &str, index: &ChannelIndex) -> Option<Resolution> {
        if canonical_name.is_empty() || index.is_empty() {
            return None;
        }

        let found = |channel: &str, tier: MatchTier| {
            log::trace!("'{}' -> '{}' ({})", canonical_name, channel, tier);
            Some(Resolution {
                channel: channel.to_string(),
                tier,
            })
        };

        if let Some(channel) = index.find_exact(canonical_name) {
            return found(channel, MatchTier::Exact);
        }

        let key = normalize(canonical_name);
        if let Some(channel) = index.find_normalized(&key) {
            return found(channel, MatchTier::Normalized);
        }

        let suffixed = self.suffixes.iter().map(|s| format!("{}{}", canonical_name, s));
        let prefixed = self.prefixes.iter().map(|p| format!("{}{}", p, canonical_name));
        for candidate in suffixed.chain(prefixed) {
            let channel = index
                .find_exact(&candidate)
                .or_else(|| index.find_normalized(&normalize(&candidate)));
            if let Some(channel) = channel {
                return found(channel, MatchTier::Affix);
            }
        }

        if let Some(channel) = self.find_partial(canonical_name, &key, index) {
            return found(channel, MatchTier::Partial);
        }

        None
    }

    fn find_partial<'i>(&self, canonical_name: &str, key: &str, index: &'i ChannelIndex) -> Option<&'i str> {
        if key.is_empty() {
            return None;
        }
        let long_enough = |s: &str| s.chars().count() >= self.min_partial_len;

        let contained = index
            .names
            .iter()
            .zip(&index.normalized)
            .find(|(_, channel_key)| {
                (long_enough(key) && channel_key.contains(key))
                    || (long_enough(channel_key.as_str()) && key.contains(channel_key.as_str()))
            });
        if let Some((name, _)) = contained {
            return Some(name.as_str());
        }

        // Coarse shortcut: the first half of either name appears in the other
        let lowered = canonical_name.to_lowercase();
        let half = half_prefix(&lowered);
        index
            .names
            .iter()
            .zip(&index.lowered)
            .find(|(_, channel)| {
                let channel_half = half_prefix(channel);
                (long_enough(half) && channel.contains(half))
                    || (long_enough(channel_half) && lowered.contains(channel_half))
            })
            .map(|(name, _)| name.as_str())
    }
}

/// First half (by characters) of a string
fn half_prefix(s: &str) -> &str {
    let half = s.chars().count() / 2;
    match s.char_indices().nth(half) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Resolve with the default affix tables
pub fn resolve(canonical_name: &str, channels: &[String]) -> Option<String> {
    let index = ChannelIndex::new(channels.iter().cloned());
    ChannelResolver::default()
        .resolve(canonical_name, &index)
        .map(|r| r.channel)
}
