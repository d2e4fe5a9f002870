//! # Port/Channel Registry
//!
//! Static table of direct connections between chains.
//!
//! Entries are keyed `<a><b>-<index>` (e.g. `is-1`) and hold
//! `port/channel <> port/channel`, the left side belonging to chain `a`.
//! Lookups accept either chain order.

use crate::domain::{ChainId, ChannelPair, FlowError, PortChannel};
use std::collections::HashMap;
use tracing::debug;

const SIDE_SEPARATOR: &str = "<>";

/// Immutable registry of channel pairs.
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    pairs: HashMap<String, (PortChannel, PortChannel)>,
}

impl ChannelRegistry {
    /// Build the registry from `(key, value)` entries.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, FlowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs = HashMap::new();
        for (key, value) in entries {
            let (key, value) = (key.as_ref().trim(), value.as_ref());
            let (a, b, index) = parse_key(key)?;
            let invalid = |reason: &str| FlowError::InvalidChannelEntry {
                key: key.to_string(),
                reason: reason.to_string(),
            };

            let (left, right) = value
                .split_once(SIDE_SEPARATOR)
                .ok_or_else(|| invalid("expected `port/channel <> port/channel`"))?;
            let left = PortChannel::parse(a.clone(), left).ok_or_else(|| invalid("bad left side"))?;
            let right = PortChannel::parse(b.clone(), right).ok_or_else(|| invalid("bad right side"))?;

            let canonical = format!("{a}{b}-{index}");
            if pairs.contains_key(&canonical) {
                return Err(invalid("pair registered twice"));
            }
            if pairs.contains_key(&format!("{b}{a}-{index}")) {
                return Err(invalid("pair already registered in the other orientation"));
            }
            pairs.insert(canonical, (left, right));
        }
        debug!("[gv-01] channel registry loaded with {} pair(s)", pairs.len());
        Ok(Self { pairs })
    }

    /// Resolve the connection `a <-> b` with the given index.
    ///
    /// The result is labeled in the queried order (`src` on `a`) whichever
    /// orientation the entry was registered in.
    pub fn resolve(&self, a: &ChainId, b: &ChainId, index: u32) -> Result<ChannelPair, FlowError> {
        let key = format!("{a}{b}-{index}");
        if let Some((left, right)) = self.pairs.get(&key) {
            return Ok(ChannelPair::new(index, left.clone(), right.clone()));
        }
        let reversed = format!("{b}{a}-{index}");
        if let Some((left, right)) = self.pairs.get(&reversed) {
            return Ok(ChannelPair::new(index, right.clone(), left.clone()));
        }
        Err(FlowError::PairNotFound { key })
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no pair is registered.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn parse_key(key: &str) -> Result<(ChainId, ChainId, u32), FlowError> {
    let invalid = |reason: &str| FlowError::InvalidChannelEntry {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    let (chains, index) = key
        .split_once('-')
        .ok_or_else(|| invalid("expected `<a><b>-<index>`"))?;
    let mut letters = chains.chars();
    let (Some(a), Some(b), None) = (letters.next(), letters.next(), letters.next()) else {
        return Err(invalid("expected two chain letters"));
    };
    if !a.is_ascii_alphabetic() || !b.is_ascii_alphabetic() {
        return Err(invalid("chain abbreviations must be letters"));
    }
    let index = index
        .parse::<u32>()
        .map_err(|_| invalid("pair index must be a number"))?;
    Ok((ChainId::from(a), ChainId::from(b), index))
}
