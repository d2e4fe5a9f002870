//! # Domain Value Objects
//!
//! Immutable value types for channel flows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short abbreviation identifying one blockchain (`i`, `s`, `j`, `u`, `o`).
///
/// Flow expressions name chains by a single letter, so abbreviations used in
/// flows must be one character long.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    /// Create a chain id from its abbreviation.
    pub fn new(abbr: impl Into<String>) -> Self {
        Self(abbr.into())
    }

    /// Abbreviation as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(abbr: &str) -> Self {
        Self::new(abbr)
    }
}

impl From<char> for ChainId {
    fn from(abbr: char) -> Self {
        Self(abbr.to_string())
    }
}

/// A (port, channel) identifier owned by one chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortChannel {
    /// Chain owning this end of the connection.
    pub chain: ChainId,
    /// Port id (`nft-transfer`, `wasm.<contract>`).
    pub port: String,
    /// Channel id (`channel-22`).
    pub channel: String,
}

impl PortChannel {
    /// Create a new port/channel end.
    pub fn new(chain: ChainId, port: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            chain,
            port: port.into(),
            channel: channel.into(),
        }
    }

    /// Parse `port/channel`. Ports never contain `/`, channels may not be empty.
    pub fn parse(chain: ChainId, value: &str) -> Option<Self> {
        let (port, channel) = value.trim().split_once('/')?;
        if port.is_empty() || channel.is_empty() {
            return None;
        }
        Some(Self::new(chain, port, channel))
    }

    /// Trace segment this end contributes to a class path: `port/channel/`.
    pub fn trace_segment(&self) -> String {
        format!("{}/{}/", self.port, self.channel)
    }
}

impl fmt::Display for PortChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.channel)
    }
}

/// One directed transfer step between two chains over a numbered pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    /// Sending chain.
    pub src: ChainId,
    /// Receiving chain.
    pub dest: ChainId,
    /// Pair index distinguishing parallel connections.
    pub index: u32,
}

impl Hop {
    /// Create a new hop.
    pub fn new(src: impl Into<ChainId>, dest: impl Into<ChainId>, index: u32) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            index,
        }
    }

    /// True if `self` undoes `previous`: same pair, endpoints swapped.
    pub fn reverses(&self, previous: &Hop) -> bool {
        self.index == previous.index && self.src == previous.dest && self.dest == previous.src
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --({})--> {}", self.src, self.index, self.dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_display() {
        assert_eq!(ChainId::from('i').to_string(), "i");
        assert_eq!(ChainId::from("s").as_str(), "s");
    }

    #[test]
    fn test_port_channel_parse_wasm_port() {
        let pc = PortChannel::parse(
            ChainId::from("s"),
            "wasm.stars1ve46fjrhcrum94c7d8yc2wsdz8cpuw73503e8qn9r44spr6dw0lsvmvtqh/channel-207",
        )
        .unwrap();
        assert_eq!(
            pc.port,
            "wasm.stars1ve46fjrhcrum94c7d8yc2wsdz8cpuw73503e8qn9r44spr6dw0lsvmvtqh"
        );
        assert_eq!(pc.channel, "channel-207");
    }

    #[test]
    fn test_port_channel_parse_rejects_missing_channel() {
        assert!(PortChannel::parse(ChainId::from("i"), "nft-transfer").is_none());
        assert!(PortChannel::parse(ChainId::from("i"), "nft-transfer/").is_none());
    }

    #[test]
    fn test_trace_segment() {
        let pc = PortChannel::new(ChainId::from("i"), "nft-transfer", "channel-22");
        assert_eq!(pc.trace_segment(), "nft-transfer/channel-22/");
    }

    #[test]
    fn test_hop_reverses() {
        let forward = Hop::new('s', 'j', 1);
        assert!(Hop::new('j', 's', 1).reverses(&forward));
        assert!(!Hop::new('j', 's', 2).reverses(&forward));
        assert!(!Hop::new('j', 'u', 1).reverses(&forward));
    }
}
