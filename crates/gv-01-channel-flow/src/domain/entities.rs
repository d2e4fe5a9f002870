//! # Domain Entities
//!
//! Channel pairs and transfer flows.

use super::errors::{FlowError, Hash};
use super::invariants::invariant_hop_count;
use super::value_objects::{ChainId, Hop, PortChannel};
use crate::algorithms::trace;
use crate::registry::ChannelRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Both ends of one direct connection, labeled in the order they were queried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPair {
    /// Pair index distinguishing parallel connections between the same chains.
    pub index: u32,
    /// Sending end.
    pub src: PortChannel,
    /// Receiving end.
    pub dest: PortChannel,
}

impl ChannelPair {
    /// Create a new pair.
    pub fn new(index: u32, src: PortChannel, dest: PortChannel) -> Self {
        Self { index, src, dest }
    }

    /// True iff both pairs share an index and their chains are exactly swapped.
    ///
    /// A hop over an equivalent pair undoes the previous hop.
    pub fn is_equivalent(&self, other: &ChannelPair) -> bool {
        self.index == other.index
            && self.src.chain == other.dest.chain
            && self.dest.chain == other.src.chain
    }

    /// The same connection seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            index: self.index,
            src: self.dest.clone(),
            dest: self.src.clone(),
        }
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <({})> {}:{}",
            self.src.chain, self.src, self.index, self.dest.chain, self.dest
        )
    }
}

/// A parsed multi-hop transfer path.
///
/// Parsed once from an expression such as `i --(1)--> s --(1)--> j`. Letters
/// name chains, each digit run is the pair index of the hop between the
/// surrounding letters. Pairs are resolved lazily against the registry.
///
/// A `Flow` is also a single-pass cursor over its resolved pairs: iteration
/// moves forward only and stops at the first hop that cannot be resolved.
/// Use [`Flow::is_done`] to tell exhaustion from a broken hop.
#[derive(Clone, Debug)]
pub struct Flow {
    expression: String,
    hops: Vec<Hop>,
    curr: usize,
    registry: Arc<ChannelRegistry>,
}

impl Flow {
    /// Parse a flow expression.
    pub fn parse(expression: &str, registry: Arc<ChannelRegistry>) -> Result<Self, FlowError> {
        let mut chains: Vec<ChainId> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut digits = String::new();

        let malformed = |chains: usize, hops: usize| FlowError::MalformedFlow {
            expression: expression.to_string(),
            chains,
            hops,
        };

        for c in expression.chars().chain(std::iter::once(' ')) {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if !digits.is_empty() {
                let index = digits
                    .parse::<u32>()
                    .map_err(|_| malformed(chains.len(), indices.len() + 1))?;
                indices.push(index);
                digits.clear();
            }
            if c.is_ascii_alphabetic() {
                chains.push(ChainId::from(c));
            }
        }

        invariant_hop_count(expression, chains.len(), indices.len())?;

        let hops = indices
            .iter()
            .enumerate()
            .map(|(i, &index)| Hop::new(chains[i].clone(), chains[i + 1].clone(), index))
            .collect();

        Ok(Self {
            expression: expression.to_string(),
            hops,
            curr: 0,
            registry,
        })
    }

    /// The expression this flow was parsed from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Number of hops.
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// All hops, in order.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Hop at `idx`.
    pub fn hop(&self, idx: usize) -> Option<&Hop> {
        self.hops.get(idx)
    }

    /// Source chain of hop `idx`.
    pub fn src_chain(&self, idx: usize) -> Option<&ChainId> {
        self.hops.get(idx).map(|h| &h.src)
    }

    /// Destination chain of hop `idx`.
    pub fn dest_chain(&self, idx: usize) -> Option<&ChainId> {
        self.hops.get(idx).map(|h| &h.dest)
    }

    /// Chain the asset rests on after the last hop.
    pub fn final_chain(&self) -> &ChainId {
        // parse guarantees at least one hop
        &self.hops[self.hops.len() - 1].dest
    }

    /// Resolve hop `idx` without moving the cursor.
    pub fn pair_at(&self, idx: usize) -> Result<ChannelPair, FlowError> {
        let hop = self.hops.get(idx).ok_or_else(|| FlowError::PairNotFound {
            key: format!("{}#{}", self.expression, idx),
        })?;
        self.registry.resolve(&hop.src, &hop.dest, hop.index)
    }

    /// True once the cursor has yielded every hop.
    pub fn is_done(&self) -> bool {
        self.curr == self.hops.len()
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.curr
    }

    /// Class trace the final chain assigns after round trips cancel out.
    ///
    /// ```text
    /// (a -> b)                 p1/c1/
    /// a -> (b -> c)            p2/c2/p1/c1/
    /// a -> b -> (c -> b)       p1/c1/
    /// a -> b -> c -> (b -> d)  p3/c3/p1/c1/
    /// ```
    pub fn build_trace(&self) -> Result<String, FlowError> {
        let pairs = (0..self.hops.len())
            .map(|i| self.pair_at(i))
            .collect::<Result<Vec<_>, _>>()?;
        let trimmed = trace::trim_round_trips(&pairs);
        Ok(trace::build_trace(&trimmed))
    }

    /// `sha256(trace + original_class_id)`; `sha256("")` for an empty class id.
    pub fn final_hash(&self, original_class_id: &str) -> Result<Hash, FlowError> {
        let trace = self.build_trace()?;
        Ok(trace::class_hash(&trace, original_class_id))
    }

    /// `ibc/<HEX>` class id the final chain assigns.
    pub fn ibc_class_id(&self, original_class_id: &str) -> Result<String, FlowError> {
        Ok(trace::ibc_class_id(&self.final_hash(original_class_id)?))
    }

    /// Class id the asset carries on the final chain.
    ///
    /// When every hop cancels out the asset is home again and keeps its
    /// original class id.
    pub fn final_class_id(&self, original_class_id: &str) -> Result<String, FlowError> {
        let trace = self.build_trace()?;
        if trace.is_empty() {
            return Ok(original_class_id.to_string());
        }
        Ok(trace::ibc_class_id(&trace::class_hash(
            &trace,
            original_class_id,
        )))
    }
}

impl Iterator for Flow {
    type Item = ChannelPair;

    fn next(&mut self) -> Option<ChannelPair> {
        if self.is_done() {
            return None;
        }
        match self.pair_at(self.curr) {
            Ok(pair) => {
                debug!("[gv-01] flow {} hop {} -> {}", self.expression, self.curr, pair);
                self.curr += 1;
                Some(pair)
            }
            Err(e) => {
                warn!("[gv-01] flow {} broken at hop {}: {}", self.expression, self.curr, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<ChannelRegistry> {
        Arc::new(
            ChannelRegistry::from_entries([
                ("is-1", "nft-transfer/channel-22 <> wasm.stars1abc/channel-207"),
                ("sj-1", "wasm.stars1abc/channel-211 <> wasm.juno1def/channel-93"),
                ("ji-1", "wasm.juno1def/channel-89 <> nft-transfer/channel-24"),
                ("iu-1", "nft-transfer/channel-17 <> nft-transfer/channel-3"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_parse_hops() {
        let flow = Flow::parse("i --(1)--> s --(1)--> j --(1)--> i", registry()).unwrap();
        assert_eq!(flow.hop_count(), 3);
        assert_eq!(flow.hop(0), Some(&Hop::new('i', 's', 1)));
        assert_eq!(flow.src_chain(1), Some(&ChainId::from('s')));
        assert_eq!(flow.dest_chain(2), Some(&ChainId::from('i')));
        assert_eq!(flow.final_chain(), &ChainId::from('i'));
        assert!(flow.hop(3).is_none());
    }

    #[test]
    fn test_parse_multi_digit_index() {
        let flow = Flow::parse("i --(12)--> s", registry()).unwrap();
        assert_eq!(flow.hop(0), Some(&Hop::new('i', 's', 12)));
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        let err = Flow::parse("i --(1)--> s --(1)-->", registry()).unwrap_err();
        assert!(matches!(
            err,
            FlowError::MalformedFlow {
                chains: 2,
                hops: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_no_hops() {
        assert!(Flow::parse("i", registry()).is_err());
        assert!(Flow::parse("", registry()).is_err());
    }

    #[test]
    fn test_cursor_walks_every_hop() {
        let mut flow = Flow::parse("i --(1)--> s --(1)--> j --(1)--> i", registry()).unwrap();
        let pairs: Vec<_> = flow.by_ref().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].dest.channel, "channel-207");
        assert_eq!(pairs[2].dest.channel, "channel-24");
        assert!(flow.is_done());
        assert!(flow.next().is_none());
    }

    #[test]
    fn test_cursor_stops_on_unresolved_hop() {
        let mut flow = Flow::parse("i --(1)--> s --(3)--> j --(1)--> i", registry()).unwrap();
        assert!(flow.next().is_some());
        assert!(flow.next().is_none());
        assert!(!flow.is_done());
        assert_eq!(flow.position(), 1);
    }

    #[test]
    fn test_build_trace_reverse_order() {
        let flow = Flow::parse("i --(1)--> s --(1)--> j", registry()).unwrap();
        assert_eq!(
            flow.build_trace().unwrap(),
            "wasm.juno1def/channel-93/wasm.stars1abc/channel-207/"
        );
    }

    #[test]
    fn test_build_trace_unresolved() {
        let flow = Flow::parse("i --(1)--> s --(3)--> j", registry()).unwrap();
        assert!(matches!(
            flow.build_trace(),
            Err(FlowError::PairNotFound { .. })
        ));
    }

    #[test]
    fn test_round_trip_cancels() {
        let out_and_back = Flow::parse("i --(1)--> s --(1)--> j --(1)--> s", registry()).unwrap();
        let direct = Flow::parse("i --(1)--> s", registry()).unwrap();
        assert_eq!(
            out_and_back.build_trace().unwrap(),
            direct.build_trace().unwrap()
        );
        assert_eq!(
            out_and_back.ibc_class_id("gon").unwrap(),
            direct.ibc_class_id("gon").unwrap()
        );
    }

    #[test]
    fn test_full_return_keeps_original_class() {
        let flow = Flow::parse("i --(1)--> s --(1)--> j --(1)--> s --(1)--> i", registry()).unwrap();
        assert_eq!(flow.build_trace().unwrap(), "");
        assert_eq!(flow.final_class_id("gonClass").unwrap(), "gonClass");
    }

    #[test]
    fn test_final_class_id_after_loop() {
        let flow = Flow::parse("i --(1)--> s --(1)--> j --(1)--> i", registry()).unwrap();
        let id = flow.final_class_id("gonClass").unwrap();
        assert!(id.starts_with("ibc/"));
        assert_eq!(id, flow.ibc_class_id("gonClass").unwrap());
    }

    #[test]
    fn test_final_hash_is_deterministic() {
        let flow = Flow::parse("i --(1)--> u", registry()).unwrap();
        assert_eq!(
            flow.final_hash("gon").unwrap(),
            flow.final_hash("gon").unwrap()
        );
    }

    #[test]
    fn test_pair_is_equivalent() {
        let reg = registry();
        let a = reg.resolve(&'i'.into(), &'s'.into(), 1).unwrap();
        let b = reg.resolve(&'s'.into(), &'i'.into(), 1).unwrap();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&a));
        assert_eq!(a.reversed(), b);
    }
}
