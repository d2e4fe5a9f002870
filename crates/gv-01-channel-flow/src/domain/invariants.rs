//! # Domain Invariants
//!
//! Structural rules every flow and pair lookup must satisfy.

use super::entities::ChannelPair;
use super::errors::FlowError;

/// Invariant: a flow names one more chain than it has hops, and at least one hop.
pub fn invariant_hop_count(
    expression: &str,
    chains: usize,
    hops: usize,
) -> Result<(), FlowError> {
    if hops == 0 || chains != hops + 1 {
        return Err(FlowError::MalformedFlow {
            expression: expression.to_string(),
            chains,
            hops,
        });
    }
    Ok(())
}

/// Invariant: registry symmetry.
///
/// `resolve(a, b, k)` and `resolve(b, a, k)` describe the same connection.
pub fn invariant_pairs_equivalent(forward: &ChannelPair, backward: &ChannelPair) -> bool {
    forward.is_equivalent(backward)
        && forward.src == backward.dest
        && forward.dest == backward.src
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainId, PortChannel};

    #[test]
    fn test_hop_count() {
        assert!(invariant_hop_count("i --(1)--> s", 2, 1).is_ok());
        assert!(invariant_hop_count("i", 1, 0).is_err());
        assert!(invariant_hop_count("i s j --(1)-->", 3, 1).is_err());
    }

    #[test]
    fn test_pairs_equivalent_requires_same_ends() {
        let i = PortChannel::new(ChainId::from('i'), "nft-transfer", "channel-17");
        let u = PortChannel::new(ChainId::from('u'), "nft-transfer", "channel-3");
        let forward = ChannelPair::new(1, i.clone(), u.clone());
        let backward = ChannelPair::new(1, u.clone(), i.clone());
        assert!(invariant_pairs_equivalent(&forward, &backward));

        let other = PortChannel::new(ChainId::from('u'), "nft-transfer", "channel-4");
        let mismatched = ChannelPair::new(1, other, i);
        assert!(!invariant_pairs_equivalent(&forward, &mismatched));
    }
}
