//! # Class Trace
//!
//! An nft-transfer receiver prefixes the incoming class id with its own
//! `port/channel/`. Sending the asset back over the same pair strips that
//! prefix again, so adjacent round trips leave no mark on the final trace.
//!
//! The hashed class id the receiver exposes is `ibc/` followed by the
//! upper-case hex SHA-256 of `trace + original_class_id`.

use crate::domain::{ChannelPair, Hash};
use sha2::{Digest, Sha256};

/// Prefix of hashed class ids.
pub const IBC_CLASS_PREFIX: &str = "ibc/";

/// Drop every hop that directly undoes the hop before it.
///
/// Works as a stack so nested round trips (`a -> b -> c -> b -> a`) unwind
/// completely.
pub fn trim_round_trips(pairs: &[ChannelPair]) -> Vec<ChannelPair> {
    let mut trimmed: Vec<ChannelPair> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match trimmed.last() {
            Some(tail) if tail.is_equivalent(pair) => {
                trimmed.pop();
            }
            _ => trimmed.push(pair.clone()),
        }
    }
    trimmed
}

/// Concatenate `destPort/destChannel/` of each hop, last hop first.
pub fn build_trace(trimmed: &[ChannelPair]) -> String {
    trimmed
        .iter()
        .rev()
        .map(|pair| pair.dest.trace_segment())
        .collect()
}

/// `sha256(trace + class_id)`. An empty class id hashes to `sha256("")`.
pub fn class_hash(trace: &str, class_id: &str) -> Hash {
    let mut hasher = Sha256::new();
    if !class_id.is_empty() {
        hasher.update(trace.as_bytes());
        hasher.update(class_id.as_bytes());
    }
    hasher.finalize().into()
}

/// `ibc/<UPPER HEX>` for a class hash.
pub fn ibc_class_id(hash: &Hash) -> String {
    format!("{}{}", IBC_CLASS_PREFIX, hex::encode_upper(hash))
}
