//! # GV-01 Channel Flow
//!
//! Models how a non-fungible asset class travels between chains.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (DDD), pure domain with no I/O
//!
//! ## Purpose
//!
//! - Resolve the port/channel pair of a direct connection between two chains
//! - Parse a compact flow expression (`i --(1)--> s --(1)--> j`) into hops
//! - Derive the class trace a receiving chain assigns to the asset, cancelling
//!   hops that double back, and hash it the way the nft-transfer module does
//!
//! ## Module Structure
//!
//! ```text
//! gv-01-channel-flow/
//! ├── domain/          # ChainId, PortChannel, ChannelPair, Hop, Flow, errors
//! ├── algorithms/      # Round-trip trimming, trace building, class hashing
//! ├── registry         # ChannelRegistry (port/channel table)
//! └── catalog          # FlowCatalog (named flows)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod catalog;
pub mod domain;
pub mod registry;

// Re-exports
pub use algorithms::{build_trace, class_hash, ibc_class_id, trim_round_trips, IBC_CLASS_PREFIX};
pub use catalog::FlowCatalog;
pub use domain::{
    invariant_hop_count, invariant_pairs_equivalent, ChainId, ChannelPair, Flow, FlowError, Hash,
    Hop, PortChannel,
};
pub use registry::ChannelRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
