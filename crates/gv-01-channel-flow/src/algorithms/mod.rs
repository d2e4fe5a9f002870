//! # Algorithms Module
//!
//! Class trace derivation for transfer flows.

pub mod trace;

pub use trace::{build_trace, class_hash, ibc_class_id, trim_round_trips, IBC_CLASS_PREFIX};
