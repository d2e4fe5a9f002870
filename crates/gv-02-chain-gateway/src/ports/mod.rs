//! # Ports Module
//!
//! Hexagonal architecture ports for chain queries.

pub mod outbound;

pub use outbound::*;
