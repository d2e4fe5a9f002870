//! # Adapters Module
//!
//! Concrete implementations of the chain query port.

pub mod abci;
pub mod cosmos;

pub use cosmos::CosmosChain;
