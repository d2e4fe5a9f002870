//! # Domain Module
//!
//! Core domain types for chain queries.

pub mod assets;
pub mod endpoint;
pub mod errors;
pub mod response;
pub mod tx;

pub use assets::*;
pub use endpoint::*;
pub use errors::*;
pub use response::*;
pub use tx::*;
