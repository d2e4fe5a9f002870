//! Ports: where evidence comes from and where outcomes go.

pub mod outbound;

pub use outbound::*;
