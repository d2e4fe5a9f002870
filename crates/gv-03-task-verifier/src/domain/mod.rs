//! Domain layer: reasons, parameters, requests and outcomes.

pub mod outcome;
pub mod params;
pub mod reason;

pub use outcome::{task_no_cmp, Participant, VerificationOutcome, VerifyRequest};
pub use params::{MintClaim, TaskParams};
pub use reason::ReasonKind;
