pub mod layer;
pub mod signature;
pub mod verifier;

pub use layer::require_signature;
pub use signature::sign;
pub use verifier::{
    RequestVerifier, SignedRequest, Verdict, DEFAULT_MAX_SKEW_SECS, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
