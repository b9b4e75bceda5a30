//! FHE Core Library
//!
//! The homomorphic capability consumed by encrypted state machines:
//! - `FheBackend` trait: encrypted arithmetic, comparison, select, asynchronous randomness
//! - `SealedValue`: a value reencrypted under a viewer's public key
//! - `MockFheBackend`: in-memory handle-based backend for tests and demos

pub mod crypto;
pub mod fhe;

pub use crypto::SealedValue;
pub use fhe::{FheBackend, FheError, MockFheBackend, RandomRequestId, RandomStatus};
