//! Homomorphic backend abstraction.
//!
//! Re-exports from fhe-core so callers depend on a single crate.

pub use fhe_core::fhe::{
    FheBackend, FheError, MockFheBackend, RandomRequestId, RandomStatus,
};
pub use fhe_core::SealedValue;
