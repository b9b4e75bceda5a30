//! Homomorphic backend abstraction.

mod mock;
mod traits;

pub use mock::{MockBool, MockFheBackend, MockUint};
pub use traits::{FheBackend, FheError, RandomRequestId, RandomStatus};
