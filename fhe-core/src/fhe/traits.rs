//! FHE backend trait definition.

use crate::crypto::SealedValue;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from homomorphic operations
#[derive(Debug, Error)]
pub enum FheError {
    #[error("Invalid plaintext modulus: {0}")]
    InvalidModulus(u64),

    #[error("Reencryption failed: {0}")]
    Reencryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

/// Identifier of an asynchronous randomness request
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RandomRequestId(u64);

impl RandomRequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Debug for RandomRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomRequestId({})", self.0)
    }
}

impl fmt::Display for RandomRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status of a randomness request
#[derive(Clone, Debug)]
pub enum RandomStatus<C> {
    /// Requested, not yet fulfilled
    Pending,
    /// Fulfilled with an encrypted value
    Ready(C),
    /// The backend has no record of this request; it must be re-issued
    Unknown,
}

/// Trait for homomorphic encryption backends
///
/// This trait abstracts the operations an encrypted state machine needs.
/// Implementations can be:
/// - MockFheBackend for testing
/// - A coprocessor-backed client for production
///
/// Plaintext never leaves the backend except through `reveal` (a public
/// decryption the caller has decided to disclose) and `reencrypt` (sealed
/// to a single viewer).
pub trait FheBackend {
    /// Encrypted unsigned integer
    type Uint: Clone + fmt::Debug;
    /// Encrypted boolean
    type Bool: Clone + fmt::Debug;

    /// Trivially encrypt a public constant
    fn encrypt(&self, value: u64) -> Self::Uint;

    /// Trivially encrypt a public boolean
    fn encrypt_bool(&self, value: bool) -> Self::Bool;

    /// Wrapping addition
    fn add(&self, a: &Self::Uint, b: &Self::Uint) -> Self::Uint;

    /// Wrapping subtraction
    fn sub(&self, a: &Self::Uint, b: &Self::Uint) -> Self::Uint;

    /// Remainder by a public, non-zero modulus
    fn rem_plain(&self, a: &Self::Uint, modulus: u64) -> Result<Self::Uint, FheError>;

    fn eq(&self, a: &Self::Uint, b: &Self::Uint) -> Self::Bool;

    fn lt(&self, a: &Self::Uint, b: &Self::Uint) -> Self::Bool;

    fn and(&self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool;

    fn or(&self, a: &Self::Bool, b: &Self::Bool) -> Self::Bool;

    fn not(&self, a: &Self::Bool) -> Self::Bool;

    /// `cond ? if_true : if_false` without revealing `cond`
    fn select(&self, cond: &Self::Bool, if_true: &Self::Uint, if_false: &Self::Uint)
        -> Self::Uint;

    /// Encrypted 0/1 from an encrypted boolean
    fn to_uint(&self, value: &Self::Bool) -> Self::Uint;

    /// Ask for an encrypted random value uniform in `[0, bound)`.
    ///
    /// Fulfillment is asynchronous; poll with `poll_random`.
    fn request_random(&self, bound: u64) -> RandomRequestId;

    /// Check whether a randomness request has been fulfilled.
    ///
    /// A backend may forget a request once it has reported it `Ready`.
    fn poll_random(&self, id: RandomRequestId) -> RandomStatus<Self::Uint>;

    /// Publicly decrypt a boolean the caller intends to disclose
    fn reveal(&self, value: &Self::Bool) -> Result<bool, FheError>;

    /// Reencrypt a value under a viewer's public key
    fn reencrypt(&self, value: &Self::Uint, viewer: &PublicKey) -> Result<SealedValue, FheError>;
}
