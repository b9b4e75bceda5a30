//! Mock FHE backend for testing.
//!
//! Ciphertexts are opaque handles into a shared plaintext table, the way a
//! coprocessor-backed chain exposes them. Randomness requests are resolved
//! after a configurable number of polls, or on demand via `fulfill_pending`.

use super::traits::{FheBackend, FheError, RandomRequestId, RandomStatus};
use crate::crypto::SealedValue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use secp256k1::PublicKey;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Handle to an encrypted integer held by a `MockFheBackend`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MockUint(usize);

/// Handle to an encrypted boolean held by a `MockFheBackend`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MockBool(usize);

impl fmt::Debug for MockUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "euint(#{})", self.0)
    }
}

impl fmt::Debug for MockBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ebool(#{})", self.0)
    }
}

/// State of a mock randomness request
#[derive(Clone, Debug)]
struct MockRequestState {
    value: u64,
    polls_remaining: u32,
}

struct MockState {
    /// Plaintext behind each handle
    values: Vec<u64>,
    requests: HashMap<RandomRequestId, MockRequestState>,
    next_request: u64,
    rng: StdRng,
    /// Values handed out before falling back to `rng`, clamped to `bound - 1`
    script: VecDeque<u64>,
    /// Polls a request needs before it resolves
    latency: u32,
}

/// In-memory mock FHE backend for testing
///
/// Clones share state, so a test (or a simulated coprocessor task) can keep
/// a handle to fulfill requests while the game owns another.
///
/// A request is forgotten once it has been delivered as `Ready`. The handle
/// table is never collected and grows for the lifetime of the backend.
///
/// # Panics
///
/// Operations panic when given a handle produced by an unrelated backend.
#[derive(Clone)]
pub struct MockFheBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockFheBackend {
    /// Create a backend whose requests resolve on the first poll
    pub fn new(seed: u64) -> Self {
        Self::with_latency(seed, 0)
    }

    /// Create a backend whose requests stay pending for `polls` polls
    pub fn with_latency(seed: u64, polls: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                values: Vec::new(),
                requests: HashMap::new(),
                next_request: 0,
                rng: StdRng::seed_from_u64(seed),
                script: VecDeque::new(),
                latency: polls,
            })),
        }
    }

    /// Queue values for upcoming randomness requests, in request order
    pub fn script_randomness(&self, values: impl IntoIterator<Item = u64>) {
        self.state.lock().unwrap().script.extend(values);
    }

    /// Resolve every outstanding request immediately
    pub fn fulfill_pending(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let mut fulfilled = 0;
        for request in state.requests.values_mut() {
            if request.polls_remaining > 0 {
                request.polls_remaining = 0;
                fulfilled += 1;
            }
        }
        fulfilled
    }

    /// Number of requests that have not resolved yet
    pub fn pending_requests(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| r.polls_remaining > 0)
            .count()
    }

    /// Forget a request, as a coprocessor that lost it would
    pub fn drop_request(&self, id: RandomRequestId) -> bool {
        self.state.lock().unwrap().requests.remove(&id).is_some()
    }

    fn alloc(&self, value: u64) -> usize {
        let mut state = self.state.lock().unwrap();
        state.values.push(value);
        state.values.len() - 1
    }

    fn value(&self, handle: usize) -> u64 {
        self.state.lock().unwrap().values[handle]
    }

    fn uint(&self, value: u64) -> MockUint {
        MockUint(self.alloc(value))
    }

    fn boolean(&self, value: bool) -> MockBool {
        MockBool(self.alloc(value as u64))
    }
}

impl FheBackend for MockFheBackend {
    type Uint = MockUint;
    type Bool = MockBool;

    fn encrypt(&self, value: u64) -> MockUint {
        self.uint(value)
    }

    fn encrypt_bool(&self, value: bool) -> MockBool {
        self.boolean(value)
    }

    fn add(&self, a: &MockUint, b: &MockUint) -> MockUint {
        self.uint(self.value(a.0).wrapping_add(self.value(b.0)))
    }

    fn sub(&self, a: &MockUint, b: &MockUint) -> MockUint {
        self.uint(self.value(a.0).wrapping_sub(self.value(b.0)))
    }

    fn rem_plain(&self, a: &MockUint, modulus: u64) -> Result<MockUint, FheError> {
        if modulus == 0 {
            return Err(FheError::InvalidModulus(modulus));
        }
        Ok(self.uint(self.value(a.0) % modulus))
    }

    fn eq(&self, a: &MockUint, b: &MockUint) -> MockBool {
        self.boolean(self.value(a.0) == self.value(b.0))
    }

    fn lt(&self, a: &MockUint, b: &MockUint) -> MockBool {
        self.boolean(self.value(a.0) < self.value(b.0))
    }

    fn and(&self, a: &MockBool, b: &MockBool) -> MockBool {
        self.boolean(self.value(a.0) != 0 && self.value(b.0) != 0)
    }

    fn or(&self, a: &MockBool, b: &MockBool) -> MockBool {
        self.boolean(self.value(a.0) != 0 || self.value(b.0) != 0)
    }

    fn not(&self, a: &MockBool) -> MockBool {
        self.boolean(self.value(a.0) == 0)
    }

    fn select(&self, cond: &MockBool, if_true: &MockUint, if_false: &MockUint) -> MockUint {
        if self.value(cond.0) != 0 {
            self.uint(self.value(if_true.0))
        } else {
            self.uint(self.value(if_false.0))
        }
    }

    fn to_uint(&self, value: &MockBool) -> MockUint {
        self.uint((self.value(value.0) != 0) as u64)
    }

    fn request_random(&self, bound: u64) -> RandomRequestId {
        let bound = bound.max(1);
        let mut state = self.state.lock().unwrap();
        let value = match state.script.pop_front() {
            Some(scripted) => scripted.min(bound - 1),
            None => state.rng.gen_range(0..bound),
        };
        let id = RandomRequestId::new(state.next_request);
        state.next_request += 1;
        let polls_remaining = state.latency;
        state.requests.insert(
            id,
            MockRequestState {
                value,
                polls_remaining,
            },
        );
        id
    }

    fn poll_random(&self, id: RandomRequestId) -> RandomStatus<MockUint> {
        let value = {
            let mut state = self.state.lock().unwrap();
            let Some(request) = state.requests.get_mut(&id) else {
                return RandomStatus::Unknown;
            };
            if request.polls_remaining > 0 {
                request.polls_remaining -= 1;
                return RandomStatus::Pending;
            }
            let value = request.value;
            state.requests.remove(&id);
            value
        };
        RandomStatus::Ready(self.uint(value))
    }

    fn reveal(&self, value: &MockBool) -> Result<bool, FheError> {
        Ok(self.value(value.0) != 0)
    }

    fn reencrypt(&self, value: &MockUint, viewer: &PublicKey) -> Result<SealedValue, FheError> {
        SealedValue::seal(self.value(value.0), viewer)
    }
}
