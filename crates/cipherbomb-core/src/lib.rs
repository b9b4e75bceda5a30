//! CipherBomb Core Library
//!
//! This crate provides the encrypted game-state machine for a hidden-role
//! card game played on a public ledger: player registry, round dealing over
//! asynchronous encrypted randomness, oblivious card transfer, per-viewer
//! reencryption, and win evaluation on encrypted aggregates.

pub mod crypto;
pub mod fhe;
pub mod game;
pub mod protocol;

pub use crypto::{AuthorizationToken, PlayerKeys};
pub use fhe::{FheBackend, FheError, MockFheBackend, SealedValue};
pub use game::{
    CipherBomb, ConfigError, GameConfig, GameError, GameHost, Hand, PlayerView, SealedHand,
};
pub use protocol::{Category, GameEvent, GameId, Outcome, Phase, PlayerId};
