//! Cryptographic primitives for CipherBomb.
//!
//! This module provides:
//! - AuthorizationToken binding a viewing key to a player and a game
//! - PlayerKeys holding a player's account and viewing secrets

mod token;

pub use token::{AuthorizationToken, PlayerKeys};
