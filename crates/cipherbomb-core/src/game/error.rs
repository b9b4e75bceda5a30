//! Game errors.

use super::config::ConfigError;
use crate::fhe::FheError;
use crate::protocol::PlayerId;
use thiserror::Error;

/// Errors from game operations. A failed operation leaves the state untouched.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Cannot {operation}: {reason}")]
    Phase {
        operation: &'static str,
        reason: String,
    },

    #[error("Not your turn: waiting for {expected}")]
    NotYourTurn { expected: PlayerId },

    #[error("Invalid target: {0}")]
    InvalidTarget(PlayerId),

    #[error("Hand is empty: {0}")]
    EmptyHand(PlayerId),

    #[error("Player already joined: {0}")]
    AlreadyJoined(PlayerId),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Game is full: at most {max} players")]
    Capacity { max: usize },

    #[error("No rounds left to deal")]
    RoundExhausted,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not ready: {0}")]
    NotReady(&'static str),

    #[error("Game has ended")]
    GameEnded,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] FheError),
}
