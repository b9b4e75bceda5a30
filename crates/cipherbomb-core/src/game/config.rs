//! Match configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_players ({min}) must be at least 2 and at most max_players ({max})")]
    PlayerRange { min: usize, max: usize },

    #[error("bad_guys ({bad_guys}) must be at least 1 and below min_players ({min_players})")]
    BadGuys { bad_guys: usize, min_players: usize },

    #[error("last_round_cards ({last}) must be at least 1 and at most first_round_cards ({first})")]
    RoundCards { first: u32, last: u32 },

    #[error("wires_per_player ({wires_per_player}) must be at least 1 and leave room for the bomb with {last_round_cards} cards per player")]
    Wires {
        wires_per_player: u32,
        last_round_cards: u32,
    },
}

/// Rules of a match, fixed at creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,
    /// Exact number of players assigned the bad-guy role
    pub bad_guys: usize,
    /// Cards per player in the first round
    pub first_round_cards: u32,
    /// Cards per player in the last round
    pub last_round_cards: u32,
    /// Wires to find per seated player before the bomb is defused
    pub wires_per_player: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 6,
            bad_guys: 1,
            first_round_cards: 5,
            last_round_cards: 2,
            wires_per_player: 1,
        }
    }
}

impl GameConfig {
    /// Check that every deal can hold one bomb plus all wires
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err(ConfigError::PlayerRange {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.bad_guys == 0 || self.bad_guys >= self.min_players {
            return Err(ConfigError::BadGuys {
                bad_guys: self.bad_guys,
                min_players: self.min_players,
            });
        }
        if self.last_round_cards == 0 || self.last_round_cards > self.first_round_cards {
            return Err(ConfigError::RoundCards {
                first: self.first_round_cards,
                last: self.last_round_cards,
            });
        }
        // n * wires + 1 <= n * last  <=>  wires < last
        if self.wires_per_player == 0 || self.wires_per_player >= self.last_round_cards {
            return Err(ConfigError::Wires {
                wires_per_player: self.wires_per_player,
                last_round_cards: self.last_round_cards,
            });
        }
        Ok(())
    }

    /// Number of rounds a match can last
    pub fn rounds(&self) -> u32 {
        self.first_round_cards - self.last_round_cards + 1
    }

    /// Wires that must be cut for the good guys to win
    pub fn wires_to_defuse(&self, players: usize) -> u64 {
        players as u64 * self.wires_per_player as u64
    }
}
