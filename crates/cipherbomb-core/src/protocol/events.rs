//! Public notifications emitted by a match.
//!
//! Events carry identities and counts only. The category of a taken card
//! never appears here.

use crate::protocol::{GameId, Outcome, PlayerId};
use serde::{Deserialize, Serialize};

/// Notification emitted by the state machine, in commit order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GameEvent {
    PlayerJoined {
        game_id: GameId,
        player: PlayerId,
        name: String,
    },
    /// Role assignment completed
    GameStarted {
        game_id: GameId,
        players: Vec<PlayerId>,
    },
    RoundDealt {
        game_id: GameId,
        round: u32,
        cards_per_player: u32,
    },
    CardTaken {
        game_id: GameId,
        from: PlayerId,
        to: PlayerId,
    },
    GoodGuysWin {
        game_id: GameId,
    },
    BadGuysWin {
        game_id: GameId,
    },
}

impl GameEvent {
    /// Terminal event for an outcome
    pub fn outcome(game_id: GameId, outcome: Outcome) -> Self {
        match outcome {
            Outcome::GoodGuysWin => GameEvent::GoodGuysWin { game_id },
            Outcome::BadGuysWin => GameEvent::BadGuysWin { game_id },
        }
    }

    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            GameEvent::GoodGuysWin { .. } | GameEvent::BadGuysWin { .. }
        )
    }

    pub fn game_id(&self) -> GameId {
        match self {
            GameEvent::PlayerJoined { game_id, .. }
            | GameEvent::GameStarted { game_id, .. }
            | GameEvent::RoundDealt { game_id, .. }
            | GameEvent::CardTaken { game_id, .. }
            | GameEvent::GoodGuysWin { game_id }
            | GameEvent::BadGuysWin { game_id } => *game_id,
        }
    }
}
