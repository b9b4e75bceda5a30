//! Turn order over the seated players, skipping eliminated ones.

use super::{CipherBomb, GameError};
use crate::fhe::FheBackend;
use crate::protocol::{Phase, PlayerId};

impl<B: FheBackend> CipherBomb<B> {
    /// Player whose turn it is, once the match has started
    pub fn current_turn_player(&self) -> Option<PlayerId> {
        if self.phase == Phase::Open {
            return None;
        }
        self.players.get(self.turn_index).map(|p| p.id)
    }

    /// Fail with `NotYourTurn` unless `caller` holds the turn
    pub fn require_current_player(&self, caller: &PlayerId) -> Result<(), GameError> {
        let expected = self.current_turn_player().ok_or_else(|| GameError::Phase {
            operation: "check turn",
            reason: "game has not started".to_string(),
        })?;
        if &expected != caller {
            return Err(GameError::NotYourTurn { expected });
        }
        Ok(())
    }

    /// Move to the next non-eliminated player, wrapping around
    pub(crate) fn advance_turn(&mut self) {
        let count = self.players.len();
        for step in 1..=count {
            let index = (self.turn_index + step) % count;
            if !self.players[index].eliminated {
                self.turn_index = index;
                return;
            }
        }
    }
}
