//! Player registry: membership changes while the match is open.

use super::ledger::Player;
use super::{CipherBomb, GameError};
use crate::fhe::FheBackend;
use crate::protocol::{GameEvent, Phase, PlayerId};
use tracing::{debug, info};

impl<B: FheBackend> CipherBomb<B> {
    /// Seat a player. The first joiner starts with the turn.
    pub fn join(&mut self, player: PlayerId, name: impl Into<String>) -> Result<(), GameError> {
        if self.phase != Phase::Open {
            debug!("Rejected join from {} in game {}: {}", player, self.id, self.phase);
            return Err(GameError::Phase {
                operation: "join",
                reason: format!("game is {}", self.phase),
            });
        }
        if self.index_of(&player).is_some() {
            return Err(GameError::AlreadyJoined(player));
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::Capacity {
                max: self.config.max_players,
            });
        }

        let name = name.into();
        self.players
            .push(Player::new(&self.backend, player, name.clone()));
        info!(
            "Player {} ({}) joined game {} [{}/{}]",
            name,
            player,
            self.id,
            self.players.len(),
            self.config.max_players
        );
        self.emit(GameEvent::PlayerJoined {
            game_id: self.id,
            player,
            name,
        });
        Ok(())
    }

    /// Change a seated player's display name
    pub fn set_name(&mut self, player: &PlayerId, name: impl Into<String>) -> Result<(), GameError> {
        let index = self
            .index_of(player)
            .ok_or(GameError::UnknownPlayer(*player))?;
        self.players[index].name = name.into();
        Ok(())
    }

    pub fn player_name(&self, player: &PlayerId) -> Option<&str> {
        self.index_of(player)
            .map(|i| self.players[i].name.as_str())
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    /// Close the registry, fix turn order, and request role assignment
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Open {
            return Err(GameError::Phase {
                operation: "start game",
                reason: format!("game is {}", self.phase),
            });
        }
        let count = self.players.len();
        if count < self.config.min_players || count > self.config.max_players {
            return Err(GameError::Phase {
                operation: "start game",
                reason: format!(
                    "need {}-{} players, have {}",
                    self.config.min_players, self.config.max_players, count
                ),
            });
        }

        self.phase = Phase::Running;
        self.turn_index = 0;
        self.deal_pending = true;
        self.request_roles();
        info!(
            "Game {} started with {} players, {} turn first",
            self.id, count, self.players[0].name
        );
        Ok(())
    }
}
