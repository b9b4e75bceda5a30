//! Many matches sharing one backend.

use super::{CipherBomb, GameConfig, GameError};
use crate::fhe::FheBackend;
use crate::protocol::{GameEvent, GameId};
use std::collections::HashMap;
use tracing::info;

/// Registry of independent matches keyed by id
pub struct GameHost<B: FheBackend + Clone> {
    backend: B,
    games: HashMap<GameId, CipherBomb<B>>,
}

impl<B: FheBackend + Clone> GameHost<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            games: HashMap::new(),
        }
    }

    /// Open a new match
    pub fn create_game(&mut self, config: GameConfig) -> Result<GameId, GameError> {
        let game = CipherBomb::new(self.backend.clone(), config)?;
        let id = game.id();
        self.games.insert(id, game);
        info!("Hosting {} game(s)", self.games.len());
        Ok(id)
    }

    pub fn game(&self, id: &GameId) -> Option<&CipherBomb<B>> {
        self.games.get(id)
    }

    pub fn game_mut(&mut self, id: &GameId) -> Option<&mut CipherBomb<B>> {
        self.games.get_mut(id)
    }

    pub fn remove_game(&mut self, id: &GameId) -> Option<CipherBomb<B>> {
        self.games.remove(id)
    }

    /// Matches that have not ended yet
    pub fn active_games(&self) -> Vec<GameId> {
        self.games
            .iter()
            .filter(|(_, game)| !game.game_ended())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Pending notifications of every match
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.games
            .values_mut()
            .flat_map(|game| game.drain_events())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
