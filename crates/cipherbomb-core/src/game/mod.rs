//! The encrypted game-state machine.
//!
//! A `CipherBomb` value is one match. Every mutating method validates all of
//! its preconditions before touching state, so a returned error means nothing
//! changed. Read methods never mutate.

mod config;
mod dealer;
mod error;
mod evaluator;
mod gateway;
mod host;
mod ledger;
mod registry;
mod transfer;
mod turn;

pub use config::{ConfigError, GameConfig};
pub use error::GameError;
pub use gateway::{Hand, SealedHand};
pub use host::GameHost;
pub use ledger::PlayerView;

use crate::fhe::FheBackend;
use crate::protocol::{GameEvent, GameId, Outcome, Phase};
use dealer::{Deal, RandomAssignment};
use ledger::Player;
use std::collections::VecDeque;
use tracing::info;

/// Encrypted running totals the win condition is evaluated on
pub(crate) struct Tally<B: FheBackend> {
    /// Distinct wire cards taken so far
    pub(crate) wires_cut: B::Uint,
    /// Whether the bomb has been taken
    pub(crate) bomb_cut: B::Bool,
}

/// One match of CipherBomb over a homomorphic backend
pub struct CipherBomb<B: FheBackend> {
    pub(crate) id: GameId,
    pub(crate) config: GameConfig,
    pub(crate) backend: B,
    pub(crate) phase: Phase,
    /// Join order, which is also turn order
    pub(crate) players: Vec<Player<B>>,
    pub(crate) turn_index: usize,
    pub(crate) round_cards: u32,
    /// Completed deals
    pub(crate) round_number: u32,
    pub(crate) takes_this_round: u32,
    pub(crate) role_requests: Vec<RandomAssignment<B>>,
    pub(crate) roles_ready: bool,
    pub(crate) deal_pending: bool,
    pub(crate) deal: Option<Deal<B>>,
    /// One encrypted seed per remaining take in the round
    pub(crate) cut_seeds: VecDeque<B::Uint>,
    pub(crate) tally: Tally<B>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) events: Vec<GameEvent>,
}

impl<B: FheBackend> CipherBomb<B> {
    /// Create an open match with a fresh id
    pub fn new(backend: B, config: GameConfig) -> Result<Self, GameError> {
        Self::with_id(GameId::new(), backend, config)
    }

    /// Create an open match with a known id
    pub fn with_id(id: GameId, backend: B, config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let tally = Tally {
            wires_cut: backend.encrypt(0),
            bomb_cut: backend.encrypt_bool(false),
        };
        info!("Created game {} ({:?})", id, config);
        Ok(Self {
            id,
            round_cards: config.first_round_cards,
            config,
            backend,
            phase: Phase::Open,
            players: Vec::new(),
            turn_index: 0,
            round_number: 0,
            takes_this_round: 0,
            role_requests: Vec::new(),
            roles_ready: false,
            deal_pending: false,
            deal: None,
            cut_seeds: VecDeque::new(),
            tally,
            outcome: None,
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game_open(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn game_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn game_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Cards per player dealt in the current round
    pub fn round_cards_remaining(&self) -> u32 {
        self.round_cards
    }

    /// Number of deals completed so far
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Takes left before the current round ends
    pub fn takes_remaining_in_round(&self) -> u32 {
        (self.players.len() as u32).saturating_sub(self.takes_this_round)
    }

    /// Notifications emitted so far, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take all pending notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Fail unless the match is running
    pub(crate) fn require_running(&self, operation: &'static str) -> Result<(), GameError> {
        match self.phase {
            Phase::Running => Ok(()),
            Phase::Ended => Err(GameError::GameEnded),
            Phase::Open => Err(GameError::Phase {
                operation,
                reason: "game has not started".to_string(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::crypto::PlayerKeys;
    use crate::fhe::MockFheBackend;
    use crate::protocol::{Category, PlayerId};

    /// A match with generated players and a handle on its backend
    pub(crate) struct Table {
        pub(crate) game: CipherBomb<MockFheBackend>,
        pub(crate) backend: MockFheBackend,
        pub(crate) keys: Vec<PlayerKeys>,
        pub(crate) ids: Vec<PlayerId>,
    }

    impl Table {
        pub(crate) fn with_backend(players: usize, config: GameConfig, backend: MockFheBackend) -> Self {
            let mut game = CipherBomb::new(backend.clone(), config).unwrap();
            let keys: Vec<PlayerKeys> = (0..players).map(|_| PlayerKeys::generate()).collect();
            let ids: Vec<PlayerId> = keys.iter().map(|k| k.player_id()).collect();
            for (i, id) in ids.iter().enumerate() {
                game.join(*id, format!("player-{}", i)).unwrap();
            }
            Self {
                game,
                backend,
                keys,
                ids,
            }
        }

        pub(crate) fn with_config(players: usize, config: GameConfig, seed: u64, latency: u32) -> Self {
            Self::with_backend(players, config, MockFheBackend::with_latency(seed, latency))
        }

        pub(crate) fn seated(players: usize, seed: u64, latency: u32) -> Self {
            Self::with_config(players, GameConfig::default(), seed, latency)
        }

        pub(crate) fn started(players: usize, seed: u64, latency: u32) -> Self {
            let mut table = Self::seated(players, seed, latency);
            table.game.start_game().unwrap();
            table
        }

        pub(crate) fn assign_roles(&mut self) {
            for _ in 0..100 {
                if self.game.assign_roles().unwrap() {
                    return;
                }
            }
            panic!("roles never became ready");
        }

        pub(crate) fn deal(&mut self) {
            for _ in 0..100 {
                self.game.deal_round().unwrap();
                if !self.game.check_deal_complete().unwrap() {
                    return;
                }
            }
            panic!("deal never completed");
        }

        /// Plaintext hand of seat `i`, read through a throwaway viewer
        pub(crate) fn open_hand(&self, i: usize) -> Hand {
            let viewer = PlayerKeys::generate();
            let hand = &self.game.players[i].hand;
            let [wire, bomb, neutral] = Category::ALL.map(|c| {
                let sealed = self
                    .backend
                    .reencrypt(hand.slot(c), &viewer.viewing_public_key())
                    .unwrap();
                viewer.open(&sealed).unwrap()
            });
            Hand { wire, bomb, neutral }
        }

        pub(crate) fn open_wires_cut(&self) -> u64 {
            let viewer = PlayerKeys::generate();
            let sealed = self
                .backend
                .reencrypt(&self.game.tally.wires_cut, &viewer.viewing_public_key())
                .unwrap();
            viewer.open(&sealed).unwrap()
        }

        /// Role of seat `i`: true = good guy
        pub(crate) fn open_role(&self, i: usize) -> bool {
            let role = self.game.players[i].role.as_ref().unwrap();
            self.backend.reveal(role).unwrap()
        }
    }
}
