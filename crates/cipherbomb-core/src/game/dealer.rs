//! Round dealer: role assignment and card dealing over asynchronous randomness.
//!
//! Random values are requested from the backend and show up later. Callers
//! poll: `assign_roles` until it returns true, then `deal_round` followed by
//! `check_deal_complete` until the latter returns false. Every step is a
//! no-op once its work is done.
//!
//! Both roles and cards use the same oblivious draw: item `k` of `m` gets a
//! value uniform in `[0, m - k)` and falls into a category when the value is
//! below that category's encrypted remaining count. This yields an exact,
//! uniformly shuffled composition without revealing any single assignment.

use super::ledger::CategoryPick;
use super::{CipherBomb, GameError};
use crate::fhe::{FheBackend, RandomRequestId, RandomStatus};
use crate::protocol::GameEvent;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Upper bound for cut seeds; reduced modulo the source hand size at take time
const SEED_BOUND: u64 = 1 << 32;

/// State of one randomness request
pub(crate) struct RandomAssignment<B: FheBackend> {
    bound: u64,
    request: Option<RandomRequestId>,
    value: Option<B::Uint>,
}

impl<B: FheBackend> RandomAssignment<B> {
    pub(crate) fn new(bound: u64) -> Self {
        Self {
            bound,
            request: None,
            value: None,
        }
    }

    pub(crate) fn fulfilled(&self) -> bool {
        self.value.is_some()
    }

    /// Issue, poll, or re-issue the request. Returns whether a value is held.
    pub(crate) fn advance(&mut self, backend: &B) -> bool {
        if self.fulfilled() {
            return true;
        }
        match self.request {
            None => {
                self.request = Some(backend.request_random(self.bound));
                false
            }
            Some(id) => match backend.poll_random(id) {
                RandomStatus::Ready(value) => {
                    self.value = Some(value);
                    true
                }
                RandomStatus::Pending => false,
                RandomStatus::Unknown => {
                    warn!("Randomness request {} lost by backend, re-issuing", id);
                    self.request = Some(backend.request_random(self.bound));
                    false
                }
            },
        }
    }
}

/// A deal in progress
pub(crate) struct Deal<B: FheBackend> {
    /// One draw per card slot; slot `k` belongs to seat `k / round_cards`
    draws: Vec<RandomAssignment<B>>,
    /// One cut seed per take of the round
    seeds: Vec<RandomAssignment<B>>,
    /// Draws already credited to hands, always a prefix
    credited: usize,
    bombs_left: B::Uint,
    wires_left: B::Uint,
}

impl<B: FheBackend> Deal<B> {
    fn complete(&self) -> bool {
        self.credited == self.draws.len() && self.seeds.iter().all(|s| s.fulfilled())
    }

    fn outstanding(&self) -> usize {
        self.draws
            .iter()
            .chain(self.seeds.iter())
            .filter(|a| !a.fulfilled())
            .count()
    }
}

impl<B: FheBackend> CipherBomb<B> {
    /// True once every player holds an encrypted role
    pub fn roles_ready(&self) -> bool {
        self.roles_ready
    }

    /// True while the current round still needs dealing
    pub fn deal_pending(&self) -> bool {
        self.deal_pending
    }

    /// Issue one role draw per player
    pub(crate) fn request_roles(&mut self) {
        let n = self.players.len() as u64;
        self.role_requests = (0..n).map(|i| RandomAssignment::new(n - i)).collect();
        self.advance_role_requests();
    }

    fn advance_role_requests(&mut self) -> bool {
        let backend = &self.backend;
        self.role_requests
            .iter_mut()
            .fold(true, |ready, request| request.advance(backend) && ready)
    }

    /// Advance role assignment. Returns whether roles are ready.
    ///
    /// Emits `GameStarted` when the last role is assigned.
    pub fn assign_roles(&mut self) -> Result<bool, GameError> {
        if self.roles_ready {
            return Ok(true);
        }
        self.require_running("assign roles")?;
        if !self.advance_role_requests() {
            debug!("Game {}: role assignment still pending", self.id);
            return Ok(false);
        }
        let values: Option<Vec<B::Uint>> = std::mem::take(&mut self.role_requests)
            .into_iter()
            .map(|request| request.value)
            .collect();
        let Some(values) = values else {
            return Ok(false);
        };

        let backend = &self.backend;
        let mut bad_left = backend.encrypt(self.config.bad_guys as u64);
        for (player, draw) in self.players.iter_mut().zip(values) {
            let is_bad = backend.lt(&draw, &bad_left);
            bad_left = backend.sub(&bad_left, &backend.to_uint(&is_bad));
            player.role = Some(backend.not(&is_bad));
        }
        self.roles_ready = true;

        info!(
            "Game {}: roles assigned ({} bad guys among {} players)",
            self.id,
            self.config.bad_guys,
            self.players.len()
        );
        self.emit(GameEvent::GameStarted {
            game_id: self.id,
            players: self.player_order(),
        });
        Ok(true)
    }

    /// Issue or advance the randomness for the current round's deal
    pub fn deal_round(&mut self) -> Result<(), GameError> {
        self.require_running("deal round")?;
        if !self.roles_ready {
            return Err(GameError::NotReady("roles"));
        }
        if self.round_cards < self.config.last_round_cards {
            return Err(GameError::RoundExhausted);
        }
        if !self.deal_pending {
            return Ok(());
        }
        if self.deal.is_none() {
            self.reset_hands();
            self.deal = Some(self.new_deal());
            info!(
                "Game {}: dealing round {} ({} cards each)",
                self.id,
                self.round_number + 1,
                self.round_cards
            );
        }

        let backend = &self.backend;
        if let Some(deal) = self.deal.as_mut() {
            for assignment in deal.draws.iter_mut().chain(deal.seeds.iter_mut()) {
                assignment.advance(backend);
            }
            debug!(
                "Game {}: {} random draws outstanding",
                self.id,
                deal.outstanding()
            );
        }
        Ok(())
    }

    fn new_deal(&self) -> Deal<B> {
        let n = self.players.len() as u64;
        let total = n * self.round_cards as u64;
        let backend = &self.backend;
        let wires_total = backend.encrypt(self.config.wires_to_defuse(self.players.len()));
        Deal {
            draws: (0..total).map(|k| RandomAssignment::new(total - k)).collect(),
            seeds: (0..n).map(|_| RandomAssignment::new(SEED_BOUND)).collect(),
            credited: 0,
            bombs_left: backend.encrypt(1),
            wires_left: backend.sub(&wires_total, &self.tally.wires_cut),
        }
    }

    /// Credit resolved draws to hands. Returns whether the deal is still pending.
    ///
    /// Emits `RoundDealt` when the last draw is credited.
    pub fn check_deal_complete(&mut self) -> Result<bool, GameError> {
        self.require_running("check deal")?;
        if !self.roles_ready {
            return Err(GameError::NotReady("roles"));
        }
        if !self.deal_pending {
            return Ok(false);
        }
        let standing = self.evaluate_standing()?;
        let Some(mut deal) = self.deal.take() else {
            // deal_round has not been called for this round yet
            return Ok(true);
        };

        while deal.credited < deal.draws.len() {
            let Some(draw) = deal.draws[deal.credited].value.clone() else {
                break;
            };
            let seat = deal.credited / self.round_cards as usize;
            self.credit_draw(&mut deal, seat, &draw);
            deal.credited += 1;
        }

        if !deal.complete() {
            debug!(
                "Game {}: {}/{} cards credited",
                self.id,
                deal.credited,
                deal.draws.len()
            );
            self.deal = Some(deal);
            return Ok(true);
        }

        self.cut_seeds = deal
            .seeds
            .into_iter()
            .filter_map(|seed| seed.value)
            .collect::<VecDeque<_>>();
        self.deal_pending = false;
        self.round_number += 1;
        self.takes_this_round = 0;
        info!(
            "Game {}: round {} dealt, {} cards each",
            self.id, self.round_number, self.round_cards
        );
        self.emit(GameEvent::RoundDealt {
            game_id: self.id,
            round: self.round_number,
            cards_per_player: self.round_cards,
        });
        if let Some(outcome) = standing {
            self.conclude(outcome);
        }
        Ok(false)
    }

    fn credit_draw(&mut self, deal: &mut Deal<B>, seat: usize, draw: &B::Uint) {
        let backend = &self.backend;
        let below_bombs = backend.lt(draw, &deal.bombs_left);
        let live = backend.add(&deal.bombs_left, &deal.wires_left);
        let below_live = backend.lt(draw, &live);
        let pick = CategoryPick {
            wire: backend.and(&backend.not(&below_bombs), &below_live),
            neutral: backend.not(&below_live),
            bomb: below_bombs,
            counted: backend.encrypt_bool(false),
        };
        deal.bombs_left = backend.sub(&deal.bombs_left, &backend.to_uint(&pick.bomb));
        deal.wires_left = backend.sub(&deal.wires_left, &backend.to_uint(&pick.wire));

        let player = &mut self.players[seat];
        player.hand = player.hand.credit(backend, &pick);
        player.card_count += 1;
    }
}
