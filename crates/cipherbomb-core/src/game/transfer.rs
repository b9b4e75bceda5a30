//! Card transfer: the current player cuts one card from another player's hand.
//!
//! The card is chosen by an encrypted seed reduced modulo the public size of
//! the source hand, then mapped onto the `[wire | bomb | neutral]` layout of
//! the encrypted counters. Wires that already count toward the tally sit at
//! the front of the wire range, so a wire passed back and forth is counted
//! once. Neither the seed, the position, nor the category is ever decrypted;
//! both hands get every counter rewritten through select.

use super::evaluator::Verdict;
use super::ledger::CategoryPick;
use super::{CipherBomb, GameError, Tally};
use crate::fhe::FheBackend;
use crate::protocol::{GameEvent, PlayerId};
use tracing::{debug, info};

impl<B: FheBackend> CipherBomb<B> {
    /// Move one card from `from` into the caller's hand and pass the turn
    pub fn take_card(&mut self, caller: &PlayerId, from: &PlayerId) -> Result<(), GameError> {
        self.require_running("take card")?;
        if !self.roles_ready {
            return Err(GameError::NotReady("roles"));
        }
        if self.deal_pending {
            return Err(GameError::NotReady("deal"));
        }
        self.require_current_player(caller)?;
        if caller == from {
            return Err(GameError::InvalidTarget(*from));
        }
        let source = self
            .index_of(from)
            .filter(|&i| !self.players[i].eliminated)
            .ok_or(GameError::InvalidTarget(*from))?;
        let count = self.players[source].card_count;
        if count == 0 {
            return Err(GameError::EmptyHand(*from));
        }
        let target = self.turn_index;
        let seed = self.cut_seeds.front().ok_or(GameError::NotReady("cut seed"))?;

        let backend = &self.backend;
        let hand = &self.players[source].hand;
        let position = backend.rem_plain(seed, count as u64)?;
        let is_wire = backend.lt(&position, &hand.wire);
        let live = backend.add(&hand.wire, &hand.bomb);
        let below_live = backend.lt(&position, &live);
        let pick = CategoryPick {
            bomb: backend.and(&backend.not(&is_wire), &below_live),
            neutral: backend.not(&below_live),
            wire: is_wire,
            counted: backend.lt(&position, &hand.counted),
        };
        let source_hand = hand.debit(backend, &pick);
        let target_hand = self.players[target].hand.receive(backend, &pick);
        let fresh = backend.to_uint(&pick.fresh_wire(backend));
        let tally = Tally {
            wires_cut: backend.add(&self.tally.wires_cut, &fresh),
            bomb_cut: backend.or(&self.tally.bomb_cut, &pick.bomb),
        };
        let verdict = self.evaluate_take(&tally, self.takes_this_round + 1)?;

        let source_player = &mut self.players[source];
        source_player.hand = source_hand;
        source_player.card_count -= 1;
        if source_player.card_count == 0 {
            source_player.eliminated = true;
            info!("Player {} eliminated in game {}", from, self.id);
        }
        let target_player = &mut self.players[target];
        target_player.hand = target_hand;
        target_player.card_count += 1;
        self.tally = tally;
        self.cut_seeds.pop_front();
        self.takes_this_round += 1;

        debug!(
            "Game {}: {} took a card from {} ({} takes left this round)",
            self.id,
            caller,
            from,
            self.takes_remaining_in_round()
        );
        self.emit(GameEvent::CardTaken {
            game_id: self.id,
            from: *from,
            to: *caller,
        });

        match verdict {
            Verdict::Continue => self.advance_turn(),
            Verdict::RoundOver => {
                self.close_round();
                self.advance_turn();
            }
            Verdict::Ended(outcome) => self.conclude(outcome),
        }
        Ok(())
    }
}
