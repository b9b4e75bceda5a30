//! Win condition evaluation on the encrypted tally.
//!
//! Only two bits are ever revealed: whether the bomb has been cut, and
//! whether enough wires have been cut. Each is decrypted publicly only
//! because its value ends the match or is known to be false.

use super::{CipherBomb, GameError, Tally};
use crate::fhe::FheBackend;
use crate::protocol::{GameEvent, Outcome, Phase};
use tracing::info;

/// What a take leads to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Same round, next player
    Continue,
    /// Every player has taken once; a new deal is needed
    RoundOver,
    Ended(Outcome),
}

impl<B: FheBackend> CipherBomb<B> {
    /// Reveal the outcome bits of `tally`
    pub(crate) fn judge(&self, tally: &Tally<B>) -> Result<Option<Outcome>, GameError> {
        let backend = &self.backend;
        if backend.reveal(&tally.bomb_cut)? {
            return Ok(Some(Outcome::BadGuysWin));
        }
        let target = backend.encrypt(self.config.wires_to_defuse(self.players.len()));
        let short = backend.lt(&tally.wires_cut, &target);
        if backend.reveal(&backend.not(&short))? {
            return Ok(Some(Outcome::GoodGuysWin));
        }
        Ok(None)
    }

    /// Outcome of the current tally, if it is decisive
    pub(crate) fn evaluate_standing(&self) -> Result<Option<Outcome>, GameError> {
        self.judge(&self.tally)
    }

    /// Verdict for a take that would leave `tally` behind and bring the
    /// round's take count to `takes`
    pub(crate) fn evaluate_take(&self, tally: &Tally<B>, takes: u32) -> Result<Verdict, GameError> {
        if let Some(outcome) = self.judge(tally)? {
            return Ok(Verdict::Ended(outcome));
        }
        if (takes as usize) < self.players.len() {
            return Ok(Verdict::Continue);
        }
        if self.round_cards <= self.config.last_round_cards {
            // last round played out with the bomb still live
            return Ok(Verdict::Ended(Outcome::BadGuysWin));
        }
        Ok(Verdict::RoundOver)
    }

    /// Shrink the hands and ask for a new deal
    pub(crate) fn close_round(&mut self) {
        self.round_cards -= 1;
        self.deal_pending = true;
        self.takes_this_round = 0;
        for player in &mut self.players {
            player.eliminated = false;
        }
        info!(
            "Game {}: round {} over, next deal has {} cards each",
            self.id, self.round_number, self.round_cards
        );
    }

    /// Announce the outcome and end the match
    pub(crate) fn conclude(&mut self, outcome: Outcome) {
        self.phase = Phase::Ended;
        self.outcome = Some(outcome);
        self.deal_pending = false;
        self.deal = None;
        self.cut_seeds.clear();
        info!("Game {} ended: {}", self.id, outcome);
        self.emit(GameEvent::outcome(self.id, outcome));
    }
}
