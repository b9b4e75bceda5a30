//! Card ledger: encrypted hands and roles, plus the public per-player counts.
//!
//! Category composition of a hand stays encrypted. The number of cards a
//! player holds and whether they are eliminated are public.

use super::CipherBomb;
use crate::fhe::FheBackend;
use crate::protocol::{Category, PlayerId};
use serde::{Deserialize, Serialize};

/// Encrypted counters, one per category, plus the wires already counted
pub(crate) struct EncryptedHand<B: FheBackend> {
    pub(crate) wire: B::Uint,
    pub(crate) bomb: B::Uint,
    pub(crate) neutral: B::Uint,
    /// Wires in this hand that already count toward the tally; at most `wire`
    pub(crate) counted: B::Uint,
}

/// Encrypted one-hot choice of a category
pub(crate) struct CategoryPick<B: FheBackend> {
    pub(crate) wire: B::Bool,
    pub(crate) bomb: B::Bool,
    pub(crate) neutral: B::Bool,
    /// The picked wire already counts toward the tally
    pub(crate) counted: B::Bool,
}

impl<B: FheBackend> CategoryPick<B> {
    pub(crate) fn flag(&self, category: Category) -> &B::Bool {
        match category {
            Category::Wire => &self.wire,
            Category::Bomb => &self.bomb,
            Category::Neutral => &self.neutral,
        }
    }

    /// The picked card is a wire nobody has counted yet
    pub(crate) fn fresh_wire(&self, backend: &B) -> B::Bool {
        backend.and(&self.wire, &backend.not(&self.counted))
    }
}

impl<B: FheBackend> EncryptedHand<B> {
    pub(crate) fn empty(backend: &B) -> Self {
        Self {
            wire: backend.encrypt(0),
            bomb: backend.encrypt(0),
            neutral: backend.encrypt(0),
            counted: backend.encrypt(0),
        }
    }

    pub(crate) fn slot(&self, category: Category) -> &B::Uint {
        match category {
            Category::Wire => &self.wire,
            Category::Bomb => &self.bomb,
            Category::Neutral => &self.neutral,
        }
    }

    /// Add one card of the picked category. Every slot is rewritten.
    pub(crate) fn credit(&self, backend: &B, pick: &CategoryPick<B>) -> Self {
        let one = backend.encrypt(1);
        self.map(|category, count| {
            let bumped = backend.add(count, &one);
            backend.select(pick.flag(category), &bumped, count)
        })
    }

    /// Remove one card of the picked category. Every slot is rewritten.
    pub(crate) fn debit(&self, backend: &B, pick: &CategoryPick<B>) -> Self {
        let one = backend.encrypt(1);
        Self {
            counted: backend.sub(&self.counted, &backend.to_uint(&pick.counted)),
            ..self.map(|category, count| {
                let lowered = backend.sub(count, &one);
                backend.select(pick.flag(category), &lowered, count)
            })
        }
    }

    /// Add a cut card; a wire counts toward the tally from now on
    pub(crate) fn receive(&self, backend: &B, pick: &CategoryPick<B>) -> Self {
        Self {
            counted: backend.add(&self.counted, &backend.to_uint(&pick.wire)),
            ..self.credit(backend, pick)
        }
    }

    fn map(&self, mut f: impl FnMut(Category, &B::Uint) -> B::Uint) -> Self {
        Self {
            wire: f(Category::Wire, &self.wire),
            bomb: f(Category::Bomb, &self.bomb),
            neutral: f(Category::Neutral, &self.neutral),
            counted: self.counted.clone(),
        }
    }
}

/// A seated player
pub(crate) struct Player<B: FheBackend> {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) hand: EncryptedHand<B>,
    /// true = good guy; unset until role assignment completes
    pub(crate) role: Option<B::Bool>,
    /// Public number of cards in `hand`
    pub(crate) card_count: u32,
    pub(crate) eliminated: bool,
}

impl<B: FheBackend> Player<B> {
    pub(crate) fn new(backend: &B, id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: EncryptedHand::empty(backend),
            role: None,
            card_count: 0,
            eliminated: false,
        }
    }
}

/// Public information about a player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub cards: u32,
    pub eliminated: bool,
}

impl<B: FheBackend> CipherBomb<B> {
    /// Public card count per player, in turn order
    pub fn aggregate_card_counts(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.card_count).collect()
    }

    /// Public view of every player, in turn order
    pub fn players(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                cards: p.card_count,
                eliminated: p.eliminated,
            })
            .collect()
    }

    /// Turn order
    pub fn player_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn is_eliminated(&self, player: &PlayerId) -> Option<bool> {
        self.index_of(player).map(|i| self.players[i].eliminated)
    }

    pub(crate) fn index_of(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == player)
    }

    /// Empty every hand ahead of a new deal
    pub(crate) fn reset_hands(&mut self) {
        for player in &mut self.players {
            player.hand = EncryptedHand::empty(&self.backend);
            player.card_count = 0;
            player.eliminated = false;
        }
    }
}
