//! Reencryption gateway: hands and roles sealed to their owner's viewing key.
//!
//! A request carries an `AuthorizationToken` signed by the player's account
//! key. Nothing is returned unless the token verifies for that player and
//! this match. The gateway reads state only and ignores turn order.

use super::{CipherBomb, GameError};
use crate::crypto::{AuthorizationToken, PlayerKeys};
use crate::fhe::{FheBackend, FheError, SealedValue};
use crate::protocol::{Category, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A hand reencrypted for one viewer, in `[wire, bomb, neutral]` order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedHand {
    pub wire: SealedValue,
    pub bomb: SealedValue,
    pub neutral: SealedValue,
}

impl SealedHand {
    /// Decrypt with the viewing key the hand was sealed to
    pub fn open(&self, keys: &PlayerKeys) -> Result<Hand, FheError> {
        Ok(Hand {
            wire: keys.open(&self.wire)?,
            bomb: keys.open(&self.bomb)?,
            neutral: keys.open(&self.neutral)?,
        })
    }
}

/// A decrypted hand
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub wire: u64,
    pub bomb: u64,
    pub neutral: u64,
}

impl Hand {
    pub fn total(&self) -> u64 {
        self.wire + self.bomb + self.neutral
    }
}

impl<B: FheBackend> CipherBomb<B> {
    fn authorize(&self, player: &PlayerId, token: &AuthorizationToken) -> Result<usize, GameError> {
        let index = self.index_of(player).ok_or(GameError::Unauthorized)?;
        if !token.verify(&self.id, player) {
            warn!("Rejected token for {} in game {}", player, self.id);
            return Err(GameError::Unauthorized);
        }
        Ok(index)
    }

    /// The player's hand sealed to the token's viewing key
    pub fn get_hand(
        &self,
        player: &PlayerId,
        token: &AuthorizationToken,
    ) -> Result<SealedHand, GameError> {
        let index = self.authorize(player, token)?;
        if self.round_number == 0 || self.deal.is_some() {
            return Err(GameError::NotReady("hand"));
        }
        let hand = &self.players[index].hand;
        let viewer = token.viewing_key();
        Ok(SealedHand {
            wire: self.backend.reencrypt(hand.slot(Category::Wire), viewer)?,
            bomb: self.backend.reencrypt(hand.slot(Category::Bomb), viewer)?,
            neutral: self.backend.reencrypt(hand.slot(Category::Neutral), viewer)?,
        })
    }

    /// The player's role sealed to the token's viewing key: 1 = good guy
    pub fn get_role(
        &self,
        player: &PlayerId,
        token: &AuthorizationToken,
    ) -> Result<SealedValue, GameError> {
        let index = self.authorize(player, token)?;
        let role = self.players[index]
            .role
            .as_ref()
            .ok_or(GameError::NotReady("role"))?;
        let role = self.backend.to_uint(role);
        Ok(self.backend.reencrypt(&role, token.viewing_key())?)
    }
}
