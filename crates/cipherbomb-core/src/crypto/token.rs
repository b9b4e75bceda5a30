//! Authorization tokens for the reencryption gateway.
//!
//! token = (V, sig_A(H("cipherbomb/view" || game_id || V)))
//! where:
//!   V = viewing public key the secret gets reencrypted under
//!   A = player's account key (its public half is the PlayerId)
//!   game_id = the match the token is scoped to

use crate::protocol::{GameId, PlayerId};
use fhe_core::{FheError, SealedValue};
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const VIEW_DOMAIN: &[u8] = b"cipherbomb/view";

/// Signed proof that a player controls a viewing key, for one game
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    #[serde(with = "pubkey_serde")]
    viewing_key: PublicKey,
    /// Compact ECDSA signature by the account key
    #[serde(with = "signature_serde")]
    signature: [u8; 64],
}

mod pubkey_serde {
    use secp256k1::PublicKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(key: &PublicKey, s: S) -> Result<S::Ok, S::Error> {
        hex::encode(key.serialize()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        let hex_str = String::deserialize(d)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        PublicKey::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

mod signature_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], s: S) -> Result<S::Ok, S::Error> {
        hex::encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 64], D::Error> {
        let hex_str = String::deserialize(d)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        if bytes.len() != 64 {
            return Err(serde::de::Error::custom("expected 64 bytes"));
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

/// H("cipherbomb/view" || game_id || V)
fn authorization_digest(game_id: &GameId, viewing_key: &PublicKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(VIEW_DOMAIN);
    hasher.update(game_id.as_bytes());
    hasher.update(viewing_key.serialize());
    hasher.finalize().into()
}

impl AuthorizationToken {
    /// Sign a viewing key with the account key for `game_id`
    pub fn new(game_id: &GameId, account_key: &SecretKey, viewing_key: PublicKey) -> Self {
        let secp = Secp256k1::new();
        let message = Message::from_digest(authorization_digest(game_id, &viewing_key));
        let signature = secp.sign_ecdsa(&message, account_key).serialize_compact();
        Self {
            viewing_key,
            signature,
        }
    }

    /// Does this token prove `owner` authorized the viewing key for `game_id`?
    pub fn verify(&self, game_id: &GameId, owner: &PlayerId) -> bool {
        let Ok(signature) = ecdsa::Signature::from_compact(&self.signature) else {
            return false;
        };
        let secp = Secp256k1::verification_only();
        let message = Message::from_digest(authorization_digest(game_id, &self.viewing_key));
        secp.verify_ecdsa(&message, &signature, owner.as_pubkey())
            .is_ok()
    }

    /// Public key reencrypted secrets are sealed under
    pub fn viewing_key(&self) -> &PublicKey {
        &self.viewing_key
    }
}

impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuthorizationToken({})",
            hex::encode(&self.viewing_key.serialize()[..8])
        )
    }
}

/// A player's secrets: the account key behind their PlayerId and the
/// viewing key their hand and role get reencrypted under
#[derive(Clone)]
pub struct PlayerKeys {
    account: SecretKey,
    viewing: SecretKey,
}

impl PlayerKeys {
    /// Generate fresh account and viewing keys
    pub fn generate() -> Self {
        Self {
            account: SecretKey::new(&mut rand::thread_rng()),
            viewing: SecretKey::new(&mut rand::thread_rng()),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        let secp = Secp256k1::new();
        PlayerId::from_pubkey(PublicKey::from_secret_key(&secp, &self.account))
    }

    pub fn viewing_public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secret_key(&secp, &self.viewing)
    }

    /// Issue a token for `game_id`
    pub fn authorize(&self, game_id: &GameId) -> AuthorizationToken {
        AuthorizationToken::new(game_id, &self.account, self.viewing_public_key())
    }

    /// Decrypt a value reencrypted under this player's viewing key
    pub fn open(&self, sealed: &SealedValue) -> Result<u64, FheError> {
        sealed.open(&self.viewing)
    }

    pub fn open_bool(&self, sealed: &SealedValue) -> Result<bool, FheError> {
        sealed.open_bool(&self.viewing)
    }
}

impl fmt::Debug for PlayerKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerKeys({})", self.player_id())
    }
}
