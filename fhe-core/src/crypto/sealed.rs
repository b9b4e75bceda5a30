//! Values sealed to a single viewer.
//!
//! shared = viewer_pk * ephemeral_sk = ephemeral_pk * viewer_sk
//! sealed = value XOR H(shared)
//!
//! Only the holder of the viewing secret key can recompute the mask.

use crate::fhe::FheError;
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const SEAL_DOMAIN: &[u8] = b"fhe-core/reencrypt";

/// A value reencrypted under a viewer's public key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedValue {
    /// Ephemeral public key chosen by the sealer
    #[serde(with = "pubkey_serde")]
    ephemeral: PublicKey,
    /// value XOR H(shared point)
    masked: [u8; 8],
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

impl SealedValue {
    /// Seal a plaintext to `viewer` with a fresh ephemeral key
    pub fn seal(value: u64, viewer: &PublicKey) -> Result<Self, FheError> {
        let secp = Secp256k1::new();
        let ephemeral_sk = SecretKey::new(&mut rand::thread_rng());
        let ephemeral = PublicKey::from_secret_key(&secp, &ephemeral_sk);

        let shared = shared_point(viewer, &ephemeral_sk).map_err(FheError::Reencryption)?;
        let masked = xor(value.to_be_bytes(), mask(&shared));

        Ok(Self { ephemeral, masked })
    }

    /// Open with the viewing secret key that matches the sealing public key
    ///
    /// A wrong key yields an unrelated number, not an error.
    pub fn open(&self, viewing_key: &SecretKey) -> Result<u64, FheError> {
        let shared = shared_point(&self.ephemeral, viewing_key).map_err(FheError::Decryption)?;
        Ok(u64::from_be_bytes(xor(self.masked, mask(&shared))))
    }

    /// Open a sealed boolean (any non-zero value is true)
    pub fn open_bool(&self, viewing_key: &SecretKey) -> Result<bool, FheError> {
        Ok(self.open(viewing_key)? != 0)
    }
}

fn shared_point(point: &PublicKey, secret: &SecretKey) -> Result<PublicKey, String> {
    let secp = Secp256k1::new();
    let scalar = Scalar::from_be_bytes(secret.secret_bytes()).map_err(|e| e.to_string())?;
    point.mul_tweak(&secp, &scalar).map_err(|e| e.to_string())
}

fn mask(shared: &PublicKey) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(SEAL_DOMAIN);
    hasher.update(shared.serialize());
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

fn xor(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a[i] ^ b[i];
    }
    out
}

impl fmt::Debug for SealedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SealedValue({}, {})",
            hex::encode(&self.ephemeral.serialize()[..8]),
            hex::encode(self.masked)
        )
    }
}
