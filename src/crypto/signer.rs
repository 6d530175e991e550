//! Ed25519 keys used to sign ledger transactions.
//!
//! An account address is the last 20 bytes of SHA-256 over the 32-byte public key.

use crate::domain::address::{Address, ADDRESS_LEN};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("private key must be 32-byte seed or 64-byte secret key in hex")]
    InvalidPrivateKey,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature does not match")]
    InvalidSignature,
}

/// Signing credential presented with every mutating command.
pub struct AdminKey {
    key_pair: ed25519_compact::KeyPair,
}

impl AdminKey {
    pub fn generate() -> Self {
        Self {
            key_pair: ed25519_compact::KeyPair::generate(),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key_pair: ed25519_compact::KeyPair::from_seed(ed25519_compact::Seed::new(seed)),
        }
    }

    /// Parses a hex encoded seed (32 bytes) or full secret key (64 bytes).
    pub fn from_hex(secret: &SecretString) -> Result<Self, KeyError> {
        let raw = secret.expose_secret().trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(raw).map_err(|_| KeyError::InvalidPrivateKey)?;
        let key_pair = match bytes.len() {
            32 => {
                let seed = ed25519_compact::Seed::from_slice(&bytes)
                    .map_err(|_| KeyError::InvalidPrivateKey)?;
                ed25519_compact::KeyPair::from_seed(seed)
            }
            64 => ed25519_compact::KeyPair::from_slice(&bytes)
                .map_err(|_| KeyError::InvalidPrivateKey)?,
            _ => return Err(KeyError::InvalidPrivateKey),
        };
        Ok(Self { key_pair })
    }

    /// Hex encoding of the seed, suitable for `from_hex`.
    pub fn seed_hex(&self) -> SecretString {
        hex::encode(&self.key_pair.sk.seed()[..]).into()
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(&self.key_pair.pk[..]);
        out
    }

    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let signature = self.key_pair.sk.sign(message, None);
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&signature[..]);
        out
    }
}

pub fn address_from_public_key(public_key: &[u8; PUBLIC_KEY_LEN]) -> Address {
    let digest = Sha256::digest(public_key);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
    Address::from_bytes(bytes)
}

pub fn verify_signature(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), KeyError> {
    let public_key =
        ed25519_compact::PublicKey::from_slice(public_key).map_err(|_| KeyError::InvalidPublicKey)?;
    let signature = ed25519_compact::Signature::from_slice(signature)
        .map_err(|_| KeyError::MalformedSignature)?;
    public_key
        .verify(message, &signature)
        .map_err(|_| KeyError::InvalidSignature)
}
