//! Excesses: proven public keys, optionally authorizing a message.

use std::fmt;

use serde::{Deserialize, Serialize};

use glint_crypto::{
    blake2b_256, blake2b_256_multi, public_from_secret, sign_message, verify_signature, PublicKey,
    SecretKey, Signature,
};

use crate::codec::canonical_bytes;

const EXCESS_DOMAIN: &[u8] = b"glint/excess";

/// A public key with a signature proving knowledge of its secret, over `message`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Excess {
    pub pubkey: PublicKey,
    pub signature: Signature,
    pub message: Vec<u8>,
}

fn signing_digest(message: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[EXCESS_DOMAIN, message])
}

impl Excess {
    pub fn sign(secret: &SecretKey, message: Vec<u8>) -> Self {
        Self {
            pubkey: public_from_secret(secret),
            signature: sign_message(&signing_digest(&message), secret),
            message,
        }
    }

    pub fn verify(&self) -> bool {
        verify_signature(&signing_digest(&self.message), &self.signature, &self.pubkey)
    }

    pub fn index(&self) -> ExcessIndex {
        ExcessIndex {
            pubkey: self.pubkey,
            digest: blake2b_256(&canonical_bytes(self)),
        }
    }

    /// Hash a burden names: spending a burdened output needs an excess with this key.
    pub fn burden_hash(pubkey: &PublicKey) -> [u8; 32] {
        blake2b_256(pubkey.as_bytes())
    }
}

/// Public key followed by the digest of the serialized excess.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExcessIndex {
    pub pubkey: PublicKey,
    pub digest: [u8; 32],
}

impl ExcessIndex {
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(self.pubkey.as_bytes());
        out[32..].copy_from_slice(&self.digest);
        out
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 64 {
            return None;
        }
        let mut pubkey = [0u8; 32];
        let mut digest = [0u8; 32];
        pubkey.copy_from_slice(&bytes[..32]);
        digest.copy_from_slice(&bytes[32..]);
        Some(Self {
            pubkey: PublicKey::new(pubkey),
            digest,
        })
    }
}

impl fmt::Debug for ExcessIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExcessIndex({})", hex::encode(&self.to_bytes()[..6]))
    }
}

impl fmt::Display for ExcessIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_crypto::generate_keypair;

    #[test]
    fn signed_excess_verifies() {
        let kp = generate_keypair();
        let excess = Excess::sign(&kp.secret, b"claim".to_vec());
        assert!(excess.verify());
        assert_eq!(excess.pubkey, kp.public);
    }

    #[test]
    fn altered_message_fails() {
        let kp = generate_keypair();
        let mut excess = Excess::sign(&kp.secret, b"claim".to_vec());
        excess.message = b"other".to_vec();
        assert!(!excess.verify());
    }

    #[test]
    fn index_round_trips_and_starts_with_key() {
        let kp = generate_keypair();
        let index = Excess::sign(&kp.secret, Vec::new()).index();
        let bytes = index.to_bytes();
        assert_eq!(&bytes[..32], kp.public.as_bytes());
        assert_eq!(ExcessIndex::from_slice(&bytes), Some(index));
        assert_eq!(ExcessIndex::from_slice(&bytes[..10]), None);
    }
}
