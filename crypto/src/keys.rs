//! Ristretto key pairs.
//!
//! Secret keys are scalars; public keys are `secret*G` over the blinding
//! generator so they can be summed with commitments.

use std::fmt;

use curve25519_dalek_ng::ristretto::RistrettoPoint;
use curve25519_dalek_ng::scalar::Scalar;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::commit::{blinding_generator, decompress};
use crate::hash::hash_to_scalar;
use crate::CryptoError;

const SEED_DOMAIN: &[u8] = b"glint/keypair-seed";

/// A secret scalar in canonical little-endian encoding.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        Scalar::from_canonical_bytes(bytes).ok_or(CryptoError::InvalidScalar)?;
        Ok(Self(bytes))
    }

    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self(scalar.to_bytes())
    }

    pub fn random() -> Self {
        Self::from_scalar(&Scalar::random(&mut rand::thread_rng()))
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A compressed public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    pub fn to_point(&self) -> Result<RistrettoPoint, CryptoError> {
        decompress(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:02x}{:02x}{:02x}{:02x})", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

/// Generate a key pair from the thread-local CSPRNG.
pub fn generate_keypair() -> KeyPair {
    let secret = SecretKey::random();
    KeyPair {
        public: public_from_secret(&secret),
        secret,
    }
}

/// Derive a key pair deterministically from seed bytes.
pub fn keypair_from_seed(seed: &[u8]) -> KeyPair {
    let secret = SecretKey::from_scalar(&hash_to_scalar(&[SEED_DOMAIN, seed]));
    KeyPair {
        public: public_from_secret(&secret),
        secret,
    }
}

pub fn public_from_secret(secret: &SecretKey) -> PublicKey {
    PublicKey::from_point(&(secret.to_scalar() * blinding_generator()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = keypair_from_seed(b"seed");
        let b = keypair_from_seed(b"seed");
        assert_eq!(a.public, b.public);
        assert_eq!(a.secret, b.secret);
        assert_ne!(a.public, keypair_from_seed(b"other").public);
    }

    #[test]
    fn public_key_round_trips_through_point() {
        let kp = generate_keypair();
        let point = kp.public.to_point().unwrap();
        assert_eq!(PublicKey::from_point(&point), kp.public);
    }

    #[test]
    fn non_canonical_secret_rejected() {
        assert_eq!(
            SecretKey::from_bytes([0xff; 32]).unwrap_err(),
            CryptoError::InvalidScalar
        );
    }
}
