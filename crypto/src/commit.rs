//! Pedersen commitments over Ristretto255.
//!
//! A commitment to `value` with blinding `r` is `value*H + r*G`, where `H` is
//! the value generator and `G` the blinding generator of the Bulletproofs
//! Pedersen generator pair. Public keys are multiples of `G`, so a public key
//! can be added to a commitment and the sum still balances.

use std::fmt;
use std::sync::OnceLock;

use bulletproofs::PedersenGens;
use curve25519_dalek_ng::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek_ng::scalar::Scalar;
use curve25519_dalek_ng::traits::Identity;
use serde::{Deserialize, Serialize};

use crate::CryptoError;

pub(crate) fn pedersen_gens() -> &'static PedersenGens {
    static GENS: OnceLock<PedersenGens> = OnceLock::new();
    GENS.get_or_init(PedersenGens::default)
}

/// `H`, the generator values are committed on.
pub fn value_generator() -> RistrettoPoint {
    pedersen_gens().B
}

/// `G`, the generator blindings and public keys live on.
pub fn blinding_generator() -> RistrettoPoint {
    pedersen_gens().B_blinding
}

/// `value*H`, a commitment with zero blinding.
pub fn value_point(value: u64) -> RistrettoPoint {
    Scalar::from(value) * value_generator()
}

/// `value*H + blinding*G`.
pub fn commit(value: u64, blinding: &Scalar) -> RistrettoPoint {
    pedersen_gens().commit(Scalar::from(value), *blinding)
}

pub fn decompress(bytes: &[u8; 32]) -> Result<RistrettoPoint, CryptoError> {
    CompressedRistretto(*bytes)
        .decompress()
        .ok_or(CryptoError::InvalidPoint)
}

pub fn sum_points<'a>(points: impl IntoIterator<Item = &'a RistrettoPoint>) -> RistrettoPoint {
    points
        .into_iter()
        .fold(RistrettoPoint::identity(), |acc, p| acc + p)
}

/// A compressed commitment (or any compressed point) as carried on the wire.
///
/// The identity point compresses to 32 zero bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub const IDENTITY: Self = Self([0u8; 32]);

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

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({:02x}{:02x}{:02x}{:02x})", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}
