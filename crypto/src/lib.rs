//! Cryptographic primitives for glint.
//!
//! - **Blake2b** for identities, digests and Merkle hashing
//! - **Ristretto255** keys with Schnorr signatures over the blinding generator
//! - **Pedersen commitments** `v*H + r*G` and their point arithmetic
//! - **Bulletproofs** 64-bit range proofs for confidential outputs

pub mod commit;
pub mod error;
pub mod hash;
pub mod keys;
pub mod rangeproof;
pub mod sign;

pub use commit::{
    blinding_generator, commit, decompress, sum_points, value_generator, value_point, Commitment,
};
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, blake2b_512_multi, hash_to_scalar};
pub use keys::{generate_keypair, keypair_from_seed, public_from_secret, KeyPair, PublicKey, SecretKey};
pub use rangeproof::{prove_range, verify_range, RANGE_PROOF_BITS};
pub use sign::{sign_message, verify_signature, Signature};

pub use curve25519_dalek_ng::ristretto::{CompressedRistretto, RistrettoPoint};
pub use curve25519_dalek_ng::scalar::Scalar;
pub use curve25519_dalek_ng::traits::Identity;
