//! Schnorr signatures over the blinding generator.
//!
//! Nonces are derived deterministically from the secret and the message.

use curve25519_dalek_ng::ristretto::CompressedRistretto;
use curve25519_dalek_ng::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::commit::blinding_generator;
use crate::hash::hash_to_scalar;
use crate::keys::{public_from_secret, PublicKey, SecretKey};

const NONCE_DOMAIN: &[u8] = b"glint/schnorr/nonce";
const CHALLENGE_DOMAIN: &[u8] = b"glint/schnorr/challenge";

/// A Schnorr signature `(R, s)` with `s*G == R + e*P`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

fn challenge(r: &[u8; 32], public: &PublicKey, message: &[u8]) -> Scalar {
    hash_to_scalar(&[CHALLENGE_DOMAIN, r, public.as_bytes(), message])
}

/// Sign a message with a secret key.
pub fn sign_message(message: &[u8], secret: &SecretKey) -> Signature {
    let x = secret.to_scalar();
    let public = public_from_secret(secret);
    let k = hash_to_scalar(&[NONCE_DOMAIN, secret.as_bytes(), message]);
    let r = (k * blinding_generator()).compress().to_bytes();
    let e = challenge(&r, &public, message);
    let s = k + e * x;
    Signature { r, s: s.to_bytes() }
}

/// Verify a signature against a message and public key.
///
/// Non-canonical `s` values and undecodable points are rejected.
pub fn verify_signature(message: &[u8], signature: &Signature, public: &PublicKey) -> bool {
    let Ok(p) = public.to_point() else {
        return false;
    };
    let Some(r) = CompressedRistretto(signature.r).decompress() else {
        return false;
    };
    let Some(s) = Scalar::from_canonical_bytes(signature.s) else {
        return false;
    };
    let e = challenge(&signature.r, public, message);
    s * blinding_generator() == r + e * p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn sign_and_verify() {
        let kp = generate_keypair();
        let msg = b"test message for glint";
        let sig = sign_message(msg, &kp.secret);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = generate_keypair();
        let sig = sign_message(b"correct message", &kp.secret);
        assert!(!verify_signature(b"wrong message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = generate_keypair();
        let kp2 = generate_keypair();
        let sig = sign_message(b"test", &kp1.secret);
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn signature_deterministic() {
        let kp = keypair_from_seed(&[99u8; 32]);
        let sig1 = sign_message(b"deterministic", &kp.secret);
        let sig2 = sign_message(b"deterministic", &kp.secret);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn empty_message() {
        let kp = generate_keypair();
        let sig = sign_message(b"", &kp.secret);
        assert!(verify_signature(b"", &sig, &kp.public));
    }

    #[test]
    fn invalid_public_key() {
        let kp = generate_keypair();
        let sig = sign_message(b"test", &kp.secret);
        assert!(!verify_signature(b"test", &sig, &PublicKey::new([0xff; 32])));
    }

    #[test]
    fn tampered_scalar_fails() {
        let kp = generate_keypair();
        let mut sig = sign_message(b"test", &kp.secret);
        sig.s[0] ^= 1;
        assert!(!verify_signature(b"test", &sig, &kp.public));
    }
}
