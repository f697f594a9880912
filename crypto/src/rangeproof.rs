//! 64-bit Bulletproofs range proofs.

use std::sync::OnceLock;

use bulletproofs::{BulletproofGens, RangeProof};
use curve25519_dalek_ng::ristretto::CompressedRistretto;
use curve25519_dalek_ng::scalar::Scalar;
use merlin::Transcript;

use crate::commit::{pedersen_gens, Commitment};
use crate::CryptoError;

pub const RANGE_PROOF_BITS: usize = 64;

const TRANSCRIPT_LABEL: &[u8] = b"glint range proof";

fn bulletproof_gens() -> &'static BulletproofGens {
    static GENS: OnceLock<BulletproofGens> = OnceLock::new();
    GENS.get_or_init(|| BulletproofGens::new(RANGE_PROOF_BITS, 1))
}

/// Prove that `value*H + blinding*G` commits to a value in `[0, 2^64)`.
///
/// Returns the serialized proof and the commitment it proves.
pub fn prove_range(value: u64, blinding: &Scalar) -> Result<(Vec<u8>, Commitment), CryptoError> {
    let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
    let (proof, committed) = RangeProof::prove_single(
        bulletproof_gens(),
        pedersen_gens(),
        &mut transcript,
        value,
        blinding,
        RANGE_PROOF_BITS,
    )
    .map_err(|e| CryptoError::RangeProof(format!("{e:?}")))?;
    Ok((proof.to_bytes(), Commitment::new(committed.to_bytes())))
}

/// Verify a serialized range proof against a commitment.
pub fn verify_range(proof: &[u8], commitment: &Commitment) -> Result<(), CryptoError> {
    let proof =
        RangeProof::from_bytes(proof).map_err(|e| CryptoError::RangeProof(format!("{e:?}")))?;
    let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
    proof
        .verify_single(
            bulletproof_gens(),
            pedersen_gens(),
            &mut transcript,
            &CompressedRistretto(*commitment.as_bytes()),
            RANGE_PROOF_BITS,
        )
        .map_err(|e| CryptoError::RangeProof(format!("{e:?}")))
}
