//! Confidential outputs and their indexes.

use std::fmt;

use serde::{Deserialize, Serialize};

use glint_crypto::{
    blake2b_256, commit, prove_range, public_from_secret, verify_range, Commitment,
    RistrettoPoint, Scalar, SecretKey,
};

use crate::codec::canonical_bytes;
use crate::excess::Excess;
use crate::TransactionError;

pub const OUTPUT_VERSION: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    Regular,
    Coinbase,
}

/// Proof that the base commitment hides a value in `[0, 2^64)`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeProof {
    /// A 64-bit Bulletproof.
    Confidential(Vec<u8>),
    /// The opening itself. Required for coinbase outputs.
    Transparent { value: u64, blinding: [u8; 32] },
}

impl fmt::Debug for RangeProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confidential(proof) => write!(f, "Confidential({} bytes)", proof.len()),
            Self::Transparent { value, .. } => write!(f, "Transparent({value})"),
        }
    }
}

/// A transaction output.
///
/// `apc` is the base commitment `v*H + r*G` plus the owner's address key.
/// The address excess signs the compressed base commitment, so knowing the
/// address secret is required to create the output and spend it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    pub version: u8,
    pub kind: OutputKind,
    pub lock_height: u64,
    pub apc: Commitment,
    pub address: Excess,
    pub range_proof: RangeProof,
    /// Opaque to consensus; wallets put the encrypted opening here.
    pub encrypted_payload: Vec<u8>,
    pub relay_fee: u64,
    /// Blake2b of a public key whose excess must accompany any spend.
    pub burden: Option<[u8; 32]>,
}

/// Parameters for [`Output::create`] beyond the opening.
#[derive(Clone, Debug, Default)]
pub struct OutputTerms {
    pub kind: Option<OutputKind>,
    pub lock_height: u64,
    pub relay_fee: u64,
    pub burden: Option<[u8; 32]>,
    pub transparent: bool,
}

impl Output {
    /// Build an output committing to `value` under `blinding`, owned by `address`.
    pub fn create(
        value: u64,
        blinding: &SecretKey,
        address: &SecretKey,
        terms: OutputTerms,
    ) -> Result<Self, TransactionError> {
        let r = blinding.to_scalar();
        let base = commit(value, &r);
        let range_proof = if terms.transparent {
            RangeProof::Transparent {
                value,
                blinding: *blinding.as_bytes(),
            }
        } else {
            let (proof, _) = prove_range(value, &r)?;
            RangeProof::Confidential(proof)
        };
        let address_point = public_from_secret(address).to_point()?;
        let base_bytes = Commitment::from_point(&base);

        Ok(Self {
            version: OUTPUT_VERSION,
            kind: terms.kind.unwrap_or(OutputKind::Regular),
            lock_height: terms.lock_height,
            apc: Commitment::from_point(&(base + address_point)),
            address: Excess::sign(address, base_bytes.as_bytes().to_vec()),
            range_proof,
            encrypted_payload: Vec::new(),
            relay_fee: terms.relay_fee,
            burden: terms.burden,
        })
    }

    pub fn index(&self) -> OutputIndex {
        OutputIndex {
            apc: self.apc,
            digest: blake2b_256(&canonical_bytes(self)),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.kind == OutputKind::Coinbase
    }

    /// Value revealed by a transparent range proof.
    pub fn transparent_value(&self) -> Option<u64> {
        match self.range_proof {
            RangeProof::Transparent { value, .. } => Some(value),
            RangeProof::Confidential(_) => None,
        }
    }

    pub fn apc_point(&self) -> Result<RistrettoPoint, TransactionError> {
        Ok(self.apc.to_point()?)
    }

    pub fn address_point(&self) -> Result<RistrettoPoint, TransactionError> {
        Ok(self.address.pubkey.to_point()?)
    }

    /// `apc - address`: the plain Pedersen commitment.
    pub fn base_commitment(&self) -> Result<Commitment, TransactionError> {
        Ok(Commitment::from_point(
            &(self.apc_point()? - self.address_point()?),
        ))
    }

    /// Self-contained checks: version, address signature and range proof.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let index = self.index();
        if self.version != OUTPUT_VERSION {
            return Err(TransactionError::Malformed(format!(
                "output {index} has version {}",
                self.version
            )));
        }
        let base = self
            .base_commitment()
            .map_err(|_| TransactionError::InvalidAddressSignature(index.to_string()))?;
        if self.address.message != base.as_bytes() || !self.address.verify() {
            return Err(TransactionError::InvalidAddressSignature(index.to_string()));
        }
        match &self.range_proof {
            RangeProof::Confidential(proof) => verify_range(proof, &base)
                .map_err(|_| TransactionError::InvalidRangeProof(index.to_string())),
            RangeProof::Transparent { value, blinding } => {
                let r = Scalar::from_canonical_bytes(*blinding)
                    .ok_or_else(|| TransactionError::InvalidRangeProof(index.to_string()))?;
                if Commitment::from_point(&commit(*value, &r)) == base {
                    Ok(())
                } else {
                    Err(TransactionError::InvalidRangeProof(index.to_string()))
                }
            }
        }
    }
}

/// APC followed by the digest of the serialized output.
///
/// Unique even among conflicting candidates for the same commitment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputIndex {
    pub apc: Commitment,
    pub digest: [u8; 32],
}

impl OutputIndex {
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(self.apc.as_bytes());
        out[32..].copy_from_slice(&self.digest);
        out
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 64 {
            return None;
        }
        let mut apc = [0u8; 32];
        let mut digest = [0u8; 32];
        apc.copy_from_slice(&bytes[..32]);
        digest.copy_from_slice(&bytes[32..]);
        Some(Self {
            apc: Commitment::new(apc),
            digest,
        })
    }
}

impl fmt::Debug for OutputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputIndex({})", hex::encode(&self.to_bytes()[..6]))
    }
}

impl fmt::Display for OutputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}
