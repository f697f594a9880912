//! Wallet-side construction of balanced transactions.

use glint_crypto::{Scalar, SecretKey};
use glint_types::ConsensusParams;

use crate::excess::Excess;
use crate::output::{Output, OutputIndex, OutputKind, OutputTerms};
use crate::transaction::Transaction;
use crate::TransactionError;

/// An output together with the secrets needed to spend it.
#[derive(Clone, Debug)]
pub struct SpendableOutput {
    pub output: Output,
    pub value: u64,
    pub blinding: SecretKey,
    pub address: SecretKey,
}

impl SpendableOutput {
    pub fn index(&self) -> OutputIndex {
        self.output.index()
    }
}

/// One output a [`TransactionBuilder`] should create.
#[derive(Clone, Debug)]
pub struct OutputRequest {
    pub value: u64,
    pub address: SecretKey,
    pub relay_fee: u64,
    pub burden: Option<[u8; 32]>,
    pub lock_height: u64,
    pub transparent: bool,
}

impl OutputRequest {
    pub fn new(value: u64, address: SecretKey) -> Self {
        Self {
            value,
            address,
            relay_fee: 0,
            burden: None,
            lock_height: 0,
            transparent: false,
        }
    }

    pub fn with_relay_fee(mut self, relay_fee: u64) -> Self {
        self.relay_fee = relay_fee;
        self
    }

    pub fn with_burden(mut self, burden: [u8; 32]) -> Self {
        self.burden = Some(burden);
        self
    }

    pub fn with_lock_height(mut self, lock_height: u64) -> Self {
        self.lock_height = lock_height;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }
}

/// Builds a sorted, balanced transaction.
///
/// Input values must equal output values plus the transaction fee. The
/// main excess claims the first requested output; each burden key claims
/// one of the following outputs.
pub struct TransactionBuilder<'a> {
    params: &'a ConsensusParams,
    inputs: Vec<SpendableOutput>,
    burden_keys: Vec<SecretKey>,
    outputs: Vec<OutputRequest>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(params: &'a ConsensusParams) -> Self {
        Self {
            params,
            inputs: Vec::new(),
            burden_keys: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn spend(mut self, input: SpendableOutput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn burden_key(mut self, key: SecretKey) -> Self {
        self.burden_keys.push(key);
        self
    }

    pub fn output(mut self, request: OutputRequest) -> Self {
        self.outputs.push(request);
        self
    }

    /// Returns the transaction and the created outputs in request order.
    pub fn build(self) -> Result<(Transaction, Vec<SpendableOutput>), TransactionError> {
        if self.outputs.len() < 1 + self.burden_keys.len() {
            return Err(TransactionError::Build(format!(
                "{} outputs cannot carry {} excesses",
                self.outputs.len(),
                1 + self.burden_keys.len()
            )));
        }

        let created = self
            .outputs
            .into_iter()
            .map(|request| {
                let blinding = SecretKey::random();
                let output = Output::create(
                    request.value,
                    &blinding,
                    &request.address,
                    OutputTerms {
                        kind: Some(OutputKind::Regular),
                        lock_height: request.lock_height,
                        relay_fee: request.relay_fee,
                        burden: request.burden,
                        transparent: request.transparent,
                    },
                )?;
                Ok(SpendableOutput {
                    output,
                    value: request.value,
                    blinding,
                    address: request.address,
                })
            })
            .collect::<Result<Vec<_>, TransactionError>>()?;

        let mut tx = Transaction {
            inputs: self.inputs.iter().map(|i| i.output.clone()).collect(),
            outputs: created.iter().map(|o| o.output.clone()).collect(),
            additional_excesses: Vec::new(),
        };

        let fee = tx.fee(self.params)?;
        let spent: i128 = self.inputs.iter().map(|i| i128::from(i.value)).sum();
        let made: i128 = created.iter().map(|o| i128::from(o.value)).sum();
        if spent != made + fee {
            return Err(TransactionError::Build(format!(
                "inputs {spent} do not cover outputs {made} plus fee {fee}"
            )));
        }

        let blinding_out: Scalar = created.iter().map(|o| o.blinding.to_scalar()).sum();
        let blinding_in: Scalar = self
            .inputs
            .iter()
            .map(|i| i.blinding.to_scalar() + i.address.to_scalar())
            .sum();
        let burdens: Scalar = self.burden_keys.iter().map(SecretKey::to_scalar).sum();
        let main = SecretKey::from_scalar(&(blinding_out - blinding_in - burdens));

        let claims = std::iter::once(&main).chain(self.burden_keys.iter());
        tx.additional_excesses = claims
            .zip(&created)
            .map(|(key, target)| Excess::sign(key, target.output.apc.as_bytes().to_vec()))
            .collect();
        tx.sort();
        Ok((tx, created))
    }
}

/// A coinbase-only transaction minting `value` in the block at `height`.
pub fn coinbase_transaction(
    params: &ConsensusParams,
    value: u64,
    height: u64,
    address: &SecretKey,
) -> Result<(Transaction, SpendableOutput), TransactionError> {
    coinbase_from_opening(params, value, height, address, SecretKey::random())
}

/// As [`coinbase_transaction`] with a caller-chosen blinding factor.
pub fn coinbase_from_opening(
    params: &ConsensusParams,
    value: u64,
    height: u64,
    address: &SecretKey,
    blinding: SecretKey,
) -> Result<(Transaction, SpendableOutput), TransactionError> {
    let output = Output::create(
        value,
        &blinding,
        address,
        OutputTerms {
            kind: Some(OutputKind::Coinbase),
            lock_height: params.coinbase_lock_height(height),
            relay_fee: 0,
            burden: None,
            transparent: true,
        },
    )?;
    let excess = Excess::sign(&blinding, output.apc.as_bytes().to_vec());
    let tx = Transaction {
        inputs: Vec::new(),
        outputs: vec![output.clone()],
        additional_excesses: vec![excess],
    };
    Ok((
        tx,
        SpendableOutput {
            output,
            value,
            blinding,
            address: address.clone(),
        },
    ))
}
