//! Transactions, skeletons, fees and merging.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use glint_crypto::blake2b_256;
use glint_types::{ConsensusParams, Hash256};

use crate::codec::{canonical_bytes, decode};
use crate::excess::{Excess, ExcessIndex};
use crate::output::{Output, OutputIndex};
use crate::TransactionError;

/// Wire form of a transaction: references and excesses, no payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSkeleton {
    pub input_indexes: Vec<OutputIndex>,
    pub output_indexes: Vec<OutputIndex>,
    pub additional_excesses: Vec<Excess>,
}

impl TransactionSkeleton {
    pub fn to_bytes(&self) -> Vec<u8> {
        canonical_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        decode(bytes)
    }

    pub fn id(&self) -> Hash256 {
        Hash256::new(blake2b_256(&self.to_bytes()))
    }

    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Every index this skeleton references, inputs first.
    pub fn referenced_indexes(&self) -> impl Iterator<Item = &OutputIndex> {
        self.input_indexes.iter().chain(self.output_indexes.iter())
    }

    /// Resolve every referenced output through `resolve`.
    ///
    /// Fails with the indexes `resolve` could not supply; an output whose
    /// own index differs from the requested one counts as missing.
    pub fn materialize<F>(&self, mut resolve: F) -> Result<Transaction, Vec<OutputIndex>>
    where
        F: FnMut(&OutputIndex) -> Option<Output>,
    {
        let mut missing = Vec::new();
        let mut fetch = |indexes: &[OutputIndex]| -> Vec<Output> {
            indexes
                .iter()
                .filter_map(|index| match resolve(index) {
                    Some(output) if output.index() == *index => Some(output),
                    _ => {
                        missing.push(*index);
                        None
                    }
                })
                .collect()
        };
        let inputs = fetch(&self.input_indexes);
        let outputs = fetch(&self.output_indexes);
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(Transaction {
            inputs,
            outputs,
            additional_excesses: self.additional_excesses.clone(),
        })
    }
}

/// A fully materialized transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Output>,
    pub outputs: Vec<Output>,
    pub additional_excesses: Vec<Excess>,
}

impl Transaction {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty() && self.additional_excesses.is_empty()
    }

    pub fn input_indexes(&self) -> Vec<OutputIndex> {
        self.inputs.iter().map(Output::index).collect()
    }

    pub fn output_indexes(&self) -> Vec<OutputIndex> {
        self.outputs.iter().map(Output::index).collect()
    }

    pub fn excess_indexes(&self) -> Vec<ExcessIndex> {
        self.additional_excesses.iter().map(Excess::index).collect()
    }

    pub fn skeleton(&self) -> TransactionSkeleton {
        TransactionSkeleton {
            input_indexes: self.input_indexes(),
            output_indexes: self.output_indexes(),
            additional_excesses: self.additional_excesses.clone(),
        }
    }

    pub fn id(&self) -> Hash256 {
        self.skeleton().id()
    }

    pub fn coinbase(&self) -> Option<&Output> {
        self.outputs.iter().find(|o| o.is_coinbase())
    }

    /// Sum of relay fees declared by non-coinbase outputs.
    pub fn relay_fee(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .filter(|o| !o.is_coinbase())
            .try_fold(0u64, |acc, o| acc.checked_add(o.relay_fee))
            .ok_or(TransactionError::FeeOverflow)
    }

    /// Flat charge per net new output; negative when the transaction
    /// consumes more outputs than it creates.
    pub fn creation_fee(&self, params: &ConsensusParams) -> i128 {
        let coinbase = i128::from(self.coinbase().is_some());
        let net = self.outputs.len() as i128 - self.inputs.len() as i128 - coinbase;
        net * i128::from(params.output_creation_fee)
    }

    /// Total fee the balance equation must account for.
    pub fn fee(&self, params: &ConsensusParams) -> Result<i128, TransactionError> {
        Ok(i128::from(self.relay_fee()?) + self.creation_fee(params))
    }

    /// Canonical order: inputs and outputs by index, excesses by index.
    pub fn sort(&mut self) {
        self.inputs.sort_by_cached_key(Output::index);
        self.outputs.sort_by_cached_key(Output::index);
        self.additional_excesses.sort_by_cached_key(Excess::index);
    }

    /// Combine two independent transactions into one.
    ///
    /// There is no cut-through: an input spending an output of the other
    /// transaction is a conflict, as are shared inputs, shared outputs,
    /// shared excesses and a second coinbase.
    pub fn merge(&self, other: &Transaction) -> Result<Transaction, TransactionError> {
        if self.coinbase().is_some() && other.coinbase().is_some() {
            return Err(TransactionError::MultipleCoinbase);
        }
        let ours_in: HashSet<_> = self.input_indexes().into_iter().collect();
        let ours_out: HashSet<_> = self.output_indexes().into_iter().collect();
        for index in other.input_indexes() {
            if ours_in.contains(&index) {
                return Err(TransactionError::MergeConflict(format!(
                    "input {index} spent by both"
                )));
            }
            if ours_out.contains(&index) {
                return Err(TransactionError::MergeConflict(format!(
                    "input {index} spends a merged output"
                )));
            }
        }
        for index in other.output_indexes() {
            if ours_out.contains(&index) {
                return Err(TransactionError::MergeConflict(format!(
                    "output {index} created by both"
                )));
            }
            if ours_in.contains(&index) {
                return Err(TransactionError::MergeConflict(format!(
                    "output {index} is already spent"
                )));
            }
        }
        let ours_ex: HashSet<_> = self.excess_indexes().into_iter().collect();
        if let Some(dup) = other.excess_indexes().into_iter().find(|e| ours_ex.contains(e)) {
            return Err(TransactionError::MergeConflict(format!(
                "excess {dup} carried by both"
            )));
        }

        let mut merged = Transaction {
            inputs: [self.inputs.as_slice(), other.inputs.as_slice()].concat(),
            outputs: [self.outputs.as_slice(), other.outputs.as_slice()].concat(),
            additional_excesses: [
                self.additional_excesses.as_slice(),
                other.additional_excesses.as_slice(),
            ]
            .concat(),
        };
        merged.sort();
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputTerms;
    use glint_crypto::SecretKey;
    use glint_types::NetworkId;

    fn output(value: u64, relay_fee: u64) -> Output {
        Output::create(
            value,
            &SecretKey::random(),
            &SecretKey::random(),
            OutputTerms {
                relay_fee,
                transparent: true,
                ..OutputTerms::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn fee_counts_net_new_outputs() {
        let params = ConsensusParams::for_network(NetworkId::Dev);
        let tx = Transaction {
            inputs: vec![output(5, 0)],
            outputs: vec![output(1, 3), output(2, 4), output(3, 0)],
            additional_excesses: Vec::new(),
        };
        assert_eq!(tx.relay_fee().unwrap(), 7);
        assert_eq!(
            tx.fee(&params).unwrap(),
            7 + 2 * i128::from(params.output_creation_fee)
        );
    }

    #[test]
    fn consuming_transaction_has_negative_creation_fee() {
        let params = ConsensusParams::for_network(NetworkId::Dev);
        let tx = Transaction {
            inputs: vec![output(1, 0), output(2, 0), output(3, 0)],
            outputs: vec![output(6, 0)],
            additional_excesses: Vec::new(),
        };
        assert_eq!(
            tx.creation_fee(&params),
            -2 * i128::from(params.output_creation_fee)
        );
    }

    #[test]
    fn skeleton_materializes_from_known_outputs() {
        let tx = Transaction {
            inputs: vec![output(1, 0)],
            outputs: vec![output(1, 0)],
            additional_excesses: Vec::new(),
        };
        let skeleton = tx.skeleton();
        let known: Vec<Output> = tx.inputs.iter().chain(&tx.outputs).cloned().collect();
        let rebuilt = skeleton
            .materialize(|index| known.iter().find(|o| o.index() == *index).cloned())
            .unwrap();
        assert_eq!(rebuilt, tx);

        let missing = skeleton.materialize(|_| None).unwrap_err();
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn skeleton_decodes_what_it_encodes() {
        let tx = Transaction {
            inputs: vec![output(1, 0)],
            outputs: vec![output(1, 2)],
            additional_excesses: Vec::new(),
        };
        let skeleton = tx.skeleton();
        assert_eq!(
            TransactionSkeleton::from_bytes(&skeleton.to_bytes()).unwrap(),
            skeleton
        );
        assert!(TransactionSkeleton::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn merge_rejects_shared_input() {
        let shared = output(4, 0);
        let a = Transaction {
            inputs: vec![shared.clone()],
            outputs: vec![output(4, 0)],
            additional_excesses: Vec::new(),
        };
        let b = Transaction {
            inputs: vec![shared],
            outputs: vec![output(4, 0)],
            additional_excesses: Vec::new(),
        };
        assert!(matches!(
            a.merge(&b),
            Err(TransactionError::MergeConflict(_))
        ));
    }

    #[test]
    fn merge_rejects_chained_spend() {
        let created = output(4, 0);
        let a = Transaction {
            inputs: vec![output(4, 0)],
            outputs: vec![created.clone()],
            additional_excesses: Vec::new(),
        };
        let b = Transaction {
            inputs: vec![created],
            outputs: vec![output(4, 0)],
            additional_excesses: Vec::new(),
        };
        assert!(a.merge(&b).is_err());
        assert!(b.merge(&a).is_err());
    }

    #[test]
    fn merge_sorts_the_union() {
        let a = Transaction {
            inputs: vec![output(1, 0)],
            outputs: vec![output(1, 0)],
            additional_excesses: Vec::new(),
        };
        let b = Transaction {
            inputs: vec![output(2, 0)],
            outputs: vec![output(2, 0)],
            additional_excesses: Vec::new(),
        };
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.inputs.len(), 2);
        let indexes = merged.output_indexes();
        assert!(indexes.windows(2).all(|w| w[0] < w[1]));
    }
}
