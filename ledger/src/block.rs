//! Blocks as stored and relayed: a header plus a transaction skeleton.

use serde::{Deserialize, Serialize};

use glint_transactions::TransactionSkeleton;
use glint_types::Hash256;

use crate::codec;
use crate::header::Header;
use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub skeleton: TransactionSkeleton,
}

impl Block {
    pub fn new(header: Header, skeleton: TransactionSkeleton) -> Self {
        Self { header, skeleton }
    }

    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn height(&self) -> u64 {
        self.header.height()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        codec::decode(bytes)
    }
}

/// A stored block and whether it was found invalid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub block: Block,
    pub invalid: bool,
    pub reason: Option<String>,
}

impl ContextBlock {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            invalid: false,
            reason: None,
        }
    }

    pub fn hash(&self) -> Hash256 {
        self.block.hash()
    }
}
