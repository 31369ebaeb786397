use crate::types::WithdrawalHash;
use alloy_primitives::{Address, TxHash, U256};
use std::fmt::Display;
use thiserror::Error;

/// Failure of a single read against a chain.
#[derive(Error, Debug)]
pub enum ChainError {
    /// Transport, node or contract call failure
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("transaction receipt {0} not found")]
    ReceiptNotFound(TxHash),

    #[error("unknown dispute game status {0}")]
    InvalidGameStatus(u8),

    #[error("L2 block number {0} does not fit in u64")]
    InvalidBlockNumber(U256),
}

impl ChainError {
    pub fn rpc(err: impl Display) -> Self {
        Self::Rpc(err.to_string())
    }
}

/// Hard failures of withdrawal game aggregation.
///
/// Enrichment failures (the rollup node's output root) never surface here.
#[derive(Error, Debug)]
pub enum WithdrawalError {
    #[error("invalid withdrawal hash {input:?}: {reason}")]
    InvalidHash { input: String, reason: String },

    #[error("withdrawal {hash} has not been proven by {submitter}")]
    NotProven {
        hash: WithdrawalHash,
        submitter: Address,
    },

    #[error("{step} failed: {source}")]
    Chain {
        step: &'static str,
        #[source]
        source: ChainError,
    },
}

impl WithdrawalError {
    pub(crate) fn chain(step: &'static str) -> impl FnOnce(ChainError) -> Self {
        move |source| Self::Chain { step, source }
    }
}
