//! Read-only collaborators the monitor queries.
//!
//! The core algorithms only see these traits. [`crate::rpc`] implements them on
//! top of alloy providers; tests implement them over an in-memory chain.

use crate::{
    error::ChainError,
    types::{GameStatus, ProvenWithdrawal, WithdrawalEvent, WithdrawalHash},
};
use alloy_primitives::{Address, TxHash, B256};
use client::RollupNodeError;
use std::future::Future;

/// Block headers of one chain.
pub trait BlockSource: Send + Sync {
    /// Current head block number.
    fn head_block_number(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// Header timestamp of block `number`.
    fn block_timestamp(&self, number: u64)
        -> impl Future<Output = Result<u64, ChainError>> + Send;
}

/// Settlement chain view of the bridge (OptimismPortal2).
pub trait SettlementSource: BlockSource {
    type Game: DisputeGame;

    /// `WithdrawalProvenExtension1` events in `[from_block, to_block]`, ascending by block.
    fn withdrawal_proven_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> impl Future<Output = Result<Vec<WithdrawalEvent>, ChainError>> + Send;

    /// `WithdrawalProvenExtension1` events emitted by the portal in one transaction.
    fn receipt_events(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<Vec<WithdrawalEvent>, ChainError>> + Send;

    /// `provenWithdrawals(withdrawalHash, proofSubmitter)`.
    fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> impl Future<Output = Result<ProvenWithdrawal, ChainError>> + Send;

    /// Bind a dispute game whose address is only known at runtime.
    fn bind_game(&self, address: Address) -> Self::Game;
}

/// A bound dispute game proxy.
pub trait DisputeGame: Send + Sync {
    fn address(&self) -> Address;

    fn l2_block_number(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn root_claim(&self) -> impl Future<Output = Result<B256, ChainError>> + Send;

    fn status(&self) -> impl Future<Output = Result<GameStatus, ChainError>> + Send;
}

/// Rollup-side registry of initiated withdrawals (L2ToL1MessagePasser).
pub trait MessageRegistry: Send + Sync {
    /// `sentMessages(withdrawalHash)`.
    fn sent_message(
        &self,
        hash: WithdrawalHash,
    ) -> impl Future<Output = Result<bool, ChainError>> + Send;
}

/// Rollup node output roots.
pub trait OutputRootSource: Send + Sync {
    fn output_root_at(
        &self,
        l2_block_number: u64,
    ) -> impl Future<Output = Result<B256, RollupNodeError>> + Send;
}
