//! In-memory chain implementing every source trait, for tests in this and
//! downstream crates (`test-utils` feature).

use crate::{
    error::ChainError,
    source::{
        BlockSource, DisputeGame, MessageRegistry, OutputRootSource, SettlementSource,
    },
    types::{GameStatus, ProvenWithdrawal, WithdrawalEvent, WithdrawalHash},
};
use alloy_primitives::{Address, TxHash, B256};
use alloy_rpc_types_eth::Log;
use client::RollupNodeError;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Dispute game state served by [`MockChain`].
#[derive(Debug, Clone)]
pub struct MockGame {
    pub l2_block_number: u64,
    pub root_claim: B256,
    /// Raw `status()` value
    pub status: u8,
}

#[derive(Default)]
struct State {
    timestamps: Vec<u64>,
    missing_blocks: HashSet<u64>,
    head_fails: bool,
    events: Vec<WithdrawalEvent>,
    failing_blocks: Vec<u64>,
    receipts: HashMap<TxHash, Vec<WithdrawalEvent>>,
    proven: HashMap<(WithdrawalHash, Address), ProvenWithdrawal>,
    games: HashMap<Address, MockGame>,
    sent: HashSet<WithdrawalHash>,
    registry_fails: bool,
    output_roots: HashMap<u64, B256>,
    output_roots_fail: bool,

    windows: Vec<(u64, u64)>,
    block_reads: usize,
    output_root_requests: Vec<u64>,
    proven_lookups: Vec<WithdrawalHash>,
    calls: usize,
}

/// Cheaply cloneable; clones share state so tests can inspect recorded calls.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<State>>,
}

pub fn event_at(block: u64, hash: WithdrawalHash, submitter: Address) -> WithdrawalEvent {
    WithdrawalEvent {
        block_number: block,
        withdrawal_hash: hash,
        proof_submitter: submitter,
        raw_log: Log {
            block_number: Some(block),
            ..Default::default()
        },
    }
}

impl MockChain {
    pub fn from_timestamps(timestamps: Vec<u64>) -> Self {
        let chain = Self::default();
        chain.state().timestamps = timestamps;
        chain
    }

    /// Blocks `0..=head` spaced `block_time` seconds apart.
    pub fn linear(head: u64, genesis_timestamp: u64, block_time: u64) -> Self {
        Self::from_timestamps(
            (0..=head)
                .map(|b| genesis_timestamp + b * block_time)
                .collect(),
        )
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `count` blocks `block_time` seconds apart, moving the head.
    pub fn extend(&self, count: u64, block_time: u64) {
        let mut state = self.state();
        let mut last = state.timestamps.last().copied().unwrap_or_default();
        for _ in 0..count {
            last += block_time;
            state.timestamps.push(last);
        }
    }

    pub fn head(&self) -> u64 {
        self.state().timestamps.len().saturating_sub(1) as u64
    }

    pub fn timestamps(&self) -> Vec<u64> {
        self.state().timestamps.clone()
    }

    pub fn drop_block(&self, block: u64) {
        self.state().missing_blocks.insert(block);
    }

    pub fn fail_head(&self) {
        self.state().head_fails = true;
    }

    pub fn add_event(&self, block: u64, hash: WithdrawalHash, submitter: Address) {
        let mut state = self.state();
        state.events.push(event_at(block, hash, submitter));
        state.events.sort_by_key(|e| e.block_number);
    }

    /// Any log query whose range covers `block` fails.
    pub fn fail_windows_containing(&self, block: u64) {
        self.state().failing_blocks.push(block);
    }

    pub fn add_receipt_event(
        &self,
        tx_hash: TxHash,
        block: u64,
        hash: WithdrawalHash,
        submitter: Address,
    ) {
        let mut event = event_at(block, hash, submitter);
        event.raw_log.transaction_hash = Some(tx_hash);
        self.state().receipts.entry(tx_hash).or_default().push(event);
    }

    pub fn add_proven(
        &self,
        hash: WithdrawalHash,
        submitter: Address,
        game: Address,
        timestamp: u64,
    ) {
        self.state().proven.insert(
            (hash, submitter),
            ProvenWithdrawal {
                dispute_game_proxy: game,
                timestamp,
            },
        );
    }

    pub fn add_game(&self, address: Address, game: MockGame) {
        self.state().games.insert(address, game);
    }

    pub fn add_sent_message(&self, hash: WithdrawalHash) {
        self.state().sent.insert(hash);
    }

    pub fn fail_registry(&self) {
        self.state().registry_fails = true;
    }

    pub fn set_output_root(&self, l2_block: u64, root: B256) {
        self.state().output_roots.insert(l2_block, root);
    }

    pub fn fail_output_roots(&self) {
        self.state().output_roots_fail = true;
    }

    /// Log query ranges in the order they were issued.
    pub fn windows(&self) -> Vec<(u64, u64)> {
        self.state().windows.clone()
    }

    pub fn block_reads(&self) -> usize {
        self.state().block_reads
    }

    pub fn output_root_requests(&self) -> Vec<u64> {
        self.state().output_root_requests.clone()
    }

    /// Hashes passed to `proven_withdrawal`, in call order.
    pub fn proven_lookups(&self) -> Vec<WithdrawalHash> {
        self.state().proven_lookups.clone()
    }

    /// Total number of reads served, of any kind.
    pub fn call_count(&self) -> usize {
        self.state().calls
    }

    fn game(&self, address: Address) -> Result<MockGame, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        state
            .games
            .get(&address)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("execution reverted: no code at {address}")))
    }
}

impl BlockSource for MockChain {
    async fn head_block_number(&self) -> Result<u64, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        if state.head_fails {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }
        Ok(state.timestamps.len().saturating_sub(1) as u64)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        state.block_reads += 1;
        if state.missing_blocks.contains(&number) {
            return Err(ChainError::BlockNotFound(number));
        }
        state
            .timestamps
            .get(number as usize)
            .copied()
            .ok_or(ChainError::BlockNotFound(number))
    }
}

impl SettlementSource for MockChain {
    type Game = MockGameHandle;

    async fn withdrawal_proven_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<WithdrawalEvent>, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        state.windows.push((from_block, to_block));

        if state
            .failing_blocks
            .iter()
            .any(|b| (from_block..=to_block).contains(b))
        {
            return Err(ChainError::Rpc("query returned more than 10000 results".to_string()));
        }

        Ok(state
            .events
            .iter()
            .filter(|e| (from_block..=to_block).contains(&e.block_number))
            .cloned()
            .collect())
    }

    async fn receipt_events(&self, tx_hash: TxHash) -> Result<Vec<WithdrawalEvent>, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ChainError::ReceiptNotFound(tx_hash))
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> Result<ProvenWithdrawal, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        state.proven_lookups.push(hash);
        Ok(state
            .proven
            .get(&(hash, proof_submitter))
            .copied()
            .unwrap_or(ProvenWithdrawal {
                dispute_game_proxy: Address::ZERO,
                timestamp: 0,
            }))
    }

    fn bind_game(&self, address: Address) -> MockGameHandle {
        MockGameHandle {
            address,
            chain: self.clone(),
        }
    }
}

pub struct MockGameHandle {
    address: Address,
    chain: MockChain,
}

impl DisputeGame for MockGameHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn l2_block_number(&self) -> Result<u64, ChainError> {
        Ok(self.chain.game(self.address)?.l2_block_number)
    }

    async fn root_claim(&self) -> Result<B256, ChainError> {
        Ok(self.chain.game(self.address)?.root_claim)
    }

    async fn status(&self) -> Result<GameStatus, ChainError> {
        GameStatus::try_from(self.chain.game(self.address)?.status)
    }
}

impl MessageRegistry for MockChain {
    async fn sent_message(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        let mut state = self.state();
        state.calls += 1;
        if state.registry_fails {
            return Err(ChainError::Rpc("503 Service Unavailable".to_string()));
        }
        Ok(state.sent.contains(&hash))
    }
}

impl OutputRootSource for MockChain {
    async fn output_root_at(&self, l2_block_number: u64) -> Result<B256, RollupNodeError> {
        let mut state = self.state();
        state.calls += 1;
        state.output_root_requests.push(l2_block_number);
        if state.output_roots_fail {
            return Err(RollupNodeError::Rpc {
                code: -32000,
                message: "failed to get L2 block ref".to_string(),
            });
        }
        state
            .output_roots
            .get(&l2_block_number)
            .copied()
            .ok_or(RollupNodeError::MissingResult)
    }
}
