//! Fault-proof withdrawal monitor.
//!
//! The monitor walks the settlement chain forward. Each cycle collects every
//! proven withdrawal between the last processed block and the head, and
//! reconciles each one once against the rollup: the dispute game's root claim
//! must equal the rollup node's output root, and the withdrawal must have been
//! initiated on L2. Withdrawals whose game is still in progress, or whose
//! output root could not be fetched, are re-checked every cycle until they
//! resolve.

pub mod config;
pub mod metrics;
pub mod state;

use alloy_provider::Provider;
use std::time::Duration;
use tracing::{debug, info, warn};
use withdrawal::{
    source::{BlockSource, MessageRegistry, OutputRootSource, SettlementSource},
    BlockTimeLocator, LogScanner, WithdrawalGameAggregator, DEFAULT_BATCH_SIZE, ONE_WEEK,
};

pub use state::{AlertCounts, CheckedWithdrawal, MonitorState, WithdrawalKey};

/// Result of one successful monitor cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Settlement head the cycle scanned up to
    pub l1_head: u64,
    pub l2_head: u64,
    /// First block scanned; greater than `l1_head` when there was nothing new
    pub from_block: u64,
    /// Newly seen withdrawals, in block order
    pub checked: Vec<CheckedWithdrawal>,
    /// Pending withdrawals re-checked this cycle
    pub rechecked: usize,
}

/// Ties block-time lookup, log scanning and aggregation into a stateful loop.
pub struct WithdrawalMonitor<S, R, O> {
    settlement: S,
    registry: R,
    locator: BlockTimeLocator<S>,
    scanner: LogScanner<S>,
    aggregator: WithdrawalGameAggregator<S, R, O>,
    batch_size: u64,
    lookback: Duration,
    state: MonitorState,
}

impl<S, R, O> WithdrawalMonitor<S, R, O>
where
    S: SettlementSource + Clone,
    R: MessageRegistry + BlockSource + Clone,
    O: OutputRootSource,
{
    pub fn new(settlement: S, registry: R, rollup_node: O) -> Self {
        Self {
            locator: BlockTimeLocator::new(settlement.clone()),
            scanner: LogScanner::new(settlement.clone()),
            aggregator: WithdrawalGameAggregator::new(
                settlement.clone(),
                registry.clone(),
                rollup_node,
            ),
            settlement,
            registry,
            batch_size: DEFAULT_BATCH_SIZE,
            lookback: ONE_WEEK,
            state: MonitorState::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Start scanning at `block` instead of the lookback floor.
    pub fn with_start_block(mut self, block: u64) -> Self {
        self.state.start_at(block);
        self
    }

    pub const fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Run one cycle: re-check pending withdrawals, then check every proven
    /// withdrawal in `[next_l1_block, head]`.
    ///
    /// On failure the position is kept at the block of the withdrawal that
    /// could not be checked, so the next cycle resumes there without checking
    /// the same withdrawal twice.
    pub async fn run_cycle(&mut self) -> eyre::Result<CycleReport> {
        let l1_head = self.settlement.head_block_number().await?;
        let l2_head = self.registry.head_block_number().await?;

        let from_block = match self.state.next_l1_block() {
            Some(block) => block,
            None => {
                let floor = self.locator.find_block_before(self.lookback).await?;
                info!(
                    floor,
                    lookback_secs = self.lookback.as_secs(),
                    "Starting from lookback floor"
                );
                self.state.start_at(floor);
                floor
            }
        };

        let rechecked = self.recheck_pending().await;

        if from_block > l1_head {
            debug!(from_block, l1_head, "No new settlement blocks");
            return Ok(CycleReport {
                l1_head,
                l2_head,
                from_block,
                checked: Vec::new(),
                rechecked,
            });
        }

        let events = self
            .scanner
            .collect_events(from_block, l1_head, self.batch_size)
            .await?;

        let mut checked = Vec::with_capacity(events.len());
        for event in events {
            if self.state.already_checked(&event) {
                continue;
            }

            let data = match self
                .aggregator
                .get_game_data(event.withdrawal_hash, event.proof_submitter)
                .await
            {
                Ok(data) => data,
                Err(e) => {
                    self.state.reached(event.block_number);
                    return Err(e.into());
                }
            };

            let withdrawal = CheckedWithdrawal { event, data };
            self.state.record_new(withdrawal.clone());
            checked.push(withdrawal);
        }

        self.state.advance_past(l1_head);

        info!(
            from_block,
            l1_head,
            l2_head,
            new_events = checked.len(),
            rechecked,
            alerts = ?self.state.alerts(),
            "Cycle complete"
        );

        Ok(CycleReport {
            l1_head,
            l2_head,
            from_block,
            checked,
            rechecked,
        })
    }

    /// Re-check in-progress and unverified withdrawals. Failures keep them pending.
    async fn recheck_pending(&mut self) -> usize {
        let pending = self.state.pending();
        let mut rechecked = 0;

        for withdrawal in pending {
            let (hash, submitter) = withdrawal.key();
            match self.aggregator.get_game_data(hash, submitter).await {
                Ok(data) => {
                    self.state.record(CheckedWithdrawal {
                        event: withdrawal.event,
                        data,
                    });
                    rechecked += 1;
                }
                Err(e) => warn!(%hash, error = %e, "Failed to re-check pending withdrawal"),
            }
        }

        rechecked
    }
}

/// Fail unless `provider` serves `expected` as its chain id.
pub async fn ensure_chain_id<P: Provider>(
    provider: &P,
    expected: u64,
    chain: &str,
) -> eyre::Result<()> {
    let chain_id = provider.get_chain_id().await?;
    if chain_id != expected {
        eyre::bail!("{chain} RPC serves chain id {chain_id}, network preset expects {expected}");
    }
    Ok(())
}
