//! Reverse batched scan for the latest proven withdrawal.
//!
//! Proof events are rare relative to block volume, so the scan starts at the
//! head and walks backwards in fixed windows, stopping at the first window
//! that contains a match. Cost is bounded by the distance to the latest event
//! rather than the chain height.
//!
//! [`LogScanner::collect_events`] walks a bounded range forwards instead, for
//! callers that must see every event exactly once.

use crate::{
    error::ChainError,
    source::SettlementSource,
    types::{BlockTimestamp, LatestWithdrawalEvent, WithdrawalEvent},
};
use alloy_primitives::TxHash;
use tracing::{debug, warn};

/// Default window width in blocks.
pub const DEFAULT_BATCH_SIZE: u64 = 1_000;

pub struct LogScanner<S> {
    source: S,
}

impl<S> LogScanner<S>
where
    S: SettlementSource,
{
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Find the most recent `WithdrawalProvenExtension1` at or above `starting_block`.
    ///
    /// Windows that fail to load are logged and skipped. Only a failure to read
    /// the head (or the found event's block) is returned as an error.
    pub async fn find_latest_event(
        &self,
        starting_block: u64,
        batch_size: u64,
    ) -> Result<Option<LatestWithdrawalEvent>, ChainError> {
        let head = self.source.head_block_number().await?;

        debug!(
            head,
            starting_block, batch_size, "Scanning backwards for latest proven withdrawal"
        );

        let Some(event) = self.scan_backwards(head, starting_block, batch_size).await else {
            debug!(head, starting_block, "No proven withdrawal found");
            return Ok(None);
        };

        let timestamp = self.block_timestamp(event.block_number).await?;

        Ok(Some(LatestWithdrawalEvent { event, timestamp }))
    }

    /// Every `WithdrawalProvenExtension1` in `[from_block, to_block]`, oldest first.
    ///
    /// Windows have the same width as in [`Self::find_latest_event`] but walk
    /// forwards. Unlike the backwards search, a failed window fails the whole
    /// call: the caller relies on the result being complete for the range.
    pub async fn collect_events(
        &self,
        from_block: u64,
        to_block: u64,
        batch_size: u64,
    ) -> Result<Vec<WithdrawalEvent>, ChainError> {
        let mut events = Vec::new();
        if from_block > to_block {
            return Ok(events);
        }

        let mut from = from_block;
        loop {
            let to = from.saturating_add(batch_size).min(to_block);

            let window = self.source.withdrawal_proven_events(from, to).await?;
            events.extend(
                window
                    .into_iter()
                    .filter(|e| (from..=to).contains(&e.block_number)),
            );

            if to >= to_block {
                break;
            }
            from = to + 1;
        }

        events.sort_by_key(|e| e.block_number);

        debug!(
            from = from_block,
            to = to_block,
            count = events.len(),
            "Collected proven withdrawals"
        );

        Ok(events)
    }

    /// Walk `[floor, head]` newest window first. `head` is fixed for the whole walk.
    async fn scan_backwards(
        &self,
        head: u64,
        floor: u64,
        batch_size: u64,
    ) -> Option<WithdrawalEvent> {
        if head < floor {
            return None;
        }

        let mut to = head;
        loop {
            let from = to.saturating_sub(batch_size).max(floor);

            match self.source.withdrawal_proven_events(from, to).await {
                Ok(events) => {
                    let latest = events
                        .into_iter()
                        .filter(|e| (from..=to).contains(&e.block_number))
                        .max_by_key(|e| e.block_number);

                    if let Some(event) = latest {
                        debug!(
                            from,
                            to,
                            block = event.block_number,
                            withdrawal_hash = %event.withdrawal_hash,
                            "Found proven withdrawal"
                        );
                        return Some(event);
                    }
                }
                Err(e) => {
                    warn!(
                        from,
                        to,
                        error = %e,
                        "Failed to fetch logs for window, continuing with older blocks"
                    );
                }
            }

            if from <= floor {
                return None;
            }
            to = from - 1;
        }
    }

    /// Decode the proven-withdrawal events of one L1 transaction.
    pub async fn events_in_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Vec<WithdrawalEvent>, ChainError> {
        self.source.receipt_events(tx_hash).await
    }

    pub async fn block_timestamp(&self, number: u64) -> Result<BlockTimestamp, ChainError> {
        let timestamp = self.source.block_timestamp(number).await?;
        Ok(BlockTimestamp::new(number, timestamp))
    }
}
