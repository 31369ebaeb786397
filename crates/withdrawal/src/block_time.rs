//! Map a wall-clock time to a block number.

use crate::{error::ChainError, source::BlockSource, types::BlockTimestamp};
use chrono::Utc;
use std::{cmp::Ordering, time::Duration};
use tracing::debug;

pub const ONE_WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Binary search over header timestamps.
///
/// Relies on timestamps being non-decreasing in block number.
pub struct BlockTimeLocator<S> {
    source: S,
}

impl<S> BlockTimeLocator<S>
where
    S: BlockSource,
{
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Latest block whose timestamp is `<= target_timestamp`, or block 0 if the
    /// target precedes genesis.
    pub async fn find_block_at_or_before(&self, target_timestamp: u64) -> Result<u64, ChainError> {
        let head = self.source.head_block_number().await?;

        let mut low = 0u64;
        let mut high = head;

        while low <= high {
            let mid = low + (high - low) / 2;
            let timestamp = self.source.block_timestamp(mid).await?;

            match timestamp.cmp(&target_timestamp) {
                Ordering::Equal => {
                    debug!(block = mid, target_timestamp, "Exact timestamp match");
                    return Ok(mid);
                }
                Ordering::Less => low = mid + 1,
                Ordering::Greater => match mid.checked_sub(1) {
                    Some(next) => high = next,
                    None => break,
                },
            }
        }

        // The search can stop one block past the target; walk back until we are not.
        let mut closest = if low < head { low } else { high };
        while closest > 0 && self.source.block_timestamp(closest).await? > target_timestamp {
            closest -= 1;
        }

        debug!(
            block = closest,
            target_timestamp, head, "Located block at or before timestamp"
        );

        Ok(closest)
    }

    /// Block at or before `now - lookback`.
    pub async fn find_block_before(&self, lookback: Duration) -> Result<u64, ChainError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let target_timestamp = now.saturating_sub(lookback.as_secs());
        self.find_block_at_or_before(target_timestamp).await
    }

    pub async fn find_block_one_week_ago(&self) -> Result<u64, ChainError> {
        self.find_block_before(ONE_WEEK).await
    }

    pub async fn block_timestamp(&self, number: u64) -> Result<BlockTimestamp, ChainError> {
        let timestamp = self.source.block_timestamp(number).await?;
        Ok(BlockTimestamp::new(number, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChain;

    /// Reference answer: last block with timestamp <= target, else 0.
    fn expected_block(timestamps: &[u64], target: u64) -> u64 {
        timestamps
            .iter()
            .rposition(|ts| *ts <= target)
            .unwrap_or(0) as u64
    }

    #[tokio::test]
    async fn test_matches_reference_on_linear_chain() {
        let genesis = 1_600_000_000;
        let chain = MockChain::linear(500, genesis, 12);
        let timestamps = chain.timestamps();
        let locator = BlockTimeLocator::new(chain);

        let last = timestamps[500];
        let targets = (genesis - 30..=last + 30).step_by(5);
        for target in targets {
            let block = locator.find_block_at_or_before(target).await.unwrap();
            assert_eq!(block, expected_block(&timestamps, target), "target {target}");
        }
    }

    #[tokio::test]
    async fn test_straddle_property_on_irregular_chain() {
        // Strictly increasing with uneven gaps.
        let timestamps: Vec<u64> = (0..300u64).map(|b| 1_000 + b * 13 + (b * b) % 11).collect();
        let chain = MockChain::from_timestamps(timestamps.clone());
        let locator = BlockTimeLocator::new(chain);

        for target in (timestamps[0]..=timestamps[299] + 10).step_by(3) {
            let b = locator.find_block_at_or_before(target).await.unwrap() as usize;
            assert!(timestamps[b] <= target, "target {target} block {b}");
            if b + 1 < timestamps.len() {
                assert!(target < timestamps[b + 1], "target {target} block {b}");
            }
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_target_with_ties() {
        let timestamps = vec![10, 10, 12, 12, 12, 15, 20, 20, 21];
        let chain = MockChain::from_timestamps(timestamps.clone());
        let locator = BlockTimeLocator::new(chain);

        for target in 10..=25 {
            let b = locator.find_block_at_or_before(target).await.unwrap() as usize;
            assert!(timestamps[b] <= target, "target {target} block {b}");
            // No later block with a strictly greater timestamp still fits.
            assert!(timestamps[b + 1..]
                .iter()
                .all(|ts| *ts > target || *ts == timestamps[b]));
        }
    }

    #[tokio::test]
    async fn test_target_before_genesis() {
        let chain = MockChain::linear(100, 5_000, 2);
        let locator = BlockTimeLocator::new(chain);

        assert_eq!(locator.find_block_at_or_before(0).await.unwrap(), 0);
        assert_eq!(locator.find_block_at_or_before(4_999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_target_after_head() {
        let chain = MockChain::linear(100, 5_000, 2);
        let locator = BlockTimeLocator::new(chain);

        assert_eq!(locator.find_block_at_or_before(1_000_000).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_single_block_chain() {
        let chain = MockChain::from_timestamps(vec![42]);
        let locator = BlockTimeLocator::new(chain);

        assert_eq!(locator.find_block_at_or_before(41).await.unwrap(), 0);
        assert_eq!(locator.find_block_at_or_before(42).await.unwrap(), 0);
        assert_eq!(locator.find_block_at_or_before(43).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_logarithmic_reads() {
        let chain = MockChain::linear(1 << 16, 1_000, 1);
        let locator = BlockTimeLocator::new(chain.clone());

        locator.find_block_at_or_before(1_000 + 12_345).await.unwrap();
        assert!(chain.block_reads() <= 20, "reads: {}", chain.block_reads());
    }

    #[tokio::test]
    async fn test_missing_block_propagates() {
        let chain = MockChain::linear(100, 1_000, 1);
        chain.drop_block(50);
        let locator = BlockTimeLocator::new(chain);

        let err = locator.find_block_at_or_before(1_060).await.unwrap_err();
        assert!(matches!(err, ChainError::BlockNotFound(50)));
    }

    #[tokio::test]
    async fn test_one_week_ago() {
        let now = u64::try_from(Utc::now().timestamp()).unwrap();
        // Hourly blocks covering the last 30 days.
        let genesis = now - 30 * 24 * 3_600;
        let chain = MockChain::linear(30 * 24, genesis, 3_600);
        let locator = BlockTimeLocator::new(chain);

        let block = locator.find_block_one_week_ago().await.unwrap();
        let expected = (30 - 7) * 24;
        assert!(
            block == expected || block == expected - 1,
            "block {block}"
        );
    }
}
