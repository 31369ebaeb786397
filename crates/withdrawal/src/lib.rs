//! Withdrawal proof monitoring for an OP Stack rollup.
//!
//! This crate reads, and never writes, the bridge contracts on the settlement
//! chain and the rollup:
//! - [`scanner`] finds the most recent `WithdrawalProvenExtension1` event, or
//!   every one in a block range
//! - [`block_time`] maps a timestamp to the block produced at or before it
//! - [`game`] joins a proven withdrawal with its dispute game, the message
//!   passer and the rollup node's output root
//!
//! The algorithms are generic over the [`source`] traits. [`rpc`] provides the
//! alloy-backed implementations.

pub mod block_time;
pub mod error;
pub mod game;
pub mod rpc;
pub mod scanner;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use block_time::{BlockTimeLocator, ONE_WEEK};
pub use error::{ChainError, WithdrawalError};
pub use game::WithdrawalGameAggregator;
pub use rpc::{GameReader, MessagePasserReader, PortalReader};
pub use scanner::{LogScanner, DEFAULT_BATCH_SIZE};
pub use types::{
    AggregatedGameData, BlockTimestamp, GameRecord, GameStatus, HashInput, LatestWithdrawalEvent,
    ProvenWithdrawal, Verdict, WithdrawalEvent, WithdrawalHash,
};
