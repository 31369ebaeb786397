use crate::error::{ChainError, WithdrawalError};
use alloy_primitives::{hex, Address, TxHash, B256};
use alloy_rpc_types_eth::Log;
use binding::opstack::IOptimismPortal2::WithdrawalProvenExtension1;
use chrono::DateTime;
use serde::Serialize;
use tracing::debug;

pub type WithdrawalHash = B256;

/// A withdrawal hash as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashInput {
    /// Already decoded 32-byte hash
    Raw(B256),
    /// Raw bytes, must be exactly 32 long
    Bytes(Vec<u8>),
    /// Hex string, `0x` prefix optional
    Hex(String),
}

impl HashInput {
    /// Decode into a [`WithdrawalHash`]. Malformed input is an error, never padded or truncated.
    pub fn normalize(&self) -> Result<WithdrawalHash, WithdrawalError> {
        match self {
            Self::Raw(hash) => Ok(*hash),
            Self::Bytes(bytes) => hash_from_slice(bytes, || hex::encode_prefixed(bytes)),
            Self::Hex(s) => {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits).map_err(|e| WithdrawalError::InvalidHash {
                    input: s.clone(),
                    reason: e.to_string(),
                })?;
                hash_from_slice(&bytes, || s.clone())
            }
        }
    }
}

fn hash_from_slice(
    bytes: &[u8],
    input: impl FnOnce() -> String,
) -> Result<WithdrawalHash, WithdrawalError> {
    if bytes.len() != 32 {
        return Err(WithdrawalError::InvalidHash {
            input: input(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }
    Ok(B256::from_slice(bytes))
}

impl From<B256> for HashInput {
    fn from(hash: B256) -> Self {
        Self::Raw(hash)
    }
}

impl From<Vec<u8>> for HashInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for HashInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<&str> for HashInput {
    fn from(s: &str) -> Self {
        Self::Hex(s.to_string())
    }
}

impl From<String> for HashInput {
    fn from(s: String) -> Self {
        Self::Hex(s)
    }
}

/// A `WithdrawalProvenExtension1` occurrence on the settlement chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalEvent {
    pub block_number: u64,
    pub withdrawal_hash: WithdrawalHash,
    pub proof_submitter: Address,
    pub raw_log: Log,
}

impl WithdrawalEvent {
    /// Build from a decoded event and the log that carried it.
    ///
    /// Returns `None` for a log without a block number (pending), which cannot
    /// be placed in a block range.
    pub fn from_log(event: WithdrawalProvenExtension1, log: Log) -> Option<Self> {
        let Some(block_number) = log.block_number else {
            debug!(
                withdrawal_hash = %event.withdrawalHash,
                tx_hash = ?log.transaction_hash,
                "Skipping WithdrawalProvenExtension1 log without block number"
            );
            return None;
        };

        Some(Self {
            block_number,
            withdrawal_hash: event.withdrawalHash,
            proof_submitter: event.proofSubmitter,
            raw_log: log,
        })
    }

    /// L1 transaction that proved the withdrawal.
    pub const fn tx_hash(&self) -> Option<TxHash> {
        self.raw_log.transaction_hash
    }
}

/// Block number paired with its header timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTimestamp {
    pub block_number: u64,
    pub timestamp: u64,
    /// UTC, `%Y-%m-%d %H:%M:%S`
    pub formatted_timestamp: String,
}

impl BlockTimestamp {
    pub fn new(block_number: u64, timestamp: u64) -> Self {
        let formatted_timestamp = i64::try_from(timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| timestamp.to_string());

        Self {
            block_number,
            timestamp,
            formatted_timestamp,
        }
    }
}

/// Latest event found by a scan, with the time of its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestWithdrawalEvent {
    pub event: WithdrawalEvent,
    pub timestamp: BlockTimestamp,
}

/// Entry of the portal's `provenWithdrawals` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    pub dispute_game_proxy: Address,
    pub timestamp: u64,
}

impl ProvenWithdrawal {
    /// The registry returns a zeroed entry for unknown keys.
    pub const fn is_proven(&self) -> bool {
        self.timestamp != 0
    }
}

/// Resolution state of a dispute game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    InProgress,
    ChallengerWins,
    DefenderWins,
}

impl TryFrom<u8> for GameStatus {
    type Error = ChainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::InProgress),
            1 => Ok(Self::ChallengerWins),
            2 => Ok(Self::DefenderWins),
            other => Err(ChainError::InvalidGameStatus(other)),
        }
    }
}

/// Dispute game backing a proven withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_proxy_address: Address,
    /// When the withdrawal was proven against this game
    pub timestamp: u64,
    pub l2_block_number: u64,
    pub root_claim: B256,
    pub status: GameStatus,
}

/// Everything known about one proven withdrawal, joined across L1, L2 and the rollup node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedGameData {
    #[serde(flatten)]
    pub game: GameRecord,
    pub sent_messages: bool,
    /// Rollup node's output root at `game.l2_block_number`; `None` if the node could not serve it.
    pub output_root: Option<B256>,
}

impl AggregatedGameData {
    /// Whether the game's root claim equals the rollup node's output root.
    pub fn output_root_matches(&self) -> Option<bool> {
        self.output_root.map(|root| root == self.game.root_claim)
    }

    /// Classify the withdrawal against the rollup node's view.
    pub fn verdict(&self) -> Verdict {
        match self.output_root_matches() {
            None => Verdict::Unverified,
            Some(true) if self.sent_messages => Verdict::Valid,
            _ => match self.game.status {
                GameStatus::DefenderWins => Verdict::PotentialAttackOnDefenderWinsGame,
                GameStatus::InProgress => Verdict::PotentialAttackOnInProgressGame,
                GameStatus::ChallengerWins => Verdict::SuspiciousEventOnChallengerWinsGame,
            },
        }
    }
}

/// Outcome of reconciling a proven withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Root claim matches the node and the message was sent on L2
    Valid,
    /// Output root unavailable, nothing to compare against
    Unverified,
    /// Forged withdrawal proven against a game that resolved in the claimant's favour
    PotentialAttackOnDefenderWinsGame,
    /// Forged withdrawal against a game still open; the fault proof should invalidate it
    PotentialAttackOnInProgressGame,
    /// Invalid claim, but the game was already resolved against it
    SuspiciousEventOnChallengerWinsGame,
}

impl Verdict {
    pub const fn is_alert(&self) -> bool {
        matches!(
            self,
            Self::PotentialAttackOnDefenderWinsGame
                | Self::PotentialAttackOnInProgressGame
                | Self::SuspiciousEventOnChallengerWinsGame
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Unverified => "unverified",
            Self::PotentialAttackOnDefenderWinsGame => "potential_attack_on_defender_wins_game",
            Self::PotentialAttackOnInProgressGame => "potential_attack_on_in_progress_game",
            Self::SuspiciousEventOnChallengerWinsGame => {
                "suspicious_event_on_challenger_wins_game"
            }
        }
    }
}
