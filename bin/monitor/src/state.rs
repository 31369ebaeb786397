//! Bookkeeping of processed withdrawals and open alerts.
//!
//! Every proven withdrawal is checked once when its event is first seen.
//! Withdrawals that cannot be settled yet (game still in progress, or no
//! output root to compare against) stay pending and are re-checked each cycle
//! until they resolve.

use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};
use withdrawal::{AggregatedGameData, Verdict, WithdrawalEvent, WithdrawalHash};

/// A withdrawal proof is identified by its hash and the account that proved it.
pub type WithdrawalKey = (WithdrawalHash, Address);

/// A proven withdrawal event with the data it was reconciled against.
#[derive(Debug, Clone)]
pub struct CheckedWithdrawal {
    pub event: WithdrawalEvent,
    pub data: AggregatedGameData,
}

impl CheckedWithdrawal {
    pub const fn key(&self) -> WithdrawalKey {
        (self.event.withdrawal_hash, self.event.proof_submitter)
    }

    pub fn verdict(&self) -> Verdict {
        self.data.verdict()
    }
}

/// Number of withdrawals currently in each alerting or pending class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub defender_wins: usize,
    pub in_progress: usize,
    pub challenger_wins: usize,
    pub unverified: usize,
}

#[derive(Debug, Default)]
pub struct MonitorState {
    /// First L1 block not fully processed yet
    next_l1_block: Option<u64>,
    /// Withdrawals already checked in `next_l1_block`
    checked_at_cursor: HashSet<WithdrawalKey>,

    events_processed: u64,
    /// Withdrawals that reached a final verdict
    withdrawals_processed: u64,
    node_connection_failures: u64,

    attacks_on_defender_wins: HashMap<WithdrawalKey, CheckedWithdrawal>,
    attacks_on_in_progress: HashMap<WithdrawalKey, CheckedWithdrawal>,
    suspicious_on_challenger_wins: HashMap<WithdrawalKey, CheckedWithdrawal>,
    unverified: HashMap<WithdrawalKey, CheckedWithdrawal>,
}

impl MonitorState {
    pub const fn next_l1_block(&self) -> Option<u64> {
        self.next_l1_block
    }

    pub const fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub const fn withdrawals_processed(&self) -> u64 {
        self.withdrawals_processed
    }

    /// Checks where the rollup node could not serve an output root.
    pub const fn node_connection_failures(&self) -> u64 {
        self.node_connection_failures
    }

    pub fn alerts(&self) -> AlertCounts {
        AlertCounts {
            defender_wins: self.attacks_on_defender_wins.len(),
            in_progress: self.attacks_on_in_progress.len(),
            challenger_wins: self.suspicious_on_challenger_wins.len(),
            unverified: self.unverified.len(),
        }
    }

    /// Withdrawals to re-check on the next cycle.
    pub fn pending(&self) -> Vec<CheckedWithdrawal> {
        self.attacks_on_in_progress
            .values()
            .chain(self.unverified.values())
            .cloned()
            .collect()
    }

    /// Begin processing at `block` unless a position is already known.
    pub fn start_at(&mut self, block: u64) {
        if self.next_l1_block.is_none() {
            self.move_cursor(block);
        }
    }

    /// Whether `event` was already checked by an earlier, interrupted cycle.
    pub fn already_checked(&self, event: &WithdrawalEvent) -> bool {
        self.next_l1_block == Some(event.block_number)
            && self
                .checked_at_cursor
                .contains(&(event.withdrawal_hash, event.proof_submitter))
    }

    /// All blocks before `block` are processed.
    pub fn reached(&mut self, block: u64) {
        if self.next_l1_block != Some(block) {
            self.move_cursor(block);
        }
    }

    /// All blocks up to and including `head` are processed.
    pub fn advance_past(&mut self, head: u64) {
        self.move_cursor(head.saturating_add(1));
    }

    fn move_cursor(&mut self, block: u64) {
        self.next_l1_block = Some(block);
        self.checked_at_cursor.clear();
    }

    /// Record the first check of a newly seen event.
    pub fn record_new(&mut self, checked: CheckedWithdrawal) {
        self.reached(checked.event.block_number);
        self.checked_at_cursor.insert(checked.key());
        self.events_processed += 1;
        self.record(checked);
    }

    /// Classify a check, moving the withdrawal out of the pending sets if it resolved.
    pub fn record(&mut self, checked: CheckedWithdrawal) {
        let key = checked.key();
        let verdict = checked.verdict();
        let was_in_progress = self.attacks_on_in_progress.remove(&key).is_some();
        self.unverified.remove(&key);

        if checked.data.output_root.is_none() {
            self.node_connection_failures += 1;
        }

        let hash = checked.event.withdrawal_hash;
        let game = checked.data.game.game_proxy_address;
        let tx_hash = checked.event.tx_hash();

        match verdict {
            Verdict::Valid => {
                info!(%hash, %game, ?tx_hash, "Proven withdrawal is valid");
                self.withdrawals_processed += 1;
            }
            Verdict::Unverified => {
                warn!(
                    %hash,
                    %game,
                    l2_block = checked.data.game.l2_block_number,
                    "Output root unavailable, withdrawal not verified"
                );
                self.unverified.insert(key, checked);
            }
            Verdict::PotentialAttackOnDefenderWinsGame => {
                error!(
                    %hash,
                    %game,
                    ?tx_hash,
                    root_claim = %checked.data.game.root_claim,
                    output_root = ?checked.data.output_root,
                    sent_messages = checked.data.sent_messages,
                    "Forged withdrawal proof on a game resolved DefenderWins"
                );
                self.attacks_on_defender_wins.insert(key, checked);
                self.withdrawals_processed += 1;
            }
            Verdict::PotentialAttackOnInProgressGame => {
                if was_in_progress {
                    error!(%hash, %game, "Forged withdrawal proof, game still in progress");
                } else {
                    error!(
                        %hash,
                        %game,
                        ?tx_hash,
                        root_claim = %checked.data.game.root_claim,
                        output_root = ?checked.data.output_root,
                        sent_messages = checked.data.sent_messages,
                        "Forged withdrawal proof on a game in progress"
                    );
                }
                self.attacks_on_in_progress.insert(key, checked);
            }
            Verdict::SuspiciousEventOnChallengerWinsGame => {
                error!(
                    %hash,
                    %game,
                    ?tx_hash,
                    was_in_progress,
                    "Invalid withdrawal proof on a game resolved ChallengerWins"
                );
                self.suspicious_on_challenger_wins.insert(key, checked);
                self.withdrawals_processed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use withdrawal::{test_utils::event_at, GameRecord, GameStatus};

    fn checked(block: u64, byte: u8, status: GameStatus, matches: bool) -> CheckedWithdrawal {
        let root = B256::repeat_byte(0x11);
        CheckedWithdrawal {
            event: event_at(block, B256::repeat_byte(byte), Address::repeat_byte(0xaa)),
            data: AggregatedGameData {
                game: GameRecord {
                    game_proxy_address: Address::repeat_byte(byte),
                    timestamp: 1_700_000_000,
                    l2_block_number: 777,
                    root_claim: root,
                    status,
                },
                sent_messages: true,
                output_root: Some(if matches { root } else { B256::repeat_byte(0x22) }),
            },
        }
    }

    #[test]
    fn test_in_progress_alert_resolves() {
        let mut state = MonitorState::default();

        state.record_new(checked(10, 1, GameStatus::InProgress, false));
        assert_eq!(state.alerts().in_progress, 1);
        assert_eq!(state.pending().len(), 1);
        assert_eq!(state.withdrawals_processed(), 0);

        // Still open: updated in place, not counted twice.
        state.record(checked(10, 1, GameStatus::InProgress, false));
        assert_eq!(state.alerts().in_progress, 1);

        state.record(checked(10, 1, GameStatus::ChallengerWins, false));
        assert_eq!(
            state.alerts(),
            AlertCounts {
                challenger_wins: 1,
                ..Default::default()
            }
        );
        assert!(state.pending().is_empty());
        assert_eq!(state.events_processed(), 1);
        assert_eq!(state.withdrawals_processed(), 1);
    }

    #[test]
    fn test_unverified_is_pending_until_output_root_served() {
        let mut state = MonitorState::default();
        let mut unverified = checked(10, 1, GameStatus::DefenderWins, true);
        unverified.data.output_root = None;

        state.record_new(unverified);
        assert_eq!(state.alerts().unverified, 1);
        assert_eq!(state.node_connection_failures(), 1);

        state.record(checked(10, 1, GameStatus::DefenderWins, true));
        assert_eq!(state.alerts(), AlertCounts::default());
        assert_eq!(state.withdrawals_processed(), 1);
    }

    #[test]
    fn test_cursor_tracks_checked_events() {
        let mut state = MonitorState::default();
        state.start_at(5);
        state.start_at(7);
        assert_eq!(state.next_l1_block(), Some(5));

        let first = checked(9, 1, GameStatus::DefenderWins, true);
        let second = checked(9, 2, GameStatus::DefenderWins, true);
        state.record_new(first.clone());

        assert_eq!(state.next_l1_block(), Some(9));
        assert!(state.already_checked(&first.event));
        assert!(!state.already_checked(&second.event));

        state.advance_past(20);
        assert_eq!(state.next_l1_block(), Some(21));
        assert!(!state.already_checked(&first.event));
    }
}
