//! Join a proven withdrawal with its dispute game and the rollup's view.
//!
//! Lookup order:
//! 1. `provenWithdrawals(hash, submitter)` on the portal gives the game proxy
//! 2. The game proxy is bound at runtime
//! 3. `l2BlockNumber`, `rootClaim` and `status` are read from the game
//! 4. `sentMessages(hash)` is read from the L2 message passer
//! 5. The rollup node's output root for the game's L2 block, best effort
//!
//! Steps 1 to 4 identify the withdrawal and abort on failure. Step 5 only
//! enriches the record and degrades to `None`.

use crate::{
    error::WithdrawalError,
    source::{DisputeGame, MessageRegistry, OutputRootSource, SettlementSource},
    types::{AggregatedGameData, GameRecord, HashInput},
};
use alloy_primitives::{Address, B256};
use tracing::{debug, warn};

pub struct WithdrawalGameAggregator<S, R, O> {
    settlement: S,
    registry: R,
    rollup_node: O,
}

impl<S, R, O> WithdrawalGameAggregator<S, R, O>
where
    S: SettlementSource,
    R: MessageRegistry,
    O: OutputRootSource,
{
    pub const fn new(settlement: S, registry: R, rollup_node: O) -> Self {
        Self {
            settlement,
            registry,
            rollup_node,
        }
    }

    pub async fn get_game_data(
        &self,
        withdrawal_hash: impl Into<HashInput>,
        proof_submitter: Address,
    ) -> Result<AggregatedGameData, WithdrawalError> {
        let hash = withdrawal_hash.into().normalize()?;

        let proven = self
            .settlement
            .proven_withdrawal(hash, proof_submitter)
            .await
            .map_err(WithdrawalError::chain("provenWithdrawals lookup"))?;

        if !proven.is_proven() {
            return Err(WithdrawalError::NotProven {
                hash,
                submitter: proof_submitter,
            });
        }

        let game = self.settlement.bind_game(proven.dispute_game_proxy);

        let l2_block_number = game
            .l2_block_number()
            .await
            .map_err(WithdrawalError::chain("dispute game l2BlockNumber"))?;
        let root_claim = game
            .root_claim()
            .await
            .map_err(WithdrawalError::chain("dispute game rootClaim"))?;
        let status = game
            .status()
            .await
            .map_err(WithdrawalError::chain("dispute game status"))?;

        debug!(
            withdrawal_hash = %hash,
            game = %game.address(),
            l2_block_number,
            root_claim = %root_claim,
            ?status,
            "Resolved dispute game"
        );

        let sent_messages = self
            .registry
            .sent_message(hash)
            .await
            .map_err(WithdrawalError::chain("sentMessages lookup"))?;

        let output_root = self.output_root(l2_block_number).await;

        Ok(AggregatedGameData {
            game: GameRecord {
                game_proxy_address: proven.dispute_game_proxy,
                timestamp: proven.timestamp,
                l2_block_number,
                root_claim,
                status,
            },
            sent_messages,
            output_root,
        })
    }

    /// Output root for exactly `l2_block_number`, `None` if the node cannot serve it.
    async fn output_root(&self, l2_block_number: u64) -> Option<B256> {
        match self.rollup_node.output_root_at(l2_block_number).await {
            Ok(root) => Some(root),
            Err(e) => {
                warn!(
                    l2_block_number,
                    error = %e,
                    "Rollup node output root unavailable"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ChainError,
        test_utils::{MockChain, MockGame},
        types::{GameStatus, Verdict},
    };
    use alloy_primitives::{address, b256};

    const WITHDRAWAL_HASH: B256 =
        b256!("abc0000000000000000000000000000000000000000000000000000000000001");
    const PROVER: Address = address!("0000000000000000000000000000000000000001");
    const GAME: Address = address!("00000000000000000000000000000000000a3e01");
    const ROOT_CLAIM: B256 =
        b256!("1000000000000000000000000000000000000000000000000000000000000001");
    const NODE_ROOT: B256 =
        b256!("2000000000000000000000000000000000000000000000000000000000000002");
    const PROVEN_AT: u64 = 1_700_148_140;

    fn scenario() -> MockChain {
        let chain = MockChain::linear(20_000, 1_700_000_000, 12);
        chain.add_proven(WITHDRAWAL_HASH, PROVER, GAME, PROVEN_AT);
        chain.add_game(
            GAME,
            MockGame {
                l2_block_number: 777,
                root_claim: ROOT_CLAIM,
                status: 2,
            },
        );
        chain.add_sent_message(WITHDRAWAL_HASH);
        chain.set_output_root(777, NODE_ROOT);
        chain
    }

    fn aggregator(chain: &MockChain) -> WithdrawalGameAggregator<MockChain, MockChain, MockChain> {
        WithdrawalGameAggregator::new(chain.clone(), chain.clone(), chain.clone())
    }

    #[tokio::test]
    async fn test_scenario_aggregate() {
        let chain = scenario();
        let data = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap();

        assert_eq!(data.game.game_proxy_address, GAME);
        assert_eq!(data.game.timestamp, PROVEN_AT);
        assert_eq!(data.game.l2_block_number, 777);
        assert_eq!(data.game.root_claim, ROOT_CLAIM);
        assert_eq!(data.game.status, GameStatus::DefenderWins);
        assert!(data.sent_messages);
        assert_eq!(data.output_root, Some(NODE_ROOT));

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["gameProxyAddress"], serde_json::to_value(GAME).unwrap());
        assert_eq!(json["rootClaim"], format!("{ROOT_CLAIM}"));
        assert_eq!(json["outputRoot"], format!("{NODE_ROOT}"));
        assert_eq!(json["sentMessages"], true);

        // Output root was requested for the game's block and no other.
        assert_eq!(chain.output_root_requests(), vec![777]);
        assert_eq!(
            data.verdict(),
            Verdict::PotentialAttackOnDefenderWinsGame
        );
    }

    #[tokio::test]
    async fn test_hex_and_raw_inputs_agree() {
        let chain = scenario();
        let aggregator = aggregator(&chain);

        let raw = aggregator.get_game_data(WITHDRAWAL_HASH, PROVER).await.unwrap();
        let prefixed = aggregator
            .get_game_data(format!("{WITHDRAWAL_HASH}"), PROVER)
            .await
            .unwrap();
        let bare = aggregator
            .get_game_data(
                "abc0000000000000000000000000000000000000000000000000000000000001",
                PROVER,
            )
            .await
            .unwrap();
        let bytes = aggregator
            .get_game_data(WITHDRAWAL_HASH.to_vec(), PROVER)
            .await
            .unwrap();

        assert_eq!(raw, prefixed);
        assert_eq!(raw, bare);
        assert_eq!(raw, bytes);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let chain = scenario();
        let aggregator = aggregator(&chain);

        let first = aggregator.get_game_data(WITHDRAWAL_HASH, PROVER).await.unwrap();
        let second = aggregator.get_game_data(WITHDRAWAL_HASH, PROVER).await.unwrap();
        assert_eq!(first, second);

        chain.fail_output_roots();
        let degraded = aggregator.get_game_data(WITHDRAWAL_HASH, PROVER).await.unwrap();
        assert_eq!(degraded.game, first.game);
        assert_eq!(degraded.sent_messages, first.sent_messages);
        assert_eq!(degraded.output_root, None);
    }

    #[tokio::test]
    async fn test_output_root_failure_is_soft() {
        let chain = scenario();
        chain.fail_output_roots();

        let data = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap();

        assert_eq!(data.output_root, None);
        assert_eq!(data.game.game_proxy_address, GAME);
        assert_eq!(data.game.l2_block_number, 777);
        assert_eq!(data.game.root_claim, ROOT_CLAIM);
        assert!(data.sent_messages);
        assert_eq!(data.verdict(), Verdict::Unverified);
    }

    #[tokio::test]
    async fn test_matching_output_root_is_valid() {
        let chain = scenario();
        chain.set_output_root(777, ROOT_CLAIM);

        let data = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap();

        assert_eq!(data.output_root_matches(), Some(true));
        assert_eq!(data.verdict(), Verdict::Valid);
    }

    #[tokio::test]
    async fn test_malformed_hash_makes_no_calls() {
        let chain = scenario();

        let err = aggregator(&chain)
            .get_game_data("0xzz", PROVER)
            .await
            .unwrap_err();

        assert!(matches!(err, WithdrawalError::InvalidHash { .. }));
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unproven_withdrawal() {
        let chain = scenario();
        let other_prover = address!("0000000000000000000000000000000000000002");

        let err = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, other_prover)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawalError::NotProven { submitter, .. } if submitter == other_prover
        ));
    }

    #[tokio::test]
    async fn test_game_failure_is_terminal() {
        let chain = MockChain::linear(10, 0, 12);
        chain.add_proven(WITHDRAWAL_HASH, PROVER, GAME, PROVEN_AT);
        chain.add_sent_message(WITHDRAWAL_HASH);

        let err = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap_err();

        match err {
            WithdrawalError::Chain { step, source } => {
                assert_eq!(step, "dispute game l2BlockNumber");
                assert!(matches!(source, ChainError::Rpc(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing downstream of the game was queried.
        assert!(chain.output_root_requests().is_empty());
    }

    #[tokio::test]
    async fn test_registry_failure_is_terminal() {
        let chain = scenario();
        chain.fail_registry();

        let err = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawalError::Chain { step: "sentMessages lookup", .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_game_status() {
        let chain = scenario();
        chain.add_game(
            GAME,
            MockGame {
                l2_block_number: 777,
                root_claim: ROOT_CLAIM,
                status: 9,
            },
        );

        let err = aggregator(&chain)
            .get_game_data(WITHDRAWAL_HASH, PROVER)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WithdrawalError::Chain {
                source: ChainError::InvalidGameStatus(9),
                ..
            }
        ));
    }
}
