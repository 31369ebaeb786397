//! Alloy-backed implementations of the [`crate::source`] traits.

use crate::{
    error::ChainError,
    source::{
        BlockSource, DisputeGame, MessageRegistry, OutputRootSource, SettlementSource,
    },
    types::{GameStatus, ProvenWithdrawal, WithdrawalEvent, WithdrawalHash},
};
use alloy_contract::private::Provider;
use alloy_primitives::{Address, TxHash, B256};
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{
    IFaultDisputeGame, IL2ToL1MessagePasser, IOptimismPortal2,
    IOptimismPortal2::WithdrawalProvenExtension1,
};
use client::{RollupNodeClient, RollupNodeError};
use tracing::debug;

async fn fetch_block_timestamp<P>(provider: &P, number: u64) -> Result<u64, ChainError>
where
    P: Provider,
{
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Number(number))
        .await
        .map_err(ChainError::rpc)?
        .ok_or(ChainError::BlockNotFound(number))?;

    Ok(block.header.timestamp)
}

/// Reads the OptimismPortal2 deployment and headers of the settlement chain.
#[derive(Debug, Clone)]
pub struct PortalReader<P> {
    provider: P,
    portal_address: Address,
}

impl<P> PortalReader<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, portal_address: Address) -> Self {
        Self {
            provider,
            portal_address,
        }
    }
}

impl<P> BlockSource for PortalReader<P>
where
    P: Provider + Clone,
{
    async fn head_block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(ChainError::rpc)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, ChainError> {
        fetch_block_timestamp(&self.provider, number).await
    }
}

impl<P> SettlementSource for PortalReader<P>
where
    P: Provider + Clone,
{
    type Game = GameReader<P>;

    async fn withdrawal_proven_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<WithdrawalEvent>, ChainError> {
        let portal = IOptimismPortal2::new(self.portal_address, &self.provider);

        let events = portal
            .WithdrawalProvenExtension1_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(ChainError::rpc)?;

        debug!(
            from = from_block,
            to = to_block,
            count = events.len(),
            "Fetched WithdrawalProvenExtension1 logs"
        );

        Ok(events
            .into_iter()
            .filter_map(|(event, log)| WithdrawalEvent::from_log(event, log))
            .collect())
    }

    async fn receipt_events(&self, tx_hash: TxHash) -> Result<Vec<WithdrawalEvent>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(ChainError::rpc)?
            .ok_or(ChainError::ReceiptNotFound(tx_hash))?;

        Ok(receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == self.portal_address)
            .filter_map(|log| {
                let decoded = log.log_decode::<WithdrawalProvenExtension1>().ok()?;
                WithdrawalEvent::from_log(decoded.inner.data, log.clone())
            })
            .collect())
    }

    async fn proven_withdrawal(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> Result<ProvenWithdrawal, ChainError> {
        let portal = IOptimismPortal2::new(self.portal_address, &self.provider);
        let proven = portal
            .provenWithdrawals(hash, proof_submitter)
            .call()
            .await
            .map_err(ChainError::rpc)?;

        Ok(ProvenWithdrawal {
            dispute_game_proxy: proven.disputeGameProxy,
            timestamp: proven.timestamp,
        })
    }

    fn bind_game(&self, address: Address) -> GameReader<P> {
        GameReader::new(self.provider.clone(), address)
    }
}

/// A FaultDisputeGame proxy bound at runtime.
#[derive(Debug, Clone)]
pub struct GameReader<P> {
    provider: P,
    address: Address,
}

impl<P> GameReader<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

impl<P> DisputeGame for GameReader<P>
where
    P: Provider + Clone,
{
    fn address(&self) -> Address {
        self.address
    }

    async fn l2_block_number(&self) -> Result<u64, ChainError> {
        let game = IFaultDisputeGame::new(self.address, &self.provider);
        let block = game.l2BlockNumber().call().await.map_err(ChainError::rpc)?;
        u64::try_from(block).map_err(|_| ChainError::InvalidBlockNumber(block))
    }

    async fn root_claim(&self) -> Result<B256, ChainError> {
        let game = IFaultDisputeGame::new(self.address, &self.provider);
        game.rootClaim().call().await.map_err(ChainError::rpc)
    }

    async fn status(&self) -> Result<GameStatus, ChainError> {
        let game = IFaultDisputeGame::new(self.address, &self.provider);
        let status = game.status().call().await.map_err(ChainError::rpc)?;
        GameStatus::try_from(status)
    }
}

/// Reads the L2ToL1MessagePasser predeploy and headers of the rollup.
#[derive(Debug, Clone)]
pub struct MessagePasserReader<P> {
    provider: P,
    message_passer_address: Address,
}

impl<P> MessagePasserReader<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, message_passer_address: Address) -> Self {
        Self {
            provider,
            message_passer_address,
        }
    }
}

impl<P> BlockSource for MessagePasserReader<P>
where
    P: Provider + Clone,
{
    async fn head_block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(ChainError::rpc)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, ChainError> {
        fetch_block_timestamp(&self.provider, number).await
    }
}

impl<P> MessageRegistry for MessagePasserReader<P>
where
    P: Provider + Clone,
{
    async fn sent_message(&self, hash: WithdrawalHash) -> Result<bool, ChainError> {
        let message_passer =
            IL2ToL1MessagePasser::new(self.message_passer_address, &self.provider);
        message_passer
            .sentMessages(hash)
            .call()
            .await
            .map_err(ChainError::rpc)
    }
}

impl OutputRootSource for RollupNodeClient {
    async fn output_root_at(&self, l2_block_number: u64) -> Result<B256, RollupNodeError> {
        self.output_at_block(l2_block_number).await
    }
}
