//! OP Stack contract bindings.
//!
//! Includes the read-only surface used to follow a withdrawal proof:
//! - L2ToL1MessagePasser (L2 predeploy)
//! - OptimismPortal2 (L1 contract)
//! - FaultDisputeGame (L1 game proxy, one per proposal)

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// L2ToL1MessagePasser predeploy address (identical on all OP Stack chains).
pub const MESSAGE_PASSER_ADDRESS: Address = address!("4200000000000000000000000000000000000016");

sol! {
    /// L2ToL1MessagePasser - L2 predeploy recording every initiated withdrawal
    #[sol(rpc)]
    interface IL2ToL1MessagePasser {
        /// Check if a withdrawal message has been sent
        function sentMessages(bytes32) external view returns (bool);
    }

    /// OptimismPortal2 - Main L1 contract for withdrawal proving and finalization
    #[sol(rpc)]
    interface IOptimismPortal2 {
        /// Proven withdrawal data stored on L1
        #[derive(Debug)]
        struct ProvenWithdrawal {
            address disputeGameProxy;
            uint64 timestamp;
        }

        /// Emitted once per proof submission, keyed by the prover
        #[derive(Debug)]
        event WithdrawalProvenExtension1(
            bytes32 indexed withdrawalHash,
            address indexed proofSubmitter
        );

        /// Query proven withdrawals by hash and proof submitter
        function provenWithdrawals(bytes32 withdrawalHash, address proofSubmitter)
            external view returns (ProvenWithdrawal memory);
    }

    /// IFaultDisputeGame - Standard interface for fault dispute games
    #[sol(rpc)]
    interface IFaultDisputeGame {
        /// Get the L2 block number this game is disputing
        function l2BlockNumber() external view returns (uint256);

        /// Get the game status (0 = in progress, 1 = challenger wins, 2 = defender wins)
        function status() external view returns (uint8);

        /// Get the root claim (output root)
        function rootClaim() external view returns (bytes32);
    }
}
