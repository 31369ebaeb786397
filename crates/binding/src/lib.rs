//! Contract bindings for the fault-proof withdrawal contracts.
//!
//! This crate consolidates the Solidity interfaces the monitor reads from:
//! - OptimismPortal2 (L1 bridge, proven withdrawals registry)
//! - FaultDisputeGame (per-withdrawal dispute game proxy)
//! - L2ToL1MessagePasser (L2 predeploy, sent messages registry)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod opstack;
