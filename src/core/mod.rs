//! Session core: chain connection, contract binding, wallet lifecycle, and
//! balance state.
//!
//! This module provides:
//! - [`ChainConnection`] with the [`ChainRpc`]/[`RpcSession`] transport seam
//! - [`ContractRegistry`] / [`ContractHandle`] bound against a live connection
//! - [`WalletConnector`] over the pluggable [`WalletStrategy`] implementations
//! - [`BalanceQuery`] with coalesced, last-account-wins fetches

mod balance;
mod chain;
mod contracts;
pub mod error;
pub mod strategies;
mod wallet;

pub use balance::{BalanceQuery, BalanceSource, RpcBalanceSource};
pub use chain::{ChainConnection, ChainRpc, RpcSession, WsRpc};
pub use contracts::{ContractHandle, ContractRegistry};
pub use wallet::{WalletConnector, WalletStrategy};
