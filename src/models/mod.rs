//! Data models and types for the application.
//!
//! Contains domain types for:
//! - [`ConnectionStatus`] - chain connection lifecycle state
//! - [`WalletConnectorState`], [`WalletAccount`], [`ConnectorKind`] - wallet session state
//! - [`BalanceSnapshot`] - per-account native balance
//! - [`ContractDescriptor`] - (name, ABI, address) binding input
//! - [`AppRoute`], [`NavItem`], [`ViewKind`] - navigation and view selection

mod balance;
mod chain;
mod contract;
mod route;
mod wallet;

pub use balance::BalanceSnapshot;
pub use chain::ConnectionStatus;
pub use contract::ContractDescriptor;
pub use route::{AppRoute, NavItem, ViewKind, active_tab, active_tab_in, view_for};
pub use wallet::{ConnectorKind, WalletAccount, WalletConnectorState, WalletStatus};
