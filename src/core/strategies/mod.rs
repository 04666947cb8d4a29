//! Wallet connection strategies.
//!
//! Each strategy satisfies the [`WalletStrategy`](super::wallet::WalletStrategy)
//! capability interface; the connector never depends on a strategy's
//! internals:
//!
//! - [`InjectedStrategy`] - browser-injected EIP-1193 provider
//! - [`RelayStrategy`] - WalletConnect-style relay pairing
//! - [`HostedStrategy`] - hosted/custodial wallet bridge

mod hosted;
mod injected;
mod relay;

pub use hosted::HostedStrategy;
pub use injected::{InjectedStrategy, chain_name, get_chain_id, is_available, on_chain_changed};
pub use relay::RelayStrategy;
