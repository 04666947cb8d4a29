//! Application configuration.
//!
//! Centralizes all configuration constants used throughout the application:
//! chain endpoint, contract descriptors, wallet connector endpoints, and
//! navigation entries.

use crate::models::{ContractDescriptor, NavItem};

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name.
pub const APP_NAME: &str = "fracta";

/// Application version.
pub const APP_VERSION: &str = "0.1.0";

// =============================================================================
// Chain Configuration
// =============================================================================

/// WebSocket endpoint of the contracts chain RPC node.
pub const NETWORK_ENDPOINT: &str = "wss://rococo-contracts-rpc.polkadot.io";

/// Connection handshake timeout in milliseconds.
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Per-request RPC call timeout in milliseconds.
pub const RPC_CALL_TIMEOUT_MS: u32 = 10_000;

// =============================================================================
// Wallet Configuration
// =============================================================================

/// localStorage key for wallet session persistence.
pub const WALLET_SESSION_KEY: &str = "wallet_session";

/// Timeout for silent wallet queries (no popup) in milliseconds.
pub const WALLET_TIMEOUT_MS: i32 = 2000;

/// WalletConnect-style relay used by the `RelayBased` connector.
pub const RELAY_URL: &str = "https://relay.fracta.market";

/// Interval between relay approval polls in milliseconds.
pub const RELAY_POLL_INTERVAL_MS: u32 = 1500;

/// Number of approval polls before a pairing attempt is abandoned.
pub const RELAY_POLL_ATTEMPTS: u32 = 40;

/// Hosted wallet bridge used by the `HostedBridge` connector.
pub const HOSTED_BRIDGE_URL: &str = "https://bridge.fracta.market";

// =============================================================================
// Balance Configuration
// =============================================================================

/// JSON-RPC endpoint used for native balance queries.
pub const BALANCE_RPC_URL: &str = "https://cloudflare-eth.com";

/// Symbol of the native currency reported alongside balances.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Network fetch timeout in milliseconds.
pub const FETCH_TIMEOUT_MS: i32 = 10_000;

// =============================================================================
// Address Display
// =============================================================================

/// Ethereum address display truncation (`0x1234...5678`).
pub mod eth_address {
    /// Length of a full `0x`-prefixed address.
    pub const FULL_LEN: usize = 42;
    /// Characters kept from the front.
    pub const PREFIX_LEN: usize = 6;
    /// Offset of the retained suffix.
    pub const SUFFIX_START: usize = 38;
}

// =============================================================================
// Navigation
// =============================================================================

/// Navigation tabs in declaration order.
///
/// Active-tab resolution scans this list front to back and stops at the
/// first exact path match, so earlier entries win ties. Reordering this
/// list changes which tab gets highlighted for a shared path.
pub const NAV_ITEMS: &[NavItem] = &[
    NavItem::new("Home", "/"),
    NavItem::new("Mint", "/mint"),
    NavItem::new("Fractionalise", "/fractionalise"),
    NavItem::new("Create a listing", "/list"),
];

// =============================================================================
// Contract Configuration
// =============================================================================

/// Get the contract descriptors for the application.
///
/// These are the three marketplace contracts bound against the chain
/// connection at startup. Addresses and ABI metadata are deployment
/// artifacts; the session core consumes them opaquely.
pub fn configured_contracts() -> Vec<ContractDescriptor> {
    vec![
        ContractDescriptor::new(
            "erc721",
            serde_json::json!({
                "version": "4",
                "spec": { "messages": ["mint", "approve", "transfer", "owner_of"] },
            }),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
        ),
        ContractDescriptor::new(
            "fractionalizer",
            serde_json::json!({
                "version": "4",
                "spec": { "messages": ["fractionalize", "redeem", "shares_of"] },
            }),
            "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty",
        ),
        ContractDescriptor::new(
            "nft_lending",
            serde_json::json!({
                "version": "4",
                "spec": { "messages": ["list", "delist", "lend", "repay"] },
            }),
            "5DAAnrj7VHTznn2AWBemMuyBwZWs6FNFjdyVXUeYum3PTXFy",
        ),
    ]
}
