//! Custom error types for the session core.
//!
//! One enum per failure domain, all local and recoverable:
//!
//! - [`ConnectionError`] - chain endpoint unreachable, handshake failures
//! - [`BindingError`] - contract registry bound against a non-ready connection
//! - [`StaleHandleError`] / [`ContractCallError`] - calls through replaced connections
//! - [`WalletConnectError`] - wallet strategy connect/disconnect failures
//! - [`BalanceFetchError`] - per-query balance failures
//! - [`FetchError`] - low-level HTTP plumbing

use thiserror::Error;

/// Chain connection errors. Surfaced as `ConnectionStatus::Failed` and
/// recoverable by caller-initiated reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("connection attempt timed out")]
    Timeout,
    #[error("connection closed")]
    Closed,
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Registry binding errors. Binding fails fast; no partial registry exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("connection is {status}, not ready")]
    NotReady { status: &'static str },
    #[error("contract {name} has an invalid address")]
    BadAddress { name: String },
}

/// A contract call was attempted through a handle whose bound connection has
/// been replaced or closed. Never silently re-routed to a newer connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract {contract} is bound to a replaced connection")]
pub struct StaleHandleError {
    pub contract: String,
}

/// Contract call failure: either the handle went stale or the RPC itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractCallError {
    #[error(transparent)]
    Stale(#[from] StaleHandleError),
    #[error("contract call failed: {0}")]
    Rpc(#[from] ConnectionError),
}

/// Wallet connect errors. The connector returns to `Idle` with the error
/// retained for display; the session itself never goes down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletConnectError {
    #[error("no wallet available for this connector")]
    Unavailable,
    #[error("wallet request rejected: {0}")]
    Rejected(String),
    #[error("wallet returned no account")]
    NoAccount,
    #[error("relay error: {0}")]
    Relay(String),
    #[error("bridge error: {0}")]
    Bridge(String),
}

/// Balance query errors, reported per query. Never touch wallet state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceFetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unknown account {0}")]
    UnknownAccount(String),
    #[error("malformed balance response: {0}")]
    BadResponse(String),
}

/// Network/fetch-related errors for HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("browser window not available")]
    NoWindow,
    #[error("failed to create request")]
    RequestCreationFailed,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Http(u16),
    #[error("failed to read response")]
    ResponseReadFailed,
    #[error("invalid response content")]
    InvalidContent,
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("request timed out")]
    Timeout,
}
