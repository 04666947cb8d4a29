use crate::config::eth_address;
use crate::core::error::WalletConnectError;

/// Pluggable wallet connection strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorKind {
    /// Browser-injected EIP-1193 provider (extension wallet).
    Injected,
    /// WalletConnect-style relay pairing.
    RelayBased,
    /// Hosted/custodial wallet bridge.
    HostedBridge,
}

impl ConnectorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectorKind::Injected => "Browser wallet",
            ConnectorKind::RelayBased => "WalletConnect",
            ConnectorKind::HostedBridge => "Hosted wallet",
        }
    }
}

/// Wallet connector lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WalletStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

/// A connected wallet account. Absence means "no wallet connected".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: String,
    pub connector_kind: ConnectorKind,
}

impl WalletAccount {
    pub fn new(address: impl Into<String>, connector_kind: ConnectorKind) -> Self {
        Self {
            address: address.into(),
            connector_kind,
        }
    }

    /// Format the address for display (`0x1234...5678`).
    pub fn short_address(&self) -> String {
        if self.address.len() >= eth_address::FULL_LEN {
            format!(
                "{}...{}",
                &self.address[..eth_address::PREFIX_LEN],
                &self.address[eth_address::SUFFIX_START..]
            )
        } else {
            self.address.clone()
        }
    }
}

/// Wallet connector state.
///
/// One instance exists per application session, owned by the connector and
/// mutated only through its transition methods.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletConnectorState {
    pub status: WalletStatus,
    pub account: Option<WalletAccount>,
    pub last_error: Option<WalletConnectError>,
}

impl WalletConnectorState {
    /// Check if a wallet account is connected.
    pub fn is_connected(&self) -> bool {
        self.status == WalletStatus::Connected && self.account.is_some()
    }

    /// Address of the connected account, if any.
    pub fn account_address(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.address.as_str())
    }

    /// Display name for the session indicator.
    pub fn display_name(&self) -> String {
        match (&self.status, &self.account) {
            (WalletStatus::Connected, Some(account)) => account.short_address(),
            (WalletStatus::Connecting, _) => "connecting...".to_string(),
            _ => "guest".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = WalletConnectorState::default();
        assert_eq!(state.status, WalletStatus::Idle);
        assert!(!state.is_connected());
        assert_eq!(state.account_address(), None);
        assert_eq!(state.display_name(), "guest");
    }

    #[test]
    fn test_connecting_display() {
        let state = WalletConnectorState {
            status: WalletStatus::Connecting,
            ..Default::default()
        };
        assert!(!state.is_connected());
        assert_eq!(state.display_name(), "connecting...");
    }

    #[test]
    fn test_connected_short_address() {
        let state = WalletConnectorState {
            status: WalletStatus::Connected,
            account: Some(WalletAccount::new(
                "0x1234567890123456789012345678901234567890",
                ConnectorKind::Injected,
            )),
            last_error: None,
        };
        assert!(state.is_connected());
        assert_eq!(state.display_name(), "0x1234...7890");
    }

    #[test]
    fn test_short_address_passthrough() {
        let account = WalletAccount::new("0x1234", ConnectorKind::RelayBased);
        assert_eq!(account.short_address(), "0x1234");
    }
}
