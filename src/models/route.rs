//! Hash-based routing and view selection for the marketplace.

use crate::config::NAV_ITEMS;
use crate::models::WalletConnectorState;

/// Application routes. URL format: `#/path` (e.g. `#/mint`, `#/listing/42`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppRoute {
    /// Marketplace landing page: `#/` or empty hash.
    Home,
    /// NFT minting: `#/mint`.
    Mint,
    /// Listing creation: `#/list`.
    List,
    /// Fractionalisation (wallet-guarded): `#/fractionalise`.
    Fractionalise,
    /// Account profile: `#/profile/:address`.
    Profile { address: String },
    /// Listing detail: `#/listing/:id`.
    Listing { id: String },
    /// Designated error view; also the target for every unmatched path.
    Error,
}

impl AppRoute {
    /// Parse a path into a route. Unmatched paths resolve to [`AppRoute::Error`].
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["mint"] => Self::Mint,
            ["list"] => Self::List,
            ["fractionalise"] => Self::Fractionalise,
            ["profile", address] => Self::Profile {
                address: (*address).to_string(),
            },
            ["listing", id] => Self::Listing {
                id: (*id).to_string(),
            },
            _ => Self::Error,
        }
    }

    /// Parse a URL hash (`#/mint`) into a route.
    pub fn from_hash(hash: &str) -> Self {
        Self::from_path(hash.trim_start_matches('#'))
    }

    /// Convert this route back to its path.
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Mint => "/mint".to_string(),
            Self::List => "/list".to_string(),
            Self::Fractionalise => "/fractionalise".to_string(),
            Self::Profile { address } => format!("/profile/{}", address),
            Self::Listing { id } => format!("/listing/{}", id),
            Self::Error => "/error".to_string(),
        }
    }

    /// Convert this route to its URL hash.
    pub fn to_hash(&self) -> String {
        format!("#{}", self.to_path())
    }

    /// Get the current route from the browser URL.
    pub fn current() -> Self {
        Self::from_path(&crate::utils::dom::get_hash())
    }

    /// Navigate the browser to this route.
    pub fn push(&self) {
        crate::utils::dom::set_hash(&self.to_hash());
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// One entry of the navigation bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

impl NavItem {
    pub const fn new(label: &'static str, path: &'static str) -> Self {
        Self { label, path }
    }
}

/// Resolve the active tab label for a path against a declared item list.
///
/// Exact path match only; the scan stops at the first matching entry, so
/// declaration order decides ties between items sharing a path.
pub fn active_tab_in(items: &[NavItem], path: &str) -> Option<&'static str> {
    let path = normalize(path);
    items
        .iter()
        .find(|item| normalize(item.path) == path)
        .map(|item| item.label)
}

/// Resolve the active tab label against the configured navigation bar.
pub fn active_tab(path: &str) -> Option<&'static str> {
    active_tab_in(NAV_ITEMS, path)
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

// =============================================================================
// View Selection
// =============================================================================

/// The view the binder renders for the current route and wallet state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Mint,
    ListNft,
    Fractionalise,
    /// Placeholder shown on the guarded route when no wallet is connected.
    ConnectWallet,
    Profile { address: String },
    Listing { id: String },
    Error,
}

/// Select the view for a route.
///
/// Pure function of (route, wallet state): the guarded fractionalise route
/// swaps to the placeholder whenever no account is present, so the switch is
/// atomic with the wallet transition and nothing stale is rendered between.
pub fn view_for(route: &AppRoute, wallet: &WalletConnectorState) -> ViewKind {
    match route {
        AppRoute::Home => ViewKind::Home,
        AppRoute::Mint => ViewKind::Mint,
        AppRoute::List => ViewKind::ListNft,
        AppRoute::Fractionalise => {
            if wallet.account.is_some() {
                ViewKind::Fractionalise
            } else {
                ViewKind::ConnectWallet
            }
        }
        AppRoute::Profile { address } => ViewKind::Profile {
            address: address.clone(),
        },
        AppRoute::Listing { id } => ViewKind::Listing { id: id.clone() },
        AppRoute::Error => ViewKind::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectorKind, WalletAccount, WalletStatus};

    fn connected(address: &str) -> WalletConnectorState {
        WalletConnectorState {
            status: WalletStatus::Connected,
            account: Some(WalletAccount::new(address, ConnectorKind::Injected)),
            last_error: None,
        }
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/mint"), AppRoute::Mint);
        assert_eq!(AppRoute::from_path("/list"), AppRoute::List);
        assert_eq!(AppRoute::from_path("/fractionalise"), AppRoute::Fractionalise);
        assert_eq!(
            AppRoute::from_path("/profile/0xabc"),
            AppRoute::Profile {
                address: "0xabc".to_string(),
            }
        );
        assert_eq!(
            AppRoute::from_path("/listing/42"),
            AppRoute::Listing {
                id: "42".to_string(),
            }
        );
    }

    #[test]
    fn test_unmatched_path_routes_to_error_view() {
        assert_eq!(AppRoute::from_path("/xyz"), AppRoute::Error);
        assert_eq!(AppRoute::from_path("/profile"), AppRoute::Error);
        assert_eq!(AppRoute::from_path("/listing/1/extra"), AppRoute::Error);
        assert_eq!(AppRoute::from_path("/error"), AppRoute::Error);
    }

    #[test]
    fn test_hash_round_trip() {
        assert_eq!(AppRoute::from_hash("#/mint"), AppRoute::Mint);
        assert_eq!(AppRoute::Mint.to_hash(), "#/mint");
        assert_eq!(
            AppRoute::Listing {
                id: "7".to_string(),
            }
            .to_hash(),
            "#/listing/7"
        );
    }

    #[test]
    fn test_active_tab_exact_match() {
        assert_eq!(active_tab("/"), Some("Home"));
        assert_eq!(active_tab("/mint"), Some("Mint"));
        assert_eq!(active_tab("/fractionalise"), Some("Fractionalise"));
        assert_eq!(active_tab("/list"), Some("Create a listing"));
        // detail pages highlight no tab
        assert_eq!(active_tab("/profile/0xabc"), None);
        assert_eq!(active_tab("/listing/42"), None);
        assert_eq!(active_tab("/xyz"), None);
    }

    #[test]
    fn test_active_tab_first_declared_match_wins() {
        let items = [
            NavItem::new("First", "/shared"),
            NavItem::new("Second", "/shared"),
            NavItem::new("Third", "/other"),
        ];
        assert_eq!(active_tab_in(&items, "/shared"), Some("First"));
        assert_eq!(active_tab_in(&items, "/other"), Some("Third"));
    }

    #[test]
    fn test_view_selection() {
        let guest = WalletConnectorState::default();
        assert_eq!(view_for(&AppRoute::Home, &guest), ViewKind::Home);
        assert_eq!(view_for(&AppRoute::Mint, &guest), ViewKind::Mint);
        assert_eq!(view_for(&AppRoute::Error, &guest), ViewKind::Error);
        assert_eq!(
            view_for(&AppRoute::from_path("/xyz"), &guest),
            ViewKind::Error
        );
    }

    #[test]
    fn test_fractionalise_guard() {
        let guest = WalletConnectorState::default();
        assert_eq!(
            view_for(&AppRoute::Fractionalise, &guest),
            ViewKind::ConnectWallet
        );

        let state = connected("0x1234567890123456789012345678901234567890");
        assert_eq!(
            view_for(&AppRoute::Fractionalise, &state),
            ViewKind::Fractionalise
        );
    }
}
