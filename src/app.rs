//! Root application module.
//!
//! Contains the main App component, [`AppContext`], the [`SessionContext`]
//! aggregate handed to views, and application-level startup wiring following
//! Leptos conventions.
//!
//! # Architecture
//!
//! The session core objects ([`ChainConnection`], [`WalletConnector`],
//! [`BalanceQuery`]) are framework-free and expose `subscribe` callbacks;
//! this module bridges those callbacks into Leptos signals and recomputes
//! one [`SessionContext`] memo from them. Views read the memo and never
//! mutate session state directly.

use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::components::RouteViewBinder;
use crate::config::{
    BALANCE_RPC_URL, HOSTED_BRIDGE_URL, NATIVE_SYMBOL, NETWORK_ENDPOINT, RELAY_URL,
    configured_contracts,
};
use crate::core::strategies::{self, HostedStrategy, InjectedStrategy, RelayStrategy};
use crate::core::{
    BalanceQuery, ChainConnection, ContractHandle, ContractRegistry, RpcBalanceSource,
    WalletConnector, WalletStrategy, WsRpc,
};
use crate::models::{
    BalanceSnapshot, ConnectionStatus, ConnectorKind, WalletConnectorState, WalletStatus,
};

// ============================================================================
// SessionContext
// ============================================================================

/// The aggregate, read-only session view handed to downstream views.
///
/// Recomputed whenever connection status, registry contents, wallet state,
/// or the balance snapshot change; performs no I/O of its own.
#[derive(Clone)]
pub struct SessionContext {
    pub chain: ConnectionStatus,
    pub contracts: Option<Rc<ContractRegistry>>,
    pub wallet: WalletConnectorState,
    pub balance: Option<BalanceSnapshot>,
}

impl SessionContext {
    /// Check whether contract handles are bound and callable.
    pub fn contracts_ready(&self) -> bool {
        self.chain.is_ready() && self.contracts.is_some()
    }

    /// Look up a bound contract handle by logical name.
    pub fn contract(&self, logical_name: &str) -> Option<ContractHandle> {
        self.contracts
            .as_ref()
            .and_then(|registry| registry.get(logical_name))
            .cloned()
    }
}

impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        let same_registry = match (&self.contracts, &other.contracts) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_registry
            && self.chain == other.chain
            && self.wallet == other.wallet
            && self.balance == other.balance
    }
}

/// Signal type views receive the session through.
pub type Session = Memo<SessionContext, LocalStorage>;

// ============================================================================
// Wallet Session Flag
// ============================================================================

/// localStorage flag marking a previously connected wallet, used for the
/// silent reconnect on startup.
mod session_flag {
    use crate::config::WALLET_SESSION_KEY;
    use crate::utils::dom;

    pub fn present() -> bool {
        dom::local_storage()
            .and_then(|s| s.get_item(WALLET_SESSION_KEY).ok().flatten())
            .is_some()
    }

    pub fn save() {
        if let Some(storage) = dom::local_storage() {
            let _ = storage.set_item(WALLET_SESSION_KEY, "1");
        }
    }

    pub fn clear() {
        if let Some(storage) = dom::local_storage() {
            let _ = storage.remove_item(WALLET_SESSION_KEY);
        }
    }
}

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide context: the owned session core objects plus their
/// reactive projections.
///
/// Provided once at the root of the component tree; views access it with
/// `use_context::<AppContext>()` but receive session data through
/// [`AppContext::session`].
#[derive(Clone)]
pub struct AppContext {
    /// The single live chain connection.
    pub chain: Rc<ChainConnection>,
    /// The single wallet connector.
    pub wallet: WalletConnector,
    /// Balance state for the connected account.
    pub balance: BalanceQuery,
    /// Chain id reported by the injected provider (for the network label).
    pub chain_id: RwSignal<Option<u64>>,
    /// Aggregate session view, recomputed on every upstream change.
    pub session: Session,

    chain_status: RwSignal<ConnectionStatus>,
    wallet_state: RwSignal<WalletConnectorState>,
    balance_snapshot: RwSignal<Option<BalanceSnapshot>>,
    contracts: RwSignal<Option<Rc<ContractRegistry>>, LocalStorage>,
}

impl AppContext {
    pub fn new() -> Self {
        let chain = Rc::new(ChainConnection::new(Rc::new(WsRpc), NETWORK_ENDPOINT));
        let wallet = WalletConnector::new();
        let balance = BalanceQuery::new(Rc::new(RpcBalanceSource::new(
            BALANCE_RPC_URL,
            NATIVE_SYMBOL,
        )));

        let chain_status = RwSignal::new(ConnectionStatus::Disconnected);
        let wallet_state = RwSignal::new(WalletConnectorState::default());
        let balance_snapshot = RwSignal::new(None);
        let contracts = RwSignal::new_local(None);
        let chain_id = RwSignal::new(None);

        // bridge the core observers into the reactive graph
        chain.subscribe(move |status| chain_status.set(status.clone()));
        wallet.subscribe(move |state| wallet_state.set(state.clone()));
        balance.subscribe(move |snapshot| balance_snapshot.set(snapshot.clone()));

        let session = Memo::new_local(move |_| SessionContext {
            chain: chain_status.get(),
            contracts: contracts.get(),
            wallet: wallet_state.get(),
            balance: balance_snapshot.get(),
        });

        Self {
            chain,
            wallet,
            balance,
            chain_id,
            session,
            chain_status,
            wallet_state,
            balance_snapshot,
            contracts,
        }
    }

    /// Start the session: open the chain connection, wire the registry
    /// re-binding, balance refetching, and wallet session persistence.
    pub fn init(&self) {
        // open the chain connection once at startup; retry stays a user action
        let chain = self.chain.clone();
        spawn_local(async move {
            if let Err(err) = chain.open().await {
                web_sys::console::warn_1(
                    &format!("chain connect to {} failed: {err}", chain.endpoint()).into(),
                );
            }
        });

        // bind the contract registry each time a connection reaches Ready;
        // handles from earlier generations stay stale by construction
        let chain = self.chain.clone();
        let chain_status = self.chain_status;
        let contracts = self.contracts;
        Effect::new(move |bound: Option<u64>| {
            let bound = bound.unwrap_or(0);
            if !chain_status.get().is_ready() {
                return bound;
            }
            let generation = chain.generation();
            if generation == bound {
                return bound;
            }
            match ContractRegistry::bind(&chain, &configured_contracts()) {
                Ok(registry) => {
                    contracts.set(Some(Rc::new(registry)));
                    generation
                }
                Err(err) => {
                    web_sys::console::warn_1(&format!("contract binding failed: {err}").into());
                    contracts.set(None);
                    bound
                }
            }
        });

        // refetch the balance whenever the wallet account changes (the
        // query clears the snapshot itself when the account goes away)
        let wallet_state = self.wallet_state;
        let account = Memo::new(move |_| wallet_state.get().account);
        let balance = self.balance.clone();
        Effect::new(move |_| {
            let account = account.get();
            let balance = balance.clone();
            spawn_local(async move { balance.account_changed(account).await });
        });

        // persist the wallet session flag across visits
        Effect::new(move |_| match wallet_state.get().status {
            WalletStatus::Connected => session_flag::save(),
            WalletStatus::Idle => session_flag::clear(),
            _ => {}
        });

        // follow provider-side chain switches for the network label
        let chain_id = self.chain_id;
        let _ = strategies::on_chain_changed(move |id| chain_id.set(Some(id)));

        // silently restore a previous wallet session (no popup)
        if session_flag::present() && strategies::is_available() {
            let ctx = self.clone();
            spawn_local(async move {
                ctx.wallet.restore(Rc::new(InjectedStrategy::new())).await;
                ctx.refresh_chain_id().await;
            });
        }
    }

    /// Connect the wallet through the strategy for `kind`.
    pub async fn connect_wallet(&self, kind: ConnectorKind) {
        let strategy: Rc<dyn WalletStrategy> = match kind {
            ConnectorKind::Injected => Rc::new(InjectedStrategy::new()),
            ConnectorKind::RelayBased => Rc::new(RelayStrategy::new(RELAY_URL)),
            ConnectorKind::HostedBridge => Rc::new(HostedStrategy::new(HOSTED_BRIDGE_URL)),
        };
        self.wallet.connect(strategy).await;
        self.refresh_chain_id().await;
    }

    /// Disconnect the active wallet.
    pub async fn disconnect_wallet(&self) {
        self.wallet.disconnect().await;
        self.chain_id.set(None);
    }

    async fn refresh_chain_id(&self) {
        if self.wallet.active_kind() == Some(ConnectorKind::Injected) {
            self.chain_id.set(strategies::get_chain_id().await);
        } else {
            self.chain_id.set(None);
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application component.
///
/// Creates and provides the global [`AppContext`], starts the session, and
/// renders the route/view binder inside an error boundary.
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    ctx.init();
    provide_context(ctx);

    view! {
        <ErrorBoundary fallback=|errors| {
            view! {
                <div class="appError">
                    <h1>"Something went wrong"</h1>
                    <ul>
                        {move || {
                            errors
                                .get()
                                .into_iter()
                                .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                                .collect::<Vec<_>>()
                        }}
                    </ul>
                </div>
            }
        }>
            <RouteViewBinder />
        </ErrorBoundary>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConnectionError;

    fn session(chain: ConnectionStatus) -> SessionContext {
        SessionContext {
            chain,
            contracts: None,
            wallet: WalletConnectorState::default(),
            balance: None,
        }
    }

    #[test]
    fn test_contracts_ready_requires_ready_chain_and_registry() {
        let ctx = session(ConnectionStatus::Ready);
        assert!(!ctx.contracts_ready());
        assert!(ctx.contract("erc721").is_none());

        let ctx = session(ConnectionStatus::Failed(ConnectionError::Timeout));
        assert!(!ctx.contracts_ready());
    }

    #[test]
    fn test_session_equality_tracks_parts() {
        let a = session(ConnectionStatus::Ready);
        let b = session(ConnectionStatus::Ready);
        assert_eq!(a, b);

        let c = session(ConnectionStatus::Connecting);
        assert_ne!(a, c);

        let mut d = session(ConnectionStatus::Ready);
        d.balance = Some(BalanceSnapshot {
            account: "0xa".to_string(),
            amount: "1".to_string(),
            symbol: "ETH".to_string(),
            fetched_at: 0.0,
        });
        assert_ne!(a, d);
    }
}
