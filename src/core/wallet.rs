//! Wallet connector state machine.
//!
//! One [`WalletConnector`] exists per application session. It presents a
//! single interface over the pluggable [`WalletStrategy`] implementations
//! (browser-injected, relay-based, hosted bridge) and owns the only mutable
//! wallet state; every transition goes through its methods.
//!
//! Transitions:
//!
//! ```text
//! Idle --connect--> Connecting --success--> Connected(account)
//!                   Connecting --failure--> Idle (last_error kept)
//! Connected --wallet-side account change--> Connected(new account)
//! Connected --disconnect--> Disconnecting --> Idle (account cleared)
//! ```
//!
//! A second `connect` while Connecting/Connected is a no-op returning the
//! current state. Transitions are totally ordered by an epoch counter: an
//! in-flight connect applies its result only if nothing newer happened, so a
//! wallet-side account change is never overtaken by a slower connect.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::models::{ConnectorKind, WalletAccount, WalletConnectorState, WalletStatus};

use super::error::WalletConnectError;

/// Capability interface every wallet connection strategy satisfies.
///
/// Strategies report plain addresses; the connector stamps them with its
/// [`ConnectorKind`].
pub trait WalletStrategy {
    fn kind(&self) -> ConnectorKind;

    /// Start an interactive connect (may prompt the user).
    fn initiate_connect(&self) -> LocalBoxFuture<'static, Result<String, WalletConnectError>>;

    /// Tear down the strategy's session.
    fn initiate_disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletConnectError>>;

    /// Currently authorized account, without prompting.
    fn current_account(&self) -> LocalBoxFuture<'static, Option<String>>;

    /// Register the account-change listener. A later registration replaces
    /// the earlier one; `None` means the wallet dropped the session.
    fn on_account_changed(&self, callback: Box<dyn Fn(Option<String>)>);
}

struct ConnectorInner {
    state: WalletConnectorState,
    active: Option<Rc<dyn WalletStrategy>>,
    epoch: u64,
}

struct ConnectorShared {
    inner: RefCell<ConnectorInner>,
    observers: RefCell<Vec<Box<dyn Fn(&WalletConnectorState)>>>,
}

impl ConnectorShared {
    fn notify(shared: &Rc<Self>) {
        let state = shared.inner.borrow().state.clone();
        for callback in shared.observers.borrow().iter() {
            callback(&state);
        }
    }

    /// Apply a wallet-side account change reported by the active strategy.
    fn external_change(shared: &Rc<Self>, kind: ConnectorKind, account: Option<String>) {
        let changed = {
            let mut inner = shared.inner.borrow_mut();
            if inner.active.as_ref().map(|s| s.kind()) != Some(kind) {
                false
            } else {
                match (inner.state.status, account) {
                    (WalletStatus::Connecting | WalletStatus::Connected, Some(address)) => {
                        let next = WalletAccount::new(address, kind);
                        if inner.state.status == WalletStatus::Connected
                            && inner.state.account.as_ref() == Some(&next)
                        {
                            false
                        } else {
                            // re-entrant: Connected stays Connected, only the
                            // account changes; never dips through Idle
                            inner.state.status = WalletStatus::Connected;
                            inner.state.account = Some(next);
                            inner.epoch += 1;
                            true
                        }
                    }
                    (WalletStatus::Connected, None) => {
                        // wallet locked or access revoked on the wallet side
                        inner.state.status = WalletStatus::Idle;
                        inner.state.account = None;
                        inner.active = None;
                        inner.epoch += 1;
                        true
                    }
                    _ => false,
                }
            }
        };
        if changed {
            Self::notify(shared);
        }
    }
}

/// The application's single wallet connector.
#[derive(Clone)]
pub struct WalletConnector {
    shared: Rc<ConnectorShared>,
}

impl WalletConnector {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(ConnectorShared {
                inner: RefCell::new(ConnectorInner {
                    state: WalletConnectorState::default(),
                    active: None,
                    epoch: 0,
                }),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current wallet state.
    pub fn state(&self) -> WalletConnectorState {
        self.shared.inner.borrow().state.clone()
    }

    /// Kind of the currently selected strategy, if any.
    pub fn active_kind(&self) -> Option<ConnectorKind> {
        self.shared.inner.borrow().active.as_ref().map(|s| s.kind())
    }

    /// Register a state observer, called after every transition.
    pub fn subscribe(&self, callback: impl Fn(&WalletConnectorState) + 'static) {
        self.shared.observers.borrow_mut().push(Box::new(callback));
    }

    /// Connect through the given strategy (interactive).
    ///
    /// No-op returning the current state unless Idle; switching strategies
    /// requires an explicit disconnect first.
    pub async fn connect(&self, strategy: Rc<dyn WalletStrategy>) -> WalletConnectorState {
        self.establish(strategy, false).await
    }

    /// Silently restore a previous session through the given strategy.
    ///
    /// Uses the strategy's `current_account` (no prompt); finding no account
    /// returns to Idle without recording an error.
    pub async fn restore(&self, strategy: Rc<dyn WalletStrategy>) -> WalletConnectorState {
        self.establish(strategy, true).await
    }

    async fn establish(
        &self,
        strategy: Rc<dyn WalletStrategy>,
        silent: bool,
    ) -> WalletConnectorState {
        let epoch = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.state.status != WalletStatus::Idle {
                return inner.state.clone();
            }
            inner.state.status = WalletStatus::Connecting;
            inner.state.last_error = None;
            inner.active = Some(strategy.clone());
            inner.epoch += 1;
            inner.epoch
        };
        ConnectorShared::notify(&self.shared);

        // Listen before awaiting the connect so no wallet-side change is
        // missed while the attempt is in flight.
        let kind = strategy.kind();
        let weak = Rc::downgrade(&self.shared);
        strategy.on_account_changed(Box::new(move |account| {
            if let Some(shared) = weak.upgrade() {
                ConnectorShared::external_change(&shared, kind, account);
            }
        }));

        let outcome = if silent {
            strategy.current_account().await.ok_or(None)
        } else {
            strategy.initiate_connect().await.map_err(Some)
        };

        let changed = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.epoch != epoch {
                // a wallet-side event already advanced the state; the slower
                // connect result is stale and gets dropped
                false
            } else {
                match outcome {
                    Ok(address) => {
                        inner.state.status = WalletStatus::Connected;
                        inner.state.account = Some(WalletAccount::new(address, kind));
                    }
                    Err(error) => {
                        inner.state.status = WalletStatus::Idle;
                        inner.state.account = None;
                        inner.state.last_error = error;
                        inner.active = None;
                    }
                }
                inner.epoch += 1;
                true
            }
        };
        if changed {
            ConnectorShared::notify(&self.shared);
        }
        self.state()
    }

    /// Disconnect the active strategy. Disconnecting always completes to
    /// Idle with the account cleared, even if the strategy reports an error.
    pub async fn disconnect(&self) -> WalletConnectorState {
        let strategy = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.state.status != WalletStatus::Connected {
                return inner.state.clone();
            }
            inner.state.status = WalletStatus::Disconnecting;
            inner.epoch += 1;
            inner.active.clone()
        };
        ConnectorShared::notify(&self.shared);

        if let Some(strategy) = strategy {
            let _ = strategy.initiate_disconnect().await;
        }

        {
            let mut inner = self.shared.inner.borrow_mut();
            inner.state.status = WalletStatus::Idle;
            inner.state.account = None;
            inner.active = None;
            inner.epoch += 1;
        }
        ConnectorShared::notify(&self.shared);
        self.state()
    }
}

impl Default for WalletConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    use futures::channel::oneshot;

    enum ConnectOutcome {
        Done(Result<String, WalletConnectError>),
        Gated(oneshot::Receiver<Result<String, WalletConnectError>>),
    }

    struct MockStrategy {
        kind: ConnectorKind,
        connects: Rc<Cell<u32>>,
        script: Rc<RefCell<VecDeque<ConnectOutcome>>>,
        current: Rc<RefCell<Option<String>>>,
        callback: Rc<RefCell<Option<Box<dyn Fn(Option<String>)>>>>,
    }

    impl MockStrategy {
        fn new(script: Vec<ConnectOutcome>) -> Rc<Self> {
            Rc::new(Self {
                kind: ConnectorKind::Injected,
                connects: Rc::new(Cell::new(0)),
                script: Rc::new(RefCell::new(script.into_iter().collect())),
                current: Rc::new(RefCell::new(None)),
                callback: Rc::new(RefCell::new(None)),
            })
        }

        fn fire(&self, account: Option<&str>) {
            let callback = self.callback.borrow();
            let callback = callback.as_ref().expect("listener registered");
            callback(account.map(str::to_string));
        }
    }

    impl WalletStrategy for MockStrategy {
        fn kind(&self) -> ConnectorKind {
            self.kind
        }

        fn initiate_connect(&self) -> LocalBoxFuture<'static, Result<String, WalletConnectError>> {
            self.connects.set(self.connects.get() + 1);
            let outcome = self.script.borrow_mut().pop_front();
            Box::pin(async move {
                match outcome {
                    None => Ok("0xdefa017".to_string()),
                    Some(ConnectOutcome::Done(result)) => result,
                    Some(ConnectOutcome::Gated(rx)) => rx
                        .await
                        .unwrap_or(Err(WalletConnectError::Rejected("gate dropped".into()))),
                }
            })
        }

        fn initiate_disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletConnectError>> {
            Box::pin(async { Ok(()) })
        }

        fn current_account(&self) -> LocalBoxFuture<'static, Option<String>> {
            let current = self.current.borrow().clone();
            Box::pin(async move { current })
        }

        fn on_account_changed(&self, callback: Box<dyn Fn(Option<String>)>) {
            *self.callback.borrow_mut() = Some(callback);
        }
    }

    fn recording(connector: &WalletConnector) -> Rc<RefCell<Vec<WalletConnectorState>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        connector.subscribe(move |state| sink.borrow_mut().push(state.clone()));
        seen
    }

    #[tokio::test]
    async fn test_connect_success() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Done(Ok("0xabc".to_string()))]);
        let seen = recording(&connector);

        let state = connector.connect(strategy).await;
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(
            state.account,
            Some(WalletAccount::new("0xabc", ConnectorKind::Injected))
        );
        assert_eq!(state.last_error, None);

        let statuses: Vec<_> = seen.borrow().iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![WalletStatus::Connecting, WalletStatus::Connected]);
    }

    #[tokio::test]
    async fn test_connect_failure_keeps_error_and_allows_retry() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![
            ConnectOutcome::Done(Err(WalletConnectError::Rejected("user declined".into()))),
            ConnectOutcome::Done(Ok("0xabc".to_string())),
        ]);

        let state = connector.connect(strategy.clone()).await;
        assert_eq!(state.status, WalletStatus::Idle);
        assert_eq!(state.account, None);
        assert_eq!(
            state.last_error,
            Some(WalletConnectError::Rejected("user declined".into()))
        );

        let state = connector.connect(strategy).await;
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(state.last_error, None);
    }

    #[tokio::test]
    async fn test_second_connect_while_connecting_is_noop() {
        let connector = WalletConnector::new();
        let (tx, rx) = oneshot::channel();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Gated(rx)]);
        let connects = strategy.connects.clone();

        let first = connector.connect(strategy.clone());
        let second = connector.connect(strategy.clone());
        let release = async {
            tx.send(Ok("0xabc".to_string())).unwrap();
        };
        let (s1, s2, ()) = futures::join!(first, second, release);

        // the second call observed the in-flight attempt, not a new one
        assert_eq!(s2.status, WalletStatus::Connecting);
        assert_eq!(s1.status, WalletStatus::Connected);
        assert_eq!(connects.get(), 1);
    }

    #[tokio::test]
    async fn test_connect_while_connected_is_noop() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Done(Ok("0xabc".to_string()))]);
        connector.connect(strategy.clone()).await;

        let state = connector.connect(strategy.clone()).await;
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(state.account_address(), Some("0xabc"));
        assert_eq!(strategy.connects.get(), 1);
    }

    #[tokio::test]
    async fn test_external_account_change_stays_connected() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Done(Ok("0xabc".to_string()))]);
        connector.connect(strategy.clone()).await;

        let seen = recording(&connector);
        strategy.fire(Some("0xdef"));

        let state = connector.state();
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(state.account_address(), Some("0xdef"));

        // one transition, Connected throughout, never through Idle
        let statuses: Vec<_> = seen.borrow().iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![WalletStatus::Connected]);
    }

    #[tokio::test]
    async fn test_external_change_to_none_disconnects() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Done(Ok("0xabc".to_string()))]);
        connector.connect(strategy.clone()).await;

        strategy.fire(None);
        let state = connector.state();
        assert_eq!(state.status, WalletStatus::Idle);
        assert_eq!(state.account, None);
    }

    #[tokio::test]
    async fn test_wallet_event_outranks_slow_connect() {
        let connector = WalletConnector::new();
        let (tx, rx) = oneshot::channel();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Gated(rx)]);

        let connecting = connector.connect(strategy.clone());
        let strategy2 = strategy.clone();
        let interleave = async move {
            // wallet reports an account while the connect is still in flight
            strategy2.fire(Some("0xnewer"));
            tx.send(Ok("0xslower".to_string())).unwrap();
        };
        let (state, ()) = futures::join!(connecting, interleave);

        // the earlier, slower connect result never overwrites the event
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(state.account_address(), Some("0xnewer"));
        assert_eq!(connector.state().account_address(), Some("0xnewer"));
    }

    #[tokio::test]
    async fn test_disconnect_clears_account() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(vec![ConnectOutcome::Done(Ok("0xabc".to_string()))]);
        connector.connect(strategy).await;

        let seen = recording(&connector);
        let state = connector.disconnect().await;
        assert_eq!(state.status, WalletStatus::Idle);
        assert_eq!(state.account, None);

        let statuses: Vec<_> = seen.borrow().iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![WalletStatus::Disconnecting, WalletStatus::Idle]);
    }

    #[tokio::test]
    async fn test_disconnect_when_idle_is_noop() {
        let connector = WalletConnector::new();
        let state = connector.disconnect().await;
        assert_eq!(state.status, WalletStatus::Idle);
    }

    #[tokio::test]
    async fn test_restore_with_existing_session() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(Vec::new());
        *strategy.current.borrow_mut() = Some("0xabc".to_string());

        let state = connector.restore(strategy.clone()).await;
        assert_eq!(state.status, WalletStatus::Connected);
        assert_eq!(state.account_address(), Some("0xabc"));
        // restore never prompts
        assert_eq!(strategy.connects.get(), 0);
    }

    #[tokio::test]
    async fn test_restore_without_session_stays_idle() {
        let connector = WalletConnector::new();
        let strategy = MockStrategy::new(Vec::new());

        let state = connector.restore(strategy).await;
        assert_eq!(state.status, WalletStatus::Idle);
        assert_eq!(state.last_error, None);
    }
}
