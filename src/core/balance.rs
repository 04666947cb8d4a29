//! Account balance queries.
//!
//! [`BalanceQuery`] keeps the native balance of the connected account,
//! re-fetched on every account change. Concurrent fetches for one address
//! coalesce onto a single source request, and a result is applied only if
//! the account it was fetched for is still the current one, so a slow fetch
//! can never surface another account's balance.

use std::cell::RefCell;
use std::rc::Rc;

use alloy_primitives::{Address, U256, utils::format_ether};
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::models::{BalanceSnapshot, WalletAccount};
use crate::utils::{now_ms, post_json};

use super::error::BalanceFetchError;

/// External balance data source: `(amount, symbol)` for one account.
pub trait BalanceSource {
    fn fetch(
        &self,
        account: &WalletAccount,
    ) -> LocalBoxFuture<'static, Result<(String, String), BalanceFetchError>>;
}

struct BalanceInner {
    current: Option<WalletAccount>,
    snapshot: Option<BalanceSnapshot>,
    last_error: Option<BalanceFetchError>,
    inflight: Option<String>,
    waiters: Vec<(String, oneshot::Sender<()>)>,
}

struct BalanceShared {
    inner: RefCell<BalanceInner>,
    observers: RefCell<Vec<Box<dyn Fn(&Option<BalanceSnapshot>)>>>,
}

/// Stale-free balance state for the current wallet account.
#[derive(Clone)]
pub struct BalanceQuery {
    source: Rc<dyn BalanceSource>,
    shared: Rc<BalanceShared>,
}

impl BalanceQuery {
    pub fn new(source: Rc<dyn BalanceSource>) -> Self {
        Self {
            source,
            shared: Rc::new(BalanceShared {
                inner: RefCell::new(BalanceInner {
                    current: None,
                    snapshot: None,
                    last_error: None,
                    inflight: None,
                    waiters: Vec::new(),
                }),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Option<BalanceSnapshot> {
        self.shared.inner.borrow().snapshot.clone()
    }

    pub fn last_error(&self) -> Option<BalanceFetchError> {
        self.shared.inner.borrow().last_error.clone()
    }

    /// Register a snapshot observer, called whenever the exposed snapshot
    /// (or its error) changes.
    pub fn subscribe(&self, callback: impl Fn(&Option<BalanceSnapshot>) + 'static) {
        self.shared.observers.borrow_mut().push(Box::new(callback));
    }

    /// React to a wallet account change.
    ///
    /// `None` clears the snapshot immediately; `Some` re-fetches. A snapshot
    /// belonging to a previous account is dropped before the fetch starts,
    /// never shown against the new account.
    pub async fn account_changed(&self, account: Option<WalletAccount>) {
        match account {
            None => {
                let changed = {
                    let mut inner = self.shared.inner.borrow_mut();
                    let had_snapshot = inner.snapshot.is_some();
                    inner.current = None;
                    inner.snapshot = None;
                    inner.last_error = None;
                    had_snapshot
                };
                if changed {
                    self.notify();
                }
            }
            Some(account) => {
                let changed = {
                    let mut inner = self.shared.inner.borrow_mut();
                    let switching = inner
                        .current
                        .as_ref()
                        .is_none_or(|a| a.address != account.address);
                    inner.current = Some(account.clone());
                    if switching {
                        inner.last_error = None;
                        inner.snapshot.take().is_some()
                    } else {
                        false
                    }
                };
                if changed {
                    self.notify();
                }
                self.fetch_for(account).await;
            }
        }
    }

    /// Re-fetch the current account's balance (e.g. after a transaction).
    pub async fn refresh(&self) {
        let account = self.shared.inner.borrow().current.clone();
        if let Some(account) = account {
            self.fetch_for(account).await;
        }
    }

    async fn fetch_for(&self, account: WalletAccount) {
        let waiter = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.inflight.as_deref() == Some(account.address.as_str()) {
                // coalesce onto the request already in flight for this address
                let (tx, rx) = oneshot::channel();
                inner.waiters.push((account.address.clone(), tx));
                Some(rx)
            } else {
                inner.inflight = Some(account.address.clone());
                None
            }
        };
        if let Some(rx) = waiter {
            let _ = rx.await;
            return;
        }

        let result = self.source.fetch(&account).await;

        let (applied, released) = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.inflight.as_deref() == Some(account.address.as_str()) {
                inner.inflight = None;
            }
            let (matching, rest): (Vec<_>, Vec<_>) = inner
                .waiters
                .drain(..)
                .partition(|(address, _)| *address == account.address);
            inner.waiters = rest;
            let released: Vec<_> = matching.into_iter().map(|(_, tx)| tx).collect();

            let still_current = inner
                .current
                .as_ref()
                .is_some_and(|a| a.address == account.address);
            if still_current {
                match result {
                    Ok((amount, symbol)) => {
                        inner.snapshot = Some(BalanceSnapshot {
                            account: account.address.clone(),
                            amount,
                            symbol,
                            fetched_at: now_ms(),
                        });
                        inner.last_error = None;
                    }
                    Err(err) => {
                        inner.last_error = Some(err);
                    }
                }
                (true, released)
            } else {
                // fetched for a superseded account; discard the result
                (false, released)
            }
        };
        for tx in released {
            let _ = tx.send(());
        }
        if applied {
            self.notify();
        }
    }

    fn notify(&self) {
        let snapshot = self.shared.inner.borrow().snapshot.clone();
        for callback in self.shared.observers.borrow().iter() {
            callback(&snapshot);
        }
    }
}

// =============================================================================
// JSON-RPC Balance Source
// =============================================================================

/// Production balance source: `eth_getBalance` against an HTTP JSON-RPC
/// endpoint.
pub struct RpcBalanceSource {
    rpc_url: String,
    symbol: String,
}

impl RpcBalanceSource {
    pub fn new(rpc_url: &str, symbol: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

impl BalanceSource for RpcBalanceSource {
    fn fetch(
        &self,
        account: &WalletAccount,
    ) -> LocalBoxFuture<'static, Result<(String, String), BalanceFetchError>> {
        let rpc_url = self.rpc_url.clone();
        let symbol = self.symbol.clone();
        let address = account.address.clone();
        Box::pin(async move {
            let checked: Address = address
                .parse()
                .map_err(|_| BalanceFetchError::UnknownAccount(address.clone()))?;

            let body = serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "eth_getBalance",
                "params": [checked.to_string(), "latest"],
            });
            let reply: Value = post_json(&rpc_url, &body)
                .await
                .map_err(|e| BalanceFetchError::Network(e.to_string()))?;

            if let Some(err) = reply.get("error") {
                return Err(BalanceFetchError::Network(err.to_string()));
            }
            let quantity = reply
                .get("result")
                .and_then(Value::as_str)
                .ok_or_else(|| BalanceFetchError::BadResponse("missing result".to_string()))?;
            let wei = U256::from_str_radix(quantity.trim_start_matches("0x"), 16)
                .map_err(|e| BalanceFetchError::BadResponse(e.to_string()))?;

            Ok((format_amount(wei), symbol))
        })
    }
}

/// Format a wei quantity as a trimmed ether string (`1.5`, not
/// `1.500000000000000000`).
fn format_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
