//! WalletConnect-style relay strategy.
//!
//! Pairing runs through a hosted relay: the app registers a pairing request,
//! the user approves it from their mobile wallet, and the relay reports the
//! approved account. After pairing, a light poll keeps the session's account
//! in sync with the wallet side.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use wasm_bindgen_futures::spawn_local;

use crate::config::{APP_NAME, RELAY_POLL_ATTEMPTS, RELAY_POLL_INTERVAL_MS};
use crate::core::error::WalletConnectError;
use crate::core::wallet::WalletStrategy;
use crate::models::ConnectorKind;
use crate::utils::{fetch_json, post_json};

#[derive(Serialize)]
struct PairingRequest<'a> {
    app: &'a str,
}

#[derive(Deserialize)]
struct PairingCreated {
    topic: String,
}

#[derive(Deserialize)]
struct PairingState {
    status: String,
    account: Option<String>,
}

#[derive(Clone)]
struct RelaySession {
    topic: String,
    account: String,
}

type AccountCallback = Rc<RefCell<Option<Box<dyn Fn(Option<String>)>>>>;

/// Wallet strategy pairing through a WalletConnect-style relay.
pub struct RelayStrategy {
    relay_url: String,
    session: Rc<RefCell<Option<RelaySession>>>,
    callback: AccountCallback,
}

impl RelayStrategy {
    pub fn new(relay_url: &str) -> Self {
        Self {
            relay_url: relay_url.to_string(),
            session: Rc::new(RefCell::new(None)),
            callback: Rc::new(RefCell::new(None)),
        }
    }
}

impl WalletStrategy for RelayStrategy {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::RelayBased
    }

    fn initiate_connect(&self) -> LocalBoxFuture<'static, Result<String, WalletConnectError>> {
        let relay_url = self.relay_url.clone();
        let session = self.session.clone();
        let callback = self.callback.clone();
        Box::pin(async move {
            let created: PairingCreated =
                post_json(&format!("{relay_url}/pairings"), &PairingRequest { app: APP_NAME })
                    .await
                    .map_err(|e| WalletConnectError::Relay(e.to_string()))?;

            for _ in 0..RELAY_POLL_ATTEMPTS {
                TimeoutFuture::new(RELAY_POLL_INTERVAL_MS).await;

                let state: PairingState =
                    fetch_json(&format!("{relay_url}/pairings/{}", created.topic))
                        .await
                        .map_err(|e| WalletConnectError::Relay(e.to_string()))?;

                match state.status.as_str() {
                    "approved" => {
                        let account = state.account.ok_or(WalletConnectError::NoAccount)?;
                        *session.borrow_mut() = Some(RelaySession {
                            topic: created.topic.clone(),
                            account: account.clone(),
                        });
                        spawn_local(watch_session(
                            relay_url,
                            created.topic,
                            session.clone(),
                            callback.clone(),
                        ));
                        return Ok(account);
                    }
                    "rejected" => {
                        return Err(WalletConnectError::Rejected(
                            "pairing rejected in wallet".to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            Err(WalletConnectError::Relay("pairing timed out".to_string()))
        })
    }

    fn initiate_disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletConnectError>> {
        let relay_url = self.relay_url.clone();
        let session = self.session.take();
        Box::pin(async move {
            if let Some(session) = session {
                let _: Result<serde_json::Value, _> = post_json(
                    &format!("{relay_url}/pairings/{}/close", session.topic),
                    &serde_json::json!({}),
                )
                .await;
            }
            Ok(())
        })
    }

    fn current_account(&self) -> LocalBoxFuture<'static, Option<String>> {
        let account = self.session.borrow().as_ref().map(|s| s.account.clone());
        Box::pin(async move { account })
    }

    fn on_account_changed(&self, callback: Box<dyn Fn(Option<String>)>) {
        *self.callback.borrow_mut() = Some(callback);
    }
}

/// Follow an approved pairing until it closes, forwarding account changes.
async fn watch_session(
    relay_url: String,
    topic: String,
    session: Rc<RefCell<Option<RelaySession>>>,
    callback: AccountCallback,
) {
    let emit = |account: Option<String>| {
        if let Some(callback) = callback.borrow().as_ref() {
            callback(account);
        }
    };

    loop {
        TimeoutFuture::new(RELAY_POLL_INTERVAL_MS).await;

        // stop once this pairing is no longer the active session
        let active = session
            .borrow()
            .as_ref()
            .is_some_and(|s| s.topic == topic);
        if !active {
            return;
        }

        let Ok(state) = fetch_json::<PairingState>(&format!("{relay_url}/pairings/{topic}")).await
        else {
            // transient relay error; keep watching
            continue;
        };

        if state.status == "closed" {
            *session.borrow_mut() = None;
            emit(None);
            return;
        }

        if let Some(account) = state.account {
            let changed = session
                .borrow()
                .as_ref()
                .is_some_and(|s| s.account != account);
            if changed {
                if let Some(current) = session.borrow_mut().as_mut() {
                    current.account = account.clone();
                }
                emit(Some(account));
            }
        }
    }
}
