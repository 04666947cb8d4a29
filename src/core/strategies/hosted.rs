//! Hosted wallet bridge strategy.
//!
//! A custodial bridge keeps the keys; the app only holds a session whose
//! account is fixed for its lifetime. Account changes therefore happen only
//! through explicit reconnects.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Deserialize;

use crate::config::APP_NAME;
use crate::core::error::{FetchError, WalletConnectError};
use crate::core::wallet::WalletStrategy;
use crate::models::ConnectorKind;
use crate::utils::{fetch_json, post_json};

#[derive(Deserialize)]
struct BridgeSession {
    account: String,
}

/// Wallet strategy backed by a hosted/custodial bridge.
pub struct HostedStrategy {
    bridge_url: String,
    account: Rc<RefCell<Option<String>>>,
    callback: Rc<RefCell<Option<Box<dyn Fn(Option<String>)>>>>,
}

impl HostedStrategy {
    pub fn new(bridge_url: &str) -> Self {
        Self {
            bridge_url: bridge_url.to_string(),
            account: Rc::new(RefCell::new(None)),
            callback: Rc::new(RefCell::new(None)),
        }
    }
}

fn bridge_error(err: FetchError) -> WalletConnectError {
    match err {
        FetchError::Http(401) | FetchError::Http(403) => {
            WalletConnectError::Rejected("bridge sign-in refused".to_string())
        }
        other => WalletConnectError::Bridge(other.to_string()),
    }
}

impl WalletStrategy for HostedStrategy {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::HostedBridge
    }

    fn initiate_connect(&self) -> LocalBoxFuture<'static, Result<String, WalletConnectError>> {
        let bridge_url = self.bridge_url.clone();
        let account = self.account.clone();
        Box::pin(async move {
            let session: BridgeSession = post_json(
                &format!("{bridge_url}/session"),
                &serde_json::json!({ "app": APP_NAME }),
            )
            .await
            .map_err(bridge_error)?;

            *account.borrow_mut() = Some(session.account.clone());
            Ok(session.account)
        })
    }

    fn initiate_disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletConnectError>> {
        let bridge_url = self.bridge_url.clone();
        let account = self.account.clone();
        let callback = self.callback.clone();
        Box::pin(async move {
            let _: Result<serde_json::Value, _> = post_json(
                &format!("{bridge_url}/session/logout"),
                &serde_json::json!({}),
            )
            .await;
            *account.borrow_mut() = None;
            // the bridge session is gone on the wallet side too
            if let Some(callback) = callback.borrow().as_ref() {
                callback(None);
            }
            Ok(())
        })
    }

    fn current_account(&self) -> LocalBoxFuture<'static, Option<String>> {
        let bridge_url = self.bridge_url.clone();
        let account = self.account.clone();
        Box::pin(async move {
            match fetch_json::<BridgeSession>(&format!("{bridge_url}/session")).await {
                Ok(session) => {
                    *account.borrow_mut() = Some(session.account.clone());
                    Some(session.account)
                }
                Err(_) => None,
            }
        })
    }

    fn on_account_changed(&self, callback: Box<dyn Fn(Option<String>)>) {
        // hosted accounts never rotate mid-session; the callback only ever
        // reports the session ending
        *self.callback.borrow_mut() = Some(callback);
    }
}
