//! Browser-injected wallet strategy (EIP-1193).
//!
//! Talks to `window.ethereum` through direct JavaScript interop via the
//! Reflect API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen::prelude::Closure;

use crate::config::WALLET_TIMEOUT_MS;
use crate::core::error::WalletConnectError;
use crate::core::wallet::WalletStrategy;
use crate::models::ConnectorKind;
use crate::utils::{RaceResult, dom, race_with_timeout};

/// Get the window.ethereum object injected by the wallet extension.
fn get_ethereum() -> Result<Object, WalletConnectError> {
    let window = dom::window().ok_or(WalletConnectError::Unavailable)?;
    Reflect::get(&window, &"ethereum".into())
        .ok()
        .and_then(|v| v.dyn_into::<Object>().ok())
        .ok_or(WalletConnectError::Unavailable)
}

/// Build the `{ method: "..." }` request object and get the request function.
fn request_parts(method: &str) -> Result<(Object, Function, Object), WalletConnectError> {
    let ethereum = get_ethereum()?;

    let args = Object::new();
    Reflect::set(&args, &"method".into(), &method.into())
        .map_err(|_| WalletConnectError::Unavailable)?;

    let request = Reflect::get(&ethereum, &"request".into())
        .map_err(|_| WalletConnectError::Unavailable)?
        .dyn_into::<Function>()
        .map_err(|_| WalletConnectError::Unavailable)?;

    Ok((ethereum, request, args))
}

/// Call `ethereum.request({ method: ... })`.
async fn ethereum_request(method: &str) -> Result<JsValue, WalletConnectError> {
    let (ethereum, request, args) = request_parts(method)?;

    let promise: Promise = request
        .call1(&ethereum, &args)
        .map_err(|_| WalletConnectError::Unavailable)?
        .into();

    JsFuture::from(promise)
        .await
        .map_err(|e| WalletConnectError::Rejected(format!("{:?}", e)))
}

/// Check if an injected wallet is present.
pub fn is_available() -> bool {
    get_ethereum().is_ok()
}

/// Get the current chain ID.
pub async fn get_chain_id() -> Option<u64> {
    let result = ethereum_request("eth_chainId").await.ok()?;
    let hex_str = result.as_string()?;
    u64::from_str_radix(hex_str.trim_start_matches("0x"), 16).ok()
}

/// Convert a chain ID to its network name.
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "Ethereum",
        11155111 => "Sepolia",
        42161 => "Arbitrum",
        10 => "Optimism",
        8453 => "Base",
        137 => "Polygon",
        _ => "Unknown",
    }
}

/// Register a listener on an `ethereum.on(event, ...)` channel.
///
/// The closure is intentionally leaked since listeners persist for the
/// lifetime of the page.
fn install_listener(
    event: &str,
    handler: impl Fn(JsValue) + 'static,
) -> Result<(), WalletConnectError> {
    let ethereum = get_ethereum()?;

    let closure = Closure::wrap(Box::new(handler) as Box<dyn Fn(JsValue)>);

    let on_fn = Reflect::get(&ethereum, &"on".into())
        .map_err(|_| WalletConnectError::Unavailable)?
        .dyn_into::<Function>()
        .map_err(|_| WalletConnectError::Unavailable)?;

    on_fn
        .call2(&ethereum, &event.into(), closure.as_ref())
        .map_err(|_| WalletConnectError::Unavailable)?;

    closure.forget();
    Ok(())
}

/// Register a callback for chain switches. The callback receives the new
/// chain ID already parsed.
pub fn on_chain_changed(callback: impl Fn(u64) + 'static) -> Result<(), WalletConnectError> {
    install_listener("chainChanged", move |chain_id| {
        if let Some(hex) = chain_id.as_string()
            && let Ok(id) = u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        {
            callback(id);
        }
    })
}

/// Wallet strategy over the browser-injected EIP-1193 provider.
pub struct InjectedStrategy {
    callback: Rc<RefCell<Option<Box<dyn Fn(Option<String>)>>>>,
    listener_installed: Cell<bool>,
}

impl InjectedStrategy {
    pub fn new() -> Self {
        Self {
            callback: Rc::new(RefCell::new(None)),
            listener_installed: Cell::new(false),
        }
    }
}

impl Default for InjectedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStrategy for InjectedStrategy {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Injected
    }

    fn initiate_connect(&self) -> LocalBoxFuture<'static, Result<String, WalletConnectError>> {
        Box::pin(async {
            let result = ethereum_request("eth_requestAccounts").await?;
            let accounts = Array::from(&result);
            accounts
                .get(0)
                .as_string()
                .ok_or(WalletConnectError::NoAccount)
        })
    }

    fn initiate_disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletConnectError>> {
        // EIP-1193 has no programmatic disconnect; dropping the local
        // session is all there is to do.
        Box::pin(async { Ok(()) })
    }

    fn current_account(&self) -> LocalBoxFuture<'static, Option<String>> {
        Box::pin(async {
            // eth_accounts never prompts, but a locked wallet can stall it
            let (ethereum, request, args) = request_parts("eth_accounts").ok()?;
            let promise: Promise = request.call1(&ethereum, &args).ok()?.into();

            match race_with_timeout(promise, WALLET_TIMEOUT_MS).await {
                RaceResult::Completed(result) => Array::from(&result).get(0).as_string(),
                RaceResult::TimedOut | RaceResult::Error(_) => None,
            }
        })
    }

    fn on_account_changed(&self, callback: Box<dyn Fn(Option<String>)>) {
        *self.callback.borrow_mut() = Some(callback);
        if self.listener_installed.get() {
            return;
        }

        let slot = self.callback.clone();
        let installed = install_listener("accountsChanged", move |accounts| {
            let account = Array::from(&accounts).get(0).as_string();
            if let Some(callback) = slot.borrow().as_ref() {
                callback(account);
            }
        });
        if installed.is_ok() {
            self.listener_installed.set(true);
        }
    }
}
