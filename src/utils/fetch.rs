//! Network fetching utilities with timeout support.
//!
//! Provides async fetch helpers with Promise-race timeouts for the HTTP
//! collaborators (wallet relay, hosted bridge, balance RPC).

use js_sys::{Array, Promise};
use serde::{Serialize, de::DeserializeOwned};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::config::FETCH_TIMEOUT_MS;
use crate::core::error::FetchError;

// =============================================================================
// Promise Racing Utilities
// =============================================================================

/// Result of a promise race with timeout.
#[derive(Debug)]
pub enum RaceResult {
    /// The promise completed before timeout.
    Completed(JsValue),
    /// Timeout occurred before promise completed.
    TimedOut,
    /// Promise rejected with an error.
    Error(String),
}

/// Race a promise against a timeout.
///
/// Reusable timeout behavior for any JavaScript Promise via `Promise.race`.
pub async fn race_with_timeout(promise: Promise, timeout_ms: i32) -> RaceResult {
    let Some(window) = web_sys::window() else {
        return RaceResult::Error("Window not available".to_string());
    };

    // Timeout promise resolves to undefined, which the winner check keys on
    let timeout_promise = Promise::new(&mut |resolve, _| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms);
    });

    let race_array = Array::new();
    race_array.push(&promise);
    race_array.push(&timeout_promise);
    let race_promise = Promise::race(&race_array);

    match JsFuture::from(race_promise).await {
        Ok(result) => {
            if result.is_undefined() {
                RaceResult::TimedOut
            } else {
                RaceResult::Completed(result)
            }
        }
        Err(e) => RaceResult::Error(e.as_string().unwrap_or_else(|| "Unknown error".to_string())),
    }
}

// =============================================================================
// Fetch Functions
// =============================================================================

/// Fetch and parse JSON from a URL.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);
    let text = fetch_with(url, &opts).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::JsonParse(e.to_string()))
}

/// POST a JSON body to a URL and parse the JSON response.
pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    url: &str,
    body: &B,
) -> Result<T, FetchError> {
    let payload = serde_json::to_string(body).map_err(|e| FetchError::JsonParse(e.to_string()))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&JsValue::from_str(&payload));

    let text = fetch_with_content_type(url, &opts).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::JsonParse(e.to_string()))
}

async fn fetch_with_content_type(url: &str, opts: &RequestInit) -> Result<String, FetchError> {
    let request =
        Request::new_with_str_and_init(url, opts).map_err(|_| FetchError::RequestCreationFailed)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|_| FetchError::RequestCreationFailed)?;
    dispatch(request).await
}

async fn fetch_with(url: &str, opts: &RequestInit) -> Result<String, FetchError> {
    let request =
        Request::new_with_str_and_init(url, opts).map_err(|_| FetchError::RequestCreationFailed)?;
    dispatch(request).await
}

/// Run a request with timeout and read the response body as text.
async fn dispatch(request: Request) -> Result<String, FetchError> {
    let window = web_sys::window().ok_or(FetchError::NoWindow)?;
    let fetch_promise = window.fetch_with_request(&request);

    match race_with_timeout(fetch_promise, FETCH_TIMEOUT_MS).await {
        RaceResult::TimedOut => Err(FetchError::Timeout),
        RaceResult::Error(msg) => Err(FetchError::Network(msg)),
        RaceResult::Completed(result) => {
            let resp: Response = result.dyn_into().map_err(|_| FetchError::InvalidContent)?;

            if !resp.ok() {
                return Err(FetchError::Http(resp.status()));
            }

            let text = JsFuture::from(resp.text().map_err(|_| FetchError::ResponseReadFailed)?)
                .await
                .map_err(|_| FetchError::ResponseReadFailed)?;

            text.as_string().ok_or(FetchError::InvalidContent)
        }
    }
}
