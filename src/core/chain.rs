//! Chain connection management.
//!
//! [`ChainConnection`] owns the single live RPC link to the contracts chain.
//! The wire protocol sits behind the [`ChainRpc`]/[`RpcSession`] traits;
//! [`WsRpc`] is the production WebSocket JSON-RPC transport.
//!
//! Lifecycle: Disconnected -> Connecting -> {Ready | Failed}. Concurrent
//! `open` calls coalesce onto the in-flight attempt, so exactly one transport
//! connect runs at a time. Failure retains its cause and retry is a caller
//! decision (re-invoke `open`).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{Either, LocalBoxFuture, select};
use futures::{SinkExt, StreamExt, pin_mut};
use gloo_net::websocket::{Message, futures::WebSocket};
use gloo_timers::future::TimeoutFuture;
use serde_json::Value;

use crate::config::{CONNECT_TIMEOUT_MS, RPC_CALL_TIMEOUT_MS};
use crate::core::error::ConnectionError;
use crate::models::{ConnectionStatus, ContractDescriptor};

/// An established, stateful RPC session. The session object is the
/// connection's underlying handle: it is owned exclusively by
/// [`ChainConnection`] and contract calls reach it only through handles that
/// re-check their binding first.
pub trait RpcSession {
    /// Execute one contract call through this session.
    fn contract_call(
        &self,
        descriptor: &ContractDescriptor,
        method: &str,
        args: Vec<Value>,
    ) -> LocalBoxFuture<'static, Result<Value, ConnectionError>>;
}

/// Connection strategy for a chain backend (the external collaborator's
/// protocol, consumed opaquely).
pub trait ChainRpc {
    /// Open a connection and complete the handshake.
    fn connect(
        &self,
        endpoint: &str,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn RpcSession>, ConnectionError>>;
}

pub(crate) struct ConnectionInner {
    pub(crate) status: ConnectionStatus,
    pub(crate) session: Option<Rc<dyn RpcSession>>,
    pub(crate) generation: u64,
    endpoint: String,
    waiters: Vec<oneshot::Sender<Result<(), ConnectionError>>>,
}

type StatusObserver = Box<dyn Fn(&ConnectionStatus)>;

/// The application's single live link to the contracts chain.
pub struct ChainConnection {
    transport: Rc<dyn ChainRpc>,
    inner: Rc<RefCell<ConnectionInner>>,
    observers: RefCell<Vec<StatusObserver>>,
}

impl ChainConnection {
    pub fn new(transport: Rc<dyn ChainRpc>, endpoint: &str) -> Self {
        Self {
            transport,
            inner: Rc::new(RefCell::new(ConnectionInner {
                status: ConnectionStatus::Disconnected,
                session: None,
                generation: 0,
                endpoint: endpoint.to_string(),
                waiters: Vec::new(),
            })),
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn endpoint(&self) -> String {
        self.inner.borrow().endpoint.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.borrow().status.clone()
    }

    /// Generation counter, bumped every time a connect attempt reaches Ready.
    /// Contract handles capture it to detect replaced connections.
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// Register a status observer, called after every transition.
    pub fn subscribe(&self, callback: impl Fn(&ConnectionStatus) + 'static) {
        self.observers.borrow_mut().push(Box::new(callback));
    }

    pub(crate) fn state(&self) -> &Rc<RefCell<ConnectionInner>> {
        &self.inner
    }

    /// Open the connection.
    ///
    /// Callers arriving while an attempt is in flight await that attempt's
    /// outcome instead of starting another. Opening an already-ready
    /// connection is a no-op.
    pub async fn open(&self) -> Result<(), ConnectionError> {
        let waiter = {
            let mut inner = self.inner.borrow_mut();
            match inner.status {
                ConnectionStatus::Ready => return Ok(()),
                ConnectionStatus::Connecting => {
                    let (tx, rx) = oneshot::channel();
                    inner.waiters.push(tx);
                    Some(rx)
                }
                _ => {
                    inner.status = ConnectionStatus::Connecting;
                    inner.session = None;
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            return rx.await.unwrap_or(Err(ConnectionError::Closed));
        }

        self.notify();
        let endpoint = self.inner.borrow().endpoint.clone();
        let connected = self.transport.connect(&endpoint).await;

        let outcome = {
            let mut inner = self.inner.borrow_mut();
            if !inner.status.is_connecting() {
                // close() raced the attempt; do not resurrect the connection
                Err(ConnectionError::Closed)
            } else {
                match connected {
                    Ok(session) => {
                        inner.session = Some(session);
                        inner.generation += 1;
                        inner.status = ConnectionStatus::Ready;
                        Ok(())
                    }
                    Err(err) => {
                        inner.status = ConnectionStatus::Failed(err.clone());
                        Err(err)
                    }
                }
            }
        };

        let waiters: Vec<_> = self.inner.borrow_mut().waiters.drain(..).collect();
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
        self.notify();
        outcome
    }

    /// Close the connection. Idempotent; always succeeds.
    ///
    /// Drops the underlying session, so every handle bound to this
    /// connection fails from here on. An in-flight connect attempt is
    /// discarded when it resolves.
    pub fn close(&self) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.status, ConnectionStatus::Disconnected) {
                return;
            }
            inner.session = None;
            inner.status = ConnectionStatus::Disconnected;
            inner.waiters.drain(..).collect::<Vec<_>>()
        };
        for tx in waiters {
            let _ = tx.send(Err(ConnectionError::Closed));
        }
        self.notify();
    }

    fn notify(&self) {
        let status = self.inner.borrow().status.clone();
        for callback in self.observers.borrow().iter() {
            callback(&status);
        }
    }
}

// =============================================================================
// WebSocket Transport
// =============================================================================

/// Production transport: stateful JSON-RPC over WebSocket.
pub struct WsRpc;

struct WsShared {
    ws: RefCell<WebSocket>,
    next_id: Cell<u64>,
    busy: Cell<bool>,
    waiting: RefCell<VecDeque<oneshot::Sender<()>>>,
}

struct WsSession {
    shared: Rc<WsShared>,
}

impl ChainRpc for WsRpc {
    fn connect(
        &self,
        endpoint: &str,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn RpcSession>, ConnectionError>> {
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            let ws = WebSocket::open(&endpoint)
                .map_err(|e| ConnectionError::Unreachable(e.to_string()))?;
            let session = WsSession {
                shared: Rc::new(WsShared {
                    ws: RefCell::new(ws),
                    next_id: Cell::new(1),
                    busy: Cell::new(false),
                    waiting: RefCell::new(VecDeque::new()),
                }),
            };

            // Confirm the node answers before reporting the connection ready.
            let handshake = request(
                session.shared.clone(),
                "system_chain",
                Value::Array(Vec::new()),
                CONNECT_TIMEOUT_MS,
            );
            handshake.await.map_err(|e| match e {
                ConnectionError::Timeout => ConnectionError::Timeout,
                other => ConnectionError::Handshake(other.to_string()),
            })?;

            Ok(Rc::new(session) as Rc<dyn RpcSession>)
        })
    }
}

impl RpcSession for WsSession {
    fn contract_call(
        &self,
        descriptor: &ContractDescriptor,
        method: &str,
        args: Vec<Value>,
    ) -> LocalBoxFuture<'static, Result<Value, ConnectionError>> {
        let shared = self.shared.clone();
        let method = method.to_string();
        let params = serde_json::json!([descriptor.address, method, args]);
        Box::pin(async move { request(shared, "contracts_call", params, RPC_CALL_TIMEOUT_MS).await })
    }
}

/// Issue one request on the socket, taking a turn in FIFO order.
///
/// The socket carries interleaved replies and notifications; serializing
/// requests keeps the send/receive exchange simple and non-reentrant.
async fn request(
    shared: Rc<WsShared>,
    method: &str,
    params: Value,
    timeout_ms: u32,
) -> Result<Value, ConnectionError> {
    if shared.busy.replace(true) {
        let (tx, rx) = oneshot::channel();
        shared.waiting.borrow_mut().push_back(tx);
        // the releasing task hands the busy flag over with the turn
        if rx.await.is_err() {
            return Err(ConnectionError::Closed);
        }
    }

    let exchange = exchange(&shared, method, params);
    let timeout = TimeoutFuture::new(timeout_ms);
    pin_mut!(exchange);
    pin_mut!(timeout);
    let result = match select(exchange, timeout).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(ConnectionError::Timeout),
    };

    let mut waiting = shared.waiting.borrow_mut();
    loop {
        match waiting.pop_front() {
            Some(tx) => {
                if tx.send(()).is_ok() {
                    break;
                }
            }
            None => {
                shared.busy.set(false);
                break;
            }
        }
    }

    result
}

async fn exchange(shared: &WsShared, method: &str, params: Value) -> Result<Value, ConnectionError> {
    let id = shared.next_id.get();
    shared.next_id.set(id + 1);
    let frame = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string();

    let mut ws = shared.ws.borrow_mut();
    ws.send(Message::Text(frame))
        .await
        .map_err(|e| ConnectionError::Rpc(e.to_string()))?;

    loop {
        match ws.next().await {
            None => return Err(ConnectionError::Closed),
            Some(Err(e)) => return Err(ConnectionError::Rpc(e.to_string())),
            Some(Ok(Message::Bytes(_))) => continue,
            Some(Ok(Message::Text(text))) => {
                let Ok(value) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                // skip notifications and replies to abandoned requests
                if value.get("id").and_then(Value::as_u64) != Some(id) {
                    continue;
                }
                if let Some(err) = value.get("error") {
                    return Err(ConnectionError::Rpc(err.to_string()));
                }
                return Ok(value.get("result").cloned().unwrap_or(Value::Null));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubSession;

    impl RpcSession for StubSession {
        fn contract_call(
            &self,
            _descriptor: &ContractDescriptor,
            method: &str,
            _args: Vec<Value>,
        ) -> LocalBoxFuture<'static, Result<Value, ConnectionError>> {
            let method = method.to_string();
            Box::pin(async move { Ok(Value::String(method)) })
        }
    }

    enum ConnectScript {
        Done(Result<(), ConnectionError>),
        Gated(oneshot::Receiver<Result<(), ConnectionError>>),
    }

    #[derive(Default)]
    struct StubRpc {
        attempts: Rc<Cell<u32>>,
        script: Rc<RefCell<VecDeque<ConnectScript>>>,
    }

    impl StubRpc {
        fn scripted(script: Vec<ConnectScript>) -> Self {
            Self {
                attempts: Rc::new(Cell::new(0)),
                script: Rc::new(RefCell::new(script.into_iter().collect())),
            }
        }
    }

    impl ChainRpc for StubRpc {
        fn connect(
            &self,
            _endpoint: &str,
        ) -> LocalBoxFuture<'static, Result<Rc<dyn RpcSession>, ConnectionError>> {
            self.attempts.set(self.attempts.get() + 1);
            let script = self.script.borrow_mut().pop_front();
            Box::pin(async move {
                let outcome = match script {
                    None => Ok(()),
                    Some(ConnectScript::Done(result)) => result,
                    Some(ConnectScript::Gated(rx)) => {
                        rx.await.unwrap_or(Err(ConnectionError::Closed))
                    }
                };
                outcome.map(|()| Rc::new(StubSession) as Rc<dyn RpcSession>)
            })
        }
    }

    fn connection(rpc: StubRpc) -> (ChainConnection, Rc<Cell<u32>>) {
        let attempts = rpc.attempts.clone();
        (ChainConnection::new(Rc::new(rpc), "wss://node.test"), attempts)
    }

    #[tokio::test]
    async fn test_open_reaches_ready() {
        let (conn, attempts) = connection(StubRpc::default());
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);

        conn.open().await.unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Ready);
        assert_eq!(conn.generation(), 1);
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_open_is_single_flight() {
        let (tx, rx) = oneshot::channel();
        let (conn, attempts) = connection(StubRpc::scripted(vec![ConnectScript::Gated(rx)]));

        let first = conn.open();
        let second = conn.open();
        let release = async {
            tx.send(Ok(())).unwrap();
        };
        let (r1, r2, ()) = futures::join!(first, second, release);

        assert!(r1.is_ok());
        assert!(r2.is_ok());
        assert_eq!(attempts.get(), 1);
        assert_eq!(conn.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_coalesced_open_sees_failure() {
        let (tx, rx) = oneshot::channel();
        let (conn, attempts) = connection(StubRpc::scripted(vec![ConnectScript::Gated(rx)]));

        let first = conn.open();
        let second = conn.open();
        let release = async {
            tx.send(Err(ConnectionError::Timeout)).unwrap();
        };
        let (r1, r2, ()) = futures::join!(first, second, release);

        assert_eq!(r1, Err(ConnectionError::Timeout));
        assert_eq!(r2, Err(ConnectionError::Timeout));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_failure_retains_cause_until_retry() {
        let (conn, attempts) = connection(StubRpc::scripted(vec![ConnectScript::Done(Err(
            ConnectionError::Unreachable("refused".to_string()),
        ))]));

        let err = conn.open().await.unwrap_err();
        assert_eq!(err, ConnectionError::Unreachable("refused".to_string()));
        assert_eq!(conn.status().failure(), Some(&err));

        // no automatic retry happened
        assert_eq!(attempts.get(), 1);

        // retry is an explicit caller decision
        conn.open().await.unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Ready);
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test]
    async fn test_open_when_ready_is_noop() {
        let (conn, attempts) = connection(StubRpc::default());
        conn.open().await.unwrap();
        conn.open().await.unwrap();
        assert_eq!(attempts.get(), 1);
        assert_eq!(conn.generation(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (conn, _) = connection(StubRpc::default());
        conn.open().await.unwrap();

        conn.close();
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
        conn.close();
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_close_discards_inflight_connect() {
        let (tx, rx) = oneshot::channel();
        let (conn, attempts) = connection(StubRpc::scripted(vec![ConnectScript::Gated(rx)]));

        let opening = conn.open();
        let interrupt = async {
            conn.close();
            tx.send(Ok(())).unwrap();
        };
        let (result, ()) = futures::join!(opening, interrupt);

        assert_eq!(result, Err(ConnectionError::Closed));
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
        assert_eq!(conn.generation(), 0);
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_bumps_generation() {
        let (conn, _) = connection(StubRpc::default());
        conn.open().await.unwrap();
        assert_eq!(conn.generation(), 1);

        conn.close();
        conn.open().await.unwrap();
        assert_eq!(conn.generation(), 2);
    }

    #[tokio::test]
    async fn test_observers_see_transitions() {
        let (conn, _) = connection(StubRpc::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        conn.subscribe(move |status| sink.borrow_mut().push(status.label()));

        conn.open().await.unwrap();
        conn.close();
        assert_eq!(&*seen.borrow(), &["connecting", "ready", "disconnected"]);
    }
}
