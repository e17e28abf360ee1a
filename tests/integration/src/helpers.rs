//! Test helpers for gateway integration tests
//!
//! Spawns the real router on an ephemeral port with the in-memory store and
//! a JWT verifier, and wraps a tokio-tungstenite client for driving
//! connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use synapse_common::{ChatConfig, JwtVerifier};
use synapse_core::{DocumentStore, StoreError, StoreResult, UserIdentity};
use synapse_gateway::{create_app, GatewayState};
use synapse_store::MemoryStore;

/// Shared signing secret for test tokens
const TEST_SECRET: &str = "integration-test-secret";

/// How long receives wait before a test fails
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Test server instance running the real gateway app
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub state: GatewayState,
    verifier: JwtVerifier,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a gateway with default tuning
    pub async fn start() -> Result<Self> {
        Self::start_with_chat_config(ChatConfig::default()).await
    }

    /// Start a gateway with custom tuning knobs
    pub async fn start_with_chat_config(chat: ChatConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::start_with(store.clone(), store, chat).await
    }

    /// Start a gateway with an arbitrary store in front of the seed store
    pub async fn start_with(
        store: Arc<dyn DocumentStore>,
        seed_store: Arc<MemoryStore>,
        chat: ChatConfig,
    ) -> Result<Self> {
        let verifier = JwtVerifier::new(TEST_SECRET);
        let state = GatewayState::new(store, Arc::new(verifier.clone()), chat);

        let app = create_app(state.clone());
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .context("bind test listener")?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            store: seed_store,
            state,
            verifier,
            _handle: handle,
        })
    }

    /// Mint a valid token for the given identity
    pub fn token_for(&self, identity: &UserIdentity) -> String {
        self.verifier
            .issue(identity, 900)
            .expect("failed to issue test token")
    }

    /// Seed a team document into the store
    pub async fn seed_team(&self, team_id: &str, doc: Value) -> Result<()> {
        self.store
            .create("teams", team_id, doc)
            .await
            .map_err(|e| anyhow!("seed team: {e}"))
    }

    /// WebSocket URL for a room, with an optional query-parameter token
    pub fn ws_url(&self, room_id: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws/{room_id}?token={token}", self.addr),
            None => format!("ws://{}/ws/{room_id}", self.addr),
        }
    }

    /// Connect with the token in the query string
    pub async fn connect(&self, room_id: &str, token: &str) -> Result<WsClient> {
        WsClient::connect(&self.ws_url(room_id, Some(token))).await
    }

    /// Connect with the token in the Authorization header
    pub async fn connect_with_header(&self, room_id: &str, token: &str) -> Result<WsClient> {
        let mut request = self.ws_url(room_id, None).into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().context("auth header")?,
        );

        let (stream, _) = connect_async(request).await.context("ws connect")?;
        Ok(WsClient { stream })
    }

    /// Base URL for plain HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Store double whose writes fail, for collaborator-outage tests.
///
/// Reads delegate to the wrapped store so admission and replay still work.
pub struct WriteFailingStore {
    inner: Arc<MemoryStore>,
}

impl WriteFailingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl synapse_core::DocumentStore for WriteFailingStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, _collection: &str, _id: &str, _doc: Value) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn update(&self, _collection: &str, _id: &str, _patch: Value) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn query_recent(
        &self,
        collection: &str,
        field: &str,
        equals: &str,
        limit: i64,
    ) -> StoreResult<Vec<Value>> {
        self.inner.query_recent(collection, field, equals, limit).await
    }
}

/// One WebSocket client connection
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Open a connection to the given URL
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await.context("ws connect")?;
        Ok(Self { stream })
    }

    /// Send one JSON frame
    pub async fn send_json(&mut self, value: &Value) -> Result<()> {
        self.stream
            .send(Message::Text(value.to_string()))
            .await
            .context("ws send")
    }

    /// Send a raw text frame (for malformed-input tests)
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .context("ws send")
    }

    /// Receive the next event, skipping transport-level frames
    pub async fn recv_event(&mut self) -> Result<Value> {
        loop {
            let message = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for event")?
                .ok_or_else(|| anyhow!("connection ended while waiting for event"))??;

            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(frame) => bail!("connection closed: {frame:?}"),
                other => bail!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Receive the next event and assert its `type` tag
    pub async fn expect_event(&mut self, kind: &str) -> Result<Value> {
        let event = self.recv_event().await?;
        if event["type"] != kind {
            bail!("expected '{kind}' event, got: {event}");
        }
        Ok(event)
    }

    /// Assert that nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => Ok(()),
            Ok(other) => bail!("expected silence, got: {other:?}"),
        }
    }

    /// Read until the server closes, returning the close code
    pub async fn recv_close_code(&mut self) -> Result<Option<u16>> {
        loop {
            let message = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for close")?;

            match message {
                Some(Ok(Message::Close(frame))) => {
                    return Ok(frame.map(|f| u16::from(f.code)));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => bail!("ws error while waiting for close: {e}"),
                None => return Ok(None),
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("ws close")
    }
}
