//! Connection lifecycle
//!
//! Drives one connection through
//! `Connecting → Authenticating → Authorizing → Admitted → Serving →
//! Closing → Closed`. Admission failures close the socket with a
//! distinguishing code before any room state is touched; once admitted,
//! every exit path runs the same teardown exactly once.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use synapse_core::{AuthError, Message as ChatMessage, StoreError, Team, UserIdentity};

use crate::close_codes::CloseCode;
use crate::error::{GatewayError, GatewayResult};
use crate::events::{ClientFrame, ServerEvent};
use crate::server::GatewayState;
use crate::session::{Outbound, Session};

/// Per-connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    Authorizing,
    Admitted,
    Serving,
    Closing,
    Closed,
}

/// Connection query parameters
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Bearer token; the Authorization header is the alternative carrier
    token: Option<String>,
}

/// WebSocket chat endpoint: `GET /ws/{room_id}`
pub async fn chat_handler(
    State(state): State<GatewayState>,
    Path(room_id): Path<String>,
    Query(params): Query<ConnectParams>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // Query parameter wins when both carriers are present
    let token = params
        .token
        .or_else(|| auth_header.map(|TypedHeader(auth)| auth.token().to_string()));

    ws.on_upgrade(move |socket| handle_socket(state, socket, room_id, token))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(
    state: GatewayState,
    mut socket: WebSocket,
    room_id: String,
    token: Option<String>,
) {
    let mut conn_state = ConnectionState::Connecting;

    match admission(&state, &room_id, token.as_deref(), &mut conn_state).await {
        Ok(identity) => {
            serve(state, socket, room_id, identity, conn_state).await;
        }
        Err(err) => {
            let code = err.close_code();
            tracing::info!(
                room_id = %room_id,
                code = code.as_u16(),
                error = %err,
                "Connection rejected during admission"
            );
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                })))
                .await;
        }
    }
}

/// Advance the per-connection state machine, tracing the transition
fn advance(conn_state: &mut ConnectionState, to: ConnectionState, room_id: &str) {
    tracing::trace!(room_id, from = ?conn_state, to = ?to, "Connection state");
    *conn_state = to;
}

/// Authenticate the token and authorize room membership.
///
/// Neither step touches the registry, so a rejected connection leaves no
/// trace and no departure event is ever emitted for it.
async fn admission(
    state: &GatewayState,
    room_id: &str,
    token: Option<&str>,
    conn_state: &mut ConnectionState,
) -> GatewayResult<UserIdentity> {
    advance(conn_state, ConnectionState::Authenticating, room_id);

    let token = token.ok_or_else(|| {
        GatewayError::AuthenticationFailed(AuthError::InvalidToken("no token presented".into()))
    })?;
    let identity = state.verifier().verify(token).await?;

    advance(conn_state, ConnectionState::Authorizing, room_id);

    let doc = state
        .store()
        .get("teams", room_id)
        .await?
        .ok_or_else(|| GatewayError::RoomNotFound(room_id.to_string()))?;
    let team: Team = serde_json::from_value(doc)
        .map_err(|e| GatewayError::Collaborator(StoreError::corrupt("teams", e)))?;

    if !team.is_member(&identity.user_id) {
        return Err(GatewayError::AccessDenied(room_id.to_string()));
    }

    advance(conn_state, ConnectionState::Admitted, room_id);
    Ok(identity)
}

/// Run an admitted connection until it closes
async fn serve(
    state: GatewayState,
    socket: WebSocket,
    room_id: String,
    identity: UserIdentity,
    mut conn_state: ConnectionState,
) {
    let chat = state.chat_config();
    let (tx, rx) = mpsc::channel::<Outbound>(chat.outbound_buffer.max(1));
    let session = Session::new(identity, room_id.clone(), tx);

    let (ws_sink, mut ws_stream) = socket.split();
    let writer = tokio::spawn(write_outbound(ws_sink, rx));

    if let Err(err) = state.registry().admit(&room_id, session.clone()) {
        tracing::error!(room_id = %room_id, error = %err, "Admission to registry failed");
        session.send_close(CloseCode::Internal);
        drop(session);
        let _ = writer.await;
        return;
    }

    tracing::info!(
        room_id = %room_id,
        session_id = %session.session_id(),
        user_id = %session.user_id(),
        "Session admitted"
    );

    // Replay goes to this connection only, then the room learns of the join
    replay_history(&state, &session).await;
    state
        .broadcaster()
        .broadcast(
            &room_id,
            &ServerEvent::user_joined(session.identity().clone()),
            Some(session.session_id()),
        )
        .await;

    advance(&mut conn_state, ConnectionState::Serving, &room_id);
    let close_code = receive_loop(&state, &session, &mut ws_stream).await;

    advance(&mut conn_state, ConnectionState::Closing, &room_id);
    teardown(&state, &session, close_code).await;

    // Dropping the session closes the outbound queue; the writer drains what
    // is left and releases the socket on every path into Closing.
    drop(session);
    let _ = writer.await;
    advance(&mut conn_state, ConnectionState::Closed, &room_id);
}

/// Drain the outbound queue onto the socket.
///
/// The single writer is what serializes fan-out and direct replies targeting
/// the same connection; nothing else touches the sink.
async fn write_outbound(mut sink: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Outbound>) {
    while let Some(out) = rx.recv().await {
        match out {
            Outbound::Event(payload) => {
                if sink.send(Message::Text(payload.to_string())).await.is_err() {
                    break;
                }
            }
            Outbound::Close(code) => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: code.as_u16(),
                        reason: code.description().into(),
                    })))
                    .await;
                break;
            }
        }
    }

    let _ = sink.close().await;
}

/// Send the recent-history window directly to a newly admitted session.
///
/// A failed history read degrades to an error event rather than rejecting
/// the admission; the connection is already live.
async fn replay_history(state: &GatewayState, session: &Session) {
    let limit = state.chat_config().history_limit;

    let event = match state
        .store()
        .query_recent("messages", "team_id", session.room_id(), limit)
        .await
    {
        Ok(docs) => {
            let messages: Vec<ChatMessage> = docs
                .into_iter()
                .filter_map(|doc| match serde_json::from_value(doc) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!(
                            room_id = %session.room_id(),
                            error = %e,
                            "Skipping unreadable message in history"
                        );
                        None
                    }
                })
                .collect();
            ServerEvent::recent_messages(messages)
        }
        Err(e) => {
            tracing::warn!(
                room_id = %session.room_id(),
                error = %e,
                "History replay unavailable"
            );
            ServerEvent::error("recent messages unavailable")
        }
    };

    send_direct(state, session, &event).await;
}

/// Read inbound frames until the connection ends.
///
/// Returns the close code to send, if the server initiated the close.
async fn receive_loop(
    state: &GatewayState,
    session: &Arc<Session>,
    ws_stream: &mut SplitStream<WebSocket>,
) -> Option<CloseCode> {
    let idle_timeout = state.chat_config().idle_timeout();

    loop {
        let frame = tokio::select! {
            () = session.evicted() => {
                tracing::debug!(session_id = %session.session_id(), "Session evicted by broadcaster");
                return None;
            }
            () = idle_sleep(idle_timeout) => {
                tracing::info!(
                    session_id = %session.session_id(),
                    "No inbound frames within idle bound, closing"
                );
                return Some(CloseCode::IdleTimeout);
            }
            frame = ws_stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => handle_frame(state, session, &text).await,
            Some(Ok(Message::Binary(_))) => {
                send_direct(state, session, &ServerEvent::error("binary frames not supported"))
                    .await;
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(session_id = %session.session_id(), "Client closed connection");
                return None;
            }
            Some(Err(e)) => {
                tracing::warn!(session_id = %session.session_id(), error = %e, "WebSocket error");
                return None;
            }
        }
    }
}

/// Sleep for the idle bound, or forever when idle disconnects are disabled
async fn idle_sleep(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Decode and dispatch one inbound frame.
///
/// Decode failures and unknown kinds are answered on this connection only
/// and never close it.
async fn handle_frame(state: &GatewayState, session: &Arc<Session>, text: &str) {
    match ClientFrame::decode(text) {
        Ok(ClientFrame::ChatMessage { content, reply_to }) => {
            handle_chat_message(state, session, content, reply_to).await;
        }
        Ok(ClientFrame::Typing { is_typing }) => {
            let event = ServerEvent::typing(session.identity().clone(), is_typing);
            state
                .broadcaster()
                .broadcast(session.room_id(), &event, Some(session.session_id()))
                .await;
        }
        Err(e) => {
            tracing::debug!(
                session_id = %session.session_id(),
                error = %e,
                "Undecodable inbound frame"
            );
            send_direct(state, session, &ServerEvent::error("unrecognized or malformed frame"))
                .await;
        }
    }
}

/// Persist a chat message, then echo it to the whole room.
///
/// The echo doubles as the sender's persistence acknowledgement, so the
/// broadcast must never precede a successful write. On a store failure the
/// sender gets an error event and must resend.
async fn handle_chat_message(
    state: &GatewayState,
    session: &Arc<Session>,
    content: String,
    reply_to: Option<String>,
) {
    let message = ChatMessage::new_text(session.room_id(), session.identity(), content, reply_to);

    let doc = match serde_json::to_value(&message) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            send_direct(state, session, &ServerEvent::error("message could not be saved")).await;
            return;
        }
    };

    if let Err(e) = state
        .store()
        .create("messages", &message.message_id, doc)
        .await
    {
        tracing::warn!(
            room_id = %session.room_id(),
            message_id = %message.message_id,
            error = %e,
            "Message persistence failed"
        );
        send_direct(state, session, &ServerEvent::error("message could not be saved")).await;
        return;
    }

    let room_id = message.team_id.clone();
    state
        .broadcaster()
        .broadcast(&room_id, &ServerEvent::chat_message(message), None)
        .await;

    // Team activity stamp is best-effort; the echoed message is the
    // durability signal, not this patch
    if let Err(e) = state
        .store()
        .update(
            "teams",
            &room_id,
            serde_json::json!({ "last_message_at": chrono::Utc::now() }),
        )
        .await
    {
        tracing::debug!(room_id = %room_id, error = %e, "Failed to stamp team activity");
    }
}

/// Reply on this connection only.
///
/// A failed direct send means the connection is stalled or gone; signal the
/// receive loop so the normal close path runs.
async fn send_direct(state: &GatewayState, session: &Session, event: &ServerEvent) {
    let payload: Arc<str> = match event.to_json() {
        Ok(json) => json.into(),
        Err(e) => {
            tracing::error!(kind = event.kind(), error = %e, "Failed to serialize event");
            return;
        }
    };

    if let Err(e) = session
        .send(payload, state.chat_config().send_timeout())
        .await
    {
        tracing::warn!(
            session_id = %session.session_id(),
            error = %e,
            "Direct send failed, closing session"
        );
        session.close();
    }
}

/// Deregister and announce the departure.
///
/// `remove` is idempotent: the broadcaster may already have evicted this
/// session, in which case only the announcement remains to be done.
async fn teardown(state: &GatewayState, session: &Arc<Session>, close_code: Option<CloseCode>) {
    state
        .registry()
        .remove(session.room_id(), session.session_id());

    if let Some(code) = close_code {
        session.send_close(code);
    }

    state
        .broadcaster()
        .broadcast(
            session.room_id(),
            &ServerEvent::user_left(session.identity().clone()),
            Some(session.session_id()),
        )
        .await;

    tracing::info!(
        room_id = %session.room_id(),
        session_id = %session.session_id(),
        user_id = %session.user_id(),
        "Session closed"
    );
}
