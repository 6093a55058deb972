//! HTTP serving for [`McpServer`]: the SSE transport and the streamable
//! HTTP transport.
//!
//! - SSE: `GET /sse` opens an event stream. Its first event is `endpoint`,
//!   naming `/messages?session_id=…`. Messages POSTed there are answered with
//!   `202 Accepted` and the responses are delivered on the stream as
//!   `message` events. Every open stream ends when the router's shutdown
//!   signal fires, so graceful shutdown is not held up by idle clients.
//! - Streamable HTTP: `POST /mcp` answers a request with its JSON-RPC
//!   response, and a notification with an empty `202 Accepted`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::error::McpError;
use crate::server::McpServer;

type SessionMap = Arc<Mutex<HashMap<String, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: SessionMap,
    shutdown: watch::Receiver<bool>,
}

/// Removes its session from the map when the event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: SessionMap,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
        info!(session = %self.id, "SSE client disconnected");
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Router for the SSE transport.
///
/// Sending `true` on the `shutdown` channel ends every open event stream
/// and forgets its session. A dropped sender never ends them.
pub fn sse_router(server: Arc<McpServer>, shutdown: watch::Receiver<bool>) -> Router {
    let state = SseState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
        shutdown,
    };
    Router::new()
        .route("/sse", get(sse_connect))
        .route("/messages", post(sse_message))
        .with_state(state)
}

async fn sse_connect(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<String>(32);
    if let Ok(mut sessions) = state.sessions.lock() {
        sessions.insert(session_id.clone(), tx);
    }
    info!(session = %session_id, "SSE client connected");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={}", session_id));
    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };
    let messages = ReceiverStream::new(rx).map(move |json| {
        let _session = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(json))
    });

    let mut shutdown = state.shutdown.clone();
    let stopped = async move {
        let sender_gone = shutdown.wait_for(|stop| *stop).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    };

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) })
        .chain(messages)
        .take_until(stopped);
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn sse_message(
    State(state): State<SseState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> StatusCode {
    let sender = state
        .sessions
        .lock()
        .ok()
        .and_then(|sessions| sessions.get(&query.session_id).cloned());
    let Some(tx) = sender else {
        warn!(session = %query.session_id, "Message for unknown SSE session");
        return StatusCode::NOT_FOUND;
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = server.handle_message(&body).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(json) => {
                if tx.send(json).await.is_err() {
                    debug!(session = %query.session_id, "SSE client gone before response");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode response"),
        }
    });

    StatusCode::ACCEPTED
}

/// Router for the streamable HTTP transport.
pub fn streamable_http_router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(streamable_message))
        .with_state(server)
}

async fn streamable_message(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Serve `router` on `addr` until `shutdown` resolves.
pub async fn serve<F>(router: Router, addr: &str, shutdown: F) -> Result<(), McpError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_listener(listener, router, shutdown).await
}

/// Serve `router` on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<F>(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), McpError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
