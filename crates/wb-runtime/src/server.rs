//! # WebSocket Host Transport
//!
//! Each page or extension context opens `/{connection-name}`:
//!
//! - `/extension` - extension UI
//! - `/approval?windowId=N` - approval window `N`; its disconnect closes the window
//! - `/provider?tabId=T&url=U` - dApp provider injected into tab `T` showing `U`
//!
//! Text frames carry JSON-RPC requests in and responses or events out. The
//! socket is bridged onto [`serve_connection`], so framing rules, ordering and
//! cleanup are the transport's.
//!
//! ## Admission
//!
//! - Extension and approval upgrades must present the launch's auth token,
//!   as `Authorization: Bearer <token>` or `?token=`.
//! - Provider upgrades are bound to the `Origin` header. A `?url=` on a
//!   different origin is refused; without one the origin itself is the url.

use crate::container::ServiceContainer;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::BoxStream;
use futures::{future, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use shared_types::WindowId;
use std::future::Future;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};
use url::Url;
use wb_01_transport::{serve_connection, ConnectionKind, ConnectionNames, SenderInfo};
use wb_03_actions::ActionStats;

/// Sender details the host passes on the upgrade URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub tab_id: Option<u32>,
    pub url: Option<String>,
    /// Set by approval windows.
    pub window_id: Option<u64>,
    /// Auth token for hosts that cannot set headers on the upgrade.
    pub token: Option<String>,
}

type Refusal = (StatusCode, String);

pub fn router(container: Arc<ServiceContainer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:name", get(connect))
        .with_state(container)
}

/// Serve until `shutdown` completes.
pub async fn run<F>(container: Arc<ServiceContainer>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = container.config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Host transport listening");
    axum::serve(listener, router(container))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health(State(container): State<Arc<ServiceContainer>>) -> Json<serde_json::Value> {
    let stats = container.actions.stats();
    Json(json!({
        "status": "ok",
        "connections": container.connections.len(),
        "actions": {
            "created": ActionStats::get(&stats.created),
            "approved": ActionStats::get(&stats.approved),
            "rejected": ActionStats::get(&stats.rejected),
            "expired": ActionStats::get(&stats.expired),
            "undelivered": ActionStats::get(&stats.undelivered),
        },
    }))
}

async fn connect(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    State(container): State<Arc<ServiceContainer>>,
) -> Response {
    let admitted = admit(
        container.connections.names(),
        container.config.server.auth_token.as_deref(),
        &name,
        &query,
        &headers,
    );
    match admitted {
        Ok(sender) => ws.on_upgrade(move |socket| serve_socket(container, name, query, sender, socket)),
        Err((status, reason)) => {
            warn!(name = %name, status = %status, reason = %reason, "Upgrade refused");
            (status, reason).into_response()
        }
    }
}

/// Decide whether an upgrade may open connection `name`, and who it speaks for.
fn admit(
    names: &ConnectionNames,
    auth_token: Option<&str>,
    name: &str,
    query: &ConnectQuery,
    headers: &HeaderMap,
) -> Result<SenderInfo, Refusal> {
    match names.classify(name) {
        None => Err((StatusCode::NOT_FOUND, format!("unknown connection name: {name}"))),
        Some(ConnectionKind::Extension) => {
            let presented = bearer_token(headers).or(query.token.as_deref());
            if !token_matches(auth_token, presented) {
                return Err((StatusCode::UNAUTHORIZED, "missing or invalid auth token".into()));
            }
            Ok(SenderInfo::new(query.tab_id, query.url.clone()))
        }
        Some(ConnectionKind::DApp) => {
            let origin = headers
                .get(header::ORIGIN)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Url::parse(value).ok())
                .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
                .ok_or_else(|| (StatusCode::FORBIDDEN, "provider connections need a web Origin".to_string()))?;
            let url = match &query.url {
                Some(claimed) => {
                    let same_origin = Url::parse(claimed).is_ok_and(|url| url.origin() == origin.origin());
                    if !same_origin {
                        return Err((StatusCode::FORBIDDEN, "url does not match Origin".into()));
                    }
                    claimed.clone()
                }
                None => origin.origin().ascii_serialization(),
            };
            Ok(SenderInfo::new(query.tab_id, Some(url)))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Constant-time comparison; no configured token admits nobody.
fn token_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => bool::from(expected.as_bytes().ct_eq(presented.as_bytes())),
        _ => false,
    }
}

async fn serve_socket(
    container: Arc<ServiceContainer>,
    name: String,
    query: ConnectQuery,
    sender: SenderInfo,
    socket: WebSocket,
) {
    let (connection, mut outbound) = match container.connections.register(&name, sender) {
        Ok(registered) => registered,
        Err(e) => {
            warn!(name = %name, error = %e, "Connection refused");
            return;
        }
    };

    let (mut sink, stream) = socket.split();
    let connection_id = connection.id();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.to_text())).await {
                debug!(connection_id = %connection_id, error = %e, "Socket write failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    serve_connection(
        container.connections.clone(),
        connection,
        text_frames(stream),
        container.pipeline.clone(),
        container.transport_config(),
    )
    .await;
    writer.abort();

    if container.connections.names().is_approval(&name) {
        if let Some(window) = query.window_id.map(WindowId) {
            window_closed(&container, window).await;
        }
    }
}

/// The approval surface for `window` is gone.
async fn window_closed(container: &ServiceContainer, window: WindowId) {
    container.windows.closed(window);
    match container.actions.on_window_closed(window).await {
        Ok(true) => info!(window_id = %window, "Pending action rejected on window close"),
        Ok(false) => {}
        Err(e) => error!(window_id = %window, error = %e, "Failed to reject action for closed window"),
    }
}

/// Inbound text payloads until the peer closes or the socket fails.
fn text_frames<S>(stream: S) -> BoxStream<'static, String>
where
    S: Stream<Item = Result<Message, axum::Error>> + Send + 'static,
{
    stream
        .take_while(|message| future::ready(matches!(message, Ok(m) if !matches!(m, Message::Close(_)))))
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(text),
                Ok(Message::Binary(bytes)) => String::from_utf8(bytes).ok(),
                _ => None,
            })
        })
        .boxed()
}
