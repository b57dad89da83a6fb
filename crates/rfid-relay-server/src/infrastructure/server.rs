//! HTTP and WebSocket server.
//!
//! One port serves everything:
//!
//! | Route         | Behaviour                                                     |
//! |---------------|---------------------------------------------------------------|
//! | `/`           | WebSocket upgrade if requested, otherwise an HTML status page |
//! | `/ping`       | `pong`, for load-balancer health checks                       |
//! | `/api/status` | JSON [`RelayStatus`]                                          |
//! | `/test-sound` | plays the buzz once, for checking the speaker setup           |
//!
//! CORS is permissive so a viewer page served from another origin can poll
//! the status endpoint.
//!
//! # Shutdown
//!
//! axum's graceful shutdown stops accepting new connections, but upgraded
//! WebSockets are long-lived.  [`serve`] therefore also flips a `watch`
//! flag that every session task selects on, so open connections are
//! unregistered and closed instead of holding the process up.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::{ConnectionRegistry, Dispatcher, LastEventCache, RelayStatus, ScanHook};
use crate::domain::RelayConfig;
use crate::infrastructure::local_addr;
use crate::infrastructure::session::handle_session;
use crate::infrastructure::sound::SoundHook;

// ── Shared state ──────────────────────────────────────────────────────────────

/// State shared by every request handler and session task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub registry: Arc<ConnectionRegistry>,
    pub cache: Arc<LastEventCache>,
    pub dispatcher: Arc<Dispatcher>,
    pub sound: Arc<SoundHook>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Production wiring: the scan hook is the configured [`SoundHook`].
    pub fn new(config: RelayConfig) -> Self {
        let sound = Arc::new(SoundHook::from_config(&config));
        let hook: Arc<dyn ScanHook> = sound.clone();
        Self::build(config, sound, hook)
    }

    /// Same as [`new`](Self::new) but with a caller-supplied scan hook.
    /// `/test-sound` still uses the configured sound hook.
    pub fn with_hook(config: RelayConfig, hook: Arc<dyn ScanHook>) -> Self {
        let sound = Arc::new(SoundHook::from_config(&config));
        Self::build(config, sound, hook)
    }

    fn build(config: RelayConfig, sound: Arc<SoundHook>, hook: Arc<dyn ScanHook>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let cache = Arc::new(LastEventCache::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            hook,
        ));
        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            registry,
            cache,
            dispatcher,
            sound,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Receiver that flips to `true` once the server starts shutting down.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Tells every session task to close its connection.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn status(&self) -> RelayStatus {
        RelayStatus::collect(&self.registry, &self.cache, &self.config).await
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the axum router for the relay.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/api/status", get(api_status))
        .route("/test-sound", get(test_sound))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission) or if the server fails while running.
pub async fn run_server<F>(config: RelayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind relay listener on {}", config.bind_addr))?;

    log_startup_banner(&config);

    serve(listener, AppState::new(config), shutdown).await
}

/// Serves the relay on an already-bound listener.
///
/// Split out of [`run_server`] so tests can bind port 0 and read the
/// assigned address first.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener
        .local_addr()
        .context("failed to read listener address")?;
    info!("relay listening on {local}");

    let stopper = state.clone();
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutdown requested; closing client connections");
            stopper.begin_shutdown();
        })
        .await
        .context("relay server error")?;

    info!("relay stopped");
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn index(
    State(state): State<AppState>,
    ConnectInfo(socket_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => {
            let peer_addr = peer_address(&headers, socket_addr);
            ws.on_upgrade(move |socket| handle_session(socket, peer_addr, state))
        }
        Err(_) => Html(render_index(&state.status().await)).into_response(),
    }
}

async fn ping() -> &'static str {
    "pong"
}

async fn api_status(State(state): State<AppState>) -> Json<RelayStatus> {
    Json(state.status().await)
}

async fn test_sound(State(state): State<AppState>) -> &'static str {
    if let Err(e) = state.sound.play() {
        warn!("test sound failed: {e}");
    }
    "Playing buzz sound..."
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Peer address for logging: the first `X-Forwarded-For` entry when behind a
/// proxy, otherwise the socket address.
fn peer_address(headers: &HeaderMap, socket_addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| socket_addr.to_string())
}

fn render_index(status: &RelayStatus) -> String {
    let last_card = status.last_card_id.as_deref().unwrap_or("None");
    let sound = if status.sound_enabled {
        "Enabled"
    } else {
        "Disabled"
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>RFID Relay Hub</title>
  <meta charset="utf-8">
  <style>
    body {{ font-family: sans-serif; margin: 2em; }}
    .status {{ padding: 1em; background: #e8f5e9; border-radius: 6px; }}
  </style>
</head>
<body>
  <h1>RFID Relay Hub</h1>
  <div class="status">
    <p><strong>Status:</strong> Running</p>
    <p><strong>Environment:</strong> {environment}</p>
    <p><strong>Connected clients:</strong> {clients}</p>
    <p><strong>Last card:</strong> {last_card}</p>
    <p><strong>Sound:</strong> {sound}</p>
  </div>
  <p>Readers and viewers connect with a WebSocket to this address.</p>
  <h2>Endpoints</h2>
  <ul>
    <li><code>/ping</code> health check</li>
    <li><code>/api/status</code> status as JSON</li>
    <li><code>/test-sound</code> play the buzz once</li>
  </ul>
</body>
</html>
"#,
        environment = html_escape(&status.environment),
        clients = status.clients,
        last_card = html_escape(last_card),
    )
}

/// Card ids come straight from devices; escape them before embedding.
fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn log_startup_banner(config: &RelayConfig) {
    let port = config.bind_addr.port();
    info!("RFID relay hub started");
    info!("  port:        {port}");
    info!("  environment: {}", config.environment);
    info!("  local:       http://localhost:{port}");
    if config.is_development() {
        let host = local_addr::display_host();
        info!("  network:     http://{host}:{port}");
        info!("  websocket:   ws://{host}:{port}");
    } else {
        info!("  websocket:   use this deployment's public host (ws:// or wss://)");
    }
    if config.sound_enabled() {
        info!("  sound:       enabled ({})", config.sound.file.display());
    } else {
        info!("  sound:       disabled (set ENABLE_SOUND=true outside production to enable)");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn status(last_card_id: Option<&str>) -> RelayStatus {
        RelayStatus {
            status: "running",
            clients: 2,
            last_card_id: last_card_id.map(str::to_string),
            environment: "development".to_string(),
            sound_enabled: false,
        }
    }

    #[test]
    fn test_index_page_shows_status_fields() {
        let html = render_index(&status(Some("CARD1")));
        assert!(html.contains("<strong>Connected clients:</strong> 2"));
        assert!(html.contains("<strong>Last card:</strong> CARD1"));
        assert!(html.contains("<strong>Environment:</strong> development"));
        assert!(html.contains("<strong>Sound:</strong> Disabled"));
    }

    #[test]
    fn test_index_page_without_scans_says_none() {
        let html = render_index(&status(None));
        assert!(html.contains("<strong>Last card:</strong> None"));
    }

    #[test]
    fn test_index_page_escapes_card_id() {
        let html = render_index(&status(Some("<script>")));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_peer_address_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let socket: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(peer_address(&headers, socket), "203.0.113.7");
    }

    #[test]
    fn test_peer_address_falls_back_to_socket() {
        let socket: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(peer_address(&HeaderMap::new(), socket), "127.0.0.1:5000");

        let mut blank = HeaderMap::new();
        blank.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(peer_address(&blank, socket), "127.0.0.1:5000");
    }

    #[tokio::test]
    async fn test_begin_shutdown_notifies_subscribers() {
        let state = AppState::new(RelayConfig::default());
        let mut rx = state.subscribe_shutdown();
        assert!(!*rx.borrow());

        state.begin_shutdown();

        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
