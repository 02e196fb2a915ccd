use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use crate::browser::{BrowserBridge, RemoteTabs};
use crate::config::HostConfig;
use crate::engine::TidyEngine;
use crate::error::{CoreError, CoreResult};
use crate::scheduler::AutoTidy;
use crate::settings::SettingsStore;
use crate::storage::FileStorage;

pub mod browser;
pub mod control;
pub mod error;
pub mod settings;

/// Host process: serves the extension socket and the control API, and
/// feeds pushed tab events into the auto-tidy scheduler.
pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    state: Arc<ServerState>,
}

impl Server {
    pub async fn new(config: HostConfig) -> CoreResult<Self> {
        let (bridge, events) = BrowserBridge::new(config.bridge_timeout);
        let bridge = Arc::new(bridge);
        let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
        let engine = Arc::new(TidyEngine::new(
            Arc::new(RemoteTabs::new(bridge.clone())),
            SettingsStore::new(storage),
            Duration::ZERO,
        ));
        let auto_tidy = Arc::new(AutoTidy::new(engine.clone(), config.debounce));
        tokio::spawn(auto_tidy.clone().run(events));

        let state = Arc::new(ServerState {
            engine,
            browser: bridge,
            auto_tidy,
        });

        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|error| CoreError::Internal(format!("bind {}: {error}", config.addr)))?;
        let addr = listener
            .local_addr()
            .map_err(|error| CoreError::Internal(error.to_string()))?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = router(state.clone());
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(error) = served {
                tracing::error!("host server stopped: {error}");
            }
        });
        tracing::info!("tablio host listening on http://{addr}");

        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
            state,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn engine(&self) -> &Arc<TidyEngine> {
        &self.state.engine
    }

    pub fn shutdown(&mut self) -> CoreResult<()> {
        self.state.auto_tidy.cancel();
        if let Some(sender) = self.shutdown.take() {
            sender
                .send(())
                .map_err(|_| CoreError::Internal("failed to send server shutdown signal".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

pub(crate) fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/health", get(health))
        .route("/browser/status", get(browser::status))
        .route("/browser/ws", get(browser::ws_handler))
        .route("/tidy", post(control::tidy_now))
        .route("/ephemeral/clear", post(control::clear_ephemeral))
        .route(
            "/ephemeral/grace",
            get(control::get_grace).put(control::set_grace),
        )
        .route(
            "/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/settings/groups", post(settings::upsert_group))
        .route("/settings/groups/move", post(settings::move_group))
        .route("/settings/groups/:name", delete(settings::remove_group))
        .route("/settings/pairings/assign", post(settings::assign_group))
        .route("/settings/reset", post(settings::reset_settings))
        .with_state(state)
        .layer(cors)
}

async fn health() -> &'static str {
    "ok"
}

pub(crate) struct ServerState {
    pub(crate) engine: Arc<TidyEngine>,
    pub(crate) browser: Arc<BrowserBridge>,
    pub(crate) auto_tidy: Arc<AutoTidy>,
}
