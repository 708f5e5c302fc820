/// HTTP server setup using `axum`.
///
/// Provides `AppContext` (shared state) and `AppServer` (startup logic).
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::palette::Palette;
use crate::store::fs::FileStore;
use crate::web::handlers;

/// Shared application context available to all handlers.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<FileStore>,
    pub config: Arc<Config>,
    pub palette: Arc<Palette>,
}

impl AppContext {
    pub fn new(config: Config, store: FileStore) -> Self {
        let palette = Palette::from_config(&config.palette);
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            palette: Arc::new(palette),
        }
    }
}

/// Build the application router.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/save", post(handlers::save))
        .route("/api/documents", get(handlers::list_documents))
        .route("/api/document", get(handlers::get_document))
        .route("/api/palette", get(handlers::get_palette))
        .with_state(ctx)
}

/// HTTP server wrapping the context.
#[derive(Clone)]
pub struct AppServer {
    pub ctx: AppContext,
}

impl AppServer {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let bind = self.ctx.config.bind.clone();
        let listener = TcpListener::bind(&bind)
            .await
            .with_context(|| format!("failed to bind {bind}"))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("{} listening on http://{addr}", self.ctx.config.title);

        axum::serve(listener, router(self.ctx))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server encountered an error")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
