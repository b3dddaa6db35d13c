use crate::config::ApiConfig;
use crate::routes::{query, ws, ApiContext};
use axum::{routing::get, Router};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP read API and websocket push channel
pub struct ApiServer {
    config: ApiConfig,
    ctx: ApiContext,
}

impl ApiServer {
    pub fn new(config: ApiConfig, ctx: ApiContext) -> Self {
        Self { config, ctx }
    }

    /// Build the router without binding
    pub fn router(&self) -> Router {
        let cors = if self.config.cors_enabled {
            let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
            match self.config.allowed_origins() {
                Some(origins) => layer.allow_origin(origins),
                None => layer.allow_origin(Any),
            }
        } else {
            CorsLayer::new()
        };

        Router::new()
            .route("/health", get(query::health))
            .route("/api/stats", get(query::stats))
            .route("/api/status", get(query::status))
            .route("/api/tokens", get(query::list_tokens))
            .route("/api/tokens/{address}", get(query::get_token))
            .route("/api/tokens/{address}/trades", get(query::token_trades))
            .route("/api/tokens/{address}/comments", get(query::token_comments))
            .route("/api/tokens/{address}/quote", get(query::token_quote))
            .route("/api/trades", get(query::list_trades))
            .route("/ws", get(ws::ws_handler))
            .with_state(self.ctx.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown signal fires
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> crate::Result<()> {
        let addr = self.config.address();
        let app = self.router();

        info!(address = %addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::ApiError::Server(e.to_string()))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
            .map_err(|e| crate::ApiError::Server(e.to_string()))?;

        info!("API server stopped");
        Ok(())
    }
}
