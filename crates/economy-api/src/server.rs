use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use economy_billing::WebhookProcessor;
use economy_engine::{HuntEngine, Ledger, Marketplace, TradeEngine, UpgradeEngine};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;
use crate::handlers;

/// Shared handler state: the domain engines behind the HTTP surface.
pub struct AppContext {
    pub ledger: Ledger,
    pub hunt: HuntEngine,
    pub upgrade: UpgradeEngine,
    pub marketplace: Arc<Marketplace>,
    pub trades: TradeEngine,
    pub billing: WebhookProcessor,
}

/// HTTP API server
pub struct ApiServer {
    config: ApiConfig,
    ctx: Arc<AppContext>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, ctx: Arc<AppContext>) -> Self {
        Self { config, ctx }
    }

    pub fn router(ctx: Arc<AppContext>) -> Router {
        Router::new()
            .route("/hunt/start", post(handlers::hunt_start))
            .route("/hunt/collect", post(handlers::hunt_collect))
            .route("/hunt/status", get(handlers::hunt_status))
            .route("/sell", post(handlers::sell))
            .route("/balance", get(handlers::balance))
            .route("/upgrade", post(handlers::upgrade))
            .route("/tickets/{id}/list", post(handlers::ticket_list))
            .route("/tickets/{id}/redeem", post(handlers::ticket_redeem))
            .route("/tickets/{id}/transfer", post(handlers::ticket_transfer))
            .route("/trades", post(handlers::trade_create))
            .route(
                "/trades/{id}/confirm-seller",
                post(handlers::trade_confirm_seller),
            )
            .route(
                "/trades/{id}/confirm-buyer",
                post(handlers::trade_confirm_buyer),
            )
            .route("/trades/{id}/settle", post(handlers::trade_settle))
            .route("/trades/{id}/cancel", post(handlers::trade_cancel))
            .route("/billing/webhook/{provider}", post(handlers::webhook))
            .route("/health", get(health_check))
            .with_state(ctx)
    }

    /// Start the server
    pub async fn run(self) -> crate::Result<()> {
        let addr = self.config.address();

        let cors = if self.config.cors_enabled {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        };

        let app = Self::router(self.ctx)
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        info!(address = %addr, "Starting economy API server");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::ApiError::Server(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| crate::ApiError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
