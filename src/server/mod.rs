//! HTTP server for the ballot bot.
//!
//! # Endpoints
//!
//! - `POST /webhook` - GitHub webhook deliveries, handled synchronously
//! - `GET /health` - Returns 200 if the server is running

use std::error::Error as StdError;
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::effects::GitHubInterpreter;
use crate::gateway::Gateway;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Shared application state, passed to handlers via Axum's `State` extractor.
pub struct AppState<I> {
    inner: Arc<AppStateInner<I>>,
}

struct AppStateInner<I> {
    gateway: Arc<Gateway<I>>,
    config: Arc<Config>,
}

// Manual impl: cloning only bumps the `Arc`, so `I` need not be `Clone`.
impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> AppState<I> {
    pub fn new(gateway: Arc<Gateway<I>>, config: Arc<Config>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { gateway, config }),
        }
    }

    pub fn gateway(&self) -> &Gateway<I> {
        &self.inner.gateway
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns the webhook secret as bytes.
    pub fn webhook_secret(&self) -> &[u8] {
        self.inner.config.webhook_secret.as_bytes()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<I>(app_state: AppState<I>) -> axum::Router
where
    I: GitHubInterpreter + Send + Sync + 'static,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<I>))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
