use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ballot_bot::config::Config;
use ballot_bot::gateway::Gateway;
use ballot_bot::github::OctocrabClient;
use ballot_bot::server::{AppState, build_router};
use ballot_bot::worker::Poller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = Config::resolve_path(std::env::args().nth(1));
    let config = Arc::new(
        Config::load(&config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?,
    );
    tracing::info!(?config, "configuration loaded");

    let client = OctocrabClient::from_token(config.token.clone(), config.repo_id())
        .context("building GitHub client")?;
    let gateway = Arc::new(Gateway::new(client));

    gateway
        .ensure_labels_exist(&config.labels)
        .await
        .context("checking workflow labels")?;
    let bot = gateway
        .authenticated_user()
        .await
        .context("fetching the bot's GitHub account")?;
    tracing::info!(login = %bot.login, id = %bot.id, "authenticated");

    let shutdown = CancellationToken::new();

    let poller = Poller::new(Arc::clone(&gateway), Arc::clone(&config), bot);
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    let address = config.socket_addr()?;
    let app = build_router(AppState::new(gateway, Arc::clone(&config)));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {}", address))?;
    tracing::info!("listening on {}", address);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
            server_shutdown.cancel();
        })
        .await
        .context("serving HTTP")?;

    shutdown.cancel();
    poller_task.await.context("joining poller task")?;
    Ok(())
}
