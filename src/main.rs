use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod extract;
mod response;
mod routes;
mod state;
mod validation;

mod models {
    pub mod message;
    pub mod user;
}

mod repositories {
    pub mod message;
    pub mod user;
}

mod services {
    pub mod auth;
    pub mod messages;
    pub mod token;
    pub mod uploads;
    pub mod users;
}

mod handlers {
    pub mod auth;
    pub mod health;
    pub mod messages;
    pub mod users;
}

mod middleware_layer {
    pub mod auth;
}

mod realtime {
    pub mod presence;
    pub mod socket;
}

use config::Config;
use state::AppState;

/// Resolves on SIGINT or SIGTERM so the server can drain and exit cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    error::set_production(config.production);
    tracing::info!("Configuration loaded");

    let state = AppState::new(&config)?;
    db::init_schema(&state.db).await?;

    let app = routes::app(state);

    let addr = format!("{}:{}", config.hostname, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server started: {}", addr);
    tracing::info!(
        "Environment: {}",
        if config.production { "production" } else { "development" }
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
