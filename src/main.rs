use pmp_session_api::{
    app::{self, AppState},
    config,
    credentials::FileCredentialStore,
    session::SessionRegistry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pmp_session_api=debug,audit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::load_config_with_fallback().map_err(anyhow::Error::msg)?;

    let credentials = FileCredentialStore::new(config.credentials.path.clone());
    if !credentials.path().exists() {
        tracing::warn!(
            "Credentials file {} does not exist yet; sign-ins will fail until it does",
            credentials.path().display()
        );
    }

    let registry = Arc::new(
        SessionRegistry::new(config.session.to_session_config(), Arc::new(credentials))
            .with_admin_key(config.admin.key.clone()),
    );
    let sweeper = registry.spawn_sweeper();

    let app = app::router(AppState::new(registry), &config.server);

    let addr = config.socket_addr().map_err(anyhow::Error::msg)?;
    tracing::info!("🚀 Starting PMP Session API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
