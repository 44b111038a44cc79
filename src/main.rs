use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clownbot::{
    config::BotConfig,
    dispatch::DispatchOptions,
    polling,
    state::AppState,
    store::Store,
    transport::{TelegramClient, Transport},
    webhook,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clownbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting clownbot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::open(Store::new(config.data_dir.clone())).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to load state: {}", e);
            std::process::exit(1);
        }
    };

    let client = match TelegramClient::new(config.api_url.clone(), config.token.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create Telegram client: {}", e);
            std::process::exit(1);
        }
    };

    let bot_username = match client.get_me().await {
        Ok(me) => {
            tracing::info!(username = ?me.username, "Authorized as bot");
            me.username
        }
        Err(e) => {
            tracing::warn!(
                "getMe failed: {}. Commands addressed to other bots will not be filtered.",
                e
            );
            None
        }
    };

    let options = DispatchOptions {
        bot_username,
        announce_delay: config.announce_delay,
    };

    match config.webhook.clone() {
        Some(webhook_config) => {
            if let Err(e) = client
                .set_webhook(&webhook_config.url, webhook_config.secret.as_deref())
                .await
            {
                tracing::error!("Failed to register webhook: {}", e);
                std::process::exit(1);
            }

            let transport: Arc<dyn Transport> = client.clone();
            let app = webhook::router(
                webhook::WebhookState {
                    app: state.clone(),
                    transport,
                    options,
                },
                webhook_config.secret.clone(),
            );

            tracing::info!("Listening for webhook calls on http://{}", webhook_config.listen);
            let listener = match tokio::net::TcpListener::bind(webhook_config.listen).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind {}: {}", webhook_config.listen, e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                tracing::error!("Webhook server failed: {}", e);
            }
        }
        None => {
            // getUpdates is refused while a webhook is registered
            if let Err(e) = client.delete_webhook().await {
                tracing::warn!("Failed to delete webhook: {}", e);
            }

            // The poller finishes the command in hand before it stops
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let stop = async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            };
            tokio::join!(
                polling::run_polling(
                    state.clone(),
                    client.clone(),
                    options,
                    config.poll_timeout,
                    shutdown_rx,
                ),
                stop,
            );
        }
    }

    match state.flush().await {
        Ok(()) => tracing::info!("State saved, shutting down"),
        Err(e) => tracing::error!("Failed to save state on shutdown: {}", e),
    }
}

/// Resolve on Ctrl-C or SIGTERM
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
