use std::sync::Arc;

use counterbot::{
    app::App,
    config::AppConfig,
    discord::{DiscordClient, GatewayClient, GatewayEvent},
    logger::init_tracing,
};
use tokio::sync::mpsc;

const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Starts the gateway session loop and returns the event receiver.
fn start_gateway(cfg: &AppConfig) -> mpsc::Receiver<GatewayEvent> {
    let (tx, rx) = mpsc::channel::<GatewayEvent>(EVENT_QUEUE_CAPACITY);

    let gateway = GatewayClient::new(cfg.gateway_url.clone(), cfg.token.clone(), cfg.server.clone());

    tokio::spawn(async move {
        if let Err(e) = gateway.run(tx).await {
            tracing::error!(error = %e, "gateway stopped");
        }
    });

    rx
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting counterbot...");

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        "Cooldown set to {} seconds",
        cfg.scheduler.cooldown.as_secs_f64()
    );

    let renamer = Arc::new(DiscordClient::new(
        cfg.api_base.clone(),
        &cfg.token,
        cfg.rename_timeout,
    )?);

    let app = App::new(&cfg, renamer);
    let events = start_gateway(&cfg);

    app.run(events, shutdown_signal()).await?;

    Ok(())
}
