use axum::extract::DefaultBodyLimit;
use hiring_backend::services::notification_service::NotificationService;
use hiring_backend::{
    config::{init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = init_config()?;
    init_tracing(config.log_format);

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool.clone(), config);

    if let Some(target) = &config.notification_webhook_url {
        info!(target = %target, "Starting webhook delivery worker");
        let notif = NotificationService::new(pool.clone(), config.webhook_secret.clone())?;
        if let Err(e) = notif.requeue_interrupted().await {
            tracing::warn!(error = ?e, "could not requeue interrupted webhook deliveries");
        }
        tokio::spawn(async move {
            loop {
                match notif.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Webhook worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    let app = routes::api_router(app_state, config.api_rps)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
