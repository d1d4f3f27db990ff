//! legalcity-server: access service for the LegalCity marketplace
//!
//! Long-running service that:
//! - Verifies actor JWTs and gates routes on RBAC permissions
//! - Gates lawyer features on subscription plan restrictions
//! - Applies Stripe subscription events to lawyer tiers and roles
//! - Periodically downgrades lapsed subscriptions

use legalcity_server::services::subscription;
use legalcity_server::{AppState, BoxError, Config, api};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legalcity_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting legalcity-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Periodic lapsed-subscription sweep
    let sweep_state = state.clone();
    let sweep_secs = config.expiry_sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(sweep_secs));
        loop {
            interval.tick().await;
            let now = shared::util::now_millis();
            if let Err(e) =
                subscription::expire_lapsed(&sweep_state.pool, &sweep_state.plans, now).await
            {
                tracing::error!(error = %e, "Expiry sweep failed");
            }
        }
    });

    let app = api::create_router(state);

    // Start HTTP server
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("legalcity-server HTTP listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
