//! Application state for the access service

use shared::error::AppError;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::BoxError;
use crate::config::Config;
use crate::db::DbService;
use crate::plans::PlanCatalog;
use crate::stripe::PriceTierMap;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Tier → plan restriction templates (immutable after startup)
    pub plans: Arc<PlanCatalog>,
    /// Stripe Price ID → tier
    pub prices: Arc<PriceTierMap>,
    /// JWT secret for actor authentication
    pub jwt_secret: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
}

impl AppState {
    /// Create a new AppState: open the database, run migrations, load plans
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url, config.database_max_connections).await?;
        let plans = PlanCatalog::load(config.plan_templates_path.as_deref()).map_err(AppError::from)?;
        let prices = PriceTierMap::new(
            config.stripe_professional_price_id.as_deref(),
            config.stripe_premium_price_id.as_deref(),
        );

        Ok(Self::with_parts(
            db.pool,
            plans,
            prices,
            config.jwt_secret.clone(),
            config.stripe_webhook_secret.clone(),
        ))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        pool: SqlitePool,
        plans: PlanCatalog,
        prices: PriceTierMap,
        jwt_secret: String,
        stripe_webhook_secret: String,
    ) -> Self {
        Self {
            pool,
            plans: Arc::new(plans),
            prices: Arc::new(prices),
            jwt_secret,
            stripe_webhook_secret,
        }
    }
}
