//! Access service configuration

use std::path::PathBuf;

use crate::BoxError;

/// Access service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// Pool size
    pub database_max_connections: u32,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret shared with the marketplace auth service
    pub jwt_secret: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe Price ID mapped to the professional tier
    pub stripe_professional_price_id: Option<String>,
    /// Stripe Price ID mapped to the premium tier
    pub stripe_premium_price_id: Option<String>,
    /// Optional JSON file overriding the built-in plan templates
    pub plan_templates_path: Option<PathBuf>,
    /// Seconds between lapsed-subscription sweeps
    pub expiry_sweep_interval_secs: u64,
}

impl Config {
    /// Require a secret: must be set and non-empty in non-development environments.
    fn require_secret(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match lookup(name) {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let non_empty = |name: &str| lookup(name).filter(|s| !s.is_empty());

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:legalcity.db".into()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
            http_port: lookup("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret(&lookup, "JWT_SECRET", &environment)?,
            stripe_webhook_secret: Self::require_secret(
                &lookup,
                "STRIPE_WEBHOOK_SECRET",
                &environment,
            )?,
            stripe_professional_price_id: non_empty("STRIPE_PROFESSIONAL_PRICE_ID"),
            stripe_premium_price_id: non_empty("STRIPE_PREMIUM_PRICE_ID"),
            plan_templates_path: non_empty("PLAN_TEMPLATES_PATH").map(PathBuf::from),
            expiry_sweep_interval_secs: lookup("EXPIRY_SWEEP_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(300),
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.database_url, "sqlite:legalcity.db");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.expiry_sweep_interval_secs, 300);
        assert_eq!(config.jwt_secret, "dev-JWT_SECRET-not-for-production");
        assert!(config.plan_templates_path.is_none());
        assert!(config.stripe_premium_price_id.is_none());
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = Config::from_lookup(lookup_from(&[("ENVIRONMENT", "production")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = Config::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "s3cret"),
            ("STRIPE_WEBHOOK_SECRET", ""),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("STRIPE_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "staging"),
            ("JWT_SECRET", "jwt"),
            ("STRIPE_WEBHOOK_SECRET", "whsec"),
            ("HTTP_PORT", "9000"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("STRIPE_PREMIUM_PRICE_ID", "price_premium"),
            ("PLAN_TEMPLATES_PATH", "/etc/legalcity/plans.json"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.stripe_premium_price_id.as_deref(), Some("price_premium"));
        assert_eq!(
            config.plan_templates_path,
            Some(PathBuf::from("/etc/legalcity/plans.json"))
        );
    }
}
