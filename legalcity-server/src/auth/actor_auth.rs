//! Actor JWT authentication
//!
//! Tokens are issued by the marketplace auth service with the shared HS256
//! secret. This service only verifies them.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{ActorRef, ActorType};

use crate::security_log;
use crate::state::AppState;

/// JWT claims for actor authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor ID
    pub sub: String,
    /// Actor type (user | lawyer | admin)
    pub actor_type: ActorType,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated actor identity extracted from JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorIdentity {
    pub actor_id: i64,
    pub actor_type: ActorType,
}

impl ActorIdentity {
    pub fn actor(&self) -> ActorRef {
        ActorRef::new(self.actor_id, self.actor_type)
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for an actor
pub fn create_token(actor: ActorRef, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    create_token_with_ttl(actor, secret, chrono::Duration::hours(JWT_EXPIRY_HOURS))
}

/// Create a JWT token with an explicit lifetime
pub fn create_token_with_ttl(
    actor: ActorRef,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = ActorClaims {
        sub: actor.id.to_string(),
        actor_type: actor.actor_type,
        exp: (now + ttl).timestamp().max(0) as usize,
        iat: now.timestamp().max(0) as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a token
pub fn verify_token(token: &str, secret: &str) -> Result<ActorIdentity, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let data = jsonwebtoken::decode::<ActorClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::token_expired(),
        _ => AppError::invalid_token("Invalid token"),
    })?;

    let actor_id = data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid token subject"))?;

    Ok(ActorIdentity {
        actor_id,
        actor_type: data.claims.actor_type,
    })
}

/// Middleware that verifies the bearer JWT and injects [`ActorIdentity`]
pub async fn actor_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        security_log!("WARN", "auth_missing", uri = request.uri().to_string());
        return Err(AppError::not_authenticated());
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))?;

    let identity = verify_token(token, &state.jwt_secret).inspect_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.message.clone(),
            uri = request.uri().to_string()
        );
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
