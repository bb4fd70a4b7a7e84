/*!
 * # Authentication
 *
 * HS256 bearer tokens whose `sub` claim is the user id. Two extractors:
 *
 * - [`AuthUser`] for any signed-in user
 * - [`AuthSupplier`] for a user that owns a supplier profile
 */

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{entities::supplier::Model as SupplierModel, errors::ServiceError, AppState};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub iat: i64,
    pub exp: i64,
}

/// Signs a token for `user_id` valid for `ttl`.
pub fn create_token(secret: &str, user_id: Uuid, ttl: Duration) -> Result<String, ServiceError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ServiceError::Unauthorized("Token has expired".to_string())
        }
        _ => ServiceError::Unauthorized("Invalid token".to_string()),
    })
}

fn bearer_token(parts: &Parts) -> Result<&str, ServiceError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_token(&state.config.jwt_secret, token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(Self { user_id })
    }
}

/// A signed-in user together with the supplier profile they own.
#[derive(Debug, Clone)]
pub struct AuthSupplier {
    pub user_id: Uuid,
    pub supplier: SupplierModel,
}

impl AuthSupplier {
    pub fn supplier_id(&self) -> Uuid {
        self.supplier.id
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSupplier {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user_id } = AuthUser::from_request_parts(parts, state).await?;
        let supplier = state
            .services
            .suppliers
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %user_id, "User has no supplier profile");
                ServiceError::Forbidden("A supplier account is required".to_string())
            })?;
        Ok(Self { user_id, supplier })
    }
}
