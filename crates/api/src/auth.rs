//! Bearer-token identification. Tokens are issued elsewhere; this side only
//! verifies the HS256 signature and reads the subject and role.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// Any authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// An authenticated user holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
        .map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ApiError::Unauthorized
        })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized)?;

        let claims = verify_token(bearer.token(), &state.config().jwt_secret)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden("administrator role required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    pub fn token(sub: Uuid, role: Role, secret: &str) -> String {
        let claims = Claims {
            sub,
            role,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("token encodes")
    }
}
