//! JWT authentication module.
//!
//! Token issuing and validation, password hashing, and the [`AuthUser`]
//! extractor that guards every non-public route.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! AuthUser::from_request_parts
//!   ├── header missing / not Bearer   → 401 UNAUTHORIZED
//!   ├── signature or expiry invalid   → 401 UNAUTHORIZED
//!   ├── user deleted or deactivated   → 401 UNAUTHORIZED
//!   ▼
//! handler(user: AuthUser, …)
//!   └── user.require_role(&[Admin])   → 403 FORBIDDEN
//! ```

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use till_core::{User, UserRole};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues an access token for `user`. Returns the token and its expiry.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), ApiError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {e}")))?;

        Ok((token, expires_at))
    }

    /// Validates signature and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected token");
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| ApiError::internal(format!("Failed to build salt: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    /// 403 unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            debug!(user_id = %self.id, role = %self.role, "Role check failed");
            Err(ApiError::forbidden())
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

        let claims = state.jwt.validate(token)?;

        // Deactivation takes effect immediately, not at token expiry.
        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::unauthorized("Invalid or inactive user"))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: "u-1".to_string(),
            name: "Ama".to_string(),
            email: "ama@till.test".to_string(),
            password_hash: String::new(),
            role,
            avatar: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 1);
        let (token, expires_at) = manager.issue(&user(UserRole::Manager)).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, UserRole::Manager);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = JwtManager::new("secret-a", 1).issue(&user(UserRole::Admin)).unwrap();
        assert!(JwtManager::new("secret-b", 1).validate(&token).is_err());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_require_role() {
        let cashier = AuthUser {
            id: "u-2".to_string(),
            email: "c@till.test".to_string(),
            role: UserRole::Cashier,
        };
        assert!(cashier.require_role(&[UserRole::Cashier]).is_ok());
        assert!(cashier
            .require_role(&[UserRole::Admin, UserRole::Manager])
            .is_err());
    }
}
