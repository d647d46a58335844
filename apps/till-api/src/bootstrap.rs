//! First-start setup.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::ApiConfig;
use crate::error::ApiError;
use till_core::{User, UserRole};
use till_db::Database;

/// Creates the configured admin account unless a user with that email
/// already exists. Returns `true` when an account was created.
pub async fn ensure_admin(db: &Database, config: &ApiConfig) -> Result<bool, ApiError> {
    let email = config.admin_email.trim().to_lowercase();

    if db.users().get_by_email(&email).await?.is_some() {
        return Ok(false);
    }

    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4().to_string(),
        name: config.admin_name.clone(),
        email,
        password_hash: hash_password(&config.admin_password)?,
        role: UserRole::Admin,
        avatar: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.users().insert(&admin).await?;

    info!(email = %admin.email, "Created bootstrap admin account");
    Ok(true)
}
