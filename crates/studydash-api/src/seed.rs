//! Startup bootstrap of the demo account.

use tracing::{debug, info, warn};

use studydash_core::defaults::{
    DEMO_DEPARTMENT, DEMO_EMAIL, DEMO_NAME, DEMO_PASSWORD, DEMO_STUDENT_ID,
};
use studydash_core::{avatar_for, NewUser, Result, UserRepository};

use crate::password::hash_password;

/// Create the demo account if it does not exist. Returns whether it was
/// created.
pub async fn ensure_demo_user(users: &dyn UserRepository, bcrypt_cost: u32) -> Result<bool> {
    if users.find_by_email(DEMO_EMAIL).await?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(DEMO_PASSWORD.to_string(), bcrypt_cost).await?;
    users
        .create(NewUser {
            email: DEMO_EMAIL.to_string(),
            password_hash,
            name: DEMO_NAME.to_string(),
            student_id: Some(DEMO_STUDENT_ID.to_string()),
            department: DEMO_DEPARTMENT.to_string(),
            avatar: avatar_for(DEMO_NAME),
        })
        .await?;
    Ok(true)
}

/// Like [`ensure_demo_user`], but never fails: problems are logged and the
/// server keeps running.
pub async fn seed_demo_user(users: &dyn UserRepository, bcrypt_cost: u32) {
    match ensure_demo_user(users, bcrypt_cost).await {
        Ok(true) => info!(
            subsystem = "api",
            component = "seed",
            email = DEMO_EMAIL,
            "Demo user ready"
        ),
        Ok(false) => debug!(
            subsystem = "api",
            component = "seed",
            "Demo user already exists"
        ),
        Err(e) => warn!(
            subsystem = "api",
            component = "seed",
            error = %e,
            "Failed to seed demo user"
        ),
    }
}
