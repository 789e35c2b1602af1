//! bcrypt hashing, run on the blocking pool.

use studydash_core::{Error, Result};

pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("abcdef".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("abcdef".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("abcdeg".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_error() {
        let result = verify_password("abcdef".to_string(), "plaintext".to_string()).await;
        assert!(result.is_err());
    }
}
