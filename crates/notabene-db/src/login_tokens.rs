//! Magic-link login token repository implementation.
//!
//! Secrets are generated server-side, handed to the mailer exactly once,
//! and stored only as SHA-256 hashes. Tokens are single-use and expire
//! after fifteen minutes.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use notabene_core::{new_v7, Error, LoginTokenRepository, Result};

/// Lifetime of an unconsumed login token.
const TOKEN_TTL_MINUTES: i64 = 15;

/// Length of the random secret portion.
const SECRET_LENGTH: usize = 48;

/// PostgreSQL implementation of LoginTokenRepository.
pub struct PgLoginTokenRepository {
    pool: Pool<Postgres>,
}

impl PgLoginTokenRepository {
    /// Create a new PgLoginTokenRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Generate a cryptographically secure random string.
    fn generate_secret(length: usize) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Hash a secret using SHA256.
    fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl LoginTokenRepository for PgLoginTokenRepository {
    async fn issue(&self, user_id: Uuid) -> Result<String> {
        let secret = format!("nbl_{}", Self::generate_secret(SECRET_LENGTH));
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO login_token (id, user_id, token_hash, expires_at_utc)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(Self::hash_secret(&secret))
        .bind(now + Duration::minutes(TOKEN_TTL_MINUTES))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(secret)
    }

    async fn consume(&self, secret: &str) -> Result<Uuid> {
        let now = Utc::now();
        let row = sqlx::query(
            "UPDATE login_token
             SET consumed_at_utc = $1
             WHERE token_hash = $2
               AND consumed_at_utc IS NULL
               AND expires_at_utc > $1
             RETURNING user_id",
        )
        .bind(now)
        .bind(Self::hash_secret(secret))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::Unauthorized("invalid or expired login token".to_string()))?;

        Ok(row.get("user_id"))
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM login_token WHERE expires_at_utc <= $1 OR consumed_at_utc IS NOT NULL",
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_length_and_charset() {
        let secret = PgLoginTokenRepository::generate_secret(48);
        assert_eq!(secret.len(), 48);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_hash_secret_is_hex_sha256() {
        let hash = PgLoginTokenRepository::hash_secret("nbl_test");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic
        assert_eq!(hash, PgLoginTokenRepository::hash_secret("nbl_test"));
    }
}
