use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use fp_schemas::User;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::user_from_row;

/// Fresh opaque bearer token: 64 hex chars from two v4 UUIDs.
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Only this digest is stored; the token itself never reaches the database.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Store a session for `token`, valid for `ttl` from now. Returns the expiry.
pub async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    ttl: Duration,
) -> Result<DateTime<Utc>> {
    let expires_at = Utc::now() + ttl;
    sqlx::query(
        r#"
        insert into sessions (token_sha256, user_id, expires_at_utc)
        values ($1, $2, $3)
        "#,
    )
    .bind(hash_session_token(token))
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await
    .context("insert_session failed")?;

    Ok(expires_at)
}

/// The user behind an unexpired session, if any.
pub async fn resolve_session(pool: &PgPool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        select u.user_id, u.email, u.name, u.phone, u.role, u.created_at_utc
        from sessions s
        join users u on u.user_id = s.user_id
        where s.token_sha256 = $1
          and s.expires_at_utc > now()
        "#,
    )
    .bind(hash_session_token(token))
    .fetch_optional(pool)
    .await
    .context("resolve_session failed")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Returns false when the token was unknown.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool> {
    let res = sqlx::query("delete from sessions where token_sha256 = $1")
        .bind(hash_session_token(token))
        .execute(pool)
        .await
        .context("delete_session failed")?;
    Ok(res.rows_affected() == 1)
}

/// Drop every session of a user. Returns how many were removed.
pub async fn delete_user_sessions(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let res = sqlx::query("delete from sessions where user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("delete_user_sessions failed")?;
    Ok(res.rows_affected())
}

/// Delete every expired session. Returns how many were removed.
pub async fn prune_expired_sessions(pool: &PgPool) -> Result<u64> {
    let res = sqlx::query("delete from sessions where expires_at_utc <= now()")
        .execute(pool)
        .await
        .context("prune_expired_sessions failed")?;
    Ok(res.rows_affected())
}
