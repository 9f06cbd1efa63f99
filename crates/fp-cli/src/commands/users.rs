//! `fp user` and `fp session` handlers.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use fp_db::UserFilter;
use fp_schemas::{User, UserRole};
use sqlx::PgPool;
use tracing::info;

use super::opt_str;

async fn require_user(pool: &PgPool, email: &str) -> Result<User> {
    fp_db::fetch_user_by_email(pool, email)
        .await?
        .with_context(|| format!("no user with email {email}"))
}

fn print_user(u: &User) {
    println!("user_id={}", u.id);
    println!("email={}", u.email);
    println!("name={}", opt_str(&u.name));
    println!("role={}", u.role);
    println!("created_at_utc={}", u.created_at_utc.to_rfc3339());
}

pub async fn user_add(email: &str, name: Option<&str>, role: UserRole) -> Result<()> {
    let email = email.trim();
    if !email.contains('@') {
        bail!("invalid email: {email}");
    }
    let pool = fp_db::connect_from_env().await?;
    let user = fp_db::upsert_user(&pool, email, name, role).await?;
    if user.role != role {
        eprintln!("WARN: user already exists with role={}", user.role);
    }
    print_user(&user);
    Ok(())
}

pub async fn user_promote(email: &str) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let user = require_user(&pool, email).await?;
    fp_db::set_user_role(&pool, user.id, UserRole::Admin).await?;
    println!("promoted=true user_id={} email={} role=ADMIN", user.id, user.email);
    Ok(())
}

pub async fn user_list(role: Option<UserRole>, search: Option<String>, limit: u32) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let page = fp_db::list_users(
        &pool,
        &UserFilter {
            role,
            search,
            page: 1,
            limit,
        },
    )
    .await?;

    for row in &page.users {
        println!(
            "user_id={} email={} role={} orders={} has_address={}",
            row.user.id, row.user.email, row.user.role, row.order_count, row.has_address
        );
    }
    println!("total={}", page.total);
    Ok(())
}

pub async fn session_issue(email: &str, ttl_hours: i64) -> Result<()> {
    if ttl_hours <= 0 {
        bail!("--ttl-hours must be positive");
    }
    let pool = fp_db::connect_from_env().await?;
    let user = require_user(&pool, email).await?;

    let pruned = fp_db::prune_expired_sessions(&pool).await?;
    if pruned > 0 {
        info!(pruned, "expired sessions removed");
    }

    let token = fp_db::new_session_token();
    let expires_at = fp_db::insert_session(&pool, user.id, &token, Duration::hours(ttl_hours)).await?;

    println!("token={token}");
    println!("user_id={}", user.id);
    println!("role={}", user.role);
    println!("expires_at_utc={}", expires_at.to_rfc3339());
    println!("pruned_expired={pruned}");
    Ok(())
}

pub async fn session_revoke(token: Option<&str>, email: Option<&str>) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let revoked = match (token, email) {
        (Some(t), _) => u64::from(fp_db::delete_session(&pool, t.trim()).await?),
        (None, Some(e)) => {
            let user = require_user(&pool, e).await?;
            fp_db::delete_user_sessions(&pool, user.id).await?
        }
        (None, None) => bail!("provide --token or --email"),
    };
    println!("revoked={revoked}");
    Ok(())
}
