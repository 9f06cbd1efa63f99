use anyhow::{Context, Result};
use fp_schemas::{User, UserRole};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::like_pattern;

const USER_COLUMNS: &str = "user_id, email, name, phone, role, created_at_utc";

pub(crate) fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        role: UserRole::parse(&row.try_get::<String, _>("role")?)?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

/// Insert a user by email, or return the existing row unchanged.
///
/// `role` only applies to a newly created user.
pub async fn upsert_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    role: UserRole,
) -> Result<User> {
    let email = email.trim().to_ascii_lowercase();
    let row = sqlx::query(&format!(
        r#"
        insert into users (user_id, email, name, role)
        values ($1, $2, $3, $4)
        on conflict (email) do update set email = excluded.email
        returning {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .context("upsert_user failed")?;

    user_from_row(&row)
}

pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "select {USER_COLUMNS} from users where user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("fetch_user failed")?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn fetch_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "select {USER_COLUMNS} from users where email = $1"
    ))
    .bind(email.trim().to_ascii_lowercase())
    .fetch_optional(pool)
    .await
    .context("fetch_user_by_email failed")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Returns false when no such user exists.
pub async fn set_user_role(pool: &PgPool, user_id: Uuid, role: UserRole) -> Result<bool> {
    let res = sqlx::query("update users set role = $2 where user_id = $1")
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await
        .context("set_user_role failed")?;
    Ok(res.rows_affected() == 1)
}

/// Profile setup: name, phone and customer role in one write.
pub async fn update_user_profile(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    phone: &str,
    role: UserRole,
) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        r#"
        update users
        set name = $2, phone = $3, role = $4
        where user_id = $1
        returning {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(phone)
    .bind(role.as_str())
    .fetch_optional(pool)
    .await
    .context("update_user_profile failed")?;

    row.as_ref().map(user_from_row).transpose()
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Matches name, email or phone.
    pub search: Option<String>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListRow {
    #[serde(flatten)]
    pub user: User,
    pub order_count: i64,
    pub has_address: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<UserListRow>,
    pub total: i64,
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, f: &UserFilter) {
    qb.push(" where true");
    if let Some(role) = f.role {
        qb.push(" and u.role = ").push_bind(role.as_str());
    }
    if let Some(term) = f.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pat = like_pattern(term);
        qb.push(" and (u.name ilike ")
            .push_bind(pat.clone())
            .push(" or u.email ilike ")
            .push_bind(pat.clone())
            .push(" or u.phone ilike ")
            .push_bind(pat)
            .push(")");
    }
}

/// Newest users first, with their order counts.
pub async fn list_users(pool: &PgPool, f: &UserFilter) -> Result<UserPage> {
    let limit = f.limit.clamp(1, 100);
    let page = f.page.max(1);

    let mut count_q = QueryBuilder::<Postgres>::new("select count(*)::bigint as n from users u");
    push_user_filters(&mut count_q, f);
    let total: i64 = count_q
        .build()
        .fetch_one(pool)
        .await
        .context("list_users count failed")?
        .try_get("n")?;

    let mut q = QueryBuilder::<Postgres>::new(
        r#"
        select
          u.user_id, u.email, u.name, u.phone, u.role, u.created_at_utc,
          (select count(*) from orders o where o.user_id = u.user_id)::bigint as order_count,
          exists (select 1 from addresses a where a.user_id = u.user_id) as has_address
        from users u
        "#,
    );
    push_user_filters(&mut q, f);
    q.push(" order by u.created_at_utc desc, u.user_id limit ")
        .push_bind(i64::from(limit))
        .push(" offset ")
        .push_bind(i64::from(page - 1) * i64::from(limit));

    let rows = q
        .build()
        .fetch_all(pool)
        .await
        .context("list_users failed")?;

    let mut users = Vec::with_capacity(rows.len());
    for row in &rows {
        users.push(UserListRow {
            user: user_from_row(row)?,
            order_count: row.try_get("order_count")?,
            has_address: row.try_get("has_address")?,
        });
    }

    Ok(UserPage { users, total })
}
