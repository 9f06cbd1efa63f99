use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use fp_db::{OrderFilter, UserFilter};
use fp_orders::StatusUpdateRequest;
use fp_report::{day_window, local_today};
use fp_schemas::Order;
use uuid::Uuid;

use super::orders::{load_order, order_detail, run_update};
use crate::{
    api_types::{
        page_or_default, AdminOrdersQuery, AdminOrdersResponse, AdminUsersQuery,
        AdminUsersResponse, OrderDetail, Pagination,
    },
    auth::AdminUser,
    error::ApiError,
    state::AppState,
};

// ---------------------------------------------------------------------------
// GET /v1/admin/orders
// ---------------------------------------------------------------------------

pub(crate) async fn list_orders(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<AdminOrdersQuery>,
) -> Result<Json<AdminOrdersResponse>, ApiError> {
    let pool = st.db()?;
    let (page, limit) = page_or_default(q.page, q.limit);
    let tz = st.config.timezone;

    let created_from = q
        .date_from
        .map(|d| day_window(d, tz).map(|(from, _)| from))
        .transpose()?;
    let created_to = q
        .date_to
        .map(|d| day_window(d, tz).map(|(_, to)| to))
        .transpose()?;

    let listed = fp_db::list_orders(
        pool,
        &OrderFilter {
            user_id: None,
            status: q.status,
            payment_status: q.payment_status,
            role: q.user_role,
            created_from,
            created_to,
            search: q.search,
            page,
            limit,
        },
    )
    .await?;

    Ok(Json(AdminOrdersResponse {
        pagination: Pagination::new(listed.page, listed.limit, listed.total),
        orders: listed.orders,
    }))
}

// ---------------------------------------------------------------------------
// GET|PATCH /v1/admin/orders/:id
// ---------------------------------------------------------------------------

pub(crate) async fn get_order(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    let pool = st.db()?;
    let order = load_order(pool, order_id).await?;
    Ok(Json(order_detail(pool, order).await?))
}

/// Any status may be set; see `plan_admin_update`.
pub(crate) async fn update_order(
    State(st): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(run_update(&st, &admin, order_id, req, true).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/admin/orders/:id/items/:item_id/file
// ---------------------------------------------------------------------------

/// Stream an uploaded document back for printing.
pub(crate) async fn download_item_file(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let pool = st.db()?;
    let item = fp_db::fetch_order_items(pool, order_id)
        .await?
        .into_iter()
        .find(|i| i.id == item_id)
        .ok_or(ApiError::NotFound("Item not found"))?;

    // file_url is `/uploads/<order_id>/<stored name>`.
    let rel = item
        .file_url
        .strip_prefix("/uploads/")
        .filter(|r| !r.split('/').any(|seg| seg == ".." || seg.is_empty()))
        .ok_or(ApiError::NotFound("File not stored"))?;
    let path = st.config.uploads_dir.join(rel);
    if !path.is_file() {
        return Err(ApiError::NotFound("File not stored"));
    }

    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("read upload failed: {}", path.display()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", item.file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// GET /v1/admin/analytics
// ---------------------------------------------------------------------------

pub(crate) async fn analytics(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<fp_db::AdminAnalytics>, ApiError> {
    let pool = st.db()?;
    let tz = st.config.timezone;
    let today = local_today(tz, Utc::now());
    Ok(Json(fp_db::admin_analytics(pool, tz.name(), today).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/admin/users
// ---------------------------------------------------------------------------

pub(crate) async fn list_users(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<AdminUsersQuery>,
) -> Result<Json<AdminUsersResponse>, ApiError> {
    let pool = st.db()?;
    let (page, limit) = page_or_default(q.page, q.limit);

    let listed = fp_db::list_users(
        pool,
        &UserFilter {
            role: q.role,
            search: q.search,
            page,
            limit,
        },
    )
    .await?;

    Ok(Json(AdminUsersResponse {
        pagination: Pagination::new(page, limit, listed.total),
        users: listed.users,
    }))
}
