use std::{collections::BTreeMap, path::Path as FsPath, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use fp_db::{DuplicateOrderNumber, NewOrder, NewOrderItem, OrderFilter, OrderWithItems};
use fp_orders::{
    format_amount, generate_order_number, plan_admin_update, plan_owner_update, quote_order,
    upi_payment_link, ItemDraft, PrintOptions, StatusUpdateRequest,
};
use fp_report::local_today;
use fp_schemas::{Order, User};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    api_types::{
        page_or_default, MyOrdersQuery, MyOrdersResponse, OrderDetail, Pagination,
        PaymentLinkResponse,
    },
    auth::AuthUser,
    error::ApiError,
    state::{spawn_today_workbook, spawn_workbook_refresh, AppState, OrderChange},
};

const ORDER_NUMBER_ATTEMPTS: u32 = 4;

// ---------------------------------------------------------------------------
// Shared with the admin routes
// ---------------------------------------------------------------------------

pub(crate) async fn load_order(pool: &PgPool, order_id: Uuid) -> Result<Order, ApiError> {
    fp_db::fetch_order(pool, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order not found"))
}

pub(crate) async fn order_detail(pool: &PgPool, order: Order) -> Result<OrderDetail, ApiError> {
    let items = fp_db::fetch_order_items(pool, order.id).await?;
    let status_history = fp_db::fetch_status_history(pool, order.id).await?;
    let customer = fp_db::fetch_order_customer(pool, order.id).await?;
    Ok(OrderDetail {
        order,
        items,
        status_history,
        customer,
    })
}

/// Plan and apply a status / payment update as `actor`.
pub(crate) async fn run_update(
    st: &Arc<AppState>,
    actor: &User,
    order_id: Uuid,
    req: StatusUpdateRequest,
    as_admin: bool,
) -> Result<Order, ApiError> {
    let pool = st.db()?;
    let applied = fp_db::apply_order_update(pool, order_id, Some(actor.id), |current| {
        if as_admin {
            Ok(plan_admin_update(current, &req))
        } else {
            plan_owner_update(current, &req).map_err(anyhow::Error::from)
        }
    })
    .await?
    .ok_or(ApiError::NotFound("Order not found"))?;

    if applied.plan.is_noop() {
        return Ok(applied.order);
    }

    if applied.plan.non_forward {
        warn!(
            order = %applied.order.order_number,
            from = applied.previous.status.as_str(),
            to = applied.order.status.as_str(),
            actor = %actor.email,
            "order moved backwards or out of cancellation"
        );
    }
    info!(
        order = %applied.order.order_number,
        status = applied.order.status.as_str(),
        payment = applied.order.payment_status.as_str(),
        actor = %actor.email,
        "order updated"
    );
    st.publish_order(OrderChange::Updated, &applied.order);
    // The order is reported under the day it was placed.
    let order_day = local_today(st.config.timezone, applied.order.created_at_utc);
    spawn_workbook_refresh(Arc::clone(st), order_day);
    Ok(applied.order)
}

// ---------------------------------------------------------------------------
// POST /v1/orders  (multipart)
// ---------------------------------------------------------------------------

struct Upload {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// Last path component with anything outside `[A-Za-z0-9._-]` replaced.
pub(crate) fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(&['/', '\\'][..]).next().unwrap_or("").trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

fn field_index(name: &str, prefix: &str) -> Result<Option<u32>, ApiError> {
    let Some(raw) = name.strip_prefix(prefix) else {
        return Ok(None);
    };
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("bad form field name: {name}")))
}

async fn read_order_form(
    mut multipart: Multipart,
) -> Result<Vec<(Upload, PrintOptions)>, ApiError> {
    let mut files: BTreeMap<u32, Upload> = BTreeMap::new();
    let mut options: BTreeMap<u32, PrintOptions> = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(idx) = field_index(&name, "file-")? {
            let file_name = field
                .file_name()
                .map(sanitize_file_name)
                .unwrap_or_else(|| format!("document-{idx}.pdf"));
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("{name}: {e}")))?;
            files.insert(
                idx,
                Upload {
                    file_name,
                    content_type,
                    data,
                },
            );
        } else if let Some(idx) = field_index(&name, "options-")? {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("{name}: {e}")))?;
            let opts: PrintOptions = serde_json::from_str(&text)
                .map_err(|e| ApiError::bad_request(format!("{name}: {e}")))?;
            options.insert(idx, opts);
        }
    }

    let mut out = Vec::with_capacity(files.len());
    for (idx, upload) in files {
        let opts = options
            .remove(&idx)
            .ok_or_else(|| ApiError::bad_request(format!("file-{idx} has no options-{idx}")))?;
        out.push((upload, opts));
    }
    Ok(out)
}

fn to_i32(v: u32, what: &str) -> Result<i32, ApiError> {
    i32::try_from(v).map_err(|_| ApiError::bad_request(format!("{what} too large")))
}

async fn store_uploads(
    uploads_dir: &FsPath,
    order_id: Uuid,
    uploads: &[(Upload, PrintOptions)],
) -> Result<Vec<String>, ApiError> {
    let dir = uploads_dir.join(order_id.to_string());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("create upload dir failed: {}", dir.display()))?;

    let mut urls = Vec::with_capacity(uploads.len());
    for (pos, (u, _)) in uploads.iter().enumerate() {
        let stored = format!("{pos}-{}", u.file_name);
        let path = dir.join(&stored);
        tokio::fs::write(&path, &u.data)
            .await
            .with_context(|| format!("write upload failed: {}", path.display()))?;
        urls.push(format!("/uploads/{order_id}/{stored}"));
    }
    Ok(urls)
}

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OrderWithItems>), ApiError> {
    let pool = st.db()?;

    let address = fp_db::fetch_address(pool, user.id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Please set up your delivery address first"))?;

    let uploads = read_order_form(multipart).await?;
    let drafts: Vec<ItemDraft<'_>> = uploads
        .iter()
        .map(|(u, opts)| ItemDraft {
            file_name: &u.file_name,
            content_type: u.content_type.as_deref(),
            data: &u.data,
            options: opts,
        })
        .collect();
    let quote = quote_order(&drafts, &st.config.pricing, &st.config.limits)?;

    let order_id = Uuid::new_v4();
    let urls = store_uploads(&st.config.uploads_dir, order_id, &uploads).await?;

    let mut items = Vec::with_capacity(quote.items.len());
    for (q, file_url) in quote.items.into_iter().zip(urls) {
        items.push(NewOrderItem {
            file_name: q.file_name,
            file_url,
            page_count: to_i32(q.options.page_count, "pageCount")?,
            copies: to_i32(q.options.copies, "copies")?,
            print_type: q.options.print_type,
            paper_size: q.options.paper_size,
            print_side: q.options.print_side,
            page_range: q.options.page_range.filter(|r| !r.trim().is_empty()),
            price_paise: q.price_paise,
        });
    }

    let mut new = NewOrder {
        order_id,
        order_number: String::new(),
        user_id: user.id,
        total_paise: quote.total_paise,
        delivery_address: address.location,
        items,
    };

    let mut attempt = 1;
    let created = loop {
        new.order_number = generate_order_number(Utc::now());
        match fp_db::insert_order(pool, &new).await {
            Ok(o) => break o,
            Err(e) if e.downcast_ref::<DuplicateOrderNumber>().is_some()
                && attempt < ORDER_NUMBER_ATTEMPTS =>
            {
                attempt += 1;
            }
            Err(e) => {
                let dir = st.config.uploads_dir.join(order_id.to_string());
                let _ = tokio::fs::remove_dir_all(dir).await;
                return Err(e.into());
            }
        }
    };

    info!(
        order = %created.order.order_number,
        items = created.items.len(),
        total_paise = created.order.total_paise,
        customer = %user.email,
        "order placed"
    );
    st.publish_order(OrderChange::Created, &created.order);
    spawn_today_workbook(Arc::clone(&st));

    Ok((StatusCode::CREATED, Json(created)))
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn list_my_orders(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(q): Query<MyOrdersQuery>,
) -> Result<Json<MyOrdersResponse>, ApiError> {
    let pool = st.db()?;
    let (page, limit) = page_or_default(q.page, q.limit);

    let listed = fp_db::list_orders(
        pool,
        &OrderFilter {
            user_id: Some(user.id),
            status: q.status,
            page,
            limit,
            ..OrderFilter::default()
        },
    )
    .await?;

    Ok(Json(MyOrdersResponse {
        pagination: Pagination::new(listed.page, listed.limit, listed.total),
        orders: listed
            .orders
            .into_iter()
            .map(|row| OrderWithItems {
                order: row.order,
                items: row.items,
            })
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// GET|PATCH /v1/orders/:id
// ---------------------------------------------------------------------------

fn ensure_owner_or_admin(user: &User, order: &Order) -> Result<(), ApiError> {
    if order.user_id != user.id && !user.role.is_admin() {
        return Err(ApiError::forbidden("Unauthorized"));
    }
    Ok(())
}

pub(crate) async fn get_order(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    let pool = st.db()?;
    let order = load_order(pool, order_id).await?;
    ensure_owner_or_admin(&user, &order)?;
    Ok(Json(order_detail(pool, order).await?))
}

/// Customers confirm their own payment here; admins may use it like the
/// admin route.
pub(crate) async fn update_order(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let pool = st.db()?;
    let order = load_order(pool, order_id).await?;
    ensure_owner_or_admin(&user, &order)?;

    let as_admin = user.role.is_admin();
    Ok(Json(run_update(&st, &user, order_id, req, as_admin).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:id/payment
// ---------------------------------------------------------------------------

pub(crate) async fn payment_link(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentLinkResponse>, ApiError> {
    let pool = st.db()?;
    let order = load_order(pool, order_id).await?;
    ensure_owner_or_admin(&user, &order)?;

    let cfg = &st.config;
    Ok(Json(PaymentLinkResponse {
        upi_link: upi_payment_link(
            &cfg.upi_vpa,
            &cfg.merchant_name,
            order.total_paise,
            &order.order_number,
        ),
        amount: format_amount(order.total_paise),
        amount_paise: order.total_paise,
        upi_vpa: cfg.upi_vpa.clone(),
        merchant_name: cfg.merchant_name.clone(),
        order_number: order.order_number,
        payment_status: order.payment_status,
    }))
}

// ---------------------------------------------------------------------------
// GET /v1/dashboard
// ---------------------------------------------------------------------------

pub(crate) async fn dashboard(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<fp_db::CustomerDashboard>, ApiError> {
    let pool = st.db()?;
    Ok(Json(fp_db::customer_dashboard(pool, user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_base_name_only() {
        assert_eq!(sanitize_file_name("notes.pdf"), "notes.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\Lab Report (1).pdf"), "Lab_Report__1_.pdf");
        assert_eq!(sanitize_file_name(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_file_name("   "), "document.pdf");
    }

    #[test]
    fn field_index_parses_numeric_suffix() {
        assert_eq!(field_index("file-3", "file-").unwrap(), Some(3));
        assert_eq!(field_index("options-0", "file-").unwrap(), None);
        assert!(field_index("file-x", "file-").is_err());
    }
}
