use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fp_orders::{CurrentState, UpdatePlan, NOTE_ORDER_PLACED};
use fp_schemas::{
    CustomerRef, DeliveryAddress, Order, OrderItem, OrderStatus, PaperSize, PaymentStatus,
    PrintSide, PrintType, StatusHistoryEntry, UserRole,
};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::{is_unique_constraint_violation, like_pattern};

pub(crate) const ORDER_COLUMNS: &str = r#"
    o.order_id, o.order_number, o.user_id, o.status, o.payment_status, o.payment_id,
    o.total_paise, o.delivery_address, o.created_at_utc, o.updated_at_utc,
    o.paid_at_utc, o.delivered_at_utc
"#;

const ITEM_COLUMNS: &str = r#"
    item_id, order_id, position, file_name, file_url, page_count, copies,
    print_type, paper_size, print_side, page_range, price_paise
"#;

pub(crate) fn order_from_row(row: &PgRow) -> Result<Order> {
    let addr: serde_json::Value = row.try_get("delivery_address")?;
    let delivery_address: DeliveryAddress =
        serde_json::from_value(addr).context("delivery_address snapshot decode failed")?;

    Ok(Order {
        id: row.try_get("order_id")?,
        order_number: row.try_get("order_number")?,
        user_id: row.try_get("user_id")?,
        status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
        payment_status: PaymentStatus::parse(&row.try_get::<String, _>("payment_status")?)?,
        payment_id: row.try_get("payment_id")?,
        total_paise: row.try_get("total_paise")?,
        delivery_address,
        created_at_utc: row.try_get("created_at_utc")?,
        updated_at_utc: row.try_get("updated_at_utc")?,
        paid_at_utc: row.try_get("paid_at_utc")?,
        delivered_at_utc: row.try_get("delivered_at_utc")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        id: row.try_get("item_id")?,
        order_id: row.try_get("order_id")?,
        position: row.try_get("position")?,
        file_name: row.try_get("file_name")?,
        file_url: row.try_get("file_url")?,
        page_count: row.try_get("page_count")?,
        copies: row.try_get("copies")?,
        print_type: PrintType::parse(&row.try_get::<String, _>("print_type")?)?,
        paper_size: PaperSize::parse(&row.try_get::<String, _>("paper_size")?)?,
        print_side: PrintSide::parse(&row.try_get::<String, _>("print_side")?)?,
        page_range: row.try_get("page_range")?,
        price_paise: row.try_get("price_paise")?,
    })
}

/// Customer columns aliased `c_*` next to an order row.
fn customer_from_row(row: &PgRow) -> Result<CustomerRef> {
    Ok(CustomerRef {
        id: row.try_get("user_id")?,
        name: row.try_get("c_name")?,
        email: row.try_get("c_email")?,
        phone: row.try_get("c_phone")?,
        role: UserRole::parse(&row.try_get::<String, _>("c_role")?)?,
    })
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub file_name: String,
    pub file_url: String,
    pub page_count: i32,
    pub copies: i32,
    pub print_type: PrintType,
    pub paper_size: PaperSize,
    pub print_side: PrintSide,
    pub page_range: Option<String>,
    pub price_paise: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub total_paise: i64,
    pub delivery_address: DeliveryAddress,
    pub items: Vec<NewOrderItem>,
}

/// Order numbers are random; callers regenerate and retry on this error.
#[derive(Debug, Error)]
#[error("duplicate order number: {0}")]
pub struct DuplicateOrderNumber(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Insert the order, its items (in `items` order) and the initial PENDING
/// history row in one transaction.
///
/// A clash on `order_number` surfaces as [`DuplicateOrderNumber`].
pub async fn insert_order(pool: &PgPool, new: &NewOrder) -> Result<OrderWithItems> {
    let mut tx = pool.begin().await.context("insert_order begin failed")?;

    let snapshot = serde_json::to_value(&new.delivery_address)
        .context("delivery_address snapshot encode failed")?;

    let res = sqlx::query(&format!(
        r#"
        insert into orders as o (
          order_id, order_number, user_id, total_paise, delivery_address
        ) values ($1, $2, $3, $4, $5)
        returning {ORDER_COLUMNS}
        "#
    ))
    .bind(new.order_id)
    .bind(&new.order_number)
    .bind(new.user_id)
    .bind(new.total_paise)
    .bind(&snapshot)
    .fetch_one(&mut *tx)
    .await;

    let row = match res {
        Ok(row) => row,
        Err(e) if is_unique_constraint_violation(&e, "uq_orders_order_number") => {
            return Err(DuplicateOrderNumber(new.order_number.clone()).into());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("insert_order failed")),
    };
    let order = order_from_row(&row)?;

    let mut items = Vec::with_capacity(new.items.len());
    for (i, it) in new.items.iter().enumerate() {
        let row = sqlx::query(&format!(
            r#"
            insert into order_items (
              item_id, order_id, position, file_name, file_url, page_count, copies,
              print_type, paper_size, print_side, page_range, price_paise
            ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            returning {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.order_id)
        .bind(i as i32)
        .bind(&it.file_name)
        .bind(&it.file_url)
        .bind(it.page_count)
        .bind(it.copies)
        .bind(it.print_type.as_str())
        .bind(it.paper_size.as_str())
        .bind(it.print_side.as_str())
        .bind(&it.page_range)
        .bind(it.price_paise)
        .fetch_one(&mut *tx)
        .await
        .context("insert order_item failed")?;
        items.push(item_from_row(&row)?);
    }

    insert_history_row(
        &mut tx,
        new.order_id,
        OrderStatus::Pending,
        Some(new.user_id),
        Some(NOTE_ORDER_PLACED),
    )
    .await?;

    tx.commit().await.context("insert_order commit failed")?;
    Ok(OrderWithItems { order, items })
}

async fn insert_history_row(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
    changed_by: Option<Uuid>,
    notes: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        insert into order_status_history (history_id, order_id, status, changed_by, notes)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(status.as_str())
    .bind(changed_by)
    .bind(notes)
    .execute(&mut **tx)
    .await
    .context("insert order_status_history failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
    let row = sqlx::query(&format!(
        "select {ORDER_COLUMNS} from orders o where o.order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .context("fetch_order failed")?;

    row.as_ref().map(order_from_row).transpose()
}

pub async fn fetch_order_by_number(pool: &PgPool, order_number: &str) -> Result<Option<Order>> {
    let row = sqlx::query(&format!(
        "select {ORDER_COLUMNS} from orders o where o.order_number = $1"
    ))
    .bind(order_number.trim())
    .fetch_optional(pool)
    .await
    .context("fetch_order_by_number failed")?;

    row.as_ref().map(order_from_row).transpose()
}

/// Orders the shop is physically working on: printing or out for delivery.
pub async fn count_in_flight_orders(pool: &PgPool) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        select count(*)::bigint
        from orders
        where status in ('PRINTING', 'READY_FOR_DELIVERY', 'OUT_FOR_DELIVERY')
        "#,
    )
    .fetch_one(pool)
    .await
    .context("count_in_flight_orders failed")?;
    Ok(n)
}

/// Items in upload order.
pub async fn fetch_order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let rows = sqlx::query(&format!(
        "select {ITEM_COLUMNS} from order_items where order_id = $1 order by position"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await
    .context("fetch_order_items failed")?;

    rows.iter().map(item_from_row).collect()
}

/// Items for many orders at once, keyed by order id.
pub async fn fetch_items_for_orders(
    pool: &PgPool,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
    let mut out: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(out);
    }

    let rows = sqlx::query(&format!(
        r#"
        select {ITEM_COLUMNS}
        from order_items
        where order_id = any($1)
        order by order_id, position
        "#
    ))
    .bind(order_ids)
    .fetch_all(pool)
    .await
    .context("fetch_items_for_orders failed")?;

    for row in &rows {
        let item = item_from_row(row)?;
        out.entry(item.order_id).or_default().push(item);
    }
    Ok(out)
}

/// Status log, newest first.
pub async fn fetch_status_history(pool: &PgPool, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
    let rows = sqlx::query(
        r#"
        select history_id, order_id, status, changed_by, notes, changed_at_utc
        from order_status_history
        where order_id = $1
        order by changed_at_utc desc, history_id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .context("fetch_status_history failed")?;

    rows.iter()
        .map(|row| {
            Ok(StatusHistoryEntry {
                id: row.try_get("history_id")?,
                order_id: row.try_get("order_id")?,
                status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
                changed_by: row.try_get("changed_by")?,
                notes: row.try_get("notes")?,
                changed_at_utc: row.try_get("changed_at_utc")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Restrict to one customer's orders.
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Customer role.
    pub role: Option<UserRole>,
    /// Inclusive lower bound on created_at.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on created_at.
    pub created_to: Option<DateTime<Utc>>,
    /// Order number, customer name or email.
    pub search: Option<String>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderListRow {
    #[serde(flatten)]
    pub order: Order,
    pub customer: CustomerRef,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderListRow>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, f: &OrderFilter) {
    qb.push(" where true");
    if let Some(uid) = f.user_id {
        qb.push(" and o.user_id = ").push_bind(uid);
    }
    if let Some(s) = f.status {
        qb.push(" and o.status = ").push_bind(s.as_str());
    }
    if let Some(p) = f.payment_status {
        qb.push(" and o.payment_status = ").push_bind(p.as_str());
    }
    if let Some(r) = f.role {
        qb.push(" and u.role = ").push_bind(r.as_str());
    }
    if let Some(from) = f.created_from {
        qb.push(" and o.created_at_utc >= ").push_bind(from);
    }
    if let Some(to) = f.created_to {
        qb.push(" and o.created_at_utc < ").push_bind(to);
    }
    if let Some(term) = f.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pat = like_pattern(term);
        qb.push(" and (o.order_number ilike ")
            .push_bind(pat.clone())
            .push(" or u.name ilike ")
            .push_bind(pat.clone())
            .push(" or u.email ilike ")
            .push_bind(pat)
            .push(")");
    }
}

/// Filtered orders, newest first, with customer and items.
pub async fn list_orders(pool: &PgPool, f: &OrderFilter) -> Result<OrderPage> {
    let limit = f.limit.clamp(1, 100);
    let page = f.page.max(1);

    let mut count_q = QueryBuilder::<Postgres>::new(
        "select count(*)::bigint as n from orders o join users u on u.user_id = o.user_id",
    );
    push_order_filters(&mut count_q, f);
    let total: i64 = count_q
        .build()
        .fetch_one(pool)
        .await
        .context("list_orders count failed")?
        .try_get("n")?;

    let mut q = QueryBuilder::<Postgres>::new(format!(
        r#"
        select {ORDER_COLUMNS},
          u.name as c_name, u.email as c_email, u.phone as c_phone, u.role as c_role
        from orders o
        join users u on u.user_id = o.user_id
        "#
    ));
    push_order_filters(&mut q, f);
    q.push(" order by o.created_at_utc desc, o.order_id limit ")
        .push_bind(i64::from(limit))
        .push(" offset ")
        .push_bind(i64::from(page - 1) * i64::from(limit));

    let rows = q
        .build()
        .fetch_all(pool)
        .await
        .context("list_orders failed")?;

    let mut listed = Vec::with_capacity(rows.len());
    for row in &rows {
        listed.push((order_from_row(row)?, customer_from_row(row)?));
    }

    let ids: Vec<Uuid> = listed.iter().map(|(o, _)| o.id).collect();
    let mut items = fetch_items_for_orders(pool, &ids).await?;

    let orders = listed
        .into_iter()
        .map(|(order, customer)| OrderListRow {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
            customer,
        })
        .collect();

    Ok(OrderPage {
        orders,
        total,
        page,
        limit,
    })
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppliedUpdate {
    pub previous: CurrentState,
    pub plan: UpdatePlan,
    pub order: Order,
}

/// Lock the order row, plan the update against its current state, then write
/// the changed columns and history rows in one transaction.
///
/// Returns `Ok(None)` when the order does not exist. An error from `plan_fn`
/// aborts without writing and is returned unchanged.
pub async fn apply_order_update<F>(
    pool: &PgPool,
    order_id: Uuid,
    changed_by: Option<Uuid>,
    plan_fn: F,
) -> Result<Option<AppliedUpdate>>
where
    F: FnOnce(CurrentState) -> Result<UpdatePlan>,
{
    let mut tx = pool.begin().await.context("apply_order_update begin failed")?;

    let row = sqlx::query(&format!(
        "select {ORDER_COLUMNS} from orders o where o.order_id = $1 for update"
    ))
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await
    .context("apply_order_update lock failed")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let current_order = order_from_row(&row)?;
    let previous = CurrentState {
        status: current_order.status,
        payment_status: current_order.payment_status,
    };

    let plan = plan_fn(previous)?;
    if plan.is_noop() {
        tx.commit().await.context("apply_order_update commit failed")?;
        return Ok(Some(AppliedUpdate {
            previous,
            plan,
            order: current_order,
        }));
    }

    let row = sqlx::query(&format!(
        r#"
        update orders as o
        set status = coalesce($2, o.status),
            payment_status = coalesce($3, o.payment_status),
            payment_id = coalesce($4, o.payment_id),
            paid_at_utc = case when $5 then now() else o.paid_at_utc end,
            delivered_at_utc = case when $6 then now() else o.delivered_at_utc end,
            updated_at_utc = now()
        where o.order_id = $1
        returning {ORDER_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(plan.status.map(|s| s.as_str()))
    .bind(plan.payment_status.map(|p| p.as_str()))
    .bind(plan.payment_id.as_deref())
    .bind(plan.set_paid_at)
    .bind(plan.set_delivered_at)
    .fetch_one(&mut *tx)
    .await
    .context("apply_order_update write failed")?;
    let order = order_from_row(&row)?;

    for h in &plan.history {
        insert_history_row(&mut tx, order_id, h.status, changed_by, h.notes.as_deref()).await?;
    }

    tx.commit().await.context("apply_order_update commit failed")?;

    Ok(Some(AppliedUpdate {
        previous,
        plan,
        order,
    }))
}

/// Owner and customer fields for an order detail view.
pub async fn fetch_order_customer(pool: &PgPool, order_id: Uuid) -> Result<Option<CustomerRef>> {
    let row = sqlx::query(
        r#"
        select o.user_id, u.name as c_name, u.email as c_email, u.phone as c_phone, u.role as c_role
        from orders o
        join users u on u.user_id = o.user_id
        where o.order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .context("fetch_order_customer failed")?;

    row.as_ref().map(customer_from_row).transpose()
}
