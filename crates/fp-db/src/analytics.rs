use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fp_schemas::{OrderStatus, PaymentStatus, UserRole};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::orders::{fetch_items_for_orders, order_from_row, OrderWithItems, ORDER_COLUMNS};

const REVENUE_SERIES_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct RecentOrder {
    pub id: Uuid,
    pub order_number: String,
    pub total_paise: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at_utc: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_role: UserRole,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub revenue_paise: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminAnalytics {
    pub total_orders: i64,
    /// Σ totals of orders with a COMPLETED payment.
    pub total_revenue_paise: i64,
    /// PENDING, PAYMENT_CONFIRMED or PRINTING.
    pub pending_orders: i64,
    /// READY_FOR_DELIVERY or OUT_FOR_DELIVERY.
    pub pending_deliveries: i64,
    pub today_orders: i64,
    pub today_revenue_paise: i64,
    pub recent_orders: Vec<RecentOrder>,
    /// One entry per status, zero counts included.
    pub orders_by_status: Vec<StatusCount>,
    /// Completed revenue per local day, oldest first, ending at `today`.
    pub revenue_by_day: Vec<DayRevenue>,
}

fn status_list(statuses: &[OrderStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

/// Admin dashboard numbers. Calendar days are cut in `tz` (an IANA name);
/// `today` is the current local date in that zone.
pub async fn admin_analytics(pool: &PgPool, tz: &str, today: NaiveDate) -> Result<AdminAnalytics> {
    let series_start = today - Duration::days(REVENUE_SERIES_DAYS - 1);

    let totals = sqlx::query(
        r#"
        select
          count(*)::bigint as total_orders,
          coalesce(sum(total_paise) filter (where payment_status = 'COMPLETED'), 0)::bigint
            as total_revenue,
          count(*) filter (where status = any($3))::bigint as pending_orders,
          count(*) filter (where status = any($4))::bigint as pending_deliveries,
          count(*) filter (where (created_at_utc at time zone $1)::date = $2)::bigint
            as today_orders,
          coalesce(sum(total_paise) filter (
            where (created_at_utc at time zone $1)::date = $2
              and payment_status = 'COMPLETED'), 0)::bigint as today_revenue
        from orders
        "#,
    )
    .bind(tz)
    .bind(today)
    .bind(status_list(&OrderStatus::AWAITING_PRINT))
    .bind(status_list(&OrderStatus::AWAITING_DELIVERY))
    .fetch_one(pool)
    .await
    .context("admin_analytics totals failed")?;

    let recent_rows = sqlx::query(
        r#"
        select o.order_id, o.order_number, o.total_paise, o.status, o.payment_status,
               o.created_at_utc, u.name, u.email, u.role,
               (select count(*) from order_items i where i.order_id = o.order_id)::bigint
                 as item_count
        from orders o
        join users u on u.user_id = o.user_id
        order by o.created_at_utc desc, o.order_id
        limit 10
        "#,
    )
    .fetch_all(pool)
    .await
    .context("admin_analytics recent orders failed")?;

    let mut recent_orders = Vec::with_capacity(recent_rows.len());
    for row in &recent_rows {
        recent_orders.push(RecentOrder {
            id: row.try_get("order_id")?,
            order_number: row.try_get("order_number")?,
            total_paise: row.try_get("total_paise")?,
            status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
            payment_status: PaymentStatus::parse(&row.try_get::<String, _>("payment_status")?)?,
            created_at_utc: row.try_get("created_at_utc")?,
            customer_name: row.try_get("name")?,
            customer_email: row.try_get("email")?,
            customer_role: UserRole::parse(&row.try_get::<String, _>("role")?)?,
            item_count: row.try_get("item_count")?,
        });
    }

    let status_rows = sqlx::query(
        "select status, count(*)::bigint as n from orders group by status",
    )
    .fetch_all(pool)
    .await
    .context("admin_analytics status counts failed")?;

    let mut orders_by_status: Vec<StatusCount> = OrderStatus::ALL
        .iter()
        .map(|s| StatusCount {
            status: *s,
            count: 0,
        })
        .collect();
    for row in &status_rows {
        let status = OrderStatus::parse(&row.try_get::<String, _>("status")?)?;
        let n: i64 = row.try_get("n")?;
        if let Some(sc) = orders_by_status.iter_mut().find(|sc| sc.status == status) {
            sc.count = n;
        }
    }

    let day_rows = sqlx::query(
        r#"
        select (created_at_utc at time zone $1)::date as day,
               sum(total_paise)::bigint as revenue
        from orders
        where payment_status = 'COMPLETED'
          and (created_at_utc at time zone $1)::date between $2 and $3
        group by day
        "#,
    )
    .bind(tz)
    .bind(series_start)
    .bind(today)
    .fetch_all(pool)
    .await
    .context("admin_analytics revenue by day failed")?;

    let mut revenue_by_day: Vec<DayRevenue> = (0..REVENUE_SERIES_DAYS)
        .map(|i| DayRevenue {
            date: series_start + Duration::days(i),
            revenue_paise: 0,
        })
        .collect();
    for row in &day_rows {
        let day: NaiveDate = row.try_get("day")?;
        let revenue: i64 = row.try_get("revenue")?;
        if let Some(d) = revenue_by_day.iter_mut().find(|d| d.date == day) {
            d.revenue_paise = revenue;
        }
    }

    Ok(AdminAnalytics {
        total_orders: totals.try_get("total_orders")?,
        total_revenue_paise: totals.try_get("total_revenue")?,
        pending_orders: totals.try_get("pending_orders")?,
        pending_deliveries: totals.try_get("pending_deliveries")?,
        today_orders: totals.try_get("today_orders")?,
        today_revenue_paise: totals.try_get("today_revenue")?,
        recent_orders,
        orders_by_status,
        revenue_by_day,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
    /// Σ totals of the customer's orders with a COMPLETED payment.
    pub total_spent_paise: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<OrderWithItems>,
}

pub async fn customer_dashboard(pool: &PgPool, user_id: Uuid) -> Result<CustomerDashboard> {
    let row = sqlx::query(
        r#"
        select
          count(*)::bigint as total_orders,
          count(*) filter (where status = any($2))::bigint as pending_orders,
          count(*) filter (where status = 'DELIVERED')::bigint as completed_orders,
          coalesce(sum(total_paise) filter (where payment_status = 'COMPLETED'), 0)::bigint
            as total_spent
        from orders
        where user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(status_list(&OrderStatus::AWAITING_PRINT))
    .fetch_one(pool)
    .await
    .context("customer_dashboard stats failed")?;

    let stats = DashboardStats {
        total_orders: row.try_get("total_orders")?,
        pending_orders: row.try_get("pending_orders")?,
        completed_orders: row.try_get("completed_orders")?,
        total_spent_paise: row.try_get("total_spent")?,
    };

    let rows = sqlx::query(&format!(
        r#"
        select {ORDER_COLUMNS}
        from orders o
        where o.user_id = $1
        order by o.created_at_utc desc, o.order_id
        limit 5
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("customer_dashboard recent orders failed")?;

    let orders = rows
        .iter()
        .map(order_from_row)
        .collect::<Result<Vec<_>>>()?;
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items = fetch_items_for_orders(pool, &ids).await?;

    let recent_orders = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect();

    Ok(CustomerDashboard {
        stats,
        recent_orders,
    })
}
