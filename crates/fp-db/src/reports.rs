use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fp_schemas::Order;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::orders::{fetch_items_for_orders, order_from_row, OrderWithItems, ORDER_COLUMNS};

/// One order as the daily report sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOrder {
    #[serde(flatten)]
    pub order: OrderWithItems,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

/// Orders created in `[from, to)`, oldest first, with items and customer
/// contact fields. Every status is returned; the report decides what counts.
pub async fn fetch_orders_for_window(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<ReportOrder>> {
    let rows = sqlx::query(&format!(
        r#"
        select {ORDER_COLUMNS},
          u.name as c_name, u.email as c_email, u.phone as c_phone
        from orders o
        join users u on u.user_id = o.user_id
        where o.created_at_utc >= $1 and o.created_at_utc < $2
        order by o.created_at_utc, o.order_id
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("fetch_orders_for_window failed")?;

    let mut base: Vec<(Order, Option<String>, String, Option<String>)> = Vec::with_capacity(rows.len());
    for row in &rows {
        base.push((
            order_from_row(row)?,
            row.try_get("c_name")?,
            row.try_get("c_email")?,
            row.try_get("c_phone")?,
        ));
    }

    let ids: Vec<Uuid> = base.iter().map(|(o, ..)| o.id).collect();
    let mut items = fetch_items_for_orders(pool, &ids).await?;

    Ok(base
        .into_iter()
        .map(|(order, name, email, phone)| ReportOrder {
            order: OrderWithItems {
                items: items.remove(&order.id).unwrap_or_default(),
                order,
            },
            customer_name: name,
            customer_email: email,
            customer_phone: phone,
        })
        .collect())
}

/// Persisted totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReportRow {
    pub report_date: NaiveDate,
    pub total_orders: i32,
    pub total_copies: i64,
    pub total_pages: i64,
    pub bw_pages: i64,
    pub color_pages: i64,
    pub gross_revenue_paise: i64,
    pub payments_received_paise: i64,
    pub payments_pending_paise: i64,
    pub production_cost_paise: i64,
    pub other_expenses_paise: i64,
    pub net_profit_paise: i64,
    pub file_name: Option<String>,
    pub generated_at_utc: DateTime<Utc>,
}

fn report_from_row(row: &PgRow) -> Result<DailyReportRow> {
    Ok(DailyReportRow {
        report_date: row.try_get("report_date")?,
        total_orders: row.try_get("total_orders")?,
        total_copies: row.try_get("total_copies")?,
        total_pages: row.try_get("total_pages")?,
        bw_pages: row.try_get("bw_pages")?,
        color_pages: row.try_get("color_pages")?,
        gross_revenue_paise: row.try_get("gross_revenue_paise")?,
        payments_received_paise: row.try_get("payments_received_paise")?,
        payments_pending_paise: row.try_get("payments_pending_paise")?,
        production_cost_paise: row.try_get("production_cost_paise")?,
        other_expenses_paise: row.try_get("other_expenses_paise")?,
        net_profit_paise: row.try_get("net_profit_paise")?,
        file_name: row.try_get("file_name")?,
        generated_at_utc: row.try_get("generated_at_utc")?,
    })
}

pub async fn upsert_daily_report(pool: &PgPool, r: &DailyReportRow) -> Result<()> {
    sqlx::query(
        r#"
        insert into daily_reports (
          report_date, total_orders, total_copies, total_pages, bw_pages, color_pages,
          gross_revenue_paise, payments_received_paise, payments_pending_paise,
          production_cost_paise, other_expenses_paise, net_profit_paise,
          file_name, generated_at_utc
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        on conflict (report_date) do update set
          total_orders = excluded.total_orders,
          total_copies = excluded.total_copies,
          total_pages = excluded.total_pages,
          bw_pages = excluded.bw_pages,
          color_pages = excluded.color_pages,
          gross_revenue_paise = excluded.gross_revenue_paise,
          payments_received_paise = excluded.payments_received_paise,
          payments_pending_paise = excluded.payments_pending_paise,
          production_cost_paise = excluded.production_cost_paise,
          other_expenses_paise = excluded.other_expenses_paise,
          net_profit_paise = excluded.net_profit_paise,
          file_name = excluded.file_name,
          generated_at_utc = excluded.generated_at_utc
        "#,
    )
    .bind(r.report_date)
    .bind(r.total_orders)
    .bind(r.total_copies)
    .bind(r.total_pages)
    .bind(r.bw_pages)
    .bind(r.color_pages)
    .bind(r.gross_revenue_paise)
    .bind(r.payments_received_paise)
    .bind(r.payments_pending_paise)
    .bind(r.production_cost_paise)
    .bind(r.other_expenses_paise)
    .bind(r.net_profit_paise)
    .bind(&r.file_name)
    .bind(r.generated_at_utc)
    .execute(pool)
    .await
    .context("upsert_daily_report failed")?;

    Ok(())
}

pub async fn fetch_daily_report(pool: &PgPool, date: NaiveDate) -> Result<Option<DailyReportRow>> {
    let row = sqlx::query(
        r#"
        select report_date, total_orders, total_copies, total_pages, bw_pages, color_pages,
               gross_revenue_paise, payments_received_paise, payments_pending_paise,
               production_cost_paise, other_expenses_paise, net_profit_paise,
               file_name, generated_at_utc
        from daily_reports
        where report_date = $1
        "#,
    )
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("fetch_daily_report failed")?;

    row.as_ref().map(report_from_row).transpose()
}
