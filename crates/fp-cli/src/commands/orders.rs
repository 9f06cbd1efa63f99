//! `fp order` handlers. Status and payment changes go through the same
//! planner and transaction as the admin panel.

use anyhow::{Context, Result};
use fp_orders::{format_amount, format_delivery_address, plan_admin_update, StatusUpdateRequest};
use fp_schemas::{Order, OrderStatus, PaymentStatus};
use sqlx::PgPool;

use super::{opt_dt, opt_str};

async fn require_order(pool: &PgPool, number: &str) -> Result<Order> {
    fp_db::fetch_order_by_number(pool, number)
        .await?
        .with_context(|| format!("no order with number {}", number.trim()))
}

fn print_order_head(o: &Order) {
    println!("order_id={}", o.id);
    println!("order_number={}", o.order_number);
    println!("status={}", o.status.as_str());
    println!("payment_status={}", o.payment_status.as_str());
    println!("payment_id={}", opt_str(&o.payment_id));
    println!("total={}", format_amount(o.total_paise));
}

pub async fn order_show(number: &str) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let order = require_order(&pool, number).await?;
    let items = fp_db::fetch_order_items(&pool, order.id).await?;
    let history = fp_db::fetch_status_history(&pool, order.id).await?;
    let customer = fp_db::fetch_order_customer(&pool, order.id).await?;

    print_order_head(&order);
    if let Some(c) = &customer {
        println!("customer_email={}", c.email);
        println!("customer_name={}", opt_str(&c.name));
        println!("customer_phone={}", opt_str(&c.phone));
    }
    println!("delivery_address={}", format_delivery_address(&order.delivery_address));
    println!("created_at_utc={}", order.created_at_utc.to_rfc3339());
    println!("paid_at_utc={}", opt_dt(&order.paid_at_utc));
    println!("delivered_at_utc={}", opt_dt(&order.delivered_at_utc));

    for item in &items {
        println!(
            "item={} file={} pages={} copies={} type={} paper={} side={} range={} price={}",
            item.position,
            item.file_name,
            item.page_count,
            item.copies,
            item.print_type.as_str(),
            item.paper_size.as_str(),
            item.print_side.as_str(),
            opt_str(&item.page_range),
            format_amount(item.price_paise),
        );
    }
    for h in &history {
        println!(
            "history={} at={} notes={}",
            h.status.as_str(),
            h.changed_at_utc.to_rfc3339(),
            opt_str(&h.notes)
        );
    }
    Ok(())
}

async fn apply(pool: &PgPool, order: &Order, req: StatusUpdateRequest) -> Result<()> {
    let applied = fp_db::apply_order_update(pool, order.id, None, |current| {
        Ok(plan_admin_update(current, &req))
    })
    .await?
    .with_context(|| format!("order {} disappeared", order.order_number))?;

    if applied.plan.is_noop() {
        println!("unchanged=true order_number={}", applied.order.order_number);
        return Ok(());
    }
    if applied.plan.non_forward {
        eprintln!(
            "WARN: order moved from {} to {}",
            applied.previous.status.as_str(),
            applied.order.status.as_str()
        );
    }
    println!("updated=true");
    print_order_head(&applied.order);
    Ok(())
}

pub async fn order_set_status(number: &str, status: OrderStatus, note: Option<String>) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let order = require_order(&pool, number).await?;
    apply(
        &pool,
        &order,
        StatusUpdateRequest {
            status: Some(status),
            note,
            ..Default::default()
        },
    )
    .await
}

pub async fn order_set_payment(
    number: &str,
    status: PaymentStatus,
    payment_id: Option<String>,
) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let order = require_order(&pool, number).await?;
    apply(
        &pool,
        &order,
        StatusUpdateRequest {
            payment_status: Some(status),
            payment_id,
            ..Default::default()
        },
    )
    .await
}
