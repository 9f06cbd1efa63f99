//! `fp expense` and `fp report` handlers.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use fp_db::NewExpense;
use fp_orders::{format_amount, parse_rupees};
use fp_report::{DailyReport, ExportsDir};
use uuid::Uuid;

use super::{date_or_today, load_config, opt_str};

// ---------------------------------------------------------------------------
// fp expense
// ---------------------------------------------------------------------------

pub async fn expense_add(
    date: Option<NaiveDate>,
    category: String,
    amount: &str,
    description: Option<String>,
    by: Option<String>,
) -> Result<()> {
    let category = category.trim().to_string();
    if category.is_empty() {
        bail!("--category must not be empty");
    }
    let amount_paise = parse_rupees(amount)?;
    let cfg = load_config()?;
    let date = date_or_today(date, &cfg);

    let pool = fp_db::connect_from_env().await?;
    let e = fp_db::insert_expense(
        &pool,
        &NewExpense {
            date,
            category,
            amount_paise,
            description: description.filter(|d| !d.trim().is_empty()),
            created_by: by,
        },
    )
    .await?;

    println!("expense_id={}", e.id);
    println!("date={}", e.date);
    println!("category={}", e.category);
    println!("amount={}", format_amount(e.amount_paise));
    Ok(())
}

pub async fn expense_remove(id: Uuid) -> Result<()> {
    let pool = fp_db::connect_from_env().await?;
    let removed = fp_db::delete_expense(&pool, id)
        .await?
        .with_context(|| format!("no expense with id {id}"))?;
    println!(
        "removed=true expense_id={} date={} amount={}",
        removed.id,
        removed.date,
        format_amount(removed.amount_paise)
    );
    Ok(())
}

pub async fn expense_list(date: Option<NaiveDate>) -> Result<()> {
    let cfg = load_config()?;
    let date = date_or_today(date, &cfg);
    let pool = fp_db::connect_from_env().await?;
    let expenses = fp_db::list_expenses_for_day(&pool, date).await?;

    let mut total = 0_i64;
    for e in &expenses {
        total += e.amount_paise;
        println!(
            "expense_id={} category={} amount={} description={} by={}",
            e.id,
            e.category,
            format_amount(e.amount_paise),
            opt_str(&e.description),
            opt_str(&e.created_by)
        );
    }
    println!("date={date} count={} total={}", expenses.len(), format_amount(total));
    Ok(())
}

// ---------------------------------------------------------------------------
// fp report
// ---------------------------------------------------------------------------

fn print_totals(r: &DailyReport) {
    println!("date={}", r.date);
    println!("total_orders={}", r.total_orders);
    println!("total_copies={}", r.total_copies);
    println!("total_pages={}", r.total_pages);
    println!("bw_pages={}", r.bw_pages);
    println!("color_pages={}", r.color_pages);
    println!("gross_revenue={}", format_amount(r.gross_revenue_paise));
    println!("payments_received={}", format_amount(r.payments_received_paise));
    println!("payments_pending={}", format_amount(r.payments_pending_paise));
    println!("production_cost={}", format_amount(r.production_cost_paise));
    println!("other_expenses={}", format_amount(r.other_expenses_paise));
    println!("net_profit={}", format_amount(r.net_profit_paise));
    println!("profit_margin={}", r.profit_margin_label());
    for s in &r.status_breakdown {
        println!("status={} count={}", s.status.as_str(), s.count);
    }
}

pub async fn report_show(date: Option<NaiveDate>) -> Result<()> {
    let cfg = load_config()?;
    let date = date_or_today(date, &cfg);
    let pool = fp_db::connect_from_env().await?;
    let report = fp_report::build_daily_report(&pool, &cfg, date).await?;
    print_totals(&report);
    Ok(())
}

pub async fn report_export(date: Option<NaiveDate>, csv: Option<String>) -> Result<()> {
    let cfg = load_config()?;
    let date = date_or_today(date, &cfg);
    let pool = fp_db::connect_from_env().await?;
    let out = fp_report::regenerate_daily_workbook(&pool, &cfg, date).await?;

    println!("workbook={}", out.path.display());
    if let Some(csv_path) = csv {
        let file = std::fs::File::create(&csv_path)
            .with_context(|| format!("create csv failed: {csv_path}"))?;
        fp_report::write_orders_csv(&out.report, file)?;
        println!("csv={csv_path}");
    }
    print_totals(&out.report);
    Ok(())
}

pub fn report_list() -> Result<()> {
    let cfg = load_config()?;
    let exports = ExportsDir::new(&cfg.exports_dir);
    let names = exports.list_available()?;
    for name in &names {
        println!("report={}", exports.root().join(name).display());
    }
    println!("count={}", names.len());
    Ok(())
}
