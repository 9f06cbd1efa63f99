use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use fp_config::AppConfig;
use sqlx::PgPool;
use std::path::PathBuf;

use crate::{aggregate_day, day_window, write_workbook, DailyReport, ExportsDir};

#[derive(Debug, Clone)]
pub struct RegeneratedWorkbook {
    pub path: PathBuf,
    pub file_name: String,
    pub report: DailyReport,
}

/// Query and aggregate one calendar day without touching the filesystem.
pub async fn build_daily_report(pool: &PgPool, cfg: &AppConfig, date: NaiveDate) -> Result<DailyReport> {
    let (from, to) = day_window(date, cfg.timezone)?;
    let orders = fp_db::fetch_orders_for_window(pool, from, to).await?;
    let expenses = fp_db::list_expenses_for_day(pool, date).await?;

    Ok(aggregate_day(
        date,
        cfg.timezone,
        Utc::now(),
        &orders,
        &expenses,
        &cfg.pricing,
    ))
}

/// Rebuild the workbook for `date`, then upsert the day's totals.
pub async fn regenerate_daily_workbook(
    pool: &PgPool,
    cfg: &AppConfig,
    date: NaiveDate,
) -> Result<RegeneratedWorkbook> {
    let report = build_daily_report(pool, cfg, date).await?;

    let exports = ExportsDir::new(&cfg.exports_dir);
    exports.ensure()?;
    let path = exports.path_for(date);
    let file_name = ExportsDir::file_name_for(date);

    let to_write = report.clone();
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_workbook(&to_write, &target))
        .await
        .context("workbook writer task failed")??;

    fp_db::upsert_daily_report(pool, &report.to_row(Some(file_name.clone()))).await?;

    tracing::info!(
        date = %date,
        orders = report.total_orders,
        path = %path.display(),
        "daily workbook written"
    );

    Ok(RegeneratedWorkbook {
        path,
        file_name,
        report,
    })
}
