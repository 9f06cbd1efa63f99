use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use fp_db::NewExpense;
use fp_report::{local_today, ExportsDir};
use fp_schemas::DailyExpense;
use tracing::info;
use uuid::Uuid;

use crate::{
    api_types::{
        DailyReportResponse, DeletedResponse, ExcelListResponse, ExcelQuery, NewExpenseRequest,
        RegenerateRequest, RegenerateResponse, ReportQuery,
    },
    auth::AdminUser,
    error::ApiError,
    state::AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn today(st: &AppState) -> NaiveDate {
    local_today(st.config.timezone, Utc::now())
}

// ---------------------------------------------------------------------------
// GET /v1/admin/reports?date=
// ---------------------------------------------------------------------------

pub(crate) async fn daily_report(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<ReportQuery>,
) -> Result<Json<DailyReportResponse>, ApiError> {
    let pool = st.db()?;
    let date = q.date.unwrap_or_else(|| today(&st));

    let report = fp_report::build_daily_report(pool, &st.config, date).await?;
    let expense_records = fp_db::list_expenses_for_day(pool, date).await?;

    Ok(Json(DailyReportResponse {
        report,
        expense_records,
    }))
}

// ---------------------------------------------------------------------------
// POST /v1/admin/reports/expenses, DELETE /v1/admin/reports/expenses/:id
// ---------------------------------------------------------------------------

pub(crate) async fn add_expense(
    State(st): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<NewExpenseRequest>,
) -> Result<Json<DailyExpense>, ApiError> {
    if req.category.trim().is_empty() {
        return Err(ApiError::bad_request("category is required"));
    }
    let amount_paise = req.amount.to_paise()?;

    let pool = st.db()?;
    let expense = fp_db::insert_expense(
        pool,
        &NewExpense {
            date: req.date,
            category: req.category,
            amount_paise,
            description: req.description.filter(|d| !d.trim().is_empty()),
            created_by: Some(admin.email.clone()),
        },
    )
    .await?;

    info!(
        date = %expense.date,
        category = %expense.category,
        amount_paise = expense.amount_paise,
        admin = %admin.email,
        "expense recorded"
    );
    Ok(Json(expense))
}

pub(crate) async fn delete_expense(
    State(st): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let pool = st.db()?;
    let removed = fp_db::delete_expense(pool, expense_id)
        .await?
        .ok_or(ApiError::NotFound("Expense not found"))?;

    info!(
        date = %removed.date,
        category = %removed.category,
        admin = %admin.email,
        "expense removed"
    );
    Ok(Json(DeletedResponse { success: true }))
}

// ---------------------------------------------------------------------------
// GET|POST /v1/admin/reports/excel
// ---------------------------------------------------------------------------

/// `?action=list` lists stored workbooks; otherwise downloads the workbook
/// for `?date=` (default today), generating it first if missing.
pub(crate) async fn excel_download(
    State(st): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<ExcelQuery>,
) -> Result<Response, ApiError> {
    let exports = ExportsDir::new(&st.config.exports_dir);

    match q.action.as_deref() {
        Some("list") => {
            let reports = exports.list_available()?;
            return Ok(Json(ExcelListResponse { reports }).into_response());
        }
        Some("download") | None => {}
        Some(other) => {
            return Err(ApiError::bad_request(format!("unknown action: {other}")));
        }
    }

    let date = q.date.unwrap_or_else(|| today(&st));
    let path = match exports.existing_path(date) {
        Some(p) => p,
        None => {
            st.db()?;
            st.regenerate_workbook(date).await?.path
        }
    };

    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("read workbook failed: {}", path.display()))?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    ExportsDir::file_name_for(date)
                ),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Rebuild the workbook for `date` (default today) from current data.
pub(crate) async fn excel_regenerate(
    State(st): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    body: Option<Json<RegenerateRequest>>,
) -> Result<Json<RegenerateResponse>, ApiError> {
    st.db()?;
    let date = body
        .and_then(|Json(b)| b.date)
        .unwrap_or_else(|| today(&st));

    let out = st.regenerate_workbook(date).await?;
    info!(date = %date, admin = %admin.email, file = %out.file_name, "workbook regenerated");

    Ok(Json(RegenerateResponse {
        success: true,
        message: "Report generated successfully".to_string(),
        file_name: out.file_name,
        date,
        total_orders: out.report.total_orders,
    }))
}
