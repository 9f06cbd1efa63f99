//! Request and response types for the fp-daemon HTTP endpoints.
//!
//! Response types derive `Serialize`; request types derive `Deserialize`.
//! Tests decode responses as `serde_json::Value`.

use chrono::NaiveDate;
use fp_db::OrderWithItems;
use fp_orders::{parse_rupees, AmountError};
use fp_schemas::{
    CustomerRef, DailyExpense, Order, OrderItem, OrderStatus, PaymentStatus, StatusHistoryEntry,
    User, UserRole,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub db_configured: bool,
    pub config_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let per = i64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: (total + per - 1) / per,
        }
    }
}

/// `?page=&limit=` with the storefront's defaults.
pub(crate) fn page_or_default(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(20).clamp(1, 100))
}

// ---------------------------------------------------------------------------
// /v1/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyOrdersResponse {
    pub orders: Vec<OrderWithItems>,
    pub pagination: Pagination,
}

/// Full order view: items, newest-first history and the customer.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub customer: Option<CustomerRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentLinkResponse {
    pub order_number: String,
    pub amount_paise: i64,
    /// Rupees with two decimals, as placed in the link.
    pub amount: String,
    pub upi_vpa: String,
    pub merchant_name: String,
    pub upi_link: String,
    pub payment_status: PaymentStatus,
}

// ---------------------------------------------------------------------------
// /v1/admin/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_role: Option<UserRole>,
    /// Inclusive local calendar day.
    pub date_from: Option<NaiveDate>,
    /// Inclusive local calendar day.
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOrdersResponse {
    pub orders: Vec<fp_db::OrderListRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUsersResponse {
    pub users: Vec<fp_db::UserListRow>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// /v1/profile, /v1/setup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSetupResponse {
    pub user: User,
    pub address: fp_schemas::Address,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminRequest {
    #[serde(default)]
    pub setup_key: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeMeRequest {
    #[serde(default)]
    pub setup_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// /v1/admin/reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReportResponse {
    #[serde(flatten)]
    pub report: fp_report::DailyReport,
    /// The day's expense rows with ids, for the delete action.
    pub expense_records: Vec<DailyExpense>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpenseRequest {
    pub date: NaiveDate,
    pub category: String,
    pub amount: RupeeAmount,
    pub description: Option<String>,
}

/// Rupees as a decimal string (`"250.50"`) or a JSON number (`250.5`).
///
/// Numbers are taken by their shortest decimal rendering, so both forms go
/// through the same exact parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RupeeAmount {
    Text(String),
    Number(serde_json::Number),
}

impl RupeeAmount {
    pub fn to_paise(&self) -> Result<i64, AmountError> {
        match self {
            RupeeAmount::Text(s) => parse_rupees(s),
            RupeeAmount::Number(n) => parse_rupees(&n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcelQuery {
    pub action: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcelListResponse {
    pub reports: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegenerateRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegenerateResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
    pub date: NaiveDate,
    pub total_orders: u32,
}
