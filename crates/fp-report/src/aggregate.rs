use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use fp_db::{DailyReportRow, ReportOrder};
use fp_orders::{format_delivery_address, printed_pages, Pricing};
use fp_schemas::{DailyExpense, OrderStatus, PaymentStatus, PrintType};
use serde::Serialize;

/// One row of the "All Orders" sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub serial: u32,
    pub order_number: String,
    /// `dd/mm/yyyy`, local.
    pub order_date: String,
    /// `hh:mm AM`, local.
    pub order_time: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub copies: i64,
    pub total_pages: i64,
    pub bw_pages: i64,
    pub color_pages: i64,
    pub amount_paise: i64,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub delivery_address: String,
    /// False for cancelled orders, which are listed but not totalled.
    pub counted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub status: OrderStatus,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseLine {
    pub category: String,
    pub description: Option<String>,
    pub amount_paise: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub generated_at_utc: DateTime<Utc>,
    /// `dd/mm/yyyy hh:mm AM`, local.
    pub generated_at_local: String,
    pub pricing: Pricing,

    pub lines: Vec<OrderLine>,
    pub total_orders: u32,
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

    /// Pipeline order, then CANCELLED; statuses with no orders are omitted.
    pub status_breakdown: Vec<StatusLine>,
    pub expenses: Vec<ExpenseLine>,
}

impl DailyReport {
    pub fn total_costs_paise(&self) -> i64 {
        self.production_cost_paise + self.other_expenses_paise
    }

    /// Net profit over gross revenue, in percent. `None` without revenue.
    pub fn profit_margin_pct(&self) -> Option<f64> {
        if self.gross_revenue_paise <= 0 {
            return None;
        }
        Some(self.net_profit_paise as f64 / self.gross_revenue_paise as f64 * 100.0)
    }

    /// `"42.5%"`, or `"0%"` without revenue.
    pub fn profit_margin_label(&self) -> String {
        match self.profit_margin_pct() {
            Some(p) => format!("{p:.1}%"),
            None => "0%".to_string(),
        }
    }

    pub fn to_row(&self, file_name: Option<String>) -> DailyReportRow {
        DailyReportRow {
            report_date: self.date,
            total_orders: i32::try_from(self.total_orders).unwrap_or(i32::MAX),
            total_copies: self.total_copies,
            total_pages: self.total_pages,
            bw_pages: self.bw_pages,
            color_pages: self.color_pages,
            gross_revenue_paise: self.gross_revenue_paise,
            payments_received_paise: self.payments_received_paise,
            payments_pending_paise: self.payments_pending_paise,
            production_cost_paise: self.production_cost_paise,
            other_expenses_paise: self.other_expenses_paise,
            net_profit_paise: self.net_profit_paise,
            file_name,
            generated_at_utc: self.generated_at_utc,
        }
    }
}

/// Fold one day's orders and expenses into report totals.
///
/// Pages are printed pages: the page-range selection (or the whole document)
/// times copies. Cancelled orders are listed and appear in the status
/// breakdown, but add nothing to volume, revenue or cost.
pub fn aggregate_day(
    date: NaiveDate,
    tz: Tz,
    generated_at_utc: DateTime<Utc>,
    orders: &[ReportOrder],
    expenses: &[DailyExpense],
    pricing: &Pricing,
) -> DailyReport {
    let mut r = DailyReport {
        date,
        generated_at_utc,
        generated_at_local: generated_at_utc
            .with_timezone(&tz)
            .format("%d/%m/%Y %I:%M %p")
            .to_string(),
        pricing: *pricing,
        lines: Vec::with_capacity(orders.len()),
        total_orders: 0,
        total_copies: 0,
        total_pages: 0,
        bw_pages: 0,
        color_pages: 0,
        gross_revenue_paise: 0,
        payments_received_paise: 0,
        payments_pending_paise: 0,
        production_cost_paise: 0,
        other_expenses_paise: 0,
        net_profit_paise: 0,
        status_breakdown: Vec::new(),
        expenses: Vec::with_capacity(expenses.len()),
    };

    let mut status_counts = [0u32; OrderStatus::ALL.len()];

    for (idx, ro) in orders.iter().enumerate() {
        let order = &ro.order.order;

        let mut copies = 0i64;
        let mut bw = 0i64;
        let mut color = 0i64;
        for item in &ro.order.items {
            let page_count = u32::try_from(item.page_count).unwrap_or(0);
            let item_copies = i64::from(item.copies.max(0));
            let pages = i64::from(printed_pages(page_count, item.page_range.as_deref())) * item_copies;
            copies += item_copies;
            match item.print_type {
                PrintType::Bw => bw += pages,
                PrintType::Color => color += pages,
            }
        }

        if let Some(pos) = OrderStatus::ALL.iter().position(|s| *s == order.status) {
            status_counts[pos] += 1;
        }

        let counted = order.status != OrderStatus::Cancelled;
        if counted {
            r.total_orders += 1;
            r.total_copies += copies;
            r.bw_pages += bw;
            r.color_pages += color;
            r.gross_revenue_paise += order.total_paise;
            match order.payment_status {
                PaymentStatus::Completed => r.payments_received_paise += order.total_paise,
                PaymentStatus::Pending => r.payments_pending_paise += order.total_paise,
                PaymentStatus::Failed => {}
            }
        }

        let local = order.created_at_utc.with_timezone(&tz);
        r.lines.push(OrderLine {
            serial: (idx + 1) as u32,
            order_number: order.order_number.clone(),
            order_date: local.format("%d/%m/%Y").to_string(),
            order_time: local.format("%I:%M %p").to_string(),
            customer_name: ro
                .customer_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            customer_email: ro.customer_email.clone(),
            customer_phone: ro
                .customer_phone
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            copies,
            total_pages: bw + color,
            bw_pages: bw,
            color_pages: color,
            amount_paise: order.total_paise,
            payment_status: order.payment_status,
            status: order.status,
            delivery_address: format_delivery_address(&order.delivery_address),
            counted,
        });
    }

    r.total_pages = r.bw_pages + r.color_pages;
    r.production_cost_paise =
        r.bw_pages * pricing.bw_cost_paise + r.color_pages * pricing.color_cost_paise;

    for e in expenses {
        r.other_expenses_paise += e.amount_paise;
        r.expenses.push(ExpenseLine {
            category: e.category.clone(),
            description: e.description.clone(),
            amount_paise: e.amount_paise,
        });
    }

    r.net_profit_paise = r.gross_revenue_paise - r.production_cost_paise - r.other_expenses_paise;

    r.status_breakdown = OrderStatus::ALL
        .iter()
        .zip(status_counts)
        .filter(|(_, n)| *n > 0)
        .map(|(s, n)| StatusLine {
            status: *s,
            count: n,
        })
        .collect();

    r
}
