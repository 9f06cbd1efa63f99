use anyhow::{Context, Result};
use fp_orders::format_inr;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::io::Write;
use std::path::Path;

use crate::DailyReport;

pub(crate) const ORDER_HEADERS: [&str; 15] = [
    "S.No",
    "Order Number",
    "Order Date",
    "Order Time",
    "Customer Name",
    "Customer Email",
    "Customer Phone",
    "Copies",
    "Total Pages",
    "B&W Pages",
    "Color Pages",
    "Amount (₹)",
    "Payment Status",
    "Order Status",
    "Delivery Address",
];

const ORDER_WIDTHS: [f64; 15] = [
    6.0, 15.0, 12.0, 10.0, 20.0, 28.0, 15.0, 8.0, 12.0, 12.0, 12.0, 12.0, 15.0, 18.0, 35.0,
];

enum SummaryValue {
    Text(String),
    Count(i64),
}

fn summary_rows(r: &DailyReport) -> Vec<(&'static str, SummaryValue)> {
    use SummaryValue::{Count, Text};
    let blank = || ("", Text(String::new()));
    vec![
        ("Report Date", Text(r.date.format("%d %B %Y, %A").to_string())),
        ("Generated At", Text(r.generated_at_local.clone())),
        blank(),
        ("═══ ORDER SUMMARY ═══", Text(String::new())),
        ("Total Orders", Count(i64::from(r.total_orders))),
        ("Total Copies", Count(r.total_copies)),
        ("Total Pages Printed", Count(r.total_pages)),
        ("B&W Pages", Count(r.bw_pages)),
        ("Color Pages", Count(r.color_pages)),
        blank(),
        ("═══ REVENUE BREAKDOWN ═══", Text(String::new())),
        ("Gross Revenue", Text(format_inr(r.gross_revenue_paise))),
        ("Payments Received", Text(format_inr(r.payments_received_paise))),
        ("Payments Pending", Text(format_inr(r.payments_pending_paise))),
        blank(),
        ("═══ COST ANALYSIS ═══", Text(String::new())),
        ("Production Cost", Text(format_inr(r.production_cost_paise))),
        ("Other Expenses", Text(format_inr(r.other_expenses_paise))),
        ("Total Costs", Text(format_inr(r.total_costs_paise()))),
        blank(),
        ("═══ PROFIT ═══", Text(String::new())),
        ("NET PROFIT", Text(format_inr(r.net_profit_paise))),
        ("Profit Margin", Text(r.profit_margin_label())),
        blank(),
        ("═══ PRICING CONFIG ═══", Text(String::new())),
        ("B&W Price/Page", Text(format_inr(r.pricing.bw_price_paise))),
        ("Color Price/Page", Text(format_inr(r.pricing.color_price_paise))),
        ("B&W Cost/Page", Text(format_inr(r.pricing.bw_cost_paise))),
        ("Color Cost/Page", Text(format_inr(r.pricing.color_cost_paise))),
    ]
}

fn rupees(paise: i64) -> f64 {
    paise as f64 / 100.0
}

fn write_header(ws: &mut Worksheet, headers: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, h) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *h, bold)?;
    }
    Ok(())
}

fn build(r: &DailyReport) -> Result<Workbook, XlsxError> {
    let mut wb = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");

    // Daily Summary
    {
        let ws = wb.add_worksheet();
        ws.set_name("Daily Summary")?;
        write_header(ws, &["Metric", "Value"], &bold)?;
        for (i, (metric, value)) in summary_rows(r).into_iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_string(row, 0, metric)?;
            match value {
                SummaryValue::Text(s) => {
                    ws.write_string(row, 1, s)?;
                }
                SummaryValue::Count(n) => {
                    ws.write_number(row, 1, n as f64)?;
                }
            }
        }
        ws.set_column_width(0, 30)?;
        ws.set_column_width(1, 25)?;
    }

    // All Orders
    {
        let ws = wb.add_worksheet();
        ws.set_name("All Orders")?;
        write_header(ws, &ORDER_HEADERS, &bold)?;
        if r.lines.is_empty() {
            ws.write_string(1, 0, "No orders for this date")?;
        }
        for (i, l) in r.lines.iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_number(row, 0, f64::from(l.serial))?;
            ws.write_string(row, 1, &l.order_number)?;
            ws.write_string(row, 2, &l.order_date)?;
            ws.write_string(row, 3, &l.order_time)?;
            ws.write_string(row, 4, &l.customer_name)?;
            ws.write_string(row, 5, &l.customer_email)?;
            ws.write_string(row, 6, &l.customer_phone)?;
            ws.write_number(row, 7, l.copies as f64)?;
            ws.write_number(row, 8, l.total_pages as f64)?;
            ws.write_number(row, 9, l.bw_pages as f64)?;
            ws.write_number(row, 10, l.color_pages as f64)?;
            ws.write_number_with_format(row, 11, rupees(l.amount_paise), &money)?;
            ws.write_string(row, 12, l.payment_status.as_str())?;
            ws.write_string(row, 13, l.status.as_str())?;
            ws.write_string(row, 14, &l.delivery_address)?;
        }
        if !r.lines.is_empty() {
            for (col, w) in ORDER_WIDTHS.iter().enumerate() {
                ws.set_column_width(col as u16, *w)?;
            }
        }
    }

    if !r.status_breakdown.is_empty() {
        let ws = wb.add_worksheet();
        ws.set_name("Status Breakdown")?;
        write_header(ws, &["Status", "Count"], &bold)?;
        for (i, s) in r.status_breakdown.iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_string(row, 0, s.status.as_str().replace('_', " "))?;
            ws.write_number(row, 1, f64::from(s.count))?;
        }
        ws.set_column_width(0, 25)?;
        ws.set_column_width(1, 10)?;
    }

    if !r.expenses.is_empty() {
        let ws = wb.add_worksheet();
        ws.set_name("Daily Expenses")?;
        write_header(ws, &["S.No", "Category", "Description", "Amount (₹)"], &bold)?;
        for (i, e) in r.expenses.iter().enumerate() {
            let row = i as u32 + 1;
            ws.write_number(row, 0, f64::from(row))?;
            ws.write_string(row, 1, e.category.to_uppercase())?;
            ws.write_string(row, 2, e.description.as_deref().unwrap_or("-"))?;
            ws.write_number_with_format(row, 3, rupees(e.amount_paise), &money)?;
        }
        for (col, w) in [6.0, 15.0, 35.0, 12.0].iter().enumerate() {
            ws.set_column_width(col as u16, *w)?;
        }
    }

    Ok(wb)
}

/// Write the day's workbook to `path`, replacing any previous file.
///
/// Each call writes its own temp file next to `path` and renames it into
/// place, so concurrent writers never share a partial file and a download
/// only ever sees a complete workbook.
pub fn write_workbook(report: &DailyReport, path: &Path) -> Result<()> {
    let bytes = build(report)
        .and_then(|mut wb| wb.save_to_buffer())
        .context("build workbook failed")?;

    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".FlashPrint_Orders_")
        .suffix(".xlsx.tmp")
        .tempfile_in(dir)
        .with_context(|| format!("create temp workbook failed in {}", dir.display()))?;
    tmp.write_all(&bytes)
        .with_context(|| format!("write workbook failed: {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("move workbook into place failed: {}", path.display()))?;
    Ok(())
}
