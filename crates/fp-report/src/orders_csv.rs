use anyhow::{Context, Result};
use fp_orders::format_amount;
use std::io::Write;

use crate::workbook::ORDER_HEADERS;
use crate::DailyReport;

/// The "All Orders" sheet as CSV, same columns. Amounts are in rupees with
/// two decimals.
pub fn write_orders_csv<W: Write>(report: &DailyReport, writer: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(ORDER_HEADERS)
        .context("write csv header failed")?;

    for l in &report.lines {
        w.write_record([
            l.serial.to_string(),
            l.order_number.clone(),
            l.order_date.clone(),
            l.order_time.clone(),
            l.customer_name.clone(),
            l.customer_email.clone(),
            l.customer_phone.clone(),
            l.copies.to_string(),
            l.total_pages.to_string(),
            l.bw_pages.to_string(),
            l.color_pages.to_string(),
            format_amount(l.amount_paise),
            l.payment_status.as_str().to_string(),
            l.status.as_str().to_string(),
            l.delivery_address.clone(),
        ])
        .with_context(|| format!("write csv row failed: {}", l.order_number))?;
    }

    w.flush().context("flush csv failed")?;
    Ok(())
}
