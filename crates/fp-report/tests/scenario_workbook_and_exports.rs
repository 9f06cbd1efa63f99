use std::path::Path;
use std::sync::{Arc, Barrier};

use calamine::{open_workbook, Reader, Xlsx};
use chrono::{NaiveDate, Utc};
use fp_orders::Pricing;
use fp_report::{
    aggregate_day, write_orders_csv, write_workbook, DailyReport, ExpenseLine, ExportsDir,
    OrderLine, StatusLine,
};
use fp_schemas::{OrderStatus, PaymentStatus};

fn empty_report(date: NaiveDate) -> fp_report::DailyReport {
    aggregate_day(
        date,
        chrono_tz::Asia::Kolkata,
        Utc::now(),
        &[],
        &[],
        &Pricing::default(),
    )
}

#[test]
fn workbook_is_written_for_an_empty_day() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let exports = ExportsDir::new(dir.path().join("exports"));
    exports.ensure()?;

    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    assert!(exports.existing_path(date).is_none());

    let path = exports.path_for(date);
    write_workbook(&empty_report(date), &path)?;

    assert_eq!(exports.existing_path(date), Some(path.clone()));
    assert!(std::fs::metadata(&path)?.len() > 0);
    assert_eq!(std::fs::read_dir(dir.path().join("exports"))?.count(), 1);

    // Rewriting the same day replaces the file.
    write_workbook(&empty_report(date), &path)?;
    assert_eq!(exports.list_available()?.len(), 1);
    Ok(())
}

#[test]
fn listing_is_newest_first_and_ignores_other_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let exports = ExportsDir::new(dir.path());

    for d in [(2025, 1, 2), (2025, 3, 1), (2024, 12, 31)] {
        let date = NaiveDate::from_ymd_opt(d.0, d.1, d.2).unwrap();
        std::fs::write(exports.path_for(date), b"x")?;
    }
    std::fs::write(dir.path().join("readme.txt"), b"x")?;
    std::fs::write(dir.path().join("FlashPrint_Orders_2025-04-01.xlsx.tmp"), b"x")?;

    assert_eq!(
        exports.list_available()?,
        vec![
            "FlashPrint_Orders_2025-03-01.xlsx",
            "FlashPrint_Orders_2025-01-02.xlsx",
            "FlashPrint_Orders_2024-12-31.xlsx",
        ]
    );
    Ok(())
}

#[test]
fn missing_exports_dir_lists_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let exports = ExportsDir::new(dir.path().join("never-created"));
    assert!(exports.list_available()?.is_empty());
    Ok(())
}

#[test]
fn orders_csv_has_header_only_for_an_empty_day() -> anyhow::Result<()> {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let mut buf = Vec::new();
    write_orders_csv(&empty_report(date), &mut buf)?;

    let text = String::from_utf8(buf)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("S.No,Order Number,Order Date"));
    assert!(lines[0].ends_with("Delivery Address"));
    Ok(())
}

fn line(serial: u32, number: &str, status: OrderStatus, payment: PaymentStatus, amount_paise: i64) -> OrderLine {
    OrderLine {
        serial,
        order_number: number.to_string(),
        order_date: "14/03/2025".to_string(),
        order_time: "10:30 AM".to_string(),
        customer_name: "Asha".to_string(),
        customer_email: "asha@campus.test".to_string(),
        customer_phone: "N/A".to_string(),
        copies: 2,
        total_pages: 10,
        bw_pages: 10,
        color_pages: 0,
        amount_paise,
        payment_status: payment,
        status,
        delivery_address: "Hostel B, Room 12".to_string(),
        counted: status != OrderStatus::Cancelled,
    }
}

fn busy_report(date: NaiveDate) -> DailyReport {
    let mut r = empty_report(date);
    r.lines = vec![
        line(1, "FP-AAA111", OrderStatus::PaymentConfirmed, PaymentStatus::Completed, 3_000),
        line(2, "FP-BBB222", OrderStatus::Cancelled, PaymentStatus::Pending, 1_200),
    ];
    r.total_orders = 1;
    r.gross_revenue_paise = 3_000;
    r.payments_received_paise = 3_000;
    r.status_breakdown = vec![
        StatusLine {
            status: OrderStatus::PaymentConfirmed,
            count: 1,
        },
        StatusLine {
            status: OrderStatus::Cancelled,
            count: 1,
        },
    ];
    r.expenses = vec![ExpenseLine {
        category: "paper".to_string(),
        description: Some("A4 ream".to_string()),
        amount_paise: 25_050,
    }];
    r
}

fn sheet(path: &Path, name: &str) -> Vec<Vec<String>> {
    let mut wb: Xlsx<_> = open_workbook(path).unwrap();
    let range = wb.worksheet_range(name).unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn sheet_names(path: &Path) -> Vec<String> {
    let wb: Xlsx<_> = open_workbook(path).unwrap();
    wb.sheet_names()
}

#[test]
fn empty_day_has_only_summary_and_placeholder_row() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let path = dir.path().join(ExportsDir::file_name_for(date));
    write_workbook(&empty_report(date), &path)?;

    assert_eq!(sheet_names(&path), vec!["Daily Summary", "All Orders"]);
    let orders = sheet(&path, "All Orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0][1], "Order Number");
    assert_eq!(orders[1][0], "No orders for this date");
    Ok(())
}

#[test]
fn busy_day_workbook_lists_orders_statuses_and_expenses() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let path = dir.path().join(ExportsDir::file_name_for(date));
    write_workbook(&busy_report(date), &path)?;

    assert_eq!(
        sheet_names(&path),
        vec!["Daily Summary", "All Orders", "Status Breakdown", "Daily Expenses"]
    );

    let summary = sheet(&path, "Daily Summary");
    let value_of = |metric: &str| {
        summary
            .iter()
            .find(|row| row[0] == metric)
            .map(|row| row[1].clone())
            .unwrap()
    };
    assert_eq!(value_of("Total Orders"), "1");
    assert_eq!(value_of("Payments Received"), "₹30.00");
    assert_eq!(value_of("Payments Pending"), "₹0.00");

    let orders = sheet(&path, "All Orders");
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[1][1], "FP-AAA111");
    assert_eq!(orders[1][11], "30");
    assert_eq!(orders[1][12], "COMPLETED");
    assert_eq!(orders[1][13], "PAYMENT_CONFIRMED");
    assert_eq!(orders[2][1], "FP-BBB222");
    assert_eq!(orders[2][13], "CANCELLED");

    let statuses = sheet(&path, "Status Breakdown");
    assert_eq!(statuses[1], vec!["PAYMENT CONFIRMED", "1"]);
    assert_eq!(statuses[2], vec!["CANCELLED", "1"]);

    let expenses = sheet(&path, "Daily Expenses");
    assert_eq!(expenses[1], vec!["1", "PAPER", "A4 ream", "250.5"]);
    Ok(())
}

#[test]
fn expense_sheet_is_omitted_without_expenses() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let path = dir.path().join(ExportsDir::file_name_for(date));
    let mut report = busy_report(date);
    report.expenses.clear();
    write_workbook(&report, &path)?;

    assert_eq!(
        sheet_names(&path),
        vec!["Daily Summary", "All Orders", "Status Breakdown"]
    );
    Ok(())
}

#[test]
fn orders_csv_rows_carry_amounts_and_statuses() -> anyhow::Result<()> {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let mut buf = Vec::new();
    write_orders_csv(&busy_report(date), &mut buf)?;

    let mut rdr = csv::Reader::from_reader(buf.as_slice());
    let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);

    assert_eq!(&rows[0][1], "FP-AAA111");
    assert_eq!(&rows[0][11], "30.00");
    assert_eq!(&rows[0][12], "COMPLETED");
    assert_eq!(&rows[0][13], "PAYMENT_CONFIRMED");
    assert_eq!(&rows[0][14], "Hostel B, Room 12");
    assert_eq!(&rows[1][11], "12.00");
    assert_eq!(&rows[1][13], "CANCELLED");
    Ok(())
}

#[test]
fn concurrent_writers_for_one_day_both_succeed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let path = dir.path().join(ExportsDir::file_name_for(date));

    for _ in 0..20 {
        let barrier = Arc::new(Barrier::new(2));
        let writers: Vec<_> = [empty_report(date), busy_report(date)]
            .into_iter()
            .map(|report| {
                let barrier = Arc::clone(&barrier);
                let path = path.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    write_workbook(&report, &path)
                })
            })
            .collect();
        for w in writers {
            w.join().expect("writer thread panicked")?;
        }

        // Whichever writer renamed last, the file is a complete workbook.
        let names = sheet_names(&path);
        assert!(names.len() == 2 || names.len() == 4, "{names:?}");
    }

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec![ExportsDir::file_name_for(date)]);
    Ok(())
}
