use chrono::{NaiveDate, TimeZone, Utc};
use fp_db::{OrderWithItems, ReportOrder};
use fp_orders::Pricing;
use fp_schemas::{
    AddressType, DailyExpense, DeliveryAddress, Order, OrderItem, OrderStatus, PaperSize,
    PaymentStatus, PrintSide, PrintType,
};
use fp_report::aggregate_day;
use uuid::Uuid;

fn item(order_id: Uuid, pages: i32, copies: i32, t: PrintType, range: Option<&str>) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4(),
        order_id,
        position: 0,
        file_name: "doc.pdf".to_string(),
        file_url: "/uploads/doc.pdf".to_string(),
        page_count: pages,
        copies,
        print_type: t,
        paper_size: PaperSize::A4,
        print_side: PrintSide::Single,
        page_range: range.map(str::to_string),
        price_paise: 0,
    }
}

fn order(
    number: &str,
    hour_utc: u32,
    status: OrderStatus,
    payment: PaymentStatus,
    total_paise: i64,
    items: Vec<(i32, i32, PrintType, Option<&str>)>,
) -> ReportOrder {
    let id = Uuid::new_v4();
    let created = Utc.with_ymd_and_hms(2025, 3, 14, hour_utc, 0, 0).unwrap();
    ReportOrder {
        order: OrderWithItems {
            order: Order {
                id,
                order_number: number.to_string(),
                user_id: Uuid::new_v4(),
                status,
                payment_status: payment,
                payment_id: None,
                total_paise,
                delivery_address: DeliveryAddress {
                    address_type: Some(AddressType::Hostel),
                    hostel_name: Some("Hostel B".to_string()),
                    room_number: Some("12".to_string()),
                    ..Default::default()
                },
                created_at_utc: created,
                updated_at_utc: created,
                paid_at_utc: None,
                delivered_at_utc: None,
            },
            items: items
                .into_iter()
                .map(|(p, c, t, r)| item(id, p, c, t, r))
                .collect(),
        },
        customer_name: Some("Asha".to_string()),
        customer_email: "asha@campus.test".to_string(),
        customer_phone: None,
    }
}

fn expense(amount_paise: i64) -> DailyExpense {
    DailyExpense {
        id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        category: "paper".to_string(),
        amount_paise,
        description: None,
        created_by: None,
        created_at_utc: Utc::now(),
    }
}

#[test]
fn totals_use_printed_pages_and_skip_cancelled_orders() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let orders = vec![
        // 10 bw pages x 2 copies + pages 1-3 color x 1 copy
        order(
            "FP-A",
            4,
            OrderStatus::Delivered,
            PaymentStatus::Completed,
            7_600,
            vec![
                (10, 2, PrintType::Bw, None),
                (8, 1, PrintType::Color, Some("1-3")),
            ],
        ),
        order(
            "FP-B",
            5,
            OrderStatus::Pending,
            PaymentStatus::Pending,
            1_500,
            vec![(5, 1, PrintType::Bw, None)],
        ),
        order(
            "FP-C",
            6,
            OrderStatus::Cancelled,
            PaymentStatus::Pending,
            9_900,
            vec![(33, 1, PrintType::Bw, None)],
        ),
    ];
    let expenses = vec![expense(2_000), expense(500)];
    let pricing = Pricing::default();

    let r = aggregate_day(
        date,
        chrono_tz::Asia::Kolkata,
        Utc::now(),
        &orders,
        &expenses,
        &pricing,
    );

    assert_eq!(r.lines.len(), 3);
    assert!(!r.lines[2].counted);
    assert_eq!(r.total_orders, 2);
    assert_eq!(r.total_copies, 4);
    assert_eq!(r.bw_pages, 25);
    assert_eq!(r.color_pages, 3);
    assert_eq!(r.total_pages, 28);

    assert_eq!(r.gross_revenue_paise, 9_100);
    assert_eq!(r.payments_received_paise, 7_600);
    assert_eq!(r.payments_pending_paise, 1_500);

    // 25 x 1.00 + 3 x 5.00
    assert_eq!(r.production_cost_paise, 4_000);
    assert_eq!(r.other_expenses_paise, 2_500);
    assert_eq!(r.net_profit_paise, 9_100 - 4_000 - 2_500);
    assert_eq!(r.profit_margin_label(), "28.6%");

    let statuses: Vec<_> = r.status_breakdown.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![OrderStatus::Pending, OrderStatus::Delivered, OrderStatus::Cancelled]
    );
}

#[test]
fn order_lines_are_local_time_with_contact_fallbacks() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let mut o = order(
        "FP-D",
        4,
        OrderStatus::Printing,
        PaymentStatus::Completed,
        300,
        vec![(1, 1, PrintType::Bw, None)],
    );
    o.customer_name = Some("  ".to_string());

    let r = aggregate_day(
        date,
        chrono_tz::Asia::Kolkata,
        Utc::now(),
        &[o],
        &[],
        &Pricing::default(),
    );

    let line = &r.lines[0];
    assert_eq!(line.serial, 1);
    assert_eq!(line.order_date, "14/03/2025");
    assert_eq!(line.order_time, "09:30 AM");
    assert_eq!(line.customer_name, "Unknown");
    assert_eq!(line.customer_phone, "N/A");
    assert_eq!(line.delivery_address, "Hostel B, Room 12");
}

#[test]
fn empty_day_has_zero_margin() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let r = aggregate_day(
        date,
        chrono_tz::Asia::Kolkata,
        Utc::now(),
        &[],
        &[],
        &Pricing::default(),
    );
    assert_eq!(r.total_orders, 0);
    assert_eq!(r.net_profit_paise, 0);
    assert_eq!(r.profit_margin_pct(), None);
    assert_eq!(r.profit_margin_label(), "0%");
    assert!(r.status_breakdown.is_empty());
}
