use chrono::{Duration, Utc};
use fp_config::AppConfig;
use fp_schemas::{DeliveryAddress, PaperSize, PrintSide, PrintType, UserRole};
use uuid::Uuid;

/// Regenerating a day writes the workbook and records the day's totals.
///
/// DB-backed test. Skips if FP_DATABASE_URL is not set.
#[tokio::test]
async fn regenerate_writes_workbook_and_daily_row() -> anyhow::Result<()> {
    let url = match std::env::var(fp_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: FP_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;
    fp_db::migrate(&pool).await?;

    let dir = tempfile::tempdir()?;
    let cfg = AppConfig {
        exports_dir: dir.path().join("exports"),
        ..AppConfig::default()
    };

    let tag = Uuid::new_v4().simple().to_string();
    let user = fp_db::upsert_user(
        &pool,
        &format!("report_{tag}@campus.test"),
        Some("Report Student"),
        UserRole::Student,
    )
    .await?;

    let order = fp_db::insert_order(
        &pool,
        &fp_db::NewOrder {
            order_id: Uuid::new_v4(),
            order_number: format!("FPR{}", &tag[..10]),
            user_id: user.id,
            total_paise: 1_500,
            delivery_address: DeliveryAddress::default(),
            items: vec![fp_db::NewOrderItem {
                file_name: "a.pdf".to_string(),
                file_url: "/uploads/a.pdf".to_string(),
                page_count: 5,
                copies: 1,
                print_type: PrintType::Bw,
                paper_size: PaperSize::A4,
                print_side: PrintSide::Single,
                page_range: None,
                price_paise: 1_500,
            }],
        },
    )
    .await?;

    let date = order
        .order
        .created_at_utc
        .with_timezone(&cfg.timezone)
        .date_naive();

    let out = fp_report::regenerate_daily_workbook(&pool, &cfg, date).await?;
    assert!(out.path.is_file());
    assert_eq!(out.file_name, fp_report::ExportsDir::file_name_for(date));
    assert!(out
        .report
        .lines
        .iter()
        .any(|l| l.order_number == order.order.order_number));

    let row = fp_db::fetch_daily_report(&pool, date)
        .await?
        .expect("daily row upserted");
    assert_eq!(row.file_name.as_deref(), Some(out.file_name.as_str()));
    assert!(row.total_orders >= 1);
    assert!(row.generated_at_utc <= Utc::now() + Duration::seconds(5));

    Ok(())
}
