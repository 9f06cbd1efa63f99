use anyhow::{Context, Result};
use chrono::NaiveDate;
use fp_schemas::DailyExpense;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount_paise: i64,
    pub description: Option<String>,
    /// Email of the admin who recorded it.
    pub created_by: Option<String>,
}

fn expense_from_row(row: &PgRow) -> Result<DailyExpense> {
    Ok(DailyExpense {
        id: row.try_get("expense_id")?,
        date: row.try_get("expense_date")?,
        category: row.try_get("category")?,
        amount_paise: row.try_get("amount_paise")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

pub async fn insert_expense(pool: &PgPool, e: &NewExpense) -> Result<DailyExpense> {
    let row = sqlx::query(
        r#"
        insert into daily_expenses (
          expense_id, expense_date, category, amount_paise, description, created_by
        ) values ($1, $2, $3, $4, $5, $6)
        returning expense_id, expense_date, category, amount_paise, description,
                  created_by, created_at_utc
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(e.date)
    .bind(e.category.trim())
    .bind(e.amount_paise)
    .bind(&e.description)
    .bind(&e.created_by)
    .fetch_one(pool)
    .await
    .context("insert_expense failed")?;

    expense_from_row(&row)
}

/// Returns the deleted row, or `None` when the id was unknown.
pub async fn delete_expense(pool: &PgPool, expense_id: Uuid) -> Result<Option<DailyExpense>> {
    let row = sqlx::query(
        r#"
        delete from daily_expenses
        where expense_id = $1
        returning expense_id, expense_date, category, amount_paise, description,
                  created_by, created_at_utc
        "#,
    )
    .bind(expense_id)
    .fetch_optional(pool)
    .await
    .context("delete_expense failed")?;

    row.as_ref().map(expense_from_row).transpose()
}

/// Expenses recorded against `date`, oldest first.
pub async fn list_expenses_for_day(pool: &PgPool, date: NaiveDate) -> Result<Vec<DailyExpense>> {
    let rows = sqlx::query(
        r#"
        select expense_id, expense_date, category, amount_paise, description,
               created_by, created_at_utc
        from daily_expenses
        where expense_date = $1
        order by created_at_utc, expense_id
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .context("list_expenses_for_day failed")?;

    rows.iter().map(expense_from_row).collect()
}
