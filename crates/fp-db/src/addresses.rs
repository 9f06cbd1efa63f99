use anyhow::{Context, Result};
use fp_schemas::{Address, AddressType, DeliveryAddress};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const ADDRESS_COLUMNS: &str = r#"
    user_id, address_type, hostel_name, room_number, department_name,
    cabin_number, building_name, floor_number, landmark, notes, updated_at_utc
"#;

fn address_from_row(row: &PgRow) -> Result<Address> {
    let address_type = row
        .try_get::<Option<String>, _>("address_type")?
        .map(|s| AddressType::parse(&s))
        .transpose()?;

    Ok(Address {
        user_id: row.try_get("user_id")?,
        location: DeliveryAddress {
            address_type,
            hostel_name: row.try_get("hostel_name")?,
            room_number: row.try_get("room_number")?,
            department_name: row.try_get("department_name")?,
            cabin_number: row.try_get("cabin_number")?,
            building_name: row.try_get("building_name")?,
            floor_number: row.try_get("floor_number")?,
            landmark: row.try_get("landmark")?,
            notes: row.try_get("notes")?,
        },
        updated_at_utc: row.try_get("updated_at_utc")?,
    })
}

/// Replace the user's saved address.
pub async fn upsert_address(
    pool: &PgPool,
    user_id: Uuid,
    location: &DeliveryAddress,
) -> Result<Address> {
    let row = sqlx::query(&format!(
        r#"
        insert into addresses (
          user_id, address_type, hostel_name, room_number, department_name,
          cabin_number, building_name, floor_number, landmark, notes
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        on conflict (user_id) do update set
          address_type = excluded.address_type,
          hostel_name = excluded.hostel_name,
          room_number = excluded.room_number,
          department_name = excluded.department_name,
          cabin_number = excluded.cabin_number,
          building_name = excluded.building_name,
          floor_number = excluded.floor_number,
          landmark = excluded.landmark,
          notes = excluded.notes,
          updated_at_utc = now()
        returning {ADDRESS_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(location.address_type.map(|t| t.as_str()))
    .bind(&location.hostel_name)
    .bind(&location.room_number)
    .bind(&location.department_name)
    .bind(&location.cabin_number)
    .bind(&location.building_name)
    .bind(&location.floor_number)
    .bind(&location.landmark)
    .bind(&location.notes)
    .fetch_one(pool)
    .await
    .context("upsert_address failed")?;

    address_from_row(&row)
}

pub async fn fetch_address(pool: &PgPool, user_id: Uuid) -> Result<Option<Address>> {
    let row = sqlx::query(&format!(
        "select {ADDRESS_COLUMNS} from addresses where user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("fetch_address failed")?;

    row.as_ref().map(address_from_row).transpose()
}
