use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, Time};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeightEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub weight_kg: f64,
    pub entry_date: Date,
    pub entry_time: Time,
}

pub async fn add(db: &PgPool, user_id: Uuid, weight_kg: f64) -> anyhow::Result<WeightEntry> {
    let entry = sqlx::query_as::<_, WeightEntry>(
        r#"
        INSERT INTO weight_entries (user_id, weight_kg)
        VALUES ($1, $2)
        RETURNING id, user_id, weight_kg, entry_date, entry_time
        "#,
    )
    .bind(user_id)
    .bind(weight_kg)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

pub async fn latest(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<f64>> {
    let row: Option<(f64,)> = sqlx::query_as(
        r#"
        SELECT weight_kg
        FROM weight_entries
        WHERE user_id = $1
        ORDER BY entry_date DESC, entry_time DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(|(w,)| w))
}
