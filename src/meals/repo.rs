use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, Time};
use uuid::Uuid;

/// A confirmed meal. Immutable once written except for explicit deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub description: String,
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    pub entry_date: Date,
    pub entry_time: Time,
}

pub async fn add(
    db: &PgPool,
    user_id: Uuid,
    description: &str,
    kcal: f64,
    protein_g: f64,
    fat_g: f64,
    carb_g: f64,
) -> anyhow::Result<MealEntry> {
    let entry = sqlx::query_as::<_, MealEntry>(
        r#"
        INSERT INTO food_entries (user_id, description, kcal, protein_g, fat_g, carb_g)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, description, kcal, protein_g, fat_g, carb_g, entry_date, entry_time
        "#,
    )
    .bind(user_id)
    .bind(description)
    .bind(kcal)
    .bind(protein_g)
    .bind(fat_g)
    .bind(carb_g)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

pub async fn list_for_day(db: &PgPool, user_id: Uuid, day: Date) -> anyhow::Result<Vec<MealEntry>> {
    let rows = sqlx::query_as::<_, MealEntry>(
        r#"
        SELECT id, user_id, description, kcal, protein_g, fat_g, carb_g, entry_date, entry_time
        FROM food_entries
        WHERE user_id = $1 AND entry_date = $2
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .bind(day)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn delete_by_id(db: &PgPool, id: i64) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM food_entries WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
