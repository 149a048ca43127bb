use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: i64,
    pub user_id: Uuid,
    pub reminder_text: String,
    /// `HH:MM`, validated before insert.
    pub reminder_time: String,
    pub is_active: bool,
}

/// An active reminder joined with its delivery address.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveReminder {
    pub id: i64,
    pub reminder_text: String,
    pub reminder_time: String,
    pub whatsapp_number: String,
}

pub async fn add(
    db: &PgPool,
    user_id: Uuid,
    reminder_text: &str,
    reminder_time: &str,
) -> anyhow::Result<Reminder> {
    let reminder = sqlx::query_as::<_, Reminder>(
        r#"
        INSERT INTO reminders (user_id, reminder_text, reminder_time, is_active)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id, user_id, reminder_text, reminder_time, is_active
        "#,
    )
    .bind(user_id)
    .bind(reminder_text)
    .bind(reminder_time)
    .fetch_one(db)
    .await?;
    Ok(reminder)
}

pub async fn list_active_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Reminder>> {
    let rows = sqlx::query_as::<_, Reminder>(
        r#"
        SELECT id, user_id, reminder_text, reminder_time, is_active
        FROM reminders
        WHERE user_id = $1 AND is_active = TRUE
        ORDER BY reminder_time ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_all_active(db: &PgPool) -> anyhow::Result<Vec<ActiveReminder>> {
    let rows = sqlx::query_as::<_, ActiveReminder>(
        r#"
        SELECT r.id, r.reminder_text, r.reminder_time, u.whatsapp_number
        FROM reminders r
        JOIN users u ON u.id = r.user_id
        WHERE r.is_active = TRUE
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Deactivates by (user, text, time); returns the ids of the rows touched so
/// their scheduled jobs can be cancelled.
pub async fn deactivate(
    db: &PgPool,
    user_id: Uuid,
    reminder_text: &str,
    reminder_time: &str,
) -> anyhow::Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        UPDATE reminders
        SET is_active = FALSE
        WHERE user_id = $1 AND reminder_text = $2 AND reminder_time = $3 AND is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(reminder_text)
    .bind(reminder_time)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
