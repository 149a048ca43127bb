use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::repo::{self, Reminder};
use super::scheduler::{parse_hh_mm, ReminderScheduler};

fn job_id(reminder_id: i64) -> String {
    format!("reminder-{reminder_id}")
}

fn delivery_body(text: &str) -> String {
    format!("🔔 Lembrete: {text}")
}

/// Validates the time, persists the reminder and arms its daily job. An
/// invalid `HH:MM` is rejected here, never scheduled.
pub async fn set_reminder(
    db: &PgPool,
    scheduler: &Arc<dyn ReminderScheduler>,
    user_id: Uuid,
    whatsapp_number: &str,
    text: &str,
    hh_mm: &str,
) -> anyhow::Result<Option<Reminder>> {
    if parse_hh_mm(hh_mm).is_none() {
        return Ok(None);
    }
    let reminder = repo::add(db, user_id, text, hh_mm).await?;
    scheduler
        .schedule(
            &job_id(reminder.id),
            hh_mm,
            whatsapp_number,
            &delivery_body(text),
        )
        .await?;
    Ok(Some(reminder))
}

/// Deactivates matching reminders and cancels their jobs. Returns how many
/// were deactivated.
pub async fn cancel_reminder(
    db: &PgPool,
    scheduler: &Arc<dyn ReminderScheduler>,
    user_id: Uuid,
    text: &str,
    hh_mm: &str,
) -> anyhow::Result<usize> {
    let ids = repo::deactivate(db, user_id, text, hh_mm).await?;
    for id in &ids {
        scheduler.cancel(&job_id(*id)).await?;
    }
    Ok(ids.len())
}

/// Re-arms every active reminder, called once at startup.
pub async fn schedule_active(
    db: &PgPool,
    scheduler: &Arc<dyn ReminderScheduler>,
) -> anyhow::Result<usize> {
    let reminders = repo::list_all_active(db).await?;
    let mut armed = 0;
    for r in &reminders {
        match scheduler
            .schedule(
                &job_id(r.id),
                &r.reminder_time,
                &r.whatsapp_number,
                &delivery_body(&r.reminder_text),
            )
            .await
        {
            Ok(()) => armed += 1,
            Err(e) => {
                warn!(error = %e, reminder = r.id, "could not arm stored reminder");
            }
        }
    }
    Ok(armed)
}
