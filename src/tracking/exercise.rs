use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, Time};
use uuid::Uuid;

use crate::nutrition::normalize::normalize;

/// MET per activity, Compendium of Physical Activities values.
const MET_VALUES: &[(&str, f64)] = &[
    ("corrida", 9.8),
    ("caminhada", 3.5),
    ("musculacao", 3.0),
    ("natacao", 6.0),
    ("ciclismo", 7.5),
    ("futebol", 7.0),
    ("basquete", 6.0),
    ("yoga", 2.5),
    ("danca", 4.5),
    ("aerobica", 5.0),
    ("eliptico", 5.0),
    ("remada", 4.8),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub activity_name: String,
    pub duration_minutes: i32,
    pub kcal_burned: f64,
    pub entry_date: Date,
    pub entry_time: Time,
}

/// `kcal = MET * kg * minutes / 200`. `None` when the activity is not in
/// the table, so the caller can ask for a more common exercise.
pub fn calories_burned(activity: &str, duration_minutes: f64, weight_kg: f64) -> Option<f64> {
    let key: String = normalize(activity).replace(' ', "");
    if key.is_empty() {
        return None;
    }
    let met = MET_VALUES
        .iter()
        .find(|(name, _)| key.contains(name) || name.contains(key.as_str()))
        .map(|(_, met)| *met)?;
    Some(met * weight_kg * duration_minutes / 200.0)
}

pub async fn add(
    db: &PgPool,
    user_id: Uuid,
    activity_name: &str,
    duration_minutes: i32,
    kcal_burned: f64,
) -> anyhow::Result<ExerciseEntry> {
    let entry = sqlx::query_as::<_, ExerciseEntry>(
        r#"
        INSERT INTO exercise_entries (user_id, activity_name, duration_minutes, kcal_burned)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, activity_name, duration_minutes, kcal_burned, entry_date, entry_time
        "#,
    )
    .bind(user_id)
    .bind(activity_name)
    .bind(duration_minutes)
    .bind(kcal_burned)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

pub async fn list_for_day(
    db: &PgPool,
    user_id: Uuid,
    day: Date,
) -> anyhow::Result<Vec<ExerciseEntry>> {
    let rows = sqlx::query_as::<_, ExerciseEntry>(
        r#"
        SELECT id, user_id, activity_name, duration_minutes, kcal_burned, entry_date, entry_time
        FROM exercise_entries
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_activity_estimates_calories() {
        let kcal = calories_burned("corrida", 30.0, 70.0).expect("known activity");
        assert!((kcal - 102.9).abs() < 1e-9);
    }

    #[test]
    fn activity_name_matches_loosely() {
        assert!(calories_burned("Corrida leve", 30.0, 70.0).is_some());
        assert!(calories_burned("natação", 45.0, 80.0).is_some());
    }

    #[test]
    fn unknown_activity_is_none() {
        assert!(calories_burned("pintar parede", 30.0, 70.0).is_none());
        assert!(calories_burned("", 30.0, 70.0).is_none());
    }
}
