use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

pub const CALORIE_INTAKE: &str = "calorie_intake";
pub const WEIGHT_LOSS: &str = "weight_loss";
pub const EXERCISE_FREQUENCY: &str = "exercise_frequency";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: i64,
    pub user_id: Uuid,
    pub goal_type: String,
    pub target_value: f64,
    pub start_date: Date,
}

/// Maps the free-form goal entity onto a canonical goal type; unknown kinds
/// are stored verbatim.
pub fn canonical_goal_type(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "calorias" | "caloria" | "calorie_intake" => CALORIE_INTAKE.to_string(),
        "peso" | "weight_loss" => WEIGHT_LOSS.to_string(),
        "exercicio" | "exercicios" | "exercício" | "exercícios" | "exercise_frequency" => {
            EXERCISE_FREQUENCY.to_string()
        }
        other => other.to_string(),
    }
}

pub async fn set(
    db: &PgPool,
    user_id: Uuid,
    goal_type: &str,
    target_value: f64,
) -> anyhow::Result<Goal> {
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (user_id, goal_type, target_value, start_date)
        VALUES ($1, $2, $3, CURRENT_DATE)
        ON CONFLICT (user_id, goal_type)
        DO UPDATE SET target_value = EXCLUDED.target_value, start_date = EXCLUDED.start_date
        RETURNING id, user_id, goal_type, target_value, start_date
        "#,
    )
    .bind(user_id)
    .bind(goal_type)
    .bind(target_value)
    .fetch_one(db)
    .await?;
    Ok(goal)
}

pub async fn get(db: &PgPool, user_id: Uuid, goal_type: &str) -> anyhow::Result<Option<Goal>> {
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        SELECT id, user_id, goal_type, target_value, start_date
        FROM goals
        WHERE user_id = $1 AND goal_type = $2
        "#,
    )
    .bind(user_id)
    .bind(goal_type)
    .fetch_optional(db)
    .await?;
    Ok(goal)
}
