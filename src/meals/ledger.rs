use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::nutrition::ResolvedFood;
use crate::tracking::goals;

use super::repo::{self, MealEntry};

/// Persistence seam for confirmed meals. The calorie target read lives here
/// too, since goal feedback accompanies every commit.
#[async_trait]
pub trait MealLedger: Send + Sync {
    /// Writes the confirmed option as-is. Nutrient values were fixed when
    /// the option was resolved and are never recomputed.
    async fn add(&self, user_id: Uuid, food: &ResolvedFood) -> anyhow::Result<MealEntry>;
    async fn list_for_day(&self, user_id: Uuid, day: Date) -> anyhow::Result<Vec<MealEntry>>;
    /// Returns how many rows were removed; 0 when the entry is already gone.
    async fn delete(&self, id: i64) -> anyhow::Result<u64>;
    async fn calorie_target(&self, user_id: Uuid) -> anyhow::Result<Option<f64>>;
}

pub struct PgMealLedger {
    db: PgPool,
}

impl PgMealLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealLedger for PgMealLedger {
    async fn add(&self, user_id: Uuid, food: &ResolvedFood) -> anyhow::Result<MealEntry> {
        repo::add(
            &self.db,
            user_id,
            &food.description,
            food.kcal,
            food.protein_g,
            food.fat_g,
            food.carb_g,
        )
        .await
    }

    async fn list_for_day(&self, user_id: Uuid, day: Date) -> anyhow::Result<Vec<MealEntry>> {
        repo::list_for_day(&self.db, user_id, day).await
    }

    async fn delete(&self, id: i64) -> anyhow::Result<u64> {
        repo::delete_by_id(&self.db, id).await
    }

    async fn calorie_target(&self, user_id: Uuid) -> anyhow::Result<Option<f64>> {
        Ok(goals::get(&self.db, user_id, goals::CALORIE_INTAKE)
            .await?
            .map(|g| g.target_value))
    }
}
