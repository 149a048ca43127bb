use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// One row of the reference nutrient table, per 100g. Read-only at request
/// time; seeded once by the `seed-taco` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutrientRecord {
    pub name: String,
    pub kcal_per_100g: f64,
    pub protein_g_per_100g: f64,
    pub fat_g_per_100g: f64,
    pub carb_g_per_100g: f64,
}

/// Case-insensitive wildcard lookup over the reference table.
#[async_trait]
pub trait FoodTable: Send + Sync {
    async fn find_first(&self, pattern: &str) -> anyhow::Result<Option<NutrientRecord>>;

    /// Matches ordered by ascending name length, so shorter / more generic
    /// entries surface first.
    async fn find_matching(&self, pattern: &str, limit: i64)
        -> anyhow::Result<Vec<NutrientRecord>>;
}

pub struct PgFoodTable {
    db: PgPool,
}

impl PgFoodTable {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodTable for PgFoodTable {
    async fn find_first(&self, pattern: &str) -> anyhow::Result<Option<NutrientRecord>> {
        let row = sqlx::query_as::<_, NutrientRecord>(
            r#"
            SELECT name, kcal_per_100g, protein_g_per_100g, fat_g_per_100g, carb_g_per_100g
            FROM taco_foods
            WHERE name ILIKE $1
            LIMIT 1
            "#,
        )
        .bind(pattern)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_matching(
        &self,
        pattern: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<NutrientRecord>> {
        let rows = sqlx::query_as::<_, NutrientRecord>(
            r#"
            SELECT name, kcal_per_100g, protein_g_per_100g, fat_g_per_100g, carb_g_per_100g
            FROM taco_foods
            WHERE name ILIKE $1
            ORDER BY char_length(name) ASC, name ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

/// `ILIKE`-style matching with `%` wildcards, used by the in-memory table.
pub(crate) fn ilike_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    if !pattern.contains('%') {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split('%').collect();
    let mut pos = 0usize;
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == last {
            let tail = &text[pos..];
            return tail.ends_with(part);
        } else {
            match text[pos..].find(part) {
                Some(idx) => pos += idx + part.len(),
                None => return false,
            }
        }
    }
    true
}
