use serde::{Deserialize, Serialize};

use super::repo::NutrientRecord;

/// A reference record scaled to a resolved gram quantity. Ephemeral: lives
/// inside one request or inside serialized dialogue context, and is only
/// persisted by committing a meal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFood {
    pub source_name: String,
    pub description: String,
    pub grams: f64,
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
}

/// Scales per-100g values by `grams / 100`. The description carries the
/// portion only when it differs from the 100g default.
pub fn scale(record: &NutrientRecord, grams: f64) -> ResolvedFood {
    let factor = grams / 100.0;
    let description = if (grams - 100.0).abs() < f64::EPSILON {
        record.name.clone()
    } else {
        format!("{:.0}g de {}", grams, record.name)
    };
    ResolvedFood {
        source_name: record.name.clone(),
        description,
        grams,
        kcal: record.kcal_per_100g * factor,
        protein_g: record.protein_g_per_100g * factor,
        fat_g: record.fat_g_per_100g * factor,
        carb_g: record.carb_g_per_100g * factor,
    }
}
