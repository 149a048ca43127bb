pub mod matcher;
pub mod normalize;
pub mod portion;
pub mod query;
pub mod repo;
pub mod scaler;

pub use matcher::FoodMatcher;
pub use repo::{FoodTable, NutrientRecord, PgFoodTable};
pub use scaler::ResolvedFood;
