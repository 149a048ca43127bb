use super::repo::MealEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
}

pub fn totals(entries: &[MealEntry]) -> DayTotals {
    entries.iter().fold(DayTotals::default(), |mut acc, e| {
        acc.kcal += e.kcal;
        acc.protein_g += e.protein_g;
        acc.fat_g += e.fat_g;
        acc.carb_g += e.carb_g;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};
    use uuid::Uuid;

    fn entry(kcal: f64, protein: f64) -> MealEntry {
        MealEntry {
            id: 1,
            user_id: Uuid::new_v4(),
            description: "test".into(),
            kcal,
            protein_g: protein,
            fat_g: 1.0,
            carb_g: 10.0,
            entry_date: date!(2026 - 08 - 27),
            entry_time: time!(12:00),
        }
    }

    #[test]
    fn totals_sum_all_macros() {
        let t = totals(&[entry(124.0, 2.6), entry(77.0, 4.5)]);
        assert!((t.kcal - 201.0).abs() < 1e-9);
        assert!((t.protein_g - 7.1).abs() < 1e-9);
        assert!((t.carb_g - 20.0).abs() < 1e-9);
    }

    #[test]
    fn totals_of_empty_day_are_zero() {
        assert_eq!(totals(&[]), DayTotals::default());
    }
}
