use lazy_static::lazy_static;
use regex::Regex;

use super::normalize::normalize;

pub const DEFAULT_GRAMS: f64 = 100.0;

lazy_static! {
    // "<number> <unit> de <name>", unit and the connective both optional.
    static ref PORTION_RE: Regex = Regex::new(
        r"(?i)^\s*(\d+(?:[.,]\d+)?)\s*(g|gramas?|ml|litros?|x[ií]caras?|copos?)?\s+(?:(?:de|do|da|dos|das)\s+)?(.+)$"
    )
    .unwrap();
}

/// Gram-equivalent for a recognized unit. Unrecognized units fall back to
/// the 100g default instead of erroring.
pub fn grams_for(value: f64, unit: &str) -> f64 {
    match normalize(unit).trim() {
        "g" | "grama" | "gramas" | "gram" | "grams" => value,
        "ml" | "milliliter" | "millilitre" => value,
        "litro" | "litros" | "liter" | "litre" => value * 1000.0,
        "xicara" | "xicaras" | "cup" => value * 180.0,
        "copo" | "copos" | "glass" => value * 200.0,
        _ => DEFAULT_GRAMS,
    }
}

/// Splits a candidate query into its gram quantity and the bare food name.
/// Queries without a leading quantity are taken verbatim at 100g.
pub fn split_portion(query: &str) -> (f64, String) {
    if let Some(caps) = PORTION_RE.captures(query) {
        let value: f64 = caps[1].replace(',', ".").parse().unwrap_or(DEFAULT_GRAMS);
        let unit = caps.get(2).map_or("g", |m| m.as_str());
        let name = caps[3].trim().to_string();
        (grams_for(value, unit), name)
    } else {
        (DEFAULT_GRAMS, query.trim().to_string())
    }
}
